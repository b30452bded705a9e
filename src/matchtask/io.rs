//! CSV files of ground-truth and similarity matrices.
//!
//! Both are plain comma-separated matrices without a header row: one line
//! per source column, one field per target column.

use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use csv::{ReaderBuilder, Trim, WriterBuilder};
use ndarray::Array2;

use super::error::{MatchTaskError, MatchTaskResult};

/// Read a pair's ground truth. A missing file is `Ok(None)`.
pub fn read_ground_truth_file(path: &Path) -> MatchTaskResult<Option<Array2<i32>>> {
    if !path.is_file() {
        return Ok(None);
    }
    read_matrix(path).map(Some)
}

/// Read a saved similarity matrix.
pub fn read_sim_matrix(path: &Path) -> MatchTaskResult<Array2<f32>> {
    read_matrix(path)
}

/// Write a matrix, creating parent directories.
pub fn write_matrix<T: Display>(path: &Path, matrix: &Array2<T>) -> MatchTaskResult<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|source| MatchTaskError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let to_csv_error = |source| MatchTaskError::Csv {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(to_csv_error)?;
    // A record without fields cannot be told apart from one empty field.
    if matrix.ncols() > 0 {
        for row in matrix.rows() {
            writer
                .write_record(row.iter().map(|value| value.to_string()))
                .map_err(to_csv_error)?;
        }
    }
    writer.flush().map_err(|source| MatchTaskError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_matrix<T: FromStr>(path: &Path) -> MatchTaskResult<Array2<T>> {
    let parse_error = |message: String| MatchTaskError::MatrixParse {
        path: path.to_path_buf(),
        message,
    };

    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .trim(Trim::All)
        .from_path(path)
        .map_err(|source| MatchTaskError::Csv {
            path: path.to_path_buf(),
            source,
        })?;

    let mut values = Vec::new();
    let mut rows = 0;
    let mut cols = 0;
    for record in reader.records() {
        let record = record.map_err(|err| parse_error(err.to_string()))?;
        if rows == 0 {
            cols = record.len();
        }
        for field in record.iter() {
            let value = field
                .parse()
                .map_err(|_| parse_error(format!("row {} holds '{}', which is not a number", rows, field)))?;
            values.push(value);
        }
        rows += 1;
    }

    Array2::from_shape_vec((rows, cols), values).map_err(|err| parse_error(err.to_string()))
}
