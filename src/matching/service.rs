//! Transport to the external embedding service.
//!
//! A request is a flat list of named string parameters, sent as a form POST.
//! The response body holds one matrix row per line.

use std::fmt;
use std::time::Duration;

use ndarray::Array2;
use thiserror::Error;

/// Result type for service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Errors talking to the embedding service or reading its answer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("match request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("expected {expected} rows in service response, got {found}")]
    RowCount { expected: usize, found: usize },

    #[error("row {row} of service response has {found} values, expected {expected}")]
    ColumnCount {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("row {row} of service response holds '{value}', which is not a number")]
    InvalidNumber { row: usize, value: String },
}

/// Sends match requests to the embedding service.
pub trait MatchService: Send + Sync + fmt::Debug {
    /// Send the parameters and return the raw response body.
    fn send_match_request(&self, params: &[(String, String)]) -> ServiceResult<String>;
}

/// Blocking HTTP client for the embedding service.
///
/// Calls block without a timeout and are never retried; the caller decides
/// what a failure means.
#[derive(Debug, Clone)]
pub struct HttpMatchService {
    client: reqwest::blocking::Client,
    url: String,
}

impl HttpMatchService {
    pub fn new(url: impl Into<String>) -> ServiceResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(None::<Duration>)
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl MatchService for HttpMatchService {
    fn send_match_request(&self, params: &[(String, String)]) -> ServiceResult<String> {
        let response = self
            .client
            .post(&self.url)
            .form(params)
            .send()?
            .error_for_status()?;
        Ok(response.text()?)
    }
}

/// Parse a newline-delimited response into a `rows × cols` matrix.
///
/// Values within a line may be separated by commas or whitespace; blank
/// lines are ignored.
pub fn parse_matrix(body: &str, rows: usize, cols: usize) -> ServiceResult<Array2<f32>> {
    let lines: Vec<&str> = body
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    if lines.len() != rows {
        return Err(ServiceError::RowCount {
            expected: rows,
            found: lines.len(),
        });
    }

    let mut matrix = Array2::zeros((rows, cols));
    for (row, line) in lines.iter().enumerate() {
        let values: Vec<&str> = line
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|value| !value.is_empty())
            .collect();
        if values.len() != cols {
            return Err(ServiceError::ColumnCount {
                row,
                expected: cols,
                found: values.len(),
            });
        }
        for (col, value) in values.iter().enumerate() {
            matrix[[row, col]] = value.parse().map_err(|_| ServiceError::InvalidNumber {
                row,
                value: value.to_string(),
            })?;
        }
    }
    Ok(matrix)
}
