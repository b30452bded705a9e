#[cfg(test)]
mod tests {
    use schemabench::data::{
        Column, ColumnRef, DataError, Database, DatabaseMetadata, DependencyScore,
        FunctionalDependency, Table,
    };

    fn table(name: &str, width: usize) -> Table {
        let columns = (0..width)
            .map(|i| Column::new(format!("{}_{}", name, i), vec![i.to_string()]))
            .collect();
        Table::new(name, format!("{}.csv", name), columns)
    }

    #[test]
    fn test_offsets_partition_column_space() {
        let db = Database::new(
            "shop",
            "shop",
            vec![table("users", 3), table("empty", 0), table("orders", 2), table("items", 4)],
        )
        .unwrap();

        assert_eq!(db.num_columns(), 9);

        let mut covered = vec![0usize; db.num_columns()];
        for table in db.tables() {
            for index in table.column_range() {
                covered[index] += 1;
            }
        }
        assert!(covered.iter().all(|&count| count == 1));

        let offsets: Vec<usize> = db.tables().iter().map(Table::offset).collect();
        assert_eq!(offsets, vec![0, 3, 3, 5]);
    }

    #[test]
    fn test_column_by_global_index() {
        let db = Database::new("shop", "shop", vec![table("users", 3), table("orders", 2)]).unwrap();

        assert_eq!(db.column_by_index(0).unwrap().label(), "users_0");
        assert_eq!(db.column_by_index(3).unwrap().label(), "orders_0");
        assert_eq!(db.column_by_index(4).unwrap().table(), "orders");
        assert!(matches!(
            db.column_by_index(5),
            Err(DataError::ColumnIndexOutOfRange { index: 5, num_columns: 5, .. })
        ));

        let labels: Vec<&str> = db.columns().map(Column::label).collect();
        assert_eq!(labels, vec!["users_0", "users_1", "users_2", "orders_0", "orders_1"]);
    }

    #[test]
    fn test_duplicate_table_rejected() {
        let result = Database::new("shop", "shop", vec![table("users", 1), table("users", 2)]);
        assert!(matches!(result, Err(DataError::DuplicateTable { .. })));
    }

    #[test]
    fn test_metadata_must_reference_existing_columns() {
        let db = Database::new("shop", "shop", vec![table("users", 2)]).unwrap();
        let fd = FunctionalDependency::new(
            vec![ColumnRef::new("users", "users_0")],
            ColumnRef::new("users", "email"),
            DependencyScore { pdep: 1.0, gpdep: 0.5 },
        );

        let result = db.with_metadata(DatabaseMetadata::new(vec![fd], vec![]));
        assert!(matches!(
            result,
            Err(DataError::UnknownDependencyColumn(column)) if column.column == "email"
        ));
    }
}
