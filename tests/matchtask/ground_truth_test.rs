#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use ndarray::array;
    use schemabench::config::Settings;
    use schemabench::data::{Column, Database, Dataset, Scenario, Table};
    use schemabench::matching::{MatcherEnvironment, MatcherRegistry};
    use schemabench::matchtask::{build_pipeline, MatchTask, MatchTaskError, TablePair};

    fn table(name: &str, columns: &[&str]) -> Table {
        Table::new(
            name,
            format!("{}.csv", name),
            columns
                .iter()
                .map(|label| Column::new(*label, vec!["1".to_string(), "2".to_string()]))
                .collect(),
        )
    }

    /// Source: orders(id, total), items(sku). Target: sales(order_id, amount).
    fn scenario(path: &Path) -> Scenario {
        let source = Database::new(
            "shop",
            path.join("shop"),
            vec![table("orders", &["id", "total"]), table("items", &["sku"])],
        )
        .unwrap();
        let target = Database::new(
            "ledger",
            path.join("ledger"),
            vec![table("sales", &["order_id", "amount"])],
        )
        .unwrap();
        Scenario::new(&Dataset::new("retail", path), path.join("shop_ledger"), source, target)
    }

    fn write_ground_truth(scenario: &Scenario, pair: &str, content: &str) {
        let dir = scenario.path().join("ground_truth");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(format!("{}.csv", pair)), content).unwrap();
    }

    #[test]
    fn test_pair_ground_truth_is_embedded_at_offsets() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = scenario(dir.path());
        write_ground_truth(&scenario, "items__sales", "0, 1\n");

        let settings = Settings::default();
        let mut task = MatchTask::new(&scenario, vec![], vec![], &settings);
        task.set_table_pairs(TablePair::generate(&scenario));
        task.read_ground_truth().unwrap();

        assert_eq!(
            task.ground_truth().unwrap(),
            &array![[0, 0], [0, 0], [0, 1]]
        );
    }

    #[test]
    fn test_missing_files_mean_no_correspondences() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = scenario(dir.path());

        let settings = Settings::default();
        let mut task = MatchTask::new(&scenario, vec![], vec![], &settings);
        task.set_table_pairs(TablePair::generate(&scenario));
        task.read_ground_truth().unwrap();

        let ground_truth = task.ground_truth().unwrap();
        assert_eq!(ground_truth.dim(), (3, 2));
        assert!(ground_truth.iter().all(|&cell| cell == 0));
    }

    #[test]
    fn test_ground_truth_needs_table_pairs() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = scenario(dir.path());
        let settings = Settings::default();
        let mut task = MatchTask::new(&scenario, vec![], vec![], &settings);

        assert!(matches!(
            task.read_ground_truth(),
            Err(MatchTaskError::TablePairsNotGenerated)
        ));
    }

    #[test]
    fn test_wrong_shape_aborts_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = scenario(dir.path());
        write_ground_truth(&scenario, "orders__sales", "1,0,0\n0,1,0\n");

        let mut settings = Settings::from_toml(
            r#"
[[pipeline.steps]]
kind = "table_pair_generation"

[[pipeline.steps]]
kind = "matching"
line = 1
save = false

[[pipeline.steps.matchers]]
group = "baseline"
matcher = "two_opt"
"#,
        )
        .unwrap();
        settings.paths.results_dir = dir.path().join("results");
        let registry = MatcherRegistry::with_builtin(MatcherEnvironment::from_settings(&settings).unwrap());
        let steps = build_pipeline(&settings, &registry).unwrap();

        let mut task = MatchTask::new(&scenario, steps, vec![], &settings);
        let err = task.run_steps().unwrap_err();
        assert!(matches!(
            err,
            MatchTaskError::GroundTruthShape { rows: 2, cols: 2, found_rows: 2, found_cols: 3, .. }
        ));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = scenario(dir.path());
        write_ground_truth(&scenario, "orders__sales", "1,0\nyes,no\n");

        let settings = Settings::default();
        let mut task = MatchTask::new(&scenario, vec![], vec![], &settings);
        task.set_table_pairs(TablePair::generate(&scenario));

        assert!(matches!(
            task.read_ground_truth(),
            Err(MatchTaskError::MatrixParse { .. })
        ));
    }

    #[test]
    fn test_overlapping_pairs_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = scenario(dir.path());
        let orders = &scenario.source().tables()[0];
        let sales = &scenario.target().tables()[0];

        let settings = Settings::default();
        let mut task = MatchTask::new(&scenario, vec![], vec![], &settings);
        let pair = TablePair::new(&scenario, orders, sales);
        task.set_table_pairs(vec![pair, pair]);

        let err = task.read_ground_truth().unwrap_err();
        assert!(matches!(
            err,
            MatchTaskError::OverlappingGroundTruth { pair, row: 0, col: 0 } if pair == "orders__sales"
        ));
    }

    #[test]
    fn test_empty_sim_matrix_has_global_dimensions() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = scenario(dir.path());
        let settings = Settings::default();
        let task = MatchTask::new(&scenario, vec![], vec![], &settings);

        assert_eq!(task.num_source_columns(), 3);
        assert_eq!(task.num_target_columns(), 2);
        assert_eq!(task.get_empty_sim_matrix().dim(), (3, 2));

        // Local matrices keep the pair's shape.
        let pairs = TablePair::generate(&scenario);
        assert_eq!(pairs[1].empty_sim_matrix().dim(), (1, 2));
    }
}
