#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::{Arc, Mutex};

    use ndarray::{array, Array2};
    use schemabench::config::Settings;
    use schemabench::data::{Column, Database, DatabaseSide, Dataset, Scenario, Table};
    use schemabench::graph::export_path;
    use schemabench::matching::{
        MatchService, Matcher, MatcherEnvironment, MatcherError, MatcherKey, MatcherRegistry,
        Node2VecMatcher, Node2VecParams, PrismaMatcher, PrismaParams, ServiceError, ServiceResult,
    };
    use schemabench::matchtask::{build_pipeline, MatchTask, StepId, TablePair};

    /// Records every request and answers with a fixed body.
    #[derive(Debug)]
    struct Recording {
        body: String,
        requests: Mutex<Vec<Vec<(String, String)>>>,
    }

    impl Recording {
        fn new(body: &str) -> Arc<Self> {
            Arc::new(Self {
                body: body.to_string(),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn last_request(&self) -> Vec<(String, String)> {
            self.requests.lock().unwrap().last().cloned().unwrap()
        }
    }

    impl MatchService for Recording {
        fn send_match_request(&self, params: &[(String, String)]) -> ServiceResult<String> {
            self.requests.lock().unwrap().push(params.to_vec());
            Ok(self.body.clone())
        }
    }

    fn param<'a>(request: &'a [(String, String)], name: &str) -> &'a str {
        request
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .unwrap_or_else(|| panic!("missing parameter {name}"))
    }

    fn scenario() -> Scenario {
        let column = |label: &str| Column::new(label, vec!["v".to_string()]);
        let source = Database::new(
            "src",
            "src",
            vec![Table::new("people", "people.csv", vec![column("id"), column("name")])],
        )
        .unwrap();
        let target = Database::new(
            "tgt",
            "tgt",
            vec![Table::new(
                "persons",
                "persons.csv",
                vec![column("pid"), column("full_name"), column("age")],
            )],
        )
        .unwrap();
        Scenario::new(&Dataset::new("people", "data/people"), "data/people/src_tgt", source, target)
    }

    fn settings(root: &Path) -> Settings {
        let mut settings = Settings::default();
        settings.paths.graphs_dir = root.join("graphs");
        settings.paths.features_dir = root.join("features");
        settings.paths.results_dir = root.join("results");
        settings
    }

    fn touch_graphs(settings: &Settings, scenario: &Scenario, variant: &str) {
        for side in [DatabaseSide::Source, DatabaseSide::Target] {
            let path = export_path(&settings.paths.graphs_dir, scenario, side, variant);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(&path, "<graphml/>").unwrap();
        }
    }

    #[test]
    fn test_prisma_request_and_response() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let scenario = scenario();
        touch_graphs(&settings, &scenario, "gdep_threshold_0.00");

        let service = Recording::new("0.9,0.1,0.0\n0.2, 0.8, 0.0\n\n");
        let environment = MatcherEnvironment::with_service(&settings, service.clone());
        let matcher = PrismaMatcher::new(PrismaParams::default(), environment);

        let pairs = TablePair::generate(&scenario);
        let matrix = matcher.match_pair(&pairs[0]).unwrap();
        assert_eq!(matrix, array![[0.9f32, 0.1, 0.0], [0.2, 0.8, 0.0]]);

        let request = service.last_request();
        let source_graph =
            export_path(&settings.paths.graphs_dir, &scenario, DatabaseSide::Source, "gdep_threshold_0.00");
        assert_eq!(param(&request, "source_graph_path"), source_graph.display().to_string());
        assert_eq!(param(&request, "source_table"), "people");
        assert_eq!(param(&request, "target_table"), "persons");
        assert_eq!(
            param(&request, "features_dir"),
            dir.path().join("features/people/src_tgt").display().to_string()
        );
        assert_eq!(param(&request, "xNetMFGammaStrucAttr"), "0.5");
        assert_eq!(param(&request, "postprocessing"), "true");
        assert_eq!(param(&request, "thresholdMatches"), "true");
        assert_eq!(param(&request, "kind_of_feature"), "Distribution");
    }

    #[test]
    fn test_node2vec_request_parameters() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let scenario = scenario();
        touch_graphs(&settings, &scenario, "absolute_5");

        let service = Recording::new("1 0 0\n0 1 0");
        let environment = MatcherEnvironment::with_service(&settings, service.clone());
        let params = Node2VecParams {
            variant: "absolute_5".to_string(),
            drop_columns: 0.25,
            filter_k_nearest: false,
            ..Node2VecParams::default()
        };
        let matcher = Node2VecMatcher::new(params, environment);

        let pairs = TablePair::generate(&scenario);
        let matrix = matcher.match_pair(&pairs[0]).unwrap();
        assert_eq!(matrix.dim(), (2, 3));

        let request = service.last_request();
        assert!(param(&request, "target_graph_path").ends_with("absolute_5_target.graphml"));
        assert_eq!(param(&request, "get_k_highest_sm"), "False");
        assert_eq!(param(&request, "dropColumns"), "0.25");
        assert_eq!(param(&request, "dropConstraints"), "0.0");
        assert_eq!(param(&request, "xNetMFGammaStruc"), "1");
        assert_eq!(param(&request, "xNetMFGammaAttr"), "1");
    }

    #[test]
    fn test_missing_graph_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let scenario = scenario();

        let service = Recording::new("");
        let environment = MatcherEnvironment::with_service(&settings, service.clone());
        let matcher = PrismaMatcher::new(PrismaParams::default(), environment);

        let pairs = TablePair::generate(&scenario);
        let err = matcher.match_pair(&pairs[0]).unwrap_err();
        assert!(matches!(err, MatcherError::GraphNotBuilt { variant, .. } if variant == "gdep_threshold_0.00"));
        assert!(service.requests.lock().unwrap().is_empty());
    }

    #[test]
    fn test_malformed_response_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(dir.path());
        let scenario = scenario();
        touch_graphs(&settings, &scenario, "gdep_threshold_0.00");

        let pairs = TablePair::generate(&scenario);
        for (body, expected_rows) in [("0.1,0.2,0.3", true), ("0.1,0.2\n0.3,0.4", false), ("a,b,c\n1,2,3", false)] {
            let environment = MatcherEnvironment::with_service(&settings, Recording::new(body));
            let matcher = PrismaMatcher::new(PrismaParams::default(), environment);
            let err = matcher.match_pair(&pairs[0]).unwrap_err();
            match err {
                MatcherError::Service(ServiceError::RowCount { expected, found }) => {
                    assert!(expected_rows, "unexpected row error for {body:?}");
                    assert_eq!((expected, found), (2, 1));
                }
                MatcherError::Service(ServiceError::ColumnCount { .. })
                | MatcherError::Service(ServiceError::InvalidNumber { .. }) => {
                    assert!(!expected_rows, "unexpected column error for {body:?}");
                }
                other => panic!("unexpected error for {body:?}: {other}"),
            }
        }
    }

    #[test]
    fn test_failing_matcher_yields_empty_matrix_in_pipeline() {
        let dir = tempfile::tempdir().unwrap();
        let paths = settings(dir.path()).paths;
        let mut settings = Settings::from_toml(
            r#"
[[pipeline.steps]]
kind = "table_pair_generation"

[[pipeline.steps]]
kind = "matching"
line = 1
save = false
evaluate = false

[[pipeline.steps.matchers]]
group = "graph"
matcher = "prisma"
"#,
        )
        .unwrap();
        settings.paths = paths;
        let scenario = scenario();
        touch_graphs(&settings, &scenario, "gdep_threshold_0.00");

        let environment = MatcherEnvironment::with_service(&settings, Recording::new("not a matrix"));
        let registry = MatcherRegistry::with_builtin(environment);
        let steps = build_pipeline(&settings, &registry).unwrap();

        let mut task = MatchTask::new(&scenario, steps, vec![], &settings);
        task.run_steps().unwrap();

        let matrices = task
            .get_sim_matrix(StepId(1), &MatcherKey::new("graph", 0))
            .unwrap();
        assert_eq!(matrices.len(), 1);
        assert_eq!(matrices[0], Array2::<f32>::zeros((2, 3)));
        assert!(task.ground_truth().is_none());
    }
}
