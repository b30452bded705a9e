#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use ndarray::{array, ArrayView2};
    use schemabench::config::Settings;
    use schemabench::data::{Column, Database, Dataset, Scenario, Table};
    use schemabench::matching::{MatcherEnvironment, MatcherError, MatcherKey, MatcherRegistry};
    use schemabench::matchtask::{
        build_pipeline, MatchLine, MatchStep, MatchTask, MatchTaskError, Metric, StepId,
    };

    /// Share of cells where a thresholded similarity agrees with the ground truth.
    #[derive(Debug)]
    struct Agreement;

    impl Metric for Agreement {
        fn name(&self) -> &str {
            "agreement"
        }

        fn score(&self, sim: ArrayView2<'_, f32>, ground_truth: ArrayView2<'_, i32>) -> f32 {
            if sim.is_empty() {
                return 0.0;
            }
            let agreeing = sim
                .iter()
                .zip(ground_truth.iter())
                .filter(|(s, g)| (**s >= 0.5) == (**g == 1))
                .count();
            agreeing as f32 / sim.len() as f32
        }
    }

    const PIPELINE: &str = r#"
[cache]
write = true

[[pipeline.steps]]
kind = "table_pair_generation"

[[pipeline.steps]]
kind = "matching"
line = 1

[[pipeline.steps.matchers]]
group = "baseline"
matcher = "two_opt"

[pipeline.steps.matchers.params]
max_iterations = 50

[[pipeline.steps]]
kind = "sim_matrix_boosting"
line = 1
boosting = "min_max"
"#;

    fn column(label: &str, value: &str) -> Column {
        Column::new(label, vec![value.to_string(); 3])
    }

    /// Source `a(x, y)` and target `b(y2, x2)`; value distributions line up crosswise.
    fn scenario(root: &Path) -> Scenario {
        let source = Database::new(
            "left",
            root.join("left"),
            vec![Table::new("a", "a.csv", vec![column("x", "1"), column("y", "2")])],
        )
        .unwrap();
        let target = Database::new(
            "right",
            root.join("right"),
            vec![Table::new("b", "b.csv", vec![column("y2", "2"), column("x2", "1")])],
        )
        .unwrap();
        let scenario_dir = root.join("left_right");
        fs::create_dir_all(scenario_dir.join("ground_truth")).unwrap();
        fs::write(scenario_dir.join("ground_truth").join("a__b.csv"), "0,1\n1,0\n").unwrap();
        Scenario::new(&Dataset::new("toy", root), scenario_dir, source, target)
    }

    fn settings(content: &str, root: &Path) -> Settings {
        let mut settings = Settings::from_toml(content).unwrap();
        settings.paths.results_dir = root.join("results");
        settings
    }

    fn registry(settings: &Settings) -> MatcherRegistry {
        MatcherRegistry::with_builtin(MatcherEnvironment::from_settings(settings).unwrap())
    }

    fn metrics() -> Vec<Arc<dyn Metric>> {
        vec![Arc::new(Agreement)]
    }

    fn assert_close(left: &[f32], right: &[f32]) {
        assert_eq!(left.len(), right.len());
        for (l, r) in left.iter().zip(right) {
            assert!((l - r).abs() < 1e-6, "{left:?} != {right:?}");
        }
    }

    #[test]
    fn test_build_pipeline_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = settings(PIPELINE, dir.path());
        let steps = build_pipeline(&settings, &registry(&settings)).unwrap();

        let names: Vec<String> = steps.iter().map(MatchStep::name).collect();
        assert_eq!(
            names,
            vec!["table_pair_generation", "matching_line1", "sim_matrix_boosting_line1"]
        );
        assert_eq!(steps[1].line(), Some(MatchLine::First));
        assert!(steps[0].is_table_pair_generation());
    }

    #[test]
    fn test_full_run_evaluates_and_saves() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = scenario(dir.path());
        let settings = settings(PIPELINE, dir.path());
        let steps = build_pipeline(&settings, &registry(&settings)).unwrap();

        let mut task = MatchTask::new(&scenario, steps, metrics(), &settings);
        task.run_steps().unwrap();

        let key = MatcherKey::new("baseline", 0);
        let matched = task.get_sim_matrix(StepId(1), &key).unwrap();
        assert_eq!(matched[0], array![[0.0f32, 1.0], [1.0, 0.0]]);
        assert_eq!(task.get_sim_matrix(StepId(2), &key).unwrap()[0], matched[0]);

        for step in [StepId(1), StepId(2)] {
            let performance = task.performance("agreement", step, &key).unwrap();
            assert_eq!(performance.mean, 1.0);
            assert_eq!(performance.pair_score("a__b"), Some(1.0));
        }
        assert!(task.performance("agreement", StepId(0), &key).is_none());

        let pair = task.table_pairs().unwrap()[0];
        let saved = task.result_path(StepId(1), &key, &pair);
        assert_eq!(
            saved,
            dir.path()
                .join("results/toy/left_right/1_matching_line1/baseline_0/a__b.csv")
        );
        assert!(saved.is_file());
        assert!(task.result_path(StepId(2), &key, &pair).is_file());
        assert_eq!(task.cache_writes(), 2);
        assert_eq!(task.cache_reads(), 0);
    }

    #[test]
    fn test_second_run_reads_cached_matrices() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = scenario(dir.path());
        let first = settings(PIPELINE, dir.path());
        let steps = build_pipeline(&first, &registry(&first)).unwrap();
        let mut task = MatchTask::new(&scenario, steps, metrics(), &first);
        task.run_steps().unwrap();

        let key = MatcherKey::new("baseline", 0);
        let pair = task.table_pairs().unwrap()[0];
        fs::write(task.result_path(StepId(1), &key, &pair), "0.2,0.6\n0.4,0.2\n").unwrap();

        let mut second = first.clone();
        second.cache.read = true;
        let steps = build_pipeline(&second, &registry(&second)).unwrap();
        let mut task = MatchTask::new(&scenario, steps, metrics(), &second);
        task.run_steps().unwrap();

        assert_eq!(task.cache_reads(), 1);
        let cached = task.get_sim_matrix(StepId(1), &key).unwrap();
        assert_close(cached[0].as_slice().unwrap(), &[0.2, 0.6, 0.4, 0.2]);
        let boosted = task.get_sim_matrix(StepId(2), &key).unwrap();
        assert_close(boosted[0].as_slice().unwrap(), &[0.0, 1.0, 0.5, 0.0]);
        assert_eq!(task.performance("agreement", StepId(1), &key).unwrap().mean, 0.75);
    }

    #[test]
    fn test_previous_step_and_line_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = scenario(dir.path());
        let settings = settings(PIPELINE, dir.path());
        let steps = build_pipeline(&settings, &registry(&settings)).unwrap();
        let task = MatchTask::new(&scenario, steps, metrics(), &settings);

        let key = MatcherKey::new("baseline", 0);
        assert!(matches!(
            task.get_sim_matrix_from_previous_match_step(StepId(0), &key),
            Err(MatchTaskError::NoPreviousStep(StepId(0)))
        ));
        assert!(matches!(
            task.get_sim_matrix_from_previous_match_step(StepId(2), &key),
            Err(MatchTaskError::MissingSimMatrix { step: StepId(1), .. })
        ));

        let matchers = task.get_matchers_for_line(MatchLine::First).unwrap();
        assert_eq!(matchers.len(), 1);
        assert_eq!(matchers[0].0, key);
        assert_eq!(matchers[0].1.name(), "two_opt");
        assert!(task.get_matchers_for_line(MatchLine::Second).is_none());
    }

    #[test]
    fn test_skipped_steps_produce_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let scenario = scenario(dir.path());
        let settings = settings(
            r#"
[[pipeline.steps]]
kind = "table_pair_generation"

[[pipeline.steps]]
kind = "matching"
line = 2
run = false

[[pipeline.steps.matchers]]
group = "baseline"
matcher = "two_opt"
"#,
            dir.path(),
        );
        let steps = build_pipeline(&settings, &registry(&settings)).unwrap();
        let mut task = MatchTask::new(&scenario, steps, metrics(), &settings);
        task.run_steps().unwrap();

        let key = MatcherKey::new("baseline", 0);
        assert!(task.get_sim_matrix(StepId(1), &key).is_none());
        assert!(task.performance("agreement", StepId(1), &key).is_none());
        assert!(task.ground_truth().is_some());
        assert!(!dir.path().join("results").exists());
    }

    #[test]
    fn test_invalid_pipelines_are_rejected() {
        let dir = tempfile::tempdir().unwrap();

        let matching_first = settings(
            r#"
[[pipeline.steps]]
kind = "matching"
line = 1

[[pipeline.steps]]
kind = "table_pair_generation"
"#,
            dir.path(),
        );
        assert!(matches!(
            build_pipeline(&matching_first, &registry(&matching_first)),
            Err(MatchTaskError::InvalidPipeline(_))
        ));

        let boosting_without_line = settings(
            r#"
[[pipeline.steps]]
kind = "table_pair_generation"

[[pipeline.steps]]
kind = "matching"
line = 1

[[pipeline.steps]]
kind = "sim_matrix_boosting"
line = 2
"#,
            dir.path(),
        );
        assert!(matches!(
            build_pipeline(&boosting_without_line, &registry(&boosting_without_line)),
            Err(MatchTaskError::InvalidPipeline(_))
        ));

        let unknown_matcher = settings(
            r#"
[[pipeline.steps]]
kind = "table_pair_generation"

[[pipeline.steps]]
kind = "matching"
line = 1

[[pipeline.steps.matchers]]
group = "g"
matcher = "cupid"
"#,
            dir.path(),
        );
        assert!(matches!(
            build_pipeline(&unknown_matcher, &registry(&unknown_matcher)),
            Err(MatchTaskError::Matcher(MatcherError::UnknownMatcher(name))) if name == "cupid"
        ));
    }
}
