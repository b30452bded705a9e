#[cfg(test)]
mod tests {
    use ndarray::array;
    use schemabench::data::{Column, Database, Dataset, Scenario, Table};
    use schemabench::matching::{Matcher, TwoOptMatcher, TwoOptParams};
    use schemabench::matchtask::TablePair;

    fn column(label: &str, value: &str) -> Column {
        Column::new(label, vec![value.to_string(); 4])
    }

    fn scenario(source: Vec<Column>, target: Vec<Column>) -> Scenario {
        let source = Database::new("left", "left", vec![Table::new("a", "a.csv", source)]).unwrap();
        let target = Database::new("right", "right", vec![Table::new("b", "b.csv", target)]).unwrap();
        Scenario::new(&Dataset::new("synthetic", "synthetic"), "synthetic/left_right", source, target)
    }

    #[test]
    fn test_single_column_pair_is_matched() {
        let scenario = scenario(vec![column("x", "1")], vec![column("y", "9")]);
        let pairs = TablePair::generate(&scenario);
        let matcher = TwoOptMatcher::new(TwoOptParams::default());

        let matrix = matcher.match_pair(&pairs[0]).unwrap();
        assert_eq!(matrix, array![[1.0f32]]);
    }

    #[test]
    fn test_identical_distributions_are_aligned() {
        let scenario = scenario(
            vec![column("a", "1"), column("b", "2"), column("c", "3")],
            vec![column("c2", "3"), column("a2", "1"), column("b2", "2")],
        );
        let pairs = TablePair::generate(&scenario);
        let matcher = TwoOptMatcher::new(TwoOptParams::default());

        let matrix = matcher.match_pair(&pairs[0]).unwrap();
        assert_eq!(
            matrix,
            array![[0.0f32, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]]
        );
    }

    #[test]
    fn test_costs_never_increase() {
        let scenario = scenario(
            vec![column("a", "1"), column("b", "2"), column("c", "3"), column("d", "4")],
            vec![column("w", "4"), column("x", "2"), column("y", "3")],
        );
        let pairs = TablePair::generate(&scenario);
        let matcher = TwoOptMatcher::new(TwoOptParams::default());

        let source = pairs[0].source_table().columns();
        let target = pairs[0].target_table().columns();
        let solution = matcher.solve(&matcher.dissimilarity(source, target));

        assert!(solution.costs.windows(2).all(|w| w[1] <= w[0]));
        assert_eq!(solution.total_cost(), 0.0);

        let matrix = solution.match_matrix(4, 3);
        assert_eq!(matrix.sum(), 3.0);
        assert_eq!(matrix[[3, 0]], 1.0);
        assert_eq!(matrix[[1, 1]], 1.0);
        assert_eq!(matrix[[2, 2]], 1.0);
    }

    #[test]
    fn test_match_matrix_has_pair_shape() {
        let scenario = scenario(
            vec![column("a", "1"), column("b", "2")],
            vec![column("x", "1"), column("y", "5"), column("z", "2")],
        );
        let pairs = TablePair::generate(&scenario);
        let matcher = TwoOptMatcher::new(TwoOptParams { max_iterations: 1 });

        let matrix = matcher.match_pair(&pairs[0]).unwrap();
        assert_eq!(matrix.dim(), pairs[0].shape());
        assert!(matrix.rows().into_iter().all(|row| row.sum() <= 1.0));
    }
}
