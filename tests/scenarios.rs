//! End-to-end explanation scenarios.

mod common;

use approx::assert_relative_eq;
use influence_rs::algorithms::node::SubsetScorer;
use influence_rs::{
    Attribution, ExplainError, FeatureCatalogue, FeatureNode, GroupKind, GroupNode, IdSet,
    InfluenceExplainer, Instance, Result,
};
use pretty_assertions::assert_eq;

/// Binary features `a`, `b` in four balanced cells of 50 rows. Within a cell
/// the target alternates +1 / -1 around the cell mean.
fn two_binary_features(cell_mean: impl Fn(f64, f64) -> f64) -> Result<InfluenceExplainer> {
    let rows = (0..200)
        .map(|i| {
            let a = (i % 2) as f64;
            let b = ((i / 2) % 2) as f64;
            let noise = if (i / 4) % 2 == 0 { 1.0 } else { -1.0 };
            vec![a, b, cell_mean(a, b) + noise]
        })
        .collect();
    InfluenceExplainer::new(common::dataset(&["a", "b", "y"], rows, "y")?, None)
}

#[test]
fn perfectly_correlated_features_form_one_correlation_group() -> Result<()> {
    let rows = (0..100)
        .map(|i| {
            let x = (i % 4) as f64;
            vec![x, 2.0 * x, ((i * 37) % 100) as f64]
        })
        .collect();
    let explainer = InfluenceExplainer::new(common::dataset(&["x", "z", "y"], rows, "y")?, None)?;
    let instance = explainer.dataset().row(3).unwrap();

    let result = explainer.compute_explanation(&instance)?;
    assert_eq!(result.groups.len(), 1);

    let top = &result.groups[0];
    let mut features = top.features();
    features.sort();
    assert_eq!(features, vec!["x", "z"]);

    let inner = top.children()[0].as_group().expect("correlation group");
    assert_eq!(inner.kind, GroupKind::Correlation);
    assert_eq!(inner.nr_features(), 2);
    assert!(result.group_names(&FeatureCatalogue::default())[0].ends_with('*'));
    Ok(())
}

#[test]
fn independent_effects_stay_in_separate_groups() -> Result<()> {
    let explainer = two_binary_features(|a, b| 10.0 * a + 10.0 * b)?;
    // a = 1, b = 1
    let instance = explainer.dataset().row(3).unwrap();

    let result = explainer.compute_explanation(&instance)?;
    assert_eq!(result.groups.len(), 2);
    for group in &result.groups {
        assert_eq!(group.nr_features(), 1);
        assert_relative_eq!(group.score(), 5.0, epsilon = 1e-9);
    }
    assert_relative_eq!(result.explanation_prediction.unwrap(), 20.0, epsilon = 1e-9);
    Ok(())
}

#[test]
fn interacting_features_are_merged() -> Result<()> {
    // only the a = 1, b = 1 cell is raised
    let explainer = two_binary_features(|a, b| 20.0 * a * b)?;
    let instance = explainer.dataset().row(3).unwrap();

    let result = explainer.compute_explanation(&instance)?;
    assert_eq!(result.groups.len(), 1);
    let group = &result.groups[0];
    assert_eq!(group.features(), vec!["a", "b"]);
    // 20 in the joint cell, dataset mean 5
    assert_relative_eq!(group.value(), 15.0, epsilon = 1e-9);
    assert_relative_eq!(group.children()[1].score(), 10.0, epsilon = 1e-9);

    let path = result.find_feature("b").unwrap();
    assert_eq!(path, vec![0, 1]);
    let previous = result.previous_node(&path).unwrap();
    assert_eq!(previous.features(), vec!["a"]);
    assert!(result.previous_node(&[0, 0]).is_none());
    Ok(())
}

#[test]
fn tiny_dataset_excludes_everything() -> Result<()> {
    let rows = (0..10).map(|i| vec![(i % 2) as f64, i as f64]).collect();
    let explainer = InfluenceExplainer::new(common::dataset(&["a", "y"], rows, "y")?, None)?;
    let instance = explainer.dataset().row(0).unwrap();

    let result = explainer.compute_explanation(&instance)?;
    assert!(result.groups.is_empty());
    assert_eq!(result.explanation_prediction, None);
    assert_eq!(result.excluded_features, vec!["a".to_string()]);
    Ok(())
}

#[test]
fn exclusion_boundary_between_twenty_and_twenty_one_rows() -> Result<()> {
    for (similar, excluded) in [(20usize, true), (21, false)] {
        let rows = (0..80)
            .map(|i| vec![if i < similar { 1.0 } else { 0.0 }, i as f64])
            .collect();
        let explainer = InfluenceExplainer::new(common::dataset(&["f", "y"], rows, "y")?, None)?;
        let instance = Instance::from(vec![1.0, 0.0]);
        let result = explainer.compute_explanation(&instance)?;
        assert_eq!(result.excluded_features.contains(&"f".to_string()), excluded);
        assert_eq!(result.groups.is_empty(), excluded);
    }
    Ok(())
}

#[test]
fn far_away_instance_is_excluded_and_has_no_bin() -> Result<()> {
    let explainer = InfluenceExplainer::new(common::random_dataset(7, 500), None)?;
    let instance = Instance::from(vec![99.0, 7.0, 1e9, -1e9, 0.0]);

    let result = explainer.compute_explanation(&instance)?;
    assert!(result.groups.is_empty());
    assert_eq!(result.explanation_prediction, None);
    assert!(matches!(
        explainer.instance_bin_index("age", 1e9),
        Err(ExplainError::BinNotFound { .. })
    ));
    Ok(())
}

#[test]
fn summed_scores_are_clamped_to_extreme_means() -> Result<()> {
    let rows = (0..100).map(|i| vec![(i % 2) as f64, i as f64]).collect();
    let explainer = InfluenceExplainer::new(common::dataset(&["a", "y"], rows, "y")?, None)?;
    let scorer = SubsetScorer::new(explainer.dataset().target(), explainer.summary().mean);

    // two groups over the five largest targets each score ~ +47
    let top: IdSet = (95..100).collect();
    let groups: Vec<GroupNode> = (0..2)
        .map(|_| {
            let effect = scorer.influence(&top);
            let node = FeatureNode::new("a", 1.0, top.clone(), effect);
            GroupNode::new(GroupKind::Single, vec![node.into()], &scorer)
        })
        .collect();

    let (_, high) = explainer.influence_range();
    let prediction = explainer.explanation_prediction(&groups).unwrap();
    assert_relative_eq!(prediction, explainer.summary().mean + high);
    // mean of the 20 largest targets, 80..99
    assert_relative_eq!(prediction, 89.5);
    Ok(())
}

#[test]
fn what_if_curve_matches_single_evaluations() -> Result<()> {
    let explainer = InfluenceExplainer::new(common::random_dataset(11, 800), None)?;
    let instance = explainer.dataset().row(0).unwrap();
    let mean = explainer.summary().mean;

    let curve = explainer.response_curve(&instance, "level")?;
    assert_eq!(curve.len(), 4);
    for sample in &curve {
        let single = explainer.what_if(&instance, "level", sample.x)?.map(|p| p - mean);
        assert_eq!(sample.impact, single);
    }
    Ok(())
}

#[test]
fn explanation_serializes_to_json() -> Result<()> {
    let explainer = InfluenceExplainer::new(common::random_dataset(3, 400), None)?;
    let instance = explainer.dataset().row(5).unwrap();
    let json = explainer.compute_explanation(&instance)?.to_json()?;
    let parsed: serde_json::Value = serde_json::from_str(&json)?;
    assert!(parsed["groups"].is_array());
    assert!(parsed["excluded_features"].is_array());
    Ok(())
}

#[test]
fn missing_discrete_value_is_matched_against_missing_rows() -> Result<()> {
    // f: 30 missing, 30 ones, 30 zeros; y = row id
    let rows = (0..90)
        .map(|i| {
            let f = match i / 30 {
                0 => f64::NAN,
                1 => 1.0,
                _ => 0.0,
            };
            vec![f, i as f64]
        })
        .collect();
    let explainer = InfluenceExplainer::new(common::dataset(&["f", "y"], rows, "y")?, None)?;
    let instance = Instance::from(vec![f64::NAN, 0.0]);

    let result = explainer.compute_explanation(&instance)?;
    assert!(result.excluded_features.is_empty());
    assert_eq!(result.main_effects[0].size, 30);
    assert_eq!(result.groups.len(), 1);
    // rows 0..30 average 14.5 against a mean of 44.5
    assert_relative_eq!(result.groups[0].score(), -30.0, epsilon = 1e-9);
    assert_eq!(result.group_names(&FeatureCatalogue::default()), vec!["f: null".to_string()]);
    Ok(())
}
