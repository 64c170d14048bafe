// src/algorithms/node.rs

//! Attribution tree nodes.
//!
//! A node's `score` is the change in mean outcome it causes when narrowing the
//! rows of whatever precedes it. Pushing a child into a group therefore depends
//! on the order of the group's existing children: every step conditions on the
//! id set left by the previous one. Never reorder children after insertion.

use crate::core::{ExplainerConfig, FeatureCatalogue, IdSet};
use crate::stats::significance::{t_score, two_sided_p_value};
use crate::traits::Attribution;
use crate::utils::{finite_mean, population_std};
use ndarray::ArrayView1;
use serde::Serialize;

/// Target statistics over row subsets, relative to the dataset mean.
#[derive(Debug, Clone, Copy)]
pub struct SubsetScorer<'a> {
    target: ArrayView1<'a, f64>,
    center: f64,
}

impl<'a> SubsetScorer<'a> {
    pub fn new(target: ArrayView1<'a, f64>, center: f64) -> Self {
        SubsetScorer { target, center }
    }

    pub fn n_rows(&self) -> usize {
        self.target.len()
    }

    /// Mean target of `ids` minus the dataset mean; `NaN` for an empty subset.
    pub fn influence(&self, ids: &IdSet) -> f64 {
        finite_mean(ids.iter().map(|i| self.target[i]))
            .map_or(f64::NAN, |mean| mean - self.center)
    }

    /// Population standard deviation of the target over `ids`.
    pub fn std(&self, ids: &IdSet) -> f64 {
        let values: Vec<f64> = ids.iter().map(|i| self.target[i]).collect();
        population_std(&values).unwrap_or(f64::NAN)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupKind {
    Single,
    Correlation,
}

#[derive(Debug, Clone, Serialize)]
pub struct FeatureNode {
    pub feature: String,
    /// The explained instance's value for this feature.
    pub instance_value: f64,
    ids: IdSet,
    score: f64,
    value: f64,
    pub is_open: bool,
}

impl FeatureNode {
    /// A feature scored by its main effect over its similar rows.
    pub fn new(feature: impl Into<String>, instance_value: f64, ids: IdSet, main_effect: f64) -> Self {
        FeatureNode {
            feature: feature.into(),
            instance_value,
            ids,
            score: main_effect,
            value: main_effect,
            is_open: false,
        }
    }

    fn narrow(&mut self, ids: &IdSet, previous_value: f64, scorer: &SubsetScorer<'_>) {
        self.ids = ids.intersect(&self.ids);
        let new_value = scorer.influence(&self.ids);
        self.score = new_value - previous_value;
        self.value = new_value;
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GroupNode {
    pub kind: GroupKind,
    children: Vec<AttributionNode>,
    ids: IdSet,
    score: f64,
    value: f64,
    pub is_open: bool,
}

impl GroupNode {
    /// An empty group over every row of the dataset.
    pub fn empty(kind: GroupKind, scorer: &SubsetScorer<'_>) -> Self {
        GroupNode {
            kind,
            children: Vec::new(),
            ids: IdSet::all(scorer.n_rows()),
            score: 0.0,
            value: 0.0,
            is_open: false,
        }
    }

    /// Builds a group by pushing `members` in descending order of |score|.
    pub fn new(kind: GroupKind, mut members: Vec<AttributionNode>, scorer: &SubsetScorer<'_>) -> Self {
        members.sort_by(|a, b| b.score().abs().total_cmp(&a.score().abs()));
        let mut group = GroupNode::empty(kind, scorer);
        for member in members {
            group.push(member, scorer);
        }
        group
    }

    /// Appends `child`, narrowing it (and through it, this group) against the current rows.
    pub fn push(&mut self, mut child: AttributionNode, scorer: &SubsetScorer<'_>) {
        let previous_value = self.value;
        child.narrow(&self.ids, previous_value, scorer);

        self.ids = child.ids().clone();
        let new_value = scorer.influence(&self.ids);
        self.score += new_value - previous_value;
        self.value = new_value;
        self.children.push(child);
    }

    /// Re-narrows the children in their existing order, each conditioned on the previous one.
    fn narrow(&mut self, ids: &IdSet, previous_value: f64, scorer: &SubsetScorer<'_>) {
        let mut current_ids = ids.clone();
        let mut current_value = previous_value;
        for child in &mut self.children {
            child.narrow(&current_ids, current_value, scorer);
            current_ids = child.ids().clone();
            current_value = child.value();
        }

        let new_value = scorer.influence(&current_ids);
        self.ids = current_ids;
        self.score = new_value - previous_value;
        self.value = new_value;
    }

    /// Interaction strength between this group and `candidate`, or `-1.0` when not significant.
    ///
    /// The additive hypothesis `self.score + candidate.score` is tested against the
    /// observed mean of the shared rows.
    pub fn significant_interaction_effect(
        &self,
        candidate: &AttributionNode,
        scorer: &SubsetScorer<'_>,
        config: &ExplainerConfig,
    ) -> f64 {
        let added_score = self.score + candidate.score();
        let combined = self.ids.intersect(candidate.ids());
        let n = combined.len();

        let average = scorer.influence(&combined);
        let std = scorer.std(&combined);
        let t = t_score(added_score, average, std, n);

        match two_sided_p_value(t, n as f64) {
            Some(p) if p < config.significance_level && n > config.min_subset_absolute => {
                (average - added_score).abs()
            }
            _ => -1.0,
        }
    }

    pub fn children(&self) -> &[AttributionNode] {
        &self.children
    }

    pub fn nr_features(&self) -> usize {
        self.children.len()
    }
}

/// A node of the attribution tree: one feature or a group of nodes.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "node", rename_all = "lowercase")]
pub enum AttributionNode {
    Feature(FeatureNode),
    Group(GroupNode),
}

impl AttributionNode {
    pub(crate) fn narrow(&mut self, ids: &IdSet, previous_value: f64, scorer: &SubsetScorer<'_>) {
        match self {
            AttributionNode::Feature(f) => f.narrow(ids, previous_value, scorer),
            AttributionNode::Group(g) => g.narrow(ids, previous_value, scorer),
        }
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            AttributionNode::Group(g) => Some(g),
            AttributionNode::Feature(_) => None,
        }
    }

    pub fn as_feature(&self) -> Option<&FeatureNode> {
        match self {
            AttributionNode::Feature(f) => Some(f),
            AttributionNode::Group(_) => None,
        }
    }
}

impl From<FeatureNode> for AttributionNode {
    fn from(node: FeatureNode) -> Self {
        AttributionNode::Feature(node)
    }
}

impl From<GroupNode> for AttributionNode {
    fn from(node: GroupNode) -> Self {
        AttributionNode::Group(node)
    }
}

impl Attribution for FeatureNode {
    fn ids(&self) -> &IdSet {
        &self.ids
    }

    fn score(&self) -> f64 {
        self.score
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn features(&self) -> Vec<&str> {
        vec![self.feature.as_str()]
    }

    fn display_name(&self, catalogue: &FeatureCatalogue) -> String {
        format!(
            "{}: {}",
            catalogue.feature_label(&self.feature),
            catalogue.value_label(&self.feature, self.instance_value)
        )
    }

    fn close_all(&mut self) {
        self.is_open = false;
    }
}

impl Attribution for GroupNode {
    fn ids(&self) -> &IdSet {
        &self.ids
    }

    fn score(&self) -> f64 {
        self.score
    }

    fn value(&self) -> f64 {
        self.value
    }

    fn features(&self) -> Vec<&str> {
        self.children.iter().flat_map(|c| c.features()).collect()
    }

    fn display_name(&self, catalogue: &FeatureCatalogue) -> String {
        match (self.kind, self.children.as_slice()) {
            (_, []) => String::new(),
            (GroupKind::Correlation, [first, ..]) => format!("{}*", first.display_name(catalogue)),
            (GroupKind::Single, [only]) => only.display_name(catalogue),
            (GroupKind::Single, children) => children
                .iter()
                .map(|c| c.display_name(catalogue))
                .collect::<Vec<_>>()
                .join(", "),
        }
    }

    fn close_all(&mut self) {
        self.is_open = false;
        self.children.iter_mut().for_each(|c| c.close_all());
    }
}

impl Attribution for AttributionNode {
    fn ids(&self) -> &IdSet {
        match self {
            AttributionNode::Feature(f) => f.ids(),
            AttributionNode::Group(g) => g.ids(),
        }
    }

    fn score(&self) -> f64 {
        match self {
            AttributionNode::Feature(f) => f.score(),
            AttributionNode::Group(g) => g.score(),
        }
    }

    fn value(&self) -> f64 {
        match self {
            AttributionNode::Feature(f) => f.value(),
            AttributionNode::Group(g) => g.value(),
        }
    }

    fn features(&self) -> Vec<&str> {
        match self {
            AttributionNode::Feature(f) => f.features(),
            AttributionNode::Group(g) => g.features(),
        }
    }

    fn display_name(&self, catalogue: &FeatureCatalogue) -> String {
        match self {
            AttributionNode::Feature(f) => f.display_name(catalogue),
            AttributionNode::Group(g) => g.display_name(catalogue),
        }
    }

    fn close_all(&mut self) {
        match self {
            AttributionNode::Feature(f) => f.close_all(),
            AttributionNode::Group(g) => g.close_all(),
        }
    }
}
