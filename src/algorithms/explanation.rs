// src/algorithms/explanation.rs
use crate::algorithms::node::{AttributionNode, GroupNode};
use crate::algorithms::similarity::MainEffect;
use crate::core::{FeatureCatalogue, Result};
use crate::traits::Attribution;
use serde::Serialize;
use std::fmt;

/// Outcome of explaining one instance.
///
/// Nodes are addressed by paths of child indices: `[g]` is the top-level group
/// `g`, `[g, i]` its `i`-th child, and so on.
#[derive(Debug, Clone, Serialize)]
pub struct ExplanationResult {
    /// Top-level groups by descending |score|.
    pub groups: Vec<GroupNode>,
    /// Dataset mean plus all group scores, clamped; `None` when there are no groups
    /// or a group score is `NaN`.
    pub explanation_prediction: Option<f64>,
    /// Features with too few similar rows to carry an effect.
    pub excluded_features: Vec<String>,
    pub main_effects: Vec<MainEffect>,
}

impl ExplanationResult {
    fn child(&self, path: &[usize]) -> Option<&AttributionNode> {
        let (first, rest) = path.split_first()?;
        let (last, middle) = rest.split_last()?;
        let mut children = self.groups.get(*first)?.children();
        for &i in middle {
            children = children.get(i)?.as_group()?.children();
        }
        children.get(*last)
    }

    pub fn node(&self, path: &[usize]) -> Option<&dyn Attribution> {
        match path {
            [] => None,
            [g] => self.groups.get(*g).map(|g| g as &dyn Attribution),
            _ => self.child(path).map(|n| n as &dyn Attribution),
        }
    }

    /// The node preceding `path` in its group, or the parent's predecessor when
    /// `path` is a first child. Top-level groups have no predecessor.
    pub fn previous_node(&self, path: &[usize]) -> Option<&AttributionNode> {
        let (&last, parent) = path.split_last()?;
        if parent.is_empty() {
            return None;
        }
        if last == 0 {
            return self.previous_node(parent);
        }
        let mut sibling = parent.to_vec();
        sibling.push(last - 1);
        self.child(&sibling)
    }

    /// Path of the feature node named `feature`, if it was not excluded.
    pub fn find_feature(&self, feature: &str) -> Option<Vec<usize>> {
        fn search(nodes: &[AttributionNode], feature: &str, path: &mut Vec<usize>) -> bool {
            for (i, node) in nodes.iter().enumerate() {
                path.push(i);
                let found = match node {
                    AttributionNode::Feature(f) => f.feature == feature,
                    AttributionNode::Group(g) => search(g.children(), feature, path),
                };
                if found {
                    return true;
                }
                path.pop();
            }
            false
        }

        let mut path = Vec::new();
        for (g, group) in self.groups.iter().enumerate() {
            path.push(g);
            if search(group.children(), feature, &mut path) {
                return Some(path);
            }
            path.pop();
        }
        None
    }

    /// Display names of the top-level groups.
    pub fn group_names(&self, catalogue: &FeatureCatalogue) -> Vec<String> {
        self.groups.iter().map(|g| g.display_name(catalogue)).collect()
    }

    pub fn close_all(&mut self) {
        self.groups.iter_mut().for_each(|g| g.close_all());
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

impl fmt::Display for ExplanationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let catalogue = FeatureCatalogue::default();
        writeln!(f, "Explanation:")?;
        match self.explanation_prediction {
            Some(p) => writeln!(f, "  Prediction: {:.4}", p)?,
            None => writeln!(f, "  Prediction: undefined")?,
        }
        for group in &self.groups {
            writeln!(f, "  {:+.4}  {}", group.score(), group.display_name(&catalogue))?;
        }
        if !self.excluded_features.is_empty() {
            writeln!(f, "  Excluded: {}", self.excluded_features.join(", "))?;
        }
        Ok(())
    }
}
