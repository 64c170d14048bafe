// src/algorithms/grouping.rs

//! Greedy interaction grouping.
//!
//! Strongly correlated features are first bundled into correlation groups.
//! Then, starting from the strongest remaining candidate, each top-level group
//! keeps absorbing the candidate with the largest significant deviation from
//! additivity until no candidate interacts with it.

use crate::algorithms::node::{AttributionNode, FeatureNode, GroupKind, GroupNode, SubsetScorer};
use crate::algorithms::similarity::MainEffect;
use crate::core::ExplainerConfig;
use crate::stats::CorrelationMatrix;
use crate::traits::Attribution;
use tracing::trace;

fn feature_node(effect: &MainEffect) -> AttributionNode {
    FeatureNode::new(
        effect.feature.clone(),
        effect.instance_value,
        effect.ids.clone(),
        effect.average,
    )
    .into()
}

fn sort_by_abs_score<T: Attribution>(nodes: &mut [T]) {
    nodes.sort_by(|a, b| b.score().abs().total_cmp(&a.score().abs()));
}

/// Bundles features correlating above the threshold, in a single pass over
/// `main_effects` in their declared order. Returns the candidate list.
pub fn correlation_pregroup(
    main_effects: &[MainEffect],
    correlations: &CorrelationMatrix,
    scorer: &SubsetScorer<'_>,
    config: &ExplainerConfig,
) -> Vec<AttributionNode> {
    let n = main_effects.len();
    let mut consumed = vec![false; n];
    let mut main_players = Vec::new();

    for i in 0..n {
        if consumed[i] {
            continue;
        }
        let feature = &main_effects[i].feature;
        let mut correlated: Vec<usize> = (0..n)
            .filter(|&j| {
                j != i
                    && !consumed[j]
                    && correlations.is_correlated(
                        feature,
                        &main_effects[j].feature,
                        config.correlation_group_threshold,
                    )
            })
            .collect();
        if correlated.is_empty() {
            continue;
        }

        correlated.push(i);
        correlated.sort_by(|&a, &b| {
            main_effects[b]
                .average
                .abs()
                .total_cmp(&main_effects[a].average.abs())
        });
        for &j in &correlated {
            consumed[j] = true;
        }

        if config.is_reduced {
            // keep only the strongest member
            main_players.push(feature_node(&main_effects[correlated[0]]));
        } else {
            let members = correlated.iter().map(|&j| feature_node(&main_effects[j])).collect();
            main_players.push(GroupNode::new(GroupKind::Correlation, members, scorer).into());
        }
    }

    for (effect, _) in main_effects.iter().zip(&consumed).filter(|&(_, &c)| !c) {
        main_players.push(feature_node(effect));
    }

    sort_by_abs_score(&mut main_players);
    main_players
}

/// Index and effect of the candidate interacting most strongly with `group`.
///
/// Ties go to the earliest candidate; `NaN` effects are never chosen.
fn strongest_interaction(
    group: &GroupNode,
    candidates: &[AttributionNode],
    scorer: &SubsetScorer<'_>,
    config: &ExplainerConfig,
) -> Option<(usize, f64)> {
    candidates
        .iter()
        .map(|c| group.significant_interaction_effect(c, scorer, config))
        .enumerate()
        .filter(|(_, effect)| !effect.is_nan())
        .fold(None, |best, (i, effect)| match best {
            Some((_, best_effect)) if best_effect >= effect => best,
            _ => Some((i, effect)),
        })
}

/// Builds the top-level interaction groups, sorted by descending |score|.
pub fn build_groups(
    main_effects: &[MainEffect],
    correlations: &CorrelationMatrix,
    scorer: &SubsetScorer<'_>,
    config: &ExplainerConfig,
    target_std: f64,
) -> Vec<GroupNode> {
    let mut main_players = correlation_pregroup(main_effects, correlations, scorer, config);
    let mut groups = Vec::new();

    while !main_players.is_empty() {
        let main_player = main_players.remove(0);
        let mut group = GroupNode::new(GroupKind::Single, vec![main_player], scorer);

        while let Some((index, effect)) = strongest_interaction(&group, &main_players, scorer, config) {
            if effect <= 0.0 {
                break;
            }
            let candidate = main_players.remove(index);
            trace!(
                features = ?candidate.features(),
                effect,
                "Merging interacting candidate"
            );
            group.push(candidate, scorer);
        }
        groups.push(group);
    }

    sort_by_abs_score(&mut groups);

    if config.is_reduced {
        let boundary = target_std * config.reduction_boundary_factor;
        groups.retain(|g| g.score().abs() > boundary);
    }
    groups
}
