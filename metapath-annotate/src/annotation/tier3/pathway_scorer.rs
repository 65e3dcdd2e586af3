// Tier 3: Pathway Scorer
//
// Concept: Map merged annotations onto the pathway catalog
// Synchronization: Accepts &[MergedAnnotation] + &PathwayCatalog, outputs Vec<PathwayScore>
//
// Algorithm (per pathway):
// 1. detected = {annotation KO} ∩ expected_ko_set
// 2. coverage = |detected| / |expected_ko_set|   (0 when expected set is empty)
// 3. score    = coverage × weight
// 4. health from fixed score thresholds:
//      score < 0.1          -> CRITICAL
//      0.1 <= score < 0.5   -> LOW
//      0.5 <= score <= 2.0  -> NORMAL
//      score > 2.0          -> OPTIMAL

use super::pathway_catalog::PathwayCatalog;
use crate::annotation::types::{HealthStatus, MergedAnnotation, PathwayScore};
use std::collections::BTreeSet;

const CRITICAL_BELOW: f64 = 0.1;
const LOW_BELOW: f64 = 0.5;
const NORMAL_UP_TO: f64 = 2.0;

/// Pathway scorer (Tier 3 concept)
///
/// **Legible Software Principle:**
/// - Independent module: Pure scoring, no side effects
/// - Transparent behavior: Thresholds are constants, not configuration
/// - Integrity: coverage always in [0.0, 1.0]
#[derive(Debug, Clone, Default)]
pub struct PathwayScorer;

impl PathwayScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score every pathway in catalog order
    pub fn score(&self, annotations: &[MergedAnnotation], catalog: &PathwayCatalog) -> Vec<PathwayScore> {
        let observed: BTreeSet<&str> = annotations
            .iter()
            .filter_map(|a| a.ko_id.as_deref())
            .collect();

        catalog
            .pathways()
            .iter()
            .map(|pathway| {
                let detected_ko_set: BTreeSet<String> = pathway
                    .expected_ko_set
                    .iter()
                    .filter(|ko| observed.contains(ko.as_str()))
                    .cloned()
                    .collect();

                let expected_count = pathway.expected_ko_set.len();
                let coverage = if expected_count == 0 {
                    0.0
                } else {
                    detected_ko_set.len() as f64 / expected_count as f64
                };
                let score = coverage * pathway.weight;
                let health_status = health_for_score(score);

                tracing::debug!(
                    pathway = %pathway.name,
                    detected = detected_ko_set.len(),
                    expected = expected_count,
                    coverage,
                    score,
                    health = health_status.label(),
                    "Scored pathway"
                );

                PathwayScore {
                    pathway_name: pathway.name.clone(),
                    coverage,
                    score,
                    detected_ko_set,
                    expected_count,
                    weight: pathway.weight,
                    health_status,
                }
            })
            .collect()
    }
}

/// Health category for a weighted pathway score
pub fn health_for_score(score: f64) -> HealthStatus {
    if score < CRITICAL_BELOW {
        HealthStatus::Critical
    } else if score < LOW_BELOW {
        HealthStatus::Low
    } else if score <= NORMAL_UP_TO {
        HealthStatus::Normal
    } else {
        HealthStatus::Optimal
    }
}
