// Tier 2: Annotation Merger
//
// Concept: Reconcile hits from all search stages into one annotation per protein
// Synchronization: Accepts &[AnnotationHit] + batch, outputs Vec<MergedAnnotation>
//
// Algorithm:
// 1. Discard hits whose protein_id is a placeholder or not in the batch
// 2. Group remaining hits by protein_id
// 3. Candidates = hits carrying a KO (all hits if none carry one)
// 4. Representative hit = best candidate by source priority
//    (PROFILE > FULL_REF > SMALL_REF), then highest score, then KO/EC text
// 5. EC comes from the representative, else from the highest-priority hit
//    agreeing on the same KO
// 6. Confidence:
//    HIGH   if >= 2 distinct sources report the chosen KO
//    MEDIUM if exactly one high-priority source (PROFILE, FULL_REF) contributed
//    LOW    otherwise
//
// Result is independent of input hit order.

use crate::annotation::tier1::hit_fields::is_placeholder_id;
use crate::annotation::types::{
    AnnotationHit, Confidence, HitSource, MergedAnnotation, SequenceRecord,
};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// Annotation merger (Tier 2 fusion concept)
///
/// **Legible Software Principle:**
/// - Independent module: Pure merge logic, no side effects
/// - Explicit synchronization: Consumes the Tier 1 hit contract only
/// - Transparent behavior: Priority order and confidence rules are fixed
/// - Integrity: Exactly one MergedAnnotation per protein with >= 1 valid hit
#[derive(Debug, Clone, Default)]
pub struct AnnotationMerger;

impl AnnotationMerger {
    pub fn new() -> Self {
        Self
    }

    /// Merge hits from every stage
    ///
    /// # Arguments
    /// * `hits` - Hits from all stages, any order
    /// * `batch` - The job's validated sequence batch
    ///
    /// # Returns
    /// One MergedAnnotation per protein with at least one valid hit, ordered by protein_id
    pub fn merge(&self, hits: &[AnnotationHit], batch: &[SequenceRecord]) -> Vec<MergedAnnotation> {
        let batch_ids: HashSet<&str> = batch.iter().map(|r| r.protein_id.as_str()).collect();
        let mut grouped: BTreeMap<&str, Vec<&AnnotationHit>> = BTreeMap::new();
        let mut discarded = 0usize;

        for hit in hits {
            if is_placeholder_id(&hit.protein_id) || !batch_ids.contains(hit.protein_id.as_str()) {
                discarded += 1;
                continue;
            }
            grouped.entry(hit.protein_id.as_str()).or_default().push(hit);
        }

        if discarded > 0 {
            tracing::debug!(discarded, "Discarded hits for unknown or placeholder protein ids");
        }

        let merged: Vec<MergedAnnotation> = grouped
            .into_iter()
            .filter_map(|(protein_id, protein_hits)| Self::merge_protein(protein_id, &protein_hits))
            .collect();

        tracing::info!(
            proteins = merged.len(),
            high = merged.iter().filter(|m| m.confidence == Confidence::High).count(),
            medium = merged.iter().filter(|m| m.confidence == Confidence::Medium).count(),
            low = merged.iter().filter(|m| m.confidence == Confidence::Low).count(),
            "Merged annotations"
        );
        merged
    }

    fn merge_protein(protein_id: &str, hits: &[&AnnotationHit]) -> Option<MergedAnnotation> {
        let with_ko: Vec<&AnnotationHit> = hits.iter().copied().filter(|h| h.ko_id.is_some()).collect();
        let candidates: &[&AnnotationHit] = if with_ko.is_empty() { hits } else { &with_ko };

        let best = candidates.iter().copied().min_by(|a, b| compare_hits(a, b))?;
        let ko_id = best.ko_id.clone();

        let ec_number = best.ec_number.clone().or_else(|| {
            let mut agreeing: Vec<&AnnotationHit> = hits
                .iter()
                .copied()
                .filter(|h| ko_id.is_some() && h.ko_id == ko_id && h.ec_number.is_some())
                .collect();
            agreeing.sort_by(|a, b| compare_hits(a, b));
            agreeing.first().and_then(|h| h.ec_number.clone())
        });

        let contributing_sources: BTreeSet<HitSource> = hits.iter().map(|h| h.source).collect();
        let confidence = Self::confidence(ko_id.as_deref(), hits, &contributing_sources);

        Some(MergedAnnotation {
            protein_id: protein_id.to_string(),
            ko_id,
            ec_number,
            confidence,
            contributing_sources,
        })
    }

    fn confidence(
        ko_id: Option<&str>,
        hits: &[&AnnotationHit],
        contributing_sources: &BTreeSet<HitSource>,
    ) -> Confidence {
        if let Some(ko) = ko_id {
            let agreeing_sources: BTreeSet<HitSource> = hits
                .iter()
                .filter(|h| h.ko_id.as_deref() == Some(ko))
                .map(|h| h.source)
                .collect();
            if agreeing_sources.len() >= 2 {
                return Confidence::High;
            }
        }

        let high_priority = contributing_sources.iter().filter(|s| s.is_high_priority()).count();
        if high_priority == 1 {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// Total order over hits: better hit sorts first
fn compare_hits(a: &AnnotationHit, b: &AnnotationHit) -> Ordering {
    a.source
        .priority_rank()
        .cmp(&b.source.priority_rank())
        .then_with(|| b.score.total_cmp(&a.score))
        .then_with(|| a.ko_id.cmp(&b.ko_id))
        .then_with(|| a.ec_number.cmp(&b.ec_number))
}
