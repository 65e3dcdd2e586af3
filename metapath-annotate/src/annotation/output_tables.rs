// Output Tables
//
// Concept: Present merged annotations and pathway scores as the two result tables
// Synchronization: Accepts MergedAnnotation / PathwayScore, outputs serializable rows and CSV files
//
// Enzyme table (one row per MergedAnnotation):
//   protein_id, EC_number, KEGG_KO, confidence_score, annotation_source
//   ordered HIGH -> MEDIUM -> LOW, then protein_id; missing values are "-"
//
// Pathway table (one row per PathwayDefinition):
//   pathway_group, coverage, pathway_score, enzymes_detected,
//   enzymes_detected_count, enzymes_expected_count, pathway_weight, health_status
//   ordered by pathway_score descending, then pathway_group

use crate::annotation::tier1::sequence_batch::write_fasta;
use crate::annotation::types::{AnnotationResult, MergedAnnotation, PathwayScore, SequenceRecord};
use serde::Serialize;
use std::collections::HashSet;
use std::path::Path;

/// Detected KOs listed before the rest are summarised as "(+N more)"
const MAX_LISTED_ENZYMES: usize = 10;

const MISSING: &str = "-";

/// Enzyme-level table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EnzymeRow {
    pub protein_id: String,
    #[serde(rename = "EC_number")]
    pub ec_number: String,
    #[serde(rename = "KEGG_KO")]
    pub kegg_ko: String,
    pub confidence_score: String,
    pub annotation_source: String,
}

/// Pathway-level table row
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PathwayRow {
    pub pathway_group: String,
    pub coverage: f64,
    pub pathway_score: f64,
    pub enzymes_detected: String,
    pub enzymes_detected_count: usize,
    pub enzymes_expected_count: usize,
    pub pathway_weight: f64,
    pub health_status: String,
}

/// Build enzyme table rows in presentation order
pub fn enzyme_rows(annotations: &[MergedAnnotation]) -> Vec<EnzymeRow> {
    let mut sorted: Vec<&MergedAnnotation> = annotations.iter().collect();
    sorted.sort_by(|a, b| {
        a.confidence
            .cmp(&b.confidence)
            .then_with(|| a.protein_id.cmp(&b.protein_id))
    });

    sorted
        .into_iter()
        .map(|a| EnzymeRow {
            protein_id: a.protein_id.clone(),
            ec_number: a.ec_number.clone().unwrap_or_else(|| MISSING.to_string()),
            kegg_ko: a.ko_id.clone().unwrap_or_else(|| MISSING.to_string()),
            confidence_score: a.confidence.label().to_string(),
            // BTreeSet iterates in priority order
            annotation_source: a
                .contributing_sources
                .iter()
                .map(|s| s.label())
                .collect::<Vec<_>>()
                .join("+"),
        })
        .collect()
}

/// Build pathway table rows in presentation order
pub fn pathway_rows(scores: &[PathwayScore]) -> Vec<PathwayRow> {
    let mut sorted: Vec<&PathwayScore> = scores.iter().collect();
    sorted.sort_by(|a, b| {
        b.score
            .total_cmp(&a.score)
            .then_with(|| a.pathway_name.cmp(&b.pathway_name))
    });

    sorted
        .into_iter()
        .map(|s| PathwayRow {
            pathway_group: s.pathway_name.clone(),
            coverage: round4(s.coverage),
            pathway_score: round4(s.score),
            enzymes_detected: list_enzymes(s.detected_ko_set.iter().map(String::as_str)),
            enzymes_detected_count: s.detected_ko_set.len(),
            enzymes_expected_count: s.expected_count,
            pathway_weight: round4(s.weight),
            health_status: s.health_status.label().to_string(),
        })
        .collect()
}

/// Sorted KO list, truncated with a "(+N more)" suffix
fn list_enzymes<'a>(kos: impl Iterator<Item = &'a str>) -> String {
    let kos: Vec<&str> = kos.collect();
    if kos.is_empty() {
        return MISSING.to_string();
    }
    let listed = kos[..kos.len().min(MAX_LISTED_ENZYMES)].join(",");
    if kos.len() > MAX_LISTED_ENZYMES {
        format!("{} (+{} more)", listed, kos.len() - MAX_LISTED_ENZYMES)
    } else {
        listed
    }
}

fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Write any table as CSV with a header row
pub fn write_table<T: Serialize>(path: &Path, rows: &[T]) -> AnnotationResult<()> {
    let mut writer = csv::Writer::from_path(path)?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    tracing::info!(path = %path.display(), rows = rows.len(), "Wrote result table");
    Ok(())
}

/// Input records that received an annotation, in input order
pub fn annotated_records<'a>(
    batch: &'a [SequenceRecord],
    annotations: &[MergedAnnotation],
) -> Vec<&'a SequenceRecord> {
    let annotated: HashSet<&str> = annotations.iter().map(|a| a.protein_id.as_str()).collect();
    batch
        .iter()
        .filter(|r| annotated.contains(r.protein_id.as_str()))
        .collect()
}

/// Write the annotated subset of the batch as FASTA
pub fn write_annotated_fasta(
    path: &Path,
    batch: &[SequenceRecord],
    annotations: &[MergedAnnotation],
) -> AnnotationResult<usize> {
    write_fasta(path, annotated_records(batch, annotations))
}
