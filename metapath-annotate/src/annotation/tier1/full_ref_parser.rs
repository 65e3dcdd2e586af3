// Tier 1: Full Reference Search Parser
//
// Concept: Convert full-reference search output into AnnotationHits (source = FULL_REF)
// Synchronization: Accepts raw tab-separated bytes, outputs Vec<AnnotationHit> in table order
//
// Two row layouts are accepted, told apart by column count:
// - Functional annotation rows (>= 21 columns):
//     0 query  1 seed_ortholog  2 evalue  3 score  4 eggNOG_OGs  5 max_annot_lvl
//     6 COG_category  7 Description  8 Preferred_name  9 GOs  10 EC  11 KEGG_ko
//     12 KEGG_Pathway ... 20 PFAMs
//   EC and KO take the first comma-separated entry; '-' means absent; the
//   "ko:" prefix is dropped.
// - Alignment rows (12-14 columns), same as the small reference table.

use super::alignment_row::{parse_alignment_row, require_numeric};
use super::gene_ko_map::GeneKoMap;
use super::hit_fields::{extract_ko, first_listed, is_placeholder_id, parse_score};
use super::text_decode::{decode_lines, truncate_for_log};
use crate::annotation::types::{AnnotationHit, HitSource, LineParseError};
use std::sync::Arc;

/// Column count of a functional annotation row
const ANNOTATION_ROW_COLUMNS: usize = 21;

const COL_EVALUE: usize = 2;
const COL_SCORE: usize = 3;
const COL_EC: usize = 10;
const COL_KEGG_KO: usize = 11;

/// Full reference search parser (Tier 1 concept)
#[derive(Debug, Clone, Default)]
pub struct FullReferenceParser {
    gene_map: Arc<GeneKoMap>,
}

impl FullReferenceParser {
    pub fn new(gene_map: Arc<GeneKoMap>) -> Self {
        Self { gene_map }
    }

    /// Parse the whole output; unusable lines are logged and skipped
    pub fn parse(&self, raw: &[u8]) -> Vec<AnnotationHit> {
        let mut hits = Vec::new();
        let mut skipped_lines = 0usize;

        for line in decode_lines(raw) {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            match self.parse_line(&line) {
                Ok(hit) => hits.push(hit),
                Err(e) => {
                    skipped_lines += 1;
                    tracing::debug!(
                        stage = "full_reference_search",
                        line = %truncate_for_log(&line),
                        reason = %e,
                        "Skipping full reference line"
                    );
                }
            }
        }

        tracing::debug!(hits = hits.len(), skipped_lines, "Parsed full reference output");
        hits
    }

    /// Dispatch one line by its column count
    pub fn parse_line(&self, line: &str) -> Result<AnnotationHit, LineParseError> {
        let columns: Vec<&str> = line.split('\t').collect();
        if columns.len() >= ANNOTATION_ROW_COLUMNS {
            parse_annotation_row(&columns)
        } else {
            parse_alignment_row(&columns, HitSource::FullRef, &self.gene_map)
        }
    }
}

fn parse_annotation_row(columns: &[&str]) -> Result<AnnotationHit, LineParseError> {
    require_numeric::<f64>(columns, COL_EVALUE)?;

    let query_id = columns[0].trim();
    if is_placeholder_id(query_id) {
        return Err(LineParseError::PlaceholderId(query_id.to_string()));
    }

    let ko_id = first_listed(columns[COL_KEGG_KO]).and_then(extract_ko);
    let ec_number = first_listed(columns[COL_EC]).map(str::to_string);

    Ok(AnnotationHit {
        protein_id: query_id.to_string(),
        ko_id,
        ec_number,
        score: parse_score(columns[COL_SCORE]),
        source: HitSource::FullRef,
    })
}
