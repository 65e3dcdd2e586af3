// Tier 1: Small Reference Search Parser
//
// Concept: Convert the reduced-reference alignment table into AnnotationHits (source = SMALL_REF)
// Synchronization: Accepts raw tab-separated bytes, outputs Vec<AnnotationHit> in table order
//
// Hits without a resolvable KO are kept (ko_id = None): the protein still
// counts as matched when the orchestrator computes the unmatched remainder.

use super::alignment_row::parse_alignment_row;
use super::gene_ko_map::GeneKoMap;
use super::text_decode::{decode_lines, truncate_for_log};
use crate::annotation::types::{AnnotationHit, HitSource};
use std::sync::Arc;

/// Small reference search parser (Tier 1 concept)
#[derive(Debug, Clone, Default)]
pub struct SmallReferenceParser {
    gene_map: Arc<GeneKoMap>,
}

impl SmallReferenceParser {
    pub fn new(gene_map: Arc<GeneKoMap>) -> Self {
        Self { gene_map }
    }

    /// Parse the whole hit table; unusable lines are logged and skipped
    pub fn parse(&self, raw: &[u8]) -> Vec<AnnotationHit> {
        let mut hits = Vec::new();
        let mut skipped_lines = 0usize;

        for line in decode_lines(raw) {
            if line.trim().is_empty() || line.starts_with('#') {
                continue;
            }
            let columns: Vec<&str> = line.split('\t').collect();
            match parse_alignment_row(&columns, HitSource::SmallRef, &self.gene_map) {
                Ok(hit) => hits.push(hit),
                Err(e) => {
                    skipped_lines += 1;
                    tracing::debug!(
                        stage = "small_reference_search",
                        line = %truncate_for_log(&line),
                        reason = %e,
                        "Skipping hit table line"
                    );
                }
            }
        }

        tracing::debug!(hits = hits.len(), skipped_lines, "Parsed small reference hit table");
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_rows_and_skips_noise() {
        let raw = b"# DIAMOND v2 output\n\
prot_1\teco:b2020\t95.0\t430\t20\t0\t1\t430\t1\t430\t0.0\t850.0\n\
---\tK00013\t95.0\t430\t20\t0\t1\t430\t1\t430\t0.0\t850.0\n\
truncated\trow\n\
prot_2\tunmapped_gene\t40.0\t120\t70\t3\t10\t130\t5\t125\t1e-5\t45.2\n";
        let map = Arc::new(GeneKoMap::from_bytes(b"K00013\teco:b2020\n"));
        let hits = SmallReferenceParser::new(map).parse(raw);

        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].protein_id, "prot_1");
        assert_eq!(hits[0].ko_id.as_deref(), Some("K00013"));
        assert_eq!(hits[1].protein_id, "prot_2");
        assert_eq!(hits[1].ko_id, None);
        assert!(hits.iter().all(|h| h.source == HitSource::SmallRef));
    }

    #[test]
    fn test_non_utf8_line_does_not_disturb_neighbours() {
        let mut raw = Vec::new();
        raw.extend_from_slice(b"prot_1\tK00013_gadA\t95.0\t430\t20\t0\t1\t430\t1\t430\t0.0\t850.0\n");
        // ISO-8859-1 e-acute in the subject id
        raw.extend_from_slice(b"prot_2\tK01580_gadB_\xe9coli\t80.0\t400\t60\t1\t1\t400\t1\t400\t1e-90\t310.5\n");
        raw.extend_from_slice(b"prot_3\tK00013_gadA\t70.0\t420\t90\t2\t1\t420\t1\t420\t1e-80\t280.0\n");

        let hits = SmallReferenceParser::default().parse(&raw);

        let ids: Vec<&str> = hits.iter().map(|h| h.protein_id.as_str()).collect();
        assert_eq!(ids, vec!["prot_1", "prot_2", "prot_3"]);
        assert_eq!(hits[1].ko_id.as_deref(), Some("K01580"));
        assert_eq!(hits[1].score, 310.5);
        assert_eq!(hits[2].score, 280.0);
    }

    #[test]
    fn test_empty_output_is_no_hits() {
        assert!(SmallReferenceParser::default().parse(b"").is_empty());
    }
}
