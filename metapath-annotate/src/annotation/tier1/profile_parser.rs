// Tier 1: Profile Search Report Parser
//
// Concept: Convert a profile search text report into AnnotationHits (source = PROFILE)
// Synchronization: Accepts raw report bytes, outputs Vec<AnnotationHit> in report order
//
// Report structure (per query profile):
//   Query:       K00013  [M=469]
//   Scores for complete sequences ...
//       E-value  score  bias    E-value  score  bias    exp  N  Sequence  Description
//       ------- ------ -----    ------- ------ -----   ---- --  --------  -----------
//       1.2e-150  500.1   0.1   1.5e-150  499.8   0.1    1.0  1  protein_1  ...
//   Domain annotation for each sequence (and alignments):
//   >> protein_1
//      ... per-domain rows ...
//   Internal pipeline statistics summary:
//   //
//
// Algorithm:
// 1. Track the current query KO from `Query:` lines (first K\d{5} token)
// 2. In the score section, a line is a data row only if it has at least 9
//    columns, column 6 (exp) is a float and column 7 (N) is an integer.
//    Header, separator and threshold rows fail this check structurally.
// 3. Domain annotation and pipeline statistics sections are skipped until the
//    next `Query:` or `//`
// 4. sequence_name is column 8; placeholder names are dropped
// 5. score is column 1; unparseable scores become -inf

use super::hit_fields::{extract_ko, is_placeholder_id, parse_score};
use super::text_decode::{decode_lines, truncate_for_log};
use crate::annotation::types::{AnnotationHit, HitSource, LineParseError};

/// Minimum column count of a score row
const SCORE_ROW_COLUMNS: usize = 9;

/// Section of the report currently being read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReportSection {
    Scores,
    Skipped,
}

/// Profile search report parser (Tier 1 concept)
///
/// **Legible Software Principle:**
/// - Independent module: Pure parsing, no I/O
/// - Explicit synchronization: Outputs the uniform AnnotationHit contract
/// - Integrity: Rows are classified by column structure, never by text content
#[derive(Debug, Clone, Default)]
pub struct ProfileReportParser;

impl ProfileReportParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a full report
    ///
    /// # Arguments
    /// * `raw` - Report bytes exactly as written by the tool
    ///
    /// # Returns
    /// Hits in report order. Never fails; unusable lines are logged and skipped.
    pub fn parse(&self, raw: &[u8]) -> Vec<AnnotationHit> {
        let mut hits = Vec::new();
        let mut section = ReportSection::Scores;
        let mut current_ko: Option<String> = None;
        let mut skipped_lines = 0usize;

        for line in decode_lines(raw) {
            let trimmed = line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            if let Some(query) = trimmed.strip_prefix("Query:") {
                current_ko = extract_ko(query);
                section = ReportSection::Scores;
                continue;
            }
            if trimmed == "//" {
                current_ko = None;
                section = ReportSection::Scores;
                continue;
            }
            if trimmed.starts_with("Domain annotation")
                || trimmed.starts_with("Internal pipeline statistics")
                || trimmed.starts_with(">>")
            {
                section = ReportSection::Skipped;
                continue;
            }
            if section == ReportSection::Skipped {
                continue;
            }

            match Self::parse_score_row(trimmed, current_ko.as_deref()) {
                Ok(hit) => hits.push(hit),
                Err(e) => {
                    skipped_lines += 1;
                    tracing::debug!(
                        stage = "profile_search",
                        line = %truncate_for_log(trimmed),
                        reason = %e,
                        "Skipping report line"
                    );
                }
            }
        }

        tracing::debug!(hits = hits.len(), skipped_lines, "Parsed profile search report");
        hits
    }

    /// Classify and parse one score-section line
    ///
    /// # Returns
    /// The hit for a data row, or why the line is not one
    pub fn parse_score_row(line: &str, query_ko: Option<&str>) -> Result<AnnotationHit, LineParseError> {
        let columns: Vec<&str> = line.split_whitespace().collect();
        if columns.len() < SCORE_ROW_COLUMNS {
            return Err(LineParseError::ColumnCount {
                expected: ">= 9",
                found: columns.len(),
            });
        }

        // Structural check: expected domain count and domain count are numeric
        if columns[6].parse::<f64>().is_err() {
            return Err(LineParseError::ColumnType {
                column: 6,
                value: columns[6].to_string(),
            });
        }
        if columns[7].parse::<u32>().is_err() {
            return Err(LineParseError::ColumnType {
                column: 7,
                value: columns[7].to_string(),
            });
        }

        let sequence_name = columns[8];
        if is_placeholder_id(sequence_name) {
            return Err(LineParseError::PlaceholderId(sequence_name.to_string()));
        }

        Ok(AnnotationHit {
            protein_id: sequence_name.to_string(),
            ko_id: query_ko.map(str::to_string),
            ec_number: None,
            score: parse_score(columns[1]),
            source: HitSource::Profile,
        })
    }
}
