// Tier 1: Tabular alignment row (BLAST-style outfmt 6)
//
// Columns:
//   0 qseqid  1 sseqid  2 pident  3 length  4 mismatch  5 gapopen
//   6 qstart  7 qend    8 sstart  9 send   10 evalue   11 bitscore
//   [12 qcovhsp  13 scovhsp]
//
// A row is a data row only if it has 12 to 14 columns and pident, length and
// qstart hold numbers. The hit's score is the bitscore.

use super::gene_ko_map::GeneKoMap;
use super::hit_fields::{is_placeholder_id, parse_score};
use crate::annotation::types::{AnnotationHit, HitSource, LineParseError};

pub const MIN_ALIGNMENT_COLUMNS: usize = 12;
pub const MAX_ALIGNMENT_COLUMNS: usize = 14;

/// Parse one tab-separated alignment row
pub fn parse_alignment_row(
    columns: &[&str],
    source: HitSource,
    gene_map: &GeneKoMap,
) -> Result<AnnotationHit, LineParseError> {
    if !(MIN_ALIGNMENT_COLUMNS..=MAX_ALIGNMENT_COLUMNS).contains(&columns.len()) {
        return Err(LineParseError::ColumnCount {
            expected: "12-14",
            found: columns.len(),
        });
    }

    require_numeric::<f64>(columns, 2)?;
    require_numeric::<u32>(columns, 3)?;
    require_numeric::<u32>(columns, 6)?;

    let query_id = columns[0].trim();
    if is_placeholder_id(query_id) {
        return Err(LineParseError::PlaceholderId(query_id.to_string()));
    }

    Ok(AnnotationHit {
        protein_id: query_id.to_string(),
        ko_id: gene_map.resolve(columns[1].trim()),
        ec_number: None,
        score: parse_score(columns[11]),
        source,
    })
}

/// Column type check used to tell data rows from headers
pub(crate) fn require_numeric<T: std::str::FromStr>(
    columns: &[&str],
    column: usize,
) -> Result<(), LineParseError> {
    match columns.get(column) {
        Some(value) if value.trim().parse::<T>().is_ok() => Ok(()),
        Some(value) => Err(LineParseError::ColumnType {
            column,
            value: value.to_string(),
        }),
        None => Err(LineParseError::ColumnCount {
            expected: "more",
            found: columns.len(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn split(line: &str) -> Vec<&str> {
        line.split('\t').collect()
    }

    #[test]
    fn test_twelve_column_row() {
        let map = GeneKoMap::from_bytes(b"K01580\teco:b3517\n");
        let line = "prot_7\teco:b3517\t88.5\t460\t53\t0\t1\t460\t1\t460\t1.2e-200\t812.4";
        let hit = parse_alignment_row(&split(line), HitSource::SmallRef, &map).unwrap();

        assert_eq!(hit.protein_id, "prot_7");
        assert_eq!(hit.ko_id.as_deref(), Some("K01580"));
        assert_eq!(hit.score, 812.4);
        assert_eq!(hit.source, HitSource::SmallRef);
    }

    #[test]
    fn test_fourteen_column_row_with_coverage() {
        let line = "prot_8\tgadB|K01580\t70.0\t300\t90\t1\t5\t304\t2\t301\t1e-50\t200\t98.1\t95.0";
        let hit = parse_alignment_row(&split(line), HitSource::FullRef, &GeneKoMap::default()).unwrap();
        assert_eq!(hit.ko_id.as_deref(), Some("K01580"));
    }

    #[test]
    fn test_header_row_rejected() {
        let line = "qseqid\tsseqid\tpident\tlength\tmismatch\tgapopen\tqstart\tqend\tsstart\tsend\tevalue\tbitscore";
        assert!(matches!(
            parse_alignment_row(&split(line), HitSource::SmallRef, &GeneKoMap::default()),
            Err(LineParseError::ColumnType { column: 2, .. })
        ));
    }

    #[test]
    fn test_wrong_column_count() {
        assert!(matches!(
            parse_alignment_row(&split("a\tb\tc"), HitSource::SmallRef, &GeneKoMap::default()),
            Err(LineParseError::ColumnCount { found: 3, .. })
        ));
    }
}
