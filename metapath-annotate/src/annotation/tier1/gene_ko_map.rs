// Tier 1: Gene -> KO Mapping for reference hits
//
// Concept: Resolve a reference search subject id to a KEGG ortholog
// Synchronization: Loaded once per process from a two-column file, shared read-only
//
// File format (tab-separated, '#' comments):
//   K00013<TAB>eco:b2020
//   ko:K01580<TAB>eco:b3517
//
// Lookup order:
// 1. Exact subject id match in the map
// 2. First K\d{5} token inside the subject id itself

use super::hit_fields::extract_ko;
use super::text_decode::decode_lines;
use std::collections::HashMap;
use std::path::Path;

/// Subject id -> KO lookup table
#[derive(Debug, Clone, Default)]
pub struct GeneKoMap {
    gene_to_ko: HashMap<String, String>,
}

impl GeneKoMap {
    /// Load the mapping file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let raw = std::fs::read(path)?;
        let map = Self::from_bytes(&raw);
        tracing::info!(path = %path.display(), entries = map.len(), "Loaded gene to KO map");
        Ok(map)
    }

    /// Parse mapping content; malformed lines are skipped
    pub fn from_bytes(raw: &[u8]) -> Self {
        let mut gene_to_ko = HashMap::new();

        for line in decode_lines(raw) {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let mut columns = line.split('\t');
            let (Some(ko_column), Some(gene)) = (columns.next(), columns.next()) else {
                tracing::debug!(line = %line, "Skipping gene map line without two columns");
                continue;
            };
            let Some(ko) = extract_ko(ko_column) else {
                tracing::debug!(line = %line, "Skipping gene map line without KO identifier");
                continue;
            };
            // First mapping wins for duplicated genes
            gene_to_ko.entry(gene.trim().to_string()).or_insert(ko);
        }

        Self { gene_to_ko }
    }

    /// KO for a reference subject id
    pub fn resolve(&self, subject_id: &str) -> Option<String> {
        self.gene_to_ko
            .get(subject_id)
            .cloned()
            .or_else(|| extract_ko(subject_id))
    }

    pub fn len(&self) -> usize {
        self.gene_to_ko.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gene_to_ko.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_and_resolve() {
        let map = GeneKoMap::from_bytes(
            b"# KO\tgene\nK00013\teco:b2020\nko:K01580\teco:b3517\nbroken line\n",
        );
        assert_eq!(map.len(), 2);
        assert_eq!(map.resolve("eco:b2020"), Some("K00013".to_string()));
        assert_eq!(map.resolve("eco:b3517"), Some("K01580".to_string()));
    }

    #[test]
    fn test_falls_back_to_subject_pattern() {
        let map = GeneKoMap::default();
        assert!(map.is_empty());
        assert_eq!(map.resolve("gadB|K01580"), Some("K01580".to_string()));
        assert_eq!(map.resolve("eco:b9999"), None);
    }

    #[test]
    fn test_first_mapping_wins() {
        let map = GeneKoMap::from_bytes(b"K00013\tgeneA\nK09999\tgeneA\n");
        assert_eq!(map.resolve("geneA"), Some("K00013".to_string()));
    }
}
