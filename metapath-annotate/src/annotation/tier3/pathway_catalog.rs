// Tier 3: Pathway Catalog
//
// Concept: Fixed set of named pathways with their expected KO identifiers and weight
// Synchronization: Loaded once per process from CSV, shared read-only (Arc) across jobs
//
// CSV columns (header required):
//   pathway_group, expected_kos, weight (further descriptive columns are ignored)
// expected_kos is '|'-separated, e.g. "K00013|K01580".

use crate::annotation::tier1::hit_fields::extract_ko;
use crate::annotation::types::{AnnotationError, AnnotationResult, PathwayDefinition};
use serde::Deserialize;
use std::collections::{BTreeSet, HashSet};
use std::io::Read;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct CatalogRow {
    pathway_group: String,
    #[serde(default)]
    expected_kos: String,
    weight: f64,
}

/// Read-only pathway catalog
#[derive(Debug, Clone, Default)]
pub struct PathwayCatalog {
    pathways: Vec<PathwayDefinition>,
}

impl PathwayCatalog {
    /// Load the catalog CSV file
    pub fn load(path: &Path) -> AnnotationResult<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            AnnotationError::Catalog(format!("Cannot open {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_reader(file)?;
        tracing::info!(
            path = %path.display(),
            pathways = catalog.len(),
            "Loaded pathway catalog"
        );
        Ok(catalog)
    }

    /// Parse catalog CSV from any reader
    pub fn from_reader<R: Read>(reader: R) -> AnnotationResult<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .comment(Some(b'#'))
            .from_reader(reader);

        let mut pathways = Vec::new();
        for (index, row) in csv_reader.deserialize::<CatalogRow>().enumerate() {
            // header is line 1
            let line = index + 2;
            let row = row.map_err(|e| AnnotationError::Catalog(format!("line {}: {}", line, e)))?;
            pathways.push(Self::definition_from_row(row, line)?);
        }

        Self::from_definitions(pathways)
    }

    /// Build a catalog from already-constructed definitions
    pub fn from_definitions(pathways: Vec<PathwayDefinition>) -> AnnotationResult<Self> {
        let mut names = HashSet::new();
        for pathway in &pathways {
            if !names.insert(pathway.name.as_str()) {
                return Err(AnnotationError::Catalog(format!(
                    "Duplicate pathway name: {}",
                    pathway.name
                )));
            }
        }
        Ok(Self { pathways })
    }

    fn definition_from_row(row: CatalogRow, line: usize) -> AnnotationResult<PathwayDefinition> {
        if row.pathway_group.is_empty() {
            return Err(AnnotationError::Catalog(format!("line {}: empty pathway_group", line)));
        }
        if !row.weight.is_finite() || row.weight < 0.0 {
            return Err(AnnotationError::Catalog(format!(
                "line {}: invalid weight {} for {}",
                line, row.weight, row.pathway_group
            )));
        }

        let mut expected_ko_set = BTreeSet::new();
        for token in row.expected_kos.split('|').map(str::trim).filter(|t| !t.is_empty()) {
            match extract_ko(token) {
                Some(ko) if ko == token => {
                    expected_ko_set.insert(ko);
                }
                _ => tracing::warn!(
                    pathway = %row.pathway_group,
                    token = %token,
                    "Ignoring malformed KO identifier in pathway catalog"
                ),
            }
        }

        Ok(PathwayDefinition {
            name: row.pathway_group,
            expected_ko_set,
            weight: row.weight,
        })
    }

    pub fn pathways(&self) -> &[PathwayDefinition] {
        &self.pathways
    }

    pub fn len(&self) -> usize {
        self.pathways.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pathways.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_catalog() {
        let csv = "\
pathway_group,expected_kos,weight,display_name,description
GABA_PRODUCTION,K00013|K01580,1.0,GABA production,Glutamate decarboxylation
BUTYRATE,K00929 | K01034 | K01035,2.5,,
EMPTY_SET,,1.0,,
";
        let catalog = PathwayCatalog::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 3);

        let gaba = &catalog.pathways()[0];
        assert_eq!(gaba.name, "GABA_PRODUCTION");
        assert_eq!(gaba.expected_ko_set.len(), 2);

        let butyrate = &catalog.pathways()[1];
        assert_eq!(butyrate.weight, 2.5);
        assert!(butyrate.expected_ko_set.contains("K01035"));

        assert!(catalog.pathways()[2].expected_ko_set.is_empty());
    }

    #[test]
    fn test_descriptive_columns_are_optional() {
        let csv = "pathway_group,expected_kos,weight\nGABA_PRODUCTION,K00013|K01580,1.0\n";
        let catalog = PathwayCatalog::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.pathways()[0].weight, 1.0);
    }

    #[test]
    fn test_malformed_ko_ignored() {
        let csv = "pathway_group,expected_kos,weight\nX,K00013|bogus|K1,1.0\n";
        let catalog = PathwayCatalog::from_reader(csv.as_bytes()).unwrap();
        assert_eq!(catalog.pathways()[0].expected_ko_set.len(), 1);
    }

    #[test]
    fn test_rejects_bad_weight_and_duplicates() {
        let bad_weight = "pathway_group,expected_kos,weight\nX,K00013,-1\n";
        assert!(matches!(
            PathwayCatalog::from_reader(bad_weight.as_bytes()),
            Err(AnnotationError::Catalog(_))
        ));

        let duplicate = "pathway_group,expected_kos,weight\nX,K00013,1\nX,K01580,1\n";
        assert!(matches!(
            PathwayCatalog::from_reader(duplicate.as_bytes()),
            Err(AnnotationError::Catalog(_))
        ));

        let not_number = "pathway_group,expected_kos,weight\nX,K00013,heavy\n";
        assert!(matches!(
            PathwayCatalog::from_reader(not_number.as_bytes()),
            Err(AnnotationError::Catalog(_))
        ));
    }
}
