// Tier 3: Pathway Catalog and Scoring
//
// Contract: the catalog is loaded once per process and shared read-only; the
// scorer derives one PathwayScore per PathwayDefinition from the merged
// annotations of a single job.

pub mod pathway_catalog;
pub mod pathway_scorer;

pub use pathway_catalog::PathwayCatalog;
pub use pathway_scorer::PathwayScorer;
