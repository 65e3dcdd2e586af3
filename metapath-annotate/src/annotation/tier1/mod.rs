// Tier 1: Input Batch and Hit Parsers
//
// Each parser is a pure function from raw tool output bytes to the uniform
// AnnotationHit contract. Unusable lines are skipped, never fatal.

pub mod alignment_row;     // Shared tabular alignment row layout
pub mod full_ref_parser;   // Full reference output (annotation + alignment rows)
pub mod gene_ko_map;       // Subject id -> KO lookup
pub mod hit_fields;        // Placeholder ids, KO extraction, score fallback
pub mod profile_parser;    // Profile search text report
pub mod sequence_batch;    // FASTA validation and query subset writing
pub mod small_ref_parser;  // Reduced reference alignment table
pub mod text_decode;       // UTF-8 with ISO-8859-1 fallback

pub use full_ref_parser::FullReferenceParser;
pub use gene_ko_map::GeneKoMap;
pub use profile_parser::ProfileReportParser;
pub use small_ref_parser::SmallReferenceParser;
