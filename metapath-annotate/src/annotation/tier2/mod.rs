// Tier 2: Cross-Source Annotation Merge
//
// Contract: accepts hits from every Tier 1 parser and outputs exactly one
// MergedAnnotation per protein, with the contributing sources recorded.

pub mod annotation_merger;

pub use annotation_merger::AnnotationMerger;
