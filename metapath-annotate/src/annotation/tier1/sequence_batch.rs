// Tier 1: Sequence Batch Reader/Writer
//
// Concept: Validate input FASTA into a batch of SequenceRecords and write
// query subsets for the search stages
// Synchronization: Accepts FASTA bytes, outputs Vec<SequenceRecord> (input order)
//
// Records are read and written with bio::io::fasta. Bytes are decoded first
// (UTF-8, ISO-8859-1 fallback per line) since the reader only accepts UTF-8.
//
// Validation rules:
// 1. protein_id is the record id (first whitespace-separated token after '>')
// 2. Lines before the first header are ignored
// 3. Records with a placeholder id or an empty sequence are dropped
// 4. Duplicate ids keep the first occurrence
// 5. A batch with no valid records is EmptyBatch

use super::hit_fields::is_placeholder_id;
use super::text_decode::decode_lines;
use crate::annotation::types::{AnnotationError, AnnotationResult, SequenceRecord};
use bio::io::fasta;
use std::collections::HashSet;
use std::path::Path;

/// File extensions accepted as protein/nucleotide FASTA input
pub const ACCEPTED_EXTENSIONS: [&str; 7] = ["fasta", "fa", "fas", "fna", "ffn", "faa", "frn"];

/// Parse and validate a FASTA batch
pub fn parse_fasta(raw: &[u8]) -> AnnotationResult<Vec<SequenceRecord>> {
    let text = normalized_fasta_text(raw);
    let mut records: Vec<SequenceRecord> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut dropped = 0usize;

    for result in fasta::Reader::new(text.as_bytes()).records() {
        let record = result.map_err(|e| AnnotationError::InvalidInput(format!("Malformed FASTA: {}", e)))?;
        let protein_id = record.id().to_string();
        let sequence: String = String::from_utf8_lossy(record.seq())
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();

        if is_placeholder_id(&protein_id) {
            tracing::warn!(protein_id = %protein_id, "Dropping record with placeholder id");
            dropped += 1;
        } else if sequence.is_empty() {
            tracing::warn!(protein_id = %protein_id, "Dropping record with empty sequence");
            dropped += 1;
        } else if !seen.insert(protein_id.clone()) {
            tracing::warn!(protein_id = %protein_id, "Dropping duplicate record id");
            dropped += 1;
        } else {
            records.push(SequenceRecord { protein_id, sequence });
        }
    }

    if records.is_empty() {
        return Err(AnnotationError::EmptyBatch(format!(
            "0 valid records ({} dropped)",
            dropped
        )));
    }

    tracing::info!(records = records.len(), dropped, "Validated sequence batch");
    Ok(records)
}

/// Decoded FASTA text starting at the first header line
///
/// A bare '>' header would read as an empty record and end the record
/// stream, so it gets the placeholder id "-" and is dropped like one.
fn normalized_fasta_text(raw: &[u8]) -> String {
    let mut text = String::with_capacity(raw.len());
    for line in decode_lines(raw)
        .into_iter()
        .skip_while(|line| !line.trim_start().starts_with('>'))
    {
        let line = line.trim();
        if line == ">" {
            text.push_str(">-");
        } else {
            text.push_str(line);
        }
        text.push('\n');
    }
    text
}

/// Check an input file's extension and size before reading it
pub fn validate_input_file(path: &Path, max_bytes: u64) -> AnnotationResult<()> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();
    if !ACCEPTED_EXTENSIONS.contains(&extension.as_str()) {
        return Err(AnnotationError::InvalidInput(format!(
            "{}: unsupported extension (expected one of {})",
            path.display(),
            ACCEPTED_EXTENSIONS.join(", ")
        )));
    }

    let size = std::fs::metadata(path)?.len();
    if size > max_bytes {
        return Err(AnnotationError::InvalidInput(format!(
            "{}: {} bytes exceeds limit of {} bytes",
            path.display(),
            size,
            max_bytes
        )));
    }
    Ok(())
}

/// Write records as FASTA (input order preserved)
pub fn write_fasta<'a, I>(path: &Path, records: I) -> AnnotationResult<usize>
where
    I: IntoIterator<Item = &'a SequenceRecord>,
{
    let mut writer = fasta::Writer::to_file(path)?;
    let mut written = 0usize;

    for record in records {
        writer.write(&record.protein_id, None, record.sequence.as_bytes())?;
        written += 1;
    }
    writer.flush()?;
    Ok(written)
}
