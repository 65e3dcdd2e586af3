//! Test fixtures: batches, tool outputs, configuration

use metapath_annotate::annotation::tier1::GeneKoMap;
use metapath_annotate::annotation::tier3::PathwayCatalog;
use metapath_annotate::annotation::types::PathwayDefinition;
use metapath_annotate::{AnnotateConfig, AnnotationContext};
use std::path::{Path, PathBuf};

/// FASTA bytes with one short record per id
pub fn batch_fasta(ids: &[&str]) -> Vec<u8> {
    ids.iter()
        .map(|id| format!(">{} test record\nMSKGEELFTGVVPILVELDGDVNGHKF\n", id))
        .collect::<String>()
        .into_bytes()
}

/// Catalog with the GABA production pathway {K00013, K01580}, weight 1.0
pub fn gaba_catalog() -> PathwayCatalog {
    PathwayCatalog::from_definitions(vec![PathwayDefinition {
        name: "GABA_PRODUCTION".to_string(),
        expected_ko_set: ["K00013", "K01580"].iter().map(|s| s.to_string()).collect(),
        weight: 1.0,
    }])
    .unwrap()
}

/// Configuration with every reference configured and work dir under `work_dir`
pub fn test_config(work_dir: &Path) -> AnnotateConfig {
    let mut config = AnnotateConfig::default();
    config.work_dir = work_dir.to_path_buf();
    config.threads = 2;
    config.databases.profile_catalog = Some(PathBuf::from("/refs/profiles.hmm"));
    config.databases.small_reference = Some(PathBuf::from("/refs/gut.dmnd"));
    config.databases.full_reference = Some(PathBuf::from("/refs/full.dmnd"));
    config
}

pub fn test_context(work_dir: &Path) -> AnnotationContext {
    AnnotationContext::new(test_config(work_dir), gaba_catalog(), GeneKoMap::default())
}

/// Builder for profile search text reports
#[derive(Default)]
pub struct ProfileReport {
    text: String,
}

impl ProfileReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// One query block with (sequence_name, score) rows
    pub fn query(mut self, ko: &str, rows: &[(&str, &str)]) -> Self {
        self.text.push_str(&format!("Query:       {}  [M=400]\n", ko));
        self.text.push_str("Scores for complete sequences (score includes all domains):\n");
        self.text.push_str("   --- full sequence ---   --- best 1 domain ---    -#dom-\n");
        self.text.push_str("    E-value  score  bias    E-value  score  bias    exp  N  Sequence  Description\n");
        self.text.push_str("    ------- ------ -----    ------- ------ -----   ---- --  --------  -----------\n");
        for (name, score) in rows {
            self.text.push_str(&format!(
                "        0.1  {}   0.1       0.46   -4.8   0.0    1.1  0  {}\n",
                score, name
            ));
        }
        self.text.push_str("\nDomain annotation for each sequence (and alignments):\n");
        for (name, _) in rows {
            self.text.push_str(&format!(">> {}\n", name));
            self.text.push_str("   1 !  10.0   0.1  1e-5  1e-5  1  400 ..  1  400 ..  1  400 .. 0.99\n");
        }
        self.text.push_str("//\n");
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.text.into_bytes()
    }
}

/// One 12-column alignment row
pub fn alignment_row(query: &str, subject: &str, bitscore: f64) -> String {
    format!(
        "{}\t{}\t90.0\t300\t30\t0\t1\t300\t1\t300\t1e-100\t{}\n",
        query, subject, bitscore
    )
}
