//! Configuration for metapath-annotate
//!
//! # Settings Sources Priority
//!
//! 1. Command-line arguments (--threads, --work-dir, --pathways)
//! 2. Environment variable METAPATH_CONFIG (selects the TOML file)
//! 3. TOML configuration file
//! 4. Built-in defaults (code constants)
//!
//! Tool commands are argv templates. Placeholders `{query}`, `{reference}`,
//! `{output}` and `{threads}` are substituted per argument; nothing is ever
//! passed through a shell.

use crate::annotation::types::SearchStage;
use metapath_common::config::{load_toml_or_default, LoggingConfig};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Annotation settings loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct AnnotateConfig {
    /// Parent directory for per-job working directories
    #[serde(default = "default_work_dir")]
    pub work_dir: PathBuf,

    /// Thread count handed to the search tools
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// Largest accepted input sequence file
    #[serde(default = "default_max_input_bytes")]
    pub max_input_bytes: u64,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub databases: DatabaseConfig,

    #[serde(default)]
    pub timeouts: TimeoutConfig,

    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Reference dataset locations (read-only, shared by all jobs)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatabaseConfig {
    /// Reduced profile catalog for the profile search
    #[serde(default)]
    pub profile_catalog: Option<PathBuf>,

    /// Reduced reference database (pathway-relevant proteins only)
    #[serde(default)]
    pub small_reference: Option<PathBuf>,

    /// Full reference database
    #[serde(default)]
    pub full_reference: Option<PathBuf>,

    /// Optional two-column KO/gene map for reference hits
    #[serde(default)]
    pub gene_ko_map: Option<PathBuf>,

    /// Pathway catalog CSV
    #[serde(default)]
    pub pathway_catalog: Option<PathBuf>,
}

/// Stage and job time limits
///
/// A stage without a fixed timeout gets one derived from its query file size.
#[derive(Debug, Clone, Deserialize)]
pub struct TimeoutConfig {
    #[serde(default)]
    pub profile_search_secs: Option<u64>,

    #[serde(default)]
    pub small_reference_search_secs: Option<u64>,

    #[serde(default)]
    pub full_reference_search_secs: Option<u64>,

    /// Wall-clock ceiling for a whole job
    #[serde(default = "default_job_ceiling_secs")]
    pub job_ceiling_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            profile_search_secs: None,
            small_reference_search_secs: None,
            full_reference_search_secs: None,
            job_ceiling_secs: default_job_ceiling_secs(),
        }
    }
}

/// External program invocation template
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ToolCommand {
    pub program: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Per-stage tool commands
#[derive(Debug, Clone, Deserialize)]
pub struct ToolsConfig {
    #[serde(default = "default_profile_tool")]
    pub profile_search: ToolCommand,

    #[serde(default = "default_small_reference_tool")]
    pub small_reference_search: ToolCommand,

    #[serde(default = "default_full_reference_tool")]
    pub full_reference_search: ToolCommand,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            profile_search: default_profile_tool(),
            small_reference_search: default_small_reference_tool(),
            full_reference_search: default_full_reference_tool(),
        }
    }
}

impl ToolsConfig {
    pub fn for_stage(&self, stage: SearchStage) -> &ToolCommand {
        match stage {
            SearchStage::ProfileSearch => &self.profile_search,
            SearchStage::SmallReferenceSearch => &self.small_reference_search,
            SearchStage::FullReferenceSearch => &self.full_reference_search,
        }
    }
}

/// Command-line overrides applied after loading TOML
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub threads: Option<usize>,
    pub work_dir: Option<PathBuf>,
    pub pathway_catalog: Option<PathBuf>,
}

fn default_work_dir() -> PathBuf {
    std::env::temp_dir().join("metapath")
}

fn default_threads() -> usize {
    4
}

fn default_max_input_bytes() -> u64 {
    100 * 1024 * 1024  // 100 MB
}

fn default_job_ceiling_secs() -> u64 {
    6 * 60 * 60  // 6 hours
}

fn default_profile_tool() -> ToolCommand {
    ToolCommand {
        program: "hmmsearch".to_string(),
        args: ["--cpu", "{threads}", "-o", "{output}", "{reference}", "{query}"]
            .iter()
            .map(|s| s.to_string())
            .collect(),
    }
}

fn diamond_blastp() -> ToolCommand {
    ToolCommand {
        program: "diamond".to_string(),
        args: [
            "blastp", "--query", "{query}", "--db", "{reference}", "--out", "{output}",
            "--outfmt", "6", "--max-target-seqs", "1", "--threads", "{threads}",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect(),
    }
}

fn default_small_reference_tool() -> ToolCommand {
    diamond_blastp()
}

fn default_full_reference_tool() -> ToolCommand {
    diamond_blastp()
}

impl Default for AnnotateConfig {
    fn default() -> Self {
        Self {
            work_dir: default_work_dir(),
            threads: default_threads(),
            max_input_bytes: default_max_input_bytes(),
            logging: LoggingConfig::default(),
            databases: DatabaseConfig::default(),
            timeouts: TimeoutConfig::default(),
            tools: ToolsConfig::default(),
        }
    }
}

impl AnnotateConfig {
    /// Load from TOML (missing file -> defaults)
    pub fn load(path: Option<&Path>) -> metapath_common::Result<Self> {
        let config: Self = load_toml_or_default(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Apply command-line overrides (highest priority)
    pub fn apply_overrides(&mut self, overrides: ConfigOverrides) -> metapath_common::Result<()> {
        if let Some(threads) = overrides.threads {
            self.threads = threads;
        }
        if let Some(work_dir) = overrides.work_dir {
            self.work_dir = work_dir;
        }
        if let Some(catalog) = overrides.pathway_catalog {
            self.databases.pathway_catalog = Some(catalog);
        }
        self.validate()
    }

    fn validate(&self) -> metapath_common::Result<()> {
        if self.threads == 0 {
            return Err(metapath_common::Error::Config("threads must be at least 1".to_string()));
        }
        if self.timeouts.job_ceiling_secs == 0 {
            return Err(metapath_common::Error::Config(
                "timeouts.job_ceiling_secs must be at least 1".to_string(),
            ));
        }
        for stage in SearchStage::ALL {
            if self.tool_for(stage).program.trim().is_empty() {
                return Err(metapath_common::Error::Config(format!(
                    "tools.{}.program is empty",
                    stage.name()
                )));
            }
        }
        Ok(())
    }

    pub fn tool_for(&self, stage: SearchStage) -> &ToolCommand {
        self.tools.for_stage(stage)
    }

    pub fn reference_for(&self, stage: SearchStage) -> Option<&Path> {
        match stage {
            SearchStage::ProfileSearch => self.databases.profile_catalog.as_deref(),
            SearchStage::SmallReferenceSearch => self.databases.small_reference.as_deref(),
            SearchStage::FullReferenceSearch => self.databases.full_reference.as_deref(),
        }
    }

    /// Timeout for one stage invocation over a query file of `query_bytes`
    pub fn stage_timeout(&self, stage: SearchStage, query_bytes: u64) -> Duration {
        let fixed = match stage {
            SearchStage::ProfileSearch => self.timeouts.profile_search_secs,
            SearchStage::SmallReferenceSearch => self.timeouts.small_reference_search_secs,
            SearchStage::FullReferenceSearch => self.timeouts.full_reference_search_secs,
        };
        match fixed {
            Some(secs) => Duration::from_secs(secs),
            None => size_scaled_timeout(stage, query_bytes),
        }
    }

    pub fn job_ceiling(&self) -> Duration {
        Duration::from_secs(self.timeouts.job_ceiling_secs)
    }
}

/// Size-banded default timeouts
///
/// Bands: <10 KB, <100 KB, <1 MB, <10 MB, larger.
pub fn size_scaled_timeout(stage: SearchStage, query_bytes: u64) -> Duration {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const MINUTE: u64 = 60;

    let band = match query_bytes {
        b if b < 10 * KB => 0,
        b if b < 100 * KB => 1,
        b if b < MB => 2,
        b if b < 10 * MB => 3,
        _ => 4,
    };

    let minutes: [u64; 5] = match stage {
        SearchStage::ProfileSearch => [15, 30, 60, 120, 240],
        SearchStage::SmallReferenceSearch | SearchStage::FullReferenceSearch => [10, 20, 45, 120, 240],
    };
    let mut secs = minutes[band] * MINUTE;

    // small reference searches are capped at 30 minutes
    if stage == SearchStage::SmallReferenceSearch {
        secs = secs.min(30 * MINUTE);
    }
    Duration::from_secs(secs)
}
