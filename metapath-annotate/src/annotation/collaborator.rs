// Search Tool Collaborator
//
// Concept: Run one search stage's external tool as a black box
// Synchronization: Accepts StageRequest (paths, threads, timeout), outputs RawOutput bytes
//
// Contract:
// - Exit status zero with an empty or absent output file is a legitimate "no hits"
// - Failure is signalled only by StageInvocationError (spawn failure,
//   non-zero exit, timeout, unreadable output)
// - The core never builds shell strings; CommandCollaborator substitutes
//   placeholders into individual argv elements

use crate::annotation::types::{SearchStage, StageInvocationError};
use crate::config::ToolsConfig;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use uuid::Uuid;

/// Longest stderr excerpt carried in a NonZeroExit error
const STDERR_EXCERPT_CHARS: usize = 500;

/// Configuration for one stage invocation
#[derive(Debug, Clone, PartialEq)]
pub struct StageRequest {
    pub job_id: Uuid,
    pub stage: SearchStage,
    pub query_path: PathBuf,
    pub reference_path: PathBuf,
    pub output_path: PathBuf,
    pub threads: usize,
    pub timeout: Duration,
}

/// Raw bytes produced by a stage's tool
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawOutput {
    pub bytes: Vec<u8>,
}

impl RawOutput {
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self { bytes: bytes.into() }
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Search tool abstraction (one call per stage invocation)
#[async_trait]
pub trait SearchCollaborator: Send + Sync {
    async fn run_search(&self, request: &StageRequest) -> Result<RawOutput, StageInvocationError>;
}

/// Collaborator that spawns the configured external programs
pub struct CommandCollaborator {
    tools: ToolsConfig,
}

impl CommandCollaborator {
    pub fn new(tools: ToolsConfig) -> Self {
        Self { tools }
    }
}

/// Substitute request values into an argv template
pub fn expand_args(template: &[String], request: &StageRequest) -> Vec<String> {
    let threads = request.threads.to_string();
    let query = request.query_path.to_string_lossy();
    let reference = request.reference_path.to_string_lossy();
    let output = request.output_path.to_string_lossy();

    template
        .iter()
        .map(|arg| {
            arg.replace("{query}", &query)
                .replace("{reference}", &reference)
                .replace("{output}", &output)
                .replace("{threads}", &threads)
        })
        .collect()
}

#[async_trait]
impl SearchCollaborator for CommandCollaborator {
    async fn run_search(&self, request: &StageRequest) -> Result<RawOutput, StageInvocationError> {
        let tool = self.tools.for_stage(request.stage);
        let args = expand_args(&tool.args, request);

        // a stale file from an earlier attempt must not be mistaken for output
        match tokio::fs::remove_file(&request.output_path).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(StageInvocationError::UnreadableOutput(e.to_string())),
        }

        tracing::info!(
            job_id = %request.job_id,
            stage = %request.stage,
            program = %tool.program,
            timeout_secs = request.timeout.as_secs(),
            "Starting search tool"
        );
        tracing::debug!(args = ?args, "Search tool arguments");

        let child = tokio::process::Command::new(&tool.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| StageInvocationError::Spawn {
                program: tool.program.clone(),
                source,
            })?;

        // on timeout the child future is dropped, which kills the process
        let output = match tokio::time::timeout(request.timeout, child.wait_with_output()).await {
            Ok(result) => result.map_err(|source| StageInvocationError::Spawn {
                program: tool.program.clone(),
                source,
            })?,
            Err(_) => {
                return Err(StageInvocationError::Timeout {
                    program: tool.program.clone(),
                    after: request.timeout,
                })
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StageInvocationError::NonZeroExit {
                program: tool.program.clone(),
                code: output.status.code(),
                stderr: stderr.trim().chars().take(STDERR_EXCERPT_CHARS).collect(),
            });
        }

        match tokio::fs::read(&request.output_path).await {
            Ok(bytes) => {
                tracing::debug!(stage = %request.stage, bytes = bytes.len(), "Read search tool output");
                Ok(RawOutput::new(bytes))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(stage = %request.stage, "Search tool wrote no output file");
                Ok(RawOutput::default())
            }
            Err(e) => Err(StageInvocationError::UnreadableOutput(format!(
                "{}: {}",
                request.output_path.display(),
                e
            ))),
        }
    }
}
