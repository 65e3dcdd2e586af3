//! Scripted search collaborator
//!
//! Returns canned output (or a canned failure) per stage and records every
//! request together with the query FASTA it was given.

use async_trait::async_trait;
use metapath_annotate::annotation::types::{SearchStage, StageInvocationError};
use metapath_annotate::{RawOutput, SearchCollaborator, StageRequest};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Debug, Clone)]
enum Scripted {
    Output(Vec<u8>),
    Failure(String),
}

/// Recorded invocation
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub request: StageRequest,
    /// Protein ids present in the query file at call time
    pub query_ids: Vec<String>,
}

#[derive(Default)]
pub struct MockCollaborator {
    scripts: HashMap<SearchStage, Scripted>,
    delay: Option<Duration>,
    calls: Mutex<Vec<RecordedCall>>,
    running: AtomicUsize,
    max_running: AtomicUsize,
}

impl MockCollaborator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stage returns this output
    pub fn with_output(mut self, stage: SearchStage, output: impl Into<Vec<u8>>) -> Self {
        self.scripts.insert(stage, Scripted::Output(output.into()));
        self
    }

    /// Stage fails with a non-zero exit
    pub fn with_failure(mut self, stage: SearchStage, stderr: &str) -> Self {
        self.scripts.insert(stage, Scripted::Failure(stderr.to_string()));
        self
    }

    /// Every call sleeps this long before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_for(&self, stage: SearchStage) -> Vec<RecordedCall> {
        self.calls()
            .into_iter()
            .filter(|c| c.request.stage == stage)
            .collect()
    }

    pub fn was_called(&self, stage: SearchStage) -> bool {
        !self.calls_for(stage).is_empty()
    }

    /// Highest number of simultaneous invocations seen
    pub fn max_concurrent(&self) -> usize {
        self.max_running.load(Ordering::SeqCst)
    }
}

fn query_ids(path: &std::path::Path) -> Vec<String> {
    std::fs::read_to_string(path)
        .unwrap_or_default()
        .lines()
        .filter_map(|l| l.strip_prefix('>'))
        .filter_map(|header| header.split_whitespace().next())
        .map(str::to_string)
        .collect()
}

#[async_trait]
impl SearchCollaborator for MockCollaborator {
    async fn run_search(&self, request: &StageRequest) -> Result<RawOutput, StageInvocationError> {
        self.calls.lock().unwrap().push(RecordedCall {
            request: request.clone(),
            query_ids: query_ids(&request.query_path),
        });

        let now_running = self.running.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_running.fetch_max(now_running, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.running.fetch_sub(1, Ordering::SeqCst);

        match self.scripts.get(&request.stage) {
            Some(Scripted::Output(bytes)) => Ok(RawOutput::new(bytes.clone())),
            Some(Scripted::Failure(stderr)) => Err(StageInvocationError::NonZeroExit {
                program: format!("mock-{}", request.stage),
                code: Some(1),
                stderr: stderr.clone(),
            }),
            None => Ok(RawOutput::default()),
        }
    }
}
