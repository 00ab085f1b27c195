//! Running-config backup delivered to the chat room.

mod ansible;

pub use ansible::AnsibleRunner;

use std::future::Future;
use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::device::outcome::{EXPORT_CAPTION, EXPORT_FAILED, artifact_missing};
use crate::error::{ExportError, GatewayError};
use crate::gateway::MessagingGateway;

/// What a batch job left behind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobOutcome {
    /// Exit code, `None` when the job was killed by a signal.
    pub exit_code: Option<i32>,
    /// Artifact path, when the job produced the file it was asked for during
    /// this run. Nothing else is ever uploaded.
    pub artifact: Option<PathBuf>,
}

impl JobOutcome {
    pub fn succeeded(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// A job that pulls the running config of one router into a file.
pub trait BatchRunner: Send + Sync {
    /// File name the job writes.
    fn artifact_name(&self) -> &str;

    fn run(&self, ip: &str) -> impl Future<Output = Result<JobOutcome, ExportError>> + Send;
}

/// Runs the batch job and posts exactly one message about it.
pub struct Exporter<B> {
    runner: B,
}

impl<B: BatchRunner> Exporter<B> {
    pub fn new(runner: B) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &B {
        &self.runner
    }

    /// Back up `ip` and deliver the artifact, or a failure text, to the room.
    pub async fn export_config<G: MessagingGateway>(
        &self,
        ip: &str,
        gateway: &G,
    ) -> Result<(), GatewayError> {
        let filename = self.runner.artifact_name().to_string();

        let outcome = match self.runner.run(ip).await {
            Ok(outcome) if outcome.succeeded() => outcome,
            Ok(outcome) => {
                warn!("Export job for {} exited with {:?}", ip, outcome.exit_code);
                return gateway.post_text(EXPORT_FAILED).await;
            }
            Err(e) => {
                warn!("Export job for {} failed: {}", ip, e);
                return gateway.post_text(EXPORT_FAILED).await;
            }
        };

        let Some(path) = outcome.artifact else {
            return gateway.post_text(&artifact_missing(&filename)).await;
        };

        match read_artifact(&path).await {
            Ok(bytes) => {
                info!("Uploading {} for {}", path.display(), ip);
                gateway.post_file(&filename, bytes, EXPORT_CAPTION).await
            }
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                gateway.post_text(&artifact_missing(&filename)).await
            }
        }
    }
}

async fn read_artifact(path: &Path) -> Result<Vec<u8>, ExportError> {
    Ok(tokio::fs::read(path).await?)
}
