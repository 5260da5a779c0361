//! Port for saving the bulk download artefact.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::DownloadArtifact;

use super::define_port_error;

define_port_error! {
    /// Errors raised by download sink adapters.
    pub enum DownloadSinkError {
        /// The file name is not a plain file name.
        InvalidFileName { file_name: String } => "invalid download file name: {file_name}",
        /// Writing the artefact failed.
        Write { message: String } => "failed to save download: {message}",
    }
}

/// Port receiving finished download artefacts.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DownloadSink: Send + Sync {
    /// Persist `artifact`, returning where it was saved.
    async fn save(&self, artifact: &DownloadArtifact) -> Result<String, DownloadSinkError>;
}

/// Sink double that keeps artefacts in memory.
#[derive(Debug, Default)]
pub struct RecordingDownloadSink {
    saved: Mutex<Vec<DownloadArtifact>>,
}

impl RecordingDownloadSink {
    /// Artefacts saved so far, oldest first.
    pub fn saved(&self) -> Vec<DownloadArtifact> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl DownloadSink for RecordingDownloadSink {
    async fn save(&self, artifact: &DownloadArtifact) -> Result<String, DownloadSinkError> {
        self.saved
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(artifact.clone());
        Ok(format!("memory://{}", artifact.file_name()))
    }
}
