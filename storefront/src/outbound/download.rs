//! Filesystem download sink.
//!
//! Artefacts are written into one capability-scoped directory with a
//! temp-file-and-rename strategy, so a reader never observes a partially
//! written download.

use std::io::{self, Write};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::ambient_authority;
use cap_std::fs::{Dir, OpenOptions};
use tracing::debug;

use crate::domain::DownloadArtifact;
use crate::domain::ports::{DownloadSink, DownloadSinkError};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Saves artefacts into a directory.
#[derive(Debug, Clone)]
pub struct DirectoryDownloadSink {
    root: Utf8PathBuf,
    dir: Arc<Dir>,
}

impl DirectoryDownloadSink {
    /// Opens `root`, creating it when missing.
    pub fn open(root: impl Into<Utf8PathBuf>) -> Result<Self, DownloadSinkError> {
        let root = root.into();
        std::fs::create_dir_all(root.as_std_path())
            .map_err(|err| DownloadSinkError::write(format!("{root}: {err}")))?;
        let dir = Dir::open_ambient_dir(root.as_std_path(), ambient_authority())
            .map_err(|err| DownloadSinkError::write(format!("{root}: {err}")))?;
        Ok(Self {
            root,
            dir: Arc::new(dir),
        })
    }

    /// Directory artefacts are written to.
    pub fn root(&self) -> &Utf8Path {
        &self.root
    }
}

#[async_trait]
impl DownloadSink for DirectoryDownloadSink {
    async fn save(&self, artifact: &DownloadArtifact) -> Result<String, DownloadSinkError> {
        let file_name = plain_file_name(artifact.file_name())?;
        let dir = Arc::clone(&self.dir);
        let contents = artifact.json().to_owned();
        let target = file_name.clone();
        tokio::task::spawn_blocking(move || write_atomic(&dir, &target, &contents))
            .await
            .map_err(|err| DownloadSinkError::write(err.to_string()))?
            .map_err(|err| DownloadSinkError::write(format!("{file_name}: {err}")))?;

        let location = self.root.join(&file_name);
        debug!(%location, "download written");
        Ok(location.into_string())
    }
}

fn plain_file_name(raw: &str) -> Result<String, DownloadSinkError> {
    let mut components = Utf8Path::new(raw).components();
    match (components.next(), components.next()) {
        (Some(Utf8Component::Normal(name)), None) if !name.starts_with('.') => Ok(name.to_owned()),
        _ => Err(DownloadSinkError::invalid_file_name(raw)),
    }
}

fn write_atomic(dir: &Dir, file_name: &str, contents: &str) -> io::Result<()> {
    let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    let tmp_name = format!(".{file_name}.tmp.{}.{counter}", std::process::id());

    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    let written = dir.open_with(&tmp_name, &options).and_then(|mut file| {
        file.write_all(contents.as_bytes())?;
        file.sync_all()
    });
    if let Err(err) = written.and_then(|()| dir.rename(&tmp_name, dir, file_name)) {
        // Leftover temp files are harmless; the original error matters.
        drop(dir.remove_file(&tmp_name));
        return Err(err);
    }
    if dir.open(".").and_then(|parent| parent.sync_all()).is_err() {
        debug!("download directory sync skipped");
    }
    Ok(())
}
