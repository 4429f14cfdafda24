//! Writes the final report to its output file.

use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to write report to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Writes the report file at a fixed path.
pub struct ReportWriter {
    path: PathBuf,
}

impl ReportWriter {
    /// Create a writer targeting `path`; nothing is touched until `emit`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Write `text` (trimmed) to the output path.
    ///
    /// The content goes to a sibling temp file first and is renamed over the
    /// target, so readers never see a partial report.
    pub async fn emit(&self, text: &str) -> Result<(), ReportError> {
        let tmp = self.temp_path();

        if let Err(e) = tokio::fs::write(&tmp, text.trim()).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(&tmp)(e));
        }

        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(io_err(&self.path)(e));
        }

        tracing::info!(path = %self.path.display(), bytes = text.trim().len(), "report written");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "report".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn io_err(path: &Path) -> impl FnOnce(std::io::Error) -> ReportError {
    let path = path.to_path_buf();
    move |source| ReportError::Io { path, source }
}
