//! Error types for dock-apps

use std::path::PathBuf;

/// Catalog enumeration errors.
/// `CatalogScanner::scan` degrades these to an empty source.
#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("cannot read catalog source {path}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

/// Process launcher errors
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("desktop entry {0} has no command to run")]
    NoCommand(PathBuf),

    #[error("opener exited with {0}")]
    Failed(std::process::ExitStatus),

    #[error("cannot launch {0}")]
    Unsupported(PathBuf),
}
