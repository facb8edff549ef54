//! Failure taxonomy for the upload pipeline.
//!
//! Every variant is terminal: the binary reports it and exits with
//! [`crate::exit_codes::FAILED`]. Nothing is retried.

use std::path::PathBuf;

/// Why an upload stopped.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    /// The `git` binary could not be run.
    #[error("git executable not found. Is git installed and on PATH? ({detail})")]
    GitNotFound { detail: String },

    #[error("local path does not exist or is not a directory: {}", path.display())]
    MissingPath { path: PathBuf },

    #[error("failed to initialize repository: {detail}")]
    Init { detail: String },

    #[error("failed to configure remote '{remote}': {detail}")]
    Remote { remote: String, detail: String },

    /// Rebase stopped with conflicts. The working tree is left mid-rebase.
    #[error("pull --rebase stopped on merge conflicts")]
    PullConflict { paths: Vec<String> },

    #[error("pull --rebase failed: {detail}")]
    Pull { detail: String },

    #[error("failed to stage changes: {detail}")]
    Stage { detail: String },

    #[error("commit failed: {detail}")]
    Commit { detail: String },

    #[error("push failed: {detail}")]
    Push { detail: String },
}

/// Flatten an `anyhow` chain into a single line for an error variant.
pub(crate) fn detail(err: &anyhow::Error) -> String {
    format!("{err:#}")
}
