//! Outcome types shared by the pipeline and its callers.

use serde::{Deserialize, Serialize};

/// How a remote that points at the wrong URL gets corrected.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MismatchStrategy {
    /// `git remote set-url <name> <url>`.
    #[default]
    SetUrl,
    /// `git remote remove <name>` followed by `git remote add <name> <url>`.
    Recreate,
}

/// What the pipeline does about the configured remote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteAction {
    /// Remote already points at the target; no mutating command is issued.
    Keep,
    Add,
    SetUrl,
    Recreate,
}

/// Result of a pull/rebase step that let the upload continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    Rebased,
    /// Pull disabled, remote unreachable, or no such branch on the remote.
    Skipped,
}

/// Why a pull/rebase stopped the upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PullFailure {
    /// Rebase stopped on conflicts in these paths (may be empty when only the
    /// output text revealed the conflict).
    Conflict(Vec<String>),
    Other,
}

/// Result of a commit step that let the upload continue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// Nothing staged; the pipeline continues to push.
    NothingToCommit,
}

/// Summary of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSummary {
    /// True when `git init` ran during this upload.
    pub initialized: bool,
    pub remote_action: RemoteAction,
    pub pull: PullOutcome,
    pub commit: CommitOutcome,
}
