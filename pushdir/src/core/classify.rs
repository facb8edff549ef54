//! Classification of captured git results.
//!
//! Exit codes decide first. Text markers only break ties that git does not
//! express structurally, and git runs with `LC_ALL=C` so the markers are stable.

use crate::core::types::{CommitOutcome, PullFailure, PullOutcome};

const NOTHING_TO_COMMIT: &str = "nothing to commit";
const CONFLICT: &str = "CONFLICT";

/// Classify a `git commit` result. `None` means the commit really failed.
pub fn classify_commit(success: bool, output_text: &str) -> Option<CommitOutcome> {
    if success {
        Some(CommitOutcome::Committed)
    } else if output_text.contains(NOTHING_TO_COMMIT) {
        Some(CommitOutcome::NothingToCommit)
    } else {
        None
    }
}

/// Classify a `git pull --rebase --autostash` result.
///
/// `unmerged_paths` comes from `git diff --name-only --diff-filter=U` after the
/// failed pull; any entry there means the rebase stopped on a conflict.
pub fn classify_pull(
    success: bool,
    output_text: &str,
    unmerged_paths: Vec<String>,
) -> Result<PullOutcome, PullFailure> {
    if success {
        return Ok(PullOutcome::Rebased);
    }
    if !unmerged_paths.is_empty() || output_text.contains(CONFLICT) {
        return Err(PullFailure::Conflict(unmerged_paths));
    }
    Err(PullFailure::Other)
}
