//! Console output: banners, step headings and remediation hints.

use std::path::Path;

use crate::core::types::{CommitOutcome, PullOutcome, RemoteAction, UploadSummary};
use crate::error::UploadError;
use crate::io::config::UploadConfig;

const RULE: &str = "==================================================";

pub fn print_start_banner(cfg: &UploadConfig) {
    println!("{RULE}");
    println!(" pushdir: upload a folder to a remote repository");
    println!("{RULE}");
    println!("Local Path: {}", cfg.local_path.display());
    println!("Remote URL: {}", cfg.remote_url);
}

pub fn print_workdir(path: &Path) {
    println!("\nWorking directory: {}", path.display());
}

/// Heading for a pipeline step, separated from the previous command's output.
pub fn print_step(message: &str) {
    println!("\n{message}");
}

/// Indented note under the current step.
pub fn print_note(message: &str) {
    println!("   -> {message}");
}

pub fn print_success_banner(summary: &UploadSummary) {
    println!("\n{RULE}");
    println!("  Success! {}", success_line(summary));
    println!("{RULE}");
    for line in summary_lines(summary) {
        println!("{line}");
    }
}

fn success_line(summary: &UploadSummary) -> &'static str {
    match summary.commit {
        CommitOutcome::NothingToCommit => "Nothing new to commit; branch pushed.",
        CommitOutcome::Committed => "Folder contents pushed.",
    }
}

/// One line per completed step.
pub fn summary_lines(summary: &UploadSummary) -> Vec<String> {
    let remote = match summary.remote_action {
        RemoteAction::Keep => "unchanged",
        RemoteAction::Add => "added",
        RemoteAction::SetUrl => "url updated",
        RemoteAction::Recreate => "recreated",
    };
    let pull = match summary.pull {
        PullOutcome::Rebased => "rebased",
        PullOutcome::Skipped => "skipped",
    };
    let commit = match summary.commit {
        CommitOutcome::Committed => "created",
        CommitOutcome::NothingToCommit => "nothing to commit",
    };
    vec![
        format!("repository: {}", if summary.initialized { "initialized" } else { "existing" }),
        format!("remote: {remote}"),
        format!("pull: {pull}"),
        format!("commit: {commit}"),
    ]
}

/// Print the error and what the user can do about it to stderr.
pub fn print_failure(err: &UploadError, cfg: &UploadConfig) {
    eprintln!("\nERROR: {err}");
    for line in remediation_hints(err, cfg) {
        eprintln!("   {line}");
    }
}

/// Manual remediation steps for a failure.
pub fn remediation_hints(err: &UploadError, cfg: &UploadConfig) -> Vec<String> {
    let remote = &cfg.remote_name;
    let branch = &cfg.branch;
    match err {
        UploadError::GitNotFound { .. } => vec![
            "Install git and make sure the `git` binary is on PATH.".to_string(),
        ],
        UploadError::MissingPath { path } => vec![format!(
            "Create {} or point local_path / --path at an existing directory.",
            path.display()
        )],
        UploadError::PullConflict { paths } => {
            let mut hints = Vec::new();
            if !paths.is_empty() {
                hints.push("Conflicted files:".to_string());
                hints.extend(paths.iter().map(|path| format!("  {path}")));
            }
            hints.push("To finish the rebase by hand:".to_string());
            hints.push("  1. Edit the conflicted files and resolve the markers.".to_string());
            hints.push("  2. git add <file> for each resolved file.".to_string());
            hints.push("  3. git rebase --continue (or git rebase --abort to give up).".to_string());
            hints.push("  4. Re-run pushdir.".to_string());
            hints.push(format!(
                "To overwrite the remote with your local history instead: git push --force-with-lease {remote} {branch}"
            ));
            hints
        }
        UploadError::Push { .. } => vec![
            "Common checks:".to_string(),
            format!("1. Does the remote repository {} exist?", cfg.remote_url),
            "2. Do you have permission to push?".to_string(),
            "3. Is your network connection stable?".to_string(),
            "4. Was your authentication successful (credential helper or token)?".to_string(),
            format!(
                "5. If the remote has commits you do not, pull first or run: git push --force-with-lease {remote} {branch}"
            ),
        ],
        UploadError::Pull { .. } => vec![
            "See git's output above for the exact reason. Common causes:".to_string(),
            "1. Untracked local files would be overwritten by files from the remote;".to_string(),
            "   move or rename them, then re-run.".to_string(),
            format!("2. {remote}/{branch} is unreachable or you lack read access."),
            "Pulling can be skipped with --no-pull (the push may then be rejected).".to_string(),
        ],
        UploadError::Remote { .. } => vec![format!(
            "Inspect remotes with `git remote -v` and fix '{remote}' by hand if needed."
        )],
        UploadError::Init { .. } | UploadError::Stage { .. } | UploadError::Commit { .. } => {
            vec!["See git's output above for details.".to_string()]
        }
    }
}
