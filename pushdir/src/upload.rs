//! Orchestration for a single upload.
//!
//! The pipeline is strictly linear: preflight, repository, remote, pull,
//! stage, commit, push. The first failure stops it; nothing is retried.

use anyhow::Result;
use tracing::{debug, info, instrument, warn};

use crate::core::classify::{classify_commit, classify_pull};
use crate::core::remote::{fetch_url, plan_remote, same_url};
use crate::core::types::{CommitOutcome, PullFailure, PullOutcome, RemoteAction, UploadSummary};
use crate::error::{UploadError, detail};
use crate::io::config::UploadConfig;
use crate::io::git::{Git, failure};
use crate::io::process::CommandRunner;
use crate::report;

/// Run the whole pipeline for `cfg`.
///
/// `git` is used as-is for the preflight `git --version`; every later command
/// runs with the canonicalized `cfg.local_path` as working directory.
#[instrument(skip_all, fields(remote = %cfg.remote_name, branch = %cfg.branch))]
pub fn run_upload<R: CommandRunner + Clone>(
    git: &Git<R>,
    cfg: &UploadConfig,
) -> Result<UploadSummary, UploadError> {
    let version = git
        .version()
        .map_err(|err| UploadError::GitNotFound {
            detail: detail(&err),
        })?;
    info!(%version, "git available");

    let path = &cfg.local_path;
    if !path.is_dir() {
        warn!(path = %path.display(), "local path missing");
        return Err(UploadError::MissingPath { path: path.clone() });
    }
    let workdir = path
        .canonicalize()
        .map_err(|_| UploadError::MissingPath { path: path.clone() })?;
    report::print_workdir(&workdir);
    let git = git.at(workdir);

    let initialized = ensure_repository(&git, &cfg.branch)?;
    let remote_action = ensure_remote(&git, cfg)?;
    let pull = sync_with_remote(&git, cfg)?;

    report::print_step("Staging all files...");
    git.add_all().map_err(|err| UploadError::Stage {
        detail: detail(&err),
    })?;

    let commit = commit_changes(&git, &cfg.commit_message)?;
    push(&git, cfg)?;

    let summary = UploadSummary {
        initialized,
        remote_action,
        pull,
        commit,
    };
    info!(?summary, "upload complete");
    Ok(summary)
}

/// Initialize a repository if the directory has none. Returns true if it did.
fn ensure_repository<R: CommandRunner>(git: &Git<R>, branch: &str) -> Result<bool, UploadError> {
    if git.has_repo_metadata() {
        debug!("repository already initialized");
        return Ok(false);
    }
    report::print_step("Initializing new Git repository...");
    git.init().map_err(|err| UploadError::Init {
        detail: detail(&err),
    })?;
    match git.rename_branch(branch) {
        Ok(()) => report::print_note(&format!("Default branch set to {branch}.")),
        // The push step names the branch explicitly and will report the problem.
        Err(err) => {
            warn!(err = %format!("{err:#}"), branch, "could not rename initial branch");
            report::print_note(&format!("Could not rename the initial branch to {branch}."));
        }
    }
    Ok(true)
}

/// Make `cfg.remote_name` point at `cfg.remote_url`.
fn ensure_remote<R: CommandRunner>(
    git: &Git<R>,
    cfg: &UploadConfig,
) -> Result<RemoteAction, UploadError> {
    let name = cfg.remote_name.as_str();
    let url = cfg.remote_url.as_str();
    let remote_err = |err: anyhow::Error| UploadError::Remote {
        remote: name.to_string(),
        detail: detail(&err),
    };

    let remotes = git.remotes().map_err(remote_err)?;
    let current = fetch_url(&remotes, name);
    let action = plan_remote(current, url, cfg.on_remote_mismatch);
    debug!(?action, ?current, "remote plan");

    match action {
        RemoteAction::Keep => {
            report::print_step(&format!("Remote repository '{name}' already exists."));
            return Ok(action);
        }
        RemoteAction::Add => {
            report::print_step(&format!("Adding remote repository '{name}': {url} ..."));
            git.remote_add(name, url).map_err(remote_err)?;
        }
        RemoteAction::SetUrl => {
            report::print_step(&format!(
                "Updating remote '{name}': {} -> {url} ...",
                current.unwrap_or_default()
            ));
            git.remote_set_url(name, url).map_err(remote_err)?;
        }
        RemoteAction::Recreate => {
            report::print_step(&format!("Re-creating remote '{name}': {url} ..."));
            git.remote_remove(name).map_err(remote_err)?;
            git.remote_add(name, url).map_err(remote_err)?;
        }
    }

    let configured = git.remote_url(name).map_err(remote_err)?;
    match configured {
        Some(found) if same_url(&found, url) => Ok(action),
        other => Err(UploadError::Remote {
            remote: name.to_string(),
            detail: format!("expected {url} after update, git reports {other:?}"),
        }),
    }
}

/// Pull with rebase and autostash when enabled and the remote branch exists.
fn sync_with_remote<R: CommandRunner>(
    git: &Git<R>,
    cfg: &UploadConfig,
) -> Result<PullOutcome, UploadError> {
    if !cfg.pull {
        debug!("pull disabled");
        return Ok(PullOutcome::Skipped);
    }
    let (remote, branch) = (cfg.remote_name.as_str(), cfg.branch.as_str());

    match git.remote_branch_exists(remote, branch) {
        Ok(true) => {}
        Ok(false) => {
            report::print_step(&format!(
                "Branch {branch} not found on {remote}; skipping pull."
            ));
            return Ok(PullOutcome::Skipped);
        }
        Err(err) => {
            // Reachability problems resurface at push time with git's own message.
            warn!(err = %format!("{err:#}"), "could not query remote branch");
            report::print_step(&format!("Could not query {remote}; skipping pull."));
            return Ok(PullOutcome::Skipped);
        }
    }

    report::print_step(&format!(
        "Pulling {remote}/{branch} with rebase and autostash..."
    ));
    let out = git
        .pull_rebase_autostash(remote, branch)
        .map_err(|err| UploadError::Pull {
            detail: detail(&err),
        })?;
    let unmerged = if out.success() {
        Vec::new()
    } else {
        git.unmerged_paths().unwrap_or_else(|err| {
            warn!(err = %format!("{err:#}"), "could not list unmerged paths");
            Vec::new()
        })
    };

    classify_pull(out.success(), &out.combined(), unmerged).map_err(|failed| match failed {
        PullFailure::Conflict(paths) => {
            warn!(conflicts = paths.len(), "rebase stopped on conflicts");
            UploadError::PullConflict { paths }
        }
        PullFailure::Other => UploadError::Pull {
            detail: detail(&failure(
                &["pull", "--rebase", "--autostash", remote, branch],
                &out,
            )),
        },
    })
}

/// Commit whatever is staged. An empty index is not an error.
fn commit_changes<R: CommandRunner>(
    git: &Git<R>,
    message: &str,
) -> Result<CommitOutcome, UploadError> {
    report::print_step("Committing changes...");
    let staged = git.has_staged_changes().unwrap_or_else(|err| {
        // Let `git commit` itself decide.
        warn!(err = %format!("{err:#}"), "could not inspect index");
        true
    });
    if !staged {
        report::print_note("Nothing to commit, working tree clean.");
        return Ok(CommitOutcome::NothingToCommit);
    }

    let out = git.commit(message).map_err(|err| UploadError::Commit {
        detail: detail(&err),
    })?;
    match classify_commit(out.success(), &out.combined()) {
        Some(CommitOutcome::NothingToCommit) => {
            report::print_note("Nothing to commit, working tree clean.");
            Ok(CommitOutcome::NothingToCommit)
        }
        Some(CommitOutcome::Committed) => Ok(CommitOutcome::Committed),
        None => Err(UploadError::Commit {
            detail: detail(&failure(&["commit", "-m", message], &out)),
        }),
    }
}

fn push<R: CommandRunner>(git: &Git<R>, cfg: &UploadConfig) -> Result<(), UploadError> {
    let (remote, branch) = (cfg.remote_name.as_str(), cfg.branch.as_str());
    report::print_step(&format!("Pushing to {remote} (branch: {branch})..."));
    report::print_note("You might be prompted for your username and password/token here.");
    let out = git
        .push_upstream(remote, branch)
        .map_err(|err| UploadError::Push {
            detail: detail(&err),
        })?;
    if !out.success() {
        return Err(UploadError::Push {
            detail: detail(&failure(&["push", "-u", remote, branch], &out)),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::MismatchStrategy;
    use crate::io::process::CommandOutput;
    use crate::test_support::{ScriptedRunner, exit};

    const URL: &str = "https://github.com/octo/project.git";

    fn cfg(path: &std::path::Path) -> UploadConfig {
        UploadConfig {
            local_path: path.to_path_buf(),
            remote_url: URL.to_string(),
            ..UploadConfig::default()
        }
    }

    fn remote_listing() -> CommandOutput {
        exit(0, &format!("origin\t{URL} (fetch)\norigin\t{URL} (push)\n"), "")
    }

    /// Runner where the remote already matches and every step succeeds.
    fn happy_runner() -> ScriptedRunner {
        ScriptedRunner::new()
            .on(&["--version"], exit(0, "git version 2.43.0", ""))
            .on(&["remote", "-v"], remote_listing())
            .on(&["remote", "get-url"], exit(0, URL, ""))
            .on(&["diff", "--cached"], exit(1, "", ""))
    }

    fn repo_dir() -> tempfile::TempDir {
        let temp = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir(temp.path().join(".git")).expect("fake .git");
        temp
    }

    #[test]
    fn missing_path_stops_before_any_repo_command() {
        let runner = happy_runner();
        let git = Git::new(&runner, ".").quiet();
        let temp = tempfile::tempdir().expect("tempdir");
        let missing = temp.path().join("nope");

        let err = run_upload(&git, &cfg(&missing)).expect_err("missing path");
        match err {
            UploadError::MissingPath { path } => assert_eq!(path, missing),
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(runner.calls(), vec![vec!["--version".to_string()]]);
    }

    #[test]
    fn missing_git_is_reported() {
        let runner = ScriptedRunner::new().without_git();
        let git = Git::new(&runner, ".").quiet();
        let temp = repo_dir();
        let err = run_upload(&git, &cfg(temp.path())).expect_err("no git");
        assert!(matches!(err, UploadError::GitNotFound { .. }));
    }

    #[test]
    fn init_runs_before_remote_and_commit() {
        let runner = ScriptedRunner::new()
            .on(&["remote", "-v"], exit(0, "", ""))
            .on(&["remote", "get-url"], exit(0, URL, ""))
            .on(&["ls-remote"], exit(2, "", ""))
            .on(&["diff", "--cached"], exit(1, "", ""));
        let git = Git::new(&runner, ".").quiet();
        let temp = tempfile::tempdir().expect("tempdir");

        let summary = run_upload(&git, &cfg(temp.path())).expect("upload");
        assert!(summary.initialized);
        assert_eq!(summary.remote_action, RemoteAction::Add);
        assert_eq!(summary.pull, PullOutcome::Skipped);

        let init = runner.position(&["init"]).expect("init issued");
        let rename = runner.position(&["branch", "-m", "main"]).expect("rename issued");
        let remote = runner.position(&["remote"]).expect("remote issued");
        let commit = runner.position(&["commit"]).expect("commit issued");
        assert!(init < rename && rename < remote && remote < commit);
        assert!(runner.called(&["remote", "add", "origin", URL]));
    }

    #[test]
    fn matching_remote_is_left_alone() {
        let runner = happy_runner();
        let git = Git::new(&runner, ".").quiet();
        let temp = repo_dir();

        let summary = run_upload(&git, &cfg(temp.path())).expect("upload");
        assert_eq!(summary.remote_action, RemoteAction::Keep);
        assert!(!runner.called(&["init"]));
        assert!(!runner.called(&["remote", "add"]));
        assert!(!runner.called(&["remote", "remove"]));
        assert!(!runner.called(&["remote", "set-url"]));
    }

    #[test]
    fn mismatched_remote_uses_set_url_by_default() {
        let runner = ScriptedRunner::new()
            .on(&["remote", "-v"], exit(0, "origin\thttps://old.example/x.git (fetch)\n", ""))
            .on(&["remote", "get-url"], exit(0, URL, ""))
            .on(&["diff", "--cached"], exit(1, "", ""));
        let git = Git::new(&runner, ".").quiet();
        let temp = repo_dir();

        let summary = run_upload(&git, &cfg(temp.path())).expect("upload");
        assert_eq!(summary.remote_action, RemoteAction::SetUrl);
        assert!(runner.called(&["remote", "set-url", "origin", URL]));
        assert!(!runner.called(&["remote", "remove"]));
    }

    #[test]
    fn mismatched_remote_can_be_recreated() {
        let runner = ScriptedRunner::new()
            .on(&["remote", "-v"], exit(0, "origin\thttps://old.example/x.git (fetch)\n", ""))
            .on(&["remote", "get-url"], exit(0, URL, ""))
            .on(&["diff", "--cached"], exit(1, "", ""));
        let git = Git::new(&runner, ".").quiet();
        let temp = repo_dir();
        let cfg = UploadConfig {
            on_remote_mismatch: MismatchStrategy::Recreate,
            ..cfg(temp.path())
        };

        run_upload(&git, &cfg).expect("upload");
        let remove = runner.position(&["remote", "remove", "origin"]).expect("remove");
        let add = runner.position(&["remote", "add", "origin", URL]).expect("add");
        assert!(remove < add);
    }

    #[test]
    fn remote_not_taking_effect_fails() {
        let runner = ScriptedRunner::new()
            .on(&["remote", "-v"], exit(0, "", ""))
            .on(&["remote", "get-url"], exit(2, "", "error: No such remote 'origin'"));
        let git = Git::new(&runner, ".").quiet();
        let temp = repo_dir();

        let err = run_upload(&git, &cfg(temp.path())).expect_err("remote");
        assert!(matches!(err, UploadError::Remote { .. }));
        assert!(!runner.called(&["push"]));
    }

    #[test]
    fn empty_index_still_pushes() {
        // First matching rule wins, so this cannot start from `happy_runner`.
        let runner = ScriptedRunner::new()
            .on(&["remote", "-v"], remote_listing())
            .on(&["remote", "get-url"], exit(0, URL, ""))
            .on(&["diff", "--cached"], exit(0, "", ""));
        let git = Git::new(&runner, ".").quiet();
        let temp = repo_dir();

        let summary = run_upload(&git, &cfg(temp.path())).expect("upload");
        assert_eq!(summary.commit, CommitOutcome::NothingToCommit);
        assert!(!runner.called(&["commit"]));
        assert!(runner.called(&["push", "-u", "origin", "main"]));
    }

    #[test]
    fn nothing_to_commit_text_still_pushes() {
        let runner = happy_runner().on(
            &["commit"],
            exit(1, "On branch main\nnothing to commit, working tree clean\n", ""),
        );
        let git = Git::new(&runner, ".").quiet();
        let temp = repo_dir();

        let summary = run_upload(&git, &cfg(temp.path())).expect("upload");
        assert_eq!(summary.commit, CommitOutcome::NothingToCommit);
        assert!(runner.called(&["push", "-u", "origin", "main"]));
    }

    #[test]
    fn real_commit_failure_stops_before_push() {
        let runner = happy_runner().on(
            &["commit"],
            exit(128, "", "fatal: unable to auto-detect email address"),
        );
        let git = Git::new(&runner, ".").quiet();
        let temp = repo_dir();

        let err = run_upload(&git, &cfg(temp.path())).expect_err("commit");
        match err {
            UploadError::Commit { detail } => assert!(detail.contains("email address")),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(!runner.called(&["push"]));
    }

    #[test]
    fn pull_conflict_stops_before_push() {
        let runner = happy_runner()
            .on(
                &["pull"],
                exit(1, "CONFLICT (content): Merge conflict in README.md\n", "error: could not apply 1a2b3c4"),
            )
            .on(&["diff", "--name-only"], exit(0, "README.md\n", ""));
        let git = Git::new(&runner, ".").quiet();
        let temp = repo_dir();

        let err = run_upload(&git, &cfg(temp.path())).expect_err("conflict");
        match err {
            UploadError::PullConflict { paths } => assert_eq!(paths, vec!["README.md"]),
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(runner.called(&["pull", "--rebase", "--autostash", "origin", "main"]));
        assert!(!runner.called(&["add"]));
        assert!(!runner.called(&["push"]));
    }

    #[test]
    fn other_pull_failure_is_distinct_from_conflict() {
        let runner = happy_runner().on(
            &["pull"],
            exit(1, "", "fatal: Could not read from remote repository."),
        );
        let git = Git::new(&runner, ".").quiet();
        let temp = repo_dir();

        let err = run_upload(&git, &cfg(temp.path())).expect_err("pull");
        assert!(matches!(err, UploadError::Pull { .. }));
        assert!(!runner.called(&["push"]));
    }

    #[test]
    fn pull_disabled_skips_remote_branch_check() {
        let runner = happy_runner();
        let git = Git::new(&runner, ".").quiet();
        let temp = repo_dir();
        let cfg = UploadConfig {
            pull: false,
            ..cfg(temp.path())
        };

        let summary = run_upload(&git, &cfg).expect("upload");
        assert_eq!(summary.pull, PullOutcome::Skipped);
        assert!(!runner.called(&["ls-remote"]));
        assert!(!runner.called(&["pull"]));
    }

    #[test]
    fn unreachable_remote_skips_pull() {
        let runner = happy_runner().on(
            &["ls-remote"],
            exit(128, "", "fatal: unable to access remote"),
        );
        let git = Git::new(&runner, ".").quiet();
        let temp = repo_dir();

        let summary = run_upload(&git, &cfg(temp.path())).expect("upload");
        assert_eq!(summary.pull, PullOutcome::Skipped);
        assert!(!runner.called(&["pull"]));
    }

    #[test]
    fn push_failure_is_reported() {
        let runner = happy_runner().on(
            &["push"],
            exit(1, "", "! [rejected] main -> main (fetch first)"),
        );
        let git = Git::new(&runner, ".").quiet();
        let temp = repo_dir();

        let err = run_upload(&git, &cfg(temp.path())).expect_err("push");
        match err {
            UploadError::Push { detail } => assert!(detail.contains("rejected")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn full_success_runs_every_step_in_order() {
        let runner = happy_runner();
        let git = Git::new(&runner, ".").quiet();
        let temp = repo_dir();

        let summary = run_upload(&git, &cfg(temp.path())).expect("upload");
        assert_eq!(
            summary,
            UploadSummary {
                initialized: false,
                remote_action: RemoteAction::Keep,
                pull: PullOutcome::Rebased,
                commit: CommitOutcome::Committed,
            }
        );
        let order: Vec<usize> = [
            &["pull"][..],
            &["add", "."][..],
            &["commit", "-m", "Upload via pushdir"][..],
            &["push", "-u", "origin", "main"][..],
        ]
        .iter()
        .map(|prefix| runner.position(prefix).expect("step issued"))
        .collect();
        assert!(order.windows(2).all(|pair| pair[0] < pair[1]));
    }
}
