//! Git adapter for the upload pipeline.
//!
//! Every git invocation the pipeline makes goes through one small method here,
//! so the full list of commands pushdir can issue is visible in one place.

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use tracing::{debug, instrument, warn};

use crate::core::remote::{Remote, parse_remotes};
use crate::io::process::{CommandOutput, CommandRunner};

/// Wrapper for executing git commands in a working directory.
#[derive(Debug, Clone)]
pub struct Git<R> {
    runner: R,
    workdir: PathBuf,
    echo: bool,
}

impl<R: CommandRunner> Git<R> {
    /// Create a wrapper that echoes each command and its output to the console.
    pub fn new(runner: R, workdir: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            workdir: workdir.into(),
            echo: true,
        }
    }

    /// Stop echoing commands and their output.
    pub fn quiet(mut self) -> Self {
        self.echo = false;
        self
    }

    /// Same runner and echo setting, different working directory.
    pub fn at(&self, workdir: impl Into<PathBuf>) -> Self
    where
        R: Clone,
    {
        Self {
            runner: self.runner.clone(),
            workdir: workdir.into(),
            echo: self.echo,
        }
    }

    /// `git --version`; errors if git cannot be spawned or exits non-zero.
    pub fn version(&self) -> Result<String> {
        let out = self.run_checked(&["--version"])?;
        Ok(out.stdout.trim().to_string())
    }

    /// True if the working directory carries its own `.git` (directory or gitfile).
    pub fn has_repo_metadata(&self) -> bool {
        self.workdir.join(".git").exists()
    }

    pub fn init(&self) -> Result<()> {
        self.run_checked(&["init"])?;
        Ok(())
    }

    /// Rename the current branch.
    ///
    /// Older git refuses `branch -m` before the first commit; HEAD is pointed at
    /// the new name directly in that case.
    #[instrument(skip_all, fields(branch))]
    pub fn rename_branch(&self, branch: &str) -> Result<()> {
        let out = self.run(&["branch", "-m", branch])?;
        if out.success() {
            return Ok(());
        }
        debug!(branch, "branch -m failed, falling back to symbolic-ref");
        let head = format!("refs/heads/{branch}");
        self.run_checked(&["symbolic-ref", "HEAD", &head])?;
        Ok(())
    }

    /// List configured remotes (`git remote -v`).
    pub fn remotes(&self) -> Result<Vec<Remote>> {
        let out = self.run_checked(&["remote", "-v"])?;
        parse_remotes(&out.stdout)
    }

    /// URL of a remote, or `None` when no remote has that name.
    pub fn remote_url(&self, name: &str) -> Result<Option<String>> {
        let out = self.run(&["remote", "get-url", name])?;
        if out.success() {
            return Ok(Some(out.stdout.trim().to_string()));
        }
        if out.code == Some(2) || out.stderr.contains("No such remote") {
            return Ok(None);
        }
        Err(failure(&["remote", "get-url", name], &out))
    }

    pub fn remote_add(&self, name: &str, url: &str) -> Result<()> {
        self.run_checked(&["remote", "add", name, url])?;
        Ok(())
    }

    pub fn remote_remove(&self, name: &str) -> Result<()> {
        self.run_checked(&["remote", "remove", name])?;
        Ok(())
    }

    pub fn remote_set_url(&self, name: &str, url: &str) -> Result<()> {
        self.run_checked(&["remote", "set-url", name, url])?;
        Ok(())
    }

    /// True if `branch` exists on `remote` (`git ls-remote --exit-code --heads`).
    #[instrument(skip_all, fields(remote, branch))]
    pub fn remote_branch_exists(&self, remote: &str, branch: &str) -> Result<bool> {
        let args = ["ls-remote", "--exit-code", "--heads", remote, branch];
        let out = self.run(&args)?;
        match out.code {
            Some(0) => Ok(true),
            Some(2) if !out.timed_out => Ok(false),
            _ => Err(failure(&args, &out)),
        }
    }

    /// `git pull --rebase --autostash`; the raw result is returned for classification.
    pub fn pull_rebase_autostash(&self, remote: &str, branch: &str) -> Result<CommandOutput> {
        self.run(&["pull", "--rebase", "--autostash", remote, branch])
    }

    /// Paths with unresolved merge conflicts.
    pub fn unmerged_paths(&self) -> Result<Vec<String>> {
        let out = self.run_checked(&["diff", "--name-only", "--diff-filter=U"])?;
        Ok(out
            .stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect())
    }

    /// Stage everything under the working directory (respects .gitignore).
    pub fn add_all(&self) -> Result<()> {
        self.run_checked(&["add", "."])?;
        Ok(())
    }

    /// True if there is anything staged for commit.
    pub fn has_staged_changes(&self) -> Result<bool> {
        let args = ["diff", "--cached", "--quiet"];
        let out = self.run(&args)?;
        match out.code {
            Some(0) => Ok(false),
            Some(1) => Ok(true),
            _ => Err(failure(&args, &out)),
        }
    }

    /// `git commit -m`; the raw result is returned for classification.
    pub fn commit(&self, message: &str) -> Result<CommandOutput> {
        self.run(&["commit", "-m", message])
    }

    /// `git push -u <remote> <branch>`; the raw result is returned so the caller
    /// can report git's own explanation.
    pub fn push_upstream(&self, remote: &str, branch: &str) -> Result<CommandOutput> {
        self.run(&["push", "-u", remote, branch])
    }

    fn run_checked(&self, args: &[&str]) -> Result<CommandOutput> {
        let out = self.run(args)?;
        if !out.success() {
            return Err(failure(args, &out));
        }
        Ok(out)
    }

    fn run(&self, args: &[&str]) -> Result<CommandOutput> {
        if self.echo {
            println!("\n> Running: git {}", args.join(" "));
        }
        let out = self.runner.run("git", args, &self.workdir)?;
        if self.echo {
            if !out.stdout.trim().is_empty() {
                println!("{}", out.stdout.trim());
            }
            // git writes progress and hints to stderr even on success.
            if !out.stderr.trim().is_empty() {
                eprintln!("{}", out.stderr.trim());
            }
        }
        if out.timed_out {
            warn!(command = %args.join(" "), "git command timed out");
        }
        Ok(out)
    }
}

/// Error describing a failed git invocation.
pub fn failure(args: &[&str], out: &CommandOutput) -> anyhow::Error {
    if out.timed_out {
        return anyhow!("git {} timed out", args.join(" "));
    }
    let code = out
        .code
        .map_or_else(|| "signal".to_string(), |code| code.to_string());
    let stderr = out.stderr.trim();
    if stderr.is_empty() {
        anyhow!("git {} failed (exit {code})", args.join(" "))
    } else {
        anyhow!("git {} failed (exit {code}): {stderr}", args.join(" "))
    }
}
