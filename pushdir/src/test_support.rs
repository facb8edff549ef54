//! Test-only helpers: a scripted command runner and throwaway git repositories.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, anyhow};

use crate::io::process::{CommandOutput, CommandRunner};

/// Identity used for commits made by tests (git refuses to commit without one).
pub const GIT_IDENTITY_ENV: [(&str, &str); 4] = [
    ("GIT_AUTHOR_NAME", "pushdir test"),
    ("GIT_AUTHOR_EMAIL", "pushdir@example.com"),
    ("GIT_COMMITTER_NAME", "pushdir test"),
    ("GIT_COMMITTER_EMAIL", "pushdir@example.com"),
];

/// Build a [`CommandOutput`] with an explicit exit code.
pub fn exit(code: i32, stdout: &str, stderr: &str) -> CommandOutput {
    CommandOutput {
        code: Some(code),
        stdout: stdout.to_string(),
        stderr: stderr.to_string(),
        timed_out: false,
    }
}

/// Command runner that records every invocation and replays scripted outputs.
///
/// Rules match on an argument prefix; the first matching rule wins. Calls that
/// match no rule succeed with empty output.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    rules: Vec<(Vec<String>, CommandOutput)>,
    spawn_fails: bool,
    calls: RefCell<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `output` to any call whose arguments start with `prefix`.
    pub fn on(mut self, prefix: &[&str], output: CommandOutput) -> Self {
        let prefix = prefix.iter().map(|arg| arg.to_string()).collect();
        self.rules.push((prefix, output));
        self
    }

    /// Make every call fail to spawn, as if git were not installed.
    pub fn without_git(mut self) -> Self {
        self.spawn_fails = true;
        self
    }

    /// Arguments of every call so far, in order.
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.calls.borrow().clone()
    }

    /// Index of the first call whose arguments start with `prefix`.
    pub fn position(&self, prefix: &[&str]) -> Option<usize> {
        self.calls
            .borrow()
            .iter()
            .position(|call| starts_with(call, prefix))
    }

    /// True if any call's arguments start with `prefix`.
    pub fn called(&self, prefix: &[&str]) -> bool {
        self.position(prefix).is_some()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[&str], _workdir: &Path) -> Result<CommandOutput> {
        if self.spawn_fails {
            return Err(anyhow!("spawn {program}: No such file or directory"));
        }
        let call: Vec<String> = args.iter().map(|arg| arg.to_string()).collect();
        self.calls.borrow_mut().push(call.clone());
        let output = self
            .rules
            .iter()
            .find(|(prefix, _)| {
                let prefix: Vec<&str> = prefix.iter().map(String::as_str).collect();
                starts_with(&call, &prefix)
            })
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| exit(0, "", ""));
        Ok(output)
    }
}

fn starts_with(call: &[String], prefix: &[&str]) -> bool {
    call.len() >= prefix.len() && call.iter().zip(prefix).all(|(a, b)| a == b)
}

/// Temporary workspace with a plain directory to upload and a bare remote.
pub struct TestRepo {
    temp: tempfile::TempDir,
}

impl TestRepo {
    /// Create `work/` (not yet a repository) and `remote.git` (bare).
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        fs::create_dir_all(temp.path().join("work")).context("create work dir")?;
        run_git(temp.path(), &["init", "--bare", "remote.git"])?;
        Ok(Self { temp })
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    /// Directory that gets uploaded.
    pub fn work(&self) -> PathBuf {
        self.temp.path().join("work")
    }

    /// Remote URL (a local path to the bare repository).
    pub fn remote_url(&self) -> String {
        self.temp.path().join("remote.git").display().to_string()
    }

    pub fn write_file(&self, rel: &str, contents: &str) -> Result<()> {
        let path = self.work().join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("write {}", path.display()))
    }

    /// Run git in `work/` and return trimmed stdout.
    pub fn git(&self, args: &[&str]) -> Result<String> {
        run_git(&self.work(), args)
    }

    /// Run git against the bare remote and return trimmed stdout.
    pub fn remote_git(&self, args: &[&str]) -> Result<String> {
        run_git(&self.temp.path().join("remote.git"), args)
    }

    /// Give the bare remote a first commit on `branch` holding `rel`, made
    /// from a scratch repository so `work/` stays untouched.
    pub fn seed_remote(&self, branch: &str, rel: &str, contents: &str) -> Result<()> {
        let seed = self.temp.path().join("seed");
        fs::create_dir_all(&seed).context("create seed dir")?;
        run_git(&seed, &["init"])?;
        fs::write(seed.join(rel), contents).with_context(|| format!("write {rel} in seed"))?;
        run_git(&seed, &["add", "."])?;
        run_git(&seed, &["commit", "-m", "initial commit on the remote"])?;
        let refspec = format!("HEAD:refs/heads/{branch}");
        run_git(&seed, &["push", &self.remote_url(), &refspec])?;
        Ok(())
    }

    /// Clone `branch` of the remote into `name/`, overwrite `rel` there, commit and push.
    pub fn push_from_other_clone(&self, name: &str, branch: &str, rel: &str, contents: &str) -> Result<()> {
        let url = self.remote_url();
        run_git(self.temp.path(), &["clone", "--branch", branch, &url, name])?;
        let clone = self.temp.path().join(name);
        fs::write(clone.join(rel), contents).with_context(|| format!("write {rel} in {name}"))?;
        run_git(&clone, &["add", "."])?;
        run_git(&clone, &["commit", "-m", "change from another clone"])?;
        run_git(&clone, &["push", "origin", branch])?;
        Ok(())
    }
}

fn run_git(dir: &Path, args: &[&str]) -> Result<String> {
    let out = Command::new("git")
        .args(args)
        .current_dir(dir)
        .envs(GIT_IDENTITY_ENV)
        .output()
        .with_context(|| format!("spawn git {}", args.join(" ")))?;
    if !out.status.success() {
        return Err(anyhow!(
            "git {} failed: {}",
            args.join(" "),
            String::from_utf8_lossy(&out.stderr).trim()
        ));
    }
    Ok(String::from_utf8_lossy(&out.stdout).trim().to_string())
}
