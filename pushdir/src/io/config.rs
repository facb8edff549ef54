//! Upload configuration stored in `pushdir.toml`.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::core::types::MismatchStrategy;

/// Default config file name, looked up in the current directory.
pub const DEFAULT_CONFIG_FILE: &str = "pushdir.toml";

/// Upload configuration (TOML).
///
/// Meant to be edited by hand. Missing fields take the defaults below;
/// `remote_url` has none and must come from the file or the command line.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct UploadConfig {
    /// Directory to upload.
    pub local_path: PathBuf,

    /// Remote repository URL (e.g. `https://github.com/octo/project.git`).
    pub remote_url: String,

    pub commit_message: String,

    /// Branch created on init and pushed.
    pub branch: String,

    pub remote_name: String,

    /// Pull with rebase and autostash before staging, when the remote branch exists.
    pub pull: bool,

    /// How to fix a remote that already exists with another URL.
    pub on_remote_mismatch: MismatchStrategy,

    /// Kill any single git command running longer than this. Unset waits forever.
    /// When set, git cannot prompt for credentials.
    pub command_timeout_secs: Option<u64>,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            local_path: PathBuf::from("."),
            remote_url: String::new(),
            commit_message: "Upload via pushdir".to_string(),
            branch: "main".to_string(),
            remote_name: "origin".to_string(),
            pull: true,
            on_remote_mismatch: MismatchStrategy::SetUrl,
            command_timeout_secs: None,
        }
    }
}

impl UploadConfig {
    pub fn validate(&self) -> Result<()> {
        if self.remote_url.trim().is_empty() {
            return Err(anyhow!(
                "remote_url must be set (in the config file or with --remote-url)"
            ));
        }
        if self.commit_message.trim().is_empty() {
            return Err(anyhow!("commit_message must not be empty"));
        }
        validate_name("branch", &self.branch)?;
        validate_name("remote_name", &self.remote_name)?;
        if self.command_timeout_secs == Some(0) {
            return Err(anyhow!("command_timeout_secs must be > 0"));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }
}

fn validate_name(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(anyhow!("{field} must not be empty"));
    }
    if value.chars().any(char::is_whitespace) {
        return Err(anyhow!("{field} must not contain whitespace: '{value}'"));
    }
    Ok(())
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `UploadConfig::default()`. Validation is left
/// to the caller so command-line overrides can fill in required fields first.
pub fn load_config(path: &Path) -> Result<UploadConfig> {
    if !path.exists() {
        return Ok(UploadConfig::default());
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: UploadConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    Ok(cfg)
}

/// Atomically write config to disk (temp file + rename).
pub fn write_config(path: &Path, cfg: &UploadConfig) -> Result<()> {
    let mut buf = toml::to_string_pretty(cfg).context("serialize config toml")?;
    buf.push('\n');
    write_atomic(path, &buf)
}

fn write_atomic(path: &Path, contents: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("create directory {}", parent.display()))?;
    }
    let tmp_path = path.with_extension("toml.tmp");
    fs::write(&tmp_path, contents)
        .with_context(|| format!("write temp config {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path).with_context(|| format!("replace config {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, UploadConfig::default());
    }

    #[test]
    fn write_then_load_round_trips() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("pushdir.toml");
        let cfg = UploadConfig {
            remote_url: "https://github.com/octo/project.git".to_string(),
            command_timeout_secs: Some(120),
            on_remote_mismatch: MismatchStrategy::Recreate,
            ..UploadConfig::default()
        };
        write_config(&path, &cfg).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("pushdir.toml");
        fs::write(
            &path,
            "remote_url = \"git@github.com:octo/project.git\"\non_remote_mismatch = \"recreate\"\n",
        )
        .expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.remote_url, "git@github.com:octo/project.git");
        assert_eq!(cfg.on_remote_mismatch, MismatchStrategy::Recreate);
        assert_eq!(cfg.branch, "main");
        assert!(cfg.pull);
        cfg.validate().expect("valid");
    }

    #[test]
    fn default_requires_remote_url() {
        let err = UploadConfig::default().validate().expect_err("invalid");
        assert!(err.to_string().contains("remote_url"));
    }

    #[test]
    fn rejects_branch_with_whitespace() {
        let cfg = UploadConfig {
            remote_url: "https://example.com/x.git".to_string(),
            branch: "my branch".to_string(),
            ..UploadConfig::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn rejects_zero_timeout() {
        let cfg = UploadConfig {
            remote_url: "https://example.com/x.git".to_string(),
            command_timeout_secs: Some(0),
            ..UploadConfig::default()
        };
        assert!(cfg.validate().is_err());
    }
}
