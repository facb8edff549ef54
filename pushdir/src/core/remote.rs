//! Remote parsing and reconciliation.

use std::sync::LazyLock;

use anyhow::{Result, anyhow};

use crate::core::types::{MismatchStrategy, RemoteAction};

/// Direction column of a `git remote -v` line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteKind {
    Fetch,
    Push,
}

/// Parsed `git remote -v` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Remote {
    pub name: String,
    pub url: String,
    pub kind: RemoteKind,
}

/// Parse the full output of `git remote -v`, skipping blank lines.
pub fn parse_remotes(text: &str) -> Result<Vec<Remote>> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_remote_line)
        .collect()
}

fn parse_remote_line(line: &str) -> Result<Remote> {
    static REMOTE_RE: LazyLock<regex::Regex> = LazyLock::new(|| {
        // git >= 2.41 appends the partial clone filter to fetch lines: `(fetch) [blob:none]`.
        regex::Regex::new(r"^(\S+)\s+(.+?)\s+\((fetch|push)\)(?:\s+\[[^\]]*\])?\s*$").unwrap()
    });
    let caps = REMOTE_RE
        .captures(line)
        .ok_or_else(|| anyhow!("unexpected remote line: '{line}'"))?;
    let kind = match &caps[3] {
        "fetch" => RemoteKind::Fetch,
        _ => RemoteKind::Push,
    };
    Ok(Remote {
        name: caps[1].to_string(),
        url: caps[2].to_string(),
        kind,
    })
}

/// Fetch URL of `name`, if such a remote is listed.
pub fn fetch_url<'a>(remotes: &'a [Remote], name: &str) -> Option<&'a str> {
    remotes
        .iter()
        .find(|remote| remote.name == name && remote.kind == RemoteKind::Fetch)
        .map(|remote| remote.url.as_str())
}

/// True if two remote URLs name the same location.
///
/// Only whitespace and trailing slashes are ignored; `foo` and `foo.git` are
/// distinct URLs to git and stay distinct here.
pub fn same_url(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

fn normalize(url: &str) -> &str {
    url.trim().trim_end_matches('/')
}

/// Decide what to do about a remote given its current URL (if any).
pub fn plan_remote(current: Option<&str>, target: &str, strategy: MismatchStrategy) -> RemoteAction {
    match current {
        None => RemoteAction::Add,
        Some(url) if same_url(url, target) => RemoteAction::Keep,
        Some(_) => match strategy {
            MismatchStrategy::SetUrl => RemoteAction::SetUrl,
            MismatchStrategy::Recreate => RemoteAction::Recreate,
        },
    }
}
