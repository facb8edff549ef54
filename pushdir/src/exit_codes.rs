//! Stable exit codes for the pushdir CLI.

/// Every step succeeded (or there was nothing to commit and the push went through).
pub const OK: i32 = 0;
/// Any detected failure: missing git, bad path, remote, pull, commit or push.
pub const FAILED: i32 = 1;
