//! Stage, commit and push a local directory to a remote repository.
//!
//! The crate drives the `git` binary through a fixed pipeline. The
//! architecture keeps the same split throughout:
//!
//! - **[`core`]**: Pure logic (remote reconciliation, result classification).
//!   No I/O, fully testable in isolation.
//! - **[`io`]**: Side-effecting operations (process execution, git, config files).
//!   Behind the [`io::process::CommandRunner`] seam so tests can script git.
//!
//! [`upload`] wires the two together into the pipeline, and [`report`] owns the
//! text shown to the user.

pub mod core;
pub mod error;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod report;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
pub mod upload;
