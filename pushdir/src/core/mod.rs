//! Pure pipeline logic, separated from I/O.
//!
//! Nothing in here spawns processes or touches the filesystem. The `io` layer
//! captures git's output and hands it to these functions for a decision.

pub mod classify;
pub mod remote;
pub mod types;
