//! I/O helpers for the upload pipeline.

pub mod config;
pub mod git;
pub mod process;
