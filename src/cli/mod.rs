//! Command-line interface for ffmetadata.
//!
//! This module provides commands for reading and writing tags and for
//! checking which ffmpeg executable will be used.

mod commands;

pub use commands::{Cli, run_command};
