//! ffmetadata - read and write media tags through ffmpeg.
//!
//! Tags are exported with `ffmpeg -i SRC -f ffmetadata pipe:1` and decoded
//! as they stream in. Writes copy the streams into a sibling temp file with
//! `-codec copy -metadata key=value ...` and atomically rename it over the
//! source once ffmpeg exits successfully.
//!
//! # Example
//!
//! ```no_run
//! use ffmetadata::{Ffmetadata, Metadata, Options};
//!
//! # async fn demo() -> ffmetadata::Result<()> {
//! let client = Ffmetadata::new();
//!
//! let mut tags = Metadata::new();
//! tags.set_title("Test");
//! client.write("song.mp3", tags, &Options::default()).await?;
//!
//! let read = client.read("song.mp3", &Options::default()).await?;
//! assert_eq!(read.into_executed().unwrap().title(), Some("Test"));
//! # Ok(())
//! # }
//! ```

pub mod args;
pub mod client;
pub mod codec;
pub mod config;
pub mod error;
pub mod metadata;
pub mod options;
pub mod outcome;
pub mod pipeline;
pub mod runner;
#[cfg(test)]
pub mod test_utils;

pub use client::Ffmetadata;
pub use config::ToolConfig;
pub use error::{Error, Result};
pub use metadata::Metadata;
pub use options::Options;
pub use outcome::Outcome;
pub use runner::{FfmpegRunner, ProcessRunner};
