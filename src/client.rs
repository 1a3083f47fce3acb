//! Public entry point tying the builder, runner and pipeline together.

use std::path::{Path, PathBuf};

use crate::args::read_args;
use crate::config::{self, ToolConfig};
use crate::error::Result;
use crate::metadata::Metadata;
use crate::options::Options;
use crate::outcome::Outcome;
use crate::pipeline;
use crate::runner::{FfmpegRunner, ProcessRunner};

/// Reads and writes media tags through ffmpeg.
///
/// Each call drives exactly one ffmpeg process; nothing is shared between
/// calls except the (immutable) runner configuration. Concurrent writes to
/// the same file are the caller's responsibility.
#[derive(Debug, Clone)]
pub struct Ffmetadata<R = FfmpegRunner> {
    runner: R,
}

impl Default for Ffmetadata<FfmpegRunner> {
    fn default() -> Self {
        Self::new()
    }
}

impl Ffmetadata<FfmpegRunner> {
    /// Resolve ffmpeg from the environment and the config file.
    pub fn new() -> Self {
        Self::with_config(ToolConfig::resolve(None, &config::load()))
    }

    pub fn with_config(config: ToolConfig) -> Self {
        Self {
            runner: FfmpegRunner::new(config),
        }
    }

    /// Use a specific ffmpeg executable; other settings still come from
    /// the config file.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self::with_config(ToolConfig::resolve(Some(program.into()), &config::load()))
    }

    /// Switch to a different ffmpeg executable.
    pub fn set_program(&mut self, program: impl Into<PathBuf>) {
        self.runner.set_program(program);
    }

    pub fn program(&self) -> &Path {
        self.runner.program()
    }

    /// First line of `ffmpeg -version`.
    pub async fn version(&self) -> Result<String> {
        self.runner.version().await
    }
}

impl<R: ProcessRunner> Ffmetadata<R> {
    pub fn with_runner(runner: R) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Read the tags of `src`.
    ///
    /// With `options.cover_path` set, the embedded cover is extracted to that
    /// path instead and the returned record is empty.
    pub async fn read(&self, src: impl AsRef<Path>, options: &Options) -> Result<Outcome<Metadata>> {
        let src = src.as_ref();
        let args = read_args(src, options);

        if options.dry_run {
            return Ok(Outcome::DryRun(args));
        }

        let metadata = self.runner.run_read(&args).await?;
        match &options.cover_path {
            Some(cover) => tracing::info!("Extracted cover of {:?} to {:?}", src, cover),
            None => tracing::info!("Read {} tags from {:?}", metadata.len(), src),
        }
        Ok(Outcome::Executed(metadata))
    }

    /// Replace the tags of `src` in place, muxing in any attachments.
    ///
    /// On success the returned record is `metadata`. On failure `src` is
    /// untouched and no temp file is left behind.
    pub async fn write(
        &self,
        src: impl AsRef<Path>,
        metadata: Metadata,
        options: &Options,
    ) -> Result<Outcome<Metadata>> {
        let src = src.as_ref();
        let outcome = pipeline::write(&self.runner, src, metadata, options).await?;
        if let Outcome::Executed(written) = &outcome {
            tracing::info!("Wrote {} tags to {:?}", written.len(), src);
        }
        Ok(outcome)
    }
}
