//! Crash-safe in-place tag writing.
//!
//! ffmpeg cannot edit a file in place, so a write goes through a sibling
//! temp artifact:
//!
//! ```text
//! Building -> Running -> Succeeded -> Committed   (temp renamed over source)
//!                    \-> Failed    -> RolledBack  (temp removed)
//! ```
//!
//! A dry run stops in `Building`. Nothing touches the filesystem before
//! ffmpeg has exited, and a failed rename is rolled back like a failed
//! process. The source file is either fully replaced or left as it was.

use std::ffi::OsString;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

use crate::args::{temp_path, write_args};
use crate::error::{Error, Result};
use crate::metadata::Metadata;
use crate::options::Options;
use crate::outcome::Outcome;
use crate::runner::ProcessRunner;

/// Stage of one write invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteState {
    Building,
    Running,
    Succeeded,
    Failed,
    Committed,
    RolledBack,
}

impl WriteState {
    pub fn can_advance_to(self, next: WriteState) -> bool {
        use WriteState::*;
        matches!(
            (self, next),
            (Building, Running)
                | (Running, Succeeded)
                | (Running, Failed)
                | (Succeeded, Committed)
                | (Succeeded, Failed)
                | (Failed, RolledBack)
        )
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, WriteState::Committed | WriteState::RolledBack)
    }
}

impl fmt::Display for WriteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WriteState::Building => "building",
            WriteState::Running => "running",
            WriteState::Succeeded => "succeeded",
            WriteState::Failed => "failed",
            WriteState::Committed => "committed",
            WriteState::RolledBack => "rolled back",
        };
        f.write_str(name)
    }
}

/// Tracks and logs the state of a single write.
struct Transitions<'a> {
    src: &'a Path,
    state: WriteState,
}

impl<'a> Transitions<'a> {
    fn new(src: &'a Path) -> Self {
        Self {
            src,
            state: WriteState::Building,
        }
    }

    fn advance(&mut self, next: WriteState) {
        debug_assert!(
            self.state.can_advance_to(next),
            "invalid write transition {} -> {}",
            self.state,
            next
        );
        tracing::debug!(src = ?self.src, "write {} -> {}", self.state, next);
        self.state = next;
    }
}

/// Write `metadata` into `src` through `runner`.
///
/// Returns the record that was written, or the argument vector when
/// `options.dry_run` is set.
pub async fn write<R>(
    runner: &R,
    src: &Path,
    metadata: Metadata,
    options: &Options,
) -> Result<Outcome<Metadata>>
where
    R: ProcessRunner + ?Sized,
{
    let temp = temp_path(src);
    let args = write_args(src, &temp, &metadata, options);

    if options.dry_run {
        tracing::debug!(?src, "Dry run, not spawning ffmpeg");
        return Ok(Outcome::DryRun(args));
    }

    execute(runner, src, &temp, &args).await.1?;
    Ok(Outcome::Executed(metadata))
}

/// Run ffmpeg and commit or roll back. Always ends in a terminal state.
pub(crate) async fn execute<R>(
    runner: &R,
    src: &Path,
    temp: &Path,
    args: &[OsString],
) -> (WriteState, Result<()>)
where
    R: ProcessRunner + ?Sized,
{
    let mut transitions = Transitions::new(src);
    transitions.advance(WriteState::Running);

    let result = match runner.run_write(args).await {
        Ok(()) => {
            transitions.advance(WriteState::Succeeded);
            tokio::fs::rename(temp, src)
                .await
                .map_err(|e| Error::filesystem(temp, e))
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(()) => {
            transitions.advance(WriteState::Committed);
            (transitions.state, Ok(()))
        }
        Err(e) => {
            transitions.advance(WriteState::Failed);
            remove_temp(temp).await;
            transitions.advance(WriteState::RolledBack);
            (transitions.state, Err(e))
        }
    }
}

/// Best-effort removal; the original error is what the caller sees.
async fn remove_temp(temp: &Path) {
    match tokio::fs::remove_file(temp).await {
        Ok(()) => tracing::debug!(?temp, "Removed temp artifact"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove temp artifact {:?}: {}", temp, e),
    }
}
