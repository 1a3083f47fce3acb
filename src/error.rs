//! Crate-wide error types.
//!
//! Library modules return [`Error`] through the [`Result`] alias, while
//! the binary uses `anyhow` for convenient error propagation.
//!
//! # Design
//!
//! - [`Error::Spawn`]: the ffmpeg executable could not be started
//! - [`Error::ProcessExit`]: ffmpeg ran but exited unsuccessfully
//! - [`Error::Filesystem`]: renaming or removing the temp artifact failed
//! - [`Error::Decode`]: the ffmetadata stream was malformed
//!
//! None of these are retried: a failed ffmpeg invocation is not assumed
//! to be transient.
//!
//! # Example
//!
//! ```ignore
//! use ffmetadata::error::{Error, Result};
//!
//! async fn title_of(client: &Ffmetadata, path: &Path) -> Result<Option<String>> {
//!     let meta = client.read(path, &Options::default()).await?;
//!     Ok(meta.into_executed().and_then(|m| m.title().map(str::to_owned)))
//! }
//! ```

use std::path::PathBuf;
use std::time::Duration;

/// Crate-wide result type.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error for read and write operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The external tool could not be spawned (missing, not executable, ...)
    #[error("Failed to spawn {program:?}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The external tool exited with a nonzero status or was killed by a signal
    #[error("{}", exit_message(*.code, .stderr))]
    ProcessExit { code: Option<i32>, stderr: String },

    /// Rename or removal of the temp artifact failed
    #[error("Filesystem error for {path:?}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed ffmetadata input
    #[error("Decode error at line {line}: {message}")]
    Decode { line: usize, message: String },

    /// The configured deadline elapsed before the tool exited
    #[error("ffmpeg did not finish within {0:?}")]
    Timeout(Duration),

    /// Reading one of the child's output streams failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<Error>,
    },
}

fn exit_message(code: Option<i32>, stderr: &str) -> String {
    let stderr = stderr.trim();
    match (code, stderr.is_empty()) {
        (Some(code), true) => format!("ffmpeg exited with code {}", code),
        (Some(code), false) => format!("ffmpeg exited with code {}: {}", code, stderr),
        (None, true) => "ffmpeg was terminated by a signal".to_string(),
        (None, false) => format!("ffmpeg was terminated by a signal: {}", stderr),
    }
}

impl Error {
    /// Create a spawn error.
    pub fn spawn(program: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Spawn {
            program: program.into(),
            source,
        }
    }

    /// Create a filesystem error.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    /// Create a decode error for a 1-based line number.
    pub fn decode(line: usize, message: impl Into<String>) -> Self {
        Self::Decode {
            line,
            message: message.into(),
        }
    }

    /// Create a config error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// The captured stderr of a failed process, if this is an exit error.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            Self::ProcessExit { stderr, .. } => Some(stderr),
            Self::WithContext { source, .. } => source.stderr(),
            _ => None,
        }
    }

    /// Add context to an error.
    pub fn context(self, ctx: impl Into<String>) -> Self {
        Self::WithContext {
            context: ctx.into(),
            source: Box::new(self),
        }
    }
}

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn with_context(self, ctx: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.context(ctx))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn with_context(self, ctx: impl Into<String>) -> Result<T> {
        self.map_err(|e| Error::Io(e).context(ctx))
    }
}
