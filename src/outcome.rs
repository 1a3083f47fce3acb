//! Result of an operation that may have been a dry run.

use std::ffi::OsString;

/// What a read or write produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// ffmpeg ran and the operation completed
    Executed(T),
    /// Nothing ran; these are the arguments ffmpeg would have received
    DryRun(Vec<OsString>),
}

impl<T> Outcome<T> {
    pub fn is_dry_run(&self) -> bool {
        matches!(self, Self::DryRun(_))
    }

    pub fn into_executed(self) -> Option<T> {
        match self {
            Self::Executed(value) => Some(value),
            Self::DryRun(_) => None,
        }
    }

    pub fn into_args(self) -> Option<Vec<OsString>> {
        match self {
            Self::Executed(_) => None,
            Self::DryRun(args) => Some(args),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        match self {
            Self::Executed(value) => Outcome::Executed(f(value)),
            Self::DryRun(args) => Outcome::DryRun(args),
        }
    }
}
