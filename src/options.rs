//! Options controlling how a read or write is carried out.

use std::path::PathBuf;

/// Options for [`read`](crate::Ffmetadata::read) and
/// [`write`](crate::Ffmetadata::write).
///
/// Options are read-only input; nothing in the crate mutates them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Options {
    /// Extra inputs muxed into the output, in order (write only)
    pub attachments: Vec<PathBuf>,
    /// Also write a legacy ID3v1 tag
    pub id3v1: bool,
    /// Pin the ID3v2 tag version to 2.3
    pub id3v2_3: bool,
    /// Return the argument vector instead of running ffmpeg
    pub dry_run: bool,
    /// Extract the embedded cover to this path instead of exporting tags (read only)
    pub cover_path: Option<PathBuf>,
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn attachment(mut self, path: impl Into<PathBuf>) -> Self {
        self.attachments.push(path.into());
        self
    }

    pub fn id3v1(mut self, enabled: bool) -> Self {
        self.id3v1 = enabled;
        self
    }

    pub fn id3v2_3(mut self, enabled: bool) -> Self {
        self.id3v2_3 = enabled;
        self
    }

    pub fn dry_run(mut self, enabled: bool) -> Self {
        self.dry_run = enabled;
        self
    }

    pub fn cover_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.cover_path = Some(path.into());
        self
    }
}
