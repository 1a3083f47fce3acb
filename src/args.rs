//! ffmpeg argument vectors for the read and write paths.
//!
//! These functions are pure: they never touch the filesystem or spawn
//! anything. Argument order matters to ffmpeg (input options apply to the
//! next `-i`, output options to the next output), so the order produced
//! here is part of the contract.

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use crate::codec::escape;
use crate::metadata::Metadata;
use crate::options::Options;

/// Infix inserted between the stem and extension of the temp artifact.
pub const TEMP_INFIX: &str = ".ffmetadata";

/// Muxer name of the metadata export format.
pub const EXPORT_FORMAT: &str = "ffmetadata";

/// Output target that makes ffmpeg write to its standard output.
pub const STDOUT_TARGET: &str = "pipe:1";

/// Sibling path ffmpeg writes to before it replaces `src`.
///
/// `music/song.mp3` becomes `music/song.ffmetadata.mp3`.
pub fn temp_path(src: &Path) -> PathBuf {
    let mut name = src.file_stem().map(OsStr::to_os_string).unwrap_or_default();
    name.push(TEMP_INFIX);
    if let Some(ext) = src.extension() {
        name.push(".");
        name.push(ext);
    }
    src.with_file_name(name)
}

/// Arguments for exporting tags, or extracting the cover when
/// `options.cover_path` is set.
pub fn read_args(src: &Path, options: &Options) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-i".into(), src.into()];
    match &options.cover_path {
        Some(cover) => args.push(cover.into()),
        None => args.extend(["-f", EXPORT_FORMAT, STDOUT_TARGET].map(OsString::from)),
    }
    args
}

/// Arguments for copying `src` into `dst` with new tags and attachments.
pub fn write_args(src: &Path, dst: &Path, metadata: &Metadata, options: &Options) -> Vec<OsString> {
    let mut inputs: Vec<OsString> = vec!["-i".into(), src.into()];
    let mut maps: Vec<OsString> = vec!["-map".into(), "0:0".into()];

    for (i, attachment) in options.attachments.iter().enumerate() {
        let stream = i + 1;
        inputs.push("-i".into());
        inputs.push(attachment.into());
        maps.push("-map".into());
        maps.push(format!("{}:0", stream).into());
    }

    let mut args: Vec<OsString> = vec!["-y".into()];
    args.append(&mut inputs);
    args.append(&mut maps);
    args.extend(["-codec", "copy"].map(OsString::from));

    if options.id3v1 {
        args.extend(["-write_id3v1", "1"].map(OsString::from));
    }
    if options.id3v2_3 {
        args.extend(["-id3v2_version", "3"].map(OsString::from));
    }

    for (key, value) in metadata.iter() {
        args.push("-metadata".into());
        args.push(format!("{}={}", escape(key), escape(value)).into());
    }

    args.push(dst.into());
    args
}
