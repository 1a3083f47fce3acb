//! Test utilities and fixtures for ffmetadata tests.
//!
//! This module provides fake ffmpeg executables and on-disk fixtures so the
//! process runner and write pipeline can be exercised without a real
//! ffmpeg installation.
//!
//! # Example
//!
//! ```ignore
//! use crate::test_utils::{fake_tool, FAKE_FFMPEG};
//!
//! #[tokio::test]
//! async fn test_something() {
//!     let (_dir, program) = fake_tool(FAKE_FFMPEG);
//!     let client = Ffmetadata::with_program(program);
//!     // ... test logic
//! }
//! ```

use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::metadata::Metadata;

/// A tiny stand-in for ffmpeg.
///
/// - Write invocations (`-y -i SRC ...  OUT`) require SRC to exist. Each
///   `-metadata` token is split at its first `=` and the halves are kept
///   verbatim, the way ffmpeg does; OUT receives them as an ffmetadata
///   document, escaped the way ffmpeg exports.
/// - Read invocations (`-i SRC -f ffmetadata pipe:1`) print SRC.
/// - Anything else fails with exit code 1.
pub const FAKE_FFMPEG: &str = r#"
esc() {
  printf '%s' "$1" | sed -e 's/[\\=;#]/\\&/g' -e '$!s/$/\\/'
}
if [ "$1" = "-y" ]; then
  [ -f "$3" ] || { echo "$3: No such file or directory" >&2; exit 1; }
  for out; do :; done
  {
    echo ';FFMETADATA1'
    prev=''
    for arg; do
      if [ "$prev" = "-metadata" ]; then
        printf '%s=%s\n' "$(esc "${arg%%=*}")" "$(esc "${arg#*=}")"
      fi
      prev="$arg"
    done
  } > "$out"
  exit 0
fi
if [ "$3" = "-f" ]; then
  cat "$2" || exit 1
  exit 0
fi
echo "unsupported invocation: $*" >&2
exit 1
"#;

/// Writes `body` as an executable `sh` script in a fresh temp directory.
///
/// Keep the returned `TempDir` alive for as long as the script is used.
#[cfg(unix)]
pub fn fake_tool(body: &str) -> (TempDir, PathBuf) {
    use std::os::unix::fs::PermissionsExt;

    let dir = tempfile::tempdir().expect("Failed to create temp directory");
    let path = dir.path().join("fake-ffmpeg");
    std::fs::write(&path, format!("#!/bin/sh\n{}\n", body)).expect("Failed to write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755))
        .expect("Failed to make script executable");
    (dir, path)
}

/// Creates a file with the given bytes inside `dir` and returns its path.
pub fn media_fixture(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).expect("Failed to write fixture");
    path
}

/// A record using the well-known keys with plain values.
pub fn mock_metadata() -> Metadata {
    let mut meta = Metadata::new();
    meta.set_artist("Test Artist");
    meta.set_album("Test Album");
    meta.set_title("Test Track");
    meta.set_track("1/10");
    meta.set_disk("1");
    meta.set_label("Test Label");
    meta.set_date("2023");
    meta
}

/// Names of the files currently in `dir`, sorted.
pub fn dir_entries(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|e| e.expect("Failed to read entry").file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_metadata_defaults() {
        let meta = mock_metadata();
        assert_eq!(meta.title(), Some("Test Track"));
        assert_eq!(meta.artist(), Some("Test Artist"));
        assert_eq!(meta.len(), 7);
    }

    #[test]
    fn test_media_fixture_and_entries() {
        let dir = tempfile::tempdir().unwrap();
        media_fixture(dir.path(), "b.mp3", b"b");
        media_fixture(dir.path(), "a.mp3", b"a");
        assert_eq!(dir_entries(dir.path()), ["a.mp3", "b.mp3"]);
    }

    #[cfg(unix)]
    #[test]
    fn test_fake_tool_is_executable() {
        use std::os::unix::fs::PermissionsExt;

        let (_dir, path) = fake_tool("exit 0");
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o111, 0o111);
    }
}
