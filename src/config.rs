//! Configuration for locating and running ffmpeg.
//!
//! An optional TOML file lives in the OS-standard config directory:
//! - Windows: %APPDATA%\ffmetadata\config.toml
//! - macOS: ~/Library/Application Support/ffmetadata/config.toml
//! - Linux: ~/.config/ffmetadata/config.toml
//!
//! ```toml
//! [ffmpeg]
//! path = "/opt/ffmpeg/bin/ffmpeg"
//! timeout_secs = 120
//! ```
//!
//! The file is only consulted when building a [`ToolConfig`]; nothing is
//! stored globally.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{Error, Result};

/// Executable name used when nothing else is configured.
pub const DEFAULT_PROGRAM: &str = "ffmpeg";

/// Environment variables that override the executable, checked in order.
pub const PROGRAM_ENV_VARS: &[&str] = &["FFMETADATA_FFMPEG", "FFMPEG_PATH"];

/// Contents of the config file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub ffmpeg: FfmpegConfig,
}

/// `[ffmpeg]` section
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    /// Executable path or name (empty = look up `ffmpeg` on PATH)
    pub path: Option<PathBuf>,

    /// Kill ffmpeg if a single invocation runs longer than this
    pub timeout_secs: Option<u64>,
}

/// Resolved settings handed to the process runner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolConfig {
    /// Executable to spawn; a bare name is resolved through PATH
    pub program: PathBuf,
    /// Deadline for one invocation
    pub timeout: Option<Duration>,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            program: PathBuf::from(DEFAULT_PROGRAM),
            timeout: None,
        }
    }
}

impl ToolConfig {
    /// Use a specific executable with no deadline.
    pub fn with_program(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            timeout: None,
        }
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Resolve from the environment and the config file.
    ///
    /// Order: explicit `program`, environment override, config file,
    /// then plain `ffmpeg`.
    pub fn resolve(program: Option<PathBuf>, config: &Config) -> Self {
        Self::resolve_with_env(program, config, |name| std::env::var_os(name))
    }

    fn resolve_with_env(
        program: Option<PathBuf>,
        config: &Config,
        env: impl Fn(&str) -> Option<std::ffi::OsString>,
    ) -> Self {
        let non_empty = |p: &PathBuf| !p.as_os_str().is_empty();
        let from_env = || {
            PROGRAM_ENV_VARS
                .iter()
                .filter_map(|name| env(name))
                .map(PathBuf::from)
                .find(non_empty)
        };

        let program = program
            .filter(non_empty)
            .or_else(from_env)
            .or_else(|| config.ffmpeg.path.clone().filter(non_empty))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_PROGRAM));

        let timeout = config.ffmpeg.timeout_secs.map(Duration::from_secs);

        tracing::debug!(?program, ?timeout, "Resolved ffmpeg configuration");
        Self { program, timeout }
    }
}

// ============================================================================
// Config File Operations
// ============================================================================

/// Get the config directory path
pub fn config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("ffmetadata"))
}

/// Get the full path to the config file
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join("config.toml"))
}

/// Load configuration from the default location
///
/// Returns default config if the file doesn't exist or can't be parsed.
/// Logs warnings but doesn't fail - we always return a usable config.
pub fn load() -> Config {
    let Some(path) = config_path() else {
        tracing::warn!("Could not determine config directory, using defaults");
        return Config::default();
    };

    if !path.exists() {
        tracing::debug!("No config file found at {:?}, using defaults", path);
        return Config::default();
    }

    match load_from(&path) {
        Ok(config) => {
            tracing::info!("Loaded config from {:?}", path);
            config
        }
        Err(e) => {
            tracing::error!("{}", e);
            tracing::warn!("Using default configuration");
            Config::default()
        }
    }
}

/// Load configuration from a specific file, failing on any error
pub fn load_from(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::config(format!("Failed to read {:?}: {}", path, e)))?;
    parse(&contents).map_err(|e| e.context(format!("{:?}", path)))
}

/// Parse config file contents
pub fn parse(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::config(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;

    fn no_env(_: &str) -> Option<OsString> {
        None
    }

    #[test]
    fn test_default_program() {
        let tool = ToolConfig::resolve_with_env(None, &Config::default(), no_env);
        assert_eq!(tool.program, PathBuf::from("ffmpeg"));
        assert_eq!(tool.timeout, None);
    }

    #[test]
    fn test_explicit_program_wins() {
        let tool = ToolConfig::resolve_with_env(
            Some(PathBuf::from("/opt/ffmpeg")),
            &Config::default(),
            |_| Some(OsString::from("/env/ffmpeg")),
        );
        assert_eq!(tool.program, PathBuf::from("/opt/ffmpeg"));
    }

    #[test]
    fn test_env_beats_config_file() {
        let config = parse("[ffmpeg]\npath = \"/file/ffmpeg\"\n").unwrap();
        let tool = ToolConfig::resolve_with_env(None, &config, |name| {
            (name == "FFMPEG_PATH").then(|| OsString::from("/env/ffmpeg"))
        });
        assert_eq!(tool.program, PathBuf::from("/env/ffmpeg"));
    }

    #[test]
    fn test_empty_env_ignored() {
        let config = parse("[ffmpeg]\npath = \"/file/ffmpeg\"\n").unwrap();
        let tool = ToolConfig::resolve_with_env(None, &config, |_| Some(OsString::new()));
        assert_eq!(tool.program, PathBuf::from("/file/ffmpeg"));
    }

    #[test]
    fn test_empty_explicit_program_falls_through() {
        let config = parse("[ffmpeg]\npath = \"/file/ffmpeg\"\n").unwrap();
        let tool = ToolConfig::resolve_with_env(Some(PathBuf::new()), &config, no_env);
        assert_eq!(tool.program, PathBuf::from("/file/ffmpeg"));

        let tool = ToolConfig::resolve_with_env(Some(PathBuf::new()), &config, |name| {
            (name == "FFMETADATA_FFMPEG").then(|| OsString::from("/env/ffmpeg"))
        });
        assert_eq!(tool.program, PathBuf::from("/env/ffmpeg"));
    }

    #[test]
    fn test_empty_file_path_is_default() {
        let config = parse("[ffmpeg]\npath = \"\"\n").unwrap();
        let tool = ToolConfig::resolve_with_env(None, &config, no_env);
        assert_eq!(tool.program, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_explicit_program_keeps_file_timeout() {
        let config = parse("[ffmpeg]\ntimeout_secs = 30\n").unwrap();
        let tool = ToolConfig::resolve_with_env(Some(PathBuf::from("/opt/ffmpeg")), &config, no_env);
        assert_eq!(tool.program, PathBuf::from("/opt/ffmpeg"));
        assert_eq!(tool.timeout, Some(Duration::from_secs(30)));
    }

    #[test]
    fn test_timeout_from_file() {
        let config = parse("[ffmpeg]\ntimeout_secs = 30\n").unwrap();
        let tool = ToolConfig::resolve_with_env(None, &config, no_env);
        assert_eq!(tool.timeout, Some(Duration::from_secs(30)));
        assert_eq!(tool.program, PathBuf::from("ffmpeg"));
    }

    #[test]
    fn test_empty_file_is_default() {
        assert_eq!(parse("").unwrap(), Config::default());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let err = parse("[ffmpeg\npath = ").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = load_from(&dir.path().join("nope.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[ffmpeg]\npath = \"ff\"\ntimeout_secs = 5\n").unwrap();
        let config = load_from(&path).unwrap();
        assert_eq!(config.ffmpeg.path, Some(PathBuf::from("ff")));
        assert_eq!(config.ffmpeg.timeout_secs, Some(5));
    }
}
