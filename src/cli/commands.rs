//! CLI command definitions and handlers.
//!
//! Each subcommand is implemented as a function that takes the parsed arguments
//! and returns an `anyhow::Result<()>`.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::runtime::Runtime;
use tracing::debug;

use ffmetadata::codec::escape;
use ffmetadata::{Ffmetadata, Metadata, Options, Outcome, ToolConfig, config};

/// ffmetadata CLI
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// ffmpeg executable (default: $FFMETADATA_FFMPEG, $FFMPEG_PATH, config file, then `ffmpeg`)
    #[arg(long, global = true)]
    pub ffmpeg: Option<PathBuf>,

    /// Kill ffmpeg if it runs longer than this many seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand)]
pub enum Commands {
    /// Print the tags of a media file
    Read {
        /// Path to the media file
        path: PathBuf,
        /// Extract the embedded cover to this path instead
        #[arg(long)]
        cover: Option<PathBuf>,
        /// Print tags as JSON
        #[arg(long)]
        json: bool,
        /// Print the ffmpeg command instead of running it
        #[arg(long)]
        dry_run: bool,
    },
    /// Replace the tags of a media file in place
    Write {
        /// Path to the media file
        path: PathBuf,
        /// Tag to set, as KEY=VALUE (repeatable)
        #[arg(short = 'm', long = "metadata", value_name = "KEY=VALUE", value_parser = parse_tag)]
        tags: Vec<(String, String)>,
        /// Extra input to mux in, e.g. cover art (repeatable)
        #[arg(long = "attach", value_name = "PATH")]
        attachments: Vec<PathBuf>,
        /// Also write an ID3v1 tag
        #[arg(long)]
        id3v1: bool,
        /// Write ID3v2.3 instead of ID3v2.4
        #[arg(long = "id3v2-3")]
        id3v2_3: bool,
        /// Print the ffmpeg command instead of running it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show which ffmpeg will be used and its version
    CheckTool,
}

/// Run the parsed CLI command.
pub fn run_command(cli: &Cli) -> anyhow::Result<()> {
    let rt = Runtime::new()?;
    let client = build_client(cli);
    debug!("Using ffmpeg at {:?}", client.program());

    match &cli.command {
        Commands::Read {
            path,
            cover,
            json,
            dry_run,
        } => {
            let options = Options {
                cover_path: cover.clone(),
                dry_run: *dry_run,
                ..Options::default()
            };
            rt.block_on(cmd_read(&client, path, &options, *json))
        }
        Commands::Write {
            path,
            tags,
            attachments,
            id3v1,
            id3v2_3,
            dry_run,
        } => {
            let options = Options {
                attachments: attachments.clone(),
                id3v1: *id3v1,
                id3v2_3: *id3v2_3,
                dry_run: *dry_run,
                cover_path: None,
            };
            let metadata: Metadata = tags.iter().cloned().collect();
            rt.block_on(cmd_write(&client, path, metadata, &options))
        }
        Commands::CheckTool => rt.block_on(cmd_check_tool(&client)),
    }
}

fn build_client(cli: &Cli) -> Ffmetadata {
    let mut tool = ToolConfig::resolve(cli.ffmpeg.clone(), &config::load());
    if let Some(secs) = cli.timeout {
        tool = tool.timeout(Duration::from_secs(secs));
    }
    Ffmetadata::with_config(tool)
}

// ============================================================================
// Individual command implementations
// ============================================================================

async fn cmd_read(
    client: &Ffmetadata,
    path: &Path,
    options: &Options,
    json: bool,
) -> anyhow::Result<()> {
    let outcome = client
        .read(path, options)
        .await
        .with_context(|| format!("Failed to read {:?}", path))?;

    match outcome {
        Outcome::DryRun(args) => print_command(client.program(), &args),
        Outcome::Executed(_) if options.cover_path.is_some() => {
            if let Some(cover) = &options.cover_path {
                println!("Cover written to {}", cover.display());
            }
        }
        Outcome::Executed(metadata) if json => {
            println!("{}", serde_json::to_string_pretty(&metadata)?);
        }
        Outcome::Executed(metadata) => {
            for (key, value) in metadata.iter() {
                println!("{}={}", escape(key), escape(value));
            }
        }
    }
    Ok(())
}

async fn cmd_write(
    client: &Ffmetadata,
    path: &Path,
    metadata: Metadata,
    options: &Options,
) -> anyhow::Result<()> {
    let outcome = client
        .write(path, metadata, options)
        .await
        .with_context(|| format!("Failed to write {:?}", path))?;

    match outcome {
        Outcome::DryRun(args) => print_command(client.program(), &args),
        Outcome::Executed(written) => {
            println!("Wrote {} tag(s) to {}", written.len(), path.display());
            if !options.attachments.is_empty() {
                println!("Attached {} file(s)", options.attachments.len());
            }
        }
    }
    Ok(())
}

async fn cmd_check_tool(client: &Ffmetadata) -> anyhow::Result<()> {
    println!("ffmpeg: {}", client.program().display());
    match client.version().await {
        Ok(version) => {
            println!("  ✓ {}", version);
            Ok(())
        }
        Err(e) => {
            println!("  ✗ {}", e);
            println!();
            println!("Install ffmpeg (https://ffmpeg.org/download.html) or point");
            println!("--ffmpeg / FFMPEG_PATH at an existing executable.");
            anyhow::bail!("ffmpeg is not usable")
        }
    }
}

// ============================================================================
// Helpers
// ============================================================================

/// Parse a `KEY=VALUE` argument. The value may itself contain `=`.
fn parse_tag(raw: &str) -> Result<(String, String), String> {
    match raw.split_once('=') {
        Some(("", _)) => Err(format!("empty tag name in {:?}", raw)),
        Some((key, value)) => Ok((key.to_string(), value.to_string())),
        None => Err(format!("expected KEY=VALUE, got {:?}", raw)),
    }
}

fn print_command(program: &Path, args: &[OsString]) {
    let mut line = shell_quote(&program.to_string_lossy());
    for arg in args {
        line.push(' ');
        line.push_str(&shell_quote(&arg.to_string_lossy()));
    }
    println!("{}", line);
}

/// Quote a token for POSIX shells when it contains anything unusual.
fn shell_quote(token: &str) -> String {
    let plain = !token.is_empty()
        && token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_-./:=,+@%".contains(c));
    if plain {
        token.to_string()
    } else {
        format!("'{}'", token.replace('\'', r"'\''"))
    }
}
