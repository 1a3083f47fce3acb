//! Running ffmpeg and classifying how it exited.
//!
//! Both output streams are captured. They are drained concurrently in the
//! calling task, and the exit status is awaited only after both reach end
//! of file, so a successful read never loses directives that were streamed
//! just before exit.

use async_trait::async_trait;
use std::ffi::OsString;
use std::future::Future;
use std::path::Path;
use std::process::{ExitStatus, Stdio};
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::{Child, ChildStderr, ChildStdout, Command};

use crate::codec::decode_reader;
use crate::config::ToolConfig;
use crate::error::{Error, Result};
use crate::metadata::Metadata;

/// Something that can execute the read and write invocations.
///
/// [`FfmpegRunner`] is the real implementation; tests substitute mocks.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    /// Run a read invocation, decoding standard output as ffmetadata.
    async fn run_read(&self, args: &[OsString]) -> Result<Metadata>;

    /// Run a write invocation. Standard output carries no metadata.
    async fn run_write(&self, args: &[OsString]) -> Result<()>;
}

/// Exit status plus everything the process wrote to stderr.
#[derive(Debug)]
pub struct ProcessOutcome {
    pub code: Option<i32>,
    pub success: bool,
    pub stderr: Vec<u8>,
}

impl ProcessOutcome {
    fn new(status: ExitStatus, stderr: Vec<u8>) -> Self {
        Self {
            code: status.code(),
            success: status.success(),
            stderr,
        }
    }

    /// Success is exit code 0; anything else carries stderr as the error detail.
    pub fn into_result(self) -> Result<()> {
        if self.success {
            return Ok(());
        }
        Err(Error::ProcessExit {
            code: self.code,
            stderr: String::from_utf8_lossy(&self.stderr).into_owned(),
        })
    }
}

/// Spawns the configured ffmpeg executable.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    config: ToolConfig,
}

impl FfmpegRunner {
    pub fn new(config: ToolConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ToolConfig {
        &self.config
    }

    pub fn program(&self) -> &Path {
        &self.config.program
    }

    /// Replace the executable used for subsequent invocations.
    pub fn set_program(&mut self, program: impl Into<std::path::PathBuf>) {
        self.config.program = program.into();
    }

    fn spawn(&self, args: &[OsString]) -> Result<Child> {
        tracing::debug!(program = ?self.config.program, ?args, "Spawning ffmpeg");
        Command::new(&self.config.program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::spawn(&self.config.program, e))
    }

    async fn with_deadline<T>(&self, fut: impl Future<Output = Result<T>>) -> Result<T> {
        match self.config.timeout {
            Some(limit) => tokio::time::timeout(limit, fut)
                .await
                .map_err(|_| Error::Timeout(limit))?,
            None => fut.await,
        }
    }

    /// First line of `ffmpeg -version`, for diagnostics.
    pub async fn version(&self) -> Result<String> {
        let output = self
            .with_deadline(async {
                Command::new(&self.config.program)
                    .arg("-version")
                    .stdin(Stdio::null())
                    .kill_on_drop(true)
                    .output()
                    .await
                    .map_err(|e| Error::spawn(&self.config.program, e))
            })
            .await?;

        ProcessOutcome::new(output.status, output.stderr).into_result()?;
        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(stdout.lines().next().unwrap_or_default().trim().to_string())
    }
}

fn take_pipes(child: &mut Child) -> Result<(ChildStdout, ChildStderr)> {
    child.stdout.take().zip(child.stderr.take()).ok_or_else(|| {
        Error::Io(std::io::Error::other(
            "ffmpeg output streams were not captured",
        ))
    })
}

async fn read_stderr(mut stderr: ChildStderr) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    stderr.read_to_end(&mut buf).await?;
    Ok(buf)
}

/// Write-path stdout is diagnostic only; pass it on to the log.
async fn forward_stdout(stdout: ChildStdout) -> Result<()> {
    let mut lines = BufReader::new(stdout).split(b'\n');
    while let Some(line) = lines.next_segment().await? {
        tracing::trace!(target: "ffmetadata::ffmpeg", "{}", String::from_utf8_lossy(&line));
    }
    Ok(())
}

/// Kill ffmpeg if it is still running and reap it.
async fn abort(child: &mut Child) {
    if let Ok(Some(_)) = child.try_wait() {
        return;
    }
    if let Err(e) = child.start_kill() {
        tracing::debug!("ffmpeg already exited: {}", e);
    }
    if let Err(e) = child.wait().await {
        tracing::warn!("Failed to reap ffmpeg: {}", e);
    }
}

/// Drain both streams, then wait for exit. Returns the decoded stdout.
async fn collect_read(child: &mut Child) -> Result<Metadata> {
    let (stdout, stderr) = take_pipes(child)?;
    let (metadata, stderr) =
        tokio::try_join!(decode_reader(BufReader::new(stdout)), read_stderr(stderr))?;
    let status = child.wait().await?;
    ProcessOutcome::new(status, stderr).into_result()?;
    Ok(metadata)
}

async fn collect_write(child: &mut Child) -> Result<()> {
    let (stdout, stderr) = take_pipes(child)?;
    let ((), stderr) = tokio::try_join!(forward_stdout(stdout), read_stderr(stderr))?;
    let status = child.wait().await?;
    ProcessOutcome::new(status, stderr).into_result()
}

#[async_trait]
impl ProcessRunner for FfmpegRunner {
    async fn run_read(&self, args: &[OsString]) -> Result<Metadata> {
        let mut child = self.spawn(args)?;
        let result = self.with_deadline(collect_read(&mut child)).await;
        if result.is_err() {
            abort(&mut child).await;
        }
        result
    }

    async fn run_write(&self, args: &[OsString]) -> Result<()> {
        let mut child = self.spawn(args)?;
        let result = self.with_deadline(collect_write(&mut child)).await;
        if result.is_err() {
            abort(&mut child).await;
        }
        result
    }
}
