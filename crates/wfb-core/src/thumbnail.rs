//! Video thumbnail extraction via `ffmpeg`.
//!
//! Best effort only: every failure (tool missing, non-zero exit, timeout,
//! empty output) degrades to "no thumbnail". Input and output live in
//! [`tempfile::NamedTempFile`] guards, so both files are removed on every exit
//! path, including a timeout that drops the running child.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
    process::Stdio,
    time::Duration,
};

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::{config::Config, errors::Error, ports::ThumbnailSource, Result};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const STDERR_TAIL_CHARS: usize = 300;

#[derive(Clone, Debug)]
pub struct ThumbnailExtractor {
    program: PathBuf,
    /// Arguments placed before the ffmpeg arguments (wrappers such as `nice`).
    leading_args: Vec<OsString>,
    timeout: Duration,
    temp_dir: PathBuf,
}

impl ThumbnailExtractor {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration, temp_dir: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
            timeout,
            temp_dir: temp_dir.into(),
        }
    }

    pub fn from_config(cfg: &Config) -> Self {
        Self::new(&cfg.ffmpeg_path, cfg.thumbnail_timeout, &cfg.temp_dir)
    }

    #[cfg(test)]
    fn with_leading_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    /// Extract the frame at 00:00:01 scaled to 320x240 as JPEG.
    pub async fn extract(&self, video: &[u8]) -> Option<Vec<u8>> {
        match self.try_extract(video).await {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                debug!("thumbnail unavailable: {e}");
                None
            }
        }
    }

    async fn try_extract(&self, video: &[u8]) -> Result<Vec<u8>> {
        let input = tempfile::Builder::new()
            .prefix("wfb-video-")
            .suffix(".mp4")
            .tempfile_in(&self.temp_dir)?;
        tokio::fs::write(input.path(), video).await?;

        let output = tempfile::Builder::new()
            .prefix("wfb-thumb-")
            .suffix(".jpg")
            .tempfile_in(&self.temp_dir)?;

        let child = Command::new(&self.program)
            .args(&self.leading_args)
            .args(ffmpeg_args(input.path(), output.path()))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let out = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                Error::External(format!("ffmpeg timed out after {:?}", self.timeout))
            })??;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            let tail: String = stderr
                .chars()
                .rev()
                .take(STDERR_TAIL_CHARS)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect();
            return Err(Error::External(format!(
                "ffmpeg exited with {}: {}",
                out.status,
                tail.trim()
            )));
        }

        let bytes = tokio::fs::read(output.path()).await?;
        if bytes.is_empty() {
            return Err(Error::External("ffmpeg produced no output".to_string()));
        }
        Ok(bytes)
    }
}

#[async_trait]
impl ThumbnailSource for ThumbnailExtractor {
    async fn extract(&self, video: &[u8]) -> Option<Vec<u8>> {
        ThumbnailExtractor::extract(self, video).await
    }
}

fn ffmpeg_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-i".into(), input.into()];
    for a in ["-ss", "00:00:01", "-vframes", "1", "-vf", "scale=320:240", "-f", "image2", "-y"] {
        args.push(a.into());
    }
    args.push(output.into());
    args
}
