use crate::domain::tts::{
    order_segments, AssemblyError, AudioArtifact, AudioAssembler, AudioContainer, AudioSegment,
};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

/// Concatenates segments with ffmpeg's concat demuxer and stream copy.
///
/// Segments are written into a private scratch directory that is removed
/// when assembly finishes, whatever the outcome.
pub struct FfmpegAudioAssembler {
    program: PathBuf,
    timeout: Duration,
    scratch_root: Option<PathBuf>,
}

impl FfmpegAudioAssembler {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            scratch_root: None,
        }
    }

    /// Create scratch directories under `root` instead of the system temp dir
    pub fn with_scratch_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.scratch_root = Some(root.into());
        self
    }

    fn scratch_dir(&self) -> std::io::Result<tempfile::TempDir> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("assembly-");
        match &self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
    }

    async fn run_concat(&self, manifest: &Path, output: &Path) -> Result<(), AssemblyError> {
        let mut cmd = tokio::process::Command::new(&self.program);
        cmd.arg("-hide_banner")
            .arg("-loglevel")
            .arg("error")
            .arg("-f")
            .arg("concat")
            .arg("-safe")
            .arg("0")
            .arg("-i")
            .arg(manifest)
            .arg("-c")
            .arg("copy")
            .arg("-y")
            .arg(output)
            .stdin(Stdio::null())
            .kill_on_drop(true);

        let result = tokio::time::timeout(self.timeout, cmd.output())
            .await
            .map_err(|_| AssemblyError::Timeout(self.timeout.as_secs()))?
            .map_err(|e| {
                AssemblyError::Spawn(format!("{}: {}", self.program.display(), e))
            })?;

        if !result.status.success() {
            return Err(AssemblyError::ToolFailed {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

/// One `file '<path>'` line per segment, quoted for the concat demuxer
fn manifest_line(path: &Path) -> String {
    let quoted = path.to_string_lossy().replace('\'', "'\\''");
    format!("file '{}'\n", quoted)
}

#[async_trait]
impl AudioAssembler for FfmpegAudioAssembler {
    async fn assemble(
        &self,
        segments: Vec<AudioSegment>,
        container: AudioContainer,
    ) -> Result<AudioArtifact, AssemblyError> {
        let mut segments = order_segments(segments)?;

        if segments.len() == 1 {
            let only = segments.remove(0);
            return Ok(AudioArtifact {
                bytes: only.bytes,
                container,
            });
        }

        let start_time = std::time::Instant::now();
        let scratch = self.scratch_dir()?;
        let extension = container.extension();

        let mut manifest = String::new();
        for segment in &segments {
            let path = scratch
                .path()
                .join(format!("segment-{:04}.{}", segment.index, extension));
            tokio::fs::write(&path, &segment.bytes).await?;
            manifest.push_str(&manifest_line(&path));
        }

        let manifest_path = scratch.path().join("segments.txt");
        tokio::fs::write(&manifest_path, manifest).await?;

        let output_path = scratch.path().join(format!("assembled.{}", extension));
        self.run_concat(&manifest_path, &output_path).await?;

        let bytes = tokio::fs::read(&output_path).await?;
        if bytes.is_empty() {
            return Err(AssemblyError::ToolFailed {
                status: "success".to_string(),
                stderr: "empty output".to_string(),
            });
        }

        tracing::debug!(
            segments = segments.len(),
            audio_size_bytes = bytes.len(),
            latency_ms = start_time.elapsed().as_millis() as u64,
            "Audio segments assembled"
        );

        Ok(AudioArtifact { bytes, container })
    }
}
