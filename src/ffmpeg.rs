use std::path::Path;
use std::process::{Command, Output};

use log::{debug, error};
use serde_json::Value;

use crate::app_config::FfmpegConfig;
use crate::errors::ToolError;
use crate::subtitle_processor::{self, SubtitleEntry};

// @module: External media tools (ffprobe / ffmpeg)

/// The two capabilities the extraction pipeline needs from the outside world
pub trait MediaToolkit {
    /// Structured container metadata for `video`, shaped like `ffprobe -show_format` JSON
    fn probe(&self, video: &Path) -> Result<Value, ToolError>;

    /// Subtitle cues of `video`, in stream order
    fn extract_subtitles(&self, video: &Path) -> Result<Vec<SubtitleEntry>, ToolError>;
}

/// [`MediaToolkit`] backed by the ffprobe and ffmpeg binaries
#[derive(Debug, Clone)]
pub struct FfmpegToolkit {
    config: FfmpegConfig,
}

impl FfmpegToolkit {
    pub fn new(config: FfmpegConfig) -> Self {
        Self { config }
    }

    fn run(&self, tool: &str, command: &mut Command) -> Result<Output, ToolError> {
        debug!("Running {:?}", command);

        let output = command.output().map_err(|source| ToolError::Spawn {
            tool: tool.to_string(),
            source,
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let filtered = filter_ffmpeg_stderr(&stderr);
            error!("{} failed: {}", tool, filtered);
            return Err(ToolError::Failed {
                tool: tool.to_string(),
                stderr: filtered,
            });
        }

        Ok(output)
    }
}

impl Default for FfmpegToolkit {
    fn default() -> Self {
        Self::new(FfmpegConfig::default())
    }
}

impl MediaToolkit for FfmpegToolkit {
    fn probe(&self, video: &Path) -> Result<Value, ToolError> {
        let tool = self.config.ffprobe_path.as_str();
        let output = self.run(
            tool,
            Command::new(tool)
                .args(["-v", "quiet", "-print_format", "json", "-show_format"])
                .arg(video),
        )?;

        serde_json::from_slice(&output.stdout).map_err(|e| ToolError::InvalidOutput {
            tool: tool.to_string(),
            message: format!("Failed to parse ffprobe JSON output: {}", e),
        })
    }

    fn extract_subtitles(&self, video: &Path) -> Result<Vec<SubtitleEntry>, ToolError> {
        let tool = self.config.ffmpeg_path.as_str();

        // The transient SRT sits next to the video and is removed when `srt_path` drops
        let file_name = video
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "video".to_string());
        let dir = match video.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let srt_path = tempfile::Builder::new()
            .prefix(&format!("{}.", file_name))
            .suffix(".tmp.srt")
            .tempfile_in(dir)?
            .into_temp_path();

        self.run(
            tool,
            Command::new(tool)
                .args(["-v", "error", "-y", "-i"])
                .arg(video)
                .args(["-map", &format!("0:s:{}", self.config.subtitle_stream), "-c:s", "srt"])
                .arg(&srt_path),
        )?;

        subtitle_processor::parse_srt_file(&srt_path).map_err(|e| ToolError::InvalidOutput {
            tool: tool.to_string(),
            message: format!("{:#}", e),
        })
    }
}

/// Filter ffmpeg stderr to only show meaningful error lines, stripping the
/// version banner, build configuration, and stream metadata noise.
pub fn filter_ffmpeg_stderr(stderr: &str) -> String {
    let dominated_prefixes = [
        "ffmpeg version",
        "ffprobe version",
        "built with",
        "configuration:",
        "lib",
        "Input #",
        "Metadata:",
        "Duration:",
        "Stream #",
        "Output #",
        "Stream mapping:",
        "Press [q]",
    ];

    let meaningful: Vec<&str> = stderr
        .lines()
        .filter(|line| {
            let trimmed = line.trim();
            !trimmed.is_empty() && !dominated_prefixes.iter().any(|p| trimmed.starts_with(p))
        })
        .collect();

    if meaningful.is_empty() {
        "unknown error (stderr was empty after filtering)".to_string()
    } else {
        meaningful.join("\n")
    }
}
