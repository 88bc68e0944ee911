use anyhow::{Result, Context, anyhow};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, warn, info, debug};
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::app_config::{Config, OutputConfig, OutputFormat};
use crate::errors::AppError;
use crate::ffmpeg::{FfmpegToolkit, MediaToolkit};
use crate::file_utils::FileManager;
use crate::metadata::{extract_metadata, Metadata};
use crate::telemetry::{extract_telemetry, Position};

// @module: Application controller for telemetry extraction

/// Everything extracted from one video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoTelemetry {
    /// Video the telemetry was read from
    pub source: PathBuf,

    /// Container metadata
    pub metadata: Metadata,

    /// One position per subtitle cue, in cue order
    pub positions: Vec<Position>,
}

impl VideoTelemetry {
    /// Serialize as a single JSON document
    pub fn to_json(&self, pretty: bool) -> serde_json::Result<String> {
        if pretty {
            serde_json::to_string_pretty(self)
        } else {
            serde_json::to_string(self)
        }
    }

    /// Serialize as JSON lines: the metadata first, then one position per line
    pub fn to_json_lines(&self) -> serde_json::Result<String> {
        let mut lines = Vec::with_capacity(self.positions.len() + 1);
        lines.push(serde_json::to_string(&self.metadata)?);
        for position in &self.positions {
            lines.push(serde_json::to_string(position)?);
        }

        let mut out = lines.join("\n");
        out.push('\n');
        Ok(out)
    }

    /// Serialize according to the output settings
    pub fn render(&self, output: &OutputConfig) -> serde_json::Result<String> {
        match output.format {
            OutputFormat::Json => self.to_json(output.pretty),
            OutputFormat::Jsonl => self.to_json_lines(),
        }
    }
}

/// Probe `video`, read its subtitle cues and map them to positions.
///
/// Metadata problems surface as [`AppError::Format`], tool failures as
/// [`AppError::Tool`]; cues without telemetry never fail.
pub fn process_video<T: MediaToolkit + ?Sized>(toolkit: &T, video: &Path) -> Result<VideoTelemetry, AppError> {
    if !video.is_file() {
        return Err(AppError::File(format!("Input file does not exist: {:?}", video)));
    }

    let probe = toolkit.probe(video)?;
    let metadata = extract_metadata(&probe)?;
    debug!(
        "Metadata for {:?}: created {}, {:.3}s",
        video, metadata.creation_time, metadata.duration
    );

    let cues = toolkit.extract_subtitles(video)?;
    let positions = extract_telemetry(metadata.creation_time, &cues);

    Ok(VideoTelemetry {
        source: video.to_path_buf(),
        metadata,
        positions,
    })
}

/// Result of processing one file
#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Telemetry was written to this path
    Written(PathBuf),
    /// Output already existed and overwrite was not forced
    Skipped(PathBuf),
}

/// Counts for a folder run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct FolderSummary {
    pub processed: usize,
    pub skipped: usize,
    pub failed: usize,
}

/// Main application controller
pub struct Controller<T: MediaToolkit = FfmpegToolkit> {
    // @field: App configuration
    config: Config,

    // @field: Prober and subtitle extractor
    toolkit: T,
}

impl Controller<FfmpegToolkit> {
    // @method: Create a controller that shells out to ffprobe/ffmpeg
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate().context("Configuration validation failed")?;
        let toolkit = FfmpegToolkit::new(config.ffmpeg.clone());
        Ok(Self { config, toolkit })
    }
}

impl<T: MediaToolkit> Controller<T> {
    // @method: Create a controller around any toolkit
    pub fn with_toolkit(config: Config, toolkit: T) -> Self {
        Self { config, toolkit }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Metadata only, without touching the subtitle stream
    pub fn probe(&self, video: &Path) -> Result<Metadata> {
        let probe = self.toolkit.probe(video)
            .with_context(|| format!("Failed to probe {:?}", video))?;
        Ok(extract_metadata(&probe)?)
    }

    /// Extract telemetry from one video without writing anything
    pub fn extract(&self, video: &Path) -> Result<VideoTelemetry> {
        process_video(&self.toolkit, video)
            .with_context(|| format!("Failed to extract telemetry from {:?}", video))
    }

    /// Expected output path for a video
    pub fn output_path_for(&self, video: &Path, output_dir: &Path) -> PathBuf {
        FileManager::generate_output_path(
            video,
            output_dir,
            &self.config.output.suffix,
            self.config.output.format.extension(),
        )
    }

    /// Extract telemetry from `input_file` and write it into `output_dir`
    pub fn run(&self, input_file: &Path, output_dir: &Path, force_overwrite: bool) -> Result<RunOutcome> {
        if !input_file.exists() {
            return Err(anyhow!("Input file does not exist: {:?}", input_file));
        }

        let output_path = self.output_path_for(input_file, output_dir);
        if output_path.exists() && !force_overwrite {
            warn!("Skipping {:?}, output already exists (use -f to force overwrite)", input_file);
            return Ok(RunOutcome::Skipped(output_path));
        }

        let telemetry = self.extract(input_file)?;
        let rendered = telemetry.render(&self.config.output)
            .context("Failed to serialize telemetry")?;

        FileManager::ensure_dir(output_dir)?;
        FileManager::write_to_file(&output_path, &rendered)?;

        info!("Wrote {} positions to {:?}", telemetry.positions.len(), output_path);
        Ok(RunOutcome::Written(output_path))
    }

    /// Process every video under `input_dir`.
    ///
    /// Output lands next to each video unless `output_dir` is given. A failing
    /// file is logged and counted; the rest of the folder is still processed.
    pub fn run_folder(&self, input_dir: &Path, output_dir: Option<&Path>, force_overwrite: bool) -> Result<FolderSummary> {
        let start_time = std::time::Instant::now();

        if !input_dir.is_dir() {
            return Err(anyhow!("Input directory does not exist: {:?}", input_dir));
        }

        let video_files = FileManager::find_videos(input_dir)?;
        if video_files.is_empty() {
            return Err(anyhow!("No video files found in directory: {:?}", input_dir));
        }

        let folder_pb = ProgressBar::new(video_files.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} files ({percent}%) {msg}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        folder_pb.set_style(template_result.progress_chars("=> "));

        let mut summary = FolderSummary::default();

        for video_file in &video_files {
            let file_name = video_file.file_name()
                .map(|f| f.to_string_lossy().to_string())
                .unwrap_or_else(|| "unknown".to_string());
            folder_pb.set_message(file_name.clone());

            let target_dir = match (output_dir, video_file.parent()) {
                (Some(dir), _) => dir.to_path_buf(),
                (None, Some(parent)) => parent.to_path_buf(),
                (None, None) => input_dir.to_path_buf(),
            };

            match self.run(video_file, &target_dir, force_overwrite) {
                Ok(RunOutcome::Written(_)) => summary.processed += 1,
                Ok(RunOutcome::Skipped(_)) => summary.skipped += 1,
                Err(e) => {
                    error!("Error processing file {}: {:#}", file_name, e);
                    summary.failed += 1;
                }
            }

            folder_pb.inc(1);
        }

        folder_pb.finish_with_message("done");

        info!(
            "Folder processing completed in {:.1}s: {} processed, {} skipped, {} errors",
            start_time.elapsed().as_secs_f64(),
            summary.processed,
            summary.skipped,
            summary.failed
        );

        Ok(summary)
    }
}
