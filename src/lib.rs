/*!
 * # dji-telemetry
 *
 * A Rust library for reading the flight telemetry DJI drones embed as
 * subtitles in their video files.
 *
 * ## Features
 *
 * - Normalize ffprobe container metadata (creation time, duration, location)
 * - Extract the subtitle track through ffmpeg into a transient SRT file
 * - Parse GPS, distance, elevation and velocity from each subtitle cue
 * - Anchor every sample to absolute time using the video creation time
 * - Write the result as JSON or JSON lines, for a single video or a folder
 *
 * ## Architecture
 *
 * The library is organized in these main modules:
 * - `metadata`: container metadata normalization
 * - `telemetry`: telemetry line parsing and time mapping
 * - `subtitle_processor`: SRT parsing
 * - `ffmpeg`: the `MediaToolkit` seam and its ffprobe/ffmpeg implementation
 * - `app_controller`: end-to-end extraction and output writing
 * - `app_config`: configuration management
 * - `file_utils`: file system operations
 * - `errors`: custom error types for the application
 *
 * ## License
 *
 * This project is licensed under the MIT License
 */

// Global lints configuration
#![allow(clippy::uninlined_format_args)]
#![cfg_attr(test, allow(non_snake_case))]

// Public modules
pub mod app_config;
pub mod app_controller;
pub mod errors;
pub mod ffmpeg;
pub mod file_utils;
pub mod metadata;
pub mod subtitle_processor;
pub mod telemetry;

// Re-export main types for easier usage
pub use app_config::Config;
pub use app_controller::{process_video, Controller, VideoTelemetry};
pub use errors::{AppError, FormatError, ToolError};
pub use ffmpeg::{FfmpegToolkit, MediaToolkit};
pub use metadata::{extract_metadata, Metadata};
pub use subtitle_processor::SubtitleEntry;
pub use telemetry::{extract_telemetry, Position};
