/*!
 * Tests for application configuration functionality
 */

use anyhow::Result;
use dji_telemetry::app_config::{Config, LogLevel, OutputFormat};
use crate::common;

/// Test default configuration values
#[test]
fn test_default_config_withNoParameters_shouldHaveCorrectDefaults() {
    let config = Config::default();

    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.ffmpeg.ffmpeg_path, "ffmpeg");
    assert_eq!(config.ffmpeg.ffprobe_path, "ffprobe");
    assert_eq!(config.ffmpeg.subtitle_stream, 0);
    assert_eq!(config.output.format, OutputFormat::Json);
    assert!(config.output.pretty);
    assert_eq!(config.output.suffix, "telemetry");
    assert!(config.validate().is_ok());
}

/// Test configuration validation
#[test]
fn test_config_validation_withEmptyValues_shouldFail() {
    let mut config = Config::default();
    config.ffmpeg.ffmpeg_path = "  ".to_string();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.ffmpeg.ffprobe_path = String::new();
    assert!(config.validate().is_err());

    let mut config = Config::default();
    config.output.suffix = String::new();
    assert!(config.validate().is_err());
}

#[test]
fn test_config_deserialization_withPartialJson_shouldFillDefaults() -> Result<()> {
    let json = r#"{ "log_level": "debug", "output": { "format": "jsonl" } }"#;

    let config: Config = serde_json::from_str(json)?;

    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.output.format, OutputFormat::Jsonl);
    assert!(config.output.pretty);
    assert_eq!(config.ffmpeg.ffprobe_path, "ffprobe");

    Ok(())
}

#[test]
fn test_config_save_and_load_shouldRoundTrip() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = temp_dir.path().join("conf.json");

    let mut config = Config::default();
    config.ffmpeg.ffmpeg_path = "/opt/ffmpeg/bin/ffmpeg".to_string();
    config.log_level = LogLevel::Trace;
    config.save(&path)?;

    let loaded = Config::from_file(&path)?;
    assert_eq!(loaded, config);

    Ok(())
}

#[test]
fn test_config_from_file_withInvalidJson_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let path = common::create_test_file(temp_dir.path(), "conf.json", "{ not json")?;

    assert!(Config::from_file(&path).is_err());
    assert!(Config::from_file(temp_dir.path().join("missing.json")).is_err());

    Ok(())
}

#[test]
fn test_output_format_fromStr_shouldParseKnownFormats() {
    assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
    assert_eq!("JSONL".parse::<OutputFormat>().unwrap(), OutputFormat::Jsonl);
    assert!("csv".parse::<OutputFormat>().is_err());
    assert_eq!(OutputFormat::Jsonl.to_string(), "jsonl");
}

#[test]
fn test_log_level_to_level_filter_shouldMapEachLevel() {
    assert_eq!(LogLevel::Error.to_level_filter(), log::LevelFilter::Error);
    assert_eq!(LogLevel::Trace.to_level_filter(), log::LevelFilter::Trace);
}
