/*!
 * Integration tests for output writing through the controller
 */

use std::fs;
use anyhow::Result;
use serde_json::Value;

use dji_telemetry::app_config::{Config, OutputFormat};
use dji_telemetry::app_controller::{Controller, FolderSummary, RunOutcome};
use crate::common;
use crate::common::mock_toolkit::MockToolkit;

fn mock_toolkit() -> MockToolkit {
    MockToolkit::new(
        common::probe_json("4.000", common::CREATION_TIME, Some("+22.5431+114.0579/")),
        common::sample_srt(),
    )
}

#[test]
fn test_run_withJsonOutput_shouldWriteDocument() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "DJI_0001.MP4", "")?;
    let controller = Controller::with_toolkit(Config::default(), mock_toolkit());

    let outcome = controller.run(&video, temp_dir.path(), false)?;

    let expected = temp_dir.path().join("DJI_0001.telemetry.json");
    assert_eq!(outcome, RunOutcome::Written(expected.clone()));

    let document: Value = serde_json::from_str(&fs::read_to_string(&expected)?)?;
    assert_eq!(document["metadata"]["duration"], 4.0);
    assert_eq!(document["metadata"]["location"], "+22.5431+114.0579/");

    let positions = document["positions"].as_array().unwrap();
    assert_eq!(positions.len(), 4);
    assert_eq!(positions[0]["time"], "2023-05-01T12:00:00+00:00");
    assert_eq!(positions[0]["longitude"], 114.0579);
    assert_eq!(positions[1]["time"], "2023-05-01T12:00:01+00:00");
    assert!(positions[2]["latitude"].is_null());

    Ok(())
}

#[test]
fn test_run_withJsonlOutput_shouldWriteMetadataThenPositions() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "DJI_0001.MP4", "")?;
    let out_dir = temp_dir.path().join("out");

    let mut config = Config::default();
    config.output.format = OutputFormat::Jsonl;
    let controller = Controller::with_toolkit(config, mock_toolkit());

    controller.run(&video, &out_dir, false)?;

    let content = fs::read_to_string(out_dir.join("DJI_0001.telemetry.jsonl"))?;
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 5);

    let metadata: Value = serde_json::from_str(lines[0])?;
    assert_eq!(metadata["duration"], 4.0);

    let last: Value = serde_json::from_str(lines[4])?;
    assert_eq!(last["timestamp"], "0:00:03.500000");

    Ok(())
}

#[test]
fn test_run_withExistingOutput_shouldSkipUnlessForced() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "DJI_0001.MP4", "")?;
    let existing = common::create_test_file(temp_dir.path(), "DJI_0001.telemetry.json", "old")?;
    let controller = Controller::with_toolkit(Config::default(), mock_toolkit());

    let outcome = controller.run(&video, temp_dir.path(), false)?;
    assert_eq!(outcome, RunOutcome::Skipped(existing.clone()));
    assert_eq!(fs::read_to_string(&existing)?, "old");

    let outcome = controller.run(&video, temp_dir.path(), true)?;
    assert_eq!(outcome, RunOutcome::Written(existing.clone()));
    assert_ne!(fs::read_to_string(&existing)?, "old");

    Ok(())
}

#[test]
fn test_run_withFailingToolkit_shouldNotWriteOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "DJI_0001.MP4", "")?;
    let controller = Controller::with_toolkit(Config::default(), mock_toolkit().failing_subtitles());

    assert!(controller.run(&video, temp_dir.path(), false).is_err());
    assert!(!temp_dir.path().join("DJI_0001.telemetry.json").exists());

    Ok(())
}

#[test]
fn test_run_folder_shouldProcessEveryVideo() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let nested = temp_dir.path().join("day2");
    fs::create_dir_all(&nested)?;
    common::create_test_file(temp_dir.path(), "DJI_0001.MP4", "")?;
    common::create_test_file(&nested, "DJI_0002.MP4", "")?;
    common::create_test_file(temp_dir.path(), "readme.txt", "")?;
    common::create_test_file(temp_dir.path(), "DJI_0001.telemetry.json", "old")?;

    let controller = Controller::with_toolkit(Config::default(), mock_toolkit());

    let summary = controller.run_folder(temp_dir.path(), None, false)?;

    assert_eq!(summary, FolderSummary { processed: 1, skipped: 1, failed: 0 });
    assert!(nested.join("DJI_0002.telemetry.json").exists());

    Ok(())
}

#[test]
fn test_run_folder_withFailures_shouldCountAndContinue() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "DJI_0001.MP4", "")?;
    common::create_test_file(temp_dir.path(), "DJI_0002.MP4", "")?;
    let out_dir = temp_dir.path().join("out");

    let toolkit = mock_toolkit().failing_probe();
    let controller = Controller::with_toolkit(Config::default(), toolkit);

    let summary = controller.run_folder(temp_dir.path(), Some(&out_dir), false)?;

    assert_eq!(summary.failed, 2);
    assert_eq!(summary.processed, 0);

    Ok(())
}

#[test]
fn test_run_folder_withoutVideos_shouldFail() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "notes.txt", "")?;
    let controller = Controller::with_toolkit(Config::default(), mock_toolkit());

    assert!(controller.run_folder(temp_dir.path(), None, false).is_err());

    Ok(())
}

#[test]
fn test_probe_shouldReturnMetadataOnly() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "DJI_0001.MP4", "")?;
    let toolkit = mock_toolkit();
    let controller = Controller::with_toolkit(Config::default(), toolkit);

    let metadata = controller.probe(&video)?;

    assert_eq!(metadata.duration, 4.0);
    assert_eq!(controller.config().output.format, OutputFormat::Json);

    Ok(())
}

#[test]
fn test_with_config_withInvalidConfig_shouldFail() {
    let mut config = Config::default();
    config.output.suffix = String::new();
    assert!(Controller::with_config(config).is_err());
}
