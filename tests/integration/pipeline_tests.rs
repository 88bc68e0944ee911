/*!
 * Integration tests for the probe -> subtitles -> positions pipeline
 */

use anyhow::Result;
use chrono::{DateTime, Duration};

use dji_telemetry::app_controller::process_video;
use dji_telemetry::errors::{AppError, FormatError, ToolError};
use crate::common;
use crate::common::mock_toolkit::MockToolkit;

#[test]
fn test_process_video_withDjiTrack_shouldAlignPositionsWithCues() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "DJI_0001.MP4", "")?;
    let toolkit = MockToolkit::new(
        common::probe_json("4.000", common::CREATION_TIME, Some("+22.5431+114.0579/")),
        common::sample_srt(),
    );

    let telemetry = process_video(&toolkit, &video)?;

    let creation_time = DateTime::parse_from_rfc3339(common::CREATION_TIME)?;
    assert_eq!(telemetry.source, video);
    assert_eq!(telemetry.metadata.creation_time, creation_time);
    assert_eq!(telemetry.metadata.duration, 4.0);
    assert_eq!(telemetry.positions.len(), 4);

    let first = &telemetry.positions[0];
    assert_eq!(first.time, creation_time);
    assert_eq!(first.timestamp, "00:00:00");
    assert_eq!(first.longitude, Some(114.0579));
    assert_eq!(first.latitude, Some(22.5431));

    let second = &telemetry.positions[1];
    assert_eq!(second.distance, Some(12.3));
    assert_eq!(second.rel_elevation, Some(5.1));
    assert_eq!(second.horizontal_velocity, Some(3.2));
    assert_eq!(second.vertical_velocity, Some(1.4));

    // Blank frame still produces a position at its own offset
    let blank = &telemetry.positions[2];
    assert!(!blank.has_telemetry());
    assert_eq!(blank.timestamp, "00:00:02");
    assert_eq!(blank.time, creation_time + Duration::seconds(2));

    let last = &telemetry.positions[3];
    assert_eq!(last.timestamp, "0:00:03.500000");
    assert_eq!(last.vertical_velocity, Some(-0.5));

    for pair in telemetry.positions.windows(2) {
        assert!(pair[0].time <= pair[1].time);
    }

    Ok(())
}

#[test]
fn test_process_video_withBadMetadata_shouldFailBeforeExtractingSubtitles() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "DJI_0001.MP4", "")?;
    let toolkit = MockToolkit::new(serde_json::json!({ "format": {} }), common::sample_srt());

    let result = process_video(&toolkit, &video);

    assert!(matches!(result, Err(AppError::Format(FormatError::MissingField("format.duration")))));
    assert_eq!(toolkit.probe_calls.get(), 1);
    assert_eq!(toolkit.subtitle_calls.get(), 0);

    Ok(())
}

#[test]
fn test_process_video_withFailingSubtitleExtraction_shouldPropagateToolError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "DJI_0001.MP4", "")?;
    let toolkit = MockToolkit::new(
        common::probe_json("4.000", common::CREATION_TIME, None),
        common::sample_srt(),
    )
    .failing_subtitles();

    let result = process_video(&toolkit, &video);

    assert!(matches!(result, Err(AppError::Tool(ToolError::Failed { .. }))));
    assert_eq!(toolkit.subtitle_calls.get(), 1);

    Ok(())
}

#[test]
fn test_process_video_withFailingProbe_shouldPropagateToolError() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "DJI_0001.MP4", "")?;
    let toolkit = MockToolkit::new(serde_json::json!({}), String::new()).failing_probe();

    let result = process_video(&toolkit, &video);

    match result {
        Err(AppError::Tool(ToolError::Failed { tool, .. })) => assert_eq!(tool, "ffprobe"),
        other => panic!("unexpected result: {:?}", other),
    }

    Ok(())
}

#[test]
fn test_process_video_withMissingFile_shouldFailWithoutCallingTools() {
    let toolkit = MockToolkit::new(serde_json::json!({}), String::new());

    let result = process_video(&toolkit, std::path::Path::new("no/such/DJI_0001.MP4"));

    assert!(matches!(result, Err(AppError::File(_))));
    assert_eq!(toolkit.probe_calls.get(), 0);
}

#[test]
fn test_process_video_withoutSubtitles_shouldReturnNoPositions() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let video = common::create_test_file(temp_dir.path(), "DJI_0001.MP4", "")?;
    let toolkit = MockToolkit::new(
        common::probe_json("4.000", common::CREATION_TIME, None),
        String::new(),
    );

    let telemetry = process_video(&toolkit, &video)?;

    assert!(telemetry.positions.is_empty());
    assert_eq!(telemetry.metadata.location, None);

    Ok(())
}
