use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;

use crate::errors::FormatError;

// @module: Container metadata normalization

/// Normalized container-level attributes of a video
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Metadata {
    /// Recording start, with its UTC offset
    pub creation_time: DateTime<FixedOffset>,

    /// Container duration in seconds
    pub duration: f64,

    /// Free-form location tag written by the camera, if any
    pub location: Option<String>,
}

impl Metadata {
    /// Build a `Metadata` from the JSON document printed by `ffprobe -show_format`.
    ///
    /// Only `format.duration`, `format.tags.creation_time` and
    /// `format.tags.location` are read; everything else is ignored.
    pub fn from_probe(probe: &Value) -> Result<Self, FormatError> {
        let format = probe.get("format");
        let tags = format.and_then(|f| f.get("tags"));

        let duration = format
            .and_then(|f| f.get("duration"))
            .ok_or(FormatError::MissingField("format.duration"))
            .and_then(parse_duration)?;

        let creation_time = tags
            .and_then(|t| t.get("creation_time"))
            .and_then(Value::as_str)
            .ok_or(FormatError::MissingField("format.tags.creation_time"))
            .and_then(parse_creation_time)?;

        let location = tags
            .and_then(|t| t.get("location"))
            .and_then(Value::as_str)
            .map(str::to_string);

        Ok(Metadata {
            creation_time,
            duration,
            location,
        })
    }
}

/// Normalize raw probe output into a [`Metadata`] record
pub fn extract_metadata(probe: &Value) -> Result<Metadata, FormatError> {
    Metadata::from_probe(probe)
}

// ffprobe reports the duration as a string, but accept a bare number as well
fn parse_duration(value: &Value) -> Result<f64, FormatError> {
    let duration = match value {
        Value::String(s) => s
            .trim()
            .parse::<f64>()
            .map_err(|_| FormatError::InvalidDuration(s.clone()))?,
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| FormatError::InvalidDuration(n.to_string()))?,
        other => return Err(FormatError::InvalidDuration(other.to_string())),
    };

    if !duration.is_finite() || duration < 0.0 {
        return Err(FormatError::InvalidDuration(value.to_string()));
    }

    Ok(duration)
}

/// Parse an ISO-8601 timestamp.
///
/// Values carrying an offset (`Z`, `+02:00`, `+0200`) keep it. Values without
/// one are taken to be UTC, and a bare date means midnight.
pub fn parse_creation_time(raw: &str) -> Result<DateTime<FixedOffset>, FormatError> {
    let s = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt);
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f%z", "%Y-%m-%d %H:%M:%S%.f%z"] {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Ok(dt);
        }
    }

    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc().fixed_offset());
        }
    }

    if let Some(midnight) = NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc().fixed_offset());
    }

    Err(FormatError::InvalidCreationTime(raw.to_string()))
}
