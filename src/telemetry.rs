use chrono::{DateTime, Duration, FixedOffset};
use log::{debug, warn};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Serialize, Serializer};

use crate::subtitle_processor::SubtitleEntry;

// @module: Telemetry extraction from DJI subtitle cues

// @const: DJI telemetry line, e.g.
// "GPS (114.0579, 22.5431, 19), D 24.5m, H 10.2m, H.S 2.3m/s, V.S 0.0m/s"
static TELEMETRY_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"GPS \(([\d.-]+), ([\d.-]+), [\d.-]+\), D ([\d.-]+)m, H ([\d.-]+)m, H.S ([\d.-]+)m/s, V.S ([\d.-]+)",
    )
    .unwrap()
});

/// One telemetry sample, aligned with one subtitle cue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Position {
    /// Absolute time of the sample
    #[serde(serialize_with = "serialize_isoformat")]
    pub time: DateTime<FixedOffset>,

    /// Elapsed time since the start of the video
    pub timestamp: String,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    /// Height above the takeoff point, in meters
    pub rel_elevation: Option<f64>,

    /// Horizontal distance from the home point, in meters
    pub distance: Option<f64>,

    /// Meters per second
    pub horizontal_velocity: Option<f64>,
    pub vertical_velocity: Option<f64>,
}

/// The six numeric fields of a telemetry line, in capture order
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TelemetryFields {
    pub longitude: Option<f64>,
    pub latitude: Option<f64>,
    pub distance: Option<f64>,
    pub rel_elevation: Option<f64>,
    pub horizontal_velocity: Option<f64>,
    pub vertical_velocity: Option<f64>,
}

impl TelemetryFields {
    /// Search `text` for a telemetry line.
    ///
    /// The first GPS coordinate is taken as the longitude and the second as
    /// the latitude. A text without a telemetry line yields all fields empty,
    /// and a capture that is not a valid number only empties that one field.
    pub fn parse(text: &str) -> Self {
        match TELEMETRY_REGEX.captures(text) {
            Some(caps) => TelemetryFields {
                longitude: capture_f64(&caps, 1),
                latitude: capture_f64(&caps, 2),
                distance: capture_f64(&caps, 3),
                rel_elevation: capture_f64(&caps, 4),
                horizontal_velocity: capture_f64(&caps, 5),
                vertical_velocity: capture_f64(&caps, 6),
            },
            None => TelemetryFields::default(),
        }
    }

    /// True when no field could be read
    pub fn is_empty(&self) -> bool {
        *self == TelemetryFields::default()
    }
}

fn capture_f64(caps: &Captures, idx: usize) -> Option<f64> {
    caps.get(idx)
        .map(|m| m.as_str())
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
}

impl Position {
    /// Build the position for a single cue, using `creation_time` as the epoch.
    ///
    /// Returns `None` when the cue offset puts the sample outside the range
    /// of representable dates.
    pub fn from_subtitle(creation_time: DateTime<FixedOffset>, entry: &SubtitleEntry) -> Option<Self> {
        let time = i64::try_from(entry.start_time_ms)
            .ok()
            .and_then(Duration::try_milliseconds)
            .and_then(|offset| creation_time.checked_add_signed(offset))?;
        let fields = TelemetryFields::parse(&entry.text);

        Some(Position {
            time,
            timestamp: format_elapsed(entry.start_time_ms),
            latitude: fields.latitude,
            longitude: fields.longitude,
            rel_elevation: fields.rel_elevation,
            distance: fields.distance,
            horizontal_velocity: fields.horizontal_velocity,
            vertical_velocity: fields.vertical_velocity,
        })
    }

    /// `time` as an ISO-8601 string
    pub fn time_isoformat(&self) -> String {
        isoformat(&self.time)
    }

    /// True when at least one telemetry field was read
    pub fn has_telemetry(&self) -> bool {
        self.latitude.is_some()
            || self.longitude.is_some()
            || self.rel_elevation.is_some()
            || self.distance.is_some()
            || self.horizontal_velocity.is_some()
            || self.vertical_velocity.is_some()
    }
}

/// Map every cue to a [`Position`], keeping the cue order.
///
/// A cue whose offset cannot be added to `creation_time` is dropped with a warning.
pub fn extract_telemetry(creation_time: DateTime<FixedOffset>, cues: &[SubtitleEntry]) -> Vec<Position> {
    let positions: Vec<Position> = cues
        .iter()
        .filter_map(|cue| {
            let position = Position::from_subtitle(creation_time, cue);
            if position.is_none() {
                warn!(
                    "Dropping subtitle entry {}: offset {}ms is out of range",
                    cue.seq_num, cue.start_time_ms
                );
            }
            position
        })
        .collect();

    let without_telemetry = positions.iter().filter(|p| !p.has_telemetry()).count();
    debug!(
        "Extracted {} positions ({} cues without telemetry)",
        positions.len(),
        without_telemetry
    );

    positions
}

/// Format an elapsed offset as `H:MM:SS[.ffffff]`, left-padded with zeros to 8 characters.
///
/// Whole seconds render as `00:00:05`; a fractional part is always six digits
/// wide, e.g. `0:00:01.500000`.
pub fn format_elapsed(offset_ms: u64) -> String {
    let hours = offset_ms / 3_600_000;
    let minutes = (offset_ms % 3_600_000) / 60_000;
    let seconds = (offset_ms % 60_000) / 1_000;
    let millis = offset_ms % 1_000;

    let mut elapsed = format!("{}:{:02}:{:02}", hours, minutes, seconds);
    if millis > 0 {
        elapsed.push_str(&format!(".{:06}", millis * 1_000));
    }

    format!("{:0>8}", elapsed)
}

/// ISO-8601 with a `+HH:MM` offset; microseconds are printed only when non-zero
pub fn isoformat(dt: &DateTime<FixedOffset>) -> String {
    if dt.timestamp_subsec_micros() == 0 {
        dt.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
    } else {
        dt.format("%Y-%m-%dT%H:%M:%S%.6f%:z").to_string()
    }
}

fn serialize_isoformat<S: Serializer>(dt: &DateTime<FixedOffset>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&isoformat(dt))
}
