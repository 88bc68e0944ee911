use std::fs;
use regex::Regex;
use once_cell::sync::Lazy;
use anyhow::{Result, Context, anyhow};
use std::path::Path;
use log::{warn, debug};

// @module: SRT subtitle parsing

// @const: SRT timing line, start and end captured whole
static TIMESTAMP_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\d{2,}:\d{2}:\d{2}[,.]\d{3}) --> (\d{2,}:\d{2}:\d{2}[,.]\d{3})").unwrap()
});

// @struct: Single subtitle cue
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleEntry {
    // @field: Sequence number
    pub seq_num: usize,

    // @field: Start offset in ms
    pub start_time_ms: u64,

    // @field: End offset in ms
    pub end_time_ms: u64,

    // @field: Cue text, lines joined with '\n'
    pub text: String,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry
    pub fn new(seq_num: usize, start_time_ms: u64, end_time_ms: u64, text: String) -> Self {
        SubtitleEntry {
            seq_num,
            start_time_ms,
            end_time_ms,
            text,
        }
    }

    /// Parse an SRT timestamp (`HH:MM:SS,mmm`) to milliseconds.
    ///
    /// Fails when a component is out of range or the total does not fit in
    /// a signed 64-bit millisecond count.
    pub fn parse_timestamp(timestamp: &str) -> Result<u64> {
        let parts: Vec<&str> = timestamp.split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(anyhow!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().context("Failed to parse hours")?;
        let minutes: u64 = parts[1].parse().context("Failed to parse minutes")?;
        let seconds: u64 = parts[2].parse().context("Failed to parse seconds")?;
        let millis: u64 = parts[3].parse().context("Failed to parse milliseconds")?;

        if minutes >= 60 || seconds >= 60 || millis >= 1000 {
            return Err(anyhow!("Invalid time components in timestamp: {}", timestamp));
        }

        hours
            .checked_mul(3_600_000)
            .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1_000 + millis))
            .filter(|ms| i64::try_from(*ms).is_ok())
            .ok_or_else(|| anyhow!("Timestamp out of range: {}", timestamp))
    }
}

/// Parse SRT file content to subtitle entries
pub fn parse_srt_file(path: &Path) -> Result<Vec<SubtitleEntry>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read subtitle file: {}", path.display()))?;
    parse_srt_string(&content)
}

/// Parse SRT format string into subtitle entries.
///
/// Cues keep the order they have in the file, and a cue with no text lines
/// is kept with empty text so later stages stay aligned with the source.
/// A cue whose timing line cannot be read is skipped with a warning.
/// Content without any cue yields an empty list.
pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>> {
    let mut entries = Vec::new();
    let content = content.trim_start_matches('\u{feff}');

    // State variables for parsing
    let mut current_seq_num: Option<usize> = None;
    let mut current_times: Option<(u64, u64)> = None;
    let mut current_text = String::new();
    let mut skipping = false;
    let mut line_count = 0;

    let mut finish_entry = |seq_num: usize, (start_ms, end_ms): (u64, u64), text: &str| {
        if end_ms < start_ms {
            warn!("Subtitle entry {} ends before it starts", seq_num);
        }
        entries.push(SubtitleEntry::new(seq_num, start_ms, end_ms, text.to_string()));
    };

    for line in content.lines() {
        line_count += 1;
        let trimmed = line.trim();

        // A blank line closes the current cue once its timing is known
        if trimmed.is_empty() {
            if let (Some(seq_num), Some(times)) = (current_seq_num, current_times) {
                finish_entry(seq_num, times, &current_text);
            }
            if skipping || current_times.is_some() {
                current_seq_num = None;
                current_times = None;
                current_text.clear();
                skipping = false;
            }
            continue;
        }

        if skipping {
            continue;
        }

        // Sequence number, only when starting a new cue
        if current_seq_num.is_none() {
            if let Ok(num) = trimmed.parse::<usize>() {
                current_seq_num = Some(num);
                continue;
            }
        }

        if current_seq_num.is_some() && current_times.is_none() {
            if let Some(caps) = TIMESTAMP_REGEX.captures(trimmed) {
                match (
                    SubtitleEntry::parse_timestamp(&caps[1]),
                    SubtitleEntry::parse_timestamp(&caps[2]),
                ) {
                    (Ok(start_ms), Ok(end_ms)) => current_times = Some((start_ms, end_ms)),
                    (Err(e), _) | (_, Err(e)) => {
                        warn!("Skipping subtitle entry at line {}: {:#}", line_count, e);
                        skipping = true;
                    }
                }
                continue;
            }
        }

        if current_seq_num.is_some() && current_times.is_some() {
            if !current_text.is_empty() {
                current_text.push('\n');
            }
            current_text.push_str(trimmed);
        } else {
            warn!("Unexpected text at line {} before sequence number or timestamp: {}", line_count, trimmed);
        }
    }

    // Add the last entry if there is one
    if let (Some(seq_num), Some(times)) = (current_seq_num, current_times) {
        finish_entry(seq_num, times, &current_text);
    }

    if entries.is_empty() {
        warn!("No subtitle entries found in content");
    } else {
        debug!("Parsed {} subtitle entries", entries.len());
    }

    Ok(entries)
}
