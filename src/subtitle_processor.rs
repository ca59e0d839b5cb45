use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use regex::Regex;
use once_cell::sync::Lazy;
use log::{debug, warn};

use crate::errors::{LoadError, WriteError};

// @module: SRT parsing, composition and sentinel-aware writing

// @const: SRT timing line, optional proprietary text after the end timestamp
static TIMING_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})\s*-->\s*(\d+):(\d{1,2}):(\d{1,2})[,.](\d{1,3})(?:\s+(.*?))?\s*$",
    )
    .unwrap()
});

// @struct: Single subtitle entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubtitleEntry {
    // @field: Original index, not necessarily contiguous
    pub index: usize,

    // @field: Start time in ms
    pub start_time_ms: u64,

    // @field: End time in ms
    pub end_time_ms: u64,

    // @field: Text lines joined by '\n'
    pub content: String,

    // @field: Opaque text after the timing arrow, written back untouched
    pub proprietary: String,
}

impl SubtitleEntry {
    /// Creates a new subtitle entry without proprietary metadata
    pub fn new(index: usize, start_time_ms: u64, end_time_ms: u64, content: impl Into<String>) -> Self {
        SubtitleEntry {
            index,
            start_time_ms,
            end_time_ms,
            content: content.into(),
            proprietary: String::new(),
        }
    }

    /// Attach proprietary timing-line metadata
    pub fn with_proprietary(mut self, proprietary: impl Into<String>) -> Self {
        self.proprietary = proprietary.into();
        self
    }

    /// Same index, timing and metadata with new content
    pub fn with_content(&self, content: impl Into<String>) -> Self {
        SubtitleEntry {
            content: content.into(),
            ..self.clone()
        }
    }

    /// Content split into trimmed lines; empty content is a single empty line
    pub fn lines(&self) -> Vec<&str> {
        self.content.trim().split('\n').map(str::trim).collect()
    }

    /// Number of lines this entry contributes to a flattened batch
    pub fn line_count(&self) -> usize {
        self.content.trim().split('\n').count()
    }

    /// Parse an SRT timestamp to milliseconds
    pub fn parse_timestamp(timestamp: &str) -> Result<u64, String> {
        let parts: Vec<&str> = timestamp.trim().split(&[':', ',', '.'][..]).collect();

        if parts.len() != 4 {
            return Err(format!("Invalid timestamp format: {}", timestamp));
        }

        let hours: u64 = parts[0].parse().map_err(|_| format!("Invalid hours in {}", timestamp))?;
        let minutes: u64 = parts[1].parse().map_err(|_| format!("Invalid minutes in {}", timestamp))?;
        let seconds: u64 = parts[2].parse().map_err(|_| format!("Invalid seconds in {}", timestamp))?;
        let millis = Self::parse_millis(parts[3])
            .ok_or_else(|| format!("Invalid milliseconds in {}", timestamp))?;

        if minutes >= 60 || seconds >= 60 {
            return Err(format!("Invalid time components in timestamp: {}", timestamp));
        }

        hours
            .checked_mul(3_600_000)
            .and_then(|ms| ms.checked_add(minutes * 60_000 + seconds * 1_000 + millis))
            .ok_or_else(|| format!("Timestamp out of range: {}", timestamp))
    }

    // "5" is half a second, "05" fifty milliseconds
    fn parse_millis(raw: &str) -> Option<u64> {
        if raw.is_empty() || raw.len() > 3 || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let padded = format!("{:0<3}", raw);
        padded.parse().ok()
    }

    /// Convert start time to formatted SRT timestamp
    pub fn format_start_time(&self) -> String {
        Self::format_timestamp(self.start_time_ms)
    }

    /// Convert end time to formatted SRT timestamp
    pub fn format_end_time(&self) -> String {
        Self::format_timestamp(self.end_time_ms)
    }

    /// Format a timestamp in milliseconds to SRT format (HH:MM:SS,mmm)
    pub fn format_timestamp(ms: u64) -> String {
        let hours = ms / 3_600_000;
        let minutes = (ms % 3_600_000) / 60_000;
        let seconds = (ms % 60_000) / 1_000;
        let millis = ms % 1_000;

        format!("{:02}:{:02}:{:02},{:03}", hours, minutes, seconds, millis)
    }
}

impl fmt::Display for SubtitleEntry {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "{}", self.index)?;
        if self.proprietary.is_empty() {
            writeln!(f, "{} --> {}", self.format_start_time(), self.format_end_time())?;
        } else {
            writeln!(
                f,
                "{} --> {} {}",
                self.format_start_time(),
                self.format_end_time(),
                self.proprietary
            )?;
        }
        // A blank line inside the body would end the block early
        let body: Vec<&str> = self
            .content
            .split('\n')
            .filter(|line| !line.trim().is_empty())
            .collect();
        writeln!(f, "{}", body.join("\n"))?;
        writeln!(f)
    }
}

/// Collection of subtitle entries with the file they came from
#[derive(Debug)]
pub struct SubtitleCollection {
    /// Source filename
    pub source_file: PathBuf,

    /// List of subtitle entries
    pub entries: Vec<SubtitleEntry>,
}

impl SubtitleCollection {
    /// Read and parse an SRT file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| LoadError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let entries = Self::parse_srt_string(&content)?;
        debug!("Loaded {} subtitle entries from {}", entries.len(), path.display());

        Ok(SubtitleCollection {
            source_file: path.to_path_buf(),
            entries,
        })
    }

    /// Parse SRT format string into subtitle entries, in file order
    pub fn parse_srt_string(content: &str) -> Result<Vec<SubtitleEntry>, LoadError> {
        let content = content.strip_prefix('\u{feff}').unwrap_or(content);
        let mut entries = Vec::new();
        let mut lines = content.lines().enumerate().peekable();

        loop {
            // Skip the blank lines separating blocks
            while lines.peek().is_some_and(|(_, line)| line.trim().is_empty()) {
                lines.next();
            }

            let Some((index_line_no, index_line)) = lines.next() else {
                break;
            };

            let index: usize = index_line.trim().parse().map_err(|_| LoadError::Parse {
                line: index_line_no + 1,
                reason: format!("expected subtitle index, found '{}'", index_line.trim()),
            })?;

            let (timing_line_no, timing_line) = lines.next().ok_or_else(|| LoadError::Parse {
                line: index_line_no + 2,
                reason: format!("subtitle {} has no timing line", index),
            })?;

            let (start_time_ms, end_time_ms, proprietary) =
                Self::parse_timing_line(timing_line).map_err(|reason| LoadError::Parse {
                    line: timing_line_no + 1,
                    reason,
                })?;

            let mut body = Vec::new();
            while let Some((_, line)) = lines.peek() {
                if line.trim().is_empty() {
                    break;
                }
                body.push(*line);
                lines.next();
            }

            if end_time_ms < start_time_ms {
                warn!("Subtitle {} ends before it starts", index);
            }

            entries.push(
                SubtitleEntry::new(index, start_time_ms, end_time_ms, body.join("\n"))
                    .with_proprietary(proprietary),
            );
        }

        Ok(entries)
    }

    fn parse_timing_line(line: &str) -> Result<(u64, u64, String), String> {
        let caps = TIMING_REGEX
            .captures(line.trim())
            .ok_or_else(|| format!("expected timing line, found '{}'", line.trim()))?;

        let start = format!("{}:{}:{},{}", &caps[1], &caps[2], &caps[3], &caps[4]);
        let end = format!("{}:{}:{},{}", &caps[5], &caps[6], &caps[7], &caps[8]);
        let proprietary = caps.get(9).map(|m| m.as_str().to_string()).unwrap_or_default();

        Ok((
            SubtitleEntry::parse_timestamp(&start)?,
            SubtitleEntry::parse_timestamp(&end)?,
            proprietary,
        ))
    }

    /// Compose entries back into SRT text
    ///
    /// With `reindex` the entries are sorted by timing, blank entries are
    /// dropped and the survivors renumbered from 1. Without it the original
    /// order and indices are written unchanged.
    pub fn compose(entries: &[SubtitleEntry], reindex: bool) -> String {
        if !reindex {
            return entries.iter().map(|entry| entry.to_string()).collect();
        }

        let mut sorted: Vec<&SubtitleEntry> = entries
            .iter()
            .filter(|entry| !entry.content.trim().is_empty())
            .collect();
        sorted.sort_by_key(|entry| (entry.start_time_ms, entry.end_time_ms, entry.index));

        sorted
            .into_iter()
            .enumerate()
            .map(|(i, entry)| SubtitleEntry { index: i + 1, ..entry.clone() }.to_string())
            .collect()
    }

    /// Write entries in two phases: the full composition goes to
    /// `<path>.raw`, then every line not containing `sentinel` is copied to
    /// `path` and the raw artifact is removed.
    ///
    /// Returns the number of lines dropped by the filter.
    pub fn write_without_sentinel<P: AsRef<Path>>(
        entries: &[SubtitleEntry],
        path: P,
        sentinel: &str,
        reindex: bool,
    ) -> Result<usize, WriteError> {
        let path = path.as_ref();
        let raw_path = raw_artifact_path(path);

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| WriteError::Create {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        fs::write(&raw_path, Self::compose(entries, reindex)).map_err(|source| WriteError::Create {
            path: raw_path.clone(),
            source,
        })?;

        let raw = fs::read_to_string(&raw_path).map_err(|source| WriteError::Read {
            path: raw_path.clone(),
            source,
        })?;

        let (cleaned, dropped) = strip_sentinel_lines(&raw, sentinel);

        fs::write(path, cleaned).map_err(|source| WriteError::Create {
            path: path.to_path_buf(),
            source,
        })?;

        fs::remove_file(&raw_path).map_err(|source| WriteError::Remove {
            path: raw_path.clone(),
            source,
        })?;

        if dropped > 0 {
            debug!("Dropped {} missing line(s) from {}", dropped, path.display());
        }

        Ok(dropped)
    }
}

/// Path of the intermediate artifact for an output path
pub fn raw_artifact_path(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(".raw");
    PathBuf::from(raw)
}

/// Remove every line containing `sentinel`, keeping all other lines
/// (terminators included) byte-for-byte. Returns the text and the number of
/// dropped lines.
pub fn strip_sentinel_lines(text: &str, sentinel: &str) -> (String, usize) {
    let mut dropped = 0;
    let kept: String = text
        .split_inclusive('\n')
        .filter(|line| {
            let keep = !line.contains(sentinel);
            if !keep {
                dropped += 1;
            }
            keep
        })
        .collect();
    (kept, dropped)
}
