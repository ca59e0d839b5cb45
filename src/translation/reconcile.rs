/*!
 * Mapping a numbered provider response back onto a batch.
 *
 * The response is free-form text. Only lines shaped like `<n>. <text>` are
 * kept; numbers may be missing, repeated or out of range. Alignment reads
 * positions 1..N only, so the output always has exactly one line per input
 * line, with the sentinel standing in for anything the response left out.
 */

use std::collections::BTreeMap;

use crate::errors::ReconciliationError;
use crate::subtitle_processor::SubtitleEntry;

use super::batch::FlattenedBatch;

/// Rewritten lines keyed by the number the response declared for them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponseLines {
    lines: BTreeMap<usize, String>,
}

impl ResponseLines {
    pub fn get(&self, number: usize) -> Option<&str> {
        self.lines.get(&number).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Declared numbers in ascending order
    pub fn numbers(&self) -> impl Iterator<Item = usize> + '_ {
        self.lines.keys().copied()
    }
}

/// Parse every `<n>. <text>` line of a raw response
///
/// Lines are trimmed first. A line must start with an ASCII digit and
/// contain `". "`; the part before the first `". "` must be an integer.
/// Anything else is ignored. A repeated number keeps its last text.
pub fn parse_numbered_response(raw: &str) -> ResponseLines {
    let mut lines = BTreeMap::new();

    for line in raw.trim().split('\n') {
        let line = line.trim();
        if !line.starts_with(|c: char| c.is_ascii_digit()) {
            continue;
        }
        let Some((number, text)) = line.split_once(". ") else {
            continue;
        };
        let Ok(number) = number.trim_end().parse::<usize>() else {
            continue;
        };
        lines.insert(number, text.trim().to_string());
    }

    ResponseLines { lines }
}

/// Exactly `expected` lines: position `i` holds response line `i` or the sentinel
pub fn align(response: &ResponseLines, expected: usize, sentinel: &str) -> Vec<String> {
    (1..=expected)
        .map(|position| response.get(position).unwrap_or(sentinel).to_string())
        .collect()
}

/// Cut aligned lines back into per-entry chunks and rebuild the entries
///
/// `line_counts` are the counts recorded while flattening `batch`. Index,
/// timing and proprietary metadata are copied from the originals.
pub fn resegment(
    batch: &[SubtitleEntry],
    line_counts: &[usize],
    aligned: &[String],
) -> Result<Vec<SubtitleEntry>, ReconciliationError> {
    let recorded: usize = line_counts.iter().sum();
    if recorded != aligned.len() || line_counts.len() != batch.len() {
        return Err(ReconciliationError::LineCountMismatch {
            recorded,
            aligned: aligned.len(),
        });
    }

    let mut cursor = 0;
    let rebuilt = batch
        .iter()
        .zip(line_counts)
        .map(|(entry, &count)| {
            let chunk = &aligned[cursor..cursor + count];
            cursor += count;
            entry.with_content(chunk.join("\n"))
        })
        .collect();

    Ok(rebuilt)
}

/// Full reconciliation of one raw response against its batch
pub fn reconcile(
    batch: &[SubtitleEntry],
    flattened: &FlattenedBatch,
    raw: &str,
    sentinel: &str,
) -> Result<Vec<SubtitleEntry>, ReconciliationError> {
    let response = parse_numbered_response(raw);
    if response.is_empty() && !flattened.is_empty() {
        return Err(ReconciliationError::NoNumberedLines {
            expected: flattened.len(),
        });
    }

    let aligned = align(&response, flattened.len(), sentinel);
    resegment(batch, flattened.line_counts(), &aligned)
}
