/*!
 * Batching and line flattening.
 *
 * Entries are cut into contiguous fixed-size batches. Each batch is then
 * flattened into one list of lines numbered 1..N, which is what the
 * provider sees. The per-entry line counts recorded here are all that is
 * needed to put the rewritten lines back where they came from.
 */

use std::iter::FusedIterator;
use std::slice::Chunks;

use crate::subtitle_processor::SubtitleEntry;

/// Lazy, restartable sequence of contiguous batches
///
/// Cloning the iterator restarts nothing on the underlying data; it simply
/// yields the same batches again.
#[derive(Debug, Clone)]
pub struct Batches<'a> {
    chunks: Chunks<'a, SubtitleEntry>,
}

impl<'a> Iterator for Batches<'a> {
    type Item = &'a [SubtitleEntry];

    fn next(&mut self) -> Option<Self::Item> {
        self.chunks.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.chunks.size_hint()
    }
}

impl ExactSizeIterator for Batches<'_> {}
impl FusedIterator for Batches<'_> {}

/// Partition `entries` into batches of at most `batch_size` entries
///
/// Every batch is full except possibly the last. Empty input yields no
/// batches. A zero size is treated as one; configuration validation
/// rejects it before a run starts.
pub fn batches(entries: &[SubtitleEntry], batch_size: usize) -> Batches<'_> {
    Batches {
        chunks: entries.chunks(batch_size.max(1)),
    }
}

/// One flattened line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineRecord {
    /// 1-based position inside the batch
    pub position: usize,
    /// Original trimmed text
    pub text: String,
}

/// A batch flattened into numbered lines
#[derive(Debug, Clone, Default)]
pub struct FlattenedBatch {
    records: Vec<LineRecord>,
    line_counts: Vec<usize>,
}

impl FlattenedBatch {
    /// Flatten the entries of a batch, preserving entry and line order
    pub fn from_entries(batch: &[SubtitleEntry]) -> Self {
        let mut records = Vec::new();
        let mut line_counts = Vec::with_capacity(batch.len());

        for entry in batch {
            let lines = entry.lines();
            line_counts.push(lines.len());
            for line in lines {
                records.push(LineRecord {
                    position: records.len() + 1,
                    text: line.to_string(),
                });
            }
        }

        Self { records, line_counts }
    }

    /// Number of numbered lines
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[LineRecord] {
        &self.records
    }

    /// Lines contributed by each entry, in entry order
    pub fn line_counts(&self) -> &[usize] {
        &self.line_counts
    }

    /// The `<n>. <line>` block sent to the provider
    pub fn numbered_block(&self) -> String {
        self.records
            .iter()
            .map(|record| format!("{}. {}", record.position, record.text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
