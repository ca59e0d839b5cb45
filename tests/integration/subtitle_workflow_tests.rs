/*!
 * Integration tests for subtitle processing workflow
 */

use anyhow::Result;

use submod::file_utils::FileManager;
use submod::subtitle_processor::SubtitleCollection;
use submod::translation::batch::{batches, FlattenedBatch};
use submod::translation::reconcile::reconcile;
use crate::common;

/// Load, batch, reconcile and write without any provider in the loop
#[test]
fn test_subtitle_workflow_withFullProcess_shouldSucceed() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let content = "1\n00:00:01,000 --> 00:00:02,000\nHow now?\nWhat news?\n\n\
                   2\n00:00:03,000 --> 00:00:04,000 align:start\n[GASPS]\n\n\
                   3\n00:00:05,000 --> 00:00:06,000\nAnon, anon.\n";
    let input = common::create_test_file(temp_dir.path(), "scene.srt", content)?;

    // 1. Load the subtitle file
    let collection = SubtitleCollection::load(&input)?;
    assert_eq!(collection.entries.len(), 3);

    // 2. Batch and simulate a model that forgets line 4
    let mut rewritten = Vec::new();
    for batch in batches(&collection.entries, 3) {
        let flattened = FlattenedBatch::from_entries(batch);
        let response: String = flattened
            .records()
            .iter()
            .filter(|record| record.text != "Anon, anon.")
            .map(|record| format!("{}. <{}>\n", record.position, record.text))
            .collect();
        rewritten.extend(reconcile(batch, &flattened, &response, "[MISSING LINE]")?);
    }

    // 3. Write through the two-phase writer
    let output = FileManager::generate_output_path(&input);
    let dropped = SubtitleCollection::write_without_sentinel(&rewritten, &output, "[MISSING LINE]", false)?;
    assert_eq!(dropped, 1);

    // 4. Load the result and compare the structure
    let result = SubtitleCollection::load(&output)?;
    assert_eq!(result.entries.len(), 3);
    assert_eq!(result.entries[0].content, "<How now?>\n<What news?>");
    assert_eq!(result.entries[1].proprietary, "align:start");
    assert_eq!(result.entries[1].content, "<[GASPS]>");
    assert_eq!(result.entries[2].content, "");
    assert_eq!(result.entries[2].start_time_ms, 5000);
    Ok(())
}
