/*!
 * Full pipeline runs against a scripted provider
 */

use anyhow::Result;
use std::fs;
use std::sync::Arc;

use submod::app_config::Config;
use submod::errors::{AppError, ProviderError};
use submod::providers::mock::MockProvider;
use submod::subtitle_processor::{raw_artifact_path, SubtitleCollection};
use submod::Controller;
use crate::common;

fn controller(config: Config, provider: &MockProvider) -> Controller {
    Controller::with_provider(config, Arc::new(provider.clone()))
}

/// Every line comes back rewritten
#[tokio::test]
async fn test_run_withCompleteResponses_shouldRewriteEveryEntry() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;
    let provider = MockProvider::echo();

    let summary = controller(common::test_config(&temp_dir.path().join("logs")), &provider)
        .run(&input, None)
        .await?;

    let expected_output = temp_dir.path().join("episode.modern.srt");
    assert_eq!(summary.output_path.as_deref(), Some(expected_output.as_path()));
    assert_eq!(summary.total_batches, 1);
    assert_eq!(summary.rewritten_batches, 1);
    assert_eq!(summary.rewritten_entries, 3);
    assert_eq!(summary.dropped_lines, 0);
    assert_eq!(provider.call_count(), 1);

    let original = SubtitleCollection::load(&input)?.entries;
    let rewritten = SubtitleCollection::load(&expected_output)?.entries;
    assert_eq!(rewritten.len(), 3);
    for (before, after) in original.iter().zip(&rewritten) {
        assert_eq!(after.index, before.index);
        assert_eq!(after.start_time_ms, before.start_time_ms);
        assert_eq!(after.end_time_ms, before.end_time_ms);
        assert_eq!(after.content, format!("[MODERN] {}", before.content));
    }
    assert!(!raw_artifact_path(&expected_output).exists());
    Ok(())
}

/// A line missing from the response is removed from the output
#[tokio::test]
async fn test_run_withMissingLine_shouldDropOnlyThatLine() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;
    let output = temp_dir.path().join("out").join("result.srt");
    let provider = MockProvider::echo().then_reply("1. Where are you going?\n3. [DOOR CREAKS]");

    let summary = controller(common::test_config(&temp_dir.path().join("logs")), &provider)
        .run(&input, Some(&output))
        .await?;

    assert_eq!(summary.dropped_lines, 1);
    let written = fs::read_to_string(&output)?;
    assert!(!written.contains("[MISSING LINE]"));
    assert!(written.contains("Where are you going?"));
    assert!(written.contains("[DOOR CREAKS]"));
    assert!(!written.contains("I know not"));
    // Entry 2 keeps its index and timing with an empty body
    assert!(written.contains("2\n00:00:05,000 --> 00:00:09,000\n\n"));
    Ok(())
}

/// A failing service call drops its batch and the run goes on
#[tokio::test]
async fn test_run_withServiceErrorOnFirstBatch_shouldKeepLaterBatches() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "long.srt", &common::generate_srt(5))?;
    let mut config = common::test_config(&temp_dir.path().join("logs"));
    config.subtitles.batch_size = 2;
    let provider = MockProvider::echo().then_fail(ProviderError::ConnectionError("reset".to_string()));

    let summary = controller(config, &provider).run(&input, None).await?;

    assert_eq!(summary.total_batches, 3);
    assert_eq!(summary.skipped_batches, 1);
    assert_eq!(summary.rewritten_entries, 3);
    assert_eq!(provider.call_count(), 3);

    let output = summary.output_path.expect("output should be written");
    let indices: Vec<usize> = SubtitleCollection::load(&output)?
        .entries
        .iter()
        .map(|entry| entry.index)
        .collect();
    assert_eq!(indices, vec![3, 4, 5]);
    Ok(())
}

/// Two unusable responses leave a diagnostic and skip the batch
#[tokio::test]
async fn test_run_withMalformedResponseTwice_shouldSaveRawResponse() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let log_dir = temp_dir.path().join("logs");
    let input = common::create_test_file(temp_dir.path(), "long.srt", &common::generate_srt(4))?;
    let mut config = common::test_config(&log_dir);
    config.subtitles.batch_size = 2;
    let provider = MockProvider::echo()
        .then_reply("Here you go!")
        .then_reply("Still no numbers, sorry.");

    let summary = controller(config, &provider).run(&input, None).await?;

    assert_eq!(summary.skipped_batches, 1);
    assert_eq!(summary.rewritten_batches, 1);
    assert_eq!(provider.call_count(), 3);
    assert_eq!(
        fs::read_to_string(log_dir.join("batch_001.txt"))?,
        "Still no numbers, sorry."
    );
    assert!(!log_dir.join("batch_002.txt").exists());
    Ok(())
}

/// With reindex the survivors are renumbered from 1
#[tokio::test]
async fn test_run_withReindexAndSkippedBatch_shouldRenumberOutput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "long.srt", &common::generate_srt(4))?;
    let mut config = common::test_config(&temp_dir.path().join("logs"));
    config.subtitles.batch_size = 2;
    config.subtitles.reindex = true;
    let provider = MockProvider::echo().then_fail(ProviderError::EmptyResponse);

    let summary = controller(config, &provider).run(&input, None).await?;

    let output = summary.output_path.expect("output should be written");
    let entries = SubtitleCollection::load(&output)?.entries;
    assert_eq!(entries.iter().map(|e| e.index).collect::<Vec<_>>(), vec![1, 2]);
    assert_eq!(entries[0].content, "[MODERN] Line number 3");
    Ok(())
}

/// Nothing rewritten means nothing written
#[tokio::test]
async fn test_run_withEveryBatchFailing_shouldWriteNothing() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_subtitle(temp_dir.path(), "episode.srt")?;
    let provider = MockProvider::failing();

    let summary = controller(common::test_config(&temp_dir.path().join("logs")), &provider)
        .run(&input, None)
        .await?;

    assert!(!summary.has_output());
    assert_eq!(summary.skipped_batches, 1);
    assert!(!temp_dir.path().join("episode.modern.srt").exists());
    Ok(())
}

#[tokio::test]
async fn test_run_withEmptyFile_shouldMakeNoCalls() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "empty.srt", "")?;
    let provider = MockProvider::echo();

    let summary = controller(common::test_config(&temp_dir.path().join("logs")), &provider)
        .run(&input, None)
        .await?;

    assert_eq!(summary.total_batches, 0);
    assert!(!summary.has_output());
    assert_eq!(provider.call_count(), 0);
    Ok(())
}

/// Load errors are fatal and happen before any call
#[tokio::test]
async fn test_run_withMalformedSrt_shouldFailBeforeAnyCall() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input = common::create_test_file(temp_dir.path(), "bad.srt", "1\nnot a timing line\nText\n")?;
    let provider = MockProvider::echo();

    let result = controller(common::test_config(&temp_dir.path().join("logs")), &provider)
        .run(&input, None)
        .await;

    assert!(matches!(result, Err(AppError::Load(_))));
    assert_eq!(provider.call_count(), 0);
    Ok(())
}

/// Folder mode skips its own outputs and keeps going after errors
#[tokio::test]
async fn test_runFolder_withMixedFiles_shouldProcessEachInput() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let season = temp_dir.path().join("season1");
    fs::create_dir_all(&season)?;
    common::create_test_subtitle(temp_dir.path(), "a.srt")?;
    common::create_test_subtitle(&season, "b.srt")?;
    common::create_test_file(temp_dir.path(), "old.modern.srt", common::SAMPLE_SRT)?;
    common::create_test_file(temp_dir.path(), "broken.srt", "x\ny\n")?;
    let provider = MockProvider::echo();

    let summary = controller(common::test_config(&temp_dir.path().join("logs")), &provider)
        .run_folder(temp_dir.path())
        .await?;

    assert_eq!(summary.files, 3);
    assert_eq!(summary.written, 2);
    assert_eq!(summary.failed, 1);
    assert!(!summary.is_fatal());
    assert_eq!(provider.call_count(), 2);
    assert!(temp_dir.path().join("a.modern.srt").exists());
    assert!(season.join("b.modern.srt").exists());
    assert!(!temp_dir.path().join("old.modern.modern.srt").exists());
    Ok(())
}

/// A folder where every input fails to load is a fatal run
#[tokio::test]
async fn test_runFolder_withOnlyBrokenFiles_shouldBeFatal() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    common::create_test_file(temp_dir.path(), "one.srt", "x\ny\n")?;
    common::create_test_file(temp_dir.path(), "two.srt", "1\nnot a timing line\n")?;
    let provider = MockProvider::echo();

    let summary = controller(common::test_config(&temp_dir.path().join("logs")), &provider)
        .run_folder(temp_dir.path())
        .await?;

    assert_eq!(summary.failed, 2);
    assert_eq!(summary.written, 0);
    assert!(summary.is_fatal());
    assert_eq!(provider.call_count(), 0);
    Ok(())
}

/// Diagnostics of different files failing the same batch are kept apart
#[tokio::test]
async fn test_runFolder_withSameBatchFailingTwice_shouldKeepBothDiagnostics() -> Result<()> {
    let temp_dir = common::create_temp_dir()?;
    let input_dir = temp_dir.path().join("subs");
    let log_dir = temp_dir.path().join("logs");
    fs::create_dir_all(&input_dir)?;
    common::create_test_subtitle(&input_dir, "a.srt")?;
    common::create_test_subtitle(&input_dir, "b.srt")?;
    let provider = MockProvider::echo()
        .then_reply("A first")
        .then_reply("A retry")
        .then_reply("B first")
        .then_reply("B retry");

    let summary = controller(common::test_config(&log_dir), &provider)
        .run_folder(&input_dir)
        .await?;

    assert_eq!(summary.files, 2);
    assert_eq!(summary.without_output, 2);
    assert!(!summary.is_fatal());
    assert_eq!(provider.call_count(), 4);
    assert_eq!(fs::read_to_string(log_dir.join("a").join("batch_001.txt"))?, "A retry");
    assert_eq!(fs::read_to_string(log_dir.join("b").join("batch_001.txt"))?, "B retry");
    Ok(())
}

#[tokio::test]
async fn test_runFolder_withMissingDirectory_shouldFail() {
    let provider = MockProvider::echo();
    let result = controller(Config::default(), &provider)
        .run_folder(std::path::Path::new("/no/such/dir"))
        .await;

    assert!(matches!(result, Err(AppError::Config(_))));
}

/// Construction from configuration validates it first
#[test]
fn test_withConfig_withoutApiKey_shouldRejectConfig() {
    let result = Controller::with_config(Config::default());
    assert!(matches!(result, Err(AppError::Config(_))));
}
