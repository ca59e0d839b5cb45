/*!
 * Common test utilities for the submod test suite
 */

use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use submod::app_config::Config;

/// Creates a temporary directory for test files
pub fn create_temp_dir() -> Result<TempDir> {
    Ok(TempDir::new()?)
}

/// Creates a test file with the given content in the specified directory
pub fn create_test_file(dir: &Path, filename: &str, content: &str) -> Result<PathBuf> {
    let file_path = dir.join(filename);
    fs::write(&file_path, content)?;
    Ok(file_path)
}

/// Three single-line entries
pub const SAMPLE_SRT: &str = "1
00:00:01,000 --> 00:00:04,000
Whither goest thou?

2
00:00:05,000 --> 00:00:09,000
I know not, good sir.

3
00:00:10,000 --> 00:00:14,000
[DOOR CREAKS]
";

/// Creates a sample subtitle file for testing
pub fn create_test_subtitle(dir: &Path, filename: &str) -> Result<PathBuf> {
    create_test_file(dir, filename, SAMPLE_SRT)
}

/// Build an SRT text with `count` single-line entries numbered from 1
pub fn generate_srt(count: usize) -> String {
    (1..=count)
        .map(|i| {
            let start = (i as u64) * 2_000;
            format!(
                "{}\n{} --> {}\nLine number {}\n\n",
                i,
                submod::SubtitleEntry::format_timestamp(start),
                submod::SubtitleEntry::format_timestamp(start + 1_500),
                i
            )
        })
        .collect()
}

/// Configuration for pipeline tests: no delay, diagnostics under `log_dir`
pub fn test_config(log_dir: &Path) -> Config {
    let mut config = Config::default();
    config.translation.common.inter_batch_delay_ms = 0;
    config.translation.active_provider_config_mut().api_key = "test-key".to_string();
    config.subtitles.log_dir = log_dir.to_string_lossy().to_string();
    config
}
