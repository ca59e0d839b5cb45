use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::errors::AppError;
use crate::file_utils::FileManager;
use crate::providers::Provider;
use crate::subtitle_processor::{SubtitleCollection, SubtitleEntry};
use crate::translation::{batches, BatchOutcome, TranslationService};

// @module: Application controller for subtitle processing

/// What a single-file run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub total_batches: usize,
    pub rewritten_batches: usize,
    pub skipped_batches: usize,
    pub rewritten_entries: usize,
    /// Lines removed from the output because the response left them out
    pub dropped_lines: usize,
    /// Set only when an output file was written
    pub output_path: Option<PathBuf>,
}

impl RunSummary {
    pub fn has_output(&self) -> bool {
        self.output_path.is_some()
    }
}

/// What a folder run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderSummary {
    pub files: usize,
    pub written: usize,
    pub without_output: usize,
    pub failed: usize,
}

impl FolderSummary {
    /// No file was written and at least one could not be processed
    pub fn is_fatal(&self) -> bool {
        self.written == 0 && self.failed > 0
    }
}

/// Main application controller for subtitle rewriting
pub struct Controller {
    // @field: App configuration
    config: Config,
    // @field: Provider plus request settings
    service: TranslationService,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self, AppError> {
        config.validate().map_err(|e| AppError::Config(e.to_string()))?;
        let service = TranslationService::new(&config);
        Ok(Self { config, service })
    }

    // @method: Create a controller around an existing provider
    pub fn with_provider(config: Config, provider: Arc<dyn Provider>) -> Self {
        let service = TranslationService::with_provider(provider, &config);
        Self { config, service }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Test the connection to the configured provider
    pub async fn test_connection(&self) -> Result<(), AppError> {
        self.service.test_connection().await?;
        info!(
            "Connection to {} ({}) OK",
            self.config.translation.provider.display_name(),
            self.service.model()
        );
        Ok(())
    }

    /// Run the whole pipeline on one file
    ///
    /// Load and write errors abort the run. Batch failures are logged and the
    /// batch is left out of the output. Nothing is written when no entry was
    /// rewritten.
    pub async fn run(&self, input_file: &Path, output_file: Option<&Path>) -> Result<RunSummary, AppError> {
        let log_dir = PathBuf::from(&self.config.subtitles.log_dir);
        self.run_with_log_dir(input_file, output_file, &log_dir).await
    }

    async fn run_with_log_dir(
        &self,
        input_file: &Path,
        output_file: Option<&Path>,
        log_dir: &Path,
    ) -> Result<RunSummary, AppError> {
        let start_time = Instant::now();
        let output_path = output_file
            .map(Path::to_path_buf)
            .unwrap_or_else(|| FileManager::generate_output_path(input_file));

        let subtitles = SubtitleCollection::load(input_file)?;

        info!(
            "{} - {} | {} entries from {}",
            self.config.translation.provider.display_name(),
            self.service.model(),
            subtitles.entries.len(),
            subtitles.source_file.display()
        );

        let (rewritten, mut summary) = self.rewrite_entries(&subtitles.entries, log_dir).await;

        if rewritten.is_empty() {
            warn!("No subtitles were rewritten, nothing written for {}", input_file.display());
            return Ok(summary);
        }

        summary.dropped_lines = SubtitleCollection::write_without_sentinel(
            &rewritten,
            &output_path,
            &self.config.subtitles.sentinel,
            self.config.subtitles.reindex,
        )?;
        summary.output_path = Some(output_path.clone());

        if summary.dropped_lines > 0 {
            warn!("{} line(s) missing from responses were dropped", summary.dropped_lines);
        }
        info!(
            "Success: {} ({} of {} batches) in {}",
            output_path.display(),
            summary.rewritten_batches,
            summary.total_batches,
            Self::format_duration(start_time.elapsed())
        );

        Ok(summary)
    }

    /// Send every batch in order, collecting the entries that came back
    async fn rewrite_entries(&self, entries: &[SubtitleEntry], log_dir: &Path) -> (Vec<SubtitleEntry>, RunSummary) {
        let all_batches = batches(entries, self.config.subtitles.batch_size);
        let mut summary = RunSummary {
            total_batches: all_batches.len(),
            ..Default::default()
        };
        let mut rewritten = Vec::with_capacity(entries.len());
        let delay = Duration::from_millis(self.config.translation.common.inter_batch_delay_ms);

        let progress_bar = ProgressBar::new(summary.total_batches as u64);
        let style = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} batches ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar.set_message("Rewriting");

        for (offset, batch) in all_batches.enumerate() {
            let batch_number = offset + 1;

            match self.service.process_batch(batch_number, batch).await {
                BatchOutcome::Rewritten(entries) => {
                    summary.rewritten_batches += 1;
                    summary.rewritten_entries += entries.len();
                    rewritten.extend(entries);
                }
                BatchOutcome::ServiceFailed { reason } => {
                    summary.skipped_batches += 1;
                    progress_bar.suspend(|| {
                        error!("Batch {} skipped, no response from the service: {}", batch_number, reason)
                    });
                }
                BatchOutcome::ReconciliationFailed { raw_response, error } => {
                    summary.skipped_batches += 1;
                    let saved = FileManager::save_raw_response(log_dir, batch_number, &raw_response);
                    progress_bar.suspend(|| match saved {
                        Ok(path) => warn!(
                            "Batch {} skipped after retry ({}), response saved to {}",
                            batch_number,
                            error,
                            path.display()
                        ),
                        Err(e) => error!(
                            "Batch {} skipped after retry ({}), response could not be saved: {:#}",
                            batch_number, error, e
                        ),
                    });
                }
            }

            progress_bar.inc(1);

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
        }

        progress_bar.finish_and_clear();
        debug!(
            "Batches: {} rewritten, {} skipped, {} total",
            summary.rewritten_batches, summary.skipped_batches, summary.total_batches
        );

        (rewritten, summary)
    }

    /// Run the pipeline on every subtitle file below a directory
    ///
    /// Files that are themselves outputs (`*.modern.srt`) are left alone.
    /// A failing file is logged and the next one is processed. Diagnostics
    /// go to a per-input directory below the log directory so that files
    /// failing the same batch number keep separate records.
    pub async fn run_folder(&self, input_dir: &Path) -> Result<FolderSummary, AppError> {
        let start_time = Instant::now();

        if !FileManager::dir_exists(input_dir) {
            return Err(AppError::Config(format!(
                "Input directory does not exist: {}",
                input_dir.display()
            )));
        }

        let files: Vec<PathBuf> = FileManager::find_files(input_dir, "srt")?
            .into_iter()
            .filter(|path| !FileManager::is_generated_output(path))
            .collect();

        if files.is_empty() {
            warn!("No subtitle files found in {}", input_dir.display());
        }

        let mut summary = FolderSummary {
            files: files.len(),
            ..Default::default()
        };

        let log_dir = PathBuf::from(&self.config.subtitles.log_dir);
        for file in &files {
            let file_log_dir = FileManager::diagnostics_dir_for(&log_dir, input_dir, file);
            match self.run_with_log_dir(file, None, &file_log_dir).await {
                Ok(run) if run.has_output() => summary.written += 1,
                Ok(_) => summary.without_output += 1,
                Err(e) => {
                    error!("Error processing file {}: {}", file.display(), e);
                    summary.failed += 1;
                }
            }
        }

        info!(
            "Folder processing completed: {} written, {} without output, {} errors in {}",
            summary.written,
            summary.without_output,
            summary.failed,
            Self::format_duration(start_time.elapsed())
        );

        Ok(summary)
    }

    // Format duration in a human-readable format
    pub fn format_duration(duration: Duration) -> String {
        let total_seconds = duration.as_secs();
        let hours = total_seconds / 3600;
        let minutes = (total_seconds % 3600) / 60;
        let seconds = total_seconds % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}.{:03}s", seconds, duration.subsec_millis())
        }
    }
}
