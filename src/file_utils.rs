use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

// @module: File and directory utilities

/// Suffix inserted before the extension of generated files
pub const OUTPUT_SUFFIX: &str = "modern";

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().exists() && path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    // @generates: Default output path next to the input
    // @example: show/ep1.srt -> show/ep1.modern.srt
    pub fn generate_output_path<P: AsRef<Path>>(input_file: P) -> PathBuf {
        let input_file = input_file.as_ref();
        let stem = input_file.file_stem().unwrap_or_default();

        let mut output_filename = stem.to_string_lossy().to_string();
        output_filename.push('.');
        output_filename.push_str(OUTPUT_SUFFIX);
        output_filename.push_str(".srt");

        match input_file.parent() {
            Some(parent) => parent.join(output_filename),
            None => PathBuf::from(output_filename),
        }
    }

    // @checks: Whether a path looks like one of our own outputs
    pub fn is_generated_output<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref()
            .file_stem()
            .map(|stem| stem.to_string_lossy().ends_with(&format!(".{}", OUTPUT_SUFFIX)))
            .unwrap_or(false)
    }

    /// Find files with a specific extension in a directory, sorted by path
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let mut result = Vec::new();
        let normalized_ext = extension.trim_start_matches('.');

        for entry in WalkDir::new(dir.as_ref()).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file() {
                if let Some(ext) = path.extension() {
                    if ext.to_string_lossy().eq_ignore_ascii_case(normalized_ext) {
                        result.push(path.to_path_buf());
                    }
                }
            }
        }

        result.sort();
        Ok(result)
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content)
            .with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;

        Ok(())
    }

    // @generates: Diagnostic path for a skipped batch
    // @example: (logs, 7) -> logs/batch_007.txt
    pub fn raw_response_path<P: AsRef<Path>>(log_dir: P, batch_number: usize) -> PathBuf {
        log_dir.as_ref().join(format!("batch_{:03}.txt", batch_number))
    }

    // @generates: Per-input diagnostics directory for folder runs
    // @example: (logs, subs, subs/s1/ep1.srt) -> logs/s1/ep1
    pub fn diagnostics_dir_for<P: AsRef<Path>>(log_dir: P, input_dir: &Path, input_file: &Path) -> PathBuf {
        let relative = input_file
            .strip_prefix(input_dir)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(input_file.file_name().unwrap_or_default()));
        log_dir.as_ref().join(relative.with_extension(""))
    }

    /// Save the raw provider response of a skipped batch
    pub fn save_raw_response<P: AsRef<Path>>(log_dir: P, batch_number: usize, response: &str) -> Result<PathBuf> {
        let path = Self::raw_response_path(log_dir, batch_number);
        Self::write_to_file(&path, response)?;
        Ok(path)
    }
}
