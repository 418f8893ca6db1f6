//! The batch driver: convert every ROI file of a directory, one at a time.

use log::{error, info};
use std::fs;
use std::path::PathBuf;

use crate::error::ConvertResult;
use crate::expander::ToolRunner;
use crate::processor::{FileProcessor, GridSink, SurfaceSource, TemplateSource, FUNC_GII_SUFFIX};
use crate::util::has_suffix;
use crate::Config;

/// Counters of one batch run.
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub struct BatchSummary {
    /// Matching input files found.
    pub seen: usize,
    /// Files whose grid file was written.
    pub converted: usize,
    /// Files that failed before their grid file was written.
    pub failed: usize,
    /// Converted files whose densification failed.
    pub densify_failures: usize,
}

/// Convert all `.func.gii` files of the configured input directory with
/// the default file system and process collaborators.
pub fn run(config: &Config) -> ConvertResult<BatchSummary> {
    run_with(config, &FileProcessor::new(config))
}

/// Convert all `.func.gii` files of the configured input directory.
///
/// Files are visited in directory enumeration order. A failing file is
/// logged and skipped.
///
/// # Errors
///
/// Only failures to create the output directory or to list the input
/// directory abort the run.
pub fn run_with<IO, R>(
    config: &Config,
    processor: &FileProcessor<IO, R>,
) -> ConvertResult<BatchSummary>
where
    IO: SurfaceSource + TemplateSource + GridSink,
    R: ToolRunner,
{
    fs::create_dir_all(&config.output_dir)?;

    let mut summary = BatchSummary::default();
    for entry in fs::read_dir(&config.input_dir)? {
        let entry = entry?;
        let path: PathBuf = entry.path();
        if !has_suffix(&path, FUNC_GII_SUFFIX) || entry.file_type()?.is_dir() {
            continue;
        }
        summary.seen += 1;
        match processor.process(&path) {
            Ok(processed) => {
                summary.converted += 1;
                if !processed.densify.is_densified() {
                    summary.densify_failures += 1;
                }
            }
            Err(e) => {
                summary.failed += 1;
                error!(
                    "Error processing {}: {}",
                    entry.file_name().to_string_lossy(),
                    e
                );
            }
        }
    }

    info!(
        "Batch done: {} files, {} converted, {} failed, {} not densified",
        summary.seen, summary.converted, summary.failed, summary.densify_failures
    );
    Ok(summary)
}
