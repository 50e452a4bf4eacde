use anyhow::{Result, Context};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, warn, info, debug};
use std::path::Path;
use std::time::{Duration, Instant};

use crate::app_config::Config;
use crate::checkpoint::Checkpoint;
use crate::document::{self, Document};
use crate::export::{ExportPaths, TableExporter};
use crate::extraction::{EntryExtractor, PageOutcome, PageProcessor, PageRange, ProcessingResult};
use crate::file_utils::FileManager;
use crate::providers::{LanguageModel, ModelClient};
use crate::result_store::{ResultStore, RunStatistics};

// @module: Application controller for dictionary digitization runs

/// What a finished run produced
#[derive(Debug, Clone)]
pub struct RunReport {
    /// Pages the run covered
    pub range: PageRange,
    /// Raw outcome of the page loop, including resumed entries
    pub result: ProcessingResult,
    /// Statistics over the raw entries
    pub statistics: RunStatistics,
    /// Entries left after deduplication and noise filtering
    pub refined_count: usize,
    /// Files the run wrote
    pub paths: ExportPaths,
    /// Resume point written at the end of the run
    pub checkpoint: Checkpoint,
    pub duration: Duration,
}

/// Main application controller for dictionary extraction
pub struct Controller {
    // @field: App configuration
    config: Config,
}

impl Controller {
    // @method: Create a new controller with the given configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self { config })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Files this controller writes
    pub fn export_paths(&self) -> ExportPaths {
        ExportPaths::new(&self.config.output.directory, &self.config.output.basename)
    }

    /// Check that the configured provider answers
    pub async fn check_provider(&self) -> Result<()> {
        let client = ModelClient::from_config(&self.config.extraction)
            .context("Failed to create model client")?;
        info!("Checking {}", client.label());
        client.test_connection().await
            .with_context(|| format!("{} is not reachable", client.label()))?;
        info!("{} is reachable", client.label());
        Ok(())
    }

    /// Run the configured pipeline over the document at `input_file`
    pub async fn run(&self, input_file: &Path, resume: bool) -> Result<RunReport> {
        // A document that cannot be opened ends the run
        let document = document::open_document(input_file)
            .with_context(|| format!("Failed to open document: {:?}", input_file))?;

        let fingerprint = match FileManager::sha256_file(input_file) {
            Ok(hash) => Some(hash),
            Err(e) => {
                warn!("Could not fingerprint {:?}: {}", input_file, e);
                None
            }
        };

        let model = ModelClient::from_config(&self.config.extraction)
            .context("Failed to create model client")?;

        self.run_with_model(document.as_ref(), fingerprint, model, resume).await
    }

    /// Run the pipeline over an opened document with the given model
    pub async fn run_with_model<M: LanguageModel>(
        &self,
        document: &dyn Document,
        fingerprint: Option<String>,
        model: M,
        resume: bool,
    ) -> Result<RunReport> {
        // Start timing the process
        let start_time = Instant::now();
        let paths = self.export_paths();
        FileManager::ensure_dir(&self.config.output.directory)?;

        info!("🚀 Lexiscribe: {} ({} pages) with {}", document.name(), document.page_count(), model.label());

        // Pick up where an earlier run stopped
        let (start_page, initial, resumed) = self.resume_point(document, fingerprint.as_deref(), &paths, resume)?;
        if !resumed {
            // a fresh run reports only its own failures
            FileManager::remove_if_exists(&paths.issues_log)
                .with_context(|| format!("Failed to remove old issues log {:?}", paths.issues_log))?;
        }
        let range = PageRange::resolve(start_page, self.config.processing.end_page, document.page_count());

        let exporter = TableExporter::from_profile(&self.config.dictionary);
        let processor = PageProcessor::from_config(
            EntryExtractor::from_config(model, &self.config),
            &self.config,
        );

        // Create a progress bar for page tracking
        let progress_bar = ProgressBar::new(range.len() as u64);
        let template_result = ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({percent}%) {msg} {eta}")
            .or_else(|_| ProgressStyle::default_bar().template("{spinner} [{elapsed_precise}] [{bar:40}] {pos}/{len} ({percent}%) {msg}"))
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(template_result.progress_chars("█▓▒░"));

        let flush_every = self.config.processing.flush_every_pages;
        let mut last_flush = 0;
        let pb = progress_bar.clone();

        let result = processor.run_with_observer(document, range, initial, |page_number, outcome, result| {
            pb.inc(1);
            pb.set_message(format!("page {} · {} entries", page_number, result.entries.len()));

            // Rewrite the raw table and checkpoint every few productive pages
            if flush_every > 0
                && matches!(outcome, PageOutcome::Extracted(_))
                && result.pages_processed >= last_flush + flush_every
            {
                last_flush = result.pages_processed;
                let checkpoint = self.build_checkpoint(document, fingerprint.clone(), result, range);
                if let Err(e) = self.flush(&exporter, &paths, result, &checkpoint) {
                    warn!("Intermediate save after page {} failed: {}", page_number, e);
                } else {
                    debug!("Saved progress after page {}", page_number);
                }
            }
        }).await;

        progress_bar.finish_and_clear();

        if !result.failures.is_empty() {
            self.write_issues_log(&paths.issues_log, document, &result);
        }

        // Final exports are required; failing here fails the run
        let store = ResultStore::new(result.entries.clone());
        exporter.write_tables(&paths.csv, &paths.xlsx, &store.by_page())
            .with_context(|| format!("Failed to write {:?}", paths.csv))?;
        info!("Success: {} and {}", paths.csv.display(), paths.xlsx.display());

        let refined = store.refined();
        if self.config.output.write_refined {
            exporter.write_tables(&paths.refined_csv, &paths.refined_xlsx, &refined)
                .with_context(|| format!("Failed to write {:?}", paths.refined_csv))?;
            info!("Success: {} ({} entries)", paths.refined_csv.display(), refined.len());
        }

        let statistics = store.statistics();
        self.log_statistics(&store, &statistics, refined.len());

        let checkpoint = self.build_checkpoint(document, fingerprint, &result, range);
        if let Err(e) = checkpoint.save(&paths.checkpoint) {
            warn!("Failed to save checkpoint: {}", e);
        }
        if checkpoint.is_complete() {
            info!("All {} pages visited", checkpoint.total_pages);
        } else {
            info!("Next run can resume from page {} (--resume)", checkpoint.next_start_page);
        }

        let duration = start_time.elapsed();
        info!("{} in {}", result.summary(), Self::format_duration(duration));

        Ok(RunReport {
            range,
            statistics,
            refined_count: refined.len(),
            paths,
            checkpoint,
            duration,
            result,
        })
    }

    /// First page to process and the result to continue from
    fn resume_point(
        &self,
        document: &dyn Document,
        fingerprint: Option<&str>,
        paths: &ExportPaths,
        resume: bool,
    ) -> Result<(u32, ProcessingResult, bool)> {
        let start_page = self.config.processing.start_page;
        if !resume {
            return Ok((start_page, ProcessingResult::default(), false));
        }

        match Checkpoint::load_if_exists(&paths.checkpoint)? {
            Some(checkpoint) if checkpoint.matches(&document.name(), fingerprint) => {
                info!(
                    "Resuming from page {} with {} saved entries and {} failed pages",
                    checkpoint.next_start_page,
                    checkpoint.entries.len(),
                    checkpoint.errored_pages.len()
                );
                let initial = ProcessingResult::resumed(
                    checkpoint.entries,
                    checkpoint.errored_pages,
                    checkpoint.pages_processed,
                );
                Ok((checkpoint.next_start_page, initial, true))
            }
            Some(_) => {
                warn!("Ignoring checkpoint {:?}, starting at page {}", paths.checkpoint, start_page);
                Ok((start_page, ProcessingResult::default(), false))
            }
            None => {
                info!("No checkpoint at {:?}, starting at page {}", paths.checkpoint, start_page);
                Ok((start_page, ProcessingResult::default(), false))
            }
        }
    }

    fn build_checkpoint(
        &self,
        document: &dyn Document,
        fingerprint: Option<String>,
        result: &ProcessingResult,
        range: PageRange,
    ) -> Checkpoint {
        Checkpoint {
            document: document.name(),
            fingerprint,
            last_processed_page: result.entries.iter().map(|e| e.page_number).max(),
            next_start_page: result.last_page_visited.map_or(range.start, |page| page + 1),
            total_pages: document.page_count(),
            errored_pages: result.errored_pages.iter().copied().collect(),
            pages_processed: result.pages_processed,
            entries: result.entries.clone(),
            created_at: chrono::Local::now(),
        }
    }

    fn flush(&self, exporter: &TableExporter, paths: &ExportPaths, result: &ProcessingResult, checkpoint: &Checkpoint) -> Result<()> {
        let store = ResultStore::new(result.entries.clone());
        exporter.write_csv(&paths.csv, &store.by_page())?;
        checkpoint.save(&paths.checkpoint)
    }

    /// Write failed pages to the issues log next to the exports
    fn write_issues_log(&self, path: &Path, document: &dyn Document, result: &ProcessingResult) {
        let header = format!(
            "{} - {} ({} failed pages)",
            document.name(),
            self.config.extraction.provider.display_name(),
            result.failures.len()
        );
        let mut lines = vec![header];
        for failure in &result.failures {
            lines.push(format!("page {} [{}]: {}", failure.page_number, failure.kind, failure.message));
            if let Some(raw) = &failure.raw_response {
                lines.push(format!("  raw response: {}", raw));
            }
        }

        for line in lines {
            if let Err(e) = FileManager::append_to_log_file(path, &line) {
                warn!("Failed to write issues log: {}", e);
                return;
            }
        }
        error!("{} pages failed, details in {}", result.failures.len(), path.display());
    }

    fn log_statistics(&self, store: &ResultStore, statistics: &RunStatistics, refined_count: usize) {
        info!("🔢 {}", statistics);
        info!("{} entries after deduplication and filtering", refined_count);
        if let Some(page) = store.last_processed_page() {
            info!("Last page with entries: {}", page);
        }

        let sample = store.sample(self.config.output.sample_size);
        if !sample.is_empty() {
            info!("Sample of {} entries:", sample.len());
            for entry in sample {
                info!("  p.{}: {} → {}", entry.page_number, entry.source_term, entry.translated_term);
            }
        }
    }

    // Format duration in a human-readable format
    fn format_duration(duration: Duration) -> String {
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
