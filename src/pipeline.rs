use crate::config::BATCH_SIZE;
use crate::dataset::locate_dataset;
use crate::dedup::dedup_records;
use crate::extract::NameRecords;
use crate::import::{batch_count, check_batch_size, load_batches, make_progress_bar};
use crate::models::NameRecord;
use crate::stats::IngestStats;
use crate::store::NameStore;
use anyhow::Result;
use indicatif::ProgressBar;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Where an ingestion run is. `Failed` can be entered from any other stage and is
/// never left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Connected,
    Extracting,
    Deduplicating,
    Loading,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Idle => "idle",
            Stage::Connected => "connected",
            Stage::Extracting => "extracting",
            Stage::Deduplicating => "deduplicating",
            Stage::Loading => "loading",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone)]
pub struct IngestOptions {
    pub csv_path: PathBuf,
    pub batch_size: usize,
    pub show_progress: bool,
}

impl IngestOptions {
    pub fn new(csv_path: impl Into<PathBuf>) -> Self {
        Self {
            csv_path: csv_path.into(),
            batch_size: BATCH_SIZE,
            show_progress: false,
        }
    }
}

/// Runs extraction, deduplication and batch loading against a store handle
/// that the caller opened and will close.
pub struct Driver<'a, S: NameStore + ?Sized> {
    store: &'a mut S,
    stage: Stage,
}

impl<'a, S: NameStore + ?Sized> Driver<'a, S> {
    pub fn new(store: &'a mut S) -> Self {
        let mut driver = Self {
            store,
            stage: Stage::Idle,
        };
        driver.enter(Stage::Connected);
        driver
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    fn enter(&mut self, next: Stage) {
        debug!(from = %self.stage, to = %next, "Pipeline stage");
        self.stage = next;
    }

    pub async fn ingest(&mut self, opts: &IngestOptions) -> Result<IngestStats> {
        let start = Instant::now();
        match self.run_stages(opts).await {
            Ok(stats) => {
                self.enter(Stage::Done);
                info!(
                    duration_secs = start.elapsed().as_secs_f64(),
                    inserted = stats.rows_inserted,
                    "Ingestion complete"
                );
                Ok(stats)
            }
            Err(e) => {
                let stage = self.stage;
                self.enter(Stage::Failed);
                Err(e.context(format!("Ingestion failed while {stage}")))
            }
        }
    }

    async fn run_stages(&mut self, opts: &IngestOptions) -> Result<IngestStats> {
        let mut stats = IngestStats::new();
        check_batch_size(opts.batch_size)?;

        let path = locate_dataset(&opts.csv_path)?;
        let mut rows = NameRecords::from_path(&path)?;
        if !rows.columns().is_complete() {
            warn!(
                path = %path.display(),
                columns = ?rows.columns(),
                "No recognised name/sex header; every row will be skipped"
            );
        }

        self.enter(Stage::Extracting);
        let extracted: Vec<NameRecord> = rows.by_ref().collect::<Result<_>>()?;
        stats.rows_read = rows.rows_read();
        stats.rows_dropped = rows.rows_dropped();
        stats.records_extracted = extracted.len() as u64;
        info!(
            rows = stats.rows_read,
            records = stats.records_extracted,
            "CSV parsed"
        );

        self.enter(Stage::Deduplicating);
        let (unique, discarded) = dedup_records(extracted);
        stats.duplicates_discarded = discarded;
        stats.unique_records = unique.len() as u64;
        info!(
            unique = stats.unique_records,
            duplicates = stats.duplicates_discarded,
            "Deduplicated"
        );

        self.enter(Stage::Loading);
        let pb = if opts.show_progress {
            make_progress_bar(
                batch_count(unique.len(), opts.batch_size) as u64,
                "Names",
                "batches",
            )
        } else {
            ProgressBar::hidden()
        };
        let report = load_batches(&mut *self.store, &unique, opts.batch_size, &pb).await?;
        stats.batches_written = report.batches;
        stats.rows_inserted = report.rows_inserted;

        Ok(stats)
    }
}

/// Convenience wrapper: one ingestion run on an already-open store.
pub async fn run_ingest<S>(store: &mut S, opts: &IngestOptions) -> Result<IngestStats>
where
    S: NameStore + ?Sized,
{
    Driver::new(store).ingest(opts).await
}
