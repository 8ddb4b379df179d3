use crate::config::MAX_BATCH_SIZE;
use crate::error::PipelineError;
use crate::models::NameRecord;
use crate::store::NameStore;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info};

/// Totals reported by [`load_batches`]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    pub batches: u64,
    pub rows_inserted: u64,
}

/// Number of batches `len` records split into.
pub fn batch_count(len: usize, batch_size: usize) -> usize {
    if batch_size == 0 {
        0
    } else {
        len.div_ceil(batch_size)
    }
}

/// Rejects batch sizes that are zero or would exceed MySQL's placeholder limit.
pub fn check_batch_size(batch_size: usize) -> Result<(), PipelineError> {
    if batch_size == 0 || batch_size > MAX_BATCH_SIZE {
        return Err(PipelineError::InvalidBatchSize(batch_size));
    }
    Ok(())
}

/// Persists `records` in contiguous chunks of `batch_size`, one round trip each,
/// awaiting every batch before issuing the next. The first failing batch stops the
/// load; batches already written stay written.
pub async fn load_batches<S>(
    store: &mut S,
    records: &[NameRecord],
    batch_size: usize,
    pb: &ProgressBar,
) -> Result<LoadReport, PipelineError>
where
    S: NameStore + ?Sized,
{
    check_batch_size(batch_size)?;

    let total = batch_count(records.len(), batch_size);
    pb.set_length(total as u64);

    let mut report = LoadReport::default();
    for (i, chunk) in records.chunks(batch_size).enumerate() {
        let batch = i + 1;
        let inserted = store
            .insert_ignore(chunk)
            .await
            .map_err(|source| PipelineError::BatchInsert {
                batch,
                total,
                source,
            })?;
        report.batches += 1;
        report.rows_inserted += inserted;
        debug!(batch, rows = chunk.len(), inserted, "Inserted batch");
        pb.inc(1);
    }

    pb.finish_with_message(format!(
        "{} batches, {} rows inserted",
        report.batches, report.rows_inserted
    ));
    info!(
        batches = report.batches,
        rows = report.rows_inserted,
        "Batch load complete"
    );
    Ok(report)
}

pub fn make_spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb.set_message(msg.to_string());
    pb
}

pub fn make_progress_bar(total: u64, label: &str, unit: &str) -> ProgressBar {
    let pb = ProgressBar::new(total);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(&format!(
                "    {{spinner:.cyan}} {label:<10} [{{bar:30.cyan/blue}}] {{pos}}/{{len}} {unit} {{msg}}"
            ))
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}
