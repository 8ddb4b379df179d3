use crate::config::{DATASET_LICENSE, DATASET_URL};
use crate::error::PipelineError;
use std::path::{Path, PathBuf};
use tracing::info;

/// Checks that the dataset export is present where the download step leaves it.
/// Fetching the file from the portal happens outside this crate.
pub fn locate_dataset(path: &Path) -> Result<PathBuf, PipelineError> {
    info!(url = DATASET_URL, license = DATASET_LICENSE, "Dataset source");
    if !path.is_file() {
        return Err(PipelineError::MissingInput(path.to_path_buf()));
    }
    info!(path = %path.display(), "Using local copy of dataset");
    Ok(path.to_path_buf())
}
