//! Filesystem helpers.

use std::path::Path;

use crate::error::CommonResult;

/// Ensure a directory exists, creating it and any missing parents.
///
/// A pre-existing directory is success, not an error, so concurrent pipeline
/// runs sharing a parent workdir cannot race each other here.
pub fn ensure_dir(path: &Path) -> CommonResult<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}
