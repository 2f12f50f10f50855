//! Removal of artifacts left behind by a previous run.

use crate::error::{PipelineError, PipelineResult};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Delete each named artifact in `dir` and return the paths actually removed.
///
/// Files that do not exist are skipped. A missing `dir` is not an error here;
/// the first write into it will fail instead.
pub fn remove_stale_artifacts(dir: &Path, names: &[&str]) -> PipelineResult<Vec<PathBuf>> {
    let mut removed = Vec::new();

    for name in names {
        let path = dir.join(name);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "removed stale artifact");
                removed.push(path);
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(PipelineError::io(path, e)),
        }
    }

    info!(dir = %dir.display(), removed = removed.len(), "cleaned output directory");
    Ok(removed)
}
