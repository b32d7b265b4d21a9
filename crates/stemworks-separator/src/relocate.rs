//! Post-run relocation of separation output.
//!
//! Separation containers write stems under a model-qualified subdirectory
//! (`<output-root>/<model-subdir>/<input-stem>/`). Callers expect them flat
//! at `<output-root>/<input-stem>/`, so every direct file child is moved
//! there, at most [`MAX_CONCURRENT_MOVES`] renames in flight at once, and the
//! emptied source directory is removed.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures::future::join_all;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Semaphore;
use tracing::{info, warn};

use crate::error::{SeparatorError, SeparatorResult};
use crate::fs_utils::move_file;

/// Upper bound on concurrently in-flight file moves, regardless of how many
/// stems a model produces.
pub const MAX_CONCURRENT_MOVES: usize = 10;

/// One file move's failure, attributable to its source path.
#[derive(Debug, Error)]
#[error("failed to move {path}: {error}")]
pub struct MoveFailure {
    pub path: PathBuf,
    pub error: SeparatorError,
}

/// Run `op` over every item, admitting at most `limit` at a time through a
/// counting semaphore. All items are awaited; failures come back paired with
/// the item that produced them, in completion order.
async fn bounded_fan_out<T, F, Fut>(items: Vec<T>, limit: usize, op: F) -> Vec<(T, SeparatorError)>
where
    T: Clone + Send + 'static,
    F: Fn(T) -> Fut,
    Fut: Future<Output = SeparatorResult<()>> + Send + 'static,
{
    let semaphore = Arc::new(Semaphore::new(limit));

    let reported: Vec<T> = items.clone();
    let handles: Vec<_> = items
        .into_iter()
        .map(|item| {
            let semaphore = semaphore.clone();
            let fut = op(item);
            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.expect("semaphore closed");
                fut.await
            })
        })
        .collect();

    let mut failures = Vec::new();
    for (item, joined) in reported.into_iter().zip(join_all(handles).await) {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(error)) => failures.push((item, error)),
            Err(join_err) => failures.push((
                item,
                SeparatorError::internal(format!("move task aborted: {}", join_err)),
            )),
        }
    }
    failures
}

/// Move every stem file out of `<output_root>/<model_subdir>/<input_stem>/`
/// into `<output_root>/<input_stem>/`.
///
/// Only direct file children are moved; subdirectories are skipped, not
/// recursed into. Each move's failure is captured independently and all
/// moves are awaited before the aggregated failures are returned; an empty
/// `Vec` means every stem landed. The emptied source directory is removed
/// afterwards.
pub async fn relocate_stems(
    output_root: &Path,
    model_subdir: &str,
    input_stem: &str,
) -> SeparatorResult<Vec<MoveFailure>> {
    let source_dir = output_root.join(model_subdir).join(input_stem);
    let dest_dir = output_root.join(input_stem);

    if !source_dir.is_dir() {
        return Err(SeparatorError::OutputMissing(source_dir));
    }

    let mut files = Vec::new();
    let mut entries = fs::read_dir(&source_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if entry.file_type().await?.is_file() {
            files.push(entry.path());
        }
    }

    info!(
        source = %source_dir.display(),
        dest = %dest_dir.display(),
        files = files.len(),
        "Relocating separation output"
    );

    let dest = dest_dir.clone();
    let raw_failures = bounded_fan_out(files, MAX_CONCURRENT_MOVES, move |path: PathBuf| {
        let dest = dest.clone();
        async move {
            let file_name = path
                .file_name()
                .ok_or_else(|| SeparatorError::InvalidInput(path.clone()))?;
            move_file(&path, dest.join(file_name)).await
        }
    })
    .await;

    let failures: Vec<MoveFailure> = raw_failures
        .into_iter()
        .map(|(path, error)| MoveFailure { path, error })
        .collect();

    if failures.is_empty() {
        if let Err(e) = fs::remove_dir(&source_dir).await {
            warn!(dir = %source_dir.display(), error = %e, "Failed to remove drained output directory");
        }
        // The model-level directory usually empties out too.
        let _ = fs::remove_dir(output_root.join(model_subdir)).await;
    } else {
        for failure in &failures {
            tracing::error!(path = %failure.path.display(), error = %failure.error, "Stem move failed");
        }
    }

    Ok(failures)
}
