//! Concurrent fixed-duration audio segmentation.
//!
//! Splits a recording into `ceil(duration / segment_secs)` stream-copied
//! slices, one FFmpeg invocation per slice, all in flight at once. Failures
//! are collected per segment and reported as a batch after every invocation
//! has finished; one bad segment never cancels its siblings.

use std::path::{Path, PathBuf};

use futures::future::join_all;
use thiserror::Error;
use tracing::{debug, info};

use crate::command::FfmpegCommand;
use crate::error::{MediaError, MediaResult};
use crate::probe::probe_duration;

/// One segment's failure, attributable to its zero-based index.
#[derive(Debug, Error)]
#[error("segment {index} failed: {error}")]
pub struct SegmentFailure {
    /// Zero-based segment ordinal
    pub index: usize,
    /// Underlying FFmpeg/IO error
    pub error: MediaError,
}

/// Number of fixed-length segments covering `duration_secs`.
///
/// Uses true ceiling division on the floating-point duration so a trailing
/// partial segment still yields one extra slice. A duration exactly divisible
/// by `segment_secs` yields no spurious empty segment.
pub fn segment_count(duration_secs: f64, segment_secs: u64) -> usize {
    debug_assert!(segment_secs > 0);
    if duration_secs <= 0.0 {
        return 0;
    }
    (duration_secs / segment_secs as f64).ceil() as usize
}

/// Output path for one segment: `<dir>/<input-stem>_seg_<index>.<ext>`.
///
/// Segments are flat files in the output directory; the extension is
/// inherited from the input so stream copy keeps its container format.
pub fn segment_output_path(input: &Path, output_dir: &Path, index: usize) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = input
        .extension()
        .map(|e| e.to_string_lossy().to_string())
        .unwrap_or_else(|| "mp3".to_string());
    output_dir.join(format!("{}_seg_{}.{}", stem, index, ext))
}

/// Extract one segment by stream copy, without re-encoding.
///
/// The nominal length is always `segment_secs`; FFmpeg truncates the final
/// segment at end-of-stream on its own.
pub async fn extract_segment(
    input: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    index: usize,
    segment_secs: u64,
) -> MediaResult<PathBuf> {
    let input = input.as_ref();
    let output = segment_output_path(input, output_dir.as_ref(), index);
    let start = (index as u64 * segment_secs) as f64;

    debug!(
        index,
        start_secs = start,
        output = %output.display(),
        "Extracting segment"
    );

    FfmpegCommand::new(input, &output)
        .seek(start)
        .duration(segment_secs as f64)
        .codec_copy()
        .run()
        .await?;

    Ok(output)
}

/// Split `input` into fixed-length segments under `output_dir`.
///
/// Probes the total duration, then dispatches one extraction task per
/// segment with no concurrency cap; FFmpeg's own resource limits apply. The
/// call returns only after every task has finished.
///
/// Probe failures abort the call before dispatch and surface as the outer
/// `Err`. Per-segment failures are aggregated into the returned `Vec`, in no
/// particular order; an empty `Vec` means total success, and partial success
/// is visible as a non-empty subset of indices.
pub async fn segment_audio(
    input: impl AsRef<Path>,
    segment_secs: u64,
    output_dir: impl AsRef<Path>,
) -> MediaResult<Vec<SegmentFailure>> {
    let input = input.as_ref().to_path_buf();
    let output_dir = output_dir.as_ref().to_path_buf();

    let duration = probe_duration(&input).await?;
    let count = segment_count(duration, segment_secs);

    info!(
        input = %input.display(),
        duration_secs = duration,
        segment_secs,
        segments = count,
        "Segmenting audio"
    );

    let handles: Vec<_> = (0..count)
        .map(|index| {
            let input = input.clone();
            let output_dir = output_dir.clone();
            tokio::spawn(async move {
                (
                    index,
                    extract_segment(&input, &output_dir, index, segment_secs).await,
                )
            })
        })
        .collect();

    let mut failures = Vec::new();
    for (slot, joined) in join_all(handles).await.into_iter().enumerate() {
        match joined {
            Ok((_, Ok(_))) => {}
            Ok((index, Err(error))) => failures.push(SegmentFailure { index, error }),
            Err(join_err) => failures.push(SegmentFailure {
                index: slot,
                error: MediaError::ffmpeg_failed(
                    format!("segment task aborted: {}", join_err),
                    None,
                    None,
                ),
            }),
        }
    }

    if !failures.is_empty() {
        for failure in &failures {
            tracing::error!(index = failure.index, error = %failure.error, "Segment failed");
        }
    }

    Ok(failures)
}
