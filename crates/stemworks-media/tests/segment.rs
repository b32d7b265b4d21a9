//! Segmentation integration tests.
//!
//! These exercise the real FFmpeg/FFprobe binaries and skip silently when
//! the tools are not installed.

use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tokio::fs;

use stemworks_media::{probe_duration, segment_audio, segment_output_path};

fn ffmpeg_available() -> bool {
    which::which("ffmpeg").is_ok() && which::which("ffprobe").is_ok()
}

/// Generate a sine-tone WAV of the given duration.
async fn generate_tone(dir: &Path, secs: u32) -> PathBuf {
    let path = dir.join("tone.wav");
    let status = tokio::process::Command::new("ffmpeg")
        .args([
            "-y",
            "-v",
            "error",
            "-f",
            "lavfi",
            "-i",
            &format!("sine=frequency=440:duration={}", secs),
        ])
        .arg(&path)
        .status()
        .await
        .expect("spawn ffmpeg");
    assert!(status.success(), "tone generation failed");
    path
}

async fn count_segments(dir: &Path) -> usize {
    let mut entries = fs::read_dir(dir).await.unwrap();
    let mut count = 0;
    while let Some(entry) = entries.next_entry().await.unwrap() {
        if entry
            .file_name()
            .to_string_lossy()
            .contains("_seg_")
        {
            count += 1;
        }
    }
    count
}

#[tokio::test]
async fn test_75s_input_yields_three_segments() {
    if !ffmpeg_available() {
        return;
    }

    let dir = TempDir::new().unwrap();
    let input = generate_tone(dir.path(), 75).await;
    let out_dir = dir.path().join("out");
    fs::create_dir_all(&out_dir).await.unwrap();

    let failures = segment_audio(&input, 30, &out_dir).await.unwrap();
    assert!(failures.is_empty(), "unexpected failures: {:?}", failures);
    assert_eq!(count_segments(&out_dir).await, 3);

    // Trailing partial segment: index 2 covers [60, 75), about 15 seconds.
    let last = segment_output_path(&input, &out_dir, 2);
    let duration = probe_duration(&last).await.unwrap();
    assert!(
        (duration - 15.0).abs() < 1.5,
        "last segment duration was {}",
        duration
    );
}

#[tokio::test]
async fn test_segmentation_is_idempotent() {
    if !ffmpeg_available() {
        return;
    }

    let dir = TempDir::new().unwrap();
    let input = generate_tone(dir.path(), 45).await;

    for run in 0..2 {
        let out_dir = dir.path().join(format!("out{}", run));
        fs::create_dir_all(&out_dir).await.unwrap();
        let failures = segment_audio(&input, 30, &out_dir).await.unwrap();
        assert!(failures.is_empty());
        assert_eq!(count_segments(&out_dir).await, 2);
    }
}

#[tokio::test]
async fn test_single_failure_does_not_abort_siblings() {
    if !ffmpeg_available() {
        return;
    }

    let dir = TempDir::new().unwrap();
    let input = generate_tone(dir.path(), 75).await;
    let out_dir = dir.path().join("out");
    fs::create_dir_all(&out_dir).await.unwrap();

    // Occupy segment 1's output path with a directory so only that FFmpeg
    // invocation fails.
    fs::create_dir_all(segment_output_path(&input, &out_dir, 1))
        .await
        .unwrap();

    let failures = segment_audio(&input, 30, &out_dir).await.unwrap();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].index, 1);

    assert!(segment_output_path(&input, &out_dir, 0).is_file());
    assert!(segment_output_path(&input, &out_dir, 2).is_file());
}

#[tokio::test]
async fn test_missing_input_is_a_probe_error() {
    let dir = TempDir::new().unwrap();
    let result = segment_audio(dir.path().join("nope.mp3"), 30, dir.path()).await;
    assert!(result.is_err());
}
