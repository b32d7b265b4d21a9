//! FFprobe duration extraction.

use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::{MediaError, MediaResult};

/// FFprobe JSON output format.
#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    format: FfprobeFormat,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}

/// Parse total duration (seconds) out of an FFprobe JSON document.
///
/// FFprobe encodes the duration as a numeric string inside the `format`
/// object. A document that does not parse as JSON and a duration field that
/// does not parse as a number are reported as distinct errors.
pub fn parse_duration(probe_output: &str) -> MediaResult<f64> {
    let probe: FfprobeOutput =
        serde_json::from_str(probe_output).map_err(MediaError::MalformedProbeOutput)?;

    let raw = probe.format.duration;
    match raw.as_deref().map(str::parse::<f64>) {
        Some(Ok(duration)) => Ok(duration),
        _ => Err(MediaError::InvalidDuration(raw)),
    }
}

/// Probe a media file for its total duration in seconds.
pub async fn probe_duration(path: impl AsRef<Path>) -> MediaResult<f64> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(MediaError::FileNotFound(path.to_path_buf()));
    }

    // Check FFprobe exists
    which::which("ffprobe").map_err(|_| MediaError::FfprobeNotFound)?;

    let output = Command::new("ffprobe")
        .args(["-v", "quiet", "-print_format", "json", "-show_format"])
        .arg(path)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        return Err(MediaError::ffprobe_failed(
            format!("FFprobe failed for {}", path.display()),
            Some(String::from_utf8_lossy(&output.stderr).to_string()),
        ));
    }

    parse_duration(&String::from_utf8_lossy(&output.stdout))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_duration() {
        let duration = parse_duration(r#"{"format": {"duration": "123.45"}}"#).unwrap();
        assert!((duration - 123.45).abs() < f64::EPSILON);
    }

    #[test]
    fn test_parse_invalid_json() {
        let err = parse_duration(r#"{"format": {"duration":}}"#).unwrap_err();
        assert!(matches!(err, MediaError::MalformedProbeOutput(_)));
    }

    #[test]
    fn test_parse_non_numeric_duration() {
        let err = parse_duration(r#"{"format": {"duration": "abc"}}"#).unwrap_err();
        assert!(matches!(err, MediaError::InvalidDuration(Some(s)) if s == "abc"));
    }

    #[test]
    fn test_parse_missing_duration() {
        let err = parse_duration(r#"{"format": {}}"#).unwrap_err();
        assert!(matches!(err, MediaError::InvalidDuration(None)));
    }
}
