//! FFmpeg CLI wrapper for concurrent audio segmentation.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building
//! - FFprobe duration extraction with strict parse errors
//! - Concurrent fixed-duration segmentation with per-segment failure
//!   aggregation

pub mod command;
pub mod error;
pub mod probe;
pub mod segment;

pub use command::FfmpegCommand;
pub use error::{MediaError, MediaResult};
pub use probe::{parse_duration, probe_duration};
pub use segment::{
    extract_segment, segment_audio, segment_count, segment_output_path, SegmentFailure,
};
