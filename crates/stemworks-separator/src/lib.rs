//! Docker orchestration for containerized source-separation models.
//!
//! This crate provides:
//! - Idempotent image and model-volume readiness (pull, local build)
//! - Container execution with a blocking wait and optional cancellation
//! - Bounded-concurrency relocation of model output into a flat layout

pub mod config;
pub mod container;
pub mod error;
pub mod fs_utils;
pub mod image;
pub mod model;
pub mod relocate;
pub mod volume;

pub use config::SeparatorConfig;
pub use container::{run_separation, SeparationJob};
pub use error::{SeparatorError, SeparatorResult};
pub use image::{build_image, ensure_image, pull_image};
pub use model::{BuildSpec, ImageSpec, Model};
pub use relocate::{relocate_stems, MoveFailure, MAX_CONCURRENT_MOVES};
pub use volume::ensure_volume;
