//! Separation driver configuration.

use crate::model::Model;

/// Separation configuration, read from the environment once per call site
/// and passed explicitly from there.
#[derive(Debug, Clone)]
pub struct SeparatorConfig {
    /// Which separation model to run
    pub model: Model,
    /// Run the model on the GPU (nvidia device request + GPU image/flags)
    pub use_gpu: bool,
    /// Encode stems as mp3 instead of the model's native format
    pub mp3_output: bool,
}

impl Default for SeparatorConfig {
    fn default() -> Self {
        Self {
            model: Model::Spleeter,
            use_gpu: false,
            mp3_output: false,
        }
    }
}

impl SeparatorConfig {
    /// Create config from environment variables.
    ///
    /// - `STEMWORKS_MODEL`: `spleeter` (default) or `demucs`
    /// - `STEMWORKS_USE_GPU`: boolean, default `false`
    /// - `STEMWORKS_MP3_OUTPUT`: boolean, default `false`
    pub fn from_env() -> Self {
        Self {
            model: std::env::var("STEMWORKS_MODEL")
                .ok()
                .and_then(|s| Model::from_name(&s))
                .unwrap_or(Model::Spleeter),
            use_gpu: std::env::var("STEMWORKS_USE_GPU")
                .map(|s| parse_bool(&s))
                .unwrap_or(false),
            mp3_output: std::env::var("STEMWORKS_MP3_OUTPUT")
                .map(|s| parse_bool(&s))
                .unwrap_or(false),
        }
    }
}

/// Parse a boolean environment value (`1`/`true`/`yes`, case-insensitive).
fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
