//! Container contracts for the supported separation models.
//!
//! Each model knows its image, model-weight volume, in-container mount
//! points, and how to render its command line. Both models are driven the
//! same way: the input file's directory is mounted at `/input`, the caller's
//! output root at `/output`, and the weight volume at the model's mount
//! point. Each model is pointed at a model-qualified output directory
//! (`/output/<subdir>`) so relocation works off one committed layout.

use std::path::PathBuf;

use crate::config::SeparatorConfig;

/// Fixed in-container path where the input directory is mounted.
pub const INPUT_MOUNT: &str = "/input";
/// Fixed in-container path where the output root is mounted.
pub const OUTPUT_MOUNT: &str = "/output";

/// Demucs model variant passed to `-n`.
const DEMUCS_VARIANT: &str = "htdemucs";

/// A supported source-separation model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Model {
    /// Deezer Spleeter (2-stem vocals/accompaniment), pulled from Docker Hub.
    Spleeter,
    /// Meta Demucs, built from a local build context.
    Demucs,
}

/// How to make an image present locally: pull the reference, or build it
/// from a context directory when a build spec is attached.
#[derive(Debug, Clone)]
pub struct ImageSpec {
    /// Exact image reference matched against local repo tags
    pub reference: String,
    /// Build instructions for locally built images
    pub build: Option<BuildSpec>,
}

/// A Docker build context plus Dockerfile path relative to it.
#[derive(Debug, Clone)]
pub struct BuildSpec {
    pub context: PathBuf,
    pub dockerfile: String,
}

impl Model {
    /// Parse a model name from configuration.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "spleeter" => Some(Self::Spleeter),
            "demucs" => Some(Self::Demucs),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Spleeter => "spleeter",
            Self::Demucs => "demucs",
        }
    }

    /// Image to run, including how to obtain it when absent.
    pub fn image_spec(&self, config: &SeparatorConfig) -> ImageSpec {
        match self {
            Self::Spleeter => ImageSpec {
                reference: if config.use_gpu {
                    "deezer/spleeter:3.8-gpu".to_string()
                } else {
                    "deezer/spleeter:3.8".to_string()
                },
                build: None,
            },
            Self::Demucs => ImageSpec {
                reference: "stemworks/demucs:latest".to_string(),
                build: Some(BuildSpec {
                    context: PathBuf::from("docker/demucs"),
                    dockerfile: "Dockerfile".to_string(),
                }),
            },
        }
    }

    /// Named persistent volume holding the model weights.
    pub fn volume_name(&self) -> &'static str {
        match self {
            Self::Spleeter => "stemworks-spleeter-models",
            Self::Demucs => "stemworks-demucs-models",
        }
    }

    /// In-container mount point for the weight volume.
    pub fn model_mount(&self) -> &'static str {
        match self {
            Self::Spleeter => "/model",
            Self::Demucs => "/data/models",
        }
    }

    /// Environment passed to the container.
    pub fn env(&self) -> Vec<String> {
        match self {
            Self::Spleeter => vec![format!("MODEL_PATH={}", self.model_mount())],
            Self::Demucs => vec![format!("TORCH_HOME={}", self.model_mount())],
        }
    }

    /// Subdirectory of the output root the container writes into; the
    /// relocation step drains `<output-root>/<subdir>/<input-stem>/`.
    pub fn output_subdir(&self) -> &'static str {
        match self {
            Self::Spleeter => "spleeter",
            Self::Demucs => DEMUCS_VARIANT,
        }
    }

    /// Render the container command for one input file.
    pub fn command(&self, input_file_name: &str, config: &SeparatorConfig) -> Vec<String> {
        let input_path = format!("{}/{}", INPUT_MOUNT, input_file_name);
        match self {
            Self::Spleeter => {
                let mut cmd = vec![
                    "separate".to_string(),
                    "-i".to_string(),
                    input_path,
                    "-o".to_string(),
                    format!("{}/{}", OUTPUT_MOUNT, self.output_subdir()),
                    "-p".to_string(),
                    "spleeter:2stems".to_string(),
                ];
                if config.mp3_output {
                    cmd.push("-c".to_string());
                    cmd.push("mp3".to_string());
                }
                cmd
            }
            Self::Demucs => {
                let mut cmd = vec![
                    "python3".to_string(),
                    "-m".to_string(),
                    "demucs".to_string(),
                    "-n".to_string(),
                    DEMUCS_VARIANT.to_string(),
                    "--out".to_string(),
                    OUTPUT_MOUNT.to_string(),
                    "-d".to_string(),
                    if config.use_gpu { "cuda" } else { "cpu" }.to_string(),
                ];
                if config.mp3_output {
                    cmd.push("--mp3".to_string());
                }
                cmd.push(input_path);
                cmd
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name() {
        assert_eq!(Model::from_name("spleeter"), Some(Model::Spleeter));
        assert_eq!(Model::from_name(" Demucs "), Some(Model::Demucs));
        assert_eq!(Model::from_name("umx"), None);
    }

    #[test]
    fn test_spleeter_command() {
        let config = SeparatorConfig::default();
        let cmd = Model::Spleeter.command("song.mp3", &config);
        assert_eq!(
            cmd,
            vec![
                "separate",
                "-i",
                "/input/song.mp3",
                "-o",
                "/output/spleeter",
                "-p",
                "spleeter:2stems"
            ]
        );
    }

    #[test]
    fn test_spleeter_mp3_codec() {
        let config = SeparatorConfig {
            mp3_output: true,
            ..SeparatorConfig::default()
        };
        let cmd = Model::Spleeter.command("song.wav", &config);
        assert!(cmd.windows(2).any(|w| w == ["-c", "mp3"]));
    }

    #[test]
    fn test_demucs_command_cpu_vs_gpu() {
        let mut config = SeparatorConfig {
            model: Model::Demucs,
            ..SeparatorConfig::default()
        };
        let cpu = Model::Demucs.command("song.mp3", &config);
        assert!(cpu.windows(2).any(|w| w == ["-d", "cpu"]));
        assert_eq!(cpu.last().map(String::as_str), Some("/input/song.mp3"));

        config.use_gpu = true;
        let gpu = Model::Demucs.command("song.mp3", &config);
        assert!(gpu.windows(2).any(|w| w == ["-d", "cuda"]));
    }

    #[test]
    fn test_gpu_selects_gpu_image() {
        let config = SeparatorConfig {
            use_gpu: true,
            ..SeparatorConfig::default()
        };
        let spec = Model::Spleeter.image_spec(&config);
        assert_eq!(spec.reference, "deezer/spleeter:3.8-gpu");
        assert!(spec.build.is_none());
    }

    #[test]
    fn test_demucs_is_locally_built() {
        let spec = Model::Demucs.image_spec(&SeparatorConfig::default());
        assert!(spec.build.is_some());
    }
}
