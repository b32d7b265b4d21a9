//! Separation job execution.
//!
//! One job is one container run: the input file's directory bind-mounted at
//! `/input`, the output root at `/output`, and the model-weight volume at
//! the model's mount point. The driver blocks until the container leaves the
//! running state and then relocates the model's output into the flat
//! caller-expected layout.

use std::path::{Path, PathBuf};

use bollard::container::{Config, CreateContainerOptions, StartContainerOptions, WaitContainerOptions};
use bollard::models::{DeviceRequest, HostConfig};
use bollard::Docker;
use futures::StreamExt;
use tokio::sync::watch;
use tracing::{debug, info};

use crate::config::SeparatorConfig;
use crate::error::{SeparatorError, SeparatorResult};
use crate::image::ensure_image;
use crate::relocate::{relocate_stems, MoveFailure};
use crate::volume::ensure_volume;

/// One run of a separation model against one input file. No state persists
/// past the call; the filesystem layout is the only durable output.
#[derive(Debug, Clone)]
pub struct SeparationJob {
    /// Audio file to separate
    pub input: PathBuf,
    /// Directory the stems end up in, under `<output_root>/<input-stem>/`
    pub output_root: PathBuf,
}

impl SeparationJob {
    pub fn new(input: impl Into<PathBuf>, output_root: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            output_root: output_root.into(),
        }
    }

    /// File name component of the input, as seen inside the container.
    pub fn input_file_name(&self) -> SeparatorResult<String> {
        self.input
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| SeparatorError::InvalidInput(self.input.clone()))
    }

    /// Input stem, which names the final output directory.
    pub fn input_stem(&self) -> SeparatorResult<String> {
        self.input
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .ok_or_else(|| SeparatorError::InvalidInput(self.input.clone()))
    }

    fn input_dir(&self) -> SeparatorResult<&Path> {
        self.input
            .parent()
            .ok_or_else(|| SeparatorError::InvalidInput(self.input.clone()))
    }
}

/// Run one separation job end to end: image and volume readiness, container
/// run, and output relocation.
///
/// Returns the relocation failures (empty on total success). Readiness and
/// container errors abort the call as the outer `Err`; an optional
/// cancellation signal aborts only the wait, not the container itself.
pub async fn run_separation(
    docker: &Docker,
    job: &SeparationJob,
    config: &SeparatorConfig,
    cancel: Option<watch::Receiver<bool>>,
) -> SeparatorResult<Vec<MoveFailure>> {
    let model = config.model;
    let image = model.image_spec(config);

    ensure_image(docker, &image).await?;
    ensure_volume(docker, model.volume_name()).await?;

    let container_id = create_container(docker, job, config, &image.reference).await?;

    docker
        .start_container(&container_id, None::<StartContainerOptions<String>>)
        .await?;
    info!(container = %container_id, model = model.name(), "Separation container started");

    wait_for_exit(docker, &container_id, cancel).await?;
    info!(container = %container_id, "Separation container finished");

    relocate_stems(&job.output_root, model.output_subdir(), &job.input_stem()?).await
}

async fn create_container(
    docker: &Docker,
    job: &SeparationJob,
    config: &SeparatorConfig,
    image: &str,
) -> SeparatorResult<String> {
    let model = config.model;

    let binds = vec![
        format!("{}:{}", job.input_dir()?.display(), crate::model::INPUT_MOUNT),
        format!("{}:{}", job.output_root.display(), crate::model::OUTPUT_MOUNT),
        format!("{}:{}", model.volume_name(), model.model_mount()),
    ];

    let device_requests = config.use_gpu.then(|| {
        vec![DeviceRequest {
            driver: Some("nvidia".to_string()),
            count: Some(-1),
            capabilities: Some(vec![vec!["gpu".to_string()]]),
            ..Default::default()
        }]
    });

    let cmd = model.command(&job.input_file_name()?, config);
    debug!(image = %image, cmd = ?cmd, binds = ?binds, "Creating separation container");

    let response = docker
        .create_container(
            None::<CreateContainerOptions<String>>,
            Config {
                image: Some(image.to_string()),
                env: Some(model.env()),
                cmd: Some(cmd),
                host_config: Some(HostConfig {
                    binds: Some(binds),
                    device_requests,
                    ..Default::default()
                }),
                ..Default::default()
            },
        )
        .await?;

    Ok(response.id)
}

/// Block until the container reaches a non-running state.
///
/// Errors surfacing on the wait stream are reported distinctly from
/// create/start failures. The cancellation signal aborts the wait only; the
/// container keeps running.
async fn wait_for_exit(
    docker: &Docker,
    container_id: &str,
    cancel: Option<watch::Receiver<bool>>,
) -> SeparatorResult<()> {
    let mut wait_stream = docker.wait_container(
        container_id,
        Some(WaitContainerOptions {
            condition: "not-running",
        }),
    );

    let next = match cancel {
        Some(mut cancel_rx) => {
            tokio::select! {
                next = wait_stream.next() => next,
                _ = cancelled(&mut cancel_rx) => {
                    info!(container = %container_id, "Wait cancelled, container left running");
                    return Err(SeparatorError::Cancelled);
                }
            }
        }
        None => wait_stream.next().await,
    };

    match next {
        Some(Ok(response)) => {
            if let Some(error) = response.error.and_then(|e| e.message) {
                return Err(SeparatorError::container_wait(error));
            }
            if response.status_code != 0 {
                return Err(SeparatorError::ContainerExited {
                    status_code: response.status_code,
                });
            }
            Ok(())
        }
        Some(Err(e)) => Err(SeparatorError::container_wait(e.to_string())),
        None => Err(SeparatorError::container_wait(
            "wait stream ended without a status",
        )),
    }
}

/// Resolves once the watch channel signals cancellation; pends forever if
/// the sender goes away without signalling.
async fn cancelled(cancel_rx: &mut watch::Receiver<bool>) {
    loop {
        if *cancel_rx.borrow() {
            return;
        }
        if cancel_rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
