//! Named model-weight volumes.

use bollard::volume::{CreateVolumeOptions, ListVolumesOptions};
use bollard::Docker;
use tracing::{debug, info};

use crate::error::SeparatorResult;

/// Whether a volume with this exact name exists.
pub async fn volume_exists(docker: &Docker, name: &str) -> SeparatorResult<bool> {
    let response = docker
        .list_volumes(Some(ListVolumesOptions::<String>::default()))
        .await?;

    Ok(response
        .volumes
        .unwrap_or_default()
        .iter()
        .any(|volume| volume.name == name))
}

/// Create the named volume if it does not already exist.
///
/// Idempotent: calling twice never errors and never creates a duplicate.
pub async fn ensure_volume(docker: &Docker, name: &str) -> SeparatorResult<()> {
    if volume_exists(docker, name).await? {
        debug!(volume = %name, "Volume already exists");
        return Ok(());
    }

    docker
        .create_volume(CreateVolumeOptions {
            name: name.to_string(),
            ..Default::default()
        })
        .await?;

    info!(volume = %name, "Volume created");
    Ok(())
}
