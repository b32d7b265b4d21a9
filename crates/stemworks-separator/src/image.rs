//! Image readiness: exact-tag presence check, pull, and local build.

use bollard::image::{BuildImageOptions, CreateImageOptions, ListImagesOptions};
use bollard::Docker;
use futures::StreamExt;
use tracing::{debug, info, trace};

use crate::error::{SeparatorError, SeparatorResult};
use crate::model::{BuildSpec, ImageSpec};

/// Whether an image with exactly this reference is known locally.
pub async fn image_present(docker: &Docker, reference: &str) -> SeparatorResult<bool> {
    let images = docker
        .list_images(Some(ListImagesOptions::<String> {
            all: false,
            ..Default::default()
        }))
        .await?;

    Ok(images
        .iter()
        .any(|image| image.repo_tags.iter().any(|tag| tag == reference)))
}

/// Make `spec` present locally: no-op when the tag already exists, otherwise
/// build (when a build spec is attached) or pull.
pub async fn ensure_image(docker: &Docker, spec: &ImageSpec) -> SeparatorResult<()> {
    if image_present(docker, &spec.reference).await? {
        debug!(image = %spec.reference, "Image already present");
        return Ok(());
    }

    match &spec.build {
        Some(build) => build_image(docker, &spec.reference, build).await,
        None => pull_image(docker, &spec.reference).await,
    }
}

/// Pull an image, draining the progress stream to completion.
///
/// The stream must be consumed fully before proceeding; abandoning it while
/// the daemon is still writing risks a deadlock against its output buffering.
pub async fn pull_image(docker: &Docker, reference: &str) -> SeparatorResult<()> {
    info!(image = %reference, "Pulling image");

    let mut stream = docker.create_image(
        Some(CreateImageOptions {
            from_image: reference.to_string(),
            ..Default::default()
        }),
        None,
        None,
    );

    while let Some(progress) = stream.next().await {
        let info = progress?;
        if let Some(status) = info.status {
            trace!(image = %reference, "{}", status);
        }
    }

    info!(image = %reference, "Image pulled");
    Ok(())
}

/// Build an image from a local context directory.
///
/// The context is tarred in memory and streamed to the daemon; the build log
/// is consumed message by message, and any message carrying an `error` field
/// fails the build.
pub async fn build_image(
    docker: &Docker,
    reference: &str,
    build: &BuildSpec,
) -> SeparatorResult<()> {
    if !build.context.is_dir() {
        return Err(SeparatorError::BuildContextNotFound(build.context.clone()));
    }

    info!(image = %reference, context = %build.context.display(), "Building image");

    let context = build.context.clone();
    let tarball = tokio::task::spawn_blocking(move || -> std::io::Result<Vec<u8>> {
        let mut archive = tar::Builder::new(Vec::new());
        archive.append_dir_all(".", &context)?;
        archive.into_inner()
    })
    .await
    .map_err(|e| SeparatorError::internal(format!("tar task aborted: {}", e)))??;

    let options = BuildImageOptions {
        dockerfile: build.dockerfile.clone(),
        t: reference.to_string(),
        rm: true,
        ..Default::default()
    };

    let mut stream = docker.build_image(options, None, Some(tarball.into()));
    while let Some(message) = stream.next().await {
        let info = message?;
        if let Some(error) = info.error {
            return Err(SeparatorError::ImageBuildFailed {
                image: reference.to_string(),
                message: error,
            });
        }
        if let Some(line) = info.stream {
            let line = line.trim_end();
            if !line.is_empty() {
                trace!(image = %reference, "{}", line);
            }
        }
    }

    info!(image = %reference, "Image built");
    Ok(())
}
