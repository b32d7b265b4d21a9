//! Docker-gated integration tests.
//!
//! These talk to a real Docker daemon and skip silently when none is
//! reachable.

use bollard::Docker;

use stemworks_separator::{ensure_volume, image::image_present};

async fn connect() -> Option<Docker> {
    let docker = Docker::connect_with_local_defaults().ok()?;
    docker.ping().await.ok()?;
    Some(docker)
}

#[tokio::test]
async fn test_ensure_volume_is_idempotent() {
    let Some(docker) = connect().await else {
        return;
    };

    let name = format!("stemworks-test-{}", std::process::id());

    ensure_volume(&docker, &name).await.unwrap();
    // Second call must neither error nor duplicate.
    ensure_volume(&docker, &name).await.unwrap();

    let volumes = docker
        .list_volumes(None::<bollard::volume::ListVolumesOptions<String>>)
        .await
        .unwrap()
        .volumes
        .unwrap_or_default();
    let matching = volumes.iter().filter(|v| v.name == name).count();
    assert_eq!(matching, 1);

    docker.remove_volume(&name, None).await.unwrap();
}

#[tokio::test]
async fn test_image_presence_check_runs() {
    let Some(docker) = connect().await else {
        return;
    };

    // A reference nobody tags locally must simply come back absent.
    let present = image_present(&docker, "stemworks/does-not-exist:never")
        .await
        .unwrap();
    assert!(!present);
}
