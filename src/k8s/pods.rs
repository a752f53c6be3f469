//! Waiting for the development pod

use anyhow::{Result, anyhow};
use futures::{Stream, StreamExt};
use k8s_openapi::api::core::v1::Pod;
use kube::runtime::{WatchStreamExt, watcher};
use kube::{Api, Client, ResourceExt};
use std::fmt::Display;

use crate::utils::progress::WaitProgress;

/// Label OpenShift puts on the pods of a DeploymentConfig
pub fn dev_pod_selector(app_name: &str) -> String {
    format!("deploymentconfig={}", app_name)
}

/// A pod is usable once it runs and reports the Ready condition
pub fn is_pod_ready(pod: &Pod) -> bool {
    let Some(status) = &pod.status else {
        return false;
    };

    if status.phase.as_deref() != Some("Running") {
        return false;
    }

    status
        .conditions
        .as_ref()
        .is_some_and(|conds| conds.iter().any(|c| c.type_ == "Ready" && c.status == "True"))
}

fn phase(pod: &Pod) -> &str {
    pod.status
        .as_ref()
        .and_then(|s| s.phase.as_deref())
        .unwrap_or("Unknown")
}

/// Block until a pod of the application is running and ready.
/// There is no timeout; a watch error aborts the wait.
pub async fn wait_for_dev_pod(client: Client, namespace: &str, app_name: &str) -> Result<Pod> {
    let pods: Api<Pod> = Api::namespaced(client, namespace);
    let config = watcher::Config::default().labels(&dev_pod_selector(app_name));

    await_ready_pod(watcher(pods, config).applied_objects(), app_name).await
}

/// Consume pod updates until one is ready
pub async fn await_ready_pod<S, E>(updates: S, app_name: &str) -> Result<Pod>
where
    S: Stream<Item = Result<Pod, E>>,
    E: Display,
{
    let progress = WaitProgress::new(&format!("pod of '{}'", app_name), "ready");
    let mut stream = std::pin::pin!(updates);

    while let Some(update) = stream.next().await {
        let pod = update.map_err(|e| {
            progress.finish_error(&e.to_string());
            anyhow!("Pod watch error: {}", e)
        })?;

        if is_pod_ready(&pod) {
            progress.finish_success(&pod.name_any());
            return Ok(pod);
        }
        progress.update(&format!("{} ({})", pod.name_any(), phase(&pod)));
    }

    progress.finish_error("watch closed");
    Err(anyhow!("Pod watch ended before a pod of '{}' became ready", app_name))
}
