//! `sd pod`: set up if needed, then wait for the development pod

use anyhow::Result;
use kube::ResourceExt;

use crate::commands::setup::{self, SetupOptions};

/// Print the name of the ready development pod
pub async fn pod(options: SetupOptions) -> Result<()> {
    if options.dry_run {
        crate::log_warn!("Dry run: not waiting for a pod that was not created");
        setup::setup(&options).await?;
        return Ok(());
    }

    let (tool, pod) = setup::setup_and_wait_for_pod(&options).await?;
    crate::log_info!(
        "Development pod of '{}' is ready in namespace '{}'",
        tool.application.name,
        tool.application.namespace
    );
    println!("{}", pod.name_any());
    Ok(())
}
