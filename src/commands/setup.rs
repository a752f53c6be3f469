//! Setup shared by every command: resolve the application and make sure its
//! development resources exist on the cluster

use anyhow::{Context, Result};
use k8s_openapi::api::core::v1::Pod;
use std::path::Path;

use crate::config::cluster::{KubeSettings, resolve_namespace};
use crate::config::manifest::{self, Application, MANIFEST_FILE};
use crate::config::settings::Settings;
use crate::k8s::openshift::{DeploymentConfig, dev_label_selector};
use crate::k8s::pods;
use crate::k8s::provision::{Provisioner, ResourceOutcome};
use crate::k8s::render::TemplateRenderer;
use crate::k8s::store::{KubeStore, ResourceStore};
use crate::utils::SdError;

/// Global options shared by the commands
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    pub kubeconfig: Option<String>,
    pub master_url: Option<String>,
    pub namespace: Option<String>,
    pub application: Option<String>,
    pub dry_run: bool,
}

/// Where the application name came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameSource {
    Flag,
    Manifest,
    Directory,
}

/// Resources touched by a provisioning pass
#[derive(Debug, Clone, Default)]
pub struct ProvisionReport {
    pub outcomes: Vec<ResourceOutcome>,
    pub route_url: Option<String>,
}

/// Which of the two setup paths was taken
#[derive(Debug, Clone)]
pub enum SetupPath {
    /// A labelled DeploymentConfig existed; nothing was provisioned
    Reused,
    Provisioned(ProvisionReport),
}

/// Everything a command needs once setup is done
pub struct Tool {
    pub application: Application,
    pub kube: KubeSettings,
    pub store: KubeStore,
    pub path: SetupPath,
}

/// Application name priority: explicit flag > MANIFEST > directory name
pub fn resolve_application_name(
    flag: Option<&str>,
    manifest_name: &str,
    working_dir: &Path,
) -> Result<(String, NameSource)> {
    if let Some(name) = flag.filter(|n| !n.is_empty()) {
        if !manifest::is_valid_name(name) {
            return Err(SdError::invalid_application_name(name).into());
        }
        return Ok((name.to_string(), NameSource::Flag));
    }

    if !manifest_name.is_empty() {
        if !manifest::is_valid_name(manifest_name) {
            return Err(SdError::invalid_application_name(manifest_name).into());
        }
        return Ok((manifest_name.to_string(), NameSource::Manifest));
    }

    let directory = working_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = manifest::sanitize_name(&directory);
    if name.is_empty() {
        return Err(SdError::invalid_application_name(&directory).into());
    }
    Ok((name, NameSource::Directory))
}

/// Decides between reuse and provisioning, and runs the provisioning steps
pub struct Orchestrator<'a, S> {
    store: &'a S,
    renderer: &'a TemplateRenderer,
    settings: &'a Settings,
    dry_run: bool,
}

impl<'a, S: ResourceStore> Orchestrator<'a, S> {
    pub fn new(
        store: &'a S,
        renderer: &'a TemplateRenderer,
        settings: &'a Settings,
        dry_run: bool,
    ) -> Self {
        Self {
            store,
            renderer,
            settings,
            dry_run,
        }
    }

    /// Reuse an existing development DeploymentConfig, or set everything up
    pub async fn finish_setup(
        &self,
        application: &mut Application,
        explicit_name: Option<&str>,
        working_dir: &Path,
    ) -> Result<SetupPath> {
        let selector = dev_label_selector();
        let existing = self
            .store
            .names_labeled::<DeploymentConfig>(&selector)
            .await?;

        if let Some(dc_name) = existing.first() {
            crate::log_info!(
                "Using application name '{}' from the existing DeploymentConfig labeled with '{}'",
                dc_name,
                selector
            );
            application.name = dc_name.clone();
            return Ok(SetupPath::Reused);
        }

        crate::log_info!("Setting up the development pod");

        let (name, source) =
            resolve_application_name(explicit_name, &application.name, working_dir)?;
        match source {
            NameSource::Flag => crate::log_info!("Using explicit application name '{}'", name),
            NameSource::Manifest => crate::log_info!(
                "Using application name '{}' that was set in {}",
                name,
                MANIFEST_FILE
            ),
            NameSource::Directory => crate::log_info!(
                "Using (default) application name '{}' which is the name of the project's directory",
                name
            ),
        }
        application.name = name;

        let report = self.provision(application).await?;
        Ok(SetupPath::Provisioned(report))
    }

    /// ImageStreams, PVC, DeploymentConfig, Service, Route; in that order
    pub async fn provision(&self, application: &Application) -> Result<ProvisionReport> {
        let provisioner = Provisioner::new(self.store, self.renderer, self.settings, self.dry_run);
        let mut outcomes = Vec::new();

        crate::log_info!("Create ImageStreams for Supervisord and Java S2I Image of SpringBoot");
        outcomes.extend(provisioner.ensure_image_streams(application).await?);

        crate::log_info!("Create PVC to store m2 repo");
        outcomes.push(provisioner.ensure_pvc(application).await?);

        crate::log_info!("Create or retrieve DeploymentConfig using Supervisord and Java S2I Image");
        let dc = provisioner.ensure_deployment_config(application).await?;
        outcomes.push(dc.outcome);

        crate::log_info!("Create Service using Template");
        outcomes.push(provisioner.ensure_service(application, &dc.resource).await?);

        crate::log_info!("Create Route using Template");
        let route = provisioner.ensure_route(application).await?;
        outcomes.push(route.outcome);

        Ok(ProvisionReport {
            outcomes,
            route_url: route.resource.url(),
        })
    }
}

/// Parse MANIFEST, connect to the cluster and finish the setup
pub async fn setup(options: &SetupOptions) -> Result<Tool> {
    let working_dir = std::env::current_dir().context("Unable to read the current directory")?;

    let mut application = manifest::parse_manifest(&working_dir.join(MANIFEST_FILE))?;
    let settings = Settings::load();
    application.resolve_defaults(&settings);
    application.validate_images()?;

    let kube = KubeSettings::resolve(options.kubeconfig.as_deref(), options.master_url.as_deref())?;
    let (client, context_namespace) = kube.client().await?;

    application.namespace = resolve_namespace(
        options.namespace.as_deref(),
        &application.namespace,
        &context_namespace,
    );
    crate::log_info!("Using '{}' namespace", application.namespace);

    let store = KubeStore::new(client, application.namespace.clone());
    let renderer = TemplateRenderer::new()?;

    let path = Orchestrator::new(&store, &renderer, &settings, options.dry_run)
        .finish_setup(
            &mut application,
            options.application.as_deref(),
            &working_dir,
        )
        .await?;

    Ok(Tool {
        application,
        kube,
        store,
        path,
    })
}

/// Setup, then block until the development pod is ready
pub async fn setup_and_wait_for_pod(options: &SetupOptions) -> Result<(Tool, Pod)> {
    let tool = setup(options).await?;

    crate::log_info!("Wait till the dev pod is available");
    let pod = pods::wait_for_dev_pod(
        tool.store.client().clone(),
        tool.store.namespace(),
        &tool.application.name,
    )
    .await?;

    Ok((tool, pod))
}
