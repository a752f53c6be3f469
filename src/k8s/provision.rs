//! Idempotent creation of the development resources

use anyhow::Result;
use colored::Colorize;
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, Service, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use kube::api::ObjectMeta;
use kube::{Resource, ResourceExt};
use std::collections::BTreeMap;
use std::fmt;

use crate::config::manifest::Application;
use crate::config::settings::Settings;
use crate::k8s::openshift::{DeploymentConfig, ImageStream, Route};
use crate::k8s::render::{Template, TemplateContext, TemplateRenderer};
use crate::k8s::store::{ClusterResource, ResourceStore};
use crate::utils::dryrun;

/// What happened to one resource during a provisioning pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Already present, left untouched
    Existing,
    Created,
    /// Would have been created (dry run)
    Planned,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceOutcome {
    pub kind: String,
    pub name: String,
    pub action: Action,
}

impl fmt::Display for ResourceOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = match self.action {
            Action::Existing => "=".dimmed(),
            Action::Created => "✓".green(),
            Action::Planned => "~".cyan(),
        };
        let verb = match self.action {
            Action::Existing => "already exists",
            Action::Created => "created",
            Action::Planned => "would be created",
        };
        write!(f, "{} {} '{}' {}", marker, self.kind, self.name, verb)
    }
}

/// A resource together with how it was obtained
#[derive(Debug, Clone)]
pub struct Provisioned<K> {
    pub resource: K,
    pub outcome: ResourceOutcome,
}

/// Creates the resources of a development environment that do not exist yet
pub struct Provisioner<'a, S> {
    store: &'a S,
    renderer: &'a TemplateRenderer,
    settings: &'a Settings,
    dry_run: bool,
}

impl<'a, S: ResourceStore> Provisioner<'a, S> {
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

    /// Look the resource up by name; build and create it only when missing
    async fn ensure<K, F>(&self, name: &str, build: F) -> Result<Provisioned<K>>
    where
        K: ClusterResource,
        F: FnOnce() -> Result<K>,
    {
        let kind = K::kind(&()).to_string();

        if let Some(existing) = self.store.find::<K>(name).await? {
            crate::log_info!("'{}' {} already exists, skipping", name, kind);
            return Ok(Provisioned {
                resource: existing,
                outcome: ResourceOutcome {
                    kind,
                    name: name.to_string(),
                    action: Action::Existing,
                },
            });
        }

        let resource = build()?;

        let (resource, action) = if self.dry_run {
            dryrun::log_manifest(&kind, name, &serde_yaml::to_string(&resource)?);
            (resource, Action::Planned)
        } else {
            let created = self.store.create(&resource).await?;
            crate::log_info!("Created {} '{}'", kind, name);
            (created, Action::Created)
        };

        Ok(Provisioned {
            resource,
            outcome: ResourceOutcome {
                kind,
                name: name.to_string(),
                action,
            },
        })
    }

    fn context<'c>(&'c self, app: &'c Application) -> TemplateContext<'c> {
        TemplateContext::new(app, self.settings)
    }

    /// One ImageStream per image of the application
    pub async fn ensure_image_streams(&self, app: &Application) -> Result<Vec<ResourceOutcome>> {
        let mut outcomes = Vec::with_capacity(app.images.len());
        for image in &app.images {
            let provisioned = self
                .ensure::<ImageStream, _>(&image.name, || {
                    let ctx = self.context(app).with_image(image);
                    self.renderer.render_as(Template::ImageStream, &ctx)
                })
                .await?;
            outcomes.push(provisioned.outcome);
        }
        Ok(outcomes)
    }

    /// Claim holding the Maven repository of the dev pod
    pub async fn ensure_pvc(&self, app: &Application) -> Result<ResourceOutcome> {
        let storage = &self.settings.storage;
        let provisioned = self
            .ensure::<PersistentVolumeClaim, _>(&storage.claim_name, || {
                Ok(build_pvc(&storage.claim_name, &storage.size, &app.name))
            })
            .await?;
        Ok(provisioned.outcome)
    }

    /// Create the DeploymentConfig, or return the one already there
    pub async fn ensure_deployment_config(
        &self,
        app: &Application,
    ) -> Result<Provisioned<DeploymentConfig>> {
        self.ensure::<DeploymentConfig, _>(&app.name, || {
            self.renderer
                .render_as(Template::DeploymentConfig, &self.context(app))
        })
        .await
    }

    /// Service in front of the DeploymentConfig's pods, owned by the DC
    pub async fn ensure_service(
        &self,
        app: &Application,
        dc: &DeploymentConfig,
    ) -> Result<ResourceOutcome> {
        let provisioned = self
            .ensure::<Service, _>(&app.name, || {
                let mut svc: Service = self
                    .renderer
                    .render_as(Template::Service, &self.context(app))?;
                if let Some(owner) = dc.controller_owner_ref(&()) {
                    svc.owner_references_mut().push(owner);
                }
                Ok(svc)
            })
            .await?;
        Ok(provisioned.outcome)
    }

    /// Route exposing the Service
    pub async fn ensure_route(&self, app: &Application) -> Result<Provisioned<Route>> {
        self.ensure::<Route, _>(&app.name, || {
            self.renderer.render_as(Template::Route, &self.context(app))
        })
        .await
    }
}

/// Build the Maven repository claim in code; it has no template
pub fn build_pvc(name: &str, size: &str, app_name: &str) -> PersistentVolumeClaim {
    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), app_name.to_string());

    let mut requests = BTreeMap::new();
    requests.insert("storage".to_string(), Quantity(size.to_string()));

    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            resources: Some(VolumeResourceRequirements {
                requests: Some(requests),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}
