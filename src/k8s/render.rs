//! Resource templates rendered with Tera
//!
//! The templates are compiled into the binary; each renders the YAML of one
//! cluster resource for an application (and, for ImageStreams, one image).

use anyhow::{Context as _, Result};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tera::{Context, Tera};

use crate::config::manifest::{Application, Image};
use crate::config::settings::Settings;
use crate::k8s::openshift::{DEV_LABEL_NAME, DEV_LABEL_VALUE};

/// Commands supervisord exposes inside the development pod
pub const SUPERVISOR_CMDS: &str = "run-java:/usr/local/s2i/run;run-node:/usr/libexec/s2i/run;compile-java:/usr/local/s2i/assemble;build:/deployments/buildapp";

/// The resource templates known to the renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    ImageStream,
    Service,
    Route,
    DeploymentConfig,
}

impl Template {
    pub const ALL: [Template; 4] = [
        Template::ImageStream,
        Template::Service,
        Template::Route,
        Template::DeploymentConfig,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Template::ImageStream => "imagestream",
            Template::Service => "service",
            Template::Route => "route",
            Template::DeploymentConfig => "deploymentconfig",
        }
    }

    fn source(&self) -> &'static str {
        match self {
            Template::ImageStream => include_str!("templates/imagestream.yaml.j2"),
            Template::Service => include_str!("templates/service.yaml.j2"),
            Template::Route => include_str!("templates/route.yaml.j2"),
            Template::DeploymentConfig => include_str!("templates/deploymentconfig.yaml.j2"),
        }
    }
}

/// Values a template can refer to
#[derive(Debug, Serialize)]
pub struct TemplateContext<'a> {
    pub application: &'a Application,
    /// Image being rendered; only set for ImageStreams
    pub image: Option<&'a Image>,
    pub supervisord: &'a Image,
    pub runtime: &'a Image,
    pub claim_name: &'a str,
    pub supervisor_cmds: &'static str,
    pub dev_label_name: &'static str,
    pub dev_label_value: &'static str,
}

impl<'a> TemplateContext<'a> {
    pub fn new(application: &'a Application, settings: &'a Settings) -> Self {
        // Prefer the application's copy so MANIFEST overrides reach the pod spec
        let supervisord = application
            .image(&settings.images.supervisord.name)
            .unwrap_or(&settings.images.supervisord);
        let runtime = application
            .image(&settings.images.runtime.name)
            .unwrap_or(&settings.images.runtime);

        Self {
            application,
            image: None,
            supervisord,
            runtime,
            claim_name: &settings.storage.claim_name,
            supervisor_cmds: SUPERVISOR_CMDS,
            dev_label_name: DEV_LABEL_NAME,
            dev_label_value: DEV_LABEL_VALUE,
        }
    }

    pub fn with_image(mut self, image: &'a Image) -> Self {
        self.image = Some(image);
        self
    }
}

/// Renders the embedded resource templates
pub struct TemplateRenderer {
    tera: Tera,
}

impl TemplateRenderer {
    pub fn new() -> Result<Self> {
        let mut tera = Tera::default();
        for template in Template::ALL {
            tera.add_raw_template(template.name(), template.source())
                .with_context(|| format!("Failed to load template {}", template.name()))?;
        }
        tracing::debug!("Loaded {} resource templates", Template::ALL.len());

        Ok(Self { tera })
    }

    /// Render a template to YAML text
    pub fn render(&self, template: Template, context: &TemplateContext<'_>) -> Result<String> {
        let context = Context::from_serialize(context).context("Failed to build template context")?;

        let rendered = self
            .tera
            .render(template.name(), &context)
            .with_context(|| format!("Failed to render template {}", template.name()))?;

        tracing::debug!("Rendered {} template:\n{}", template.name(), rendered);
        Ok(rendered)
    }

    /// Render a template and decode the YAML into a typed resource
    pub fn render_as<K: DeserializeOwned>(
        &self,
        template: Template,
        context: &TemplateContext<'_>,
    ) -> Result<K> {
        let yaml = self.render(template, context)?;
        serde_yaml::from_str(&yaml)
            .with_context(|| format!("Failed to parse the generated {} YAML", template.name()))
    }
}
