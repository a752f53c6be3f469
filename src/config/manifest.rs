//! Project MANIFEST parsing and the Application model

use anyhow::Result;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::Path;
use std::sync::LazyLock;

use crate::config::settings::Settings;
use crate::utils::SdError;

/// File name looked up in the project directory
pub const MANIFEST_FILE: &str = "MANIFEST";

/// Longest name Kubernetes accepts for a DNS-1123 label
const MAX_NAME_LEN: usize = 63;

static NAME_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("valid name regex"));

static INVALID_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9-]+").expect("valid name regex"));

/// Container image tracked by an ImageStream
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Image {
    pub name: String,

    pub repo: String,

    /// Annotate the ImageStream tag with the supervisor commands
    #[serde(default, alias = "annotationCmds")]
    pub annotation_cmds: bool,
}

impl Image {
    pub fn new(name: impl Into<String>, repo: impl Into<String>, annotation_cmds: bool) -> Self {
        Self {
            name: name.into(),
            repo: repo.into(),
            annotation_cmds,
        }
    }
}

/// Environment variable injected into the application container
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnvVar {
    pub name: String,

    #[serde(default)]
    pub value: String,
}

/// The application being developed, as described by MANIFEST and the CLI
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Application {
    pub name: String,
    pub namespace: String,
    pub replicas: i32,
    pub port: i32,
    pub cpu: String,
    pub memory: String,
    pub env: Vec<EnvVar>,
    pub images: Vec<Image>,
}

impl Application {
    /// Fill unset fields from settings and put the default images first.
    /// A MANIFEST image sharing a default's name replaces that default.
    pub fn resolve_defaults(&mut self, settings: &Settings) {
        if self.port == 0 {
            self.port = settings.defaults.port;
        }
        if self.replicas == 0 {
            self.replicas = settings.defaults.replicas;
        }
        if self.cpu.is_empty() {
            self.cpu = settings.defaults.cpu.clone();
        }
        if self.memory.is_empty() {
            self.memory = settings.defaults.memory.clone();
        }

        let declared = std::mem::take(&mut self.images);
        let mut images = settings.images.all();
        for image in declared {
            match images.iter_mut().find(|existing| existing.name == image.name) {
                Some(existing) => *existing = image,
                None => images.push(image),
            }
        }
        self.images = images;
    }

    /// Reject images whose name cannot be used as an ImageStream name
    /// or which have no repository to import from
    pub fn validate_images(&self) -> Result<()> {
        for image in &self.images {
            if !is_valid_name(&image.name) {
                return Err(SdError::invalid_image(&image.name, "not a valid resource name").into());
            }
            if image.repo.trim().is_empty() {
                return Err(SdError::invalid_image(&image.name, "missing repo").into());
            }
        }
        Ok(())
    }

    /// Look up one of the application's images by name
    pub fn image(&self, name: &str) -> Option<&Image> {
        self.images.iter().find(|image| image.name == name)
    }
}

/// Parse the MANIFEST at `path`.
///
/// A missing or blank file yields `Application::default()`; a file that is
/// not valid YAML for an Application is an error.
pub fn parse_manifest(path: &Path) -> Result<Application> {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            crate::log_info!("No MANIFEST found at {}, using defaults", path.display());
            return Ok(Application::default());
        }
        Err(e) => {
            return Err(SdError::manifest_invalid(&path.display().to_string(), &e.to_string()).into());
        }
    };

    crate::log_info!("Parse MANIFEST of the project: {}", path.display());

    if content.trim().is_empty() {
        return Ok(Application::default());
    }

    let application: Application = serde_yaml::from_str(&content)
        .map_err(|e| SdError::manifest_invalid(&path.display().to_string(), &e.to_string()))?;

    tracing::debug!("MANIFEST: {:?}", application);
    Ok(application)
}

/// Whether `name` can be used as the name of the application's resources
pub fn is_valid_name(name: &str) -> bool {
    name.len() <= MAX_NAME_LEN && NAME_PATTERN.is_match(name)
}

/// Turn an arbitrary directory name into a valid application name
pub fn sanitize_name(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    let replaced = INVALID_NAME_CHARS.replace_all(&lowered, "-");
    let mut name: String = replaced.trim_matches('-').to_string();
    if name.len() > MAX_NAME_LEN {
        name.truncate(MAX_NAME_LEN);
        name = name.trim_end_matches('-').to_string();
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_manifest(content: &str) -> tempfile::NamedTempFile {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        temp.write_all(content.as_bytes()).unwrap();
        temp
    }

    #[test]
    fn test_missing_manifest_is_zero_value() {
        let dir = tempfile::tempdir().unwrap();
        let app = parse_manifest(&dir.path().join(MANIFEST_FILE)).unwrap();
        assert_eq!(app, Application::default());
        assert!(app.name.is_empty());
        assert!(app.images.is_empty());
    }

    #[test]
    fn test_blank_manifest_is_zero_value() {
        let temp = write_manifest("\n   \n");
        assert_eq!(parse_manifest(temp.path()).unwrap(), Application::default());
    }

    #[test]
    fn test_parse_manifest() {
        let temp = write_manifest(
            r#"
name: spring-boot-http
port: 9000
env:
  - name: SPRING_PROFILES_ACTIVE
    value: openshift
images:
  - name: postgres
    repo: quay.io/example/postgres
some_unknown_key: ignored
"#,
        );

        let app = parse_manifest(temp.path()).unwrap();
        assert_eq!(app.name, "spring-boot-http");
        assert_eq!(app.port, 9000);
        assert_eq!(app.replicas, 0);
        assert_eq!(app.env.len(), 1);
        assert_eq!(app.env[0].value, "openshift");
        assert_eq!(app.images, vec![Image::new("postgres", "quay.io/example/postgres", false)]);
    }

    #[test]
    fn test_malformed_manifest_is_error() {
        let temp = write_manifest("name: [unterminated\n  port: : :");
        let err = parse_manifest(temp.path()).unwrap_err();
        let typed = err.downcast_ref::<SdError>().unwrap();
        assert!(typed.message.contains("Failed to parse MANIFEST"));
    }

    #[test]
    fn test_wrong_field_type_is_error() {
        let temp = write_manifest("port: eighty\n");
        assert!(parse_manifest(temp.path()).is_err());
    }

    #[test]
    fn test_resolve_defaults() {
        let settings = Settings::default();
        let mut app = Application {
            name: "demo".to_string(),
            port: 9000,
            images: vec![
                Image::new("dev-s2i", "quay.io/custom/s2i", true),
                Image::new("postgres", "quay.io/example/postgres", false),
            ],
            ..Default::default()
        };

        app.resolve_defaults(&settings);

        assert_eq!(app.port, 9000);
        assert_eq!(app.replicas, 1);
        assert_eq!(app.cpu, "100m");
        let names: Vec<&str> = app.images.iter().map(|i| i.name.as_str()).collect();
        assert_eq!(names, vec!["copy-supervisord", "dev-s2i", "postgres"]);
        assert_eq!(app.image("dev-s2i").unwrap().repo, "quay.io/custom/s2i");
    }

    #[test]
    fn test_validate_images() {
        let settings = Settings::default();
        let mut app = Application::default();
        app.resolve_defaults(&settings);
        assert!(app.validate_images().is_ok());

        let mut bad_name = Application {
            images: vec![Image::new("Postgres DB", "quay.io/example/postgres", false)],
            ..Default::default()
        };
        bad_name.resolve_defaults(&settings);
        let err = bad_name.validate_images().unwrap_err();
        assert!(err.downcast_ref::<SdError>().unwrap().message.contains("Postgres DB"));

        let no_repo = Application {
            images: vec![Image::new("postgres", " ", false)],
            ..Default::default()
        };
        assert!(no_repo.validate_images().is_err());
    }

    #[test]
    fn test_unreadable_manifest_is_error() {
        // A directory in place of the file cannot be read
        let dir = tempfile::tempdir().unwrap();
        let err = parse_manifest(dir.path()).unwrap_err();
        let typed = err.downcast_ref::<SdError>().unwrap();
        assert!(typed.message.contains("Failed to parse MANIFEST"));
    }

    #[test]
    fn test_name_validation() {
        assert!(is_valid_name("spring-boot-http"));
        assert!(is_valid_name("a1"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Spring"));
        assert!(!is_valid_name("-leading"));
        assert!(!is_valid_name("under_score"));
        assert!(!is_valid_name(&"a".repeat(64)));
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("My_Spring Boot.App"), "my-spring-boot-app");
        assert_eq!(sanitize_name("--demo--"), "demo");
        assert_eq!(sanitize_name(&"x".repeat(80)).len(), 63);
        assert!(is_valid_name(&sanitize_name("Hello__World!")));
    }
}
