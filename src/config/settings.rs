//! Configuration file support for snowdrop-dev

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::manifest::Image;

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize, Clone, Default, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub defaults: Defaults,

    #[serde(default)]
    pub storage: Storage,

    #[serde(default)]
    pub images: Images,
}

/// Values used when MANIFEST leaves a field unset
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Defaults {
    #[serde(default = "default_port")]
    pub port: i32,

    #[serde(default = "default_replicas")]
    pub replicas: i32,

    #[serde(default = "default_cpu")]
    pub cpu: String,

    #[serde(default = "default_memory")]
    pub memory: String,
}

/// Claim holding the Maven repository of the dev pod
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Storage {
    #[serde(default = "default_claim_name")]
    pub claim_name: String,

    #[serde(default = "default_claim_size")]
    pub size: String,
}

/// Images every development pod is built from
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Images {
    /// Init container image that carries the supervisord binaries
    #[serde(default = "default_supervisord_image")]
    pub supervisord: Image,

    /// Java S2I image running the application
    #[serde(default = "default_runtime_image")]
    pub runtime: Image,
}

// Default value functions
fn default_port() -> i32 {
    8080
}

fn default_replicas() -> i32 {
    1
}

fn default_cpu() -> String {
    "100m".to_string()
}

fn default_memory() -> String {
    "512Mi".to_string()
}

fn default_claim_name() -> String {
    "m2-data".to_string()
}

fn default_claim_size() -> String {
    "1Gi".to_string()
}

fn default_supervisord_image() -> Image {
    Image::new("copy-supervisord", "quay.io/snowdrop/supervisord", false)
}

fn default_runtime_image() -> Image {
    Image::new("dev-s2i", "quay.io/snowdrop/spring-boot-s2i", true)
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            port: default_port(),
            replicas: default_replicas(),
            cpu: default_cpu(),
            memory: default_memory(),
        }
    }
}

impl Default for Storage {
    fn default() -> Self {
        Self {
            claim_name: default_claim_name(),
            size: default_claim_size(),
        }
    }
}

impl Default for Images {
    fn default() -> Self {
        Self {
            supervisord: default_supervisord_image(),
            runtime: default_runtime_image(),
        }
    }
}

impl Images {
    /// Images provisioned for every application, supervisord first
    pub fn all(&self) -> Vec<Image> {
        vec![self.supervisord.clone(), self.runtime.clone()]
    }
}

impl Settings {
    /// Load settings from file or return defaults
    pub fn load() -> Self {
        match Self::find_config_file() {
            Some(path) => Self::load_from_file(&path).unwrap_or_else(|err| {
                crate::log_warn!("Ignoring config file: {:#}", err);
                Self::default()
            }),
            None => Self::default(),
        }
    }

    /// Load settings from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let settings: Settings = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        tracing::debug!("Loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Find config file in standard locations
    /// Priority:
    /// 1. .sd.toml in current directory
    /// 2. ~/.config/sd/config.toml (XDG config directory)
    fn find_config_file() -> Option<PathBuf> {
        let local_config = PathBuf::from(".sd.toml");
        if local_config.exists() {
            return Some(local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("sd").join("config.toml");
            if xdg_config.exists() {
                return Some(xdg_config);
            }
        }

        None
    }

    /// Render these settings as a commented config file
    pub fn to_config_file(&self) -> Result<String> {
        let header = "# sd configuration file\n\
                      # Place this file at ~/.config/sd/config.toml or .sd.toml in your project\n\n";
        let body = toml::to_string_pretty(self).context("Failed to serialize settings")?;
        Ok(format!("{}{}", header, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.defaults.port, 8080);
        assert_eq!(settings.storage.claim_name, "m2-data");
        assert_eq!(settings.storage.size, "1Gi");
        assert_eq!(settings.images.runtime.name, "dev-s2i");
        assert!(settings.images.runtime.annotation_cmds);
        assert!(!settings.images.supervisord.annotation_cmds);
    }

    #[test]
    fn test_settings_deserialization() {
        let toml_str = r#"
[defaults]
port = 9090

[storage]
size = "5Gi"

[images.runtime]
name = "dev-s2i"
repo = "registry.example.com/java-s2i"
annotation_cmds = true
"#;
        let settings: Settings = toml::from_str(toml_str).unwrap();
        assert_eq!(settings.defaults.port, 9090);
        assert_eq!(settings.defaults.replicas, 1);
        assert_eq!(settings.storage.size, "5Gi");
        assert_eq!(settings.storage.claim_name, "m2-data");
        assert_eq!(settings.images.runtime.repo, "registry.example.com/java-s2i");
        assert_eq!(settings.images.supervisord.name, "copy-supervisord");
    }

    #[test]
    fn test_config_file_round_trips() {
        let rendered = Settings::default().to_config_file().unwrap();
        assert!(rendered.starts_with("# sd configuration file"));
        assert!(rendered.contains("[storage]"));

        let parsed: Settings = toml::from_str(&rendered).unwrap();
        assert_eq!(parsed, Settings::default());
    }

    #[test]
    fn test_load_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Settings::load_from_file(&dir.path().join("nope.toml")).is_err());
    }
}
