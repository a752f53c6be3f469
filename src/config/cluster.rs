//! Cluster access configuration: kubeconfig location, REST config and client

use anyhow::{Context, Result};
use kube::Client;
use kube::config::{KubeConfigOptions, Kubeconfig};
use std::path::PathBuf;

use crate::utils::SdError;

/// Where to find cluster credentials and which API server to talk to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KubeSettings {
    /// Kubeconfig files, merged in order like kubectl does
    pub configs: Vec<PathBuf>,
    pub master_url: Option<String>,
}

impl KubeSettings {
    /// Use the explicit kubeconfig list if given, else `$HOME/.kube/config`
    pub fn resolve(kubeconfig: Option<&str>, master_url: Option<&str>) -> Result<Self> {
        crate::log_info!("Get K8s config file");
        let mut configs: Vec<PathBuf> = kubeconfig
            .map(|value| {
                std::env::split_paths(value)
                    .filter(|path| !path.as_os_str().is_empty())
                    .collect()
            })
            .unwrap_or_default();
        if configs.is_empty() {
            configs.push(home_kube_path()?);
        }

        let settings = Self {
            configs,
            master_url: master_url.filter(|url| !url.is_empty()).map(String::from),
        };
        tracing::debug!("Kubeconfig: {:?}", settings);
        Ok(settings)
    }

    /// The kubeconfig files as a `KUBECONFIG`-style list
    pub fn display_paths(&self) -> String {
        std::env::join_paths(&self.configs)
            .map(|joined| joined.to_string_lossy().into_owned())
            .unwrap_or_else(|_| {
                self.configs
                    .iter()
                    .map(|path| path.display().to_string())
                    .collect::<Vec<_>>()
                    .join(", ")
            })
    }

    /// Read and merge the kubeconfig files. Missing or empty entries of a
    /// list are skipped; at least one file must exist.
    pub fn kubeconfig(&self) -> Result<Kubeconfig> {
        let existing: Vec<&PathBuf> = self.configs.iter().filter(|path| path.is_file()).collect();
        if existing.is_empty() {
            return Err(SdError::kubeconfig_not_found(&self.display_paths()).into());
        }
        for missing in self.configs.iter().filter(|path| !path.is_file()) {
            crate::log_warn!("Skipping missing kubeconfig {}", missing.display());
        }

        existing.into_iter().try_fold(Kubeconfig::default(), |merged, path| {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Error reading kubeconfig {}", path.display()))?;
            if content.trim().is_empty() {
                tracing::debug!("Skipping empty kubeconfig {}", path.display());
                return Ok(merged);
            }

            let next = Kubeconfig::read_from(path)
                .with_context(|| format!("Error reading kubeconfig {}", path.display()))?;
            merged
                .merge(next)
                .with_context(|| format!("Error merging kubeconfig {}", path.display()))
        })
    }

    /// Build the client configuration from the kubeconfig files
    pub async fn rest_config(&self) -> Result<kube::Config> {
        crate::log_info!("Create k8s REST config using the developer's machine config file");

        let kubeconfig = self.kubeconfig()?;
        let mut config = kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .context("Error building kubeconfig")?;

        if let Some(url) = &self.master_url {
            config.cluster_url = url
                .parse()
                .with_context(|| format!("Invalid master URL: {}", url))?;
        }

        Ok(config)
    }

    /// Build the REST config and a client from it.
    /// Returns the client together with the namespace of the current context.
    pub async fn client(&self) -> Result<(Client, String)> {
        let config = self.rest_config().await?;
        let namespace = config.default_namespace.clone();

        crate::log_info!("Create k8s client");
        let client = Client::try_from(config).context("Error building kubernetes client")?;
        Ok((client, namespace))
    }
}

/// Default kubeconfig location under the user's home directory
pub fn home_kube_path() -> Result<PathBuf> {
    let home = dirs::home_dir().context("Unable to determine the home directory")?;
    Ok(home.join(".kube").join("config"))
}

/// Namespace priority: explicit flag > MANIFEST > kubeconfig context
pub fn resolve_namespace(flag: Option<&str>, manifest: &str, context_default: &str) -> String {
    if let Some(ns) = flag.filter(|ns| !ns.is_empty()) {
        return ns.to_string();
    }
    if !manifest.is_empty() {
        return manifest.to_string();
    }
    context_default.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
  - name: dev-cluster
    cluster:
      server: https://127.0.0.1:6443
      insecure-skip-tls-verify: true
contexts:
  - name: dev
    context:
      cluster: dev-cluster
      user: developer
      namespace: my-project
current-context: dev
users:
  - name: developer
    user:
      token: sha256~not-a-real-token
"#;

    const OTHER_KUBECONFIG: &str = r#"
apiVersion: v1
kind: Config
clusters:
  - name: prod-cluster
    cluster:
      server: https://10.0.0.1:8443
contexts:
  - name: prod
    context:
      cluster: prod-cluster
      user: admin
      namespace: prod-project
current-context: prod
users:
  - name: admin
    user:
      token: sha256~other-token
"#;

    fn write_file(content: &str) -> tempfile::NamedTempFile {
        let mut temp = tempfile::NamedTempFile::new().unwrap();
        temp.write_all(content.as_bytes()).unwrap();
        temp
    }

    fn write_kubeconfig() -> tempfile::NamedTempFile {
        write_file(KUBECONFIG)
    }

    fn path_list(paths: &[&std::path::Path]) -> String {
        std::env::join_paths(paths)
            .unwrap()
            .into_string()
            .unwrap()
    }

    #[test]
    fn test_resolve_explicit_path() {
        let settings = KubeSettings::resolve(Some("/tmp/kc"), Some("https://api:6443")).unwrap();
        assert_eq!(settings.configs, vec![PathBuf::from("/tmp/kc")]);
        assert_eq!(settings.master_url.as_deref(), Some("https://api:6443"));
    }

    #[test]
    fn test_resolve_falls_back_to_home() {
        let settings = KubeSettings::resolve(None, Some("")).unwrap();
        assert_eq!(settings.configs.len(), 1);
        assert!(settings.configs[0].ends_with(".kube/config"));
        assert!(settings.master_url.is_none());

        let empty_flag = KubeSettings::resolve(Some(""), None).unwrap();
        assert_eq!(empty_flag.configs, settings.configs);
    }

    #[tokio::test]
    async fn test_rest_config_reads_context_namespace() {
        let temp = write_kubeconfig();
        let settings = KubeSettings::resolve(temp.path().to_str(), None).unwrap();

        let config = settings.rest_config().await.unwrap();
        assert_eq!(config.default_namespace, "my-project");
        assert_eq!(config.cluster_url.host(), Some("127.0.0.1"));
        assert_eq!(config.cluster_url.port_u16(), Some(6443));
    }

    #[test]
    fn test_master_url_overrides_server() {
        let temp = write_kubeconfig();
        let settings =
            KubeSettings::resolve(temp.path().to_str(), Some("https://api.example.com:8443")).unwrap();

        let config = tokio_test::block_on(settings.rest_config()).unwrap();
        assert_eq!(config.cluster_url.host(), Some("api.example.com"));
        assert_eq!(config.cluster_url.port_u16(), Some(8443));
    }

    #[tokio::test]
    async fn test_missing_kubeconfig_is_typed_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("config");
        let settings = KubeSettings::resolve(missing.to_str(), None).unwrap();

        let err = settings.rest_config().await.unwrap_err();
        assert!(err.downcast_ref::<SdError>().is_some());
    }

    #[tokio::test]
    async fn test_kubeconfig_list_is_merged() {
        let first = write_kubeconfig();
        let second = write_file(OTHER_KUBECONFIG);
        let list = path_list(&[first.path(), second.path()]);

        let settings = KubeSettings::resolve(Some(&list), None).unwrap();
        assert_eq!(settings.configs.len(), 2);
        assert_eq!(settings.display_paths(), list);

        let merged = settings.kubeconfig().unwrap();
        assert_eq!(merged.current_context.as_deref(), Some("dev"));
        assert_eq!(merged.contexts.len(), 2);
        assert_eq!(merged.clusters.len(), 2);

        // The first file's current context wins
        let config = settings.rest_config().await.unwrap();
        assert_eq!(config.default_namespace, "my-project");
        assert_eq!(config.cluster_url.host(), Some("127.0.0.1"));
    }

    #[tokio::test]
    async fn test_kubeconfig_list_with_empty_file() {
        let first = write_kubeconfig();
        let empty = write_file("");
        let list = path_list(&[first.path(), empty.path()]);

        let settings = KubeSettings::resolve(Some(&list), None).unwrap();
        let config = settings.rest_config().await.unwrap();
        assert_eq!(config.default_namespace, "my-project");
    }

    #[test]
    fn test_kubeconfig_list_skips_missing_entries() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("missing");
        let present = write_kubeconfig();
        let list = path_list(&[missing.as_path(), present.path()]);

        let settings = KubeSettings::resolve(Some(&list), None).unwrap();
        let merged = settings.kubeconfig().unwrap();
        assert_eq!(merged.current_context.as_deref(), Some("dev"));

        let all_missing = path_list(&[missing.as_path(), dir.path().join("other").as_path()]);
        let err = KubeSettings::resolve(Some(&all_missing), None)
            .unwrap()
            .kubeconfig()
            .unwrap_err();
        let typed = err.downcast_ref::<SdError>().unwrap();
        assert!(typed.message.contains("missing"));
    }

    #[test]
    fn test_namespace_priority() {
        assert_eq!(resolve_namespace(Some("flag"), "manifest", "ctx"), "flag");
        assert_eq!(resolve_namespace(None, "manifest", "ctx"), "manifest");
        assert_eq!(resolve_namespace(Some(""), "", "ctx"), "ctx");
    }
}
