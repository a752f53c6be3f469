//! Error type with actionable suggestions

use colored::Colorize;
use thiserror::Error;

/// Error with suggestions
#[derive(Error, Debug)]
#[error("{message}")]
pub struct SdError {
    pub message: String,
    pub suggestions: Vec<String>,
}

impl SdError {
    /// Create a new error with no suggestions
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            suggestions: Vec::new(),
        }
    }

    /// Add a suggestion to the error
    pub fn suggest(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Print the error and its suggestions to stderr
    pub fn display(&self) {
        eprintln!("{} {}", "Error:".red().bold(), self.message);

        if !self.suggestions.is_empty() {
            eprintln!();
            eprintln!("{}", "Suggestions:".yellow().bold());
            for suggestion in &self.suggestions {
                eprintln!("  {} {}", "→".blue(), suggestion);
            }
        }
    }

    // Common error patterns

    /// Kubeconfig not found
    pub fn kubeconfig_not_found(path: &str) -> Self {
        Self::new(format!("Kubeconfig not found: {}", path))
            .suggest("Log in to your cluster first, e.g.: oc login <cluster-url>")
            .suggest("Use --kubeconfig (or KUBECONFIG) to point at another file")
    }

    /// MANIFEST exists but could not be decoded
    pub fn manifest_invalid(path: &str, reason: &str) -> Self {
        Self::new(format!("Failed to parse MANIFEST {}: {}", path, reason))
            .suggest("Check that the file is valid YAML")
            .suggest("Example:\n      name: my-app\n      port: 8080\n      env:\n        - name: SPRING_PROFILES_ACTIVE\n          value: dev")
    }

    /// Application name is not a valid resource name
    pub fn invalid_application_name(name: &str) -> Self {
        Self::new(format!(
            "'{}' is not a valid application name (lower-case letters, digits and '-', at most 63 characters)",
            name
        ))
        .suggest("Pass a different name with --application")
        .suggest("Or change the 'name' field of MANIFEST")
    }

    /// Image declared in MANIFEST has an unusable name or repository
    pub fn invalid_image(name: &str, reason: &str) -> Self {
        Self::new(format!("Invalid image '{}' in MANIFEST: {}", name, reason))
            .suggest("Image names must be lower-case letters, digits and '-', at most 63 characters")
            .suggest("Each image needs a 'repo', e.g. quay.io/example/postgres")
    }

    /// Not authenticated against the cluster
    pub fn not_logged_in() -> Self {
        Self::new("Not logged into an OpenShift cluster")
            .suggest("Log in with: oc login <cluster-url>")
            .suggest("Verify credentials and cluster accessibility")
    }

    /// Permission denied error
    pub fn permission_denied(operation: &str) -> Self {
        Self::new(format!("Permission denied: {}", operation))
            .suggest("Verify you can create resources in the target namespace")
            .suggest("Select another project with --namespace")
    }

    /// Connection error
    pub fn cluster_unreachable() -> Self {
        Self::new("Unable to reach the cluster API server")
            .suggest("Check that the cluster is running and reachable")
            .suggest("Override the server address with --masterurl")
    }
}

/// Helper to display error and exit
pub fn display_error_and_exit(error: SdError) -> ! {
    error.display();
    std::process::exit(1);
}

/// Convert an anyhow error to SdError, keeping one that is already typed
pub fn enhance_error(err: anyhow::Error) -> SdError {
    let err = match err.downcast::<SdError>() {
        Ok(typed) => return typed,
        Err(err) => err,
    };

    let err_str = format!("{:#}", err);
    let lowered = err_str.to_lowercase();

    if lowered.contains("unauthorized") {
        return SdError::not_logged_in();
    }

    if lowered.contains("forbidden") {
        return SdError::permission_denied(&err_str);
    }

    if lowered.contains("connection refused") || lowered.contains("dns error") {
        return SdError::cluster_unreachable();
    }

    SdError::new(err_str).suggest("Run with -v for more details")
}
