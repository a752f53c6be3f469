//! sd - scaffold a Spring Boot development environment on OpenShift

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{Shell, generate};
use snowdrop_dev::commands::setup::SetupOptions;
use snowdrop_dev::utils::{self, dryrun};
use std::io;

#[derive(Parser)]
#[command(name = "sd")]
#[command(author, version, about = "snowdrop's client tool", long_about = None)]
#[command(
    after_help = "Example:\n    # Scaffold the development environment of a Spring Boot project\n    cd spring-boot-project\n    sd init -n my-project\n    sd pod"
)]
struct Cli {
    /// Path to a kubeconfig, or a list of them to merge ($HOME/.kube/config). Only required if out-of-cluster.
    #[arg(short, long, global = true, env = "KUBECONFIG")]
    kubeconfig: Option<String>,

    /// The address of the Kubernetes API server. Overrides any value in kubeconfig.
    #[arg(long = "masterurl", global = true)]
    master_url: Option<String>,

    /// Namespace/project (defaults to the current project)
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Application name (defaults to the current directory name)
    #[arg(short, long, global = true)]
    application: Option<String>,

    /// Verbose output (can be used multiple times: -v, -vv)
    /// -v: DEBUG, -vv: TRACE
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Dry-run mode: look resources up but do not create any
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the ImageStreams, PVC, DeploymentConfig, Service and Route of the project
    Init,

    /// Set up if needed, wait for the development pod and print its name
    Pod,

    /// Print the effective configuration
    Config,

    /// Generate shell completion scripts
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: Shell,
    },

    /// Show version information
    Version,
}

impl Cli {
    fn setup_options(&self) -> SetupOptions {
        SetupOptions {
            kubeconfig: self.kubeconfig.clone(),
            master_url: self.master_url.clone(),
            namespace: self.namespace.clone(),
            application: self.application.clone(),
            dry_run: self.dry_run,
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    utils::init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        tracing::debug!("Error: {:?}", err);
        utils::display_error_and_exit(utils::enhance_error(err));
    }
}

async fn run(cli: Cli) -> Result<()> {
    if cli.dry_run {
        dryrun::announce();
    }

    let options = cli.setup_options();
    match cli.command {
        Commands::Init => snowdrop_dev::commands::init::init(options).await,
        Commands::Pod => snowdrop_dev::commands::pod::pod(options).await,
        Commands::Config => snowdrop_dev::commands::config::show(),
        Commands::Completion { shell } => handle_completion_command(shell),
        Commands::Version => handle_version_command(),
    }
}

fn handle_completion_command(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "sd", &mut io::stdout());
    Ok(())
}

fn handle_version_command() -> Result<()> {
    println!("sd {}", env!("CARGO_PKG_VERSION"));
    println!("Scaffold a Spring Boot development environment on OpenShift");
    Ok(())
}
