//! `sd init`: set up the development environment of the current project

use anyhow::Result;
use colored::Colorize;

use crate::commands::setup::{self, SetupOptions, SetupPath, Tool};

/// Run the setup and print what it did
pub async fn init(options: SetupOptions) -> Result<()> {
    let tool = setup::setup(&options).await?;
    print_summary(&tool);
    Ok(())
}

fn print_summary(tool: &Tool) {
    let app = &tool.application;

    println!();
    println!(
        "{} {} ({})",
        "Application:".bold(),
        app.name,
        format!("namespace {}", app.namespace).dimmed()
    );
    println!("{} {}", "Kubeconfig:".bold(), tool.kube.display_paths());

    match &tool.path {
        SetupPath::Reused => {
            println!(
                "{}",
                "Existing development DeploymentConfig found, nothing to create".green()
            );
        }
        SetupPath::Provisioned(report) => {
            println!();
            for outcome in &report.outcomes {
                println!("  {}", outcome);
            }
            if let Some(url) = &report.route_url {
                println!();
                println!("{} {}", "Route:".bold(), url.cyan());
            }
        }
    }

    println!();
    println!("To wait for the development pod:");
    println!("  sd pod -n {}", app.namespace);
}
