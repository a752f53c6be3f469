//! Dry-run mode output

use colored::Colorize;

/// Log a dry-run action
pub fn log_action(action: &str) {
    println!("  {} {}", "[DRY RUN]".cyan().bold(), action);
}

/// Print a manifest that would have been submitted
pub fn log_manifest(kind: &str, name: &str, yaml: &str) {
    log_action(&format!("Would create {} '{}'", kind, name));
    println!("---");
    print!("{}", yaml);
    if !yaml.ends_with('\n') {
        println!();
    }
}

/// Banner shown once at startup
pub fn announce() {
    println!(
        "{}",
        "DRY RUN MODE: resources are looked up but nothing is created"
            .cyan()
            .bold()
    );
    println!();
}
