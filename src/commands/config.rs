//! `sd config`: show the effective settings

use anyhow::Result;

use crate::config::settings::Settings;

/// Print the settings in use as a config file
pub fn show() -> Result<()> {
    let settings = Settings::load();
    print!("{}", settings.to_config_file()?);
    Ok(())
}
