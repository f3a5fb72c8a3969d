use crate::output::print_json;
use anyhow::Context;
use clap::Subcommand;
use kickoff_core::catalog::CatalogFile;
use kickoff_core::config::{ConfigWarning, Settings, WarnLevel};
use std::path::Path;

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Validate settings and the catalog for common mistakes
    Validate,

    /// Print the effective settings
    Show,
}

pub fn run(root: &Path, subcmd: ConfigSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        ConfigSubcommand::Validate => validate(root, json),
        ConfigSubcommand::Show => show(root, json),
    }
}

fn validate(root: &Path, json: bool) -> anyhow::Result<()> {
    let settings = Settings::load(root).context("failed to load settings")?;
    let file = CatalogFile::load_or_builtin(root).context("failed to load catalog")?;
    let catalog = file.catalog().context("invalid catalog")?;

    let mut warnings: Vec<ConfigWarning> = settings.validate();
    warnings.extend(catalog.validate());
    warnings.extend(file.fallback_tables().validate(&catalog));

    if json {
        let value = serde_json::json!({
            "warnings": warnings,
        });
        print_json(&value)?;
    } else if warnings.is_empty() {
        println!("Config is valid. No warnings.");
    } else {
        for w in &warnings {
            let prefix = match w.level {
                WarnLevel::Warning => "warning",
                WarnLevel::Error => "error",
            };
            println!("[{prefix}] {}", w.message);
        }
    }

    if warnings.iter().any(|w| w.level == WarnLevel::Error) {
        anyhow::bail!("config validation found errors");
    }
    Ok(())
}

fn show(root: &Path, json: bool) -> anyhow::Result<()> {
    let settings = Settings::load(root).context("failed to load settings")?;
    if json {
        return print_json(&settings);
    }
    print!("{}", serde_yaml::to_string(&settings)?);
    Ok(())
}
