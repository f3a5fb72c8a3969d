use anyhow::Context;
use kickoff_core::catalog::CatalogFile;
use kickoff_core::config::Settings;
use kickoff_core::{io, paths};
use std::path::Path;

pub fn run(root: &Path) -> anyhow::Result<()> {
    println!("Initializing kickoff in: {}", root.display());

    for dir in [
        paths::KICKOFF_DIR,
        paths::AGENTS_DIR,
        paths::WORKFLOWS_DIR,
        paths::HOOKS_DIR,
    ] {
        let p = root.join(dir);
        io::ensure_dir(&p).with_context(|| format!("failed to create {}", p.display()))?;
    }

    if paths::settings_path(root).exists() {
        println!("  exists:  {}", paths::SETTINGS_FILE);
    } else {
        Settings::default()
            .save(root)
            .context("failed to write settings.yaml")?;
        println!("  created: {}", paths::SETTINGS_FILE);
    }

    if paths::catalog_path(root).exists() {
        println!("  exists:  {}", paths::CATALOG_FILE);
    } else {
        CatalogFile::builtin()
            .save(root)
            .context("failed to write catalog.yaml")?;
        println!("  created: {}", paths::CATALOG_FILE);
    }

    println!("\nNext: kickoff resolve --describe \"<what you are building>\"");
    Ok(())
}
