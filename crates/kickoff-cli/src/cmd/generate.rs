use crate::output::print_json;
use crate::project::{load_engine, ProfileArgs};
use anyhow::Context;
use kickoff_core::scaffold::{write_bundle, ConfigBundle};
use std::path::Path;

pub fn run(root: &Path, args: ProfileArgs, json: bool) -> anyhow::Result<()> {
    let mut profile = args.to_profile()?;
    if profile.name.is_none() {
        profile.name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned());
    }

    let engine = load_engine(root, args.strict)?;
    let result = engine
        .resolve_project_agents(&profile)
        .context("agent resolution failed")?;

    let bundle = ConfigBundle::from_resolution(&profile, &result, engine.catalog());
    let written = write_bundle(root, &bundle).context("failed to write bundle")?;

    if json {
        let files: Vec<String> = written
            .iter()
            .map(|p| p.strip_prefix(root).unwrap_or(p.as_path()).display().to_string())
            .collect();
        let value = serde_json::json!({
            "result": result,
            "files": files,
        });
        return print_json(&value);
    }

    super::resolve::print_result(&result, engine.catalog());
    println!("\nWrote {} file(s):", written.len());
    for path in &written {
        println!("  {}", path.strip_prefix(root).unwrap_or(path.as_path()).display());
    }
    Ok(())
}
