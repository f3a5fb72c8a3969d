use crate::output::{join_or_dash, print_json, print_table};
use crate::project::{load_engine, ProfileArgs};
use anyhow::Context;
use kickoff_core::catalog::Catalog;
use kickoff_core::resolution::ResolutionResult;
use std::path::Path;

pub fn run(root: &Path, args: ProfileArgs, json: bool) -> anyhow::Result<()> {
    let profile = args.to_profile()?;
    let engine = load_engine(root, args.strict)?;
    let result = engine
        .resolve_project_agents(&profile)
        .context("agent resolution failed")?;

    if json {
        return print_json(&result);
    }
    print_result(&result, engine.catalog());
    Ok(())
}

/// Text rendering shared with `generate`.
pub fn print_result(result: &ResolutionResult, catalog: &Catalog) {
    println!(
        "Domain: {}  Complexity: {}  Agents: {}",
        result.domain,
        result.complexity,
        result.ordered_agents.len()
    );
    println!();

    let rows: Vec<Vec<String>> = result
        .ordered_agents
        .iter()
        .enumerate()
        .map(|(i, id)| {
            let priority = catalog
                .lookup(id)
                .map_or_else(|| "-".to_string(), |agent| agent.priority.to_string());
            let requires = join_or_dash(result.dependencies_of(id));
            vec![(i + 1).to_string(), id.clone(), priority, requires]
        })
        .collect();
    print_table(&["#", "AGENT", "PRIORITY", "REQUIRES"], rows);

    if !result.removed_agents.is_empty() {
        println!("\nRemoved: {}", result.removed_agents.join(", "));
    }
    if !result.fallbacks.is_empty() {
        println!("\nFallbacks:");
        for record in &result.fallbacks {
            println!("  {}: {}", record.agent_id, record.outcome.summary());
        }
    }
    if !result.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &result.warnings {
            println!("  {warning}");
        }
    }

    println!("\nConfidence: {:.2}", result.confidence);
    if result.needs_manual_review {
        println!("Manual review recommended.");
    }
}
