use crate::output::{join_or_dash, print_json, print_table};
use anyhow::Context;
use clap::Subcommand;
use kickoff_core::catalog::{AgentDescriptor, CatalogFile};
use std::path::Path;

// ---------------------------------------------------------------------------
// Subcommand types
// ---------------------------------------------------------------------------

#[derive(Subcommand)]
pub enum AgentsSubcommand {
    /// List catalog agents
    List {
        /// Only agents providing this capability
        #[arg(long)]
        capability: Option<String>,
    },

    /// Show one agent
    Show { id: String },
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub fn run(root: &Path, subcmd: AgentsSubcommand, json: bool) -> anyhow::Result<()> {
    let file = CatalogFile::load_or_builtin(root).context("failed to load catalog")?;
    let catalog = file.catalog().context("invalid catalog")?;

    match subcmd {
        AgentsSubcommand::List { capability } => {
            let agents: Vec<&AgentDescriptor> = match &capability {
                Some(cap) => catalog
                    .iter()
                    .filter(|a| a.provides.contains(cap))
                    .collect(),
                None => catalog.iter().collect(),
            };
            list(&agents, json)
        }
        AgentsSubcommand::Show { id } => {
            let agent = catalog
                .lookup(&id)
                .with_context(|| format!("agent '{id}' is not in the catalog"))?;
            show(agent, json)
        }
    }
}

fn list(agents: &[&AgentDescriptor], json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(&agents);
    }
    if agents.is_empty() {
        println!("No agents.");
        return Ok(());
    }
    let rows = agents
        .iter()
        .map(|a| {
            vec![
                a.id.clone(),
                a.priority.to_string(),
                join_or_dash(&a.requires),
                join_or_dash(&a.provides),
            ]
        })
        .collect();
    print_table(&["ID", "PRIORITY", "REQUIRES", "PROVIDES"], rows);
    Ok(())
}

fn show(agent: &AgentDescriptor, json: bool) -> anyhow::Result<()> {
    if json {
        return print_json(agent);
    }
    println!("Agent:     {}", agent.id);
    if let Some(desc) = &agent.description {
        println!("Desc:      {desc}");
    }
    println!("Priority:  {}", agent.priority);
    println!("Requires:  {}", join_or_dash(&agent.requires));
    println!("Conflicts: {}", join_or_dash(&agent.conflicts));
    println!("Provides:  {}", join_or_dash(&agent.provides));
    Ok(())
}
