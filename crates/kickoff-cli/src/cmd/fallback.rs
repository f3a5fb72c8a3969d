use crate::output::{join_or_dash, print_json};
use crate::project::{load_engine, ProfileArgs};
use kickoff_core::fallback::FallbackOutcome;
use kickoff_core::paths;
use std::path::Path;

pub fn run(root: &Path, agent: &str, args: ProfileArgs, json: bool) -> anyhow::Result<()> {
    paths::validate_slug(agent)?;
    let profile = args.to_profile()?;
    let engine = load_engine(root, false)?;
    let outcome = engine.fallback().handle_unavailable(agent, &profile);

    if json {
        let value = serde_json::json!({
            "agent": agent,
            "outcome": outcome,
        });
        return print_json(&value);
    }

    println!("Agent:    {agent}");
    println!("Strategy: {}", outcome.strategy());
    match &outcome {
        FallbackOutcome::AlternativeAgent {
            agent_id,
            capability_diff,
        } => {
            println!("Use:      {agent_id}");
            println!("Missing:  {}", join_or_dash(&capability_diff.missing));
            println!("Extra:    {}", join_or_dash(&capability_diff.extra));
        }
        FallbackOutcome::GenericAgent {
            agent_id,
            domain,
            capabilities,
            limitations,
        } => {
            println!("Use:      {agent_id} ({domain})");
            println!("Provides: {}", join_or_dash(capabilities));
            print_limitations(limitations);
        }
        FallbackOutcome::PartialFunctionality {
            features,
            limitations,
        } => {
            println!("Features: {}", join_or_dash(features));
            print_limitations(limitations);
        }
        FallbackOutcome::ManualEscalation {
            plan,
            urgency,
            estimated_effort,
        } => {
            println!("Urgency:  {urgency}");
            println!("Effort:   {estimated_effort}");
            println!("\nPlan:");
            for phase in plan {
                println!(
                    "  {:<15} {:>5.1}h  {}",
                    phase.name, phase.estimated_hours, phase.description
                );
            }
        }
    }
    Ok(())
}

fn print_limitations(limitations: &[String]) {
    if limitations.is_empty() {
        return;
    }
    println!("Limitations:");
    for limitation in limitations {
        println!("  - {limitation}");
    }
}
