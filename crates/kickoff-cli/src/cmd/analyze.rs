use crate::output::{join_or_dash, print_json};
use crate::project::ProfileArgs;

pub fn run(args: ProfileArgs, json: bool) -> anyhow::Result<()> {
    let profile = args.to_profile()?;
    profile.validate()?;

    if json {
        return print_json(&profile);
    }

    if let Some(name) = &profile.name {
        println!("Project:    {name}");
    }
    println!("Domain:     {}", profile.domain());
    println!("Complexity: {}", profile.complexity());
    println!("Stack:      {}", join_or_dash(&profile.technical.stack));

    let flags = profile.flags;
    let active: Vec<&str> = [
        (flags.cultural_requirements, "cultural"),
        (flags.payment_integration, "payments"),
        (flags.security_requirements, "security"),
    ]
    .into_iter()
    .filter_map(|(on, name)| on.then_some(name))
    .collect();
    println!("Flags:      {}", join_or_dash(active));
    Ok(())
}
