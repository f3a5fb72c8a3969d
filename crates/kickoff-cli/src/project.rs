use anyhow::Context;
use clap::Args;
use kickoff_core::analysis;
use kickoff_core::catalog::CatalogFile;
use kickoff_core::config::Settings;
use kickoff_core::profile::ProjectProfile;
use kickoff_core::selection::{RejectLowConfidence, SelectionEngine};
use kickoff_core::types::{Complexity, Domain};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Profile inputs shared by every command that resolves agents.
///
/// A brief file or description is read first; explicit flags then override
/// or extend what it produced.
#[derive(Args, Debug, Default)]
pub struct ProfileArgs {
    /// Brief file (YAML, or JSON by extension)
    #[arg(long, value_name = "PATH", conflicts_with = "describe")]
    pub brief: Option<PathBuf>,

    /// Free-text project description to classify
    #[arg(long, value_name = "TEXT")]
    pub describe: Option<String>,

    /// Project name
    #[arg(long)]
    pub name: Option<String>,

    /// Project domain (marketplace, ecommerce, saas, fintech, ...)
    #[arg(long)]
    pub domain: Option<String>,

    /// Complexity: simple, moderate, complex, very-complex
    #[arg(long)]
    pub complexity: Option<String>,

    /// Technology stack, comma separated (replaces any detected stack)
    #[arg(long, value_delimiter = ',')]
    pub stack: Vec<String>,

    /// Project needs localization or cultural adaptation
    #[arg(long)]
    pub cultural: bool,

    /// Project handles payments
    #[arg(long)]
    pub payments: bool,

    /// Project has elevated security or compliance requirements
    #[arg(long)]
    pub security: bool,

    /// Agents that cannot be activated, comma separated
    #[arg(long, value_delimiter = ',', value_name = "AGENT")]
    pub unavailable: Vec<String>,

    /// Extra agents to include, repeatable
    #[arg(long = "agent", value_name = "AGENT")]
    pub agents: Vec<String>,

    /// Fail instead of auto-accepting a low-confidence result
    #[arg(long)]
    pub strict: bool,
}

impl ProfileArgs {
    pub fn to_profile(&self) -> anyhow::Result<ProjectProfile> {
        let mut profile = match (&self.brief, &self.describe) {
            (Some(path), _) => analysis::load_brief(path)
                .with_context(|| format!("failed to load brief {}", path.display()))?,
            (None, Some(text)) => analysis::analyze_text(text),
            (None, None) => ProjectProfile::default(),
        };

        if let Some(name) = &self.name {
            profile.name = Some(name.clone());
        }
        if let Some(domain) = &self.domain {
            profile.context.domain = domain.parse::<Domain>()?;
        }
        if let Some(complexity) = &self.complexity {
            profile.business.complexity = complexity.parse::<Complexity>()?;
        }
        if !self.stack.is_empty() {
            profile.technical.stack = self.stack.clone();
        }
        profile.flags.cultural_requirements |= self.cultural;
        profile.flags.payment_integration |= self.payments;
        profile.flags.security_requirements |= self.security;
        profile.unavailable_agents.extend(self.unavailable.iter().cloned());
        profile.requested_agents.extend(self.agents.iter().cloned());

        Ok(profile)
    }
}

/// Build an engine from the project's settings and catalog (or the built-in
/// catalog when the project has none).
pub fn load_engine(root: &Path, strict: bool) -> anyhow::Result<SelectionEngine> {
    let settings = Settings::load(root).context("failed to load settings")?;
    let file = CatalogFile::load_or_builtin(root).context("failed to load catalog")?;
    let catalog = file.catalog().context("invalid catalog")?;

    let mut engine = SelectionEngine::new(Arc::new(catalog))
        .with_selection_tables(file.selection_tables())
        .with_fallback_tables(file.fallback_tables())
        .with_settings(&settings);
    if strict {
        engine = engine.with_review_hook(RejectLowConfidence);
    }
    Ok(engine)
}
