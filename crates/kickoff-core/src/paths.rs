use crate::error::{KickoffError, Result};
use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const KICKOFF_DIR: &str = ".kickoff";
pub const AGENTS_DIR: &str = ".kickoff/agents";
pub const WORKFLOWS_DIR: &str = ".kickoff/workflows";
pub const HOOKS_DIR: &str = ".kickoff/hooks";

pub const SETTINGS_FILE: &str = ".kickoff/settings.yaml";
pub const CATALOG_FILE: &str = ".kickoff/catalog.yaml";
pub const BUNDLE_YAML: &str = ".kickoff/bundle.yaml";
pub const BUNDLE_JSON: &str = ".kickoff/bundle.json";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn kickoff_dir(root: &Path) -> PathBuf {
    root.join(KICKOFF_DIR)
}

pub fn settings_path(root: &Path) -> PathBuf {
    root.join(SETTINGS_FILE)
}

pub fn catalog_path(root: &Path) -> PathBuf {
    root.join(CATALOG_FILE)
}

pub fn bundle_yaml_path(root: &Path) -> PathBuf {
    root.join(BUNDLE_YAML)
}

pub fn bundle_json_path(root: &Path) -> PathBuf {
    root.join(BUNDLE_JSON)
}

pub fn agent_template_path(root: &Path, agent_id: &str) -> PathBuf {
    root.join(AGENTS_DIR).join(format!("{agent_id}.md"))
}

pub fn workflow_path(root: &Path, name: &str) -> PathBuf {
    root.join(WORKFLOWS_DIR).join(format!("{name}.yaml"))
}

pub fn hook_path(root: &Path, event: &str) -> PathBuf {
    root.join(HOOKS_DIR).join(format!("{event}.sh"))
}

// ---------------------------------------------------------------------------
// Slug validation
// ---------------------------------------------------------------------------

static SLUG_RE: OnceLock<Regex> = OnceLock::new();

fn slug_re() -> &'static Regex {
    SLUG_RE.get_or_init(|| Regex::new(r"^[a-z0-9][a-z0-9\-]*[a-z0-9]$|^[a-z0-9]$").unwrap())
}

/// Agent ids double as file names in the template tree, so they share the
/// slug rules.
pub fn validate_slug(slug: &str) -> Result<()> {
    if slug.is_empty() || slug.len() > 64 || !slug_re().is_match(slug) {
        return Err(KickoffError::InvalidSlug(slug.to_string()));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
