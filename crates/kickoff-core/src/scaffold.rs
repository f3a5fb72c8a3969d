use crate::catalog::Catalog;
use crate::error::Result;
use crate::fallback::{classify_agent_domain, FallbackOutcome, GenericDomain};
use crate::io;
use crate::paths;
use crate::profile::ProjectProfile;
use crate::resolution::ResolutionResult;
use crate::types::{Complexity, Domain};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Bundle types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BundleAgent {
    pub id: String,
    pub description: String,
    pub capabilities: Vec<String>,
    pub dependencies: Vec<String>,
    pub priority: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStub {
    pub name: String,
    pub description: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HookStub {
    pub event: String,
    pub agent: String,
    pub command: String,
}

/// The merged configuration written to `.kickoff/bundle.{yaml,json}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigBundle {
    pub version: u32,
    pub project: String,
    pub domain: Domain,
    pub complexity: Complexity,
    pub generated_at: DateTime<Utc>,
    pub confidence: f64,
    pub needs_manual_review: bool,
    pub agents: Vec<BundleAgent>,
    pub workflows: Vec<WorkflowStub>,
    pub hooks: Vec<HookStub>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

impl ConfigBundle {
    /// Assemble a bundle. Agents keep the order of `result.ordered_agents`.
    pub fn from_resolution(
        profile: &ProjectProfile,
        result: &ResolutionResult,
        catalog: &Catalog,
    ) -> Self {
        let agents: Vec<BundleAgent> = result
            .ordered_agents
            .iter()
            .map(|id| bundle_agent(id, result, catalog))
            .collect();

        let ids_in = |wanted: &[GenericDomain]| -> Vec<String> {
            result
                .ordered_agents
                .iter()
                .filter(|id| classify_agent_domain(id).is_some_and(|d| wanted.contains(&d)))
                .cloned()
                .collect()
        };

        let mut workflows = vec![WorkflowStub {
            name: "setup".to_string(),
            description: "Bring up every agent in dependency order".to_string(),
            steps: result.ordered_agents.clone(),
        }];
        let reviewers = ids_in(&[GenericDomain::Security, GenericDomain::Testing]);
        if !reviewers.is_empty() {
            workflows.push(WorkflowStub {
                name: "review".to_string(),
                description: "Security and quality review before merge".to_string(),
                steps: reviewers.clone(),
            });
        }
        let builders = ids_in(&[GenericDomain::Development]);
        if !builders.is_empty() {
            workflows.push(WorkflowStub {
                name: "delivery".to_string(),
                description: format!("Implementation work for the {} project", result.domain),
                steps: builders,
            });
        }

        let mut hooks: Vec<HookStub> = reviewers
            .iter()
            .map(|agent| hook("pre-commit", agent))
            .collect();
        hooks.extend(
            ids_in(&[GenericDomain::Architecture])
                .iter()
                .map(|agent| hook("post-generate", agent)),
        );

        Self {
            version: 1,
            project: profile
                .name
                .clone()
                .unwrap_or_else(|| "project".to_string()),
            domain: result.domain,
            complexity: result.complexity,
            generated_at: Utc::now(),
            confidence: result.confidence,
            needs_manual_review: result.needs_manual_review,
            agents,
            workflows,
            hooks,
            warnings: result.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

fn hook(event: &str, agent: &str) -> HookStub {
    HookStub {
        event: event.to_string(),
        agent: agent.to_string(),
        command: format!("kickoff agents show {agent}"),
    }
}

/// Catalog entry first, then a generic stand-in produced by the fallback
/// chain, else an empty record for an unregistered id.
fn bundle_agent(id: &str, result: &ResolutionResult, catalog: &Catalog) -> BundleAgent {
    if let Some(descriptor) = catalog.lookup(id) {
        return BundleAgent {
            id: id.to_string(),
            description: descriptor.description.clone().unwrap_or_default(),
            capabilities: descriptor.provides.iter().cloned().collect(),
            dependencies: result.dependencies_of(id).to_vec(),
            priority: descriptor.priority,
        };
    }

    let generic = result.fallbacks.iter().find_map(|record| match &record.outcome {
        FallbackOutcome::GenericAgent {
            agent_id,
            capabilities,
            ..
        } if agent_id == id => Some((record.agent_id.as_str(), capabilities)),
        _ => None,
    });
    match generic {
        Some((replaced, capabilities)) => BundleAgent {
            id: id.to_string(),
            description: format!("Generic stand-in for '{replaced}'"),
            capabilities: capabilities.clone(),
            dependencies: result.dependencies_of(id).to_vec(),
            priority: 1,
        },
        None => BundleAgent {
            id: id.to_string(),
            description: "Unregistered agent".to_string(),
            capabilities: Vec::new(),
            dependencies: result.dependencies_of(id).to_vec(),
            priority: 0,
        },
    }
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn render_agent(agent: &BundleAgent) -> String {
    let mut out = format!("# {}\n\n", agent.id);
    if !agent.description.is_empty() {
        out.push_str(&agent.description);
        out.push_str("\n\n");
    }
    out.push_str(&format!("Priority: {}\n", agent.priority));
    if !agent.capabilities.is_empty() {
        out.push_str("\n## Capabilities\n\n");
        for cap in &agent.capabilities {
            out.push_str(&format!("- {cap}\n"));
        }
    }
    if !agent.dependencies.is_empty() {
        out.push_str("\n## Depends on\n\n");
        for dep in &agent.dependencies {
            out.push_str(&format!("- {dep}\n"));
        }
    }
    out
}

fn render_hook(event: &str, hooks: &[&HookStub]) -> String {
    let mut out = format!("#!/bin/sh\n# {event} hook generated by kickoff\nset -e\n\n");
    for hook in hooks {
        out.push_str(&hook.command);
        out.push('\n');
    }
    out
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write the bundle and its template tree under `root/.kickoff`.
///
/// `bundle.yaml` and `bundle.json` are always rewritten. Agent, workflow and
/// hook templates are only created when missing so local edits survive
/// regeneration. Returns every path written.
pub fn write_bundle(root: &Path, bundle: &ConfigBundle) -> Result<Vec<PathBuf>> {
    let mut written = Vec::new();

    let yaml = serde_yaml::to_string(bundle)?;
    let yaml_path = paths::bundle_yaml_path(root);
    io::atomic_write(&yaml_path, yaml.as_bytes())?;
    written.push(yaml_path);

    let json = serde_json::to_string_pretty(bundle)?;
    let json_path = paths::bundle_json_path(root);
    io::atomic_write(&json_path, json.as_bytes())?;
    written.push(json_path);

    for agent in &bundle.agents {
        let path = paths::agent_template_path(root, &agent.id);
        if io::write_if_missing(&path, render_agent(agent).as_bytes())? {
            written.push(path);
        }
    }

    for workflow in &bundle.workflows {
        let path = paths::workflow_path(root, &workflow.name);
        let data = serde_yaml::to_string(workflow)?;
        if io::write_if_missing(&path, data.as_bytes())? {
            written.push(path);
        }
    }

    let mut by_event: BTreeMap<&str, Vec<&HookStub>> = BTreeMap::new();
    for hook in &bundle.hooks {
        by_event.entry(hook.event.as_str()).or_default().push(hook);
    }
    for (event, hooks) in by_event {
        let path = paths::hook_path(root, event);
        if io::write_if_missing(&path, render_hook(event, &hooks).as_bytes())? {
            written.push(path);
        }
    }

    tracing::info!(files = written.len(), "wrote configuration bundle");
    Ok(written)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selection::SelectionEngine;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn marketplace() -> (ProjectProfile, ResolutionResult, Catalog) {
        let catalog = Catalog::builtin();
        let mut profile = ProjectProfile::new(Domain::Marketplace, Complexity::Moderate);
        profile.name = Some("bazaar".into());
        let result = SelectionEngine::new(Arc::new(catalog.clone()))
            .resolve_project_agents(&profile)
            .unwrap();
        (profile, result, catalog)
    }

    #[test]
    fn bundle_agents_follow_resolution_order() {
        let (profile, result, catalog) = marketplace();
        let bundle = ConfigBundle::from_resolution(&profile, &result, &catalog);
        let ids: Vec<&str> = bundle.agents.iter().map(|a| a.id.as_str()).collect();
        assert_eq!(ids, result.ordered_agents);
        assert_eq!(bundle.project, "bazaar");

        let architect = bundle
            .agents
            .iter()
            .find(|a| a.id == "marketplace-architect")
            .unwrap();
        assert_eq!(
            architect.dependencies,
            vec!["cultural-expert", "payment-specialist"]
        );
        assert_eq!(architect.priority, 10);
    }

    #[test]
    fn workflows_and_hooks() {
        let (profile, result, catalog) = marketplace();
        let bundle = ConfigBundle::from_resolution(&profile, &result, &catalog);
        let names: Vec<&str> = bundle.workflows.iter().map(|w| w.name.as_str()).collect();
        assert_eq!(names, vec!["setup", "review", "delivery"]);
        assert_eq!(bundle.workflows[1].steps, vec!["security-expert", "qa-engineer"]);
        assert_eq!(
            bundle.workflows[2].steps,
            vec!["backend-developer", "frontend-developer"]
        );
        assert!(bundle
            .hooks
            .iter()
            .any(|h| h.event == "post-generate" && h.agent == "marketplace-architect"));
        assert!(bundle
            .hooks
            .iter()
            .any(|h| h.event == "pre-commit" && h.agent == "security-expert"));
    }

    #[test]
    fn generic_stand_in_gets_fallback_capabilities() {
        let catalog = Catalog::builtin();
        let mut profile = ProjectProfile::new(Domain::General, Complexity::Moderate);
        profile.requested_agents = vec!["data-analyst".into()];
        profile.unavailable_agents = vec!["data-analyst".into()];
        let result = SelectionEngine::new(Arc::new(catalog.clone()))
            .resolve_project_agents(&profile)
            .unwrap();
        let bundle = ConfigBundle::from_resolution(&profile, &result, &catalog);
        let generic = bundle
            .agents
            .iter()
            .find(|a| a.id == "generic-analyst")
            .unwrap();
        assert_eq!(generic.capabilities, vec!["analytics", "reporting"]);
        assert!(generic.description.contains("data-analyst"));
    }

    #[test]
    fn rewired_requirement_is_kept_in_bundle() {
        let catalog = Catalog::builtin();
        let mut profile = ProjectProfile::new(Domain::Healthcare, Complexity::Moderate);
        profile.unavailable_agents = vec!["compliance-specialist".into()];
        let result = SelectionEngine::new(Arc::new(catalog.clone()))
            .resolve_project_agents(&profile)
            .unwrap();
        let bundle = ConfigBundle::from_resolution(&profile, &result, &catalog);

        let healthcare = bundle
            .agents
            .iter()
            .find(|a| a.id == "healthcare-specialist")
            .unwrap();
        assert_eq!(healthcare.dependencies, vec!["security-expert"]);
        for dep in &healthcare.dependencies {
            assert!(result.position(dep) < result.position(&healthcare.id));
        }
    }

    #[test]
    fn write_bundle_creates_tree() {
        let dir = TempDir::new().unwrap();
        let (profile, result, catalog) = marketplace();
        let bundle = ConfigBundle::from_resolution(&profile, &result, &catalog);
        let written = write_bundle(dir.path(), &bundle).unwrap();

        assert!(paths::bundle_yaml_path(dir.path()).exists());
        assert!(paths::bundle_json_path(dir.path()).exists());
        let agent_md =
            std::fs::read_to_string(paths::agent_template_path(dir.path(), "payment-specialist"))
                .unwrap();
        assert!(agent_md.starts_with("# payment-specialist"));
        assert!(agent_md.contains("- payment_integration"));
        assert!(paths::workflow_path(dir.path(), "setup").exists());
        let hook = std::fs::read_to_string(paths::hook_path(dir.path(), "pre-commit")).unwrap();
        assert!(hook.starts_with("#!/bin/sh"));
        assert!(hook.contains("kickoff agents show qa-engineer"));
        // 2 bundle files, 7 agents, 3 workflows, 2 hooks
        assert_eq!(written.len(), 14);

        let json = std::fs::read_to_string(paths::bundle_json_path(dir.path())).unwrap();
        let parsed: ConfigBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.agents.len(), 7);
    }

    #[test]
    fn rewrite_keeps_edited_templates() {
        let dir = TempDir::new().unwrap();
        let (profile, result, catalog) = marketplace();
        let bundle = ConfigBundle::from_resolution(&profile, &result, &catalog);
        write_bundle(dir.path(), &bundle).unwrap();

        let agent_path = paths::agent_template_path(dir.path(), "qa-engineer");
        std::fs::write(&agent_path, "custom notes").unwrap();

        let written = write_bundle(dir.path(), &bundle).unwrap();
        assert_eq!(written.len(), 2);
        assert_eq!(std::fs::read_to_string(&agent_path).unwrap(), "custom notes");
    }
}
