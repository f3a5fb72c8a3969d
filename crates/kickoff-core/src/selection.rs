//! Agent selection and resolution for a project profile.
//!
//! [`SelectionEngine::resolve_project_agents`] is the single entry point. It
//! turns a profile into a requested agent list using [`SelectionTables`],
//! then builds the dependency graph, resolves conflicts, substitutes
//! unavailable agents through the [`FallbackManager`], sorts, and scores the
//! result. Results are cached by profile hash.

use crate::cache::{CacheStats, ConfigCache};
use crate::catalog::{AgentDescriptor, Catalog};
use crate::config::{Penalties, ResolutionSettings, Settings};
use crate::conflict;
use crate::error::{KickoffError, Result};
use crate::fallback::{FallbackManager, FallbackOutcome, FallbackTables};
use crate::graph::{DependencyGraph, GraphBuilder};
use crate::profile::ProjectProfile;
use crate::resolution::{FallbackRecord, ResolutionResult, ResolutionWarning, WarningKind};
use crate::sort::topological_sort;
use crate::types::{Complexity, Domain};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

/// Upper bound on substitute-then-resolve passes per resolution.
const MAX_FALLBACK_ROUNDS: usize = 3;

/// Priority given to synthesized generic agents so they lose every conflict.
const GENERIC_AGENT_PRIORITY: i32 = 1;

// ---------------------------------------------------------------------------
// SelectionTables
// ---------------------------------------------------------------------------

/// Technology keyword to agent mapping, matched case-insensitively against
/// `technical.stack` entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackRule {
    pub keywords: Vec<String>,
    pub agent: String,
}

/// One list per profile flag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlagTable {
    #[serde(default)]
    pub cultural: Vec<String>,
    #[serde(default)]
    pub payment: Vec<String>,
    #[serde(default)]
    pub security: Vec<String>,
}

impl FlagTable {
    fn active(&self, profile: &ProjectProfile) -> impl Iterator<Item = &String> {
        let flags = profile.flags;
        [
            (flags.cultural_requirements, &self.cultural),
            (flags.payment_integration, &self.payment),
            (flags.security_requirements, &self.security),
        ]
        .into_iter()
        .filter(|(on, _)| *on)
        .flat_map(|(_, list)| list.iter())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionTables {
    #[serde(default)]
    pub domain_agents: BTreeMap<Domain, Vec<String>>,
    #[serde(default)]
    pub complexity_agents: BTreeMap<Complexity, Vec<String>>,
    #[serde(default)]
    pub stack_agents: Vec<StackRule>,
    #[serde(default)]
    pub flag_agents: FlagTable,
    /// Capabilities some selected agent must provide, per domain.
    #[serde(default)]
    pub domain_capabilities: BTreeMap<Domain, Vec<String>>,
    #[serde(default)]
    pub flag_capabilities: FlagTable,
}

fn list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectionTables {
    fn default() -> Self {
        use Domain::*;

        let domain_agents = BTreeMap::from([
            (
                Marketplace,
                list(&["marketplace-architect", "backend-developer", "frontend-developer"]),
            ),
            (
                Ecommerce,
                list(&["ecommerce-specialist", "fullstack-architect", "frontend-developer"]),
            ),
            (
                Saas,
                list(&["saas-architect", "backend-developer", "frontend-developer"]),
            ),
            (Fintech, list(&["fintech-architect", "backend-developer"])),
            (
                Healthcare,
                list(&["healthcare-specialist", "fullstack-architect", "backend-developer"]),
            ),
            (
                Education,
                list(&["education-specialist", "fullstack-architect", "frontend-developer"]),
            ),
            (
                Social,
                list(&["social-platform-architect", "backend-developer", "frontend-developer"]),
            ),
            (
                Content,
                list(&["content-strategist", "fullstack-architect", "frontend-developer"]),
            ),
            (General, list(&["fullstack-architect"])),
        ]);

        let complexity_agents = BTreeMap::from([
            (Complexity::Simple, list(&["simple-architect"])),
            (Complexity::Moderate, list(&["qa-engineer"])),
            (Complexity::Complex, list(&["qa-engineer", "devops-engineer"])),
            (
                Complexity::VeryComplex,
                list(&["qa-engineer", "devops-engineer", "performance-engineer"]),
            ),
        ]);

        let rule = |keywords: &[&str], agent: &str| StackRule {
            keywords: list(keywords),
            agent: agent.to_string(),
        };
        let stack_agents = vec![
            rule(
                &["react", "vue", "angular", "svelte", "nextjs", "next.js"],
                "frontend-developer",
            ),
            rule(
                &[
                    "node", "express", "django", "rails", "spring", "go", "rust", "fastapi",
                    "postgres",
                ],
                "backend-developer",
            ),
            rule(
                &["react-native", "flutter", "ios", "android", "swift", "kotlin"],
                "mobile-developer",
            ),
            rule(&["websocket", "socket.io", "kafka"], "realtime-specialist"),
            rule(&["docker", "kubernetes", "terraform", "aws"], "devops-engineer"),
        ];

        let flag_agents = FlagTable {
            cultural: list(&["cultural-expert"]),
            payment: list(&["payment-specialist"]),
            security: list(&["security-expert"]),
        };

        let domain_capabilities = BTreeMap::from([
            (
                Marketplace,
                list(&["marketplace_architecture", "payment_integration", "vendor_management"]),
            ),
            (Ecommerce, list(&["catalog_management", "payment_integration"])),
            (Saas, list(&["multi_tenancy", "authentication"])),
            (Fintech, list(&["transaction_processing", "regulatory_compliance"])),
            (Healthcare, list(&["hipaa_compliance", "data_protection"])),
            (Education, list(&["course_management"])),
            (Social, list(&["social_graph", "content_moderation"])),
            (Content, list(&["content_modeling"])),
            (General, Vec::new()),
        ]);

        let flag_capabilities = FlagTable {
            cultural: list(&["localization"]),
            payment: list(&["payment_integration"]),
            security: list(&["security_review"]),
        };

        Self {
            domain_agents,
            complexity_agents,
            stack_agents,
            flag_agents,
            domain_capabilities,
            flag_capabilities,
        }
    }
}

impl SelectionTables {
    /// Requested agents for `profile`, deduplicated, in table order: domain,
    /// complexity, stack, flags, then explicit requests sorted by id.
    pub fn select(&self, profile: &ProjectProfile) -> Vec<String> {
        let mut selected: Vec<String> = Vec::new();
        let mut push = |id: &String| {
            if !selected.contains(id) {
                selected.push(id.clone());
            }
        };

        self.domain_agents
            .get(&profile.domain())
            .into_iter()
            .flatten()
            .for_each(&mut push);
        self.complexity_agents
            .get(&profile.complexity())
            .into_iter()
            .flatten()
            .for_each(&mut push);

        let stack: Vec<String> = profile
            .technical
            .stack
            .iter()
            .map(|s| s.trim().to_ascii_lowercase())
            .collect();
        for rule in &self.stack_agents {
            if rule
                .keywords
                .iter()
                .any(|k| stack.iter().any(|s| s == &k.to_ascii_lowercase()))
            {
                push(&rule.agent);
            }
        }

        self.flag_agents.active(profile).for_each(&mut push);

        // Sorted so the caller's ordering cannot change the result.
        let mut requested: Vec<&String> = profile.requested_agents.iter().collect();
        requested.sort();
        requested.into_iter().for_each(&mut push);
        selected
    }

    /// Capabilities the final agent set is expected to cover.
    pub fn required_capabilities(&self, profile: &ProjectProfile) -> Vec<String> {
        let mut required: Vec<String> = Vec::new();
        let domain = self
            .domain_capabilities
            .get(&profile.domain())
            .into_iter()
            .flatten();
        for cap in domain.chain(self.flag_capabilities.active(profile)) {
            if !required.contains(cap) {
                required.push(cap.clone());
            }
        }
        required
    }
}

// ---------------------------------------------------------------------------
// ReviewHook
// ---------------------------------------------------------------------------

/// Called when a result falls below the confidence threshold.
pub trait ReviewHook: Send + Sync {
    fn review(&self, result: &ResolutionResult, threshold: f64) -> Result<()>;
}

/// Accept low-confidence results after logging them.
#[derive(Debug, Default, Clone, Copy)]
pub struct AutoAccept;

impl ReviewHook for AutoAccept {
    fn review(&self, result: &ResolutionResult, threshold: f64) -> Result<()> {
        tracing::warn!(
            confidence = result.confidence,
            threshold,
            "resolution needs manual review, accepting automatically"
        );
        Ok(())
    }
}

/// Fail resolution when confidence is below the threshold.
#[derive(Debug, Default, Clone, Copy)]
pub struct RejectLowConfidence;

impl ReviewHook for RejectLowConfidence {
    fn review(&self, result: &ResolutionResult, threshold: f64) -> Result<()> {
        Err(KickoffError::ReviewRejected {
            confidence: result.confidence,
            threshold,
        })
    }
}

// ---------------------------------------------------------------------------
// SelectionEngine
// ---------------------------------------------------------------------------

pub struct SelectionEngine {
    catalog: Arc<Catalog>,
    tables: SelectionTables,
    fallback: FallbackManager,
    settings: ResolutionSettings,
    cache: ConfigCache,
    review: Box<dyn ReviewHook>,
}

/// Mutable state for one resolution call.
#[derive(Default)]
struct Run {
    warnings: Vec<ResolutionWarning>,
    seen_messages: HashSet<String>,
    removed: Vec<String>,
    fallbacks: Vec<FallbackRecord>,
    /// Agents the fallback chain already ran for.
    handled: HashSet<String>,
    /// Missing agent to the substitute that replaced it.
    substitutes: HashMap<String, String>,
    /// Generic agents created by the fallback chain.
    synthesized: HashMap<String, AgentDescriptor>,
}

impl Run {
    fn warn(&mut self, warning: ResolutionWarning) {
        if self.seen_messages.insert(warning.message.clone()) {
            self.warnings.push(warning);
        }
    }
}

impl SelectionEngine {
    /// Engine with compiled-in tables, default settings and [`AutoAccept`].
    pub fn new(catalog: Arc<Catalog>) -> Self {
        let fallback = FallbackManager::new(Arc::clone(&catalog), FallbackTables::default());
        Self {
            catalog,
            tables: SelectionTables::default(),
            fallback,
            settings: ResolutionSettings::default(),
            cache: ConfigCache::from_settings(&Default::default()),
            review: Box::new(AutoAccept),
        }
    }

    pub fn with_selection_tables(mut self, tables: SelectionTables) -> Self {
        self.tables = tables;
        self
    }

    pub fn with_fallback_tables(mut self, tables: FallbackTables) -> Self {
        self.fallback = FallbackManager::new(Arc::clone(&self.catalog), tables);
        self
    }

    /// Apply resolution, cache and review settings. `review.strict` installs
    /// [`RejectLowConfidence`].
    pub fn with_settings(mut self, settings: &Settings) -> Self {
        self.settings = settings.resolution.clone();
        self.cache = ConfigCache::from_settings(&settings.cache);
        if settings.review.strict {
            self.review = Box::new(RejectLowConfidence);
        }
        self
    }

    pub fn with_review_hook(mut self, hook: impl ReviewHook + 'static) -> Self {
        self.review = Box::new(hook);
        self
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn tables(&self) -> &SelectionTables {
        &self.tables
    }

    pub fn fallback(&self) -> &FallbackManager {
        &self.fallback
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn resolve_project_agents(&self, profile: &ProjectProfile) -> Result<ResolutionResult> {
        profile.validate()?;

        let key = profile.cache_key();
        if let Some(hit) = self.cache.get(&key) {
            tracing::debug!(key = %&key[..12], "resolution cache hit");
            return Ok(hit);
        }

        let requested = self.tables.select(profile);
        tracing::debug!(?requested, "selected agents");

        let mut run = Run::default();
        let mut graph = self.build_graph(&requested, profile, &mut run);
        self.settle(&mut graph, profile, &mut run);

        let ordered_agents = topological_sort(&graph)?;
        let dependencies = final_dependencies(&graph, &ordered_agents);

        for id in &ordered_agents {
            if !self.catalog.contains(id) && !run.synthesized.contains_key(id) {
                run.warn(ResolutionWarning::new(
                    WarningKind::UnregisteredAgent,
                    format!("agent '{id}' is not in the catalog; treated as a leaf"),
                ));
            }
        }
        self.check_capabilities(&graph, profile, &mut run);

        if ordered_agents.len() > self.settings.max_agents {
            run.warn(ResolutionWarning::new(
                WarningKind::Oversized,
                format!(
                    "{} agents selected, more than the recommended {}",
                    ordered_agents.len(),
                    self.settings.max_agents
                ),
            ));
        }

        let confidence = confidence(&run.warnings, &self.settings.penalties);
        let threshold = self.settings.confidence_threshold;
        let needs_manual_review = confidence < threshold;
        if needs_manual_review {
            run.warn(ResolutionWarning::new(
                WarningKind::LowConfidence,
                format!("confidence {confidence:.2} is below threshold {threshold:.2}"),
            ));
        }

        let result = ResolutionResult {
            domain: profile.domain(),
            complexity: profile.complexity(),
            ordered_agents,
            dependencies,
            warnings: run.warnings,
            confidence,
            needs_manual_review,
            removed_agents: run.removed,
            fallbacks: run.fallbacks,
        };

        if needs_manual_review {
            self.review.review(&result, threshold)?;
        }

        tracing::info!(
            agents = result.ordered_agents.len(),
            warnings = result.warnings.len(),
            confidence = result.confidence,
            "resolved project agents"
        );
        self.cache.insert(key, result.clone());
        Ok(result)
    }

    // -----------------------------------------------------------------------
    // Graph steps
    // -----------------------------------------------------------------------

    /// Build the initial graph. Requested agents that are unavailable go
    /// through the fallback chain first and are replaced by their substitute.
    fn build_graph(
        &self,
        requested: &[String],
        profile: &ProjectProfile,
        run: &mut Run,
    ) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for id in requested {
            if is_unavailable(profile, id) {
                if let Some(substitute) = self.apply_fallback(id, Vec::new(), profile, run) {
                    self.add_agent(&mut graph, &substitute, run);
                }
            } else {
                self.add_agent(&mut graph, id, run);
            }
        }
        graph
    }

    /// Resolve conflicts and fill dangling requirements until the graph stops
    /// changing or the round limit is hit.
    fn settle(&self, graph: &mut DependencyGraph, profile: &ProjectProfile, run: &mut Run) {
        for round in 0..=MAX_FALLBACK_ROUNDS {
            // Requirements may have pulled unavailable agents back in.
            let unavailable: Vec<String> = graph
                .ids()
                .filter(|id| is_unavailable(profile, id))
                .map(String::from)
                .collect();
            for id in unavailable {
                graph.remove(&id);
            }

            let conflicts = conflict::detect(graph);
            let resolution = conflict::resolve(&conflicts, graph);
            run.removed.extend(resolution.removed);
            for warning in resolution.warnings {
                run.warn(warning);
            }

            if round == MAX_FALLBACK_ROUNDS {
                tracing::debug!("fallback round limit reached");
                break;
            }
            if !self.fill_dangling(graph, profile, run) {
                break;
            }
        }
    }

    /// Run the fallback chain for each missing requirement. Returns whether
    /// any substitute was added to the graph.
    fn fill_dangling(
        &self,
        graph: &mut DependencyGraph,
        profile: &ProjectProfile,
        run: &mut Run,
    ) -> bool {
        let mut missing: Vec<(String, Vec<String>)> = Vec::new();
        for (node, dep) in graph.dangling_requirements() {
            match missing.iter_mut().find(|(id, _)| *id == dep) {
                Some((_, required_by)) => required_by.push(node),
                None => missing.push((dep, vec![node])),
            }
        }

        let mut changed = false;
        for (id, required_by) in missing {
            if let Some(substitute) = run.substitutes.get(&id).cloned() {
                if graph.contains(&substitute) {
                    graph.replace_requirement(&id, &substitute);
                }
                continue;
            }
            if run.handled.contains(&id) {
                continue;
            }
            if let Some(substitute) = self.apply_fallback(&id, required_by, profile, run) {
                self.add_agent(graph, &substitute, run);
                graph.replace_requirement(&id, &substitute);
                changed = true;
            }
        }
        changed
    }

    /// Run the fallback chain for `agent_id` and record the outcome. Returns
    /// the substitute to add to the graph, if the outcome names a usable one.
    fn apply_fallback(
        &self,
        agent_id: &str,
        required_by: Vec<String>,
        profile: &ProjectProfile,
        run: &mut Run,
    ) -> Option<String> {
        run.handled.insert(agent_id.to_string());
        let outcome = self.fallback.handle_unavailable(agent_id, profile);

        let substitute = outcome
            .substitute()
            .filter(|s| *s != agent_id && !is_unavailable(profile, s))
            .map(String::from);

        if let FallbackOutcome::GenericAgent {
            agent_id: generic_id,
            capabilities,
            ..
        } = &outcome
        {
            if !self.catalog.contains(generic_id) {
                let descriptor = AgentDescriptor::leaf(generic_id.as_str())
                    .with_priority(GENERIC_AGENT_PRIORITY)
                    .with_description(format!("Generic stand-in for '{agent_id}'"))
                    .providing(capabilities.iter().cloned());
                run.synthesized.insert(generic_id.clone(), descriptor);
            }
        }

        let cause = if run.removed.iter().any(|r| r == agent_id) {
            "was dropped in a conflict"
        } else {
            "is unavailable"
        };
        let message = if required_by.is_empty() {
            format!("'{agent_id}' {cause}: {}", outcome.summary())
        } else {
            format!(
                "'{agent_id}' (required by {}) {cause}: {}",
                required_by.join(", "),
                outcome.summary()
            )
        };
        run.warn(ResolutionWarning::new(WarningKind::FallbackApplied, message));

        if let Some(substitute) = &substitute {
            run.substitutes.insert(agent_id.to_string(), substitute.clone());
        }
        run.fallbacks.push(FallbackRecord {
            agent_id: agent_id.to_string(),
            required_by,
            outcome,
            substituted: substitute.is_some(),
        });
        substitute
    }

    fn add_agent(&self, graph: &mut DependencyGraph, id: &str, run: &Run) {
        match run.synthesized.get(id) {
            Some(descriptor) => {
                graph.insert(descriptor.clone());
            }
            None => GraphBuilder::new(&self.catalog).extend(graph, &[id.to_string()]),
        }
    }

    fn check_capabilities(&self, graph: &DependencyGraph, profile: &ProjectProfile, run: &mut Run) {
        for cap in self.tables.required_capabilities(profile) {
            if graph.iter().any(|node| node.provides.contains(&cap)) {
                continue;
            }
            let providers: Vec<String> = self
                .catalog
                .providers_of(&cap)
                .into_iter()
                .filter(|id| !is_unavailable(profile, id))
                .collect();
            let message = if providers.is_empty() {
                format!("no selected agent provides '{cap}'")
            } else {
                format!(
                    "no selected agent provides '{cap}'; consider {}",
                    providers.join(", ")
                )
            };
            run.warn(ResolutionWarning::new(WarningKind::MissingCapability, message));
        }
    }
}

/// Each agent's `requires` after settling, limited to agents in the graph.
fn final_dependencies(
    graph: &DependencyGraph,
    ordered: &[String],
) -> BTreeMap<String, Vec<String>> {
    ordered
        .iter()
        .filter_map(|id| {
            let node = graph.get(id)?;
            let deps: Vec<String> = node
                .requires
                .iter()
                .filter(|dep| graph.contains(dep))
                .cloned()
                .collect();
            (!deps.is_empty()).then(|| (id.clone(), deps))
        })
        .collect()
}

fn is_unavailable(profile: &ProjectProfile, id: &str) -> bool {
    profile.unavailable_agents.iter().any(|u| u == id)
}

/// 1.0 minus one penalty per warning, clamped to `[0, 1]`.
fn confidence(warnings: &[ResolutionWarning], penalties: &Penalties) -> f64 {
    let deducted: f64 = warnings
        .iter()
        .map(|w| match w.kind {
            WarningKind::UnregisteredAgent => penalties.unregistered_agent,
            WarningKind::ConflictResolved => penalties.conflict_resolved,
            WarningKind::CapabilityOverlap => penalties.capability_overlap,
            WarningKind::MissingCapability => penalties.missing_capability,
            WarningKind::FallbackApplied => penalties.fallback_applied,
            WarningKind::Oversized => penalties.oversized,
            WarningKind::LowConfidence => 0.0,
        })
        .sum();
    (1.0 - deducted).clamp(0.0, 1.0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fallback::FallbackStrategy;

    fn engine() -> SelectionEngine {
        SelectionEngine::new(Arc::new(Catalog::builtin()))
    }

    fn assert_topological(engine: &SelectionEngine, result: &ResolutionResult) {
        for (i, id) in result.ordered_agents.iter().enumerate() {
            let Some(node) = engine.catalog().lookup(id) else {
                continue;
            };
            for dep in &node.requires {
                if let Some(d) = result.position(dep) {
                    assert!(d < i, "{dep} must precede {id}");
                }
            }
        }
    }

    #[test]
    fn select_follows_table_order_and_dedupes() {
        let tables = SelectionTables::default();
        let mut profile = ProjectProfile::new(Domain::Marketplace, Complexity::Complex);
        profile.technical.stack = vec!["React".into(), "node".into(), "docker".into()];
        profile.flags.payment_integration = true;
        profile.requested_agents = vec!["data-analyst".into(), "qa-engineer".into()];
        assert_eq!(
            tables.select(&profile),
            vec![
                "marketplace-architect",
                "backend-developer",
                "frontend-developer",
                "qa-engineer",
                "devops-engineer",
                "payment-specialist",
                "data-analyst",
            ]
        );
    }

    #[test]
    fn explicit_request_order_does_not_matter() {
        let tables = SelectionTables::default();
        let mut a = ProjectProfile::new(Domain::General, Complexity::Moderate);
        a.requested_agents = vec!["data-analyst".into(), "content-strategist".into()];
        let mut b = a.clone();
        b.requested_agents.reverse();
        assert_eq!(tables.select(&a), tables.select(&b));
    }

    #[test]
    fn cached_result_matches_fresh_run_for_reordered_requests() {
        let mut first = ProjectProfile::new(Domain::General, Complexity::Moderate);
        first.requested_agents = vec!["data-analyst".into(), "content-strategist".into()];
        let mut second = first.clone();
        second.requested_agents = vec!["content-strategist".into(), "data-analyst".into()];

        let fresh = engine().resolve_project_agents(&second).unwrap();

        let shared = engine();
        shared.resolve_project_agents(&first).unwrap();
        let cached = shared.resolve_project_agents(&second).unwrap();
        assert_eq!(shared.cache_stats().hits, 1);
        assert_eq!(cached.ordered_agents, fresh.ordered_agents);
    }

    #[test]
    fn marketplace_resolution_is_clean() {
        let profile = ProjectProfile::new(Domain::Marketplace, Complexity::Moderate);
        let result = engine().resolve_project_agents(&profile).unwrap();
        assert_eq!(
            result.ordered_agents,
            vec![
                "cultural-expert",
                "security-expert",
                "payment-specialist",
                "marketplace-architect",
                "backend-developer",
                "frontend-developer",
                "qa-engineer",
            ]
        );
        assert!(result.warnings.is_empty());
        assert_eq!(result.confidence, 1.0);
        assert!(!result.needs_manual_review);
    }

    #[test]
    fn simple_complexity_drops_conflicting_architect() {
        let profile = ProjectProfile::new(Domain::Marketplace, Complexity::Simple);
        let result = engine().resolve_project_agents(&profile).unwrap();
        assert!(result.position("simple-architect").is_none());
        assert!(result.position("marketplace-architect").is_some());
        assert_eq!(result.removed_agents, vec!["simple-architect"]);
        let conflicts: Vec<_> = result.warnings_of(WarningKind::ConflictResolved).collect();
        assert_eq!(conflicts.len(), 1);
        assert!(conflicts[0].message.contains("kept 'marketplace-architect'"));
        assert!((result.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn resolution_is_deterministic() {
        let mut profile = ProjectProfile::new(Domain::Fintech, Complexity::VeryComplex);
        profile.technical.stack = vec!["kafka".into(), "flutter".into()];
        profile.flags.cultural_requirements = true;
        let a = engine().resolve_project_agents(&profile).unwrap();
        let b = engine().resolve_project_agents(&profile).unwrap();
        assert_eq!(a.ordered_agents, b.ordered_agents);
        assert_eq!(a.warnings, b.warnings);
        assert_eq!(
            serde_json::to_string(&a.ordered_agents).unwrap(),
            serde_json::to_string(&b.ordered_agents).unwrap()
        );
    }

    #[test]
    fn every_domain_resolves_in_dependency_order() {
        let e = engine();
        for domain in Domain::all() {
            for complexity in Complexity::all() {
                let profile = ProjectProfile::new(*domain, *complexity);
                let result = e.resolve_project_agents(&profile).unwrap();
                assert!(!result.ordered_agents.is_empty());
                assert_topological(&e, &result);
                assert!((0.0..=1.0).contains(&result.confidence));
            }
        }
    }

    #[test]
    fn second_call_is_served_from_cache() {
        let e = engine();
        let profile = ProjectProfile::new(Domain::Saas, Complexity::Moderate);
        let first = e.resolve_project_agents(&profile).unwrap();
        let second = e.resolve_project_agents(&profile).unwrap();
        assert_eq!(first.ordered_agents, second.ordered_agents);
        let stats = e.cache_stats();
        assert_eq!(stats.hits, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entries, 1);
    }

    #[test]
    fn unavailable_requested_agent_is_substituted() {
        let mut profile = ProjectProfile::new(Domain::Marketplace, Complexity::Moderate);
        profile.unavailable_agents = vec!["marketplace-architect".into()];
        let result = engine().resolve_project_agents(&profile).unwrap();

        assert!(result.position("marketplace-architect").is_none());
        assert!(result.position("fullstack-architect").is_some());
        assert_eq!(result.fallbacks.len(), 1);
        let record = &result.fallbacks[0];
        assert_eq!(record.agent_id, "marketplace-architect");
        assert!(record.substituted);
        assert_eq!(record.outcome.strategy(), FallbackStrategy::Alternative);

        // The substitute covers neither marketplace capability.
        let missing: Vec<_> = result.warnings_of(WarningKind::MissingCapability).collect();
        assert!(missing.iter().any(|w| w.message.contains("vendor_management")));
        assert!(result.needs_manual_review);
    }

    #[test]
    fn unavailable_requirement_is_rewired() {
        let mut profile = ProjectProfile::new(Domain::Healthcare, Complexity::Moderate);
        profile.unavailable_agents = vec!["compliance-specialist".into()];
        let result = engine().resolve_project_agents(&profile).unwrap();

        assert!(result.position("compliance-specialist").is_none());
        let record = result
            .fallbacks
            .iter()
            .find(|f| f.agent_id == "compliance-specialist")
            .unwrap();
        assert_eq!(record.required_by, vec!["healthcare-specialist"]);
        assert!(record.substituted);
        // security-expert replaced compliance-specialist and precedes its dependent.
        let security = result.position("security-expert").unwrap();
        let healthcare = result.position("healthcare-specialist").unwrap();
        assert!(security < healthcare);
        assert_eq!(
            result.dependencies_of("healthcare-specialist"),
            ["security-expert".to_string()]
        );
    }

    #[test]
    fn dependents_of_conflict_loser_get_a_substitute() {
        let catalog = Catalog::from_descriptors(vec![
            AgentDescriptor::leaf("app-developer").requiring(["lite-architect"]),
            AgentDescriptor::leaf("lite-architect").with_priority(5),
            AgentDescriptor::leaf("big-architect")
                .with_priority(10)
                .conflicting(["lite-architect"]),
        ])
        .unwrap();
        let tables = SelectionTables {
            domain_agents: BTreeMap::from([(
                Domain::General,
                vec!["app-developer".to_string(), "big-architect".to_string()],
            )]),
            complexity_agents: BTreeMap::new(),
            ..SelectionTables::default()
        };
        let e = SelectionEngine::new(Arc::new(catalog)).with_selection_tables(tables);
        let profile = ProjectProfile::new(Domain::General, Complexity::Moderate);
        let result = e.resolve_project_agents(&profile).unwrap();

        assert_eq!(result.removed_agents, vec!["lite-architect"]);
        assert_eq!(
            result.ordered_agents,
            vec!["generic-architect", "app-developer", "big-architect"]
        );
        assert_eq!(result.fallbacks.len(), 1);
        let record = &result.fallbacks[0];
        assert_eq!(record.agent_id, "lite-architect");
        assert_eq!(record.required_by, vec!["app-developer"]);
        assert!(record.substituted);
        assert_eq!(record.outcome.strategy(), FallbackStrategy::Generic);
        assert_eq!(
            result.dependencies_of("app-developer"),
            ["generic-architect".to_string()]
        );

        let fallback: Vec<_> = result.warnings_of(WarningKind::FallbackApplied).collect();
        assert_eq!(fallback.len(), 1);
        assert!(fallback[0].message.contains("was dropped in a conflict"));
        assert!(!fallback[0].message.contains("unavailable"));
    }

    #[test]
    fn generic_substitute_is_synthesized() {
        let mut profile = ProjectProfile::new(Domain::General, Complexity::Moderate);
        profile.requested_agents = vec!["data-analyst".into()];
        profile.unavailable_agents = vec!["data-analyst".into()];
        let result = engine().resolve_project_agents(&profile).unwrap();
        assert!(result.position("generic-analyst").is_some());
        assert!(result.warnings_of(WarningKind::UnregisteredAgent).next().is_none());
    }

    #[test]
    fn partial_outcome_leaves_requirement_missing() {
        let mut profile = ProjectProfile::new(Domain::Ecommerce, Complexity::Moderate);
        profile.unavailable_agents = vec!["payment-specialist".into()];
        let result = engine().resolve_project_agents(&profile).unwrap();
        assert!(result.position("payment-specialist").is_none());
        assert!(result.position("ecommerce-specialist").is_some());
        let record = &result.fallbacks[0];
        assert!(!record.substituted);
        assert_eq!(record.outcome.strategy(), FallbackStrategy::Partial);
        assert!(result
            .warnings_of(WarningKind::MissingCapability)
            .any(|w| w.message.contains("payment_integration")));
    }

    #[test]
    fn unregistered_agent_warns_and_penalizes() {
        let mut profile = ProjectProfile::new(Domain::General, Complexity::Moderate);
        profile.requested_agents = vec!["in-house-helper".into()];
        let result = engine().resolve_project_agents(&profile).unwrap();
        assert!(result.position("in-house-helper").is_some());
        assert_eq!(result.warnings_of(WarningKind::UnregisteredAgent).count(), 1);
        assert!((result.confidence - 0.95).abs() < 1e-9);
    }

    #[test]
    fn oversized_selection_is_penalized() {
        let mut settings = Settings::default();
        settings.resolution.max_agents = 3;
        let e = engine().with_settings(&settings);
        let profile = ProjectProfile::new(Domain::Marketplace, Complexity::Moderate);
        let result = e.resolve_project_agents(&profile).unwrap();
        assert_eq!(result.warnings_of(WarningKind::Oversized).count(), 1);
        assert!((result.confidence - 0.9).abs() < 1e-9);
    }

    #[test]
    fn low_confidence_is_flagged_and_auto_accepted() {
        let mut settings = Settings::default();
        settings.resolution.confidence_threshold = 0.95;
        let e = engine().with_settings(&settings);
        let profile = ProjectProfile::new(Domain::Marketplace, Complexity::Simple);
        let result = e.resolve_project_agents(&profile).unwrap();
        assert!(result.needs_manual_review);
        assert_eq!(result.warnings_of(WarningKind::LowConfidence).count(), 1);
    }

    #[test]
    fn strict_review_rejects_low_confidence() {
        let mut settings = Settings::default();
        settings.resolution.confidence_threshold = 0.95;
        settings.review.strict = true;
        let e = engine().with_settings(&settings);
        let profile = ProjectProfile::new(Domain::Marketplace, Complexity::Simple);
        let err = e.resolve_project_agents(&profile).unwrap_err();
        assert!(matches!(err, KickoffError::ReviewRejected { .. }));
        // Rejected results are not cached.
        assert_eq!(e.cache_stats().entries, 0);
    }

    #[test]
    fn cycle_in_catalog_is_fatal() {
        let catalog = Catalog::from_descriptors(vec![
            AgentDescriptor::leaf("a").requiring(["b"]),
            AgentDescriptor::leaf("b").requiring(["c"]),
            AgentDescriptor::leaf("c").requiring(["a"]),
        ])
        .unwrap();
        let tables = SelectionTables {
            domain_agents: BTreeMap::from([(Domain::General, vec!["a".to_string()])]),
            ..SelectionTables::default()
        };
        let e = SelectionEngine::new(Arc::new(catalog)).with_selection_tables(tables);
        let profile = ProjectProfile::new(Domain::General, Complexity::Simple);
        let err = e.resolve_project_agents(&profile).unwrap_err();
        let KickoffError::CircularDependency(id) = err else {
            panic!("expected a cycle error");
        };
        assert!(["a", "b", "c"].contains(&id.as_str()));
    }

    #[test]
    fn invalid_profile_fails_before_resolution() {
        let mut profile = ProjectProfile::default();
        profile.unavailable_agents = vec!["Bad Id".into()];
        let err = engine().resolve_project_agents(&profile).unwrap_err();
        assert!(matches!(err, KickoffError::InvalidProfile(_)));
    }

    #[test]
    fn confidence_never_goes_negative() {
        let warnings: Vec<_> = (0..20)
            .map(|i| ResolutionWarning::new(WarningKind::ConflictResolved, format!("w{i}")))
            .collect();
        assert_eq!(confidence(&warnings, &Penalties::default()), 0.0);
        assert_eq!(confidence(&[], &Penalties::default()), 1.0);
    }
}
