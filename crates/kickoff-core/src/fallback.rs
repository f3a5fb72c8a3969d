//! Fallback chain for agents that cannot be activated.
//!
//! Strategies run in a fixed order and the first one that produces an outcome
//! wins:
//!
//! 1. alternative agent (static substitute table)
//! 2. generic agent for the coarse domain the id belongs to
//! 3. partial functionality (reduced feature flags)
//! 4. manual escalation (always succeeds)
//!
//! Every attempt is recorded in a [`FallbackTracker`] so repeated trouble with
//! the same agent shows up in [`FallbackManager::stats`].

use crate::catalog::Catalog;
use crate::config::{ConfigWarning, WarnLevel};
use crate::profile::ProjectProfile;
use crate::types::Complexity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, VecDeque};
use std::fmt;
use std::sync::{Arc, Mutex};

// ---------------------------------------------------------------------------
// GenericDomain
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GenericDomain {
    Architecture,
    Development,
    Security,
    Analysis,
    Testing,
}

impl GenericDomain {
    pub fn as_str(self) -> &'static str {
        match self {
            GenericDomain::Architecture => "architecture",
            GenericDomain::Development => "development",
            GenericDomain::Security => "security",
            GenericDomain::Analysis => "analysis",
            GenericDomain::Testing => "testing",
        }
    }
}

impl fmt::Display for GenericDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Best-effort coarse classification of an agent id by substring.
///
/// Testing and security are checked before development so that ids like
/// `qa-engineer` or `security-engineer` do not land in the generic developer
/// bucket. Returns `None` when nothing matches.
pub fn classify_agent_domain(agent_id: &str) -> Option<GenericDomain> {
    const RULES: &[(GenericDomain, &[&str])] = &[
        (GenericDomain::Architecture, &["architect"]),
        (GenericDomain::Testing, &["test", "qa"]),
        (GenericDomain::Security, &["security", "auth", "compliance"]),
        (GenericDomain::Analysis, &["analy", "data", "research"]),
        (GenericDomain::Development, &["developer", "engineer", "dev"]),
    ];
    let id = agent_id.to_ascii_lowercase();
    RULES
        .iter()
        .find(|(_, needles)| needles.iter().any(|n| id.contains(n)))
        .map(|(domain, _)| *domain)
}

// ---------------------------------------------------------------------------
// Outcome types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityDiff {
    /// Capabilities the unavailable agent had that the substitute lacks.
    pub missing: BTreeSet<String>,
    /// Capabilities the substitute brings that the original did not.
    pub extra: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Urgency::Low => "low",
            Urgency::Medium => "medium",
            Urgency::High => "high",
            Urgency::Critical => "critical",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterventionPhase {
    pub name: String,
    pub description: String,
    pub estimated_hours: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum FallbackOutcome {
    AlternativeAgent {
        agent_id: String,
        capability_diff: CapabilityDiff,
    },
    GenericAgent {
        agent_id: String,
        domain: GenericDomain,
        capabilities: Vec<String>,
        limitations: Vec<String>,
    },
    PartialFunctionality {
        features: Vec<String>,
        limitations: Vec<String>,
    },
    ManualEscalation {
        plan: Vec<InterventionPhase>,
        urgency: Urgency,
        estimated_effort: String,
    },
}

impl FallbackOutcome {
    pub fn strategy(&self) -> FallbackStrategy {
        match self {
            FallbackOutcome::AlternativeAgent { .. } => FallbackStrategy::Alternative,
            FallbackOutcome::GenericAgent { .. } => FallbackStrategy::Generic,
            FallbackOutcome::PartialFunctionality { .. } => FallbackStrategy::Partial,
            FallbackOutcome::ManualEscalation { .. } => FallbackStrategy::ManualEscalation,
        }
    }

    /// The agent that stands in for the unavailable one, if any.
    pub fn substitute(&self) -> Option<&str> {
        match self {
            FallbackOutcome::AlternativeAgent { agent_id, .. }
            | FallbackOutcome::GenericAgent { agent_id, .. } => Some(agent_id),
            _ => None,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            FallbackOutcome::AlternativeAgent {
                agent_id,
                capability_diff,
            } => {
                if capability_diff.missing.is_empty() {
                    format!("substituted '{agent_id}'")
                } else {
                    let missing: Vec<&str> =
                        capability_diff.missing.iter().map(String::as_str).collect();
                    format!("substituted '{agent_id}' (missing: {})", missing.join(", "))
                }
            }
            FallbackOutcome::GenericAgent {
                agent_id, domain, ..
            } => format!("substituted generic {domain} agent '{agent_id}'"),
            FallbackOutcome::PartialFunctionality { features, .. } => {
                format!("running in degraded mode with: {}", features.join(", "))
            }
            FallbackOutcome::ManualEscalation {
                urgency,
                estimated_effort,
                ..
            } => format!("escalated for manual setup ({urgency} urgency, {estimated_effort})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FallbackStrategy {
    Alternative,
    Generic,
    Partial,
    ManualEscalation,
}

impl FallbackStrategy {
    pub fn as_str(self) -> &'static str {
        match self {
            FallbackStrategy::Alternative => "alternative",
            FallbackStrategy::Generic => "generic",
            FallbackStrategy::Partial => "partial",
            FallbackStrategy::ManualEscalation => "manual_escalation",
        }
    }
}

impl fmt::Display for FallbackStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// FallbackTables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenericAgentSpec {
    pub agent_id: String,
    pub capabilities: Vec<String>,
    pub limitations: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialFeatures {
    pub features: Vec<String>,
    #[serde(default)]
    pub limitations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackTables {
    #[serde(default)]
    pub alternatives: HashMap<String, String>,
    #[serde(default)]
    pub generic: BTreeMap<GenericDomain, GenericAgentSpec>,
    #[serde(default)]
    pub partial: HashMap<String, PartialFeatures>,
    #[serde(default)]
    pub effort: HashMap<String, String>,
    #[serde(default = "default_effort")]
    pub default_effort: String,
    #[serde(default)]
    pub critical_agents: BTreeSet<String>,
}

fn default_effort() -> String {
    "1-2 days".to_string()
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for FallbackTables {
    fn default() -> Self {
        let alternatives = [
            ("marketplace-architect", "fullstack-architect"),
            ("saas-architect", "fullstack-architect"),
            ("fintech-architect", "fullstack-architect"),
            ("social-platform-architect", "fullstack-architect"),
            ("ecommerce-specialist", "fullstack-architect"),
            ("healthcare-specialist", "compliance-specialist"),
            ("compliance-specialist", "security-expert"),
            ("mobile-developer", "frontend-developer"),
            ("realtime-specialist", "backend-developer"),
            ("performance-engineer", "devops-engineer"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let mut generic = BTreeMap::new();
        generic.insert(
            GenericDomain::Architecture,
            GenericAgentSpec {
                agent_id: "generic-architect".into(),
                capabilities: strings(&["system_architecture", "api_design"]),
                limitations: strings(&[
                    "No domain-specific architecture patterns",
                    "Scaling guidance limited to common defaults",
                ]),
            },
        );
        generic.insert(
            GenericDomain::Development,
            GenericAgentSpec {
                agent_id: "generic-developer".into(),
                capabilities: strings(&["api_implementation", "ui_implementation"]),
                limitations: strings(&["No framework-specific conventions"]),
            },
        );
        generic.insert(
            GenericDomain::Security,
            GenericAgentSpec {
                agent_id: "generic-security".into(),
                capabilities: strings(&["security_review"]),
                limitations: strings(&[
                    "Baseline checklist only",
                    "No regulatory compliance coverage",
                ]),
            },
        );
        generic.insert(
            GenericDomain::Analysis,
            GenericAgentSpec {
                agent_id: "generic-analyst".into(),
                capabilities: strings(&["analytics", "reporting"]),
                limitations: strings(&["No custom data pipelines"]),
            },
        );
        generic.insert(
            GenericDomain::Testing,
            GenericAgentSpec {
                agent_id: "generic-tester".into(),
                capabilities: strings(&["test_automation"]),
                limitations: strings(&["Unit-level coverage only"]),
            },
        );

        let partial = [
            (
                "payment-specialist",
                &["manual_invoicing", "hosted_checkout_link"][..],
                &["No automated payouts", "Refunds handled by hand"][..],
            ),
            (
                "cultural-expert",
                &["single_locale", "static_translations"][..],
                &["No right-to-left layouts", "No regional formatting"][..],
            ),
            (
                "content-strategist",
                &["basic_pages"][..],
                &["No editorial workflow"][..],
            ),
            (
                "education-specialist",
                &["static_course_pages"][..],
                &["No progress tracking"][..],
            ),
        ]
        .into_iter()
        .map(|(id, features, limitations)| {
            (
                id.to_string(),
                PartialFeatures {
                    features: strings(features),
                    limitations: strings(limitations),
                },
            )
        })
        .collect();

        let effort = [
            ("marketplace-architect", "1-2 weeks"),
            ("fintech-architect", "2-3 weeks"),
            ("healthcare-specialist", "2-3 weeks"),
            ("compliance-specialist", "1-2 weeks"),
            ("payment-specialist", "3-5 days"),
            ("security-expert", "3-5 days"),
            ("cultural-expert", "2-4 days"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let critical_agents = [
            "security-expert",
            "payment-specialist",
            "compliance-specialist",
            "fintech-architect",
            "healthcare-specialist",
            "marketplace-architect",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        Self {
            alternatives,
            generic,
            partial,
            effort,
            default_effort: default_effort(),
            critical_agents,
        }
    }
}

impl FallbackTables {
    /// Flag table entries that point at agents the catalog does not know.
    pub fn validate(&self, catalog: &Catalog) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let mut alternatives: Vec<_> = self.alternatives.iter().collect();
        alternatives.sort();
        for (agent, alternative) in alternatives {
            if agent == alternative {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("fallback alternative for '{agent}' is itself"),
                });
            } else if !catalog.contains(alternative) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "fallback alternative '{alternative}' for '{agent}' is not in the catalog"
                    ),
                });
            }
        }
        for agent in &self.critical_agents {
            if !catalog.contains(agent) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!("critical agent '{agent}' is not in the catalog"),
                });
            }
        }
        warnings
    }
}

// ---------------------------------------------------------------------------
// FallbackTracker
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackAttempt {
    pub strategy: FallbackStrategy,
    pub succeeded: bool,
    pub at: DateTime<Utc>,
}

/// Attempts kept per agent; older ones only survive in the counters.
pub const HISTORY_LIMIT: usize = 32;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentFallbackLog {
    pub attempts: u32,
    pub failures: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_success: Option<FallbackStrategy>,
    /// Most recent attempts, oldest first, at most [`HISTORY_LIMIT`].
    pub history: VecDeque<FallbackAttempt>,
}

/// Per-agent attempt counters plus a bounded history of recent attempts.
#[derive(Debug, Default)]
pub struct FallbackTracker {
    agents: HashMap<String, AgentFallbackLog>,
}

impl FallbackTracker {
    pub fn record(&mut self, agent_id: &str, strategy: FallbackStrategy, succeeded: bool) {
        let log = self.agents.entry(agent_id.to_string()).or_default();
        log.attempts += 1;
        if succeeded {
            log.last_success = Some(strategy);
        } else {
            log.failures += 1;
        }
        if log.history.len() == HISTORY_LIMIT {
            log.history.pop_front();
        }
        log.history.push_back(FallbackAttempt {
            strategy,
            succeeded,
            at: Utc::now(),
        });
    }

    pub fn log_for(&self, agent_id: &str) -> Option<&AgentFallbackLog> {
        self.agents.get(agent_id)
    }

    pub fn stats(&self) -> FallbackStats {
        let mut stats = FallbackStats::default();
        for (agent_id, log) in &self.agents {
            stats.total_attempts += log.attempts;
            stats.total_failures += log.failures;
            let resolved_by = log.last_success;
            if let Some(strategy) = resolved_by {
                *stats
                    .successes_by_strategy
                    .entry(strategy.as_str().to_string())
                    .or_insert(0) += 1;
            }
            stats.agents.push(AgentFallbackSummary {
                agent_id: agent_id.clone(),
                attempts: log.attempts,
                failures: log.failures,
                resolved_by,
            });
        }
        stats
            .agents
            .sort_by(|a, b| b.failures.cmp(&a.failures).then_with(|| a.agent_id.cmp(&b.agent_id)));
        stats
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FallbackStats {
    pub total_attempts: u32,
    pub total_failures: u32,
    pub successes_by_strategy: BTreeMap<String, u32>,
    /// Most failures first.
    pub agents: Vec<AgentFallbackSummary>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentFallbackSummary {
    pub agent_id: String,
    pub attempts: u32,
    pub failures: u32,
    pub resolved_by: Option<FallbackStrategy>,
}

// ---------------------------------------------------------------------------
// FallbackManager
// ---------------------------------------------------------------------------

pub struct FallbackManager {
    catalog: Arc<Catalog>,
    tables: FallbackTables,
    tracker: Mutex<FallbackTracker>,
}

impl FallbackManager {
    pub fn new(catalog: Arc<Catalog>, tables: FallbackTables) -> Self {
        Self {
            catalog,
            tables,
            tracker: Mutex::new(FallbackTracker::default()),
        }
    }

    pub fn tables(&self) -> &FallbackTables {
        &self.tables
    }

    /// Walk the fallback chain for `agent_id`. Never fails: manual escalation
    /// is the terminal strategy.
    pub fn handle_unavailable(&self, agent_id: &str, profile: &ProjectProfile) -> FallbackOutcome {
        tracing::debug!(agent = agent_id, "running fallback chain");

        let attempts: [(FallbackStrategy, fn(&Self, &str) -> Option<FallbackOutcome>); 3] = [
            (FallbackStrategy::Alternative, Self::try_alternative),
            (FallbackStrategy::Generic, Self::try_generic),
            (FallbackStrategy::Partial, Self::try_partial),
        ];
        for (strategy, attempt) in attempts {
            let outcome = attempt(self, agent_id);
            self.record(agent_id, strategy, outcome.is_some());
            if let Some(outcome) = outcome {
                tracing::info!(agent = agent_id, %strategy, "{}", outcome.summary());
                return outcome;
            }
        }

        let outcome = self.escalate(agent_id, profile.complexity());
        self.record(agent_id, FallbackStrategy::ManualEscalation, true);
        tracing::warn!(agent = agent_id, "{}", outcome.summary());
        outcome
    }

    pub fn stats(&self) -> FallbackStats {
        self.tracker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .stats()
    }

    pub fn attempts_for(&self, agent_id: &str) -> u32 {
        self.tracker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .log_for(agent_id)
            .map(|log| log.attempts)
            .unwrap_or(0)
    }

    fn record(&self, agent_id: &str, strategy: FallbackStrategy, succeeded: bool) {
        self.tracker
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .record(agent_id, strategy, succeeded);
    }

    fn try_alternative(&self, agent_id: &str) -> Option<FallbackOutcome> {
        let alternative = self.tables.alternatives.get(agent_id)?;
        if alternative == agent_id {
            return None;
        }
        let original = self.catalog.capabilities_of(agent_id);
        let substitute = self.catalog.capabilities_of(alternative);
        let capability_diff = CapabilityDiff {
            missing: original.difference(&substitute).cloned().collect(),
            extra: substitute.difference(&original).cloned().collect(),
        };
        if !capability_diff.missing.is_empty() {
            tracing::info!(
                agent = agent_id,
                alternative = %alternative,
                missing = ?capability_diff.missing,
                "alternative lacks capabilities"
            );
        }
        Some(FallbackOutcome::AlternativeAgent {
            agent_id: alternative.clone(),
            capability_diff,
        })
    }

    fn try_generic(&self, agent_id: &str) -> Option<FallbackOutcome> {
        let domain = classify_agent_domain(agent_id)?;
        let spec = self.tables.generic.get(&domain)?;
        if spec.agent_id == agent_id {
            return None;
        }
        Some(FallbackOutcome::GenericAgent {
            agent_id: spec.agent_id.clone(),
            domain,
            capabilities: spec.capabilities.clone(),
            limitations: spec.limitations.clone(),
        })
    }

    fn try_partial(&self, agent_id: &str) -> Option<FallbackOutcome> {
        let partial = self.tables.partial.get(agent_id)?;
        if partial.features.is_empty() {
            return None;
        }
        Some(FallbackOutcome::PartialFunctionality {
            features: partial.features.clone(),
            limitations: partial.limitations.clone(),
        })
    }

    fn escalate(&self, agent_id: &str, complexity: Complexity) -> FallbackOutcome {
        let critical = self.tables.critical_agents.contains(agent_id);
        let urgency = match (critical, complexity.is_high()) {
            (true, true) => Urgency::Critical,
            (true, false) => Urgency::High,
            (false, true) => Urgency::Medium,
            (false, false) => Urgency::Low,
        };
        let estimated_effort = self
            .tables
            .effort
            .get(agent_id)
            .cloned()
            .unwrap_or_else(|| self.tables.default_effort.clone());

        FallbackOutcome::ManualEscalation {
            plan: intervention_plan(agent_id, complexity),
            urgency,
            estimated_effort,
        }
    }
}

fn intervention_plan(agent_id: &str, complexity: Complexity) -> Vec<InterventionPhase> {
    let phase = |name: &str, description: String, hours: f64| InterventionPhase {
        name: name.to_string(),
        description,
        estimated_hours: hours,
    };
    vec![
        phase(
            "Analysis",
            format!("Identify which responsibilities of '{agent_id}' the project depends on"),
            2.0,
        ),
        phase(
            "Research",
            format!("Find a replacement tool, agent or specialist covering '{agent_id}'"),
            4.0,
        ),
        phase(
            "Implementation",
            format!("Configure the replacement for '{agent_id}' by hand"),
            8.0 * complexity.effort_factor(),
        ),
        phase(
            "Validation",
            "Verify the generated configuration end to end".to_string(),
            2.0,
        ),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Domain;

    fn manager() -> FallbackManager {
        FallbackManager::new(Arc::new(Catalog::builtin()), FallbackTables::default())
    }

    fn profile(complexity: Complexity) -> ProjectProfile {
        ProjectProfile::new(Domain::Marketplace, complexity)
    }

    #[test]
    fn classify_agent_domain_by_substring() {
        assert_eq!(
            classify_agent_domain("marketplace-architect"),
            Some(GenericDomain::Architecture)
        );
        assert_eq!(classify_agent_domain("qa-engineer"), Some(GenericDomain::Testing));
        assert_eq!(classify_agent_domain("security-expert"), Some(GenericDomain::Security));
        assert_eq!(classify_agent_domain("data-analyst"), Some(GenericDomain::Analysis));
        assert_eq!(
            classify_agent_domain("backend-developer"),
            Some(GenericDomain::Development)
        );
        assert_eq!(classify_agent_domain("payment-specialist"), None);
    }

    #[test]
    fn alternative_agent_with_capability_diff() {
        let outcome = manager().handle_unavailable("marketplace-architect", &profile(Complexity::Moderate));
        let FallbackOutcome::AlternativeAgent {
            agent_id,
            capability_diff,
        } = outcome
        else {
            panic!("expected an alternative agent");
        };
        assert_eq!(agent_id, "fullstack-architect");
        assert!(capability_diff.missing.contains("marketplace_architecture"));
        assert!(capability_diff.missing.contains("vendor_management"));
        assert!(capability_diff.extra.contains("api_design"));
    }

    #[test]
    fn generic_agent_when_no_alternative() {
        let outcome = manager().handle_unavailable("data-analyst", &profile(Complexity::Simple));
        match outcome {
            FallbackOutcome::GenericAgent {
                agent_id,
                domain,
                capabilities,
                limitations,
            } => {
                assert_eq!(agent_id, "generic-analyst");
                assert_eq!(domain, GenericDomain::Analysis);
                assert!(capabilities.contains(&"analytics".to_string()));
                assert!(!limitations.is_empty());
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn partial_functionality_when_unclassifiable() {
        let outcome = manager().handle_unavailable("payment-specialist", &profile(Complexity::Simple));
        let FallbackOutcome::PartialFunctionality { features, .. } = outcome else {
            panic!("expected partial functionality");
        };
        assert_eq!(features, vec!["manual_invoicing", "hosted_checkout_link"]);
    }

    #[test]
    fn unknown_agent_escalates() {
        let outcome = manager().handle_unavailable("zz-unheard-of", &profile(Complexity::Simple));
        match outcome {
            FallbackOutcome::ManualEscalation {
                plan,
                urgency,
                estimated_effort,
            } => {
                let names: Vec<&str> = plan.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, vec!["Analysis", "Research", "Implementation", "Validation"]);
                assert_eq!(urgency, Urgency::Low);
                assert_eq!(estimated_effort, "1-2 days");
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn escalation_urgency_and_effort() {
        let mut tables = FallbackTables::default();
        tables.partial.clear();
        let m = FallbackManager::new(Arc::new(Catalog::builtin()), tables);

        let outcome = m.handle_unavailable("payment-specialist", &profile(Complexity::VeryComplex));
        let FallbackOutcome::ManualEscalation {
            plan,
            urgency,
            estimated_effort,
        } = outcome
        else {
            panic!("expected escalation");
        };
        assert_eq!(urgency, Urgency::Critical);
        assert_eq!(estimated_effort, "3-5 days");
        assert_eq!(plan[2].estimated_hours, 16.0);

        let outcome = m.handle_unavailable("payment-specialist", &profile(Complexity::Simple));
        assert!(matches!(
            outcome,
            FallbackOutcome::ManualEscalation { urgency: Urgency::High, .. }
        ));

        let outcome = m.handle_unavailable("zz-custom", &profile(Complexity::Complex));
        assert!(matches!(
            outcome,
            FallbackOutcome::ManualEscalation { urgency: Urgency::Medium, .. }
        ));
    }

    #[test]
    fn tracker_counts_every_attempt() {
        let m = manager();
        let p = profile(Complexity::Simple);
        m.handle_unavailable("zz-unheard-of", &p);
        // alternative, generic, partial fail; escalation succeeds
        assert_eq!(m.attempts_for("zz-unheard-of"), 4);

        m.handle_unavailable("marketplace-architect", &p);
        assert_eq!(m.attempts_for("marketplace-architect"), 1);

        let stats = m.stats();
        assert_eq!(stats.total_attempts, 5);
        assert_eq!(stats.total_failures, 3);
        assert_eq!(stats.agents[0].agent_id, "zz-unheard-of");
        assert_eq!(
            stats.agents[0].resolved_by,
            Some(FallbackStrategy::ManualEscalation)
        );
        assert_eq!(stats.successes_by_strategy.get("alternative"), Some(&1));
    }

    #[test]
    fn tracker_survives_sequential_reuse() {
        let m = manager();
        let p = profile(Complexity::Simple);
        for _ in 0..3 {
            m.handle_unavailable("marketplace-architect", &p);
        }
        assert_eq!(m.attempts_for("marketplace-architect"), 3);
    }

    #[test]
    fn tracker_history_is_bounded() {
        let mut tracker = FallbackTracker::default();
        tracker.record("busy-agent", FallbackStrategy::Alternative, true);
        for _ in 0..HISTORY_LIMIT * 3 {
            tracker.record("busy-agent", FallbackStrategy::Generic, false);
        }
        let log = tracker.log_for("busy-agent").unwrap();
        assert_eq!(log.history.len(), HISTORY_LIMIT);
        assert_eq!(log.attempts as usize, HISTORY_LIMIT * 3 + 1);
        assert!(log.history.iter().all(|a| !a.succeeded));
        // The success fell out of the history but is still counted.
        assert_eq!(
            tracker.stats().agents[0].resolved_by,
            Some(FallbackStrategy::Alternative)
        );
    }

    #[test]
    fn builtin_tables_validate_against_builtin_catalog() {
        let catalog = Catalog::builtin();
        assert!(FallbackTables::default().validate(&catalog).is_empty());

        let mut tables = FallbackTables::default();
        tables
            .alternatives
            .insert("qa-engineer".into(), "ghost-tester".into());
        tables
            .alternatives
            .insert("data-analyst".into(), "data-analyst".into());
        let warnings = tables.validate(&catalog);
        assert_eq!(warnings.len(), 2);
        assert!(warnings.iter().any(|w| w.message.contains("ghost-tester")));
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("itself")));
    }

    #[test]
    fn outcome_serializes_with_strategy_tag() {
        let outcome = FallbackOutcome::PartialFunctionality {
            features: vec!["basic_pages".into()],
            limitations: vec![],
        };
        let yaml = serde_yaml::to_string(&outcome).unwrap();
        assert!(yaml.contains("strategy: partial_functionality"));
        assert_eq!(outcome.strategy(), FallbackStrategy::Partial);
        assert!(outcome.substitute().is_none());
    }
}
