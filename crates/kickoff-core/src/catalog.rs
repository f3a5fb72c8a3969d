//! Capability catalog: agent id → requires / conflicts / provides / priority.
//!
//! The catalog is immutable once built. A project may override the compiled-in
//! catalog with `.kickoff/catalog.yaml`, which can also carry replacement
//! selection and fallback tables.

use crate::config::{ConfigWarning, WarnLevel};
use crate::error::{KickoffError, Result};
use crate::fallback::FallbackTables;
use crate::paths;
use crate::selection::SelectionTables;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;

// ---------------------------------------------------------------------------
// AgentDescriptor
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentDescriptor {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub requires: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub conflicts: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub provides: BTreeSet<String>,
    #[serde(default)]
    pub priority: i32,
}

impl AgentDescriptor {
    /// Empty leaf descriptor used for agents the catalog does not know.
    pub fn leaf(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            requires: BTreeSet::new(),
            conflicts: BTreeSet::new(),
            provides: BTreeSet::new(),
            priority: 0,
        }
    }

    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn requiring<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.requires.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn conflicting<I, S>(mut self, ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.conflicts.extend(ids.into_iter().map(Into::into));
        self
    }

    pub fn providing<I, S>(mut self, capabilities: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.provides.extend(capabilities.into_iter().map(Into::into));
        self
    }
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default)]
pub struct Catalog {
    agents: HashMap<String, AgentDescriptor>,
}

impl Catalog {
    /// Build a catalog, rejecting duplicate ids and self-referencing entries.
    pub fn from_descriptors(descriptors: Vec<AgentDescriptor>) -> Result<Self> {
        let mut agents = HashMap::with_capacity(descriptors.len());
        for desc in descriptors {
            paths::validate_slug(&desc.id)?;
            if desc.requires.contains(&desc.id) {
                return Err(KickoffError::InvalidCatalog(format!(
                    "agent '{}' requires itself",
                    desc.id
                )));
            }
            if desc.conflicts.contains(&desc.id) {
                return Err(KickoffError::InvalidCatalog(format!(
                    "agent '{}' conflicts with itself",
                    desc.id
                )));
            }
            if agents.contains_key(&desc.id) {
                return Err(KickoffError::InvalidCatalog(format!(
                    "agent '{}' is declared more than once",
                    desc.id
                )));
            }
            agents.insert(desc.id.clone(), desc);
        }
        Ok(Self { agents })
    }

    pub fn builtin() -> Self {
        let mut agents = HashMap::new();
        for desc in builtin_agents() {
            agents.insert(desc.id.clone(), desc);
        }
        Self { agents }
    }

    pub fn lookup(&self, id: &str) -> Option<&AgentDescriptor> {
        self.agents.get(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.agents.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.agents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.agents.is_empty()
    }

    /// All descriptors in id order.
    pub fn iter(&self) -> impl Iterator<Item = &AgentDescriptor> {
        let mut all: Vec<&AgentDescriptor> = self.agents.values().collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all.into_iter()
    }

    /// Agents that provide `capability`, sorted by id.
    pub fn providers_of(&self, capability: &str) -> Vec<String> {
        let mut ids: Vec<String> = self
            .agents
            .values()
            .filter(|a| a.provides.contains(capability))
            .map(|a| a.id.clone())
            .collect();
        ids.sort();
        ids
    }

    /// Capabilities an agent provides; empty for unknown agents.
    pub fn capabilities_of(&self, id: &str) -> BTreeSet<String> {
        self.lookup(id)
            .map(|a| a.provides.clone())
            .unwrap_or_default()
    }

    /// References to agents the catalog does not define. Such references are
    /// legal (they resolve to leaves) but usually indicate a typo.
    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        for desc in self.iter() {
            for dep in &desc.requires {
                if !self.contains(dep) {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "agent '{}' requires unknown agent '{}'",
                            desc.id, dep
                        ),
                    });
                }
            }
            for other in &desc.conflicts {
                if !self.contains(other) {
                    warnings.push(ConfigWarning {
                        level: WarnLevel::Warning,
                        message: format!(
                            "agent '{}' conflicts with unknown agent '{}'",
                            desc.id, other
                        ),
                    });
                }
            }
        }
        warnings
    }
}

// ---------------------------------------------------------------------------
// CatalogFile
// ---------------------------------------------------------------------------

/// On-disk shape of `.kickoff/catalog.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    #[serde(default = "default_version")]
    pub version: u32,
    pub agents: Vec<AgentDescriptor>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selection: Option<SelectionTables>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackTables>,
}

fn default_version() -> u32 {
    1
}

impl CatalogFile {
    pub fn builtin() -> Self {
        Self {
            version: 1,
            agents: Catalog::builtin().iter().cloned().collect(),
            selection: None,
            fallback: None,
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let file: CatalogFile = serde_yaml::from_str(&data)?;
        Ok(file)
    }

    /// Load the project catalog if one exists, else the compiled-in catalog.
    pub fn load_or_builtin(root: &Path) -> Result<Self> {
        let path = paths::catalog_path(root);
        if path.exists() {
            tracing::debug!(path = %path.display(), "loading project catalog");
            Self::load(&path)
        } else {
            Ok(Self::builtin())
        }
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&paths::catalog_path(root), data.as_bytes())
    }

    pub fn catalog(&self) -> Result<Catalog> {
        Catalog::from_descriptors(self.agents.clone())
    }

    pub fn selection_tables(&self) -> SelectionTables {
        self.selection.clone().unwrap_or_default()
    }

    pub fn fallback_tables(&self) -> FallbackTables {
        self.fallback.clone().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Built-in agents
// ---------------------------------------------------------------------------

fn agent(id: &str, priority: i32, description: &str) -> AgentDescriptor {
    AgentDescriptor::leaf(id)
        .with_priority(priority)
        .with_description(description)
}

fn builtin_agents() -> Vec<AgentDescriptor> {
    vec![
        agent("marketplace-architect", 10, "Designs multi-sided marketplace platforms")
            .requiring(["cultural-expert", "payment-specialist"])
            .conflicting(["simple-architect"])
            .providing([
                "marketplace_architecture",
                "vendor_management",
                "commission_models",
                "multi_sided_platform",
            ]),
        agent("simple-architect", 5, "Lightweight architecture for small projects")
            .conflicting(["marketplace-architect", "saas-architect", "fintech-architect"])
            .providing(["basic_architecture"]),
        agent("fullstack-architect", 8, "General full-stack system architecture")
            .providing([
                "system_architecture",
                "api_design",
                "frontend_architecture",
                "backend_architecture",
            ]),
        agent("saas-architect", 9, "Multi-tenant SaaS architecture and subscriptions")
            .requiring(["security-expert"])
            .conflicting(["simple-architect"])
            .providing(["multi_tenancy", "subscription_management", "system_architecture"]),
        agent("fintech-architect", 10, "Ledgers, transaction processing and money movement")
            .requiring(["security-expert", "compliance-specialist", "payment-specialist"])
            .conflicting(["simple-architect"])
            .providing(["ledger_design", "transaction_processing", "financial_architecture"]),
        agent("cultural-expert", 6, "Localization and cultural adaptation")
            .providing(["localization", "cultural_adaptation", "rtl_support"]),
        agent("payment-specialist", 8, "Payment gateways, payouts and refunds")
            .requiring(["security-expert"])
            .providing(["payment_integration", "payment_gateways", "refund_flows"]),
        agent("security-expert", 9, "Threat modeling, authentication and data protection")
            .providing(["security_review", "authentication", "data_protection"]),
        agent("compliance-specialist", 7, "Regulatory compliance and audit trails")
            .requiring(["security-expert"])
            .providing(["regulatory_compliance", "audit_logging", "data_protection"]),
        agent("healthcare-specialist", 8, "Clinical workflows and patient data handling")
            .requiring(["compliance-specialist"])
            .providing(["hipaa_compliance", "patient_data_modeling", "clinical_workflows"]),
        agent("ecommerce-specialist", 8, "Catalogs, carts, checkout and inventory")
            .requiring(["payment-specialist"])
            .providing(["catalog_management", "cart_checkout", "inventory_management"]),
        agent("education-specialist", 7, "Courses, assessments and learning analytics")
            .providing(["course_management", "learning_analytics", "assessment_design"]),
        agent("social-platform-architect", 8, "Social graphs, feeds and moderation")
            .requiring(["security-expert"])
            .providing(["social_graph", "activity_feeds", "content_moderation"]),
        agent("content-strategist", 6, "Content models, SEO and editorial workflows")
            .providing(["content_modeling", "seo_optimization", "editorial_workflows"]),
        agent("frontend-developer", 6, "UI implementation and accessibility")
            .providing(["ui_implementation", "responsive_design", "accessibility"]),
        agent("backend-developer", 6, "APIs, persistence and background jobs")
            .providing(["api_implementation", "database_design", "background_jobs"]),
        agent("mobile-developer", 6, "Native and cross-platform mobile apps")
            .requiring(["backend-developer"])
            .providing(["mobile_apps", "push_notifications", "offline_sync"]),
        agent("realtime-specialist", 6, "WebSockets, event streams and presence")
            .requiring(["backend-developer"])
            .providing(["websockets", "event_streaming", "presence"]),
        agent("devops-engineer", 7, "CI/CD, infrastructure automation and monitoring")
            .providing(["ci_cd", "infrastructure_automation", "monitoring"]),
        agent("performance-engineer", 6, "Load testing, caching and profiling")
            .requiring(["devops-engineer"])
            .providing(["load_testing", "caching_strategy", "performance_profiling"]),
        agent("data-analyst", 5, "Analytics, reporting and data pipelines")
            .providing(["analytics", "reporting", "data_pipelines"]),
        agent("qa-engineer", 7, "Test automation and regression coverage")
            .providing(["test_automation", "quality_assurance", "regression_testing"]),
    ]
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
