use crate::fallback::FallbackOutcome;
use crate::types::{Complexity, Domain};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

// ---------------------------------------------------------------------------
// ResolutionWarning
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarningKind {
    UnregisteredAgent,
    ConflictResolved,
    CapabilityOverlap,
    MissingCapability,
    FallbackApplied,
    Oversized,
    LowConfidence,
}

impl WarningKind {
    pub fn as_str(self) -> &'static str {
        match self {
            WarningKind::UnregisteredAgent => "unregistered_agent",
            WarningKind::ConflictResolved => "conflict_resolved",
            WarningKind::CapabilityOverlap => "capability_overlap",
            WarningKind::MissingCapability => "missing_capability",
            WarningKind::FallbackApplied => "fallback_applied",
            WarningKind::Oversized => "oversized",
            WarningKind::LowConfidence => "low_confidence",
        }
    }
}

impl fmt::Display for WarningKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionWarning {
    pub kind: WarningKind,
    pub message: String,
}

impl ResolutionWarning {
    pub fn new(kind: WarningKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for ResolutionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.kind, self.message)
    }
}

// ---------------------------------------------------------------------------
// FallbackRecord
// ---------------------------------------------------------------------------

/// One agent that could not be activated and what replaced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FallbackRecord {
    pub agent_id: String,
    /// Agents whose `requires` pointed at `agent_id`; empty when the agent was
    /// requested directly.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub required_by: Vec<String>,
    pub outcome: FallbackOutcome,
    /// Whether the outcome put a substitute agent into the graph.
    pub substituted: bool,
}

// ---------------------------------------------------------------------------
// ResolutionResult
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolutionResult {
    pub domain: Domain,
    pub complexity: Complexity,
    /// Every agent appears after all agents it requires.
    pub ordered_agents: Vec<String>,
    /// Requirements of each agent as they stand after conflict removal and
    /// fallback rewiring, restricted to agents in `ordered_agents`.
    #[serde(default)]
    pub dependencies: BTreeMap<String, Vec<String>>,
    pub warnings: Vec<ResolutionWarning>,
    pub confidence: f64,
    pub needs_manual_review: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub removed_agents: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallbacks: Vec<FallbackRecord>,
}

impl ResolutionResult {
    pub fn warnings_of(&self, kind: WarningKind) -> impl Iterator<Item = &ResolutionWarning> {
        self.warnings.iter().filter(move |w| w.kind == kind)
    }

    pub fn position(&self, agent_id: &str) -> Option<usize> {
        self.ordered_agents.iter().position(|a| a == agent_id)
    }

    /// Final requirements of `agent_id`; empty for agents with none.
    pub fn dependencies_of(&self, agent_id: &str) -> &[String] {
        self.dependencies
            .get(agent_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
