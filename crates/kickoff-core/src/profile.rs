use crate::error::{KickoffError, Result};
use crate::paths;
use crate::types::{Complexity, Domain};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::Path;

// ---------------------------------------------------------------------------
// Profile sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectContext {
    #[serde(default)]
    pub domain: Domain,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BusinessProfile {
    #[serde(default)]
    pub complexity: Complexity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TechnicalProfile {
    #[serde(default)]
    pub stack: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileFlags {
    #[serde(default)]
    pub cultural_requirements: bool,
    #[serde(default)]
    pub payment_integration: bool,
    #[serde(default)]
    pub security_requirements: bool,
}

// ---------------------------------------------------------------------------
// ProjectProfile
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectProfile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub context: ProjectContext,
    #[serde(default)]
    pub business: BusinessProfile,
    #[serde(default)]
    pub technical: TechnicalProfile,
    #[serde(default)]
    pub flags: ProfileFlags,
    /// Agents that cannot be activated in this environment.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unavailable_agents: Vec<String>,
    /// Agents the user asked for explicitly, on top of table-driven selection.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requested_agents: Vec<String>,
}

/// The fields that influence resolution, in a canonical order.
#[derive(Serialize)]
struct CacheKeyFields<'a> {
    domain: Domain,
    complexity: Complexity,
    stack: Vec<String>,
    flags: &'a ProfileFlags,
    unavailable: Vec<&'a str>,
    requested: Vec<&'a str>,
}

impl ProjectProfile {
    pub fn new(domain: Domain, complexity: Complexity) -> Self {
        Self {
            context: ProjectContext {
                domain,
                description: None,
            },
            business: BusinessProfile { complexity },
            ..Self::default()
        }
    }

    pub fn domain(&self) -> Domain {
        self.context.domain
    }

    pub fn complexity(&self) -> Complexity {
        self.business.complexity
    }

    /// Load a brief from YAML, or from JSON when the extension is `.json`.
    pub fn load(path: &Path) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("json"))
            .unwrap_or(false);
        let profile = if is_json {
            serde_json::from_str(&data)?
        } else {
            serde_yaml::from_str(&data)?
        };
        Ok(profile)
    }

    /// Reject malformed agent ids before any graph work starts.
    pub fn validate(&self) -> Result<()> {
        for id in self.unavailable_agents.iter().chain(&self.requested_agents) {
            paths::validate_slug(id).map_err(|_| {
                KickoffError::InvalidProfile(format!("'{id}' is not a valid agent id"))
            })?;
        }
        if self.technical.stack.iter().any(|s| s.trim().is_empty()) {
            return Err(KickoffError::InvalidProfile(
                "technical.stack contains an empty entry".to_string(),
            ));
        }
        Ok(())
    }

    /// SHA-256 over the resolution-relevant fields. Stack entries and agent
    /// lists are normalized so reordering them does not change the key.
    pub fn cache_key(&self) -> String {
        let mut stack: Vec<String> = self
            .technical
            .stack
            .iter()
            .map(|s| s.trim().to_ascii_lowercase())
            .collect();
        stack.sort();
        stack.dedup();

        let mut unavailable: Vec<&str> = self.unavailable_agents.iter().map(String::as_str).collect();
        unavailable.sort_unstable();
        unavailable.dedup();
        let mut requested: Vec<&str> = self.requested_agents.iter().map(String::as_str).collect();
        requested.sort_unstable();
        requested.dedup();

        let fields = CacheKeyFields {
            domain: self.domain(),
            complexity: self.complexity(),
            stack,
            flags: &self.flags,
            unavailable,
            requested,
        };
        // Serializing plain structs and vectors cannot fail.
        let canonical = serde_json::to_vec(&fields).unwrap_or_default();
        format!("{:x}", Sha256::digest(&canonical))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
