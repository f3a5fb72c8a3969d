use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// Penalties
// ---------------------------------------------------------------------------

/// Confidence deductions, one per warning of the matching kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Penalties {
    #[serde(default = "default_unregistered")]
    pub unregistered_agent: f64,
    #[serde(default = "default_conflict")]
    pub conflict_resolved: f64,
    #[serde(default = "default_overlap")]
    pub capability_overlap: f64,
    #[serde(default = "default_missing")]
    pub missing_capability: f64,
    #[serde(default = "default_fallback")]
    pub fallback_applied: f64,
    #[serde(default = "default_oversized")]
    pub oversized: f64,
}

fn default_unregistered() -> f64 {
    0.05
}

fn default_conflict() -> f64 {
    0.10
}

fn default_overlap() -> f64 {
    0.02
}

fn default_missing() -> f64 {
    0.10
}

fn default_fallback() -> f64 {
    0.10
}

fn default_oversized() -> f64 {
    0.10
}

impl Default for Penalties {
    fn default() -> Self {
        Self {
            unregistered_agent: default_unregistered(),
            conflict_resolved: default_conflict(),
            capability_overlap: default_overlap(),
            missing_capability: default_missing(),
            fallback_applied: default_fallback(),
            oversized: default_oversized(),
        }
    }
}

impl Penalties {
    fn named(&self) -> [(&'static str, f64); 6] {
        [
            ("unregistered_agent", self.unregistered_agent),
            ("conflict_resolved", self.conflict_resolved),
            ("capability_overlap", self.capability_overlap),
            ("missing_capability", self.missing_capability),
            ("fallback_applied", self.fallback_applied),
            ("oversized", self.oversized),
        ]
    }
}

// ---------------------------------------------------------------------------
// ResolutionSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSettings {
    #[serde(default = "default_threshold")]
    pub confidence_threshold: f64,
    #[serde(default = "default_max_agents")]
    pub max_agents: usize,
    #[serde(default)]
    pub penalties: Penalties,
}

fn default_threshold() -> f64 {
    0.8
}

fn default_max_agents() -> usize {
    10
}

impl Default for ResolutionSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: default_threshold(),
            max_agents: default_max_agents(),
            penalties: Penalties::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// CacheSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheSettings {
    #[serde(default = "default_capacity")]
    pub capacity: usize,
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

fn default_capacity() -> usize {
    128
}

fn default_ttl() -> u64 {
    3600
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            ttl_secs: default_ttl(),
        }
    }
}

// ---------------------------------------------------------------------------
// ReviewSettings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewSettings {
    /// Fail resolution outright when confidence drops below the threshold.
    #[serde(default)]
    pub strict: bool,
}

// ---------------------------------------------------------------------------
// Settings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub resolution: ResolutionSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub review: ReviewSettings,
}

fn default_version() -> u32 {
    1
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            resolution: ResolutionSettings::default(),
            cache: CacheSettings::default(),
            review: ReviewSettings::default(),
        }
    }
}

impl Settings {
    /// Read `.kickoff/settings.yaml`, falling back to defaults when the file
    /// does not exist.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::settings_path(root);
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let settings: Settings = serde_yaml::from_str(&data)?;
        Ok(settings)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::settings_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    // -----------------------------------------------------------------------
    // Validation
    // -----------------------------------------------------------------------

    pub fn validate(&self) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();
        let threshold = self.resolution.confidence_threshold;

        if !(0.0..=1.0).contains(&threshold) {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: format!(
                    "resolution.confidence_threshold={threshold} is outside 0.0..=1.0"
                ),
            });
        } else if threshold == 0.0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "resolution.confidence_threshold=0 disables manual review".to_string(),
            });
        }

        if self.resolution.max_agents == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "resolution.max_agents must be at least 1".to_string(),
            });
        }

        for (name, value) in self.resolution.penalties.named() {
            if !(0.0..=1.0).contains(&value) {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Error,
                    message: format!("resolution.penalties.{name}={value} is outside 0.0..=1.0"),
                });
            } else if value > 0.5 {
                warnings.push(ConfigWarning {
                    level: WarnLevel::Warning,
                    message: format!(
                        "resolution.penalties.{name}={value} (>0.5 is unusual)"
                    ),
                });
            }
        }

        if self.cache.capacity == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "cache.capacity=0 disables result caching".to_string(),
            });
        }
        if self.cache.ttl_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: "cache.ttl_secs=0 expires every entry immediately".to_string(),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
