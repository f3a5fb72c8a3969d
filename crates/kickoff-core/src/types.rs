use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Domain
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum Domain {
    Marketplace,
    Ecommerce,
    Saas,
    Fintech,
    Healthcare,
    Education,
    Social,
    Content,
    #[default]
    General,
}

impl Domain {
    pub fn all() -> &'static [Domain] {
        &[
            Domain::Marketplace,
            Domain::Ecommerce,
            Domain::Saas,
            Domain::Fintech,
            Domain::Healthcare,
            Domain::Education,
            Domain::Social,
            Domain::Content,
            Domain::General,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Domain::Marketplace => "marketplace",
            Domain::Ecommerce => "ecommerce",
            Domain::Saas => "saas",
            Domain::Fintech => "fintech",
            Domain::Healthcare => "healthcare",
            Domain::Education => "education",
            Domain::Social => "social",
            Domain::Content => "content",
            Domain::General => "general",
        }
    }
}

impl fmt::Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Domain {
    type Err = crate::error::KickoffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase();
        Domain::all()
            .iter()
            .copied()
            .find(|d| d.as_str() == lowered)
            .ok_or_else(|| crate::error::KickoffError::UnknownDomain(s.to_string()))
    }
}

// ---------------------------------------------------------------------------
// Complexity
// ---------------------------------------------------------------------------

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "kebab-case")]
pub enum Complexity {
    Simple,
    #[default]
    Moderate,
    Complex,
    VeryComplex,
}

impl Complexity {
    pub fn all() -> &'static [Complexity] {
        &[
            Complexity::Simple,
            Complexity::Moderate,
            Complexity::Complex,
            Complexity::VeryComplex,
        ]
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Complexity::Simple => "simple",
            Complexity::Moderate => "moderate",
            Complexity::Complex => "complex",
            Complexity::VeryComplex => "very-complex",
        }
    }

    /// Complex and very-complex projects escalate fallback urgency.
    pub fn is_high(self) -> bool {
        matches!(self, Complexity::Complex | Complexity::VeryComplex)
    }

    /// Multiplier applied to implementation estimates in escalation plans.
    pub fn effort_factor(self) -> f64 {
        match self {
            Complexity::Simple | Complexity::Moderate => 1.0,
            Complexity::Complex => 1.5,
            Complexity::VeryComplex => 2.0,
        }
    }
}

impl fmt::Display for Complexity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Complexity {
    type Err = crate::error::KickoffError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "simple" => Ok(Complexity::Simple),
            "moderate" => Ok(Complexity::Moderate),
            "complex" => Ok(Complexity::Complex),
            "very-complex" => Ok(Complexity::VeryComplex),
            _ => Err(crate::error::KickoffError::UnknownComplexity(s.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn domain_from_str_is_case_insensitive() {
        assert_eq!(Domain::from_str("Marketplace").unwrap(), Domain::Marketplace);
        assert_eq!(Domain::from_str(" saas ").unwrap(), Domain::Saas);
        assert!(Domain::from_str("spaceflight").is_err());
    }

    #[test]
    fn complexity_serializes_kebab_case() {
        let yaml = serde_yaml::to_string(&Complexity::VeryComplex).unwrap();
        assert_eq!(yaml.trim(), "very-complex");
        let parsed: Complexity = serde_yaml::from_str("very-complex").unwrap();
        assert_eq!(parsed, Complexity::VeryComplex);
    }

    #[test]
    fn complexity_accepts_underscore_spelling() {
        assert_eq!(
            Complexity::from_str("very_complex").unwrap(),
            Complexity::VeryComplex
        );
        assert!(Complexity::from_str("extreme").is_err());
    }

    #[test]
    fn complexity_effort_factor_grows() {
        assert_eq!(Complexity::Simple.effort_factor(), 1.0);
        assert!(Complexity::VeryComplex.effort_factor() > Complexity::Complex.effort_factor());
        assert!(Complexity::Complex.is_high());
        assert!(!Complexity::Moderate.is_high());
    }
}
