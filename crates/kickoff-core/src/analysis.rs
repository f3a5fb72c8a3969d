//! Keyword classification of free-text project descriptions.
//!
//! This is deliberately shallow: text is split into lowercase tokens and
//! matched against fixed keyword lists. No stemming, no phrase parsing.

use crate::error::Result;
use crate::profile::{ProfileFlags, ProjectProfile};
use crate::types::{Complexity, Domain};
use regex::Regex;
use std::path::Path;
use std::sync::OnceLock;

// ---------------------------------------------------------------------------
// Keyword tables
// ---------------------------------------------------------------------------

const DOMAIN_KEYWORDS: &[(Domain, &[&str])] = &[
    (
        Domain::Marketplace,
        &[
            "marketplace", "vendor", "vendors", "seller", "sellers", "buyers", "multi-vendor",
            "commission", "commissions",
        ],
    ),
    (
        Domain::Ecommerce,
        &[
            "shop", "store", "storefront", "ecommerce", "e-commerce", "cart", "checkout",
            "products", "inventory",
        ],
    ),
    (
        Domain::Saas,
        &[
            "saas", "subscription", "subscriptions", "tenant", "tenants", "multi-tenant", "b2b",
            "workspace", "workspaces",
        ],
    ),
    (
        Domain::Fintech,
        &[
            "fintech", "bank", "banking", "ledger", "transactions", "trading", "wallet",
            "wallets", "loans", "lending",
        ],
    ),
    (
        Domain::Healthcare,
        &[
            "healthcare", "health", "patient", "patients", "clinic", "clinical", "medical",
            "hipaa", "telemedicine",
        ],
    ),
    (
        Domain::Education,
        &[
            "education", "course", "courses", "student", "students", "learning", "lms", "school",
            "teachers",
        ],
    ),
    (
        Domain::Social,
        &[
            "social", "community", "followers", "feed", "feeds", "friends", "posts", "profiles",
        ],
    ),
    (
        Domain::Content,
        &[
            "blog", "cms", "content", "articles", "publishing", "editorial", "magazine", "news",
        ],
    ),
];

const HEAVY_HINTS: &[&str] = &[
    "enterprise", "millions", "real-time", "realtime", "microservices", "distributed",
    "multi-region", "global", "high-availability", "scalable",
];

const LIGHT_HINTS: &[&str] = &[
    "simple", "basic", "prototype", "mvp", "landing", "small", "personal", "hobby",
];

/// `(alias, canonical)` technology names.
const STACK_TERMS: &[(&str, &str)] = &[
    ("react-native", "react-native"),
    ("react", "react"),
    ("vue", "vue"),
    ("angular", "angular"),
    ("svelte", "svelte"),
    ("nextjs", "nextjs"),
    ("next.js", "nextjs"),
    ("node", "node"),
    ("nodejs", "node"),
    ("node.js", "node"),
    ("express", "express"),
    ("django", "django"),
    ("rails", "rails"),
    ("spring", "spring"),
    ("fastapi", "fastapi"),
    ("golang", "go"),
    ("rust", "rust"),
    ("postgres", "postgres"),
    ("postgresql", "postgres"),
    ("flutter", "flutter"),
    ("ios", "ios"),
    ("android", "android"),
    ("swift", "swift"),
    ("kotlin", "kotlin"),
    ("websocket", "websocket"),
    ("websockets", "websocket"),
    ("socket.io", "socket.io"),
    ("kafka", "kafka"),
    ("docker", "docker"),
    ("kubernetes", "kubernetes"),
    ("k8s", "kubernetes"),
    ("terraform", "terraform"),
    ("aws", "aws"),
];

const PAYMENT_TERMS: &[&str] = &[
    "payment", "payments", "checkout", "stripe", "billing", "invoices", "invoicing", "payouts",
];

const CULTURAL_TERMS: &[&str] = &[
    "localization", "localisation", "multilingual", "i18n", "translation", "translations",
    "arabic", "rtl", "cultural", "locales", "international",
];

const SECURITY_TERMS: &[&str] = &[
    "security", "secure", "compliance", "hipaa", "gdpr", "pci", "encryption", "audit", "sso",
];

// ---------------------------------------------------------------------------
// Tokenizing
// ---------------------------------------------------------------------------

static TOKEN_RE: OnceLock<Regex> = OnceLock::new();

fn token_re() -> &'static Regex {
    TOKEN_RE.get_or_init(|| Regex::new(r"[a-z0-9][a-z0-9.+#_-]*").unwrap())
}

fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    token_re()
        .find_iter(&lower)
        .map(|m| m.as_str().trim_end_matches(['.', '-']).to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

fn count_hits(tokens: &[String], keywords: &[&str]) -> usize {
    tokens
        .iter()
        .filter(|t| keywords.contains(&t.as_str()))
        .count()
}

// ---------------------------------------------------------------------------
// Classification
// ---------------------------------------------------------------------------

/// Highest-scoring domain; ties go to the earlier domain in
/// [`Domain::all`] order, no hits give [`Domain::General`].
pub fn classify_domain(text: &str) -> Domain {
    domain_from_tokens(&tokenize(text))
}

fn domain_from_tokens(tokens: &[String]) -> Domain {
    let mut best = (Domain::General, 0);
    for (domain, keywords) in DOMAIN_KEYWORDS {
        let score = count_hits(tokens, keywords);
        if score > best.1 {
            best = (*domain, score);
        }
    }
    best.0
}

fn complexity_from_tokens(tokens: &[String]) -> Complexity {
    let heavy = count_hits(tokens, HEAVY_HINTS);
    let light = count_hits(tokens, LIGHT_HINTS);
    match heavy {
        0 if light > 0 => Complexity::Simple,
        0 => Complexity::Moderate,
        1 | 2 if tokens.len() < 200 => Complexity::Complex,
        1 => Complexity::Complex,
        _ => Complexity::VeryComplex,
    }
}

fn stack_from_tokens(tokens: &[String]) -> Vec<String> {
    let mut stack: Vec<String> = Vec::new();
    for token in tokens {
        let canonical = STACK_TERMS
            .iter()
            .find(|(alias, _)| *alias == token.as_str())
            .map(|(_, canonical)| *canonical);
        if let Some(name) = canonical {
            if !stack.iter().any(|s| s == name) {
                stack.push(name.to_string());
            }
        }
    }
    stack
}

/// Build a profile from a free-text project description.
pub fn analyze_text(text: &str) -> ProjectProfile {
    let tokens = tokenize(text);
    let mut profile = ProjectProfile::new(
        domain_from_tokens(&tokens),
        complexity_from_tokens(&tokens),
    );
    let description = text.trim();
    if !description.is_empty() {
        profile.context.description = Some(description.to_string());
    }
    profile.technical.stack = stack_from_tokens(&tokens);
    profile.flags = ProfileFlags {
        cultural_requirements: count_hits(&tokens, CULTURAL_TERMS) > 0,
        payment_integration: count_hits(&tokens, PAYMENT_TERMS) > 0,
        security_requirements: count_hits(&tokens, SECURITY_TERMS) > 0,
    };
    tracing::debug!(
        domain = %profile.domain(),
        complexity = %profile.complexity(),
        stack = ?profile.technical.stack,
        "analyzed description"
    );
    profile
}

/// Load a brief file. A brief with a description but no explicit domain has
/// its domain and stack filled in from the description.
pub fn load_brief(path: &Path) -> Result<ProjectProfile> {
    let mut profile = ProjectProfile::load(path)?;
    let analyzed = profile.context.description.as_deref().map(analyze_text);
    if let Some(analyzed) = analyzed {
        if profile.domain() == Domain::General {
            profile.context.domain = analyzed.domain();
        }
        if profile.technical.stack.is_empty() {
            profile.technical.stack = analyzed.technical.stack;
        }
    }
    Ok(profile)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn tokenize_strips_sentence_punctuation() {
        assert_eq!(
            tokenize("Built with Next.js and Node."),
            vec!["built", "with", "next.js", "and", "node"]
        );
    }

    #[test]
    fn classify_marketplace_description() {
        let text = "A marketplace where independent sellers list handmade goods and buyers \
                    pay through the platform; we take a commission.";
        assert_eq!(classify_domain(text), Domain::Marketplace);
    }

    #[test]
    fn classify_without_hits_is_general() {
        assert_eq!(classify_domain("A tool to rename files."), Domain::General);
        assert_eq!(classify_domain(""), Domain::General);
    }

    #[test]
    fn classify_tie_prefers_earlier_domain() {
        // one marketplace hit, one ecommerce hit
        assert_eq!(classify_domain("vendor cart"), Domain::Marketplace);
    }

    #[test]
    fn complexity_hints() {
        assert_eq!(
            analyze_text("A simple landing page").complexity(),
            Complexity::Simple
        );
        assert_eq!(analyze_text("An online shop").complexity(), Complexity::Moderate);
        assert_eq!(
            analyze_text("Enterprise ledger for banks").complexity(),
            Complexity::Complex
        );
        assert_eq!(
            analyze_text("Enterprise, real-time, distributed trading for millions of users")
                .complexity(),
            Complexity::VeryComplex
        );
    }

    #[test]
    fn stack_is_canonical_and_deduplicated() {
        let profile = analyze_text("React frontend, Node.js API, nodejs workers, k8s on AWS");
        assert_eq!(
            profile.technical.stack,
            vec!["react", "node", "kubernetes", "aws"]
        );
    }

    #[test]
    fn flags_from_keyword_families() {
        let profile =
            analyze_text("Stripe payments, Arabic localization and GDPR compliance for clinics");
        assert!(profile.flags.payment_integration);
        assert!(profile.flags.cultural_requirements);
        assert!(profile.flags.security_requirements);

        let plain = analyze_text("A blog");
        assert_eq!(plain.flags, ProfileFlags::default());
        assert_eq!(plain.domain(), Domain::Content);
        assert_eq!(plain.context.description.as_deref(), Some("A blog"));
    }

    #[test]
    fn load_brief_fills_domain_from_description() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("brief.yaml");
        std::fs::write(
            &path,
            "context:\n  description: Online courses for students, built on Django\n",
        )
        .unwrap();
        let profile = load_brief(&path).unwrap();
        assert_eq!(profile.domain(), Domain::Education);
        assert_eq!(profile.technical.stack, vec!["django"]);
    }

    #[test]
    fn load_brief_keeps_explicit_fields() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("brief.yaml");
        std::fs::write(
            &path,
            "context:\n  domain: fintech\n  description: Online courses\ntechnical:\n  stack: [rails]\n",
        )
        .unwrap();
        let profile = load_brief(&path).unwrap();
        assert_eq!(profile.domain(), Domain::Fintech);
        assert_eq!(profile.technical.stack, vec!["rails"]);
    }
}
