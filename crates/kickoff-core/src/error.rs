use thiserror::Error;

#[derive(Debug, Error)]
pub enum KickoffError {
    #[error("circular dependency detected at agent '{0}'")]
    CircularDependency(String),

    #[error("invalid project profile: {0}")]
    InvalidProfile(String),

    #[error("invalid catalog: {0}")]
    InvalidCatalog(String),

    #[error("invalid agent id '{0}': must be lowercase alphanumeric with hyphens")]
    InvalidSlug(String),

    #[error("unknown domain '{0}'")]
    UnknownDomain(String),

    #[error("unknown complexity '{0}': must be simple, moderate, complex, or very-complex")]
    UnknownComplexity(String),

    #[error("resolution needs manual review: confidence {confidence:.2} is below threshold {threshold:.2}")]
    ReviewRejected { confidence: f64, threshold: f64 },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KickoffError>;
