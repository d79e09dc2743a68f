//! Access service error types.

use moodtrace_core::error::MoodTraceError;
use moodtrace_core::plans::LimitKey;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AccessError {
    #[error("no space with slug {0}")]
    SpaceNotFound(String),

    #[error("only platform admins can change plan limits")]
    NotPlatformAdmin,

    #[error("{key} quota reached ({used} of {max})")]
    QuotaExceeded { key: LimitKey, used: i64, max: i64 },

    #[error("{0} is not included in the current plan")]
    FeatureUnavailable(LimitKey),
}

impl From<AccessError> for MoodTraceError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::SpaceNotFound(slug) => MoodTraceError::NotFound {
                entity: "space".into(),
                id: format!("slug={slug}"),
            },
            AccessError::NotPlatformAdmin => MoodTraceError::AuthorizationDenied {
                reason: "only platform admins can change plan limits".into(),
            },
            AccessError::QuotaExceeded { key, used, max } => MoodTraceError::QuotaExceeded {
                limit: key.to_string(),
                used,
                max,
            },
            AccessError::FeatureUnavailable(key) => MoodTraceError::FeatureUnavailable {
                feature: key.to_string(),
            },
        }
    }
}
