//! Subscription domain model.
//!
//! Each space has at most one subscription, written by billing webhooks
//! and read by the plan limit resolver. A space without a subscription
//! is on the default plan.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::plans::{DEFAULT_PLAN, LimitsOverride};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    Trialing,
    PastDue,
    Canceled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subscription {
    pub id: Uuid,
    pub space_id: Uuid,
    /// Plan name as stored by billing (e.g. `gratuit`, `pro`).
    pub plan_name: String,
    pub status: SubscriptionStatus,
    /// Customer id at the payments provider.
    pub provider_customer_id: Option<String>,
    /// Subscription id at the payments provider.
    pub provider_subscription_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    /// Per-space limit overrides set by an admin.
    pub override_limits: Option<LimitsOverride>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Subscription {
    /// The plan whose limits apply. Canceled subscriptions fall back to
    /// the default plan.
    pub fn effective_plan_name(&self) -> &str {
        match self.status {
            SubscriptionStatus::Canceled => DEFAULT_PLAN,
            _ => &self.plan_name,
        }
    }
}

/// Fields written when billing creates or updates a subscription.
///
/// Override limits are untouched by an upsert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpsertSubscription {
    pub space_id: Uuid,
    pub plan_name: String,
    pub status: SubscriptionStatus,
    pub provider_customer_id: Option<String>,
    pub provider_subscription_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
}
