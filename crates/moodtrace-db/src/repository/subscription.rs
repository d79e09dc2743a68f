//! SurrealDB implementation of [`SubscriptionRepository`].
//!
//! Override limits are persisted as the JSON object the admin submitted
//! and validated against [`LimitsOverride`] on every read. An invalid
//! stored object is discarded (base plan limits apply) rather than
//! failing the read.

use chrono::{DateTime, Utc};
use moodtrace_core::error::{MoodTraceError, MoodTraceResult};
use moodtrace_core::models::subscription::{
    Subscription, SubscriptionStatus, UpsertSubscription,
};
use moodtrace_core::plans::LimitsOverride;
use moodtrace_core::repository::SubscriptionRepository;
use surrealdb::{Connection, Surreal};
use surrealdb_types::SurrealValue;
use tracing::{info, warn};
use uuid::Uuid;

use super::{first_row, parse_uuid};
use crate::error::DbError;

#[derive(Debug, SurrealValue)]
struct SubscriptionRowWithId {
    record_id: String,
    space_id: String,
    plan_name: String,
    status: String,
    provider_customer_id: Option<String>,
    provider_subscription_id: Option<String>,
    current_period_end: Option<DateTime<Utc>>,
    override_limits: serde_json::Value,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SubscriptionRowWithId {
    fn try_into_subscription(self) -> Result<Subscription, DbError> {
        let space_id = parse_uuid("space", &self.space_id)?;
        let override_limits = decode_override(space_id, self.override_limits);
        Ok(Subscription {
            id: parse_uuid("subscription", &self.record_id)?,
            space_id,
            plan_name: self.plan_name,
            status: parse_status(&self.status)?,
            provider_customer_id: self.provider_customer_id,
            provider_subscription_id: self.provider_subscription_id,
            current_period_end: self.current_period_end,
            override_limits,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

fn parse_status(s: &str) -> Result<SubscriptionStatus, DbError> {
    match s {
        "active" => Ok(SubscriptionStatus::Active),
        "trialing" => Ok(SubscriptionStatus::Trialing),
        "past_due" => Ok(SubscriptionStatus::PastDue),
        "canceled" => Ok(SubscriptionStatus::Canceled),
        other => Err(DbError::Decode(format!(
            "unknown subscription status: {other}"
        ))),
    }
}

fn status_to_string(s: SubscriptionStatus) -> &'static str {
    match s {
        SubscriptionStatus::Active => "active",
        SubscriptionStatus::Trialing => "trialing",
        SubscriptionStatus::PastDue => "past_due",
        SubscriptionStatus::Canceled => "canceled",
    }
}

/// Stored override object to a validated override. Empty objects,
/// objects that do not match the limits shape and out-of-range values
/// yield `None`.
fn decode_override(space_id: Uuid, value: serde_json::Value) -> Option<LimitsOverride> {
    match &value {
        serde_json::Value::Null => return None,
        serde_json::Value::Object(map) if map.is_empty() => return None,
        _ => {}
    }

    match serde_json::from_value::<LimitsOverride>(value) {
        Ok(overrides) if overrides.is_empty() => None,
        Ok(overrides) if !overrides.is_well_formed() => {
            warn!(%space_id, ?overrides, "Ignoring out-of-range stored override limits");
            None
        }
        Ok(overrides) => Some(overrides),
        Err(e) => {
            warn!(%space_id, error = %e, "Ignoring invalid stored override limits");
            None
        }
    }
}

fn encode_override(overrides: Option<LimitsOverride>) -> Result<serde_json::Value, DbError> {
    match overrides {
        Some(o) => serde_json::to_value(o).map_err(|e| DbError::Query(e.to_string())),
        None => Ok(serde_json::Value::Object(Default::default())),
    }
}

/// Appends a read-back of the written record, with its id, as statement 1.
fn with_read_back(statement: &str) -> String {
    format!(
        "{statement}; SELECT meta::id(id) AS record_id, * \
         FROM type::record('subscription', $id);"
    )
}

/// SurrealDB implementation of the Subscription repository.
#[derive(Clone)]
pub struct SurrealSubscriptionRepository<C: Connection> {
    db: Surreal<C>,
}

impl<C: Connection> SurrealSubscriptionRepository<C> {
    pub fn new(db: Surreal<C>) -> Self {
        Self { db }
    }

    async fn find(&self, space_id: Uuid) -> Result<Option<Subscription>, DbError> {
        let mut result = self
            .db
            .query(
                "SELECT meta::id(id) AS record_id, * FROM subscription \
                 WHERE space_id = $space_id",
            )
            .bind(("space_id", space_id.to_string()))
            .await?;

        let rows: Vec<SubscriptionRowWithId> = result.take(0)?;
        rows.into_iter()
            .next()
            .map(SubscriptionRowWithId::try_into_subscription)
            .transpose()
    }
}

impl<C: Connection> SubscriptionRepository for SurrealSubscriptionRepository<C> {
    async fn upsert(&self, input: UpsertSubscription) -> MoodTraceResult<Subscription> {
        let existing = self.find(input.space_id).await?;

        let (statement, id_str) = match &existing {
            Some(sub) => (
                "UPDATE type::record('subscription', $id) SET \
                 plan_name = $plan_name, status = $status, \
                 provider_customer_id = $provider_customer_id, \
                 provider_subscription_id = $provider_subscription_id, \
                 current_period_end = $current_period_end, \
                 updated_at = time::now()",
                sub.id.to_string(),
            ),
            None => (
                "CREATE type::record('subscription', $id) SET \
                 space_id = $space_id, \
                 plan_name = $plan_name, status = $status, \
                 provider_customer_id = $provider_customer_id, \
                 provider_subscription_id = $provider_subscription_id, \
                 current_period_end = $current_period_end",
                Uuid::new_v4().to_string(),
            ),
        };

        let space_id = input.space_id;
        let result = self
            .db
            .query(with_read_back(statement))
            .bind(("id", id_str.clone()))
            .bind(("space_id", space_id.to_string()))
            .bind(("plan_name", input.plan_name))
            .bind(("status", status_to_string(input.status).to_string()))
            .bind(("provider_customer_id", input.provider_customer_id))
            .bind(("provider_subscription_id", input.provider_subscription_id))
            .bind(("current_period_end", input.current_period_end))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SubscriptionRowWithId> = result.take(1).map_err(DbError::from)?;
        let subscription = first_row(rows, "subscription", id_str)?.try_into_subscription()?;

        info!(
            %space_id,
            plan = %subscription.plan_name,
            status = status_to_string(subscription.status),
            created = existing.is_none(),
            "Subscription saved"
        );
        Ok(subscription)
    }

    async fn get_by_space(&self, space_id: Uuid) -> MoodTraceResult<Option<Subscription>> {
        Ok(self.find(space_id).await?)
    }

    async fn set_override_limits(
        &self,
        space_id: Uuid,
        overrides: Option<LimitsOverride>,
    ) -> MoodTraceResult<Subscription> {
        let existing = self
            .find(space_id)
            .await?
            .ok_or_else(|| MoodTraceError::NotFound {
                entity: "subscription".into(),
                id: format!("space={space_id}"),
            })?;

        let id_str = existing.id.to_string();
        let result = self
            .db
            .query(with_read_back(
                "UPDATE type::record('subscription', $id) SET \
                 override_limits = $override_limits, updated_at = time::now()",
            ))
            .bind(("id", id_str.clone()))
            .bind(("override_limits", encode_override(overrides)?))
            .await
            .map_err(DbError::from)?;

        let mut result = result
            .check()
            .map_err(|e| DbError::Query(e.to_string()))?;

        let rows: Vec<SubscriptionRowWithId> = result.take(1).map_err(DbError::from)?;
        let subscription = first_row(rows, "subscription", id_str)?.try_into_subscription()?;

        Ok(subscription)
    }
}
