//! Subscription plans and effective limit resolution.
//!
//! Limits are plain integers where `-1` means unlimited. Flag limits
//! (`caregiverAccess`, `correlations`) are enabled when non-zero.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{MoodTraceError, MoodTraceResult};

/// Sentinel value meaning "no limit".
pub const UNLIMITED: i64 = -1;

/// Plan applied when none is set or the stored name is unknown.
pub const DEFAULT_PLAN: &str = "gratuit";

/// Identifies one field of [`PlanLimits`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum LimitKey {
    MoodEntriesPerMonth,
    Medications,
    ExportPerMonth,
    CaregiverAccess,
    Correlations,
}

impl LimitKey {
    pub const ALL: [LimitKey; 5] = [
        LimitKey::MoodEntriesPerMonth,
        LimitKey::Medications,
        LimitKey::ExportPerMonth,
        LimitKey::CaregiverAccess,
        LimitKey::Correlations,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LimitKey::MoodEntriesPerMonth => "moodEntriesPerMonth",
            LimitKey::Medications => "medications",
            LimitKey::ExportPerMonth => "exportPerMonth",
            LimitKey::CaregiverAccess => "caregiverAccess",
            LimitKey::Correlations => "correlations",
        }
    }

    /// Flag limits only take `0` (off) or `1` (on).
    pub fn is_flag(&self) -> bool {
        matches!(self, LimitKey::CaregiverAccess | LimitKey::Correlations)
    }
}

impl fmt::Display for LimitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single limit value with the unlimited sentinel made explicit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limit(i64);

impl Limit {
    pub fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> i64 {
        self.0
    }

    pub fn is_unlimited(&self) -> bool {
        self.0 == UNLIMITED
    }

    /// Whether one more unit may be consumed when `used` are already.
    pub fn allows(&self, used: i64) -> bool {
        self.is_unlimited() || used < self.0
    }

    /// Units left, or `None` when unlimited.
    pub fn remaining(&self, used: i64) -> Option<i64> {
        if self.is_unlimited() {
            None
        } else {
            Some((self.0 - used).max(0))
        }
    }
}

/// Effective limits of a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanLimits {
    pub mood_entries_per_month: i64,
    pub medications: i64,
    pub export_per_month: i64,
    pub caregiver_access: i64,
    pub correlations: i64,
}

impl PlanLimits {
    pub fn get(&self, key: LimitKey) -> Limit {
        Limit(match key {
            LimitKey::MoodEntriesPerMonth => self.mood_entries_per_month,
            LimitKey::Medications => self.medications,
            LimitKey::ExportPerMonth => self.export_per_month,
            LimitKey::CaregiverAccess => self.caregiver_access,
            LimitKey::Correlations => self.correlations,
        })
    }

    /// Flag limits are on when non-zero (`-1` counts as on).
    pub fn feature_enabled(&self, key: LimitKey) -> bool {
        self.get(key).raw() != 0
    }

    /// Shallow merge: every field present in `overrides` wins.
    pub fn merged(self, overrides: &LimitsOverride) -> Self {
        Self {
            mood_entries_per_month: overrides
                .mood_entries_per_month
                .unwrap_or(self.mood_entries_per_month),
            medications: overrides.medications.unwrap_or(self.medications),
            export_per_month: overrides.export_per_month.unwrap_or(self.export_per_month),
            caregiver_access: overrides.caregiver_access.unwrap_or(self.caregiver_access),
            correlations: overrides.correlations.unwrap_or(self.correlations),
        }
    }
}

/// Partial limits set by an admin for a single space.
///
/// Unknown keys are rejected on deserialization so that a stored
/// override is checked against the same shape as the base limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct LimitsOverride {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mood_entries_per_month: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub medications: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_per_month: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caregiver_access: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correlations: Option<i64>,
}

impl LimitsOverride {
    pub fn get(&self, key: LimitKey) -> Option<i64> {
        match key {
            LimitKey::MoodEntriesPerMonth => self.mood_entries_per_month,
            LimitKey::Medications => self.medications,
            LimitKey::ExportPerMonth => self.export_per_month,
            LimitKey::CaregiverAccess => self.caregiver_access,
            LimitKey::Correlations => self.correlations,
        }
    }

    pub fn is_empty(&self) -> bool {
        LimitKey::ALL.iter().all(|k| self.get(*k).is_none())
    }

    /// Check every present value for an admin write: flags must be `0`
    /// or `1`, other limits `-1` or within `0..=max_value`.
    pub fn validate(&self, max_value: i64) -> MoodTraceResult<()> {
        match self.first_invalid(Some(max_value)) {
            Some((key, value)) if key.is_flag() => Err(MoodTraceError::Validation {
                message: format!("{key} is a flag and must be 0 or 1, got {value}"),
            }),
            Some((key, value)) => Err(MoodTraceError::Validation {
                message: format!(
                    "{key} must be -1 (unlimited) or between 0 and {max_value}, got {value}"
                ),
            }),
            None => Ok(()),
        }
    }

    /// Whether a stored override is usable: the same rules as
    /// [`validate`](Self::validate) without an upper bound.
    pub fn is_well_formed(&self) -> bool {
        self.first_invalid(None).is_none()
    }

    fn first_invalid(&self, max_value: Option<i64>) -> Option<(LimitKey, i64)> {
        LimitKey::ALL.into_iter().find_map(|key| {
            let value = self.get(key)?;
            let valid = if key.is_flag() {
                value == 0 || value == 1
            } else {
                value >= UNLIMITED && max_value.is_none_or(|max| value <= max)
            };
            (!valid).then_some((key, value))
        })
    }
}

/// A named plan with fixed limits.
#[derive(Debug, Clone, Copy)]
pub struct SubscriptionPlan {
    pub name: &'static str,
    pub limits: PlanLimits,
}

pub static PLANS: &[SubscriptionPlan] = &[
    SubscriptionPlan {
        name: "gratuit",
        limits: PlanLimits {
            mood_entries_per_month: 31,
            medications: 3,
            export_per_month: 1,
            caregiver_access: 0,
            correlations: 0,
        },
    },
    SubscriptionPlan {
        name: "pro",
        limits: PlanLimits {
            mood_entries_per_month: UNLIMITED,
            medications: UNLIMITED,
            export_per_month: UNLIMITED,
            caregiver_access: 1,
            correlations: 1,
        },
    },
];

pub fn find_plan(name: &str) -> Option<&'static SubscriptionPlan> {
    PLANS.iter().find(|p| p.name == name)
}

fn default_limits() -> PlanLimits {
    PLANS[0].limits
}

/// Effective limits for a plan, with optional per-space overrides.
///
/// Unknown plan names resolve to the default plan's limits.
pub fn get_plan_limits(plan_name: &str, overrides: Option<&LimitsOverride>) -> PlanLimits {
    let base = match find_plan(plan_name) {
        Some(plan) => plan.limits,
        None => {
            debug!(plan_name, fallback = DEFAULT_PLAN, "unknown plan, using default limits");
            default_limits()
        }
    };

    match overrides {
        Some(o) if !o.is_empty() => base.merged(o),
        _ => base,
    }
}
