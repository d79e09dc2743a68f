//! Access service: resolves what a viewer may see and do in a space.

use moodtrace_core::access::{RoleClassification, classify};
use moodtrace_core::error::{MoodTraceError, MoodTraceResult};
use moodtrace_core::models::membership::MembershipRole;
use moodtrace_core::models::space::{Space, substitute_slug};
use moodtrace_core::models::subscription::{SubscriptionStatus, UpsertSubscription};
use moodtrace_core::navigation::{NavigationGroup, filter_navigation};
use moodtrace_core::palette::{CommandPalette, SearchBackend, SearchHit};
use moodtrace_core::plans::{LimitKey, LimitsOverride, PlanLimits, get_plan_limits};
use moodtrace_core::repository::{MembershipRepository, SpaceRepository, SubscriptionRepository};
use tracing::{debug, info};
use uuid::Uuid;

use crate::config::AccessConfig;
use crate::error::AccessError;

/// Everything the rendering layer needs about one viewer in one space.
///
/// Built once per request and passed down explicitly.
#[derive(Debug, Clone)]
pub struct ViewerContext {
    pub space: Space,
    pub user_id: Uuid,
    /// `None` when the viewer has no membership in the space.
    pub roles: Option<Vec<MembershipRole>>,
    pub classification: RoleClassification,
    pub plan_name: String,
    pub limits: PlanLimits,
    pub navigation: Vec<NavigationGroup>,
}

impl ViewerContext {
    pub fn roles(&self) -> Option<&[MembershipRole]> {
        self.roles.as_deref()
    }

    pub fn is_patient(&self) -> bool {
        self.classification.is_patient
    }

    pub fn is_member(&self) -> bool {
        self.roles.is_some()
    }

    /// Resolve a `:spaceSlug` href template for this space.
    pub fn href(&self, template: &str) -> String {
        substitute_slug(template, &self.space.slug)
    }
}

/// Access service.
///
/// Generic over repository implementations so that the access layer
/// has no dependency on the database crate.
pub struct AccessService<
    Sp: SpaceRepository,
    M: MembershipRepository,
    S: SubscriptionRepository,
> {
    space_repo: Sp,
    membership_repo: M,
    subscription_repo: S,
    config: AccessConfig,
}

impl<Sp, M, S> AccessService<Sp, M, S>
where
    Sp: SpaceRepository,
    M: MembershipRepository,
    S: SubscriptionRepository,
{
    pub fn new(
        space_repo: Sp,
        membership_repo: M,
        subscription_repo: S,
        config: AccessConfig,
    ) -> Self {
        Self {
            space_repo,
            membership_repo,
            subscription_repo,
            config,
        }
    }

    pub fn config(&self) -> &AccessConfig {
        &self.config
    }

    /// Build the viewer context for `user_id` visiting the space at
    /// `slug`.
    ///
    /// A viewer without membership is not an error: they get the
    /// caregiver tree restricted to unconstrained links.
    pub async fn resolve_viewer(
        &self,
        slug: &str,
        user_id: Uuid,
    ) -> MoodTraceResult<ViewerContext> {
        let space = match self.space_repo.get_by_slug(slug).await {
            Ok(space) => space,
            Err(MoodTraceError::NotFound { .. }) => {
                return Err(AccessError::SpaceNotFound(slug.to_string()).into());
            }
            Err(e) => return Err(e),
        };

        let roles = match self.membership_repo.get(space.id, user_id).await {
            Ok(membership) => Some(membership.roles),
            Err(MoodTraceError::NotFound { .. }) => {
                debug!(space_id = %space.id, %user_id, "Viewer has no membership");
                None
            }
            Err(e) => return Err(e),
        };

        let classification = classify(roles.as_deref());
        let navigation =
            filter_navigation(&space.slug, roles.as_deref(), classification.is_patient);
        let (plan_name, limits) = self.effective_limits(space.id).await?;

        Ok(ViewerContext {
            space,
            user_id,
            roles,
            classification,
            plan_name,
            limits,
            navigation,
        })
    }

    /// Plan name and merged limits for a space.
    async fn effective_limits(&self, space_id: Uuid) -> MoodTraceResult<(String, PlanLimits)> {
        let resolved = match self.subscription_repo.get_by_space(space_id).await? {
            Some(sub) => {
                let plan = sub.effective_plan_name().to_string();
                let limits = get_plan_limits(&plan, sub.override_limits.as_ref());
                (plan, limits)
            }
            None => (
                self.config.default_plan.clone(),
                get_plan_limits(&self.config.default_plan, None),
            ),
        };
        Ok(resolved)
    }

    /// Effective limits of a space.
    pub async fn plan_limits(&self, space_id: Uuid) -> MoodTraceResult<PlanLimits> {
        Ok(self.effective_limits(space_id).await?.1)
    }

    /// Check that one more unit of `key` may be consumed when `used`
    /// units already exist.
    pub async fn check_quota(
        &self,
        space_id: Uuid,
        key: LimitKey,
        used: i64,
    ) -> MoodTraceResult<()> {
        let limit = self.plan_limits(space_id).await?.get(key);
        if limit.allows(used) {
            Ok(())
        } else {
            Err(AccessError::QuotaExceeded {
                key,
                used,
                max: limit.raw(),
            }
            .into())
        }
    }

    /// Check that a flag limit (e.g. `correlations`) is enabled.
    pub async fn ensure_feature(&self, space_id: Uuid, key: LimitKey) -> MoodTraceResult<()> {
        if self.plan_limits(space_id).await?.feature_enabled(key) {
            Ok(())
        } else {
            Err(AccessError::FeatureUnavailable(key).into())
        }
    }

    fn ensure_platform_admin(&self, actor: Uuid) -> Result<(), AccessError> {
        if self.config.platform_admins.contains(&actor) {
            Ok(())
        } else {
            Err(AccessError::NotPlatformAdmin)
        }
    }

    /// Set per-space override limits and return the new effective limits.
    ///
    /// A space without a subscription first gets an active one on the
    /// default plan to carry the override. Readers holding an older
    /// [`ViewerContext`] must re-resolve it.
    pub async fn set_override_limits(
        &self,
        actor: Uuid,
        space_id: Uuid,
        overrides: LimitsOverride,
    ) -> MoodTraceResult<PlanLimits> {
        self.ensure_platform_admin(actor)?;
        overrides.validate(self.config.max_override_value)?;

        let stored = if overrides.is_empty() { None } else { Some(overrides) };
        if self.subscription_repo.get_by_space(space_id).await?.is_none() {
            self.subscription_repo
                .upsert(UpsertSubscription {
                    space_id,
                    plan_name: self.config.default_plan.clone(),
                    status: SubscriptionStatus::Active,
                    provider_customer_id: None,
                    provider_subscription_id: None,
                    current_period_end: None,
                })
                .await?;
            info!(%space_id, plan = %self.config.default_plan, "Default subscription created");
        }

        let sub = self
            .subscription_repo
            .set_override_limits(space_id, stored)
            .await?;

        info!(%actor, %space_id, overrides = ?stored, "Override limits updated");
        Ok(get_plan_limits(
            sub.effective_plan_name(),
            sub.override_limits.as_ref(),
        ))
    }

    /// Remove per-space override limits. A space without a subscription
    /// has none to remove.
    pub async fn clear_override_limits(
        &self,
        actor: Uuid,
        space_id: Uuid,
    ) -> MoodTraceResult<PlanLimits> {
        self.ensure_platform_admin(actor)?;
        if self.subscription_repo.get_by_space(space_id).await?.is_none() {
            return Ok(get_plan_limits(&self.config.default_plan, None));
        }

        let sub = self
            .subscription_repo
            .set_override_limits(space_id, None)
            .await?;

        info!(%actor, %space_id, "Override limits cleared");
        Ok(get_plan_limits(sub.effective_plan_name(), None))
    }

    /// A fresh command palette using the configured shortcut.
    pub fn command_palette(&self) -> CommandPalette {
        CommandPalette::new(
            self.config.palette_shortcut.clone(),
            self.config.search_debounce_ms,
        )
    }

    /// Dynamic search within the viewer's space. Hrefs are returned
    /// resolved for the space. Blank queries return nothing.
    pub async fn search<B: SearchBackend>(
        &self,
        viewer: &ViewerContext,
        query: &str,
        backend: &B,
    ) -> MoodTraceResult<Vec<SearchHit>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }

        let hits = backend.search(viewer.space.id, query).await?;
        Ok(hits
            .into_iter()
            .map(|hit| SearchHit {
                href: viewer.href(&hit.href),
                ..hit
            })
            .collect())
    }
}
