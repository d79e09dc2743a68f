//! Repository trait definitions for data access abstraction.
//!
//! All repository operations are async. Space-scoped repositories
//! require a `space_id` parameter to enforce data isolation.

use uuid::Uuid;

use crate::error::MoodTraceResult;
use crate::models::{
    membership::{CreateMembership, Membership, MembershipRole},
    space::{CreateSpace, Space, UpdateSpace},
    subscription::{Subscription, UpsertSubscription},
};
use crate::plans::LimitsOverride;

/// Pagination parameters for list queries.
#[derive(Debug, Clone)]
pub struct Pagination {
    pub offset: u64,
    pub limit: u64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

/// A paginated result set.
#[derive(Debug, Clone)]
pub struct PaginatedResult<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

// ---------------------------------------------------------------------------
// Spaces (global scope)
// ---------------------------------------------------------------------------

pub trait SpaceRepository: Send + Sync {
    fn create(&self, input: CreateSpace) -> impl Future<Output = MoodTraceResult<Space>> + Send;
    fn get_by_id(&self, id: Uuid) -> impl Future<Output = MoodTraceResult<Space>> + Send;
    fn get_by_slug(&self, slug: &str) -> impl Future<Output = MoodTraceResult<Space>> + Send;
    fn update(
        &self,
        id: Uuid,
        input: UpdateSpace,
    ) -> impl Future<Output = MoodTraceResult<Space>> + Send;
    fn delete(&self, id: Uuid) -> impl Future<Output = MoodTraceResult<()>> + Send;
    fn list(
        &self,
        pagination: Pagination,
    ) -> impl Future<Output = MoodTraceResult<PaginatedResult<Space>>> + Send;
}

// ---------------------------------------------------------------------------
// Space-scoped repositories
// ---------------------------------------------------------------------------

pub trait MembershipRepository: Send + Sync {
    /// Add a user to a space.
    ///
    /// Fails with `AlreadyExists` if the user is already a member or if
    /// the input carries `owner` and the space already has an owner.
    fn create(
        &self,
        input: CreateMembership,
    ) -> impl Future<Output = MoodTraceResult<Membership>> + Send;

    /// Membership of `user_id` in `space_id`; `NotFound` if none.
    fn get(
        &self,
        space_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = MoodTraceResult<Membership>> + Send;

    /// The owner (patient) membership of a space.
    fn get_owner(&self, space_id: Uuid)
    -> impl Future<Output = MoodTraceResult<Membership>> + Send;

    /// Replace a member's roles. `owner` can be neither granted nor
    /// removed through a role change.
    fn update_roles(
        &self,
        space_id: Uuid,
        user_id: Uuid,
        roles: Vec<MembershipRole>,
    ) -> impl Future<Output = MoodTraceResult<Membership>> + Send;

    /// Remove a caregiver from a space. The owner cannot be removed.
    fn delete(
        &self,
        space_id: Uuid,
        user_id: Uuid,
    ) -> impl Future<Output = MoodTraceResult<()>> + Send;

    fn list_by_space(
        &self,
        space_id: Uuid,
        pagination: Pagination,
    ) -> impl Future<Output = MoodTraceResult<PaginatedResult<Membership>>> + Send;

    /// Every membership held by a user, across spaces.
    fn list_by_user(
        &self,
        user_id: Uuid,
    ) -> impl Future<Output = MoodTraceResult<Vec<Membership>>> + Send;
}

pub trait SubscriptionRepository: Send + Sync {
    /// Create the space's subscription or update its billing fields.
    fn upsert(
        &self,
        input: UpsertSubscription,
    ) -> impl Future<Output = MoodTraceResult<Subscription>> + Send;

    /// The space's subscription, or `None` when the space never
    /// subscribed.
    fn get_by_space(
        &self,
        space_id: Uuid,
    ) -> impl Future<Output = MoodTraceResult<Option<Subscription>>> + Send;

    /// Persist (or clear with `None`) the space's override limits.
    ///
    /// Fails with `NotFound` when the space has no subscription.
    fn set_override_limits(
        &self,
        space_id: Uuid,
        overrides: Option<LimitsOverride>,
    ) -> impl Future<Output = MoodTraceResult<Subscription>> + Send;
}
