use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::{NewUser, Notice, NoticeFields, Role, SessionRecord, User};

pub mod memory;
pub mod postgres;

pub use memory::InMemoryRepository;
pub use postgres::PostgresRepository;

pub type StoreResult<T> = Result<T, StoreError>;

/// Repository Trait
///
/// Abstract contract for all persistence operations. Handlers and services talk to
/// the store only through this trait, so the Postgres backend and the in-memory
/// backend are interchangeable.
///
/// Both implementations must enforce:
/// - uniqueness of `username` and `email` (reported as `StoreError::Duplicate`),
/// - every notice and session referencing an existing user,
/// - cascade deletion of a user's notices and sessions.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users ---
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;
    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;
    async fn list_users(&self) -> StoreResult<Vec<User>>;
    async fn set_user_role(&self, id: Uuid, role: Role) -> StoreResult<Option<User>>;
    /// Hard delete. Cascades to the user's notices and sessions.
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool>;

    // --- Notices ---
    async fn insert_notice(
        &self,
        fields: NoticeFields,
        owner_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Notice>;
    async fn get_notice(&self, id: Uuid) -> StoreResult<Option<Notice>>;
    /// Every notice with `is_active = true`, most recent first.
    async fn list_active_notices(&self) -> StoreResult<Vec<Notice>>;
    /// Every notice owned by `owner_id`, most recent first.
    async fn list_notices_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Notice>>;
    /// Replaces all content fields and `updated_at` in one atomic write.
    async fn update_notice(
        &self,
        id: Uuid,
        fields: NoticeFields,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Notice>>;
    async fn delete_notice(&self, id: Uuid) -> StoreResult<bool>;

    // --- Sessions ---
    async fn insert_session(&self, session: SessionRecord) -> StoreResult<()>;
    async fn find_session(&self, id: Uuid) -> StoreResult<Option<SessionRecord>>;
    async fn delete_session(&self, id: Uuid) -> StoreResult<bool>;
    /// Removes sessions whose `expires_at` is not after `now`. Returns the count.
    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64>;
}

/// RepositoryState
///
/// The concrete type used to share the persistence layer across the application state.
pub type RepositoryState = Arc<dyn Repository>;
