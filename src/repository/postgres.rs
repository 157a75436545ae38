use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{Repository, StoreResult};
use crate::error::StoreError;
use crate::models::{NewUser, Notice, NoticeFields, Role, SessionRecord, User};

const USER_COLUMNS: &str = "id, username, email, password_hash, role, department, created_at";
const NOTICE_COLUMNS: &str =
    "id, title, content, category, department, priority, created_at, updated_at, user_id, is_active";

/// PostgresRepository
///
/// The `Repository` implementation backed by PostgreSQL. Uniqueness and cascade
/// rules are enforced by the schema in `migrations/`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    /// Creates a new repository instance using the initialized connection pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Applies the embedded migrations. Safe to call on every startup.
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Translates constraint violations into store-level errors.
fn map_write_error(e: sqlx::Error) -> StoreError {
    if let Some(db) = e.as_database_error() {
        if db.is_unique_violation() {
            return match db.constraint() {
                Some("users_email_key") => StoreError::Duplicate("email"),
                _ => StoreError::Duplicate("username"),
            };
        }
        if db.is_foreign_key_violation() {
            return StoreError::MissingReference("user");
        }
    }
    StoreError::Database(e)
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- USERS ---

    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE username = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let sql = format!(
            "INSERT INTO users (id, username, email, password_hash, role, department, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(Uuid::new_v4())
            .bind(&user.username)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role.as_str())
            .bind(&user.department)
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users ORDER BY created_at ASC");
        Ok(sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?)
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> StoreResult<Option<User>> {
        let sql = format!("UPDATE users SET role = $1 WHERE id = $2 RETURNING {USER_COLUMNS}");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(role.as_str())
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// Notices and sessions go with the user through `ON DELETE CASCADE`.
    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- NOTICES ---

    async fn insert_notice(
        &self,
        fields: NoticeFields,
        owner_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Notice> {
        let sql = format!(
            "INSERT INTO notices
                (id, title, content, category, department, priority, created_at, updated_at, user_id, is_active)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $8, TRUE)
             RETURNING {NOTICE_COLUMNS}"
        );
        sqlx::query_as::<_, Notice>(&sql)
            .bind(Uuid::new_v4())
            .bind(&fields.title)
            .bind(&fields.content)
            .bind(&fields.category)
            .bind(&fields.department)
            .bind(fields.priority.as_str())
            .bind(now)
            .bind(owner_id)
            .fetch_one(&self.pool)
            .await
            .map_err(map_write_error)
    }

    async fn get_notice(&self, id: Uuid) -> StoreResult<Option<Notice>> {
        let sql = format!("SELECT {NOTICE_COLUMNS} FROM notices WHERE id = $1");
        Ok(sqlx::query_as::<_, Notice>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn list_active_notices(&self) -> StoreResult<Vec<Notice>> {
        let sql = format!(
            "SELECT {NOTICE_COLUMNS} FROM notices WHERE is_active = TRUE ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Notice>(&sql).fetch_all(&self.pool).await?)
    }

    async fn list_notices_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Notice>> {
        let sql = format!(
            "SELECT {NOTICE_COLUMNS} FROM notices WHERE user_id = $1 ORDER BY created_at DESC"
        );
        Ok(sqlx::query_as::<_, Notice>(&sql)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?)
    }

    /// A single UPDATE statement, so the overwrite is atomic. Last write wins.
    async fn update_notice(
        &self,
        id: Uuid,
        fields: NoticeFields,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Notice>> {
        let sql = format!(
            "UPDATE notices
             SET title = $1, content = $2, category = $3, department = $4, priority = $5, updated_at = $6
             WHERE id = $7
             RETURNING {NOTICE_COLUMNS}"
        );
        Ok(sqlx::query_as::<_, Notice>(&sql)
            .bind(&fields.title)
            .bind(&fields.content)
            .bind(&fields.category)
            .bind(&fields.department)
            .bind(fields.priority.as_str())
            .bind(now)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_notice(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM notices WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- SESSIONS ---

    async fn insert_session(&self, session: SessionRecord) -> StoreResult<()> {
        sqlx::query("INSERT INTO sessions (id, user_id, created_at, expires_at) VALUES ($1, $2, $3, $4)")
            .bind(session.id)
            .bind(session.user_id)
            .bind(session.created_at)
            .bind(session.expires_at)
            .execute(&self.pool)
            .await
            .map_err(map_write_error)?;
        Ok(())
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<SessionRecord>> {
        Ok(sqlx::query_as::<_, SessionRecord>(
            "SELECT id, user_id, created_at, expires_at FROM sessions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn delete_session(&self, id: Uuid) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }
}
