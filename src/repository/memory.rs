use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Repository, StoreResult};
use crate::error::StoreError;
use crate::models::{NewUser, Notice, NoticeFields, Role, SessionRecord, User};

#[derive(Default)]
struct Tables {
    // Insertion order is kept so that equal timestamps still list newest first.
    users: Vec<User>,
    notices: Vec<Notice>,
    sessions: HashMap<Uuid, SessionRecord>,
}

/// InMemoryRepository
///
/// A process-local `Repository` used when no `DATABASE_URL` is configured and by
/// the test-suite. It enforces the same constraints as the Postgres schema:
/// unique username and email, notices and sessions must reference an existing
/// user, and deleting a user cascades.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: RwLock<Tables>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored notices, including inactive ones.
    pub async fn notice_count(&self) -> usize {
        self.tables.read().await.notices.len()
    }

    pub async fn session_count(&self) -> usize {
        self.tables.read().await.sessions.len()
    }
}

fn newest_first(mut notices: Vec<Notice>) -> Vec<Notice> {
    notices.reverse();
    notices.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    notices
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn find_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.iter().find(|u| u.email == email).cloned())
    }

    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut tables = self.tables.write().await;

        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate("username"));
        }
        if tables.users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::Duplicate("email"));
        }

        let stored = User {
            id: Uuid::new_v4(),
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            department: user.department,
            created_at: Utc::now(),
        };
        tables.users.push(stored.clone());
        Ok(stored)
    }

    async fn list_users(&self) -> StoreResult<Vec<User>> {
        Ok(self.tables.read().await.users.clone())
    }

    async fn set_user_role(&self, id: Uuid, role: Role) -> StoreResult<Option<User>> {
        let mut tables = self.tables.write().await;
        Ok(tables.users.iter_mut().find(|u| u.id == id).map(|user| {
            user.role = role;
            user.clone()
        }))
    }

    async fn delete_user(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.users.len();
        tables.users.retain(|u| u.id != id);
        if tables.users.len() == before {
            return Ok(false);
        }
        // Cascade, mirroring the foreign keys of the relational schema.
        tables.notices.retain(|n| n.user_id != id);
        tables.sessions.retain(|_, s| s.user_id != id);
        Ok(true)
    }

    async fn insert_notice(
        &self,
        fields: NoticeFields,
        owner_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Notice> {
        let mut tables = self.tables.write().await;

        if !tables.users.iter().any(|u| u.id == owner_id) {
            return Err(StoreError::MissingReference("user"));
        }

        let notice = Notice {
            id: Uuid::new_v4(),
            title: fields.title,
            content: fields.content,
            category: fields.category,
            department: fields.department,
            priority: fields.priority,
            created_at: now,
            updated_at: now,
            user_id: owner_id,
            is_active: true,
        };
        tables.notices.push(notice.clone());
        Ok(notice)
    }

    async fn get_notice(&self, id: Uuid) -> StoreResult<Option<Notice>> {
        let tables = self.tables.read().await;
        Ok(tables.notices.iter().find(|n| n.id == id).cloned())
    }

    async fn list_active_notices(&self) -> StoreResult<Vec<Notice>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables.notices.iter().filter(|n| n.is_active).cloned().collect(),
        ))
    }

    async fn list_notices_by_owner(&self, owner_id: Uuid) -> StoreResult<Vec<Notice>> {
        let tables = self.tables.read().await;
        Ok(newest_first(
            tables
                .notices
                .iter()
                .filter(|n| n.user_id == owner_id)
                .cloned()
                .collect(),
        ))
    }

    async fn update_notice(
        &self,
        id: Uuid,
        fields: NoticeFields,
        now: DateTime<Utc>,
    ) -> StoreResult<Option<Notice>> {
        let mut tables = self.tables.write().await;
        Ok(tables.notices.iter_mut().find(|n| n.id == id).map(|notice| {
            notice.title = fields.title;
            notice.content = fields.content;
            notice.category = fields.category;
            notice.department = fields.department;
            notice.priority = fields.priority;
            notice.updated_at = now;
            notice.clone()
        }))
    }

    async fn delete_notice(&self, id: Uuid) -> StoreResult<bool> {
        let mut tables = self.tables.write().await;
        let before = tables.notices.len();
        tables.notices.retain(|n| n.id != id);
        Ok(tables.notices.len() < before)
    }

    async fn insert_session(&self, session: SessionRecord) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.users.iter().any(|u| u.id == session.user_id) {
            return Err(StoreError::MissingReference("user"));
        }
        tables.sessions.insert(session.id, session);
        Ok(())
    }

    async fn find_session(&self, id: Uuid) -> StoreResult<Option<SessionRecord>> {
        Ok(self.tables.read().await.sessions.get(&id).cloned())
    }

    async fn delete_session(&self, id: Uuid) -> StoreResult<bool> {
        Ok(self.tables.write().await.sessions.remove(&id).is_some())
    }

    async fn purge_expired_sessions(&self, now: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.tables.write().await;
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| s.expires_at > now);
        Ok((before - tables.sessions.len()) as u64)
    }
}
