#![allow(dead_code)]

use notice_board::{
    AppState,
    auth::Session,
    config::AppConfig,
    identity,
    models::{Notice, NoticeRequest, RegisterRequest, Role, User},
    notices,
    repository::{InMemoryRepository, Repository, RepositoryState},
};
use std::sync::Arc;

/// Test configuration: in-memory store, bcrypt cost 4, teachers may self-register.
pub fn test_config() -> AppConfig {
    AppConfig {
        allow_staff_self_registration: true,
        ..AppConfig::default()
    }
}

pub fn memory_repo() -> (Arc<InMemoryRepository>, RepositoryState) {
    let memory = Arc::new(InMemoryRepository::new());
    let repo = memory.clone() as RepositoryState;
    (memory, repo)
}

pub fn test_state() -> AppState {
    let (_, repo) = memory_repo();
    AppState {
        repo,
        config: test_config(),
    }
}

pub fn registration(username: &str, password: &str, role: &str, department: &str) -> RegisterRequest {
    RegisterRequest {
        username: username.to_string(),
        email: format!("{username}@college.edu"),
        password: password.to_string(),
        confirm_password: password.to_string(),
        role: Some(role.to_string()),
        department: Some(department.to_string()),
    }
}

/// Registers a user and returns the stored record. Admins cannot self-register,
/// so they are registered as students and elevated directly in the store.
pub async fn create_user(repo: &RepositoryState, username: &str, role: Role, department: &str) -> User {
    let requested = if role == Role::Admin { "student" } else { role.as_str() };
    let user = identity::register(
        repo,
        &test_config(),
        registration(username, "password-123", requested, department),
    )
    .await
    .expect("registration should succeed");

    if role == Role::Admin {
        repo.set_user_role(user.id, Role::Admin)
            .await
            .unwrap()
            .expect("user exists")
    } else {
        user
    }
}

/// Logs `username` in and returns the resolved session.
pub async fn login(repo: &RepositoryState, username: &str) -> Session {
    identity::authenticate(repo, &test_config(), username, "password-123")
        .await
        .expect("login should succeed")
        .session
}

pub async fn user_session(repo: &RepositoryState, username: &str, role: Role, department: &str) -> Session {
    create_user(repo, username, role, department).await;
    login(repo, username).await
}

pub fn notice_request(title: &str, department: &str) -> NoticeRequest {
    NoticeRequest {
        title: title.to_string(),
        content: format!("{title} content"),
        category: Some("General".to_string()),
        department: Some(department.to_string()),
        priority: None,
    }
}

pub async fn post_notice(repo: &RepositoryState, author: &Session, title: &str, department: &str) -> Notice {
    notices::create(repo, author, notice_request(title, department))
        .await
        .expect("notice creation should succeed")
}
