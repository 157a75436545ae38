use chrono::{Duration, Utc};
use notice_board::{
    error::StoreError,
    models::{NewUser, NoticeFields, Priority, Role, SessionRecord},
    repository::{InMemoryRepository, Repository},
};
use uuid::Uuid;

fn new_user(name: &str) -> NewUser {
    NewUser {
        username: name.to_string(),
        email: format!("{name}@college.edu"),
        password_hash: "$2b$04$hash".to_string(),
        role: Role::Teacher,
        department: Some("CS".to_string()),
    }
}

fn fields(title: &str) -> NoticeFields {
    NoticeFields {
        title: title.to_string(),
        content: "content".to_string(),
        category: None,
        department: Some("All".to_string()),
        priority: Priority::High,
    }
}

#[tokio::test]
async fn usernames_and_emails_are_unique() {
    let repo = InMemoryRepository::new();
    repo.insert_user(new_user("ann")).await.unwrap();

    let err = repo.insert_user(new_user("ann")).await.unwrap_err();
    assert!(matches!(err, StoreError::Duplicate("username")));

    let err = repo
        .insert_user(NewUser {
            username: "ann2".into(),
            ..new_user("ann")
        })
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Duplicate("email")));

    assert_eq!(repo.list_users().await.unwrap().len(), 1);
}

#[tokio::test]
async fn notices_require_an_existing_owner() {
    let repo = InMemoryRepository::new();
    let err = repo
        .insert_notice(fields("orphan"), Uuid::new_v4(), Utc::now())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::MissingReference("user")));
    assert_eq!(repo.notice_count().await, 0);
}

#[tokio::test]
async fn active_listing_is_newest_first_even_on_equal_timestamps() {
    let repo = InMemoryRepository::new();
    let owner = repo.insert_user(new_user("ann")).await.unwrap();
    let at = Utc::now();

    let older = repo
        .insert_notice(fields("older"), owner.id, at - Duration::minutes(5))
        .await
        .unwrap();
    let tie_a = repo.insert_notice(fields("tie a"), owner.id, at).await.unwrap();
    let tie_b = repo.insert_notice(fields("tie b"), owner.id, at).await.unwrap();

    let titles: Vec<_> = repo
        .list_active_notices()
        .await
        .unwrap()
        .into_iter()
        .map(|n| n.id)
        .collect();
    assert_eq!(titles, vec![tie_b.id, tie_a.id, older.id]);
}

#[tokio::test]
async fn update_replaces_fields_but_keeps_identity() {
    let repo = InMemoryRepository::new();
    let owner = repo.insert_user(new_user("ann")).await.unwrap();
    let created = repo.insert_notice(fields("v1"), owner.id, Utc::now()).await.unwrap();

    let later = created.created_at + Duration::minutes(1);
    let updated = repo
        .update_notice(created.id, fields("v2"), later)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.id, created.id);
    assert_eq!(updated.user_id, owner.id);
    assert_eq!(updated.title, "v2");
    assert_eq!(updated.created_at, created.created_at);
    assert_eq!(updated.updated_at, later);

    assert!(repo
        .update_notice(Uuid::new_v4(), fields("none"), later)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn deleting_user_cascades_to_notices_and_sessions() {
    let repo = InMemoryRepository::new();
    let ann = repo.insert_user(new_user("ann")).await.unwrap();
    let bob = repo.insert_user(new_user("bob")).await.unwrap();

    repo.insert_notice(fields("ann 1"), ann.id, Utc::now()).await.unwrap();
    repo.insert_notice(fields("ann 2"), ann.id, Utc::now()).await.unwrap();
    let bobs = repo.insert_notice(fields("bob"), bob.id, Utc::now()).await.unwrap();

    let now = Utc::now();
    repo.insert_session(SessionRecord {
        id: Uuid::new_v4(),
        user_id: ann.id,
        created_at: now,
        expires_at: now + Duration::hours(1),
    })
    .await
    .unwrap();

    assert!(repo.delete_user(ann.id).await.unwrap());
    assert!(!repo.delete_user(ann.id).await.unwrap());

    let remaining = repo.list_active_notices().await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, bobs.id);
    assert_eq!(repo.session_count().await, 0);
}

#[tokio::test]
async fn purge_removes_only_expired_sessions() {
    let repo = InMemoryRepository::new();
    let ann = repo.insert_user(new_user("ann")).await.unwrap();
    let now = Utc::now();

    let expired = SessionRecord {
        id: Uuid::new_v4(),
        user_id: ann.id,
        created_at: now - Duration::hours(2),
        expires_at: now - Duration::hours(1),
    };
    let live = SessionRecord {
        id: Uuid::new_v4(),
        user_id: ann.id,
        created_at: now,
        expires_at: now + Duration::hours(1),
    };
    repo.insert_session(expired.clone()).await.unwrap();
    repo.insert_session(live.clone()).await.unwrap();

    assert_eq!(repo.purge_expired_sessions(now).await.unwrap(), 1);
    assert!(repo.find_session(expired.id).await.unwrap().is_none());
    assert_eq!(repo.find_session(live.id).await.unwrap(), Some(live));
}

#[tokio::test]
async fn role_changes_persist() {
    let repo = InMemoryRepository::new();
    let ann = repo.insert_user(new_user("ann")).await.unwrap();

    let changed = repo.set_user_role(ann.id, Role::Admin).await.unwrap().unwrap();
    assert_eq!(changed.role, Role::Admin);
    assert_eq!(
        repo.find_user_by_id(ann.id).await.unwrap().unwrap().role,
        Role::Admin
    );
    assert!(repo.set_user_role(Uuid::new_v4(), Role::Admin).await.unwrap().is_none());
}
