mod common;

use axum::{
    Json,
    body::Body,
    extract::{Path, State},
    http::{Request, StatusCode, header},
    response::{IntoResponse, Response},
};
use common::{create_user, notice_request, post_notice, test_state, user_session};
use notice_board::{
    AppState,
    auth::{AdminSession, MaybeSession, Session},
    create_router,
    extract::ApiJson,
    handlers,
    models::{
        ErrorResponse, LoginRequest, LoginResponse, Notice, Role, UpdateRoleRequest, UserProfile,
    },
    repository::Repository,
};
use serde::de::DeserializeOwned;
use tokio::test;
use tower::ServiceExt;
use uuid::Uuid;

// --- TEST UTILITIES ---

async fn body_json<T: DeserializeOwned>(response: Response) -> (StatusCode, T) {
    let (parts, body) = response.into_parts();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).expect("response body should be JSON");
    (parts.status, value)
}

async fn staffed_state() -> (AppState, Session, Session, Session) {
    let state = test_state();
    let admin = user_session(&state.repo, "root", Role::Admin, "Administration").await;
    let teacher = user_session(&state.repo, "tara", Role::Teacher, "CS").await;
    let student = user_session(&state.repo, "sam", Role::Student, "EE").await;
    (state, admin, teacher, student)
}

async fn bearer_for(state: &AppState, username: &str) -> String {
    let issued = notice_board::identity::authenticate(
        &state.repo,
        &state.config,
        username,
        "password-123",
    )
    .await
    .unwrap();
    format!("Bearer {}", issued.token)
}

fn request(method: &str, uri: &str, token: Option<&str>, body: Option<serde_json::Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, token);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

// --- HANDLER TESTS ---

#[test]
async fn test_register_returns_created_profile() {
    let state = test_state();

    let (status, Json(profile)) = handlers::register_user(
        State(state.clone()),
        ApiJson(common::registration("nina", "pw-1", "student", "EE")),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(profile.username, "nina");
    assert_eq!(profile.role, Role::Student);
}

#[test]
async fn test_register_duplicate_is_bad_request() {
    let state = test_state();
    create_user(&state.repo, "nina", Role::Student, "EE").await;

    let err = handlers::register_user(
        State(state),
        ApiJson(common::registration("nina", "pw-1", "student", "EE")),
    )
    .await
    .unwrap_err();

    let (status, body): (_, ErrorResponse) = body_json(err.into_response()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body.error, "Username already exists");
}

#[test]
async fn test_login_wrong_password_is_unauthorized() {
    let state = test_state();
    create_user(&state.repo, "tara", Role::Teacher, "CS").await;

    let err = handlers::login(
        State(state),
        ApiJson(LoginRequest {
            username: "tara".into(),
            password: "nope".into(),
        }),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::UNAUTHORIZED);
}

#[test]
async fn test_login_returns_token_and_profile() {
    let state = test_state();
    let user = create_user(&state.repo, "tara", Role::Teacher, "CS").await;

    let Json(response) = handlers::login(
        State(state),
        ApiJson(LoginRequest {
            username: "tara".into(),
            password: "password-123".into(),
        }),
    )
    .await
    .unwrap();

    assert!(!response.token.is_empty());
    assert_eq!(response.user.id, user.id);
    assert_eq!(response.user.department.as_deref(), Some("CS"));
}

#[test]
async fn test_logout_without_session_still_succeeds() {
    let state = test_state();
    let status = handlers::logout(State(state), MaybeSession(None)).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
}

#[test]
async fn test_get_notices_filters_by_department() {
    let (state, _admin, teacher, student) = staffed_state().await;
    post_notice(&state.repo, &teacher, "for CS", "CS").await;
    let all = post_notice(&state.repo, &teacher, "for everyone", "All").await;

    let Json(listed) = handlers::get_notices(student, State(state)).await.unwrap();

    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, all.id);
}

#[test]
async fn test_create_notice_forbidden_for_student() {
    let (state, _admin, _teacher, student) = staffed_state().await;

    let err = handlers::create_notice(student, State(state), ApiJson(notice_request("x", "All")))
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[test]
async fn test_create_notice_success() {
    let (state, _admin, teacher, _student) = staffed_state().await;

    let (status, Json(notice)) = handlers::create_notice(
        teacher.clone(),
        State(state),
        ApiJson(notice_request("Exam", "CS")),
    )
    .await
    .unwrap();

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(notice.user_id, teacher.user_id);
}

#[test]
async fn test_update_notice_not_owner_is_forbidden() {
    let (state, _admin, teacher, _student) = staffed_state().await;
    let other = user_session(&state.repo, "otto", Role::Teacher, "CS").await;
    let notice = post_notice(&state.repo, &teacher, "mine", "CS").await;

    let err = handlers::update_notice(
        other,
        State(state),
        Path(notice.id),
        ApiJson(notice_request("theirs", "CS")),
    )
    .await
    .unwrap_err();

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

#[test]
async fn test_delete_notice_missing_is_not_found() {
    let (state, admin, _teacher, _student) = staffed_state().await;

    let err = handlers::delete_notice(admin, State(state), Path(Uuid::new_v4()))
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[test]
async fn test_delete_notice_admin_override() {
    let (state, admin, teacher, _student) = staffed_state().await;
    let notice = post_notice(&state.repo, &teacher, "to remove", "CS").await;

    let status = handlers::delete_notice(admin, State(state.clone()), Path(notice.id))
        .await
        .unwrap();

    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(state.repo.get_notice(notice.id).await.unwrap().is_none());
}

#[test]
async fn test_public_notice_detail() {
    let (state, _admin, teacher, _student) = staffed_state().await;
    let notice = post_notice(&state.repo, &teacher, "open day", "CS").await;

    let Json(found) = handlers::get_public_notice(State(state.clone()), Path(notice.id))
        .await
        .unwrap();
    assert_eq!(found, notice);

    let err = handlers::get_public_notice(State(state), Path(Uuid::new_v4()))
        .await
        .unwrap_err();
    assert_eq!(err.status(), StatusCode::NOT_FOUND);
}

#[test]
async fn test_update_user_role_promotes() {
    let (state, admin, _teacher, student) = staffed_state().await;

    let Json(profile) = handlers::update_user_role(
        AdminSession(admin),
        State(state),
        Path(student.user_id),
        ApiJson(UpdateRoleRequest { role: Role::Teacher }),
    )
    .await
    .unwrap();

    assert_eq!(profile.role, Role::Teacher);
}

#[test]
async fn test_delete_own_account_is_forbidden() {
    let (state, admin, _teacher, _student) = staffed_state().await;

    let err = handlers::delete_user(AdminSession(admin.clone()), State(state), Path(admin.user_id))
        .await
        .unwrap_err();

    assert_eq!(err.status(), StatusCode::FORBIDDEN);
}

// --- ROUTER TESTS ---

#[test]
async fn test_health_route() {
    let router = create_router(test_state());
    let response = router.oneshot(request("GET", "/health", None, None)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[test]
async fn test_protected_routes_require_token() {
    let router = create_router(test_state());

    for (method, uri) in [
        ("GET", "/notices"),
        ("GET", "/me"),
        ("GET", "/me/notices"),
        ("GET", "/admin/users"),
    ] {
        let response = router
            .clone()
            .oneshot(request(method, uri, None, None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{method} {uri}");
    }

    let response = router
        .oneshot(request("GET", "/notices", Some("Bearer not-a-jwt"), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[test]
async fn test_admin_routes_reject_non_admin() {
    let (state, _admin, _teacher, _student) = staffed_state().await;
    let token = bearer_for(&state, "tara").await;
    let router = create_router(state);

    let response = router
        .oneshot(request("GET", "/admin/users", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[test]
async fn test_admin_lists_users() {
    let (state, _admin, _teacher, _student) = staffed_state().await;
    let token = bearer_for(&state, "root").await;
    let router = create_router(state);

    let response = router
        .oneshot(request("GET", "/admin/users", Some(&token), None))
        .await
        .unwrap();
    let (status, users): (_, Vec<UserProfile>) = body_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(users.len(), 3);
}

#[test]
async fn test_login_logout_over_router() {
    let state = test_state();
    create_user(&state.repo, "tara", Role::Teacher, "CS").await;
    let router = create_router(state);

    let response = router
        .clone()
        .oneshot(request(
            "POST",
            "/login",
            None,
            Some(serde_json::json!({ "username": "tara", "password": "password-123" })),
        ))
        .await
        .unwrap();
    let (status, login): (_, LoginResponse) = body_json(response).await;
    assert_eq!(status, StatusCode::OK);
    let token = format!("Bearer {}", login.token);

    let response = router
        .clone()
        .oneshot(request("GET", "/me", Some(&token), None))
        .await
        .unwrap();
    let (status, me): (_, UserProfile) = body_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(me.username, "tara");

    let response = router
        .clone()
        .oneshot(request("POST", "/logout", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = router
        .oneshot(request("GET", "/me", Some(&token), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[test]
async fn test_public_listing_needs_no_token() {
    let (state, _admin, teacher, _student) = staffed_state().await;
    let notice = post_notice(&state.repo, &teacher, "dept only", "CS").await;
    let router = create_router(state);

    let response = router
        .oneshot(request("GET", "/public/notices", None, None))
        .await
        .unwrap();
    let (status, listed): (_, Vec<Notice>) = body_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, notice.id);
}

#[test]
async fn test_student_create_over_router_is_forbidden() {
    let (state, _admin, _teacher, _student) = staffed_state().await;
    let token = bearer_for(&state, "sam").await;
    let router = create_router(state);

    let response = router
        .oneshot(request(
            "POST",
            "/notices",
            Some(&token),
            Some(serde_json::json!({ "title": "Party", "content": "Friday" })),
        ))
        .await
        .unwrap();
    let (status, body): (_, ErrorResponse) = body_json(response).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(!body.error.is_empty());
}

#[test]
async fn test_requests_carry_request_id() {
    let router = create_router(test_state());
    let response = router.oneshot(request("GET", "/health", None, None)).await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
}

#[test]
async fn test_malformed_bodies_get_json_errors() {
    let (state, _admin, _teacher, student) = staffed_state().await;
    let teacher_token = bearer_for(&state, "tara").await;
    let admin_token = bearer_for(&state, "root").await;
    let router = create_router(state);

    let cases = [
        request("POST", "/login", None, Some(serde_json::json!(["not", "an", "object"]))),
        request("POST", "/notices", Some(&teacher_token), Some(serde_json::json!({ "title": 42 }))),
        request(
            "PUT",
            &format!("/admin/users/{}/role", student.user_id),
            Some(&admin_token),
            Some(serde_json::json!({ "role": "dean" })),
        ),
        // No content type at all.
        Request::builder()
            .method("POST")
            .uri("/register")
            .body(Body::from(r#"{"username":"x"}"#))
            .unwrap(),
    ];

    for req in cases {
        let uri = req.uri().to_string();
        let response = router.clone().oneshot(req).await.unwrap();
        let (status, body): (_, ErrorResponse) = body_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        assert!(body.error.starts_with("Invalid request body"), "{uri}: {}", body.error);
    }
}
