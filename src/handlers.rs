use crate::{
    AppState,
    auth::{AdminSession, MaybeSession, Session},
    error::{AppError, AppResult},
    extract::ApiJson,
    identity,
    models::{
        ErrorResponse, LoginRequest, LoginResponse, Notice, NoticeRequest, RegisterRequest,
        UpdateRoleRequest, UserProfile,
    },
    notices,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use uuid::Uuid;

// --- Identity ---

/// register_user
///
/// [Public Route] Creates an account. The role defaults to `student`.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = UserProfile),
        (status = 400, description = "Invalid or duplicate input", body = ErrorResponse)
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterRequest>,
) -> AppResult<(StatusCode, Json<UserProfile>)> {
    let user = identity::register(&state.repo, &state.config, payload).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// login
///
/// [Public Route] Exchanges credentials for a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid username or password", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let issued =
        identity::authenticate(&state.repo, &state.config, &payload.username, &payload.password)
            .await?;

    Ok(Json(LoginResponse {
        token: issued.token,
        expires_at: issued.expires_at,
        user: issued.user.into(),
    }))
}

/// logout
///
/// [Public Route] Ends the caller's session if there is one. Always succeeds.
#[utoipa::path(
    post,
    path = "/logout",
    responses((status = 204, description = "Logged out"))
)]
pub async fn logout(
    State(state): State<AppState>,
    MaybeSession(session): MaybeSession,
) -> StatusCode {
    identity::end_session(&state.repo, session.as_ref()).await;
    StatusCode::NO_CONTENT
}

/// get_me
///
/// [Authenticated Route] Profile of the logged-in user.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(session: Session, State(state): State<AppState>) -> AppResult<Json<UserProfile>> {
    let user = state
        .repo
        .find_user_by_id(session.user_id)
        .await?
        .ok_or_else(|| AppError::user_not_found(session.user_id))?;
    Ok(Json(user.into()))
}

// --- Notices ---

/// get_notices
///
/// [Authenticated Route] The caller's notice board: filtered by department
/// unless the caller is an admin.
#[utoipa::path(
    get,
    path = "/notices",
    responses((status = 200, description = "Visible notices", body = [Notice]))
)]
pub async fn get_notices(session: Session, State(state): State<AppState>) -> AppResult<Json<Vec<Notice>>> {
    Ok(Json(notices::list_visible(&state.repo, &session).await?))
}

/// get_my_notices
///
/// [Authenticated Route] Notices authored by the caller.
#[utoipa::path(
    get,
    path = "/me/notices",
    responses((status = 200, description = "My notices", body = [Notice]))
)]
pub async fn get_my_notices(
    session: Session,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Notice>>> {
    Ok(Json(notices::list_owned(&state.repo, &session).await?))
}

/// create_notice
///
/// [Authenticated Route] Teachers and admins publish a notice owned by themselves.
#[utoipa::path(
    post,
    path = "/notices",
    request_body = NoticeRequest,
    responses(
        (status = 201, description = "Created", body = Notice),
        (status = 400, description = "Missing title or content", body = ErrorResponse),
        (status = 403, description = "Students cannot publish", body = ErrorResponse)
    )
)]
pub async fn create_notice(
    session: Session,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NoticeRequest>,
) -> AppResult<(StatusCode, Json<Notice>)> {
    let notice = notices::create(&state.repo, &session, payload).await?;
    Ok((StatusCode::CREATED, Json(notice)))
}

/// get_notice
///
/// [Authenticated Route] A single notice.
#[utoipa::path(
    get,
    path = "/notices/{id}",
    params(("id" = Uuid, Path, description = "Notice ID")),
    responses(
        (status = 200, description = "Found", body = Notice),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_notice(
    _session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Notice>> {
    Ok(Json(notices::get_active(&state.repo, id).await?))
}

/// update_notice
///
/// [Authenticated Route] Overwrites every field of a notice. Owner or admin only.
#[utoipa::path(
    put,
    path = "/notices/{id}",
    params(("id" = Uuid, Path, description = "Notice ID")),
    request_body = NoticeRequest,
    responses(
        (status = 200, description = "Updated", body = Notice),
        (status = 403, description = "Not owner nor admin", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn update_notice(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<NoticeRequest>,
) -> AppResult<Json<Notice>> {
    Ok(Json(notices::update(&state.repo, &session, id, payload).await?))
}

/// delete_notice
///
/// [Authenticated Route] Permanently removes a notice. Owner or admin only.
#[utoipa::path(
    delete,
    path = "/notices/{id}",
    params(("id" = Uuid, Path, description = "Notice ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not owner nor admin", body = ErrorResponse),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_notice(
    session: Session,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    notices::delete(&state.repo, &session, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// get_public_notices
///
/// [Public Route] Every active notice, for anonymous visitors.
#[utoipa::path(
    get,
    path = "/public/notices",
    responses((status = 200, description = "Active notices", body = [Notice]))
)]
pub async fn get_public_notices(State(state): State<AppState>) -> AppResult<Json<Vec<Notice>>> {
    Ok(Json(notices::list_public(&state.repo).await?))
}

/// get_public_notice
///
/// [Public Route] A single active notice.
#[utoipa::path(
    get,
    path = "/public/notices/{id}",
    params(("id" = Uuid, Path, description = "Notice ID")),
    responses(
        (status = 200, description = "Found", body = Notice),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn get_public_notice(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Notice>> {
    Ok(Json(notices::get_active(&state.repo, id).await?))
}

// --- Administration ---

/// get_users
///
/// [Admin Route] Every registered account.
#[utoipa::path(
    get,
    path = "/admin/users",
    responses(
        (status = 200, description = "All users", body = [UserProfile]),
        (status = 403, description = "Admin access required", body = ErrorResponse)
    )
)]
pub async fn get_users(
    AdminSession(_admin): AdminSession,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<UserProfile>>> {
    Ok(Json(identity::list_users(&state.repo).await?))
}

/// update_user_role
///
/// [Admin Route] Grants or revokes a role.
#[utoipa::path(
    put,
    path = "/admin/users/{id}/role",
    params(("id" = Uuid, Path, description = "User ID")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Updated", body = UserProfile),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn update_user_role(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(payload): ApiJson<UpdateRoleRequest>,
) -> AppResult<Json<UserProfile>> {
    Ok(Json(identity::set_user_role(&state.repo, &admin, id, payload.role).await?))
}

/// delete_user
///
/// [Admin Route] Deletes an account and, by cascade, its notices and sessions.
#[utoipa::path(
    delete,
    path = "/admin/users/{id}",
    params(("id" = Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found", body = ErrorResponse)
    )
)]
pub async fn delete_user(
    AdminSession(admin): AdminSession,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<StatusCode> {
    identity::delete_user(&state.repo, &admin, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
