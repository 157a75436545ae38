use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::{
    auth::{Session, issue_token},
    config::AppConfig,
    error::{AppError, AppResult, AuthError, AuthorizationError, StoreError, ValidationError},
    models::{
        MAX_EMAIL_LEN, MAX_LABEL_LEN, MAX_USERNAME_LEN, NewUser, RegisterRequest, Role,
        SessionRecord, User, UserProfile, check_length, normalize_label,
    },
    password::{check_password_length, hash_password, verify_password},
    repository::RepositoryState,
};

/// IssuedSession
///
/// Result of a successful login: the resolved session plus the signed token
/// that carries it between requests.
#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub session: Session,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
}

/// Decides which role a self-registration receives.
///
/// Nobody can register as admin. Teachers may self-register only when the
/// deployment allows it; otherwise staff roles are granted by an admin.
pub fn registration_role(config: &AppConfig, requested: Option<&str>) -> Result<Role, ValidationError> {
    let role = match requested.map(str::trim) {
        None | Some("") => return Ok(Role::Student),
        Some(value) => value.parse::<Role>()?,
    };

    match role {
        Role::Student => Ok(Role::Student),
        Role::Teacher if config.allow_staff_self_registration => Ok(Role::Teacher),
        other => Err(ValidationError::RoleNotSelfAssignable(other)),
    }
}

/// register
///
/// Validates the form, checks uniqueness of username and email, hashes the
/// password and stores the new account. Nothing is written when any check fails.
pub async fn register(
    repo: &RepositoryState,
    config: &AppConfig,
    req: RegisterRequest,
) -> AppResult<User> {
    let username = req.username.trim().to_string();
    let email = req.email.trim().to_string();

    if username.is_empty() {
        return Err(ValidationError::MissingField("Username").into());
    }
    if email.is_empty() {
        return Err(ValidationError::MissingField("Email").into());
    }
    if req.password.is_empty() {
        return Err(ValidationError::MissingField("Password").into());
    }
    if req.password != req.confirm_password {
        return Err(ValidationError::PasswordMismatch.into());
    }
    check_length("Username", &username, MAX_USERNAME_LEN)?;
    check_length("Email", &email, MAX_EMAIL_LEN)?;
    check_password_length(&req.password)?;

    let department = normalize_label(req.department);
    if let Some(department) = &department {
        check_length("Department", department, MAX_LABEL_LEN)?;
    }

    let role = registration_role(config, req.role.as_deref())?;

    if repo.find_user_by_username(&username).await?.is_some() {
        return Err(ValidationError::UsernameTaken.into());
    }
    if repo.find_user_by_email(&email).await?.is_some() {
        return Err(ValidationError::EmailTaken.into());
    }

    let password_hash = hash_password(&req.password, config.bcrypt_cost).await?;

    let user = repo
        .insert_user(NewUser {
            username,
            email,
            password_hash,
            role,
            department,
        })
        .await
        // A concurrent registration can still win the race for the same name.
        .map_err(|e| match e {
            StoreError::Duplicate("email") => AppError::from(ValidationError::EmailTaken),
            StoreError::Duplicate(_) => AppError::from(ValidationError::UsernameTaken),
            other => AppError::from(other),
        })?;

    tracing::info!(user_id = %user.id, username = %user.username, role = %user.role, "user registered");
    Ok(user)
}

/// authenticate
///
/// Checks the credentials and opens a new server-side session. Unknown
/// usernames and wrong passwords produce the same error.
pub async fn authenticate(
    repo: &RepositoryState,
    config: &AppConfig,
    username: &str,
    password: &str,
) -> AppResult<IssuedSession> {
    let username = username.trim();

    let Some(user) = repo.find_user_by_username(username).await? else {
        tracing::warn!(username = %username, "login failed: unknown user");
        return Err(AuthError::InvalidCredentials.into());
    };

    if !verify_password(password, &user.password_hash).await? {
        tracing::warn!(username = %username, "login failed: wrong password");
        return Err(AuthError::InvalidCredentials.into());
    }

    let now = Utc::now();
    let purged = repo.purge_expired_sessions(now).await?;
    if purged > 0 {
        tracing::debug!(purged, "expired sessions removed");
    }

    let expires_at = Duration::try_seconds(config.session_ttl_secs)
        .and_then(|ttl| now.checked_add_signed(ttl))
        .ok_or_else(|| {
            AppError::Internal(format!(
                "session lifetime of {}s is out of range",
                config.session_ttl_secs
            ))
        })?;

    let record = SessionRecord {
        id: Uuid::new_v4(),
        user_id: user.id,
        created_at: now,
        expires_at,
    };
    repo.insert_session(record.clone()).await?;

    let token = issue_token(config, &record, &user)?;

    tracing::info!(user_id = %user.id, session_id = %record.id, "user logged in");
    Ok(IssuedSession {
        session: Session::for_user(record.id, &user),
        token,
        expires_at: record.expires_at,
        user,
    })
}

/// end_session
///
/// Logout. Removes the server-side record when there is one; never fails.
pub async fn end_session(repo: &RepositoryState, session: Option<&Session>) {
    let Some(session) = session else {
        return;
    };

    match repo.delete_session(session.session_id).await {
        Ok(_) => tracing::info!(user_id = %session.user_id, "user logged out"),
        Err(e) => tracing::error!(error = %e, "failed to delete session record"),
    }
}

// --- Account administration ---

pub async fn list_users(repo: &RepositoryState) -> AppResult<Vec<UserProfile>> {
    let users = repo.list_users().await?;
    Ok(users.into_iter().map(UserProfile::from).collect())
}

/// The elevation flow: an admin grants or revokes a staff role.
pub async fn set_user_role(
    repo: &RepositoryState,
    admin: &Session,
    user_id: Uuid,
    role: Role,
) -> AppResult<UserProfile> {
    if admin.user_id == user_id {
        return Err(AuthorizationError::OwnAccount.into());
    }

    let user = repo
        .set_user_role(user_id, role)
        .await?
        .ok_or_else(|| AppError::user_not_found(user_id))?;

    tracing::info!(admin_id = %admin.user_id, user_id = %user.id, role = %role, "user role changed");
    Ok(user.into())
}

/// Hard-deletes an account together with its notices and sessions.
pub async fn delete_user(repo: &RepositoryState, admin: &Session, user_id: Uuid) -> AppResult<()> {
    if admin.user_id == user_id {
        return Err(AuthorizationError::OwnAccount.into());
    }

    if !repo.delete_user(user_id).await? {
        return Err(AppError::user_not_found(user_id));
    }

    tracing::info!(admin_id = %admin.user_id, user_id = %user_id, "user deleted");
    Ok(())
}
