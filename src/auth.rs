use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{DateTime, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::AppConfig,
    error::{AppError, AuthError},
    models::{Role, SessionRecord, User},
    repository::RepositoryState,
};

/// Claims
///
/// Payload of the signed session token handed to the client at login.
/// The token is only a carrier: a request is authenticated when the signature
/// verifies AND the server-side session record `sid` still exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's id.
    pub sub: Uuid,
    /// Session id: primary key of the `sessions` row backing this token.
    pub sid: Uuid,
    pub username: String,
    pub role: Role,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat), seconds since the epoch.
    pub iat: usize,
}

/// Session
///
/// The resolved identity of an authenticated request. Role and department are
/// read from the user record on every request, so an admin's role change takes
/// effect on the user's next request.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub username: String,
    pub role: Role,
    pub department: Option<String>,
}

impl Session {
    pub fn for_user(session_id: Uuid, user: &User) -> Self {
        Self {
            session_id,
            user_id: user.id,
            username: user.username.clone(),
            role: user.role,
            department: user.department.clone(),
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}

/// Signs a token for a freshly created session record.
pub fn issue_token(
    config: &AppConfig,
    record: &SessionRecord,
    user: &User,
) -> Result<String, AppError> {
    let claims = Claims {
        sub: user.id,
        sid: record.id,
        username: user.username.clone(),
        role: user.role,
        exp: record.expires_at.timestamp().max(0) as usize,
        iat: record.created_at.timestamp().max(0) as usize,
    };

    let key = EncodingKey::from_secret(config.jwt_secret.as_bytes());
    encode(&Header::default(), &claims, &key)
        .map_err(|e| AppError::Internal(format!("token signing failed: {e}")))
}

fn decode_claims(config: &AppConfig, token: &str) -> Result<Claims, AuthError> {
    let key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::SessionExpired,
            _ => AuthError::InvalidToken,
        })
}

/// resolve_session
///
/// Turns a bearer token into a `Session`:
/// 1. verify the signature and expiry of the token,
/// 2. load the server-side session record (absent once the user logged out),
/// 3. reject records past their `expires_at`,
/// 4. load the user, which must still exist.
pub async fn resolve_session(
    repo: &RepositoryState,
    config: &AppConfig,
    token: &str,
) -> Result<Session, AppError> {
    resolve_session_at(repo, config, token, Utc::now()).await
}

async fn resolve_session_at(
    repo: &RepositoryState,
    config: &AppConfig,
    token: &str,
    now: DateTime<Utc>,
) -> Result<Session, AppError> {
    let claims = decode_claims(config, token)?;

    let record = repo
        .find_session(claims.sid)
        .await?
        .ok_or(AuthError::SessionEnded)?;

    if record.user_id != claims.sub {
        return Err(AuthError::InvalidToken.into());
    }
    if record.expires_at <= now {
        return Err(AuthError::SessionExpired.into());
    }

    let user = repo
        .find_user_by_id(record.user_id)
        .await?
        .ok_or(AuthError::SessionEnded)?;

    Ok(Session::for_user(record.id, &user))
}

/// Gate used by every route that requires login.
pub fn require_session(session: Option<Session>) -> Result<Session, AuthError> {
    session.ok_or(AuthError::MissingSession)
}

/// Gate for role-restricted routes.
pub fn require_role(session: &Session, role: Role) -> Result<(), AuthError> {
    if session.role == role {
        Ok(())
    } else {
        Err(AuthError::RoleRequired(role))
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header.
pub fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// MaybeSession
///
/// Optional identity for routes open to anonymous callers. A missing, invalid or
/// ended token resolves to `None`; only store failures reject the request.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<Session>);

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(parts) else {
            return Ok(MaybeSession(None));
        };

        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        match resolve_session(&repo, &config, token).await {
            Ok(session) => Ok(MaybeSession(Some(session))),
            Err(AppError::Auth(_)) => Ok(MaybeSession(None)),
            Err(e) => Err(e),
        }
    }
}

/// Session Extractor Implementation
///
/// Makes `Session` usable as a handler argument. Rejects with 401 when the
/// request carries no token, or a token that does not resolve to a live session.
/// A session placed in the request extensions by `auth_middleware` is reused.
impl<S> FromRequestParts<S> for Session
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        // Already resolved by the route layer.
        if let Some(session) = parts.extensions.get::<Session>() {
            return Ok(session.clone());
        }

        let session = match bearer_token(parts) {
            Some(token) => {
                let repo = RepositoryState::from_ref(state);
                let config = AppConfig::from_ref(state);
                Some(resolve_session(&repo, &config, token).await?)
            }
            None => None,
        };

        Ok(require_session(session)?)
    }
}

/// AdminSession
///
/// A `Session` whose role has been checked to be `admin`.
#[derive(Debug, Clone)]
pub struct AdminSession(pub Session);

impl<S> FromRequestParts<S> for AdminSession
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let session = Session::from_request_parts(parts, state).await?;
        require_role(&session, Role::Admin)?;
        Ok(AdminSession(session))
    }
}
