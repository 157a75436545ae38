//! One-time startup procedure, run before the server accepts requests.

use crate::{
    config::AppConfig,
    error::AppResult,
    models::{NewUser, Role},
    password::hash_password,
    repository::{PostgresRepository, RepositoryState},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedOutcome {
    Created,
    AlreadyPresent,
}

/// Creates the default admin account unless a user with its username exists.
/// Running it again is a no-op.
pub async fn seed_default_admin(repo: &RepositoryState, config: &AppConfig) -> AppResult<SeedOutcome> {
    let seed = &config.admin;

    if repo.find_user_by_username(&seed.username).await?.is_some() {
        return Ok(SeedOutcome::AlreadyPresent);
    }

    let password_hash = hash_password(&seed.password, config.bcrypt_cost).await?;
    repo.insert_user(NewUser {
        username: seed.username.clone(),
        email: seed.email.clone(),
        password_hash,
        role: Role::Admin,
        department: Some(seed.department.clone()),
    })
    .await?;

    Ok(SeedOutcome::Created)
}

/// initialize
///
/// Applies migrations (Postgres only) and seeds the default admin. Failures are
/// logged and do not stop startup, so a misconfigured store surfaces as failing
/// requests rather than a crash loop.
pub async fn initialize(
    repo: &RepositoryState,
    postgres: Option<&PostgresRepository>,
    config: &AppConfig,
) {
    if let Some(pg) = postgres {
        match pg.migrate().await {
            Ok(()) => tracing::info!("database migrations applied"),
            Err(e) => tracing::error!(error = %e, "database migration failed"),
        }
    }

    match seed_default_admin(repo, config).await {
        Ok(SeedOutcome::Created) => {
            tracing::info!(username = %config.admin.username, "default admin created");
            if config.admin.password == crate::config::DEFAULT_ADMIN_PASSWORD {
                tracing::warn!("default admin uses the built-in password; set ADMIN_PASSWORD");
            }
        }
        Ok(SeedOutcome::AlreadyPresent) => tracing::debug!("default admin already present"),
        Err(e) => tracing::error!(error = %e, "database initialization error"),
    }
}
