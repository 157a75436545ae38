// Password hashing with bcrypt

use crate::error::{AppError, ValidationError};

/// bcrypt only reads the first 72 bytes of its input.
pub const MAX_PASSWORD_BYTES: usize = 72;

/// Rejects passwords bcrypt would silently truncate.
pub fn check_password_length(password: &str) -> Result<(), ValidationError> {
    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::PasswordTooLong(MAX_PASSWORD_BYTES));
    }
    Ok(())
}

/// Hash a password with bcrypt at the given cost.
///
/// bcrypt is CPU-bound, so the work runs on the blocking thread pool rather than
/// on the async runtime. The returned digest embeds its own salt.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    check_password_length(password)?;
    let password = password.to_string();

    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("hashing task failed: {e}")))?
        .map_err(|e| AppError::Internal(format!("hashing failed: {e}")))
}

/// Verify a password against a stored bcrypt digest.
///
/// A malformed digest is treated as a mismatch.
pub async fn verify_password(password: &str, digest: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let digest = digest.to_string();

    let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &digest))
        .await
        .map_err(|e| AppError::Internal(format!("verification task failed: {e}")))?;

    match outcome {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!(error = %e, "stored password digest could not be parsed");
            Ok(false)
        }
    }
}
