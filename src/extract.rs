use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;

use crate::error::{AppError, ValidationError};

/// ApiJson
///
/// JSON request body extractor. Behaves like `axum::Json`, but a missing content
/// type, malformed JSON or a body of the wrong shape is rejected as a
/// `ValidationError`, so the client gets the usual `{"error": ...}` body with 400.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                tracing::debug!(error = %rejection.body_text(), "request body rejected");
                Err(ValidationError::MalformedBody(rejection.body_text()).into())
            }
        }
    }
}
