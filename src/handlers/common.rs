use crate::errors::{ApiError, ServiceError};
use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use utoipa::IntoParams;

/// Standard success response
pub fn success_response<T: Serialize>(data: T) -> Response {
    (StatusCode::OK, Json(data)).into_response()
}

/// Map service errors to API errors
pub fn map_service_error(err: ServiceError) -> ApiError {
    ApiError::ServiceError(err)
}

/// `?page=` query of the product listing. Kept as text so malformed values
/// produce the regular JSON error body.
#[derive(Debug, Default, Deserialize, Serialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PageQuery {
    /// 1-indexed page number (default 1)
    #[param(value_type = Option<i64>, minimum = 1)]
    pub page: Option<String>,
}

impl PageQuery {
    pub fn number(&self) -> Result<i64, ApiError> {
        match self.page.as_deref().map(str::trim) {
            None | Some("") => Ok(1),
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|_| ApiError::BadRequest(format!("invalid page number: {raw}"))),
        }
    }
}

/// Scheme and host the client addressed, used to build absolute links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestOrigin(pub String);

impl RequestOrigin {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.0, path)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestOrigin
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let scheme = parts
            .headers
            .get("x-forwarded-proto")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(str::trim)
            .filter(|v| *v == "http" || *v == "https")
            .unwrap_or("http");

        let host = parts
            .headers
            .get(header::HOST)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
            .or_else(|| parts.uri.authority().map(|a| a.to_string()))
            .unwrap_or_else(|| "localhost".to_string());

        Ok(RequestOrigin(format!("{scheme}://{host}")))
    }
}
