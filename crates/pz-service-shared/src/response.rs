//! axum glue for the common JSON envelope.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use pz_common::{Error, JsonResponse};

/// A [`JsonResponse`] sent with the HTTP status named by its `statusCode`.
///
/// # Example
///
/// ```
/// use pz_common::{DataType, JsonResponse};
/// use pz_service_shared::ServiceResponse;
///
/// let response = ServiceResponse::from(JsonResponse::ok(DataType::Syslog, serde_json::json!([])));
/// assert_eq!(response.0.status_code, 200);
/// ```
#[derive(Debug, Clone)]
pub struct ServiceResponse(pub JsonResponse);

impl ServiceResponse {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.0.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

impl From<JsonResponse> for ServiceResponse {
    fn from(response: JsonResponse) -> Self {
        Self(response)
    }
}

impl From<Error> for ServiceResponse {
    fn from(err: Error) -> Self {
        Self(JsonResponse::from_error(&err))
    }
}

impl IntoResponse for ServiceResponse {
    fn into_response(self) -> Response {
        (self.status(), Json(self.0)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_follows_envelope() {
        assert_eq!(ServiceResponse(JsonResponse::new(201)).status(), StatusCode::CREATED);
        assert_eq!(
            ServiceResponse(JsonResponse::error(404, "nope")).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_invalid_status_is_internal_error() {
        assert_eq!(
            ServiceResponse(JsonResponse::new(42)).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_from_error() {
        let response = ServiceResponse::from(Error::InvalidCount { count: -1 });
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(response.0.is_error());
    }

    #[test]
    fn test_into_response_status() {
        let response = ServiceResponse(JsonResponse::error(502, "upstream")).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }
}
