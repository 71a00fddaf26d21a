//! Root health endpoint.
//!
//! Bootstrap in `pz-common` treats a dependency as healthy when `GET /`
//! answers `200 OK`, so every service mounts [`health_check`] at the root.

use pz_common::{DataType, JsonResponse};

use crate::ServiceResponse;

/// Message carried in the health envelope.
pub const HEALTH_MESSAGE: &str = "Hi";

/// `GET /`
///
/// ```text
/// {"statusCode":200,"type":"health","message":"Hi"}
/// ```
pub async fn health_check() -> ServiceResponse {
    let mut response = JsonResponse::new(200).with_message(HEALTH_MESSAGE);
    response.data_type = Some(DataType::Health);
    ServiceResponse(response)
}
