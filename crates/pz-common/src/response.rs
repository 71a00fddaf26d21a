//! The JSON envelope every pz HTTP endpoint answers with.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;
use crate::pagination::Pagination;

/// Known payload kinds carried in [`JsonResponse::data_type`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    Syslog,
    Error,
    Uuid,
    Job,
    Status,
    Trigger,
    Alert,
    Event,
    EventType,
    Service,
    Data,
    Deployment,
    Health,
    Stats,
    Version,
    /// Any tag this library does not know about.
    #[serde(other)]
    Unknown,
}

/// Response envelope.
///
/// A response is an error iff its status code is in `400..=599`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonResponse {
    pub status_code: u16,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub data_type: Option<DataType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner: Option<Box<JsonResponse>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl JsonResponse {
    pub fn new(status_code: u16) -> Self {
        Self {
            status_code,
            ..Self::default()
        }
    }

    /// A `200 OK` carrying `data` of the given kind.
    pub fn ok(data_type: DataType, data: Value) -> Self {
        Self::new(200).with_data(data_type, data)
    }

    /// An error envelope with a human readable message.
    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            data_type: Some(DataType::Error),
            message: Some(message.into()),
            ..Self::default()
        }
    }

    /// Map a library error onto the status code a caller should see.
    pub fn from_error(err: &Error) -> Self {
        let status = match err {
            Error::Validation { .. }
            | Error::Parse { .. }
            | Error::InvalidParameter { .. }
            | Error::InvalidCount { .. }
            | Error::Json(_) => 400,
            Error::UnknownService { .. } => 404,
            Error::RemoteSink { .. } | Error::StartupHealth { .. } | Error::Http(_) => 502,
            Error::Timeout { .. } => 504,
            Error::Config { .. } | Error::SinkNotConfigured { .. } | Error::Io(_) => 500,
        };
        Self::error(status, err.to_string())
    }

    pub fn with_data(mut self, data_type: DataType, data: Value) -> Self {
        self.data_type = Some(data_type);
        self.data = Some(data);
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = Some(pagination);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn with_inner(mut self, inner: JsonResponse) -> Self {
        self.inner = Some(Box::new(inner));
        self
    }

    pub fn with_metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn is_error(&self) -> bool {
        (400..=599).contains(&self.status_code)
    }
}
