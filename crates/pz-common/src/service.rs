//! Registry of well-known service names in the pz family.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// A service from the closed registry of the pz family.
///
/// The string form (e.g. `pz-logger`) is what appears in platform bindings,
/// directory lookups and log records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ServiceName {
    Logger,
    Uuidgen,
    Workflow,
    Discover,
    /// The message broker. It does not speak HTTP.
    Kafka,
    /// The shared document index.
    Elasticsearch,
    Gateway,
    JobManager,
    ServiceController,
    Ingester,
    Access,
}

impl ServiceName {
    pub const ALL: [ServiceName; 11] = [
        ServiceName::Logger,
        ServiceName::Uuidgen,
        ServiceName::Workflow,
        ServiceName::Discover,
        ServiceName::Kafka,
        ServiceName::Elasticsearch,
        ServiceName::Gateway,
        ServiceName::JobManager,
        ServiceName::ServiceController,
        ServiceName::Ingester,
        ServiceName::Access,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ServiceName::Logger => "pz-logger",
            ServiceName::Uuidgen => "pz-uuidgen",
            ServiceName::Workflow => "pz-workflow",
            ServiceName::Discover => "pz-discover",
            ServiceName::Kafka => "pz-kafka",
            ServiceName::Elasticsearch => "pz-elasticsearch",
            ServiceName::Gateway => "pz-gateway",
            ServiceName::JobManager => "pz-jobmanager",
            ServiceName::ServiceController => "pz-servicecontroller",
            ServiceName::Ingester => "pz-ingester",
            ServiceName::Access => "pz-access",
        }
    }

    /// Path appended to the address when building a service URL.
    pub fn url_prefix(self) -> &'static str {
        match self {
            ServiceName::Discover => "/api/v1",
            _ => "",
        }
    }

    /// Path requested by the startup health check, relative to the service URL.
    ///
    /// Backbone services answer on their bare URL.
    pub fn health_path(self) -> &'static str {
        match self {
            ServiceName::Elasticsearch | ServiceName::Kafka => "",
            _ => "/",
        }
    }

    /// Port used when running outside the platform.
    pub fn local_port(self) -> u16 {
        match self {
            ServiceName::Logger => 14600,
            ServiceName::Uuidgen => 14800,
            ServiceName::Workflow => 14400,
            ServiceName::Discover => 3000,
            ServiceName::Kafka => 9092,
            ServiceName::Elasticsearch => 9200,
            ServiceName::Gateway => 8081,
            ServiceName::JobManager => 8083,
            ServiceName::ServiceController => 8088,
            ServiceName::Ingester => 8084,
            ServiceName::Access => 8085,
        }
    }

    /// Whether the service is reachable over HTTP at all.
    pub fn speaks_http(self) -> bool {
        !matches!(self, ServiceName::Kafka)
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServiceName::ALL
            .iter()
            .copied()
            .find(|name| name.as_str() == s)
            .ok_or_else(|| Error::UnknownService {
                name: s.to_string(),
            })
    }
}

impl TryFrom<String> for ServiceName {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Error> {
        value.parse()
    }
}

impl From<ServiceName> for String {
    fn from(value: ServiceName) -> Self {
        value.as_str().to_string()
    }
}
