//! Platform environment reader.
//!
//! The cloud platform describes the running application and its bound
//! backing services through JSON blobs in `VCAP_APPLICATION` and
//! `VCAP_SERVICES`. [`PlatformEnv`] captures those variables (plus `PORT`,
//! `DOMAIN` and `SPACE`) once, so the rest of bootstrap never touches the
//! process environment directly.
//!
//! # Example
//!
//! ```
//! use pz_common::vcap::PlatformEnv;
//!
//! let env = PlatformEnv::builder()
//!     .application(r#"{"application_id":"1","application_name":"pz-logger","application_uris":["pz-logger.int.example.io"]}"#)
//!     .port("8080")
//!     .build();
//!
//! let app = env.read_application().unwrap().unwrap();
//! assert_eq!(app.address, "pz-logger.int.example.io");
//! assert_eq!(app.bind_to, ":8080");
//! ```

use std::collections::HashMap;
use std::env;

use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};

pub const VCAP_APPLICATION_ENV: &str = "VCAP_APPLICATION";
pub const VCAP_SERVICES_ENV: &str = "VCAP_SERVICES";
pub const PORT_ENV: &str = "PORT";
pub const DOMAIN_ENV: &str = "DOMAIN";
pub const SPACE_ENV: &str = "SPACE";

/// Snapshot of the platform-injected environment variables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformEnv {
    pub application: Option<String>,
    pub services: Option<String>,
    pub port: Option<String>,
    pub domain: Option<String>,
    pub space: Option<String>,
}

/// Identity of the running application as reported by the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationInfo {
    pub id: String,
    pub name: String,
    /// Externally reachable host, the first of the application URIs.
    pub address: String,
    /// Listen address in `:port` form.
    pub bind_to: String,
}

#[derive(Debug, Deserialize)]
struct VcapApplication {
    #[serde(default)]
    application_id: String,
    #[serde(default)]
    application_name: String,
    #[serde(default)]
    application_uris: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VcapServices {
    #[serde(rename = "user-provided", default)]
    user_provided: Vec<VcapService>,
}

#[derive(Debug, Deserialize)]
struct VcapService {
    name: String,
    #[serde(default)]
    credentials: VcapCredentials,
    #[serde(default)]
    #[allow(dead_code)]
    label: String,
    #[serde(default)]
    #[allow(dead_code)]
    tags: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct VcapCredentials {
    #[serde(default)]
    host: String,
}

impl PlatformEnv {
    /// Capture the platform variables from the process environment.
    pub fn from_env() -> Self {
        Self {
            application: env::var(VCAP_APPLICATION_ENV).ok(),
            services: env::var(VCAP_SERVICES_ENV).ok(),
            port: env::var(PORT_ENV).ok(),
            domain: env::var(DOMAIN_ENV).ok(),
            space: env::var(SPACE_ENV).ok(),
        }
    }

    /// Start building an environment from explicit values.
    pub fn builder() -> PlatformEnvBuilder {
        PlatformEnvBuilder::default()
    }

    /// Read the application identity.
    ///
    /// Returns `Ok(None)` when `VCAP_APPLICATION` is unset, meaning the
    /// process runs outside the platform and the caller should fall back to
    /// local defaults.
    pub fn read_application(&self) -> Result<Option<ApplicationInfo>> {
        let Some(raw) = self.application.as_deref() else {
            return Ok(None);
        };

        let app: VcapApplication = serde_json::from_str(raw)
            .map_err(|e| Error::config(format!("{} is not valid JSON: {}", VCAP_APPLICATION_ENV, e)))?;

        let port = self
            .port
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                Error::config(format!(
                    "{} is required when {} is set",
                    PORT_ENV, VCAP_APPLICATION_ENV
                ))
            })?;
        let port: u16 = port
            .parse()
            .map_err(|_| Error::config(format!("{} is not a valid port: {:?}", PORT_ENV, port)))?;

        let address = app
            .application_uris
            .first()
            .cloned()
            .ok_or_else(|| Error::config("application_uris is empty"))?;

        debug!(name = %app.application_name, address = %address, port, "read platform application");

        Ok(Some(ApplicationInfo {
            id: app.application_id,
            name: app.application_name,
            address,
            bind_to: format!(":{}", port),
        }))
    }

    /// Read the bound user-provided services as a map of name to address.
    ///
    /// Duplicate names resolve to the last binding.
    pub fn read_services(&self) -> Result<HashMap<String, String>> {
        let Some(raw) = self.services.as_deref() else {
            return Ok(HashMap::new());
        };

        let services: VcapServices = serde_json::from_str(raw)
            .map_err(|e| Error::config(format!("{} is not valid JSON: {}", VCAP_SERVICES_ENV, e)))?;

        let map: HashMap<String, String> = services
            .user_provided
            .into_iter()
            .map(|service| (service.name, service.credentials.host))
            .collect();

        debug!(count = map.len(), "read platform services");
        Ok(map)
    }

    /// Parsed `PORT`, if present and numeric.
    pub fn port_number(&self) -> Option<u16> {
        self.port.as_deref().and_then(|p| p.trim().parse().ok())
    }
}

/// Builder for [`PlatformEnv`] values that do not come from the process
/// environment.
#[derive(Debug, Default)]
pub struct PlatformEnvBuilder {
    env: PlatformEnv,
}

impl PlatformEnvBuilder {
    pub fn application(mut self, json: impl Into<String>) -> Self {
        self.env.application = Some(json.into());
        self
    }

    pub fn services(mut self, json: impl Into<String>) -> Self {
        self.env.services = Some(json.into());
        self
    }

    pub fn port(mut self, port: impl Into<String>) -> Self {
        self.env.port = Some(port.into());
        self
    }

    pub fn domain(mut self, domain: impl Into<String>) -> Self {
        self.env.domain = Some(domain.into());
        self
    }

    pub fn space(mut self, space: impl Into<String>) -> Self {
        self.env.space = Some(space.into());
        self
    }

    pub fn build(self) -> PlatformEnv {
        self.env
    }
}
