//! Process-wide service directory and startup sequencing.
//!
//! [`SystemConfig`] answers three questions for a service: who am I, where do
//! I bind, and where are my dependencies. It is built once at startup from
//! the platform environment and then passed explicitly to whatever needs it
//! (for example the remote HTTP log sink).
//!
//! Construction is blocking and fail-fast: it only returns once every
//! required dependency has answered its health check.
//!
//! # Example
//!
//! ```no_run
//! use pz_common::{ServiceName, SystemConfig};
//!
//! let config = SystemConfig::new(ServiceName::Workflow, &[ServiceName::Logger, ServiceName::Uuidgen])?;
//! let logger_url = config.url_of(ServiceName::Logger)?;
//! # Ok::<(), pz_common::Error>(())
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::StatusCode;
use tracing::{debug, info, warn};

use crate::blocking::run_blocking;
use crate::error::{Error, Result};
use crate::service::ServiceName;
use crate::vcap::PlatformEnv;

/// Domain suffix used when neither the platform nor `DOMAIN` provide one.
pub const DEFAULT_DOMAIN: &str = ".int.geointservices.io";

/// Deployment space used when `SPACE` is unset.
pub const DEFAULT_SPACE: &str = "int";

/// Total budget for `wait_for_service` and `wait_for_service_to_die`.
pub const WAIT_TIMEOUT: Duration = Duration::from_millis(2000);

/// Delay between polls while waiting on a service.
pub const WAIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Own identity plus the directory of dependency endpoints.
pub struct SystemConfig {
    name: ServiceName,
    address: String,
    bind_to: String,
    domain: String,
    space: String,
    endpoints: Mutex<HashMap<ServiceName, String>>,
    client: Client,
}

impl SystemConfig {
    /// Build the directory from the process environment and run the startup
    /// health checks.
    pub fn new(name: ServiceName, required: &[ServiceName]) -> Result<Self> {
        Self::with_env(name, required, &PlatformEnv::from_env())
    }

    /// Same as [`SystemConfig::new`] but reads platform data from `env`
    /// instead of the process environment.
    pub fn with_env(name: ServiceName, required: &[ServiceName], env: &PlatformEnv) -> Result<Self> {
        let application = env.read_application()?;

        let (address, bind_to, uri_domain) = match &application {
            Some(app) => {
                info!(
                    service = %name,
                    application = %app.name,
                    address = %app.address,
                    "running on platform"
                );
                (app.address.clone(), app.bind_to.clone(), domain_from_uri(&app.address))
            }
            None => {
                let port = env.port_number().unwrap_or_else(|| name.local_port());
                info!(service = %name, port, "no platform application info, using local defaults");
                (format!("localhost:{}", port), format!(":{}", port), None)
            }
        };

        let domain = uri_domain
            .or_else(|| env.domain.clone().filter(|d| !d.trim().is_empty()))
            .unwrap_or_else(|| DEFAULT_DOMAIN.to_string());
        let domain = ensure_leading_dot(domain.trim());

        let space = env
            .space
            .clone()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_SPACE.to_string());

        let services = env.read_services()?;

        let mut endpoints = HashMap::new();
        for &service in required {
            let endpoint = if service == name {
                address.clone()
            } else if let Some(host) = services.get(service.as_str()) {
                host.clone()
            } else {
                let fallback = format!("{}{}", service, domain);
                debug!(service = %service, address = %fallback, "service not bound, using domain fallback");
                fallback
            };
            endpoints.insert(service, endpoint);
        }

        let config = Self {
            name,
            address,
            bind_to,
            domain,
            space,
            endpoints: Mutex::new(endpoints),
            client: run_blocking(build_client)?,
        };

        config.run_health_checks()?;
        Ok(config)
    }

    /// Name this process registered as.
    pub fn name(&self) -> ServiceName {
        self.name
    }

    /// Externally reachable address of this process.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// Listen address in `:port` form.
    pub fn bind_to(&self) -> &str {
        &self.bind_to
    }

    /// Domain suffix, always starting with a dot.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub fn space(&self) -> &str {
        &self.space
    }

    /// HTTP client shared by everything that talks to directory entries.
    pub fn http_client(&self) -> Client {
        self.client.clone()
    }

    /// Insert or replace the address of `name`.
    pub fn add_service(&self, name: ServiceName, address: impl Into<String>) {
        let address = address.into();
        debug!(service = %name, address = %address, "registering service address");
        self.endpoints().insert(name, address);
    }

    /// Address (`host:port`) of `name`.
    pub fn address_of(&self, name: ServiceName) -> Result<String> {
        self.endpoints()
            .get(&name)
            .cloned()
            .ok_or_else(|| Error::UnknownService {
                name: name.to_string(),
            })
    }

    /// Base URL of `name`, including its path prefix.
    pub fn url_of(&self, name: ServiceName) -> Result<String> {
        let address = self.address_of(name)?;
        Ok(format!("http://{}{}", address, name.url_prefix()))
    }

    /// Snapshot of the directory.
    pub fn services(&self) -> HashMap<ServiceName, String> {
        self.endpoints().clone()
    }

    /// Block until `name` answers `200 OK` on its root, or the wait budget
    /// expires.
    pub fn wait_for_service(&self, name: ServiceName) -> Result<()> {
        self.wait_until(name, true)
    }

    /// Block until `name` stops accepting connections, or the wait budget
    /// expires.
    pub fn wait_for_service_to_die(&self, name: ServiceName) -> Result<()> {
        self.wait_until(name, false)
    }

    fn wait_until(&self, name: ServiceName, alive: bool) -> Result<()> {
        let url = self.url_of(name)?;
        run_blocking(|| self.poll(name, &url, alive))
    }

    fn poll(&self, name: ServiceName, url: &str, alive: bool) -> Result<()> {
        let started = Instant::now();

        loop {
            let remaining = WAIT_TIMEOUT.saturating_sub(started.elapsed());
            if remaining.is_zero() {
                warn!(service = %name, alive, "wait timed out");
                return Err(Error::Timeout {
                    service: name,
                    alive,
                    elapsed: started.elapsed(),
                });
            }

            // A request cut short by the budget says nothing about the peer.
            let reached = match self.client.get(url).timeout(remaining).send() {
                Ok(response) => alive && response.status() == StatusCode::OK,
                Err(e) => !alive && !e.is_timeout(),
            };

            if reached {
                debug!(service = %name, alive, elapsed_ms = started.elapsed().as_millis() as u64, "wait finished");
                return Ok(());
            }

            thread::sleep(WAIT_POLL_INTERVAL.min(WAIT_TIMEOUT.saturating_sub(started.elapsed())));
        }
    }

    fn run_health_checks(&self) -> Result<()> {
        run_blocking(|| self.check_dependencies())
    }

    fn check_dependencies(&self) -> Result<()> {
        let mut targets: Vec<(ServiceName, String)> = self
            .services()
            .into_iter()
            .filter(|(service, _)| *service != self.name && service.speaks_http())
            .collect();
        targets.sort();

        for (service, _) in targets {
            let url = format!("{}{}", self.url_of(service)?, service.health_path());
            debug!(service = %service, url = %url, "running startup health check");

            let response = self.client.get(&url).send().map_err(|e| Error::StartupHealth {
                service,
                reason: e.to_string(),
            })?;

            if response.status() != StatusCode::OK {
                return Err(Error::StartupHealth {
                    service,
                    reason: format!("{} returned {}", url, response.status()),
                });
            }
        }

        info!(service = %self.name, "startup health checks passed");
        Ok(())
    }

    fn endpoints(&self) -> MutexGuard<'_, HashMap<ServiceName, String>> {
        self.endpoints.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SystemConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SystemConfig")
            .field("name", &self.name)
            .field("address", &self.address)
            .field("bind_to", &self.bind_to)
            .field("domain", &self.domain)
            .field("space", &self.space)
            .field("endpoints", &*self.endpoints())
            .finish()
    }
}

fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(HTTP_TIMEOUT)
        .user_agent(format!("pz-common/{}", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(Error::Http)
}

/// Everything after the first label of a host name, e.g.
/// `pz-logger.int.example.io` -> `.int.example.io`.
fn domain_from_uri(uri: &str) -> Option<String> {
    let host = uri.split(['/', ':']).next().unwrap_or(uri);
    host.split_once('.')
        .map(|(_, rest)| rest)
        .filter(|rest| !rest.is_empty())
        .map(|rest| format!(".{}", rest))
}

fn ensure_leading_dot(domain: &str) -> String {
    if domain.starts_with('.') {
        domain.to_string()
    } else {
        format!(".{}", domain)
    }
}
