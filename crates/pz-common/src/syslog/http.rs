//! Remote sink that posts records to the pz-logger service.

use reqwest::blocking::Client;
use tracing::info;

use crate::blocking::run_blocking;
use crate::error::{Error, Result};
use crate::response::JsonResponse;
use crate::service::ServiceName;
use crate::syslog::message::SyslogMessage;
use crate::syslog::writer::Writer;
use crate::system::SystemConfig;

/// Path on the logger service that accepts records.
pub const SYSLOG_PATH: &str = "/syslog";

/// Posts each record as JSON to `POST /syslog` on the logger service.
///
/// Every write is an independent HTTP transaction, so the sink can be shared
/// freely between threads. Writes block the caller until the logger answers;
/// from inside a tokio runtime the request is moved off the async executor,
/// so handlers may log through this sink directly.
#[derive(Debug, Clone)]
pub struct HttpWriter {
    url: String,
    client: Client,
}

impl HttpWriter {
    /// Locate the logger through `config`, blocking until it answers or the
    /// wait budget runs out.
    pub fn new(config: &SystemConfig) -> Result<Self> {
        config.wait_for_service(ServiceName::Logger)?;
        let base = config.url_of(ServiceName::Logger)?;
        info!(url = %base, "remote log sink ready");
        Ok(Self::with_client(base, config.http_client()))
    }

    /// Sink for a logger at a known base URL.
    pub fn with_client(base_url: impl Into<String>, client: Client) -> Self {
        let base_url = base_url.into();
        Self {
            url: format!("{}{}", base_url.trim_end_matches('/'), SYSLOG_PATH),
            client,
        }
    }

    /// Full URL records are posted to.
    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Writer for HttpWriter {
    fn write(&self, message: &SyslogMessage) -> Result<()> {
        run_blocking(|| self.post(message))
    }
}

impl HttpWriter {
    fn post(&self, message: &SyslogMessage) -> Result<()> {
        let response = self
            .client
            .post(&self.url)
            .json(message)
            .send()
            .map_err(|e| Error::RemoteSink {
                message: format!("POST {} failed: {}", self.url, e),
            })?;

        let http_status = response.status();
        let envelope: JsonResponse = response.json().map_err(|e| Error::RemoteSink {
            message: format!("POST {} returned {} with an unreadable body: {}", self.url, http_status, e),
        })?;

        if envelope.status_code >= 400 || !http_status.is_success() {
            return Err(Error::RemoteSink {
                message: format!(
                    "POST {} returned {} ({}): {}",
                    self.url,
                    envelope.status_code,
                    http_status,
                    envelope.message.as_deref().unwrap_or("no message")
                ),
            });
        }
        Ok(())
    }
}
