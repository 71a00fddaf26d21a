//! Common runtime for the pz microservice family.
//!
//! Every service in the family links this crate for:
//!
//! - [`vcap`]: reading the platform-injected environment
//! - [`SystemConfig`]: own identity, dependency directory, startup health checks
//! - [`syslog`]: RFC 5424 records and the sinks they are written to
//! - [`JsonResponse`] and [`Pagination`]: the HTTP envelope and paging parameters
//! - [`index`]: typed access to the shared document index, plus a mock
//!
//! A typical service boots like this:
//!
//! ```no_run
//! use std::sync::Arc;
//! use pz_common::syslog::{HttpWriter, Logger};
//! use pz_common::{ServiceName, SystemConfig};
//!
//! let config = SystemConfig::new(ServiceName::Workflow, &[ServiceName::Logger])?;
//! let logger = Logger::new(Arc::new(HttpWriter::new(&config)?)).with_application("pz-workflow");
//! logger.warning("started without a cache")?;
//! # Ok::<(), pz_common::Error>(())
//! ```

mod blocking;
pub mod error;
pub mod index;
pub mod pagination;
pub mod response;
pub mod service;
pub mod syslog;
pub mod system;
pub mod vcap;

pub use error::{Error, Result};
pub use index::{DocumentIndex, ElasticIndex, IndexResponse, MockIndex};
pub use pagination::{Pagination, SortOrder};
pub use response::{DataType, JsonResponse};
pub use service::ServiceName;
pub use system::SystemConfig;
pub use vcap::PlatformEnv;
