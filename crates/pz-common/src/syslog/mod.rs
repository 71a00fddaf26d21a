//! Structured logging: RFC 5424 records, the sinks they are written to and
//! a severity-named facade.
//!
//! ```text
//! Logger ──▶ SyslogMessage ──▶ dyn Writer
//!                               ├─ MemoryWriter   (also Reader)
//!                               ├─ FileWriter
//!                               ├─ HttpWriter     (pz-logger, POST /syslog)
//!                               ├─ SyslogdWriter  (host daemon, unix only)
//!                               ├─ IndexWriter    (document index)
//!                               └─ MultiWriter    (fan-out)
//! ```

pub mod file;
pub mod http;
pub mod index;
pub mod logger;
pub mod memory;
pub mod message;
pub mod severity;
#[cfg(unix)]
pub mod syslogd;
pub mod writer;

pub use file::FileWriter;
pub use http::HttpWriter;
pub use index::IndexWriter;
pub use logger::Logger;
pub use memory::MemoryWriter;
pub use message::{
    AuditElement, MetricElement, SyslogMessage, AUDIT_SD_ID, METRIC_SD_ID,
    PRIVATE_ENTERPRISE_NUMBER,
};
pub use severity::Severity;
#[cfg(unix)]
pub use syslogd::{SyslogAddress, SyslogdWriter};
pub use writer::{MultiWriter, Reader, Writer};
