//! Severity-named convenience wrapper around a single sink.

use std::sync::Arc;

use crate::error::Result;
use crate::syslog::message::{AuditElement, MetricElement, SyslogMessage};
use crate::syslog::severity::Severity;
use crate::syslog::writer::Writer;

/// Builds a fresh record for every call and hands it to the sink.
///
/// Write errors are returned unchanged; the logger never retries and never
/// logs its own failures.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use pz_common::syslog::{Logger, MemoryWriter, Reader};
///
/// let sink = Arc::new(MemoryWriter::new());
/// let logger = Logger::new(sink.clone()).with_application("pz-workflow");
/// logger.warning("disk at 91%")?;
///
/// let last = sink.read(1)?;
/// assert_eq!(last[0].severity, 4);
/// # Ok::<(), pz_common::Error>(())
/// ```
#[derive(Clone)]
pub struct Logger {
    writer: Arc<dyn Writer>,
    application: String,
}

impl Logger {
    pub fn new(writer: Arc<dyn Writer>) -> Self {
        Self {
            writer,
            application: String::new(),
        }
    }

    /// Application name stamped into every record.
    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = application.into();
        self
    }

    pub fn set_application(&mut self, application: impl Into<String>) {
        self.application = application.into();
    }

    pub fn application(&self) -> &str {
        &self.application
    }

    fn record(&self, severity: Severity, text: &str) -> SyslogMessage {
        SyslogMessage::new()
            .with_severity(severity)
            .with_application(self.application.as_str())
            .with_message(text)
    }

    /// Write a record at an arbitrary severity.
    pub fn log(&self, severity: Severity, text: impl AsRef<str>) -> Result<()> {
        self.writer.write(&self.record(severity, text.as_ref()))
    }

    pub fn debug(&self, text: impl AsRef<str>) -> Result<()> {
        self.log(Severity::Debug, text)
    }

    pub fn info(&self, text: impl AsRef<str>) -> Result<()> {
        self.log(Severity::Informational, text)
    }

    pub fn notice(&self, text: impl AsRef<str>) -> Result<()> {
        self.log(Severity::Notice, text)
    }

    pub fn warning(&self, text: impl AsRef<str>) -> Result<()> {
        self.log(Severity::Warning, text)
    }

    pub fn error(&self, text: impl AsRef<str>) -> Result<()> {
        self.log(Severity::Error, text)
    }

    pub fn fatal(&self, text: impl AsRef<str>) -> Result<()> {
        self.log(Severity::Critical, text)
    }

    /// Record who did what to which object, at notice severity.
    pub fn audit(
        &self,
        actor: impl Into<String>,
        action: impl Into<String>,
        actee: impl Into<String>,
        text: impl AsRef<str>,
    ) -> Result<()> {
        let record = self
            .record(Severity::Notice, text.as_ref())
            .with_audit(AuditElement::new(actor, action, actee));
        self.writer.write(&record)
    }

    /// Record a measurement, at informational severity.
    pub fn metric(
        &self,
        name: impl Into<String>,
        value: f64,
        object: impl Into<String>,
        text: impl AsRef<str>,
    ) -> Result<()> {
        let record = self
            .record(Severity::Informational, text.as_ref())
            .with_metric(MetricElement::new(name, value, object));
        self.writer.write(&record)
    }

    /// Close the underlying sink.
    pub fn close(&self) -> Result<()> {
        self.writer.close()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::syslog::file::FileWriter;
    use crate::syslog::memory::MemoryWriter;
    use crate::syslog::writer::Reader;

    fn logger() -> (Logger, Arc<MemoryWriter>) {
        let sink = Arc::new(MemoryWriter::new());
        (Logger::new(sink.clone()).with_application("pz-test"), sink)
    }

    #[test]
    fn test_severity_methods() {
        let (logger, sink) = logger();
        logger.warning("w").unwrap();
        logger.error("e").unwrap();
        logger.fatal("f").unwrap();

        let records = sink.read(3).unwrap();
        let severities: Vec<i32> = records.iter().map(|r| r.severity).collect();
        assert_eq!(severities, [4, 3, 2]);
        let texts: Vec<&str> = records.iter().map(|r| r.message.as_str()).collect();
        assert_eq!(texts, ["w", "e", "f"]);
    }

    #[test]
    fn test_records_carry_defaults() {
        let (logger, sink) = logger();
        logger.info("hello").unwrap();

        let record = &sink.read(1).unwrap()[0];
        assert_eq!(record.application, "pz-test");
        assert_eq!(record.process, std::process::id().to_string());
        assert_eq!(record.severity, 6);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_application_defaults_to_empty() {
        let sink = Arc::new(MemoryWriter::new());
        let logger = Logger::new(sink.clone());
        logger.debug("x").unwrap();
        assert_eq!(sink.read(1).unwrap()[0].application, "");
    }

    #[test]
    fn test_audit_and_metric() {
        let (logger, sink) = logger();
        logger.audit("alice", "delete", "job/9", "job removed").unwrap();
        logger.metric("latency", 12.5, "GET /job", "slow").unwrap();

        let records = sink.read(2).unwrap();
        assert!(records[0].is_security_audit());
        assert_eq!(records[0].severity, 5);
        assert_eq!(records[1].metric_data.as_ref().unwrap().value, 12.5);
    }

    #[test]
    fn test_errors_propagate() {
        let logger = Logger::new(Arc::new(FileWriter::new("")));
        assert!(matches!(logger.warning("x"), Err(Error::SinkNotConfigured { .. })));
        assert!(logger.close().is_ok());
    }
}
