//! The sink contract shared by every log destination.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::syslog::message::SyslogMessage;

/// A destination for log records.
///
/// Implementations must be safe to share between threads. `close` releases
/// whatever the sink holds; it is idempotent and safe to call on a sink that
/// was never written to.
pub trait Writer: Send + Sync {
    fn write(&self, message: &SyslogMessage) -> Result<()>;

    fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A sink that can hand back what it stored.
pub trait Reader: Send + Sync {
    /// The last `count` records, oldest first.
    ///
    /// Asking for more than is stored returns everything; a negative count is
    /// an [`Error::InvalidCount`].
    fn read(&self, count: isize) -> Result<Vec<SyslogMessage>>;
}

impl<W: Writer + ?Sized> Writer for Arc<W> {
    fn write(&self, message: &SyslogMessage) -> Result<()> {
        (**self).write(message)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

impl<W: Writer + ?Sized> Writer for Box<W> {
    fn write(&self, message: &SyslogMessage) -> Result<()> {
        (**self).write(message)
    }

    fn close(&self) -> Result<()> {
        (**self).close()
    }
}

/// Convert a signed record count into a slice length.
pub(crate) fn checked_count(count: isize) -> Result<usize> {
    usize::try_from(count).map_err(|_| Error::InvalidCount { count })
}

/// Feeds every record to each inner sink in order.
///
/// The first failing sink stops the fan-out and its error is returned.
#[derive(Default)]
pub struct MultiWriter {
    writers: Vec<Arc<dyn Writer>>,
}

impl MultiWriter {
    pub fn new(writers: Vec<Arc<dyn Writer>>) -> Self {
        Self { writers }
    }

    pub fn push(&mut self, writer: Arc<dyn Writer>) {
        self.writers.push(writer);
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }
}

impl Writer for MultiWriter {
    fn write(&self, message: &SyslogMessage) -> Result<()> {
        self.writers.iter().try_for_each(|writer| writer.write(message))
    }

    /// Closes every inner sink, returning the first error after trying all.
    fn close(&self) -> Result<()> {
        let mut first_error = None;
        for writer in &self.writers {
            if let Err(e) = writer.close() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}
