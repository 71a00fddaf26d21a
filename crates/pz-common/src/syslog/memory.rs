//! In-memory sink, used by tests and by anything that needs to inspect
//! recent records.

use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::error::Result;
use crate::syslog::message::SyslogMessage;
use crate::syslog::writer::{checked_count, Reader, Writer};

/// Append-only buffer of records.
#[derive(Debug, Default)]
pub struct MemoryWriter {
    messages: Mutex<Vec<SyslogMessage>>,
}

impl MemoryWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.messages().len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages().is_empty()
    }

    fn messages(&self) -> MutexGuard<'_, Vec<SyslogMessage>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Writer for MemoryWriter {
    fn write(&self, message: &SyslogMessage) -> Result<()> {
        self.messages().push(message.clone());
        Ok(())
    }
}

impl Reader for MemoryWriter {
    fn read(&self, count: isize) -> Result<Vec<SyslogMessage>> {
        let count = checked_count(count)?;
        let messages = self.messages();
        let start = messages.len().saturating_sub(count);
        Ok(messages[start..].to_vec())
    }
}
