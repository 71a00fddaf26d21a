//! Sink that stores each record as a document in the shared index.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::index::DocumentIndex;
use crate::syslog::message::SyslogMessage;
use crate::syslog::writer::Writer;

/// Writes records through [`DocumentIndex::post_data`].
///
/// Thread-safety is whatever the underlying index provides.
pub struct IndexWriter {
    index: Arc<dyn DocumentIndex>,
    doc_type: String,
    id: String,
}

impl IndexWriter {
    pub fn new(index: Arc<dyn DocumentIndex>) -> Self {
        Self {
            index,
            doc_type: String::new(),
            id: String::new(),
        }
    }

    /// Document type records are stored under. Required before writing.
    pub fn set_type(&mut self, doc_type: impl Into<String>) {
        self.doc_type = doc_type.into();
    }

    /// Fixed document ID. Empty (the default) lets the index assign one per
    /// record.
    pub fn set_id(&mut self, id: impl Into<String>) {
        self.id = id.into();
    }

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }
}

impl Writer for IndexWriter {
    fn write(&self, message: &SyslogMessage) -> Result<()> {
        if self.doc_type.is_empty() {
            return Err(Error::SinkNotConfigured {
                what: "document type",
            });
        }
        let document = serde_json::to_value(message)?;
        self.index.post_data(&self.doc_type, &self.id, &document)?;
        Ok(())
    }
}
