//! Local file sink.
//!
//! Records are appended one RFC 5424 line at a time. The file is opened on
//! the first write, created if needed, and shared by all writers behind a
//! mutex so lines never interleave.

use std::fs::{File, OpenOptions};
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::debug;

use crate::error::{Error, Result};
use crate::syslog::message::SyslogMessage;
use crate::syslog::writer::Writer;

#[derive(Debug)]
pub struct FileWriter {
    path: PathBuf,
    file: Mutex<Option<File>>,
}

impl FileWriter {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            file: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn file(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Writer for FileWriter {
    fn write(&self, message: &SyslogMessage) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(Error::SinkNotConfigured { what: "file path" });
        }

        let line = format!("{}\n", message);

        let mut guard = self.file();
        if guard.is_none() {
            debug!(path = %self.path.display(), "opening log file");
            *guard = Some(open_append(&self.path)?);
        }
        if let Some(file) = guard.as_mut() {
            file.write_all(line.as_bytes())?;
        }
        Ok(())
    }

    fn close(&self) -> Result<()> {
        if let Some(mut file) = self.file().take() {
            file.flush()?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn open_append(path: &Path) -> Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    Ok(OpenOptions::new()
        .create(true)
        .append(true)
        .mode(0o777)
        .open(path)?)
}

#[cfg(not(unix))]
fn open_append(path: &Path) -> Result<File> {
    Ok(OpenOptions::new().create(true).append(true).open(path)?)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn sample(text: &str) -> SyslogMessage {
        SyslogMessage {
            facility: 1,
            severity: 6,
            version: 1,
            timestamp: "2023-01-02T03:04:05Z".to_string(),
            host_name: "H".to_string(),
            application: "A".to_string(),
            process: "123".to_string(),
            message_id: "M".to_string(),
            audit_data: None,
            metric_data: None,
            message: text.to_string(),
        }
    }

    #[test]
    fn test_writes_one_line_per_record() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.log");
        let writer = FileWriter::new(&path);

        writer.write(&sample("hello")).unwrap();
        writer.close().unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "<14>1 2023-01-02T03:04:05Z H A 123 M - hello\n"
        );
    }

    #[test]
    fn test_appends_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.log");
        fs::write(&path, "existing\n").unwrap();

        let writer = FileWriter::new(&path);
        writer.write(&sample("one")).unwrap();
        writer.close().unwrap();
        writer.write(&sample("two")).unwrap();
        writer.close().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "existing");
        assert!(lines[1].ends_with(" one"));
        assert!(lines[2].ends_with(" two"));
    }

    #[test]
    fn test_lazy_open() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("never.log");
        let writer = FileWriter::new(&path);
        writer.close().unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_empty_path_is_not_configured() {
        let writer = FileWriter::new("");
        let err = writer.write(&sample("x")).unwrap_err();
        assert!(matches!(err, Error::SinkNotConfigured { .. }));
    }

    #[test]
    fn test_missing_directory_is_io_error() {
        let dir = tempdir().unwrap();
        let writer = FileWriter::new(dir.path().join("missing/dir/t.log"));
        assert!(matches!(writer.write(&sample("x")), Err(Error::Io(_))));
    }

    #[test]
    fn test_concurrent_writers_do_not_interleave() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("shared.log");
        let writer = std::sync::Arc::new(FileWriter::new(&path));

        let handles: Vec<_> = (0..8)
            .map(|t| {
                let writer = std::sync::Arc::clone(&writer);
                std::thread::spawn(move || {
                    for i in 0..50 {
                        let text = format!("{}-{} {}", t, i, "x".repeat(200));
                        writer.write(&sample(&text)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        writer.close().unwrap();

        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<SyslogMessage> = contents
            .lines()
            .map(|line| SyslogMessage::parse(line).unwrap())
            .collect();
        assert_eq!(lines.len(), 400);

        for t in 0..8 {
            let prefix = format!("{}-", t);
            let seen: Vec<usize> = lines
                .iter()
                .filter_map(|m| m.message.strip_prefix(&prefix))
                .map(|rest| rest.split(' ').next().unwrap().parse().unwrap())
                .collect();
            assert_eq!(seen, (0..50).collect::<Vec<_>>());
        }
    }
}
