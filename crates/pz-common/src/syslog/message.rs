//! RFC 5424 log records with the pz audit and metric extensions.
//!
//! The text form of a [`SyslogMessage`] is a single line:
//!
//! ```text
//! <PRI>VER TIMESTAMP HOST APP PROC MSGID SDES MESSAGE
//! ```
//!
//! where `SDES` carries up to two private structured-data elements,
//! `[pzaudit@48851 ...]` and `[pzmetric@48851 ...]`, or `-` when neither is
//! present. [`SyslogMessage::parse`] reads the same form back, including both
//! private elements.
//!
//! # Example
//!
//! ```
//! use pz_common::syslog::{AuditElement, Severity, SyslogMessage};
//!
//! let mut message = SyslogMessage::new()
//!     .with_severity(Severity::Notice)
//!     .with_application("pz-workflow")
//!     .with_message("trigger created");
//! message.audit_data = Some(AuditElement::new("alice", "create", "trigger/17"));
//!
//! assert!(message.validate().is_ok());
//! assert!(message.is_security_audit());
//! assert!(message.to_string().starts_with("<13>1 "));
//! ```

use std::fmt::{self, Write as _};
use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, Utc};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::syslog::severity::Severity;

/// Private enterprise number qualifying the pz structured-data IDs.
pub const PRIVATE_ENTERPRISE_NUMBER: u32 = 48851;

/// The only facility used by the pz family.
pub const FACILITY: i32 = 1;

/// The only protocol version emitted and accepted.
pub const VERSION: i32 = 1;

pub const AUDIT_SD_ID: &str = "pzaudit@48851";
pub const METRIC_SD_ID: &str = "pzmetric@48851";

const NIL: &str = "-";

const SECURITY_AUDIT_ACTIONS: [&str; 4] = ["create", "read", "update", "delete"];

static HOST_NAME: Lazy<String> = Lazy::new(|| {
    hostname::get()
        .ok()
        .and_then(|name| name.into_string().ok())
        .map(|name| name.trim().to_string())
        .filter(|name| !name.is_empty())
        .unwrap_or_else(|| NIL.to_string())
});

/// Who did what to which object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditElement {
    pub actor: String,
    pub action: String,
    pub actee: String,
}

impl AuditElement {
    pub fn new(actor: impl Into<String>, action: impl Into<String>, actee: impl Into<String>) -> Self {
        Self {
            actor: actor.into(),
            action: action.into(),
            actee: actee.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("audit actor", &self.actor)?;
        require("audit action", &self.action)?;
        require("audit actee", &self.actee)
    }
}

/// A named measurement about an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricElement {
    pub name: String,
    pub value: f64,
    pub object: String,
}

impl MetricElement {
    pub fn new(name: impl Into<String>, value: f64, object: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value,
            object: object.into(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        require("metric name", &self.name)?;
        require("metric object", &self.object)
    }
}

/// One log record.
///
/// The JSON form (used by the remote logger) mirrors the field names in
/// lower camel case, with the timestamp under `timeStamp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyslogMessage {
    pub facility: i32,
    pub severity: i32,
    pub version: i32,
    #[serde(rename = "timeStamp")]
    pub timestamp: String,
    pub host_name: String,
    pub application: String,
    pub process: String,
    #[serde(default)]
    pub message_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_data: Option<AuditElement>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_data: Option<MetricElement>,
    #[serde(default)]
    pub message: String,
}

impl Default for SyslogMessage {
    fn default() -> Self {
        Self {
            facility: FACILITY,
            severity: Severity::Informational.code(),
            version: VERSION,
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            host_name: HOST_NAME.clone(),
            application: String::new(),
            process: std::process::id().to_string(),
            message_id: String::new(),
            audit_data: None,
            metric_data: None,
            message: String::new(),
        }
    }
}

impl SyslogMessage {
    /// A record stamped with the current time, host name and process ID at
    /// informational severity.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity.code();
        self
    }

    pub fn with_application(mut self, application: impl Into<String>) -> Self {
        self.application = application.into();
        self
    }

    pub fn with_message_id(mut self, message_id: impl Into<String>) -> Self {
        self.message_id = message_id.into();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_audit(mut self, audit: AuditElement) -> Self {
        self.audit_data = Some(audit);
        self
    }

    pub fn with_metric(mut self, metric: MetricElement) -> Self {
        self.metric_data = Some(metric);
        self
    }

    /// RFC 5424 PRI value.
    pub fn priority(&self) -> i32 {
        self.facility * 8 + self.severity
    }

    /// True when the record carries an audit element for a CRUD action.
    pub fn is_security_audit(&self) -> bool {
        self.audit_data
            .as_ref()
            .map(|audit| SECURITY_AUDIT_ACTIONS.contains(&audit.action.as_str()))
            .unwrap_or(false)
    }

    /// Check every field invariant. Serialization never calls this.
    pub fn validate(&self) -> Result<()> {
        if self.facility != FACILITY {
            return Err(Error::validation(format!(
                "facility must be {}, got {}",
                FACILITY, self.facility
            )));
        }
        Severity::try_from(self.severity)?;
        if self.version != VERSION {
            return Err(Error::validation(format!(
                "version must be {}, got {}",
                VERSION, self.version
            )));
        }
        DateTime::parse_from_rfc3339(&self.timestamp).map_err(|e| {
            Error::validation(format!("timestamp {:?} is not RFC 3339: {}", self.timestamp, e))
        })?;

        require_token("host name", &self.host_name)?;
        require_token("application", &self.application)?;
        require_token("process", &self.process)?;
        if self.message_id.chars().any(char::is_whitespace) {
            return Err(Error::validation("message id must not contain whitespace"));
        }
        if self.message_id == NIL {
            return Err(Error::validation("message id must not be the nil value \"-\""));
        }
        // The text form is one line and the parser strips a leading BOM.
        if self.message.contains(['\n', '\r']) {
            return Err(Error::validation("message must not contain line breaks"));
        }
        if self.message.starts_with('\u{feff}') {
            return Err(Error::validation("message must not start with a byte order mark"));
        }

        if let Some(audit) = &self.audit_data {
            audit.validate()?;
        }
        if let Some(metric) = &self.metric_data {
            metric.validate()?;
        }
        Ok(())
    }

    /// Parse one RFC 5424 line.
    ///
    /// `pzaudit@48851` and `pzmetric@48851` elements are reconstructed; any
    /// other structured-data element is skipped. A nil `MSGID` becomes an
    /// empty string, other nil header fields are kept as `-`.
    pub fn parse(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(['\r', '\n']);
        let mut cursor = Cursor::new(line);

        cursor.expect('<')?;
        let priority: i32 = cursor.digits("priority")?;
        if !(0..=191).contains(&priority) {
            return Err(Error::parse(format!("priority {} out of range", priority)));
        }
        cursor.expect('>')?;
        let version: i32 = cursor.digits("version")?;
        cursor.expect(' ')?;

        let timestamp = cursor.token("timestamp")?.to_string();
        cursor.expect(' ')?;
        let host_name = cursor.token("host name")?.to_string();
        cursor.expect(' ')?;
        let application = cursor.token("application")?.to_string();
        cursor.expect(' ')?;
        let process = cursor.token("process")?.to_string();
        cursor.expect(' ')?;
        let message_id = match cursor.token("message id")? {
            NIL => String::new(),
            id => id.to_string(),
        };
        cursor.expect(' ')?;

        let mut audit_data = None;
        let mut metric_data = None;
        if cursor.peek() == Some('-') {
            cursor.advance(1);
        } else {
            while cursor.peek() == Some('[') {
                let element = cursor.element()?;
                match element.id {
                    AUDIT_SD_ID => audit_data = Some(element.audit()),
                    METRIC_SD_ID => metric_data = Some(element.metric()?),
                    _ => {}
                }
            }
        }

        let message = match cursor.rest() {
            "" => String::new(),
            rest => {
                let rest = rest
                    .strip_prefix(' ')
                    .ok_or_else(|| Error::parse("expected space before message"))?;
                rest.strip_prefix('\u{feff}').unwrap_or(rest).to_string()
            }
        };

        Ok(Self {
            facility: priority / 8,
            severity: priority % 8,
            version,
            timestamp,
            host_name,
            application,
            process,
            message_id,
            audit_data,
            metric_data,
            message,
        })
    }

    fn fmt_structured_data(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.audit_data, &self.metric_data) {
            (None, None) => f.write_str(NIL),
            (audit, metric) => {
                if let Some(audit) = audit {
                    write!(
                        f,
                        "[{} Actor=\"{}\" Action=\"{}\" Actee=\"{}\"]",
                        AUDIT_SD_ID,
                        Escaped(&audit.actor),
                        Escaped(&audit.action),
                        Escaped(&audit.actee)
                    )?;
                }
                if audit.is_some() && metric.is_some() {
                    f.write_char(' ')?;
                }
                if let Some(metric) = metric {
                    write!(
                        f,
                        "[{} Name=\"{}\" Value=\"{}\" Object=\"{}\"]",
                        METRIC_SD_ID,
                        Escaped(&metric.name),
                        format_metric_value(metric.value),
                        Escaped(&metric.object)
                    )?;
                }
                Ok(())
            }
        }
    }
}

impl fmt::Display for SyslogMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<{}>{} {} {} {} {} {} ",
            self.priority(),
            self.version,
            nil_if_empty(&self.timestamp),
            nil_if_empty(&self.host_name),
            nil_if_empty(&self.application),
            nil_if_empty(&self.process),
            nil_if_empty(&self.message_id),
        )?;
        self.fmt_structured_data(f)?;
        if !self.message.is_empty() {
            f.write_char(' ')?;
            for c in self.message.chars() {
                f.write_char(if c == '\n' || c == '\r' { ' ' } else { c })?;
            }
        }
        Ok(())
    }
}

impl FromStr for SyslogMessage {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        SyslogMessage::parse(s)
    }
}

fn nil_if_empty(value: &str) -> &str {
    if value.is_empty() {
        NIL
    } else {
        value
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        Err(Error::validation(format!("{} must not be empty", field)))
    } else {
        Ok(())
    }
}

fn require_token(field: &str, value: &str) -> Result<()> {
    require(field, value)?;
    if value.chars().any(char::is_whitespace) {
        return Err(Error::validation(format!("{} must not contain whitespace", field)));
    }
    Ok(())
}

/// Fixed six-decimal rendering, with `NaN` and `±Inf` spelled out.
fn format_metric_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value.is_infinite() {
        let sign = if value > 0.0 { "+" } else { "-" };
        format!("{}Inf", sign)
    } else {
        format!("{:.6}", value)
    }
}

fn parse_metric_value(raw: &str) -> Result<f64> {
    match raw {
        "NaN" => Ok(f64::NAN),
        "+Inf" | "Inf" => Ok(f64::INFINITY),
        "-Inf" => Ok(f64::NEG_INFINITY),
        _ => raw
            .parse()
            .map_err(|_| Error::parse(format!("metric value {:?} is not a number", raw))),
    }
}

/// PARAM-VALUE escaping: `"`, `\` and `]` are backslash-escaped.
struct Escaped<'a>(&'a str);

impl fmt::Display for Escaped<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for c in self.0.chars() {
            if matches!(c, '"' | '\\' | ']') {
                f.write_char('\\')?;
            }
            f.write_char(c)?;
        }
        Ok(())
    }
}

struct Element<'a> {
    id: &'a str,
    params: Vec<(&'a str, String)>,
}

impl Element<'_> {
    fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .rev()
            .find(|(key, _)| *key == name)
            .map(|(_, value)| value.as_str())
    }

    fn audit(&self) -> AuditElement {
        AuditElement::new(
            self.param("Actor").unwrap_or_default(),
            self.param("Action").unwrap_or_default(),
            self.param("Actee").unwrap_or_default(),
        )
    }

    fn metric(&self) -> Result<MetricElement> {
        let value = match self.param("Value") {
            Some(raw) => parse_metric_value(raw)?,
            None => return Err(Error::parse("metric element has no Value")),
        };
        Ok(MetricElement::new(
            self.param("Name").unwrap_or_default(),
            value,
            self.param("Object").unwrap_or_default(),
        ))
    }
}

struct Cursor<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn advance(&mut self, bytes: usize) {
        self.pos += bytes;
    }

    fn expect(&mut self, expected: char) -> Result<()> {
        match self.peek() {
            Some(c) if c == expected => {
                self.advance(c.len_utf8());
                Ok(())
            }
            Some(c) => Err(Error::parse(format!(
                "expected {:?} at offset {}, found {:?}",
                expected, self.pos, c
            ))),
            None => Err(Error::parse(format!(
                "expected {:?} at offset {}, found end of line",
                expected, self.pos
            ))),
        }
    }

    fn digits<T: FromStr>(&mut self, what: &str) -> Result<T> {
        let rest = self.rest();
        let len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if len == 0 || len > 3 {
            return Err(Error::parse(format!("invalid {} at offset {}", what, self.pos)));
        }
        let value = rest[..len]
            .parse()
            .map_err(|_| Error::parse(format!("invalid {} at offset {}", what, self.pos)))?;
        self.advance(len);
        Ok(value)
    }

    /// A run of non-space characters.
    fn token(&mut self, what: &str) -> Result<&'a str> {
        let rest = self.rest();
        let len = rest.find(' ').unwrap_or(rest.len());
        if len == 0 {
            return Err(Error::parse(format!("missing {} at offset {}", what, self.pos)));
        }
        self.advance(len);
        Ok(&rest[..len])
    }

    /// One `[SD-ID PARAM="VALUE" ...]` element.
    fn element(&mut self) -> Result<Element<'a>> {
        self.expect('[')?;
        let rest = self.rest();
        let id_len = rest.find([' ', ']']).unwrap_or(rest.len());
        if id_len == 0 {
            return Err(Error::parse(format!("empty SD-ID at offset {}", self.pos)));
        }
        let id = &rest[..id_len];
        self.advance(id_len);

        let mut params = Vec::new();
        loop {
            match self.peek() {
                Some(']') => {
                    self.advance(1);
                    return Ok(Element { id, params });
                }
                Some(' ') => {
                    self.advance(1);
                    let rest = self.rest();
                    let name_len = rest
                        .find('=')
                        .ok_or_else(|| Error::parse(format!("unterminated SD-PARAM in {}", id)))?;
                    let name = &rest[..name_len];
                    self.advance(name_len + 1);
                    self.expect('"')?;
                    let value = self.quoted()?;
                    params.push((name, value));
                }
                _ => return Err(Error::parse(format!("unterminated SD-ELEMENT {}", id))),
            }
        }
    }

    /// Body of a PARAM-VALUE up to and including the closing quote.
    fn quoted(&mut self) -> Result<String> {
        let mut value = String::new();
        let mut chars = self.rest().char_indices();
        while let Some((offset, c)) = chars.next() {
            match c {
                '"' => {
                    self.advance(offset + 1);
                    return Ok(value);
                }
                '\\' => match chars.next() {
                    Some((_, escaped @ ('"' | '\\' | ']'))) => value.push(escaped),
                    Some((_, other)) => {
                        value.push('\\');
                        value.push(other);
                    }
                    None => break,
                },
                other => value.push(other),
            }
        }
        Err(Error::parse("unterminated PARAM-VALUE"))
    }
}
