//! Rust structs that represent MongoDB collection mappings.
//!
//! These models define the structure of data as it is stored in and retrieved
//! from the database. The API-facing views (`LogRecord`) differ from the
//! stored documents: ids become hex strings and timestamps RFC 3339 strings.

use std::{fmt, str::FromStr};

use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogOrigin {
    Backend,
    Frontend,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum LogType {
    Debug,
    Error,
    Info,
    Warning,
}

impl LogOrigin {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogOrigin::Backend => "BACKEND",
            LogOrigin::Frontend => "FRONTEND",
        }
    }
}

impl LogType {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogType::Debug => "DEBUG",
            LogType::Error => "ERROR",
            LogType::Info => "INFO",
            LogType::Warning => "WARNING",
        }
    }
}

impl fmt::Display for LogOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for LogType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LogOrigin {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "BACKEND" => Ok(LogOrigin::Backend),
            "FRONTEND" => Ok(LogOrigin::Frontend),
            _ => Err(format!("'{s}' is not a valid log origin")),
        }
    }
}

impl FromStr for LogType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "DEBUG" => Ok(LogType::Debug),
            "ERROR" => Ok(LogType::Error),
            "INFO" => Ok(LogType::Info),
            "WARNING" => Ok(LogType::Warning),
            _ => Err(format!("'{s}' is not a valid log type")),
        }
    }
}

/// A log entry sent by the frontend or produced by the backend itself.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LogDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub log_type: LogType,
    pub log_origin: LogOrigin,
    pub message: String,
    pub timestamp: DateTime,
}

impl LogDocument {
    pub fn new(log_origin: LogOrigin, log_type: LogType, message: impl Into<String>) -> Self {
        Self {
            id: ObjectId::new(),
            log_type,
            log_origin,
            message: message.into(),
            timestamp: DateTime::now(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct LogRecord {
    pub id: String,
    pub log_type: LogType,
    pub message: String,
    pub log_origin: LogOrigin,
    pub timestamp: String,
}

impl From<LogDocument> for LogRecord {
    fn from(doc: LogDocument) -> Self {
        Self {
            id: doc.id.to_hex(),
            log_type: doc.log_type,
            message: doc.message,
            log_origin: doc.log_origin,
            timestamp: doc.timestamp.try_to_rfc3339_string().unwrap_or_default(),
        }
    }
}

/// `password` holds a Fernet token, never the clear text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct UserDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub username: String,
    pub password: String,
}

/// Video metadata. The encrypted bytes live in GridFS under `file_id`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct VideoDocument {
    #[serde(rename = "_id")]
    pub id: ObjectId,
    pub crd_id: String,
    pub filename: String,
    pub timestamp: DateTime,
    pub file_id: ObjectId,
}

/// A video together with its (still encrypted) contents.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredVideo {
    pub id: ObjectId,
    pub crd_id: String,
    pub filename: String,
    pub contents: Vec<u8>,
}
