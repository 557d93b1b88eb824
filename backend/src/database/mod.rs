//! Module for database access and common utilities.
//!
//! The `Store` trait is the seam between handlers and persistence. `MongoStore`
//! talks to MongoDB (documents plus GridFS for video bytes); `MemoryStore`
//! keeps everything in process and backs the tests.

pub mod memory;
pub mod models;
pub mod mongo;
pub mod queries;

use async_trait::async_trait;
use mongodb::bson::oid::ObjectId;
use thiserror::Error;

pub use memory::MemoryStore;
pub use models::{
    LogDocument, LogOrigin, LogRecord, LogType, StoredVideo, UserDocument, VideoDocument,
};
pub use mongo::MongoStore;
pub use queries::{LogFilter, VideoFilter};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Driver(#[from] mongodb::error::Error),

    #[error("Database is unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid id: {0}")]
    InvalidId(String),

    #[error("Invalid filter: {0}")]
    InvalidFilter(String),
}

impl StoreError {
    pub fn status_code(&self) -> u16 {
        match self {
            StoreError::InvalidId(_) | StoreError::InvalidFilter(_) => 400,
            StoreError::Unavailable(_) => 503,
            StoreError::Driver(_) => 500,
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    /// Round-trips to the server.
    async fn ping(&self) -> Result<(), StoreError>;

    async fn insert_log(
        &self,
        origin: LogOrigin,
        log_type: LogType,
        message: &str,
    ) -> Result<ObjectId, StoreError>;

    async fn find_logs(&self, filter: &LogFilter) -> Result<Vec<LogDocument>, StoreError>;

    async fn insert_user(
        &self,
        username: &str,
        encrypted_password: &str,
    ) -> Result<ObjectId, StoreError>;

    async fn find_user(&self, username: &str) -> Result<Option<UserDocument>, StoreError>;

    /// Returns whether a user was removed.
    async fn delete_user(&self, username: &str) -> Result<bool, StoreError>;

    async fn insert_video(
        &self,
        crd_id: &str,
        filename: &str,
        contents: Vec<u8>,
    ) -> Result<ObjectId, StoreError>;

    async fn find_videos(&self, filter: &VideoFilter) -> Result<Vec<StoredVideo>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_statuses() {
        let cases = [
            (StoreError::InvalidId("x".to_string()), 400),
            (StoreError::InvalidFilter("level".to_string()), 400),
            (StoreError::Unavailable("down".to_string()), 503),
        ];
        for (error, status) in cases {
            assert_eq!(error.status_code(), status, "{error}");
        }
    }
}
