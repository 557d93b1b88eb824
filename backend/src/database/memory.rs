//! In-process implementation of `Store`.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, DateTime};
use tokio::sync::Mutex;

use super::models::{LogDocument, LogOrigin, LogType, StoredVideo, UserDocument, VideoDocument};
use super::queries::{LogFilter, VideoFilter};
use super::{Store, StoreError};

pub struct MemoryStore {
    pub logs: Mutex<Vec<LogDocument>>,
    pub users: Mutex<Vec<UserDocument>>,
    pub videos: Mutex<Vec<(VideoDocument, Vec<u8>)>>,
    available: AtomicBool,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self {
            logs: Mutex::new(Vec::new()),
            users: Mutex::new(Vec::new()),
            videos: Mutex::new(Vec::new()),
            available: AtomicBool::new(true),
        }
    }
}

impl MemoryStore {
    /// Simulates the server going down or coming back.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::Relaxed);
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.available.load(Ordering::Relaxed) {
            Ok(())
        } else {
            Err(StoreError::Unavailable("memory store is offline".to_string()))
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        self.check()
    }

    async fn insert_log(
        &self,
        origin: LogOrigin,
        log_type: LogType,
        message: &str,
    ) -> Result<ObjectId, StoreError> {
        self.check()?;
        let log = LogDocument::new(origin, log_type, message);
        let id = log.id;
        self.logs.lock().await.push(log);
        Ok(id)
    }

    async fn find_logs(&self, filter: &LogFilter) -> Result<Vec<LogDocument>, StoreError> {
        self.check()?;
        Ok(self
            .logs
            .lock()
            .await
            .iter()
            .filter(|log| filter.matches(log))
            .cloned()
            .collect())
    }

    async fn insert_user(
        &self,
        username: &str,
        encrypted_password: &str,
    ) -> Result<ObjectId, StoreError> {
        self.check()?;
        let user = UserDocument {
            id: ObjectId::new(),
            username: username.to_string(),
            password: encrypted_password.to_string(),
        };
        let id = user.id;
        self.users.lock().await.push(user);
        Ok(id)
    }

    async fn find_user(&self, username: &str) -> Result<Option<UserDocument>, StoreError> {
        self.check()?;
        Ok(self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.username == username)
            .cloned())
    }

    async fn delete_user(&self, username: &str) -> Result<bool, StoreError> {
        self.check()?;
        let mut users = self.users.lock().await;
        match users.iter().position(|user| user.username == username) {
            Some(index) => {
                users.remove(index);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_video(
        &self,
        crd_id: &str,
        filename: &str,
        contents: Vec<u8>,
    ) -> Result<ObjectId, StoreError> {
        self.check()?;
        let video = VideoDocument {
            id: ObjectId::new(),
            crd_id: crd_id.to_string(),
            filename: filename.to_string(),
            timestamp: DateTime::now(),
            file_id: ObjectId::new(),
        };
        let id = video.id;
        self.videos.lock().await.push((video, contents));
        Ok(id)
    }

    async fn find_videos(&self, filter: &VideoFilter) -> Result<Vec<StoredVideo>, StoreError> {
        self.check()?;
        Ok(self
            .videos
            .lock()
            .await
            .iter()
            .filter(|(video, _)| filter.matches(video))
            .map(|(video, contents)| StoredVideo {
                id: video.id,
                crd_id: video.crd_id.clone(),
                filename: video.filename.clone(),
                contents: contents.clone(),
            })
            .collect())
    }
}
