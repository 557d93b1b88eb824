//! MongoDB implementation of `Store`.

use std::time::Duration;

use async_trait::async_trait;
use futures::{io::Cursor, TryStreamExt};
use mongodb::{
    bson::{doc, oid::ObjectId, Bson, DateTime},
    options::{ClientOptions, Credential},
    Client, Collection, Database,
};
use tracing::{info, warn};

use super::models::{LogDocument, LogOrigin, LogType, StoredVideo, UserDocument, VideoDocument};
use super::queries::{LogFilter, VideoFilter};
use super::{Store, StoreError};
use crate::config::MongoConfig;

const LOG_COLLECTION: &str = "log_document";
const USER_COLLECTION: &str = "user_document";
const VIDEO_COLLECTION: &str = "video_document";

pub struct MongoStore {
    client: Client,
    db: Database,
}

/// Driver options for `config`. Users authenticate against `admin`.
async fn client_options(config: &MongoConfig) -> Result<ClientOptions, StoreError> {
    let mut options = ClientOptions::parse(config.uri()).await?;
    options.app_name = Some("visia-backend".to_string());
    options.server_selection_timeout = Some(Duration::from_secs(2));
    if !config.username.is_empty() {
        options.credential = Some(
            Credential::builder()
                .username(config.username.clone())
                .password(config.password.clone())
                .source("admin".to_string())
                .build(),
        );
    }
    Ok(options)
}

impl MongoStore {
    /// Builds a client for `config`. The driver connects lazily, so this
    /// succeeds even when the server is down.
    pub async fn connect(config: &MongoConfig) -> Result<Self, StoreError> {
        let options = client_options(config).await?;
        let client = Client::with_options(options)?;
        let db = client.database(&config.db);
        info!(
            "MongoDB: mongodb://{}:{} - database {}",
            config.bare_host(),
            config.port,
            config.db
        );
        Ok(Self { client, db })
    }

    fn logs(&self) -> Collection<LogDocument> {
        self.db.collection(LOG_COLLECTION)
    }

    fn users(&self) -> Collection<UserDocument> {
        self.db.collection(USER_COLLECTION)
    }

    fn videos(&self) -> Collection<VideoDocument> {
        self.db.collection(VIDEO_COLLECTION)
    }
}

#[async_trait]
impl Store for MongoStore {
    async fn ping(&self) -> Result<(), StoreError> {
        let reply = self
            .client
            .database("admin")
            .run_command(doc! { "ping": 1 }, None)
            .await?;

        match reply.get("ok") {
            Some(Bson::Double(ok)) if *ok == 1.0 => Ok(()),
            Some(Bson::Int32(1)) | Some(Bson::Int64(1)) => Ok(()),
            other => Err(StoreError::Unavailable(format!(
                "unexpected ping reply: {other:?}"
            ))),
        }
    }

    async fn insert_log(
        &self,
        origin: LogOrigin,
        log_type: LogType,
        message: &str,
    ) -> Result<ObjectId, StoreError> {
        let log = LogDocument::new(origin, log_type, message);
        self.logs().insert_one(&log, None).await?;
        Ok(log.id)
    }

    async fn find_logs(&self, filter: &LogFilter) -> Result<Vec<LogDocument>, StoreError> {
        let cursor = self.logs().find(filter.to_document(), None).await?;
        Ok(cursor.try_collect().await?)
    }

    async fn insert_user(
        &self,
        username: &str,
        encrypted_password: &str,
    ) -> Result<ObjectId, StoreError> {
        let user = UserDocument {
            id: ObjectId::new(),
            username: username.to_string(),
            password: encrypted_password.to_string(),
        };
        self.users().insert_one(&user, None).await?;
        Ok(user.id)
    }

    async fn find_user(&self, username: &str) -> Result<Option<UserDocument>, StoreError> {
        Ok(self
            .users()
            .find_one(doc! { "username": username }, None)
            .await?)
    }

    async fn delete_user(&self, username: &str) -> Result<bool, StoreError> {
        let result = self
            .users()
            .delete_one(doc! { "username": username }, None)
            .await?;
        Ok(result.deleted_count > 0)
    }

    async fn insert_video(
        &self,
        crd_id: &str,
        filename: &str,
        contents: Vec<u8>,
    ) -> Result<ObjectId, StoreError> {
        let bucket = self.db.gridfs_bucket(None);
        let file_id = bucket
            .upload_from_futures_0_3_reader(filename, Cursor::new(contents), None)
            .await?;

        let video = VideoDocument {
            id: ObjectId::new(),
            crd_id: crd_id.to_string(),
            filename: filename.to_string(),
            timestamp: DateTime::now(),
            file_id,
        };
        if let Err(e) = self.videos().insert_one(&video, None).await {
            if let Err(cleanup) = bucket.delete(Bson::ObjectId(file_id)).await {
                warn!("GridFS file {file_id} left behind: {cleanup}");
            }
            return Err(e.into());
        }
        Ok(video.id)
    }

    async fn find_videos(&self, filter: &VideoFilter) -> Result<Vec<StoredVideo>, StoreError> {
        let documents: Vec<VideoDocument> = self
            .videos()
            .find(filter.to_document(), None)
            .await?
            .try_collect()
            .await?;

        let bucket = self.db.gridfs_bucket(None);
        let mut videos = Vec::with_capacity(documents.len());
        for video in documents {
            let mut buffer = Cursor::new(Vec::new());
            bucket
                .download_to_futures_0_3_writer(Bson::ObjectId(video.file_id), &mut buffer)
                .await?;
            videos.push(StoredVideo {
                id: video.id,
                crd_id: video.crd_id,
                filename: video.filename,
                contents: buffer.into_inner(),
            });
        }
        Ok(videos)
    }
}
