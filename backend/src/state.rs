//! Application state shared by every handler.

use std::sync::Arc;

use adapters::{CameraAdapter, VideoTools};
use tokio::sync::RwLock;

use crate::api::render::RecordSession;
use crate::auth::AuthService;
use crate::config::Config;
use crate::database::Store;
use crate::errors::AppError;
use crate::security::Encryptor;
use crate::services::{backup::BackupService, uploads::UploadFolder};

pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub encryptor: Arc<Encryptor>,
    pub auth: AuthService,
    pub camera: Arc<dyn CameraAdapter>,
    pub media: Arc<dyn VideoTools>,
    pub uploads: UploadFolder,
    pub backup: BackupService,
    pub record_session: RwLock<RecordSession>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wires the services together. `key` is the Fernet key; it also signs JWTs.
    pub async fn new(
        config: Config,
        store: Arc<dyn Store>,
        camera: Arc<dyn CameraAdapter>,
        media: Arc<dyn VideoTools>,
        key: &str,
    ) -> Result<SharedState, AppError> {
        let encryptor = Arc::new(Encryptor::new(key)?);
        let auth = AuthService::new(
            store.clone(),
            encryptor.clone(),
            key.as_bytes(),
            config.backend.access_token_ttl(),
            config.backend.refresh_token_ttl(),
        );
        let uploads = UploadFolder::open(&config.uploads_dir).await?;
        let backup = BackupService::new(
            config.mongo.clone(),
            config.backend.tools_dir.clone(),
            config.backend.backup_count,
            config.backend.backups_per_day,
        );

        Ok(Arc::new(Self {
            config,
            store,
            encryptor,
            auth,
            camera,
            media,
            uploads,
            backup,
            record_session: RwLock::new(RecordSession::default()),
        }))
    }
}
