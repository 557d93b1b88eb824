//! Backend events persisted as log documents.

use tracing::{debug, error, info, warn};

use crate::database::{LogOrigin, LogType, Store};

/// Emits `message` through tracing and stores it with origin BACKEND.
/// A storage failure is only reported, never returned.
pub async fn record(store: &dyn Store, log_type: LogType, message: impl AsRef<str>) {
    let message = message.as_ref();
    match log_type {
        LogType::Debug => debug!("{message}"),
        LogType::Info => info!("{message}"),
        LogType::Warning => warn!("{message}"),
        LogType::Error => error!("{message}"),
    }

    if let Err(e) = store.insert_log(LogOrigin::Backend, log_type, message).await {
        warn!("Log document not saved: {e}");
    }
}
