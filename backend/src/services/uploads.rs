//! The folder digiCamControl transfers recordings into.
//!
//! Handlers take a snapshot of the file names before a recording stops and
//! then poll until a name outside that snapshot shows up.

use std::{
    collections::HashSet,
    path::{Path, PathBuf},
    time::{Duration, SystemTime},
};

use thiserror::Error;
use tokio::{fs, sync::Mutex, time::Instant};
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Uploads folder error: {0}")]
    Io(#[from] std::io::Error),

    #[error("The uploads folder is empty")]
    Empty,

    #[error("Invalid file name: {0:?}")]
    InvalidName(String),
}

/// Reduces `name` to a plain file name made of ASCII letters, digits, `.`,
/// `-` and `_`. Whitespace becomes `_`.
pub fn secure_filename(name: &str) -> Result<String, UploadError> {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            c if c.is_whitespace() => Some('_'),
            _ => None,
        })
        .collect();
    let cleaned = cleaned.trim_start_matches(['.', '_']).to_string();

    if cleaned.is_empty() {
        return Err(UploadError::InvalidName(name.to_string()));
    }
    Ok(cleaned)
}

pub struct UploadFolder {
    path: PathBuf,
    snapshot: Mutex<HashSet<String>>,
}

impl UploadFolder {
    /// Creates the folder when missing and takes the first snapshot.
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self, UploadError> {
        let path = path.into();
        fs::create_dir_all(&path).await?;
        let folder = Self {
            path,
            snapshot: Mutex::new(HashSet::new()),
        };
        folder.refresh_snapshot().await?;
        Ok(folder)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Names of the regular files currently in the folder.
    pub async fn list(&self) -> Result<HashSet<String>, UploadError> {
        let mut names = HashSet::new();
        let mut entries = fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                names.insert(entry.file_name().to_string_lossy().into_owned());
            }
        }
        Ok(names)
    }

    pub async fn refresh_snapshot(&self) -> Result<(), UploadError> {
        let current = self.list().await?;
        *self.snapshot.lock().await = current;
        Ok(())
    }

    pub async fn snapshot(&self) -> HashSet<String> {
        self.snapshot.lock().await.clone()
    }

    /// Polls every `poll` until a file outside `previous` appears. Returns
    /// `false` once `timeout` elapses.
    pub async fn wait_for_new_file(
        &self,
        previous: &HashSet<String>,
        timeout: Duration,
        poll: Duration,
    ) -> Result<bool, UploadError> {
        let started = Instant::now();
        loop {
            let current = self.list().await?;
            let new_files: Vec<&String> = current.difference(previous).collect();
            if !new_files.is_empty() {
                info!("New files detected: {new_files:?}");
                return Ok(true);
            }

            let elapsed = started.elapsed();
            if elapsed >= timeout {
                info!("No new files after {}s", timeout.as_secs());
                return Ok(false);
            }
            tokio::time::sleep(poll.min(timeout - elapsed)).await;
        }
    }

    /// The most recently modified file, if any.
    pub async fn newest_file(&self) -> Result<Option<PathBuf>, UploadError> {
        let mut newest: Option<(SystemTime, PathBuf)> = None;
        let mut entries = fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let modified = metadata.modified()?;
            if newest.as_ref().map_or(true, |(time, _)| modified >= *time) {
                newest = Some((modified, entry.path()));
            }
        }
        Ok(newest.map(|(_, path)| path))
    }

    /// Removes every file and refreshes the snapshot. Returns how many were removed.
    pub async fn delete_all(&self) -> Result<usize, UploadError> {
        let mut removed = 0;
        for name in self.list().await? {
            let path = self.path.join(&name);
            match fs::remove_file(&path).await {
                Ok(()) => removed += 1,
                Err(e) => warn!("Cannot delete {}: {e}", path.display()),
            }
        }
        self.refresh_snapshot().await?;
        debug!("Deleted {removed} file(s) from {}", self.path.display());
        Ok(removed)
    }

    pub async fn write_file(&self, name: &str, contents: &[u8]) -> Result<PathBuf, UploadError> {
        let path = self.path.join(secure_filename(name)?);
        fs::write(&path, contents).await?;
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(
            secure_filename("../../etc/passwd").expect("name"),
            "passwd"
        );
        assert_eq!(
            secure_filename("my video (1).mkv").expect("name"),
            "my_video_1.mkv"
        );
        assert_eq!(
            secure_filename("C:\\rec\\001--P7--x.mp4").expect("name"),
            "001--P7--x.mp4"
        );
        assert!(matches!(
            secure_filename("../.."),
            Err(UploadError::InvalidName(_))
        ));
    }

    #[tokio::test]
    async fn new_files_are_detected_against_the_snapshot() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folder = UploadFolder::open(dir.path()).await.expect("open");
        folder.write_file("old.mp4", b"old").await.expect("write");
        folder.refresh_snapshot().await.expect("snapshot");

        let previous = folder.snapshot().await;
        assert!(!folder
            .wait_for_new_file(&previous, Duration::from_millis(30), Duration::from_millis(10))
            .await
            .expect("wait"));

        folder.write_file("new.mp4", b"new").await.expect("write");
        assert!(folder
            .wait_for_new_file(&previous, Duration::from_millis(30), Duration::from_millis(10))
            .await
            .expect("wait"));
    }

    #[tokio::test]
    async fn newest_file_and_delete_all() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folder = UploadFolder::open(dir.path().join("uploads"))
            .await
            .expect("open");
        assert!(folder.newest_file().await.expect("newest").is_none());

        folder.write_file("a.mp4", b"a").await.expect("write");
        tokio::time::sleep(Duration::from_millis(20)).await;
        let written = folder.write_file("b.mp4", b"b").await.expect("write");
        assert_eq!(folder.newest_file().await.expect("newest"), Some(written));

        assert_eq!(folder.delete_all().await.expect("delete"), 2);
        assert!(folder.list().await.expect("list").is_empty());
        assert!(folder.snapshot().await.is_empty());
    }
}
