//! MongoDB backups made with the `mongodump`/`mongorestore` tools.
//!
//! Each backup is a directory named after its creation time
//! (`dd-mm-yy_HH-MM-SS`) under the configured backup path. Before a new dump
//! the oldest directories are removed so the new one fits both the overall
//! and the per-day limit.

use std::{
    ffi::OsString,
    path::{Path, PathBuf},
};

use chrono::{Local, NaiveDate, NaiveDateTime};
use tempfile::NamedTempFile;
use thiserror::Error;
use tokio::process::Command;
use tracing::{info, warn};

use crate::config::MongoConfig;
use crate::utils::{now_standard, STAMP_FORMAT};

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Backup not found: {0}")]
    NotFound(String),

    #[error("Backup folder error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Cannot run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with status {status}: {stderr}")]
    ToolFailed {
        program: String,
        status: i32,
        stderr: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyStatus {
    Satisfied,
    TooMany,
    TooManyToday,
}

/// Picks the backups to delete so one more fits within `count` overall and
/// `per_day` for `today`. Oldest first.
fn plan_retention(
    mut stamps: Vec<NaiveDateTime>,
    today: NaiveDate,
    count: usize,
    per_day: usize,
) -> Vec<NaiveDateTime> {
    stamps.sort();
    let mut doomed = Vec::new();

    while !stamps.is_empty() && stamps.len() >= count.max(1) {
        doomed.push(stamps.remove(0));
    }

    let mut todays: Vec<NaiveDateTime> = stamps
        .iter()
        .copied()
        .filter(|stamp| stamp.date() == today)
        .collect();
    while !todays.is_empty() && todays.len() >= per_day.max(1) {
        doomed.push(todays.remove(0));
    }
    doomed
}

fn tool_path(tools_dir: &Path, name: &str) -> PathBuf {
    if cfg!(windows) {
        tools_dir.join(format!("{name}.exe"))
    } else {
        tools_dir.join(name)
    }
}

pub struct BackupService {
    mongo: MongoConfig,
    tools_dir: PathBuf,
    backup_count: usize,
    backups_per_day: usize,
}

impl BackupService {
    pub fn new(
        mongo: MongoConfig,
        tools_dir: PathBuf,
        backup_count: usize,
        backups_per_day: usize,
    ) -> Self {
        Self {
            mongo,
            tools_dir,
            backup_count,
            backups_per_day,
        }
    }

    pub fn backup_path(&self) -> &Path {
        &self.mongo.backup_path
    }

    /// Existing backups keyed by their creation time. Entries whose name is
    /// not a timestamp are ignored.
    async fn existing(&self) -> Result<Vec<NaiveDateTime>, BackupError> {
        let mut stamps = Vec::new();
        let mut entries = match tokio::fs::read_dir(self.backup_path()).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(stamps),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_dir = entry.file_type().await?.is_dir();
            match NaiveDateTime::parse_from_str(&name, STAMP_FORMAT) {
                Ok(stamp) if is_dir => stamps.push(stamp),
                _ => warn!("Ignoring unexpected entry in backups: {name}"),
            }
        }
        Ok(stamps)
    }

    pub async fn check_policies(&self) -> Result<PolicyStatus, BackupError> {
        let stamps = self.existing().await?;
        let today = Local::now().date_naive();
        let todays = stamps.iter().filter(|s| s.date() == today).count();

        let status = if stamps.len() >= self.backup_count {
            PolicyStatus::TooMany
        } else if todays >= self.backups_per_day {
            PolicyStatus::TooManyToday
        } else {
            PolicyStatus::Satisfied
        };
        info!("Backup policies: {status:?} ({} total, {todays} today)", stamps.len());
        Ok(status)
    }

    /// Deletes the oldest backups until a new one fits. Returns how many were removed.
    pub async fn enforce_retention(&self) -> Result<usize, BackupError> {
        let doomed = plan_retention(
            self.existing().await?,
            Local::now().date_naive(),
            self.backup_count,
            self.backups_per_day,
        );
        for stamp in &doomed {
            let path = self
                .backup_path()
                .join(stamp.format(STAMP_FORMAT).to_string());
            tokio::fs::remove_dir_all(&path).await?;
            info!("Old backup deleted: {}", path.display());
        }
        Ok(doomed.len())
    }

    /// Writes the password to a private YAML file for the tools' `--config`
    /// option, keeping it off the command line. The file is removed on drop.
    async fn tool_config(&self) -> Result<NamedTempFile, BackupError> {
        let file = NamedTempFile::new()?;
        let password = serde_json::Value::String(self.mongo.password.clone());
        tokio::fs::write(file.path(), format!("password: {password}\n")).await?;
        Ok(file)
    }

    fn credentials(&self, config_file: &Path) -> Vec<OsString> {
        vec![
            "--username".into(),
            self.mongo.username.clone().into(),
            "--config".into(),
            config_file.as_os_str().to_owned(),
            "--authenticationDatabase".into(),
            "admin".into(),
            "--host".into(),
            self.mongo.bare_host().into(),
            "--port".into(),
            self.mongo.port.to_string().into(),
        ]
    }

    pub fn dump_command(&self, out_dir: &Path, config_file: &Path) -> (PathBuf, Vec<OsString>) {
        let mut args: Vec<OsString> = vec![
            "--db".into(),
            self.mongo.db.clone().into(),
            "--out".into(),
            out_dir.as_os_str().to_owned(),
        ];
        args.extend(self.credentials(config_file));
        (tool_path(&self.tools_dir, "mongodump"), args)
    }

    pub fn restore_command(&self, date: &str, config_file: &Path) -> (PathBuf, Vec<OsString>) {
        let mut args: Vec<OsString> = vec![
            "--db".into(),
            format!("visia_backup_{date}").into(),
            self.backup_path()
                .join(date)
                .join(&self.mongo.db)
                .into_os_string(),
        ];
        args.extend(self.credentials(config_file));
        (tool_path(&self.tools_dir, "mongorestore"), args)
    }

    /// Dumps the database into a new timestamped directory and returns it.
    pub async fn dump(&self) -> Result<PathBuf, BackupError> {
        tokio::fs::create_dir_all(self.backup_path()).await?;
        if self.check_policies().await? != PolicyStatus::Satisfied {
            self.enforce_retention().await?;
        }

        let out_dir = self.backup_path().join(now_standard());
        let config_file = self.tool_config().await?;
        let (program, args) = self.dump_command(&out_dir, config_file.path());
        run_tool(&program, &args).await?;
        info!("Backup created at {}", out_dir.display());
        Ok(out_dir)
    }

    /// Restores the backup taken at `date` into `visia_backup_<date>`.
    pub async fn restore(&self, date: &str) -> Result<(), BackupError> {
        if NaiveDateTime::parse_from_str(date, STAMP_FORMAT).is_err()
            || !self.backup_path().join(date).is_dir()
        {
            return Err(BackupError::NotFound(date.to_string()));
        }

        let config_file = self.tool_config().await?;
        let (program, args) = self.restore_command(date, config_file.path());
        run_tool(&program, &args).await?;
        info!("Backup {date} restored into visia_backup_{date}");
        Ok(())
    }
}

async fn run_tool(program: &Path, args: &[OsString]) -> Result<(), BackupError> {
    let name = program.display().to_string();
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|source| BackupError::Spawn {
            program: name.clone(),
            source,
        })?;

    if !output.status.success() {
        return Err(BackupError::ToolFailed {
            program: name,
            status: output.status.code().unwrap_or(-1),
            stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stamp(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, STAMP_FORMAT).expect("stamp")
    }

    fn service(root: &Path) -> BackupService {
        let mongo = MongoConfig {
            backup_path: root.join("backups"),
            ..MongoConfig::default()
        };
        BackupService::new(mongo, root.join("utils"), 5, 2)
    }

    #[test]
    fn retention_keeps_room_for_one_more() {
        let today = stamp("18-10-26_00-00-00").date();
        let stamps = vec![
            stamp("18-10-26_09-00-00"),
            stamp("14-10-26_10-00-00"),
            stamp("15-10-26_10-00-00"),
            stamp("16-10-26_10-00-00"),
            stamp("18-10-26_08-00-00"),
        ];

        let doomed = plan_retention(stamps, today, 5, 2);
        assert_eq!(
            doomed,
            vec![stamp("14-10-26_10-00-00"), stamp("18-10-26_08-00-00")]
        );
    }

    #[test]
    fn retention_is_noop_below_limits() {
        let today = stamp("18-10-26_00-00-00").date();
        let doomed = plan_retention(vec![stamp("17-10-26_10-00-00")], today, 5, 2);
        assert!(doomed.is_empty());
    }

    #[test]
    fn commands_carry_database_and_credentials() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backup = service(dir.path());

        let config_file = Path::new("/tmp/tools.yaml");
        let (program, args) = backup.dump_command(Path::new("/tmp/out"), config_file);
        assert!(program.starts_with(dir.path().join("utils")));
        let args: Vec<String> = args
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(&args[..4], &["--db", "visia_demo", "--out", "/tmp/out"]);
        assert!(args.windows(2).any(|w| w == ["--authenticationDatabase", "admin"]));
        assert!(args.windows(2).any(|w| w == ["--port", "27017"]));
        assert!(args.windows(2).any(|w| w == ["--config", "/tmp/tools.yaml"]));

        let (_, args) = backup.restore_command("18-10-26_09-00-00", config_file);
        assert_eq!(args[1], "visia_backup_18-10-26_09-00-00");
    }

    #[tokio::test]
    async fn password_goes_to_a_config_file_not_argv() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut backup = service(dir.path());
        backup.mongo.password = "s3\"cr:et".to_string();

        let config_file = backup.tool_config().await.expect("config");
        let contents = std::fs::read_to_string(config_file.path()).expect("read");
        assert_eq!(contents, "password: \"s3\\\"cr:et\"\n");

        let (_, args) = backup.dump_command(Path::new("/tmp/out"), config_file.path());
        assert!(!args.iter().any(|a| a == "--password"));
        assert!(!args
            .iter()
            .any(|a| a.to_string_lossy().contains("cr:et")));

        let path = config_file.path().to_path_buf();
        drop(config_file);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn policies_count_existing_directories() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backup = service(dir.path());
        assert_eq!(
            backup.check_policies().await.expect("check"),
            PolicyStatus::Satisfied
        );

        for day in 10..15 {
            std::fs::create_dir_all(backup.backup_path().join(format!("{day}-01-26_10-00-00")))
                .expect("mkdir");
        }
        assert_eq!(
            backup.check_policies().await.expect("check"),
            PolicyStatus::TooMany
        );

        assert_eq!(backup.enforce_retention().await.expect("retention"), 1);
        assert!(!backup.backup_path().join("10-01-26_10-00-00").exists());
        assert_eq!(
            backup.check_policies().await.expect("check"),
            PolicyStatus::Satisfied
        );
    }

    #[tokio::test]
    async fn unknown_dates_are_not_restored() {
        let dir = tempfile::tempdir().expect("tempdir");
        let backup = service(dir.path());
        assert!(matches!(
            backup.restore("01-01-20_00-00-00").await,
            Err(BackupError::NotFound(_))
        ));
        assert!(matches!(
            backup.restore("../etc").await,
            Err(BackupError::NotFound(_))
        ));
    }
}
