//! 変換前のイベントファイルのバックアップ。

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum BackupError {
    #[error("Failed to create backup directory {path:?}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to copy {from:?} to {to:?}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BackupError>;

/// バックアップファイル名を返す。
///
/// `now` は分単位で `events_backup_pre_utc_conversion_<YYYYMMDDHHMM>.json` に埋め込まれる。
pub fn backup_name(now: NaiveDateTime) -> String {
    format!(
        "events_backup_pre_utc_conversion_{}.json",
        now.format("%Y%m%d%H%M")
    )
}

/// `source` の内容を `backup_dir` にコピーし、作成したファイルのパスを返す。
///
/// `backup_dir` が存在しない場合は作成する。`source` は変更しない。
pub fn create_backup(
    source: impl AsRef<Path>,
    backup_dir: impl AsRef<Path>,
    now: NaiveDateTime,
) -> Result<PathBuf> {
    let source = source.as_ref();
    let backup_dir = backup_dir.as_ref();

    fs::create_dir_all(backup_dir).map_err(|source| BackupError::CreateDir {
        path: backup_dir.to_path_buf(),
        source,
    })?;

    let destination = backup_dir.join(backup_name(now));
    fs::copy(source, &destination).map_err(|e| BackupError::Copy {
        from: source.to_path_buf(),
        to: destination.clone(),
        source: e,
    })?;

    info!(path = ?destination, "Created backup");
    Ok(destination)
}
