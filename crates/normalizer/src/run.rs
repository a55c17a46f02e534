//! 読み込み、バックアップ、正規化、書き込みの一連の処理。

use std::path::PathBuf;

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{error, info, warn};

use crate::backup::create_backup;
use crate::confirm::Confirm;
use crate::normalize::Normalizer;
use crate::report::Report;
use crate::store::{EventStore, StoreError};

#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Aborted: backup failed and continuing without a backup was declined")]
    Aborted,
}

/// 1 回の実行に必要な設定。
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub events_file: PathBuf,
    pub backup_dir: PathBuf,
    pub normalizer: Normalizer,
    /// バックアップファイル名に使う実行時刻
    pub started_at: NaiveDateTime,
}

/// 実行結果。
#[derive(Debug)]
pub struct RunSummary {
    pub report: Report,
    /// 作成したバックアップ（失敗して続行した場合は `None`）
    pub backup: Option<PathBuf>,
    /// ファイルを書き換えたかどうか
    pub written: bool,
}

/// イベントファイルを UTC に正規化する。
///
/// バックアップに失敗した場合は `confirm` に続行を問い合わせ、拒否されたら
/// 何も変更せずに [`RunError::Aborted`] を返す。変更が無ければファイルは書き込まない。
pub fn run(options: &RunOptions, confirm: &mut impl Confirm) -> Result<RunSummary, RunError> {
    let mut store = EventStore::load(&options.events_file)?;
    info!(
        path = ?store.path(),
        events = store.document().events.len(),
        timezone = %options.normalizer.timezone(),
        "Loaded events"
    );

    let backup = match create_backup(&options.events_file, &options.backup_dir, options.started_at)
    {
        Ok(path) => Some(path),
        Err(e) => {
            error!(error = %e, "Failed to create backup");
            if !confirm.confirm("Backup failed. Continue without a backup?") {
                warn!("Conversion aborted");
                return Err(RunError::Aborted);
            }
            warn!("Continuing without a backup");
            None
        }
    };

    let report = options.normalizer.normalize(store.document_mut());

    let written = if report.has_changes() {
        store.save()?;
        info!(
            path = ?store.path(),
            converted = report.converted,
            derived = report.derived,
            ids_updated = report.ids_updated,
            errors = report.failures.len(),
            "Saved events"
        );
        true
    } else {
        info!(errors = report.failures.len(), "No changes");
        false
    };

    Ok(RunSummary {
        report,
        backup,
        written,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::Always;
    use chrono::NaiveDate;
    use chrono_tz::Europe::Berlin;
    use std::fs;
    use tempfile::TempDir;

    fn options(dir: &TempDir) -> RunOptions {
        RunOptions {
            events_file: dir.path().join("events.json"),
            backup_dir: dir.path().join("backups"),
            normalizer: Normalizer::new(Berlin),
            started_at: NaiveDate::from_ymd_opt(2025, 7, 15)
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        }
    }

    #[test]
    fn unchanged_file_is_not_rewritten() {
        let dir = TempDir::new().unwrap();
        let options = options(&dir);
        let json = r#"{"events":[{"datetime_obj":"2025-07-15T18:00:00+00:00"}]}"#;
        fs::write(&options.events_file, json).unwrap();

        let summary = run(&options, &mut Always(false)).unwrap();

        assert!(!summary.written);
        assert!(summary.backup.is_some());
        assert_eq!(fs::read_to_string(&options.events_file).unwrap(), json);
    }

    #[test]
    fn declined_confirmation_aborts_before_mutation() {
        let dir = TempDir::new().unwrap();
        let mut options = options(&dir);
        let json = r#"{"events":[{"date":"15.07.2025","time":"20:00"}]}"#;
        fs::write(&options.events_file, json).unwrap();
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "").unwrap();
        options.backup_dir = blocker;

        let mut prompts = Vec::new();
        let result = run(&options, &mut |prompt: &str| {
            prompts.push(prompt.to_string());
            false
        });

        assert!(matches!(result, Err(RunError::Aborted)));
        assert_eq!(prompts.len(), 1);
        assert_eq!(fs::read_to_string(&options.events_file).unwrap(), json);
    }

    #[test]
    fn accepted_confirmation_continues_without_backup() {
        let dir = TempDir::new().unwrap();
        let mut options = options(&dir);
        fs::write(
            &options.events_file,
            r#"{"events":[{"date":"15.07.2025","time":"20:00"}]}"#,
        )
        .unwrap();
        let blocker = dir.path().join("blocked");
        fs::write(&blocker, "").unwrap();
        options.backup_dir = blocker;

        let summary = run(&options, &mut Always(true)).unwrap();

        assert!(summary.backup.is_none());
        assert!(summary.written);
        assert_eq!(summary.report.derived, 1);
    }

    #[test]
    fn missing_events_file_is_fatal() {
        let dir = TempDir::new().unwrap();
        let options = options(&dir);

        let result = run(&options, &mut Always(true));
        assert!(matches!(
            result,
            Err(RunError::Store(StoreError::Read { .. }))
        ));
        assert!(!options.backup_dir.exists());
    }
}
