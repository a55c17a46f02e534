//! イベント JSON のタイムスタンプを現地時刻から UTC に正規化するライブラリ。
//!
//! 固定の地域タイムゾーン（夏時間を含む）で入力された日時を UTC に変換し、
//! UTC 時刻を接頭辞に持つイベント ID を更新する。書き込み前にはバックアップを作成する。

mod backup;
mod confirm;
mod event_id;
mod normalize;
mod record;
mod report;
mod run;
mod store;
mod timestamp;

pub use backup::{BackupError, backup_name, create_backup};
pub use confirm::{Always, Confirm, PromptConfirm};
pub use event_id::{EventId, prefix_for};
pub use normalize::Normalizer;
pub use record::{EventDocument, EventRecord, UNNAMED_EVENT};
pub use report::{FailureKind, RecordFailure, RecordOutcome, Report, TimestampChange};
pub use run::{RunError, RunOptions, RunSummary, run};
pub use store::{EventStore, StoreError};
pub use timestamp::{
    IsoDateTime, TimestampError, format_utc, localize, parse_date, parse_iso_datetime, parse_time,
};
