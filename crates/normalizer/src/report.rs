//! 正規化処理の結果集計。

use std::fmt;

use crate::timestamp::TimestampError;

/// レコード 1 件の `datetime_obj` に対する変更内容。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TimestampChange {
    #[default]
    Unchanged,
    /// タイムゾーンなしの `datetime_obj` を UTC に変換した
    Converted,
    /// `date` / `time` から `datetime_obj` を生成した
    Derived,
}

/// 失敗した処理の種類。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    /// `datetime_obj` の解析・変換
    DatetimeObj(TimestampError),
    /// `date` / `time` からの生成
    DateTime(TimestampError),
    /// `event_id` の更新
    EventId(TimestampError),
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DatetimeObj(e) => write!(f, "datetime_obj: {e}"),
            Self::DateTime(e) => write!(f, "date/time: {e}"),
            Self::EventId(e) => write!(f, "event_id: {e}"),
        }
    }
}

/// レコード 1 件の処理結果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordOutcome {
    pub timestamp: TimestampChange,
    pub id_refreshed: bool,
    pub failures: Vec<FailureKind>,
}

/// 失敗したレコードの情報。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// `events` 内の位置
    pub index: usize,
    pub title: String,
    pub kind: FailureKind,
}

/// 全レコードの処理結果。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Report {
    pub converted: usize,
    pub derived: usize,
    pub ids_updated: usize,
    pub failures: Vec<RecordFailure>,
}

impl Report {
    /// レコードの処理結果を集計に加える。
    pub fn record(&mut self, index: usize, title: &str, outcome: RecordOutcome) {
        match outcome.timestamp {
            TimestampChange::Unchanged => {}
            TimestampChange::Converted => self.converted += 1,
            TimestampChange::Derived => self.derived += 1,
        }
        if outcome.id_refreshed {
            self.ids_updated += 1;
        }
        self.failures
            .extend(outcome.failures.into_iter().map(|kind| RecordFailure {
                index,
                title: title.to_string(),
                kind,
            }));
    }

    /// ファイルへの書き込みが必要かどうか。
    pub fn has_changes(&self) -> bool {
        self.converted > 0 || self.derived > 0 || self.ids_updated > 0
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} datetime_obj converted, {} datetime_obj derived from date/time, {} event_id updated",
            self.converted, self.derived, self.ids_updated
        )?;
        if !self.failures.is_empty() {
            write!(f, ", {} error(s)", self.failures.len())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_has_no_changes() {
        let report = Report::default();
        assert!(!report.has_changes());
    }

    #[test]
    fn record_counts_each_kind() {
        let mut report = Report::default();
        report.record(
            0,
            "Raid",
            RecordOutcome {
                timestamp: TimestampChange::Derived,
                id_refreshed: true,
                failures: vec![],
            },
        );
        report.record(
            1,
            "Meeting",
            RecordOutcome {
                timestamp: TimestampChange::Converted,
                ..Default::default()
            },
        );
        report.record(
            2,
            "Broken",
            RecordOutcome {
                failures: vec![FailureKind::DateTime(TimestampError::InvalidDate(
                    "13/2025".to_string(),
                ))],
                ..Default::default()
            },
        );

        assert_eq!(report.converted, 1);
        assert_eq!(report.derived, 1);
        assert_eq!(report.ids_updated, 1);
        assert_eq!(report.failures.len(), 1);
        assert_eq!(report.failures[0].index, 2);
        assert_eq!(report.failures[0].title, "Broken");
        assert!(report.has_changes());
    }

    #[test]
    fn failures_alone_are_not_changes() {
        let mut report = Report::default();
        report.record(
            0,
            "Broken",
            RecordOutcome {
                failures: vec![FailureKind::DatetimeObj(TimestampError::InvalidDateTime(
                    "soon".to_string(),
                ))],
                ..Default::default()
            },
        );
        assert!(!report.has_changes());
        assert_eq!(
            report.to_string(),
            "0 datetime_obj converted, 0 datetime_obj derived from date/time, 0 event_id updated, 1 error(s)"
        );
    }
}
