//! イベント一覧のタイムスタンプ正規化。

use chrono_tz::Tz;
use tracing::{info, warn};

use crate::event_id::{EventId, prefix_for};
use crate::record::{DATE, DATETIME_OBJ, EVENT_ID, EventDocument, EventRecord, Field, TIME};
use crate::report::{FailureKind, RecordOutcome, Report, TimestampChange};
use crate::timestamp::{
    IsoDateTime, TimestampError, format_utc, localize, parse_date, parse_iso_datetime, parse_time,
};

type Result<T> = std::result::Result<T, TimestampError>;

/// 指定した地域タイムゾーンの現地時刻を UTC に正規化する。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Normalizer {
    /// 入力された現地時刻のタイムゾーン
    tz: Tz,
}

impl Normalizer {
    pub fn new(tz: Tz) -> Self {
        Self { tz }
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    /// ドキュメント内の全イベントを順に正規化する。
    ///
    /// レコード単位の失敗は集計に記録し、残りのレコードの処理を続ける。
    pub fn normalize(&self, document: &mut EventDocument) -> Report {
        let mut report = Report::default();

        for (index, record) in document.events.iter_mut().enumerate() {
            let outcome = self.normalize_record(record);
            let title = record.display_title();
            for failure in &outcome.failures {
                warn!(index, title, error = %failure, "Failed to normalize event");
            }
            report.record(index, title, outcome);
        }

        report
    }

    /// イベント 1 件を正規化する。
    ///
    /// 1. `datetime_obj` があり、タイムゾーンなしなら UTC に変換する
    /// 2. `datetime_obj` が無く `date` と `time` があれば、そこから UTC の `datetime_obj` を作る
    /// 3. `event_id` の接頭辞が UTC 時刻と一致しなければ差し替える
    ///
    /// 書き換えるのは `datetime_obj` と `event_id` の値のみ。失敗したキーは元の値のまま残る。
    pub fn normalize_record(&self, record: &mut EventRecord) -> RecordOutcome {
        let mut outcome = RecordOutcome::default();

        match self.resolve_datetime_obj(record) {
            Ok(Some((change, utc))) => {
                let to = utc.clone();
                let previous = record.set_datetime_obj(utc);
                let title = record.display_title();
                match change {
                    TimestampChange::Converted => info!(
                        title,
                        from = previous.as_ref().and_then(serde_json::Value::as_str).unwrap_or_default(),
                        to = %to,
                        "Converted datetime_obj to UTC"
                    ),
                    _ => info!(title, to = %to, "Derived datetime_obj from date/time"),
                }
                outcome.timestamp = change;
            }
            Ok(None) => {}
            Err(failure @ FailureKind::DateTime(_)) => {
                outcome.failures.push(failure);
                return outcome;
            }
            Err(failure) => outcome.failures.push(failure),
        }

        match refreshed_event_id(record) {
            Ok(Some(event_id)) => {
                let to = event_id.clone();
                let previous = record.set_event_id(event_id);
                info!(
                    title = record.display_title(),
                    from = previous.as_ref().and_then(serde_json::Value::as_str).unwrap_or_default(),
                    to = %to,
                    "Updated event_id"
                );
                outcome.id_refreshed = true;
            }
            Ok(None) => {}
            Err(e) => outcome.failures.push(FailureKind::EventId(e)),
        }

        outcome
    }

    /// 書き込むべき `datetime_obj` を求める。変更不要なら `None` を返す。
    fn resolve_datetime_obj(
        &self,
        record: &EventRecord,
    ) -> std::result::Result<Option<(TimestampChange, String)>, FailureKind> {
        match record.field(DATETIME_OBJ) {
            Field::Text(value) => self
                .convert_datetime_obj(value)
                .map(|utc| utc.map(|utc| (TimestampChange::Converted, utc)))
                .map_err(FailureKind::DatetimeObj),
            Field::Other(value) => Err(FailureKind::DatetimeObj(
                TimestampError::InvalidDateTime(value.to_string()),
            )),
            Field::Missing => match (record.field(DATE), record.field(TIME)) {
                (Field::Missing, _) | (_, Field::Missing) => Ok(None),
                (date, time) => self
                    .derive_datetime_obj(date, time)
                    .map(|utc| Some((TimestampChange::Derived, utc)))
                    .map_err(FailureKind::DateTime),
            },
        }
    }

    /// タイムゾーンなしの値のみ変換する。タイムゾーン付きの値は `None` を返す。
    fn convert_datetime_obj(&self, value: &str) -> Result<Option<String>> {
        match parse_iso_datetime(value)? {
            IsoDateTime::Aware(_) => Ok(None),
            IsoDateTime::Naive(naive) => Ok(Some(format_utc(localize(naive, self.tz)?))),
        }
    }

    fn derive_datetime_obj(&self, date: Field<'_>, time: Field<'_>) -> Result<String> {
        let date = parse_date(text(date, TimestampError::InvalidDate)?)?;
        let time = parse_time(text(time, TimestampError::InvalidTime)?)?;
        Ok(format_utc(localize(date.and_time(time), self.tz)?))
    }
}

/// 文字列以外の値は `invalid` のエラーにする。
fn text(field: Field<'_>, invalid: fn(String) -> TimestampError) -> Result<&str> {
    match field {
        Field::Text(value) => Ok(value),
        Field::Other(value) => Err(invalid(value.to_string())),
        Field::Missing => Err(invalid(String::new())),
    }
}

/// 接頭辞が `datetime_obj` の UTC 時刻と一致しない場合、新しい `event_id` を返す。
///
/// `event_id` が文字列でない、または形式に合わない場合は何もしない。
fn refreshed_event_id(record: &EventRecord) -> Result<Option<String>> {
    let Field::Text(event_id) = record.field(EVENT_ID) else {
        return Ok(None);
    };
    let Some(id) = EventId::parse(event_id) else {
        return Ok(None);
    };

    let datetime = match record.field(DATETIME_OBJ) {
        Field::Missing => return Ok(None),
        Field::Text(datetime) => datetime,
        Field::Other(value) => return Err(TimestampError::InvalidDateTime(value.to_string())),
    };
    let dt = match parse_iso_datetime(datetime)? {
        IsoDateTime::Aware(dt) => dt,
        IsoDateTime::Naive(_) => return Err(TimestampError::MissingOffset(datetime.to_string())),
    };

    let prefix = prefix_for(&dt);
    if prefix == id.prefix() {
        return Ok(None);
    }
    Ok(Some(id.with_prefix(&prefix)))
}
