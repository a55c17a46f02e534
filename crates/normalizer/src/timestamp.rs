//! 日付・時刻文字列の解析と、地域タイムゾーンから UTC への変換。

use std::str::FromStr;

use chrono::{
    DateTime, FixedOffset, MappedLocalTime, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat,
    TimeZone as _, Utc,
};
use chrono_tz::Tz;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TimestampError {
    #[error("Invalid ISO-8601 date-time: {0:?}")]
    InvalidDateTime(String),

    #[error("Invalid date {0:?} (expected DD.MM.YYYY or DDMMYYYY)")]
    InvalidDate(String),

    #[error("Invalid time {0:?} (expected HH:MM or HHMM)")]
    InvalidTime(String),

    #[error("{datetime} does not exist in {tz} (skipped by a daylight saving transition)")]
    NonexistentLocalTime { datetime: NaiveDateTime, tz: Tz },

    #[error("Date-time {0:?} has no UTC offset")]
    MissingOffset(String),
}

pub type Result<T> = std::result::Result<T, TimestampError>;

/// ISO-8601 文字列の解析結果。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsoDateTime {
    /// タイムゾーン情報なし
    Naive(NaiveDateTime),
    /// オフセット付き
    Aware(DateTime<FixedOffset>),
}

const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M%z",
];

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// ISO-8601 形式の日時を解析する。
///
/// 日付と時刻の区切りは `T` と空白のどちらでもよい。末尾の `Z`、`+HH:MM`、`+HHMM` は
/// オフセットとして扱う。日付のみの場合は 0 時とみなす。
pub fn parse_iso_datetime(value: &str) -> Result<IsoDateTime> {
    let invalid = || TimestampError::InvalidDateTime(value.to_string());

    let mut text = value.trim().to_string();
    if text.as_bytes().get(10) == Some(&b' ') {
        text.replace_range(10..11, "T");
    }
    if text.ends_with(['Z', 'z']) {
        text.pop();
        text.push_str("+00:00");
    }

    for format in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(&text, format) {
            return Ok(IsoDateTime::Aware(dt));
        }
    }
    for format in NAIVE_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(&text, format) {
            return Ok(IsoDateTime::Naive(dt));
        }
    }
    NaiveDate::parse_from_str(&text, "%Y-%m-%d")
        .map(|date| IsoDateTime::Naive(date.and_time(NaiveTime::MIN)))
        .map_err(|_| invalid())
}

/// `D.M.YYYY` または `DDMMYYYY` 形式の日付を解析する。
///
/// 存在しない日付（13 月、2 月 31 日など）はエラーになる。
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    let invalid = || TimestampError::InvalidDate(value.to_string());
    let value = value.trim();

    let (day, month, year) = if value.contains('.') {
        let fields: Vec<&str> = value.split('.').collect();
        let [day, month, year] = fields.as_slice() else {
            return Err(invalid());
        };
        (number(day), number(month), number(year))
    } else if value.len() == 8 && is_digits(value) {
        (number(&value[..2]), number(&value[2..4]), number(&value[4..]))
    } else {
        return Err(invalid());
    };

    match (day, month, year) {
        (Some(day), Some(month), Some(year)) => {
            NaiveDate::from_ymd_opt(year, month, day).ok_or_else(invalid)
        }
        _ => Err(invalid()),
    }
}

/// `H:MM` または `HHMM` 形式の時刻を解析する。
pub fn parse_time(value: &str) -> Result<NaiveTime> {
    let invalid = || TimestampError::InvalidTime(value.to_string());
    let value = value.trim();

    let (hour, minute) = if value.contains(':') {
        let fields: Vec<&str> = value.split(':').collect();
        let [hour, minute] = fields.as_slice() else {
            return Err(invalid());
        };
        (number(hour), number(minute))
    } else if value.len() == 4 && is_digits(value) {
        (number(&value[..2]), number(&value[2..]))
    } else {
        return Err(invalid());
    };

    match (hour, minute) {
        (Some(hour), Some(minute)) => NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid),
        _ => Err(invalid()),
    }
}

/// ASCII 数字のみからなる文字列を数値に変換する。
fn number<T: FromStr>(field: &str) -> Option<T> {
    if !is_digits(field) {
        return None;
    }
    field.parse().ok()
}

fn is_digits(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}

/// 現地時刻を `tz` のルール（夏時間を含む）で解釈し、UTC に変換する。
///
/// 夏時間終了で重複する時刻は早い方（夏時間側）を採用する。
/// 夏時間開始で存在しない時刻はエラーになる。
pub fn localize(naive: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
    match tz.from_local_datetime(&naive) {
        MappedLocalTime::Single(dt) => Ok(dt.with_timezone(&Utc)),
        MappedLocalTime::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        MappedLocalTime::None => Err(TimestampError::NonexistentLocalTime {
            datetime: naive,
            tz,
        }),
    }
}

/// UTC 日時を `2025-07-15T18:00:00+00:00` 形式で出力する。
pub fn format_utc(dt: DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}
