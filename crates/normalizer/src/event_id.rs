//! `<YYYYMMDDHHMM>-<suffix>` 形式のイベント ID。

use std::fmt;

use chrono::{DateTime, TimeZone, Utc};

const PREFIX_LEN: usize = 12;

/// 接頭辞に UTC 時刻を持つイベント ID。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventId<'a> {
    prefix: &'a str,
    suffix: &'a str,
}

impl<'a> EventId<'a> {
    /// 最初の `-` で分割し、接頭辞が 12 桁の数字であれば `EventId` を返す。
    ///
    /// 形式に合わない ID はエラーではなく `None` として扱う。
    pub fn parse(value: &'a str) -> Option<Self> {
        let (prefix, suffix) = value.split_once('-')?;
        if prefix.len() != PREFIX_LEN || !prefix.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        Some(Self { prefix, suffix })
    }

    pub fn prefix(&self) -> &'a str {
        self.prefix
    }

    pub fn suffix(&self) -> &'a str {
        self.suffix
    }

    /// 接頭辞を差し替えた ID を返す。接尾辞はそのまま保持する。
    pub fn with_prefix(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.suffix)
    }
}

impl fmt::Display for EventId<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.prefix, self.suffix)
    }
}

/// 日時を UTC に変換し、`YYYYMMDDHHMM` 形式の接頭辞を返す。
pub fn prefix_for<Tz: TimeZone>(dt: &DateTime<Tz>) -> String {
    dt.with_timezone(&Utc).format("%Y%m%d%H%M").to_string()
}
