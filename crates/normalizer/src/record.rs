//! イベント JSON のデータモデル。
//!
//! 読み込んだ JSON はキーの順序・`null`・未知のキーを含めてそのまま保持し、
//! 正規化で書き換えるのは `datetime_obj` と `event_id` の値だけにする。

use serde::de::{self, Deserializer};
use serde::ser::{SerializeMap as _, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// `title` が無いイベントのログ表示に使う名前。
pub const UNNAMED_EVENT: &str = "Unnamed Event";

const EVENTS: &str = "events";
pub(crate) const TITLE: &str = "title";
pub(crate) const DATETIME_OBJ: &str = "datetime_obj";
pub(crate) const DATE: &str = "date";
pub(crate) const TIME: &str = "time";
pub(crate) const EVENT_ID: &str = "event_id";

/// イベント一覧を持つ JSON ドキュメント。
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventDocument {
    /// イベント一覧（順序は保持される）
    pub events: Vec<EventRecord>,
    /// `events` 以外のトップレベルのキー
    pub extra: Map<String, Value>,
    /// 元のドキュメントで `events` より前にあったキーの数
    events_position: usize,
}

impl<'de> Deserialize<'de> for EventDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let root = Map::<String, Value>::deserialize(deserializer)?;

        let mut events = None;
        let mut extra = Map::new();
        let mut events_position = 0;
        for (key, value) in root {
            if key == EVENTS {
                events_position = extra.len();
                events = Some(value);
            } else {
                extra.insert(key, value);
            }
        }

        let events = events.ok_or_else(|| de::Error::missing_field(EVENTS))?;
        let events = Vec::<EventRecord>::deserialize(events).map_err(de::Error::custom)?;

        Ok(Self {
            events,
            extra,
            events_position,
        })
    }
}

impl Serialize for EventDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let position = self.events_position.min(self.extra.len());
        let mut map = serializer.serialize_map(Some(self.extra.len() + 1))?;
        for (key, value) in self.extra.iter().take(position) {
            map.serialize_entry(key, value)?;
        }
        map.serialize_entry(EVENTS, &self.events)?;
        for (key, value) in self.extra.iter().skip(position) {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

/// 1 件のイベント。
///
/// 主なキー:
/// * `title` - 表示名
/// * `datetime_obj` - ISO-8601 の日時（タイムゾーン付き / なし）
/// * `date` - `DD.MM.YYYY` または `DDMMYYYY`
/// * `time` - `HH:MM` または `HHMM`
/// * `event_id` - `<YYYYMMDDHHMM>-<suffix>` 形式の ID
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct EventRecord {
    fields: Map<String, Value>,
}

/// レコード内の 1 つのキーの状態。
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Field<'a> {
    /// キーが無い、`null`、または空文字列
    Missing,
    Text(&'a str),
    /// 文字列以外の値
    Other(&'a Value),
}

impl EventRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn title(&self) -> Option<&str> {
        self.text(TITLE)
    }

    pub fn datetime_obj(&self) -> Option<&str> {
        self.text(DATETIME_OBJ)
    }

    pub fn date(&self) -> Option<&str> {
        self.text(DATE)
    }

    pub fn time(&self) -> Option<&str> {
        self.text(TIME)
    }

    pub fn event_id(&self) -> Option<&str> {
        self.text(EVENT_ID)
    }

    pub fn display_title(&self) -> &str {
        self.title().unwrap_or(UNNAMED_EVENT)
    }

    /// `datetime_obj` を設定し、以前の値を返す。新しいキーは末尾に追加される。
    pub fn set_datetime_obj(&mut self, value: String) -> Option<Value> {
        self.fields.insert(DATETIME_OBJ.to_string(), Value::String(value))
    }

    /// `event_id` を設定し、以前の値を返す。
    pub fn set_event_id(&mut self, value: String) -> Option<Value> {
        self.fields.insert(EVENT_ID.to_string(), Value::String(value))
    }

    pub(crate) fn field(&self, key: &str) -> Field<'_> {
        match self.fields.get(key) {
            None | Some(Value::Null) => Field::Missing,
            Some(Value::String(s)) if s.is_empty() => Field::Missing,
            Some(Value::String(s)) => Field::Text(s),
            Some(other) => Field::Other(other),
        }
    }

    fn text(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(Value::as_str)
    }
}

impl From<Map<String, Value>> for EventRecord {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_keys_survive_round_trip() {
        let json = r#"{"events":[{"title":"Raid","location":"Ulduar","date":"15.07.2025","time":"20:00"}],"version":2}"#;
        let doc: EventDocument = serde_json::from_str(json).unwrap();

        assert_eq!(doc.events.len(), 1);
        assert_eq!(doc.events[0].get("location").unwrap(), "Ulduar");
        assert_eq!(doc.extra["version"], 2);

        assert_eq!(serde_json::to_string(&doc).unwrap(), json);
    }

    #[test]
    fn key_order_and_nulls_are_preserved() {
        let json = r#"{"guild":"x","events":[{"event_id":"legacy","time":"20:00","date":null,"title":null},{"title":"K","datetime_obj":null}],"owner":"y"}"#;
        let doc: EventDocument = serde_json::from_str(json).unwrap();

        assert_eq!(serde_json::to_string(&doc).unwrap(), json);
    }

    #[test]
    fn new_datetime_obj_is_appended() {
        let mut record: EventRecord =
            serde_json::from_str(r#"{"time":"20:00","date":"15.07.2025","title":"Raid"}"#).unwrap();
        let previous = record.set_datetime_obj("2025-07-15T18:00:00+00:00".to_string());

        assert_eq!(previous, None);
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"time":"20:00","date":"15.07.2025","title":"Raid","datetime_obj":"2025-07-15T18:00:00+00:00"}"#
        );
    }

    #[test]
    fn existing_datetime_obj_keeps_its_position() {
        let mut record: EventRecord =
            serde_json::from_str(r#"{"datetime_obj":"2025-01-15T09:00:00","title":"Meeting"}"#)
                .unwrap();
        record.set_datetime_obj("2025-01-15T08:00:00+00:00".to_string());

        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"datetime_obj":"2025-01-15T08:00:00+00:00","title":"Meeting"}"#
        );
    }

    #[test]
    fn missing_events_key_is_an_error() {
        assert!(serde_json::from_str::<EventDocument>(r#"{"items":[]}"#).is_err());
    }

    #[test]
    fn display_title_falls_back_to_placeholder() {
        let record = EventRecord::default();
        assert_eq!(record.display_title(), UNNAMED_EVENT);

        let record: EventRecord = serde_json::from_str(r#"{"title":42}"#).unwrap();
        assert_eq!(record.display_title(), UNNAMED_EVENT);
    }

    #[test]
    fn field_classifies_values() {
        let record: EventRecord = serde_json::from_str(
            r#"{"datetime_obj":"","date":15072025,"time":null,"title":"Raid"}"#,
        )
        .unwrap();

        assert_eq!(record.field(DATETIME_OBJ), Field::Missing);
        assert_eq!(record.field(TIME), Field::Missing);
        assert_eq!(record.field(EVENT_ID), Field::Missing);
        assert_eq!(record.field(TITLE), Field::Text("Raid"));
        assert!(matches!(record.field(DATE), Field::Other(Value::Number(_))));
    }
}
