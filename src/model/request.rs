use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use serde::{Deserialize, Serialize};
use strum::Display;

use crate::utils::validation::{TimeRangeError, split_time_range};

/// Textual form of `Request::date`, e.g. `16.10.2026`.
pub const DATE_FORMAT: &str = "%d.%m.%Y";
/// Textual form of `created_at` / `processed_at`.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const CLOCK_FORMAT: &str = "%H:%M";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
}

/// Same-day clock interval, persisted as `"HH:MM - HH:MM"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeRange {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeRange {
    pub fn duration(&self) -> TimeDelta {
        self.end.signed_duration_since(self.start)
    }

    /// "N ч" for a full hour or more, "N мин" otherwise.
    pub fn duration_label(&self) -> String {
        let minutes = self.duration().num_minutes();
        if minutes >= 60 {
            format!("{} ч", minutes / 60)
        } else {
            format!("{} мин", minutes)
        }
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} - {}",
            self.start.format(CLOCK_FORMAT),
            self.end.format(CLOCK_FORMAT)
        )
    }
}

impl From<TimeRange> for String {
    fn from(range: TimeRange) -> Self {
        range.to_string()
    }
}

impl TryFrom<String> for TimeRange {
    type Error = TimeRangeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        split_time_range(&value)
    }
}

/// Everything the requester supplies; the store assigns id and timestamps.
#[derive(Debug, Clone)]
pub struct RequestDraft {
    pub requester_id: String,
    pub requester_display_name: String,
    pub date: NaiveDate,
    pub time_range: Option<TimeRange>,
    pub static_id: String,
    pub department: String,
    pub reason: String,
}

/// Moderator decision applied to a pending request.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: RequestStatus,
    pub moderator_id: Option<String>,
    pub moderator_name: Option<String>,
    pub rejection_reason: Option<String>,
    pub processed_at: NaiveDateTime,
}

/// One otgul application as persisted in the request file.
///
/// Field aliases accept files written by the earlier snake_case layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub id: u64,
    #[serde(alias = "user_id")]
    pub requester_id: String,
    #[serde(alias = "username")]
    pub requester_display_name: String,
    #[serde(with = "date_format")]
    pub date: NaiveDate,
    #[serde(
        default,
        alias = "time",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_time_range::deserialize"
    )]
    pub time_range: Option<TimeRange>,
    // derived from time_range on construction and on load
    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    duration_label: Option<String>,
    #[serde(default, alias = "static")]
    pub static_id: String,
    pub department: String,
    #[serde(default)]
    pub reason: String,
    pub status: RequestStatus,
    #[serde(alias = "created_at", with = "timestamp_format")]
    pub created_at: NaiveDateTime,
    #[serde(default, alias = "moderator_id", skip_serializing_if = "Option::is_none")]
    pub moderator_id: Option<String>,
    #[serde(default, alias = "moderator_name", skip_serializing_if = "Option::is_none")]
    pub moderator_name: Option<String>,
    #[serde(default, alias = "rejection_reason", skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
    #[serde(
        default,
        alias = "processed_at",
        skip_serializing_if = "Option::is_none",
        with = "optional_timestamp_format"
    )]
    pub processed_at: Option<NaiveDateTime>,
}

impl Request {
    pub fn from_draft(id: u64, draft: RequestDraft, created_at: NaiveDateTime) -> Self {
        let mut request = Self {
            id,
            requester_id: draft.requester_id,
            requester_display_name: draft.requester_display_name,
            date: draft.date,
            time_range: draft.time_range,
            duration_label: None,
            static_id: draft.static_id,
            department: draft.department,
            reason: draft.reason,
            status: RequestStatus::Pending,
            created_at,
            moderator_id: None,
            moderator_name: None,
            rejection_reason: None,
            processed_at: None,
        };
        request.refresh_duration_label();
        request
    }

    pub fn duration_label(&self) -> Option<&str> {
        self.duration_label.as_deref()
    }

    pub(crate) fn refresh_duration_label(&mut self) {
        self.duration_label = self.time_range.map(|range| range.duration_label());
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequestStatus::Pending
    }

    /// Moderator fields are only overwritten when a value is supplied.
    pub(crate) fn apply(&mut self, update: StatusUpdate) {
        self.status = update.status;
        if let Some(id) = update.moderator_id {
            self.moderator_id = Some(id);
        }
        if let Some(name) = update.moderator_name {
            self.moderator_name = Some(name);
        }
        if let Some(reason) = update.rejection_reason {
            self.rejection_reason = Some(reason);
        }
        if update.status != RequestStatus::Pending {
            self.processed_at = Some(update.processed_at);
        }
    }
}

mod date_format {
    use super::DATE_FORMAT;
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&date.format(DATE_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDate::parse_from_str(&raw, DATE_FORMAT).map_err(serde::de::Error::custom)
    }
}

/// One unreadable range must not make the whole file unreadable.
mod lenient_time_range {
    use super::TimeRange;
    use crate::utils::validation::leading_time_range;
    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<TimeRange>, D::Error> {
        let Some(raw) = Option::<String>::deserialize(deserializer)? else {
            return Ok(None);
        };
        let range = leading_time_range(&raw);
        if range.is_none() && !raw.trim().is_empty() {
            tracing::warn!(time = %raw, "stored time range is unreadable, record kept without it");
        }
        Ok(range)
    }
}

mod timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &NaiveDateTime,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<NaiveDateTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT).map_err(serde::de::Error::custom)
    }
}

mod optional_timestamp_format {
    use super::TIMESTAMP_FORMAT;
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_str(&value.format(TIMESTAMP_FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| {
                NaiveDateTime::parse_from_str(&raw, TIMESTAMP_FORMAT)
                    .map_err(serde::de::Error::custom)
            })
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn draft() -> RequestDraft {
        RequestDraft {
            requester_id: "42".into(),
            requester_display_name: "Иван Иванов".into(),
            date: NaiveDate::from_ymd_opt(2026, 10, 16).unwrap(),
            time_range: Some(TimeRange { start: at(15, 0), end: at(15, 30) }),
            static_id: "123-456".into(),
            department: "ГИБДД".into(),
            reason: "Гражданские дела".into(),
        }
    }

    #[test]
    fn serializes_camel_case_and_omits_absent_optionals() {
        let created = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(12, 5, 0)
            .unwrap();
        let request = Request::from_draft(7, draft(), created);
        let value = serde_json::to_value(&request).unwrap();

        assert_eq!(value["requesterId"], "42");
        assert_eq!(value["date"], "16.10.2026");
        assert_eq!(value["timeRange"], "15:00 - 15:30");
        assert_eq!(value["durationLabel"], "30 мин");
        assert_eq!(value["status"], "pending");
        assert_eq!(value["createdAt"], "2026-10-16 12:05:00");
        assert!(value.get("moderatorId").is_none());
        assert!(value.get("processedAt").is_none());
    }

    #[test]
    fn reads_snake_case_records() {
        let value = json!({
            "id": 3,
            "user_id": "99",
            "username": "Пётр",
            "date": "01.10.2026",
            "time": "9:00-9:45",
            "duration": "45 мин",
            "static": "555",
            "department": "ГИБДД",
            "reason": "врач",
            "status": "approved",
            "created_at": "2026-10-01 08:00:00",
            "moderator_id": "1",
            "moderator_name": "Модератор",
            "processed_at": "2026-10-01 08:10:00"
        });
        let mut request: Request = serde_json::from_value(value).unwrap();
        request.refresh_duration_label();

        assert_eq!(request.requester_id, "99");
        assert_eq!(request.time_range.unwrap().start, at(9, 0));
        assert_eq!(request.duration_label(), Some("45 мин"));
        assert_eq!(request.status, RequestStatus::Approved);
        assert!(request.processed_at.is_some());
    }

    #[test]
    fn unreadable_stored_time_keeps_the_record() {
        let mut value = json!({
            "id": 4,
            "user_id": "99",
            "username": "Пётр",
            "date": "01.10.2026",
            "time": "15:00 - 15:30 (врач)",
            "static": "555",
            "department": "ГИБДД",
            "status": "pending",
            "created_at": "2026-10-01 08:00:00"
        });
        let request: Request = serde_json::from_value(value.clone()).unwrap();
        assert_eq!(request.time_range.unwrap().to_string(), "15:00 - 15:30");

        value["time"] = json!("24:00 - 24:30");
        let request: Request = serde_json::from_value(value).unwrap();
        assert_eq!(request.time_range, None);
        assert_eq!(request.id, 4);
    }

    #[test]
    fn apply_keeps_existing_moderator_when_none_given() {
        let created = NaiveDate::from_ymd_opt(2026, 10, 16)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let mut request = Request::from_draft(1, draft(), created);
        request.apply(StatusUpdate {
            status: RequestStatus::Rejected,
            moderator_id: None,
            moderator_name: None,
            rejection_reason: Some("нет".into()),
            processed_at: created,
        });

        assert_eq!(request.status, RequestStatus::Rejected);
        assert_eq!(request.moderator_id, None);
        assert_eq!(request.rejection_reason.as_deref(), Some("нет"));
        assert_eq!(request.processed_at, Some(created));
    }

    #[test]
    fn full_hour_label() {
        let range = TimeRange { start: at(15, 0), end: at(16, 0) };
        assert_eq!(range.duration_label(), "1 ч");
        assert_eq!(range.to_string(), "15:00 - 16:00");
    }
}
