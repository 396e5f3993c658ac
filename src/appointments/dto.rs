use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::appointments::repo::Appointment;
use crate::appointments::slot::{format_date, format_time};

/// Request body for booking. The frontend sends times in camelCase and the
/// category under `type`.
#[derive(Debug, Deserialize)]
pub struct BookRequest {
    pub user_id: Uuid,
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default, rename = "startTime")]
    pub start_time: String,
    #[serde(default, rename = "endTime")]
    pub end_time: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
    #[serde(default = "default_status")]
    pub status: String,
}

fn default_status() -> String {
    "Pending".into()
}

/// Request body for updating an appointment. `user_id` and `type` are
/// immutable and not accepted here.
#[derive(Debug, Deserialize)]
pub struct UpdateRequest {
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    pub status: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct RangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// Appointment as serialized to the client: dates as `YYYY-MM-DD`, times
/// as `HH:MM`.
#[derive(Debug, Serialize)]
pub struct AppointmentView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub location: String,
    pub notes: String,
    pub status: String,
}

impl From<Appointment> for AppointmentView {
    fn from(a: Appointment) -> Self {
        Self {
            id: a.id,
            user_id: a.user_id,
            title: a.title,
            date: format_date(a.date),
            start_time: format_time(a.start_time),
            end_time: format_time(a.end_time),
            kind: a.kind,
            location: a.location,
            notes: a.notes,
            status: a.status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct BookedResponse {
    pub success: bool,
    pub message: String,
    pub id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub success: bool,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    #[test]
    fn book_request_uses_camel_case_times_and_type() {
        let req: BookRequest = serde_json::from_str(
            r#"{
                "user_id": "7f2c1a90-3a9e-4f9b-8a71-2f0e9c5d1b4e",
                "title": "Checkup",
                "date": "2030-01-10",
                "startTime": "09:00",
                "endTime": "10:00",
                "type": "Medical"
            }"#,
        )
        .unwrap();
        assert_eq!(req.start_time, "09:00");
        assert_eq!(req.end_time, "10:00");
        assert_eq!(req.kind, "Medical");
        assert_eq!(req.status, "Pending");
        assert_eq!(req.location, "");
        assert_eq!(req.notes, "");
    }

    #[test]
    fn view_serializes_fixed_width_fields() {
        let view = AppointmentView::from(Appointment {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            title: "Checkup".into(),
            date: date!(2030 - 01 - 10),
            start_time: time!(09:00),
            end_time: time!(10:00:30),
            kind: "Medical".into(),
            location: String::new(),
            notes: String::new(),
            status: "Pending".into(),
        });
        let json = serde_json::to_string(&view).unwrap();
        assert!(json.contains(r#""date":"2030-01-10""#));
        assert!(json.contains(r#""start_time":"09:00""#));
        assert!(json.contains(r#""end_time":"10:00""#));
        assert!(json.contains(r#""type":"Medical""#));
    }
}
