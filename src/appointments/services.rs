use sqlx::PgPool;
use time::{Date, OffsetDateTime, Time};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::appointments::dto::{BookRequest, UpdateRequest};
use crate::appointments::repo::{self, Appointment, AppointmentChanges, NewAppointment};
use crate::appointments::slot::{format_date, format_time, parse_date, parse_time};
use crate::error::{internal, ApiError};

/// A validated slot: calendar date plus half-open `[start, end)` interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub date: Date,
    pub start: Time,
    pub end: Time,
}

fn now_utc() -> (Date, Time) {
    let now = OffsetDateTime::now_utc();
    (now.date(), now.time())
}

/// Validate a slot for booking: well-formed fields, strictly positive
/// duration, date not in the past, and a same-day start still ahead of the
/// clock.
pub(crate) fn validate_booking_slot(
    raw_date: &str,
    raw_start: &str,
    raw_end: &str,
    today: Date,
    now: Time,
) -> Result<Slot, ApiError> {
    let slot = validate_slot_fields(raw_date, raw_start, raw_end, today)?;
    if slot.date == today && slot.start <= now {
        return Err(ApiError::Validation(
            "startTime must be later than the current time".into(),
        ));
    }
    Ok(slot)
}

/// Validation for updates. The same-day start-vs-clock check is skipped so
/// the remainder of an ongoing slot can still be edited.
pub(crate) fn validate_update_slot(
    raw_date: &str,
    raw_start: &str,
    raw_end: &str,
    today: Date,
) -> Result<Slot, ApiError> {
    validate_slot_fields(raw_date, raw_start, raw_end, today)
}

fn validate_slot_fields(
    raw_date: &str,
    raw_start: &str,
    raw_end: &str,
    today: Date,
) -> Result<Slot, ApiError> {
    let date = parse_date("date", raw_date)?;
    let start = parse_time("startTime", raw_start)?;
    let end = parse_time("endTime", raw_end)?;

    if end <= start {
        return Err(ApiError::Validation(
            "endTime must be after startTime".into(),
        ));
    }
    if date < today {
        return Err(ApiError::Validation("date must not be in the past".into()));
    }

    Ok(Slot { date, start, end })
}

fn conflict_error(conflict: &Appointment) -> ApiError {
    ApiError::Conflict {
        date: format_date(conflict.date),
        start: format_time(conflict.start_time),
        end: format_time(conflict.end_time),
    }
}

fn is_exclusion_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|d| d.code())
        .is_some_and(|c| c == "23P01")
}

/// Book a new appointment.
///
/// The conflict lookup and the insert run in one transaction; the GiST
/// exclusion constraint on the table is the authoritative guard against a
/// concurrent booking racing past the lookup.
pub async fn book(db: &PgPool, req: BookRequest) -> Result<Uuid, ApiError> {
    let (today, now) = now_utc();
    let purged = repo::purge_expired(db, today).await.map_err(internal)?;
    if purged > 0 {
        debug!(purged, "expired appointments removed");
    }

    let slot = validate_booking_slot(&req.date, &req.start_time, &req.end_time, today, now)?;

    let mut tx = db.begin().await.map_err(internal)?;

    if let Some(existing) = repo::find_conflict(&mut tx, slot.date, slot.start, slot.end, None)
        .await
        .map_err(internal)?
    {
        warn!(conflict_id = %existing.id, "slot already booked");
        return Err(conflict_error(&existing));
    }

    let new = NewAppointment {
        user_id: req.user_id,
        title: req.title,
        date: slot.date,
        start_time: slot.start,
        end_time: slot.end,
        kind: req.kind,
        location: req.location,
        notes: req.notes,
        status: req.status,
    };
    let id = repo::insert(&mut tx, &new).await.map_err(|e| {
        if is_exclusion_violation(&e) {
            ApiError::Conflict {
                date: format_date(slot.date),
                start: format_time(slot.start),
                end: format_time(slot.end),
            }
        } else {
            internal(e)
        }
    })?;

    tx.commit().await.map_err(internal)?;

    info!(appointment_id = %id, date = %format_date(slot.date), "appointment booked");
    Ok(id)
}

/// An absent, empty, or whitespace-only filter means "no filter"; only a
/// non-empty malformed value is an error.
pub(crate) fn parse_date_filter(raw: Option<&str>) -> Result<Option<Date>, ApiError> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => parse_date("date", value).map(Some),
    }
}

/// All appointments, optionally filtered to a single date. Runs the expiry
/// purge first so past rows never show up.
pub async fn list(db: &PgPool, date_filter: Option<&str>) -> Result<Vec<Appointment>, ApiError> {
    let (today, _) = now_utc();
    repo::purge_expired(db, today).await.map_err(internal)?;

    let date = parse_date_filter(date_filter)?;
    repo::list(db, date).await.map_err(internal)
}

/// Appointments within an inclusive date range.
pub async fn list_by_range(
    db: &PgPool,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<Vec<Appointment>, ApiError> {
    let start = parse_date("start", start.unwrap_or_default())?;
    let end = parse_date("end", end.unwrap_or_default())?;
    if end < start {
        return Err(ApiError::Validation(
            "end date must not be before start date".into(),
        ));
    }

    let (today, _) = now_utc();
    repo::purge_expired(db, today).await.map_err(internal)?;
    repo::list_in_range(db, start, end).await.map_err(internal)
}

/// Update an appointment in place, re-checking the slot invariant against
/// everything but the row itself.
pub async fn update(db: &PgPool, id: Uuid, req: UpdateRequest) -> Result<(), ApiError> {
    let (today, _) = now_utc();
    repo::purge_expired(db, today).await.map_err(internal)?;

    // Existence is checked before the payload is validated.
    if repo::find_by_id(db, id).await.map_err(internal)?.is_none() {
        return Err(ApiError::NotFound("Appointment not found".into()));
    }

    let slot = validate_update_slot(&req.date, &req.start_time, &req.end_time, today)?;

    let mut tx = db.begin().await.map_err(internal)?;

    if let Some(existing) =
        repo::find_conflict(&mut tx, slot.date, slot.start, slot.end, Some(id))
            .await
            .map_err(internal)?
    {
        warn!(conflict_id = %existing.id, "slot already booked");
        return Err(conflict_error(&existing));
    }

    let changes = AppointmentChanges {
        title: req.title,
        date: slot.date,
        start_time: slot.start,
        end_time: slot.end,
        status: req.status,
        location: req.location,
        notes: req.notes,
    };
    let affected = repo::update(&mut tx, id, &changes).await.map_err(|e| {
        if is_exclusion_violation(&e) {
            ApiError::Conflict {
                date: format_date(slot.date),
                start: format_time(slot.start),
                end: format_time(slot.end),
            }
        } else {
            internal(e)
        }
    })?;
    if affected == 0 {
        // Row vanished between the existence check and the write.
        return Err(ApiError::NotFound("Appointment not found".into()));
    }

    tx.commit().await.map_err(internal)?;

    info!(appointment_id = %id, "appointment updated");
    Ok(())
}

/// Delete by id. No purge first: removing an already-expired row must
/// still succeed.
pub async fn delete(db: &PgPool, id: Uuid) -> Result<(), ApiError> {
    let affected = repo::delete(db, id).await.map_err(internal)?;
    if affected == 0 {
        return Err(ApiError::NotFound("Appointment not found".into()));
    }
    info!(appointment_id = %id, "appointment deleted");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::{date, time};

    const TODAY: Date = date!(2025 - 01 - 01);
    const NOW: Time = time!(12:00);

    fn booking(d: &str, s: &str, e: &str) -> Result<Slot, ApiError> {
        validate_booking_slot(d, s, e, TODAY, NOW)
    }

    #[test]
    fn accepts_future_slot() {
        let slot = booking("2025-01-10", "09:00", "10:00").unwrap();
        assert_eq!(slot.date, date!(2025 - 01 - 10));
        assert_eq!(slot.start, time!(09:00));
        assert_eq!(slot.end, time!(10:00));
    }

    #[test]
    fn rejects_end_not_after_start() {
        assert!(matches!(
            booking("2025-01-10", "10:00", "10:00"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            booking("2025-01-10", "10:00", "09:00"),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn rejects_past_date_regardless_of_time() {
        assert!(matches!(
            booking("2024-12-31", "09:00", "10:00"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            booking("2020-06-15", "23:00", "23:30"),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn rejects_blank_fields() {
        assert!(matches!(
            booking("", "09:00", "10:00"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            booking("2025-01-10", "  ", "10:00"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            booking("2025-01-10", "09:00", ""),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn same_day_start_must_beat_the_clock() {
        // noon "now": earlier or equal starts are gone already
        assert!(matches!(
            booking("2025-01-01", "11:00", "11:30"),
            Err(ApiError::Validation(_))
        ));
        assert!(matches!(
            booking("2025-01-01", "12:00", "13:00"),
            Err(ApiError::Validation(_))
        ));
        assert!(booking("2025-01-01", "12:01", "13:00").is_ok());
    }

    #[test]
    fn update_skips_clock_check_but_not_past_dates() {
        assert!(validate_update_slot("2025-01-01", "08:00", "09:00", TODAY).is_ok());
        assert!(matches!(
            validate_update_slot("2024-12-31", "08:00", "09:00", TODAY),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn blank_date_filter_means_no_filter() {
        assert_eq!(parse_date_filter(None).unwrap(), None);
        assert_eq!(parse_date_filter(Some("")).unwrap(), None);
        assert_eq!(parse_date_filter(Some("   ")).unwrap(), None);
    }

    #[test]
    fn date_filter_parses_or_rejects() {
        assert_eq!(
            parse_date_filter(Some("2025-01-10")).unwrap(),
            Some(date!(2025 - 01 - 10))
        );
        assert!(matches!(
            parse_date_filter(Some("not-a-date")),
            Err(ApiError::Validation(_))
        ));
    }

    #[test]
    fn conflict_error_carries_the_existing_slot() {
        let existing = Appointment {
            id: Uuid::nil(),
            user_id: Uuid::nil(),
            title: "Checkup".into(),
            date: date!(2025 - 01 - 10),
            start_time: time!(09:00),
            end_time: time!(10:00),
            kind: "Medical".into(),
            location: String::new(),
            notes: String::new(),
            status: "Pending".into(),
        };
        let err = conflict_error(&existing);
        assert_eq!(
            err.to_string(),
            "Already booked on 2025-01-10 from 09:00 to 10:00"
        );
    }
}
