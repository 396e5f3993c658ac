use sqlx::{FromRow, PgPool, Postgres, Transaction};
use time::{Date, Time};
use uuid::Uuid;

#[derive(Debug, Clone, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub date: Date,
    pub start_time: Time,
    pub end_time: Time,
    pub kind: String,
    pub location: String,
    pub notes: String,
    pub status: String,
}

pub struct NewAppointment {
    pub user_id: Uuid,
    pub title: String,
    pub date: Date,
    pub start_time: Time,
    pub end_time: Time,
    pub kind: String,
    pub location: String,
    pub notes: String,
    pub status: String,
}

pub struct AppointmentChanges {
    pub title: String,
    pub date: Date,
    pub start_time: Time,
    pub end_time: Time,
    pub status: String,
    pub location: String,
    pub notes: String,
}

const COLUMNS: &str =
    "id, user_id, title, date, start_time, end_time, kind, location, notes, status";

/// Delete every appointment dated strictly before `today`. Idempotent.
pub async fn purge_expired(db: &PgPool, today: Date) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM appointments WHERE date < $1")
        .bind(today)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// First appointment on `date` whose half-open interval overlaps
/// `[start, end)`, skipping `exclude` when updating in place.
pub async fn find_conflict(
    tx: &mut Transaction<'_, Postgres>,
    date: Date,
    start: Time,
    end: Time,
    exclude: Option<Uuid>,
) -> anyhow::Result<Option<Appointment>> {
    let row = sqlx::query_as::<_, Appointment>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM appointments
        WHERE date = $1
          AND start_time < $2
          AND end_time > $3
          AND ($4::uuid IS NULL OR id <> $4)
        ORDER BY start_time
        LIMIT 1
        "#
    ))
    .bind(date)
    .bind(end)
    .bind(start)
    .bind(exclude)
    .fetch_optional(&mut **tx)
    .await?;
    Ok(row)
}

/// Insert a new appointment. Returns the raw sqlx error so the caller can
/// map an exclusion-constraint violation to a slot conflict.
pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    new: &NewAppointment,
) -> sqlx::Result<Uuid> {
    let (id,): (Uuid,) = sqlx::query_as(
        r#"
        INSERT INTO appointments
            (user_id, title, date, start_time, end_time, kind, location, notes, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING id
        "#,
    )
    .bind(new.user_id)
    .bind(&new.title)
    .bind(new.date)
    .bind(new.start_time)
    .bind(new.end_time)
    .bind(&new.kind)
    .bind(&new.location)
    .bind(&new.notes)
    .bind(&new.status)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

/// Update the mutable fields of one appointment. `user_id` and `kind`
/// never change after booking.
pub async fn update(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    changes: &AppointmentChanges,
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE appointments
        SET title = $1,
            date = $2,
            start_time = $3,
            end_time = $4,
            status = $5,
            location = $6,
            notes = $7
        WHERE id = $8
        "#,
    )
    .bind(&changes.title)
    .bind(changes.date)
    .bind(changes.start_time)
    .bind(changes.end_time)
    .bind(&changes.status)
    .bind(&changes.location)
    .bind(&changes.notes)
    .bind(id)
    .execute(&mut **tx)
    .await?;
    Ok(result.rows_affected())
}

pub async fn find_by_id(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Appointment>> {
    let row = sqlx::query_as::<_, Appointment>(&format!(
        "SELECT {COLUMNS} FROM appointments WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<u64> {
    let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
        .bind(id)
        .execute(db)
        .await?;
    Ok(result.rows_affected())
}

/// All appointments, optionally restricted to one date, ordered by date
/// then start time.
pub async fn list(db: &PgPool, date: Option<Date>) -> anyhow::Result<Vec<Appointment>> {
    let rows = sqlx::query_as::<_, Appointment>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM appointments
        WHERE $1::date IS NULL OR date = $1
        ORDER BY date, start_time
        "#
    ))
    .bind(date)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

/// Appointments with `date` in `[start, end]` inclusive, same ordering as
/// `list`.
pub async fn list_in_range(db: &PgPool, start: Date, end: Date) -> anyhow::Result<Vec<Appointment>> {
    let rows = sqlx::query_as::<_, Appointment>(&format!(
        r#"
        SELECT {COLUMNS}
        FROM appointments
        WHERE date BETWEEN $1 AND $2
        ORDER BY date, start_time
        "#
    ))
    .bind(start)
    .bind(end)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
