use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, put},
    Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    appointments::{
        dto::{
            AppointmentView, BookRequest, BookedResponse, ListQuery, RangeQuery, StatusResponse,
            UpdateRequest,
        },
        services,
    },
    error::ApiError,
    extractors::Json,
    state::AppState,
};

pub fn appointment_routes() -> Router<AppState> {
    Router::new()
        .route("/appointments", get(list).post(book))
        .route("/appointments/range", get(list_by_range))
        .route("/appointments/:id", put(update).delete(delete))
}

#[instrument(skip(state, payload))]
pub async fn book(
    State(state): State<AppState>,
    Json(payload): Json<BookRequest>,
) -> Result<(StatusCode, Json<BookedResponse>), ApiError> {
    let id = services::book(&state.db, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(BookedResponse {
            success: true,
            message: "Appointment booked successfully".into(),
            id,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn list(
    State(state): State<AppState>,
    Query(q): Query<ListQuery>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let rows = services::list(&state.db, q.date.as_deref()).await?;
    Ok(Json(rows.into_iter().map(AppointmentView::from).collect()))
}

#[instrument(skip(state))]
pub async fn list_by_range(
    State(state): State<AppState>,
    Query(q): Query<RangeQuery>,
) -> Result<Json<Vec<AppointmentView>>, ApiError> {
    let rows = services::list_by_range(&state.db, q.start.as_deref(), q.end.as_deref()).await?;
    Ok(Json(rows.into_iter().map(AppointmentView::from).collect()))
}

#[instrument(skip(state, payload))]
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateRequest>,
) -> Result<Json<StatusResponse>, ApiError> {
    services::update(&state.db, id, payload).await?;
    Ok(Json(StatusResponse {
        success: true,
        message: "Appointment updated successfully".into(),
    }))
}

#[instrument(skip(state))]
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<StatusResponse>, ApiError> {
    services::delete(&state.db, id).await?;
    Ok(Json(StatusResponse {
        success: true,
        message: "Appointment deleted".into(),
    }))
}
