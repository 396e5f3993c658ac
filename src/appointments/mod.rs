use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod services;
pub mod slot;

pub fn router() -> Router<AppState> {
    handlers::appointment_routes()
}
