mod dto;
pub mod handlers;
mod repo;
mod repo_types;

use crate::state::AppState;
use axum::Router;

/// Itinerary routes, relative to `/itineraries`. Callers put them behind the
/// auth gate.
pub fn router() -> Router<AppState> {
    handlers::itinerary_routes()
}
