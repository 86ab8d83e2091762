pub mod handlers;

use crate::state::AppState;
use axum::Router;

/// Billing routes, relative to `/billing`.
pub fn router() -> Router<AppState> {
    handlers::billing_routes()
}
