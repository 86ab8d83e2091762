use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use tracing::instrument;

use crate::{auth::gate::AuthUser, error::ApiError, state::AppState};

pub fn billing_routes() -> Router<AppState> {
    Router::new().route("/me", get(subscription_status))
}

#[derive(Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionResponse {
    pub subscription_status: String,
    pub plan: Option<String>,
    pub customer_id: Option<String>,
}

#[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn subscription_status(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
) -> Result<Json<SubscriptionResponse>, ApiError> {
    let user_id = identity.user_uuid()?;
    let profile = state
        .users
        .find_profile(user_id)
        .await?
        .ok_or(ApiError::NotFound("Profile not found"))?;

    Ok(Json(SubscriptionResponse {
        subscription_status: profile
            .subscription_status
            .unwrap_or_else(|| "free".to_string()),
        plan: profile.subscription_plan,
        customer_id: profile.stripe_customer_id,
    }))
}
