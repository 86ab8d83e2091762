use axum::{
    extract::State,
    http::{header::LOCATION, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use super::{
    dto::{CreateItineraryRequest, ItineraryResponse, Pagination, UpdateItineraryRequest},
    repo,
};
use crate::{
    auth::gate::AuthUser,
    error::ApiError,
    extract::{ApiJson, ApiPath, ApiQuery},
    state::AppState,
};

pub fn itinerary_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_itineraries))
        .route("/generate", post(create_itinerary))
        .route(
            "/:id",
            get(get_itinerary)
                .patch(update_itinerary)
                .delete(delete_itinerary),
        )
}

#[instrument(skip(state, identity, body), fields(user_id = %identity.user_id))]
pub async fn create_itinerary(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiJson(body): ApiJson<CreateItineraryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = identity.user_uuid()?;
    let fields = body.validate().map_err(ApiError::Validation)?;

    let itinerary = repo::insert(&state.db, user_id, &fields).await?;
    info!(itinerary_id = %itinerary.id, "itinerary saved");

    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("/itineraries/{}", itinerary.id))],
        Json(ItineraryResponse::from(itinerary)),
    ))
}

#[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn list_itineraries(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiQuery(p): ApiQuery<Pagination>,
) -> Result<Json<Vec<ItineraryResponse>>, ApiError> {
    let user_id = identity.user_uuid()?;
    let (limit, offset) = p.clamped();
    let rows = repo::list_by_user(&state.db, user_id, limit, offset).await?;
    Ok(Json(rows.into_iter().map(ItineraryResponse::from).collect()))
}

#[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn get_itinerary(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<Json<ItineraryResponse>, ApiError> {
    let user_id = identity.user_uuid()?;
    repo::find_for_user(&state.db, user_id, id)
        .await?
        .map(|it| Json(it.into()))
        .ok_or(ApiError::NotFound("Itinerary not found"))
}

#[instrument(skip(state, identity, patch), fields(user_id = %identity.user_id))]
pub async fn update_itinerary(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
    ApiJson(patch): ApiJson<UpdateItineraryRequest>,
) -> Result<Json<ItineraryResponse>, ApiError> {
    let user_id = identity.user_uuid()?;
    let current = repo::find_for_user(&state.db, user_id, id)
        .await?
        .ok_or(ApiError::NotFound("Itinerary not found"))?;
    let fields = patch.apply(&current).map_err(ApiError::Validation)?;

    repo::update(&state.db, user_id, id, &fields)
        .await?
        .map(|it| Json(it.into()))
        .ok_or(ApiError::NotFound("Itinerary not found"))
}

#[instrument(skip(state, identity), fields(user_id = %identity.user_id))]
pub async fn delete_itinerary(
    State(state): State<AppState>,
    AuthUser(identity): AuthUser,
    ApiPath(id): ApiPath<Uuid>,
) -> Result<StatusCode, ApiError> {
    let user_id = identity.user_uuid()?;
    if repo::delete(&state.db, user_id, id).await? {
        info!(itinerary_id = %id, "itinerary deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Itinerary not found"))
    }
}
