use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Itinerary {
    pub id: Uuid,
    pub user_id: Uuid,
    pub destination: String,
    pub start_date: Date,
    pub end_date: Date,
    pub budget: String,
    pub pace: String,
    pub interests: Vec<String>,
    pub status: String,
    pub created_at: OffsetDateTime,
}

/// Validated, user-editable columns.
#[derive(Debug, Clone)]
pub struct ItineraryFields {
    pub destination: String,
    pub start_date: Date,
    pub end_date: Date,
    pub budget: String,
    pub pace: String,
    pub interests: Vec<String>,
}
