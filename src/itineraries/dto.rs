use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};
use uuid::Uuid;

use super::repo_types::{Itinerary, ItineraryFields};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Budget {
    Low,
    #[default]
    Medium,
    High,
}

impl Budget {
    pub fn as_str(self) -> &'static str {
        match self {
            Budget::Low => "low",
            Budget::Medium => "medium",
            Budget::High => "high",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Pace {
    Relaxed,
    #[default]
    Moderate,
    Packed,
}

impl Pace {
    pub fn as_str(self) -> &'static str {
        match self {
            Pace::Relaxed => "relaxed",
            Pace::Moderate => "moderate",
            Pace::Packed => "packed",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateItineraryRequest {
    pub destination: String,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date")]
    pub end_date: Date,
    pub budget: Option<Budget>,
    pub pace: Option<Pace>,
    pub interests: Option<Vec<String>>,
}

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateItineraryRequest {
    pub destination: Option<String>,
    #[serde(default, with = "iso_date::option")]
    pub start_date: Option<Date>,
    #[serde(default, with = "iso_date::option")]
    pub end_date: Option<Date>,
    pub budget: Option<Budget>,
    pub pace: Option<Pace>,
    pub interests: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct Pagination {
    #[serde(default = "default_limit")]
    pub limit: i64,
    #[serde(default)]
    pub offset: i64,
}
fn default_limit() -> i64 {
    20
}

impl Pagination {
    pub const MAX_LIMIT: i64 = 100;

    pub fn clamped(&self) -> (i64, i64) {
        (self.limit.clamp(1, Self::MAX_LIMIT), self.offset.max(0))
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ItineraryResponse {
    pub id: Uuid,
    pub destination: String,
    #[serde(with = "iso_date")]
    pub start_date: Date,
    #[serde(with = "iso_date")]
    pub end_date: Date,
    pub budget: String,
    pub pace: String,
    pub interests: Vec<String>,
    pub status: String,
    pub days: Vec<serde_json::Value>, // generation is not implemented; always empty
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

impl From<Itinerary> for ItineraryResponse {
    fn from(it: Itinerary) -> Self {
        Self {
            id: it.id,
            destination: it.destination,
            start_date: it.start_date,
            end_date: it.end_date,
            budget: it.budget,
            pace: it.pace,
            interests: it.interests,
            status: it.status,
            days: Vec::new(),
            created_at: it.created_at,
        }
    }
}

fn clean_interests(raw: Vec<String>) -> Vec<String> {
    raw.into_iter()
        .map(|i| i.trim().to_string())
        .filter(|i| !i.is_empty())
        .collect()
}

fn check(fields: ItineraryFields) -> Result<ItineraryFields, String> {
    if fields.destination.is_empty() {
        return Err("Destination is required".into());
    }
    if fields.end_date < fields.start_date {
        return Err("End date must not be before start date".into());
    }
    Ok(fields)
}

impl CreateItineraryRequest {
    pub fn validate(self) -> Result<ItineraryFields, String> {
        check(ItineraryFields {
            destination: self.destination.trim().to_string(),
            start_date: self.start_date,
            end_date: self.end_date,
            budget: self.budget.unwrap_or_default().as_str().to_string(),
            pace: self.pace.unwrap_or_default().as_str().to_string(),
            interests: clean_interests(self.interests.unwrap_or_default()),
        })
    }
}

impl UpdateItineraryRequest {
    /// Merges the patch over `current` and validates the result.
    pub fn apply(self, current: &Itinerary) -> Result<ItineraryFields, String> {
        check(ItineraryFields {
            destination: self
                .destination
                .map(|d| d.trim().to_string())
                .unwrap_or_else(|| current.destination.clone()),
            start_date: self.start_date.unwrap_or(current.start_date),
            end_date: self.end_date.unwrap_or(current.end_date),
            budget: self
                .budget
                .map(|b| b.as_str().to_string())
                .unwrap_or_else(|| current.budget.clone()),
            pace: self
                .pace
                .map(|p| p.as_str().to_string())
                .unwrap_or_else(|| current.pace.clone()),
            interests: self
                .interests
                .map(clean_interests)
                .unwrap_or_else(|| current.interests.clone()),
        })
    }
}
