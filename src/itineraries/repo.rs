use anyhow::Context;
use sqlx::PgPool;
use uuid::Uuid;

use super::repo_types::{Itinerary, ItineraryFields};

const DRAFT: &str = "draft";

pub async fn insert(
    db: &PgPool,
    user_id: Uuid,
    fields: &ItineraryFields,
) -> anyhow::Result<Itinerary> {
    let row = sqlx::query_as::<_, Itinerary>(
        r#"
        INSERT INTO itineraries
            (user_id, destination, start_date, end_date, budget, pace, interests, status)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, user_id, destination, start_date, end_date, budget, pace,
                  interests, status, created_at
        "#,
    )
    .bind(user_id)
    .bind(&fields.destination)
    .bind(fields.start_date)
    .bind(fields.end_date)
    .bind(&fields.budget)
    .bind(&fields.pace)
    .bind(&fields.interests)
    .bind(DRAFT)
    .fetch_one(db)
    .await
    .context("insert itinerary")?;
    Ok(row)
}

pub async fn list_by_user(
    db: &PgPool,
    user_id: Uuid,
    limit: i64,
    offset: i64,
) -> anyhow::Result<Vec<Itinerary>> {
    let rows = sqlx::query_as::<_, Itinerary>(
        r#"
        SELECT id, user_id, destination, start_date, end_date, budget, pace,
               interests, status, created_at
        FROM itineraries
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT $2 OFFSET $3
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await
    .context("list itineraries")?;
    Ok(rows)
}

pub async fn find_for_user(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
) -> anyhow::Result<Option<Itinerary>> {
    let row = sqlx::query_as::<_, Itinerary>(
        r#"
        SELECT id, user_id, destination, start_date, end_date, budget, pace,
               interests, status, created_at
        FROM itineraries
        WHERE id = $1 AND user_id = $2
        "#,
    )
    .bind(id)
    .bind(user_id)
    .fetch_optional(db)
    .await
    .context("find itinerary")?;
    Ok(row)
}

pub async fn update(
    db: &PgPool,
    user_id: Uuid,
    id: Uuid,
    fields: &ItineraryFields,
) -> anyhow::Result<Option<Itinerary>> {
    let row = sqlx::query_as::<_, Itinerary>(
        r#"
        UPDATE itineraries
           SET destination = $3, start_date = $4, end_date = $5,
               budget = $6, pace = $7, interests = $8
         WHERE id = $1 AND user_id = $2
        RETURNING id, user_id, destination, start_date, end_date, budget, pace,
                  interests, status, created_at
        "#,
    )
    .bind(id)
    .bind(user_id)
    .bind(&fields.destination)
    .bind(fields.start_date)
    .bind(fields.end_date)
    .bind(&fields.budget)
    .bind(&fields.pace)
    .bind(&fields.interests)
    .fetch_optional(db)
    .await
    .context("update itinerary")?;
    Ok(row)
}

/// Returns whether a row was removed.
pub async fn delete(db: &PgPool, user_id: Uuid, id: Uuid) -> anyhow::Result<bool> {
    let res = sqlx::query("DELETE FROM itineraries WHERE id = $1 AND user_id = $2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await
        .context("delete itinerary")?;
    Ok(res.rows_affected() > 0)
}
