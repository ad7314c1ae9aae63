// src/handlers/topic.rs
//
// The only post-creation mutations on a roadmap: topic completion, notes
// and bookmark. Everything AI-authored is write-once.

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::roadmap::{Topic, UpdateBookmarkRequest, UpdateCompletionRequest, UpdateNotesRequest},
    utils::jwt::Claims,
};

/// Fetches a topic only if it belongs (through week and roadmap) to the
/// user; a foreign topic reads as 404.
async fn fetch_owned(pool: &SqlitePool, user_id: i64, topic_id: i64) -> Result<Topic, AppError> {
    sqlx::query_as::<_, Topic>(
        r#"
        SELECT t.*
        FROM topics t
        JOIN weeks w ON t.week_id = w.id
        JOIN roadmaps r ON w.roadmap_id = r.id
        WHERE t.id = ? AND r.user_id = ?
        "#,
    )
    .bind(topic_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Topic not found".to_string()))
}

/// Toggles topic completion. `completed_at` is set exactly when the topic
/// is marked complete and cleared when unmarked.
pub async fn set_completion(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(topic_id): Path<i64>,
    Json(payload): Json<UpdateCompletionRequest>,
) -> Result<impl IntoResponse, AppError> {
    fetch_owned(&pool, claims.user_id(), topic_id).await?;

    let topic = sqlx::query_as::<_, Topic>(
        r#"
        UPDATE topics
        SET is_completed = ?,
            completed_at = CASE WHEN ? THEN CURRENT_TIMESTAMP ELSE NULL END
        WHERE id = ?
        RETURNING *
        "#,
    )
    .bind(payload.is_completed)
    .bind(payload.is_completed)
    .bind(topic_id)
    .fetch_one(&pool)
    .await?;

    let message = if payload.is_completed {
        "Topic marked as complete!"
    } else {
        "Topic marked as incomplete"
    };

    Ok(Json(json!({ "message": message, "topic": topic })))
}

/// Replaces the user-authored notes on a topic.
pub async fn set_notes(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(topic_id): Path<i64>,
    Json(payload): Json<UpdateNotesRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    fetch_owned(&pool, claims.user_id(), topic_id).await?;

    let topic = sqlx::query_as::<_, Topic>(
        "UPDATE topics SET notes = ? WHERE id = ? RETURNING *",
    )
    .bind(&payload.notes)
    .bind(topic_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({ "message": "Notes saved", "topic": topic })))
}

/// Toggles the bookmark flag on a topic.
pub async fn set_bookmark(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(topic_id): Path<i64>,
    Json(payload): Json<UpdateBookmarkRequest>,
) -> Result<impl IntoResponse, AppError> {
    fetch_owned(&pool, claims.user_id(), topic_id).await?;

    let topic = sqlx::query_as::<_, Topic>(
        "UPDATE topics SET is_bookmarked = ? WHERE id = ? RETURNING *",
    )
    .bind(payload.is_bookmarked)
    .bind(topic_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(json!({ "topic": topic })))
}
