// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;

use crate::{
    error::AppError, models::quiz::SubmitQuizRequest, pipeline, state::AiClients,
    utils::jwt::Claims,
};

/// Generates a quiz for a week, or returns the existing one.
///
/// Idempotent under client retry: only the first request for a week
/// creates a quiz, every later one gets the same quiz back.
pub async fn generate(
    State(pool): State<SqlitePool>,
    State(ai): State<AiClients>,
    Extension(claims): Extension<Claims>,
    Path(week_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let (quiz, created) =
        pipeline::quiz::generate_for_week(&pool, &ai, claims.user_id(), week_id).await?;

    let (status, message) = if created {
        (StatusCode::CREATED, "Quiz generated successfully!")
    } else {
        (StatusCode::OK, "Quiz already exists for this week")
    };

    Ok((status, Json(json!({ "message": message, "quiz": quiz }))))
}

/// Fetches a quiz with its questions.
pub async fn get(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let quiz = pipeline::quiz::fetch_owned(&pool, claims.user_id(), quiz_id).await?;
    let detail = pipeline::quiz::load_detail(&pool, quiz).await?;
    Ok(Json(json!({ "quiz": detail })))
}

/// Scores a submission and persists the attempt.
pub async fn submit(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
    Json(payload): Json<SubmitQuizRequest>,
) -> Result<impl IntoResponse, AppError> {
    let result = pipeline::quiz::submit(&pool, claims.user_id(), quiz_id, &payload).await?;
    Ok(Json(result))
}

/// Clears the score and answers so the quiz can be retaken.
pub async fn reset(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(quiz_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    pipeline::quiz::reset(&pool, claims.user_id(), quiz_id).await?;
    Ok(Json(json!({
        "message": "Quiz reset successfully. You can retake it now."
    })))
}
