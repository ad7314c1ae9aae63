// src/handlers/roadmap.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::roadmap::CreateRoadmapRequest,
    pipeline,
    state::AiClients,
    utils::jwt::Claims,
};

/// Generates a new roadmap through the full AI pipeline.
///
/// Input bounds are enforced before any AI call is made.
pub async fn generate(
    State(pool): State<SqlitePool>,
    State(ai): State<AiClients>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<CreateRoadmapRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let roadmap = pipeline::roadmap::generate_roadmap(&pool, &ai, claims.user_id(), &payload).await?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Roadmap generated successfully!",
            "roadmap": roadmap
        })),
    ))
}

/// Lists the current user's roadmaps, newest first.
pub async fn list(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let roadmaps = pipeline::roadmap::list_for_user(&pool, claims.user_id()).await?;
    Ok(Json(json!({ "roadmaps": roadmaps })))
}

/// Fetches one roadmap with its full entity graph.
pub async fn get(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let roadmap = pipeline::roadmap::fetch_owned(&pool, claims.user_id(), id).await?;
    let detail = pipeline::roadmap::load_detail(&pool, roadmap).await?;
    Ok(Json(json!({ "roadmap": detail })))
}

/// Deletes a roadmap and, by cascade, all its weeks, topics, quizzes and
/// questions.
pub async fn delete(
    State(pool): State<SqlitePool>,
    Extension(claims): Extension<Claims>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    pipeline::roadmap::delete(&pool, claims.user_id(), id).await?;
    Ok(Json(json!({ "message": "Roadmap deleted successfully" })))
}
