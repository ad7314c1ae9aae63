// src/models/roadmap.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'roadmaps' table. Request fields are denormalized onto
/// the row at creation time; everything except timestamps is write-once.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Roadmap {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: String,
    pub current_skills: String,
    pub target_goal: String,
    pub hours_per_week: i64,
    pub total_weeks: i64,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'weeks' table. `week_number` is 1-indexed and unique
/// within its roadmap.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Week {
    pub id: i64,
    pub roadmap_id: i64,
    pub week_number: i64,
    pub title: String,
    pub description: String,
    pub goals: String,
}

/// Represents the 'topics' table.
///
/// `is_completed`, `completed_at`, `notes` and `is_bookmarked` are the
/// only fields mutable after creation; the AI-authored fields are
/// immutable once generated.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    pub id: i64,
    pub week_id: i64,
    pub name: String,
    pub description: String,
    pub estimated_hours: f64,
    /// 1-indexed position within the week.
    #[serde(rename = "order")]
    pub position: i64,
    pub why_this_first: String,
    /// Stored as a JSON array in the database.
    pub search_strings: Json<Vec<String>>,
    pub is_completed: bool,
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    pub notes: String,
    pub is_bookmarked: bool,
}

/// DTO for requesting a new roadmap. Validated before any AI call.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoadmapRequest {
    #[validate(length(min = 10, message = "Please describe your current skills in more detail"))]
    pub current_skills: String,
    #[validate(length(min = 10, message = "Please describe your target goal in more detail"))]
    pub target_goal: String,
    #[validate(range(min = 1, max = 60, message = "Hours per week must be between 1 and 60"))]
    pub hours_per_week: i64,
    #[validate(range(min = 1, max = 52, message = "Total weeks must be between 1 and 52"))]
    pub total_weeks: i64,
}

/// DTO for toggling topic completion.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCompletionRequest {
    pub is_completed: bool,
}

/// DTO for replacing a topic's user-authored notes.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateNotesRequest {
    #[validate(length(max = 10000, message = "Notes are limited to 10000 characters"))]
    pub notes: String,
}

/// DTO for toggling a topic bookmark.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateBookmarkRequest {
    pub is_bookmarked: bool,
}

/// A week with its topics and (if generated) quiz, for nested responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekDetail {
    #[serde(flatten)]
    pub week: Week,
    pub topics: Vec<Topic>,
    pub quiz: Option<crate::models::quiz::QuizDetail>,
}

/// A roadmap with its full entity graph, for nested responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoadmapDetail {
    #[serde(flatten)]
    pub roadmap: Roadmap,
    pub weeks: Vec<WeekDetail>,
}
