// src/models/quiz.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// Represents the 'quizzes' table. At most one quiz exists per week
/// (UNIQUE constraint on week_id). `score` is null until submission and
/// cleared again on reset.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Quiz {
    pub id: i64,
    pub week_id: i64,
    pub score: Option<i64>,
    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// Represents the 'questions' table. `user_answer` is the 0-based option
/// index persisted on submission and cleared on reset.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: i64,
    pub quiz_id: i64,
    pub question: String,
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,
    pub correct_index: i64,
    pub explanation: Option<String>,
    pub user_answer: Option<i64>,
}

/// A quiz with its questions, for nested responses.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizDetail {
    #[serde(flatten)]
    pub quiz: Quiz,
    pub questions: Vec<Question>,
}

/// One submitted answer: the question it targets and the selected
/// 0-based option index.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerSubmission {
    pub question_id: i64,
    pub selected_index: i64,
}

/// DTO for submitting a quiz attempt.
#[derive(Debug, Deserialize)]
pub struct SubmitQuizRequest {
    pub answers: Vec<AnswerSubmission>,
}

/// Per-question outcome returned after submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResult {
    pub question_id: i64,
    pub correct: bool,
    pub correct_index: i64,
    pub user_answer: i64,
    pub explanation: Option<String>,
}

/// Aggregate result of a quiz submission.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub message: String,
    pub score: i64,
    pub correct_count: i64,
    pub total_questions: i64,
    pub results: Vec<AnswerResult>,
}
