// src/pipeline/quiz.rs

use std::collections::HashMap;

use sqlx::SqlitePool;
use sqlx::types::Json;

use crate::{
    ai::{extract::extract_json, prompt, schema},
    error::AppError,
    models::quiz::{
        AnswerResult, AnswerSubmission, Question, Quiz, QuizDetail, ScoreResult, SubmitQuizRequest,
    },
    state::AiClients,
};

#[derive(sqlx::FromRow)]
struct WeekRow {
    id: i64,
    title: String,
}

/// Generates a quiz for a week, idempotently: if a quiz already exists
/// for the week it is returned unchanged. The UNIQUE constraint on
/// `quizzes.week_id` backstops the check under concurrent requests; a
/// unique-violation insert resolves to the existing quiz, never an error.
pub async fn generate_for_week(
    pool: &SqlitePool,
    ai: &AiClients,
    user_id: i64,
    week_id: i64,
) -> Result<(QuizDetail, bool), AppError> {
    let week = sqlx::query_as::<_, WeekRow>(
        r#"
        SELECT w.id, w.title
        FROM weeks w
        JOIN roadmaps r ON w.roadmap_id = r.id
        WHERE w.id = ? AND r.user_id = ?
        "#,
    )
    .bind(week_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Week not found".to_string()))?;

    if let Some(existing) = fetch_by_week(pool, week.id).await? {
        return Ok((load_detail(pool, existing).await?, false));
    }

    let topics: Vec<(String, String)> =
        sqlx::query_as("SELECT name, description FROM topics WHERE week_id = ? ORDER BY position")
            .bind(week.id)
            .fetch_all(pool)
            .await?;

    let prompt = prompt::quiz_prompt(&week.title, &topics);
    let raw = ai.llm.complete(&prompt).await?;
    let value = extract_json(&raw)?;
    let generated = schema::validate_quiz(&value)?;

    let mut tx = pool.begin().await?;

    let inserted: Result<i64, sqlx::Error> =
        sqlx::query_scalar("INSERT INTO quizzes (week_id) VALUES (?) RETURNING id")
            .bind(week.id)
            .fetch_one(&mut *tx)
            .await;

    let quiz_id = match inserted {
        Ok(id) => id,
        Err(e) if e.to_string().contains("UNIQUE constraint") => {
            // Lost the race to a concurrent generation; hand back theirs.
            tx.rollback().await?;
            let existing = fetch_by_week(pool, week.id)
                .await?
                .ok_or_else(|| AppError::InternalServerError(e.to_string()))?;
            return Ok((load_detail(pool, existing).await?, false));
        }
        Err(e) => return Err(e.into()),
    };

    for q in &generated.questions {
        sqlx::query(
            r#"
            INSERT INTO questions (quiz_id, question, options, correct_index, explanation)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(quiz_id)
        .bind(&q.question)
        .bind(Json(&q.options))
        .bind(q.correct_index)
        .bind(&q.explanation)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    let quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE id = ?")
        .bind(quiz_id)
        .fetch_one(pool)
        .await?;

    Ok((load_detail(pool, quiz).await?, true))
}

async fn fetch_by_week(pool: &SqlitePool, week_id: i64) -> Result<Option<Quiz>, AppError> {
    Ok(
        sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE week_id = ?")
            .bind(week_id)
            .fetch_optional(pool)
            .await?,
    )
}

/// Fetches a quiz only if it belongs (through week and roadmap) to the
/// user. Ownership failures read the same as absence.
pub async fn fetch_owned(pool: &SqlitePool, user_id: i64, quiz_id: i64) -> Result<Quiz, AppError> {
    sqlx::query_as::<_, Quiz>(
        r#"
        SELECT q.*
        FROM quizzes q
        JOIN weeks w ON q.week_id = w.id
        JOIN roadmaps r ON w.roadmap_id = r.id
        WHERE q.id = ? AND r.user_id = ?
        "#,
    )
    .bind(quiz_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Quiz not found".to_string()))
}

pub async fn load_detail(pool: &SqlitePool, quiz: Quiz) -> Result<QuizDetail, AppError> {
    let questions =
        sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE quiz_id = ? ORDER BY id ASC")
            .bind(quiz.id)
            .fetch_all(pool)
            .await?;

    Ok(QuizDetail { quiz, questions })
}

/// Scores a submission against the stored questions.
///
/// Answers referencing unknown question ids are ignored rather than
/// erroring; the selected index is persisted per question (resubmission
/// overwrites) and the rounded percentage score is persisted on the quiz.
pub async fn submit(
    pool: &SqlitePool,
    user_id: i64,
    quiz_id: i64,
    req: &SubmitQuizRequest,
) -> Result<ScoreResult, AppError> {
    let quiz = fetch_owned(pool, user_id, quiz_id).await?;

    let questions =
        sqlx::query_as::<_, Question>("SELECT * FROM questions WHERE quiz_id = ? ORDER BY id ASC")
            .bind(quiz.id)
            .fetch_all(pool)
            .await?;

    if questions.is_empty() {
        return Err(AppError::InternalServerError(format!(
            "quiz {} has no questions",
            quiz.id
        )));
    }

    let by_id: HashMap<i64, &Question> = questions.iter().map(|q| (q.id, q)).collect();

    let mut correct_count: i64 = 0;
    let mut results = Vec::new();
    let mut matched: Vec<&AnswerSubmission> = Vec::new();

    for answer in &req.answers {
        let Some(question) = by_id.get(&answer.question_id) else {
            continue;
        };
        let correct = question.correct_index == answer.selected_index;
        if correct {
            correct_count += 1;
        }
        matched.push(answer);
        results.push(AnswerResult {
            question_id: question.id,
            correct,
            correct_index: question.correct_index,
            user_answer: answer.selected_index,
            explanation: question.explanation.clone(),
        });
    }

    let total_questions = questions.len() as i64;
    let score = ((correct_count as f64 / total_questions as f64) * 100.0).round() as i64;

    let mut tx = pool.begin().await?;

    for answer in matched {
        sqlx::query("UPDATE questions SET user_answer = ? WHERE id = ?")
            .bind(answer.selected_index)
            .bind(answer.question_id)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query("UPDATE quizzes SET score = ? WHERE id = ?")
        .bind(score)
        .bind(quiz.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;

    let message = if score >= 70 {
        "Great job!".to_string()
    } else {
        "Keep practicing!".to_string()
    };

    Ok(ScoreResult {
        message,
        score,
        correct_count,
        total_questions,
        results,
    })
}

/// Clears the score and every per-question answer so the quiz can be
/// retaken. Questions themselves are never regenerated.
pub async fn reset(pool: &SqlitePool, user_id: i64, quiz_id: i64) -> Result<(), AppError> {
    let quiz = fetch_owned(pool, user_id, quiz_id).await?;

    let mut tx = pool.begin().await?;

    sqlx::query("UPDATE quizzes SET score = NULL WHERE id = ?")
        .bind(quiz.id)
        .execute(&mut *tx)
        .await?;

    sqlx::query("UPDATE questions SET user_answer = NULL WHERE quiz_id = ?")
        .bind(quiz.id)
        .execute(&mut *tx)
        .await?;

    tx.commit().await?;
    Ok(())
}
