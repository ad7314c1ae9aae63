// src/pipeline/roadmap.rs

use sqlx::SqlitePool;
use sqlx::types::Json;

use crate::{
    ai::{extract::extract_json, prompt, research::research_learning_path, schema},
    error::AppError,
    models::{
        quiz::{Question, Quiz, QuizDetail},
        roadmap::{CreateRoadmapRequest, Roadmap, RoadmapDetail, Topic, Week, WeekDetail},
    },
    state::AiClients,
};

/// Runs the full roadmap pipeline for one request: research (fail-soft),
/// generation (fatal on failure), extraction, validation, then one atomic
/// persist of the whole roadmap/week/topic graph.
pub async fn generate_roadmap(
    pool: &SqlitePool,
    ai: &AiClients,
    user_id: i64,
    input: &CreateRoadmapRequest,
) -> Result<RoadmapDetail, AppError> {
    tracing::info!("researching learning path for user {}", user_id);
    let research =
        research_learning_path(ai.research.as_ref(), &input.current_skills, &input.target_goal)
            .await;

    let prompt = prompt::roadmap_prompt(input, &research);
    let raw = ai.llm.complete(&prompt).await?;

    let value = extract_json(&raw)?;
    let generated = schema::validate_roadmap(&value)?;

    // Week-count drift against the requested total is prompt-level
    // guidance, not an invariant.
    if generated.weeks.len() as i64 != input.total_weeks {
        tracing::debug!(
            "model produced {} weeks, {} requested",
            generated.weeks.len(),
            input.total_weeks
        );
    }

    let roadmap_id = persist_roadmap(pool, user_id, input, &generated).await?;

    let roadmap = sqlx::query_as::<_, Roadmap>("SELECT * FROM roadmaps WHERE id = ?")
        .bind(roadmap_id)
        .fetch_one(pool)
        .await?;

    load_detail(pool, roadmap).await
}

/// One transaction creating the roadmap row and every descendant week and
/// topic. Ordinal fields are recomputed from array position; whatever the
/// model put in them is never trusted. Any failed insert rolls the whole
/// roadmap back.
async fn persist_roadmap(
    pool: &SqlitePool,
    user_id: i64,
    input: &CreateRoadmapRequest,
    generated: &schema::GeneratedRoadmap,
) -> Result<i64, AppError> {
    let mut tx = pool.begin().await?;

    let roadmap_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO roadmaps
            (user_id, title, description, current_skills, target_goal, hours_per_week, total_weeks)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING id
        "#,
    )
    .bind(user_id)
    .bind(&generated.title)
    .bind(&generated.description)
    .bind(&input.current_skills)
    .bind(&input.target_goal)
    .bind(input.hours_per_week)
    .bind(input.total_weeks)
    .fetch_one(&mut *tx)
    .await?;

    for (week_index, week) in generated.weeks.iter().enumerate() {
        let week_id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO weeks (roadmap_id, week_number, title, description, goals)
            VALUES (?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(roadmap_id)
        .bind(week_index as i64 + 1)
        .bind(&week.title)
        .bind(&week.description)
        .bind(&week.goals)
        .fetch_one(&mut *tx)
        .await?;

        for (topic_index, topic) in week.topics.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO topics
                    (week_id, name, description, estimated_hours, position, why_this_first, search_strings)
                VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(week_id)
            .bind(&topic.name)
            .bind(&topic.description)
            .bind(topic.estimated_hours)
            .bind(topic_index as i64 + 1)
            .bind(&topic.why_this_first)
            .bind(Json(&topic.search_strings))
            .execute(&mut *tx)
            .await?;
        }
    }

    tx.commit().await?;
    Ok(roadmap_id)
}

/// Fetches a roadmap row only if it belongs to the user. Ownership
/// failures read the same as absence.
pub async fn fetch_owned(
    pool: &SqlitePool,
    user_id: i64,
    roadmap_id: i64,
) -> Result<Roadmap, AppError> {
    sqlx::query_as::<_, Roadmap>("SELECT * FROM roadmaps WHERE id = ? AND user_id = ?")
        .bind(roadmap_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("Roadmap not found".to_string()))
}

/// All of a user's roadmaps with their full entity graphs, newest first.
pub async fn list_for_user(
    pool: &SqlitePool,
    user_id: i64,
) -> Result<Vec<RoadmapDetail>, AppError> {
    let roadmaps = sqlx::query_as::<_, Roadmap>(
        "SELECT * FROM roadmaps WHERE user_id = ? ORDER BY created_at DESC, id DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let mut details = Vec::with_capacity(roadmaps.len());
    for roadmap in roadmaps {
        details.push(load_detail(pool, roadmap).await?);
    }
    Ok(details)
}

/// Assembles the nested roadmap -> weeks -> topics (+ quiz/questions)
/// response from a roadmap row.
pub async fn load_detail(pool: &SqlitePool, roadmap: Roadmap) -> Result<RoadmapDetail, AppError> {
    let weeks = sqlx::query_as::<_, Week>(
        "SELECT * FROM weeks WHERE roadmap_id = ? ORDER BY week_number ASC",
    )
    .bind(roadmap.id)
    .fetch_all(pool)
    .await?;

    let mut week_details = Vec::with_capacity(weeks.len());
    for week in weeks {
        let topics = sqlx::query_as::<_, Topic>(
            "SELECT * FROM topics WHERE week_id = ? ORDER BY position ASC",
        )
        .bind(week.id)
        .fetch_all(pool)
        .await?;

        let quiz = sqlx::query_as::<_, Quiz>("SELECT * FROM quizzes WHERE week_id = ?")
            .bind(week.id)
            .fetch_optional(pool)
            .await?;

        let quiz = match quiz {
            Some(quiz) => {
                let questions = sqlx::query_as::<_, Question>(
                    "SELECT * FROM questions WHERE quiz_id = ? ORDER BY id ASC",
                )
                .bind(quiz.id)
                .fetch_all(pool)
                .await?;
                Some(QuizDetail { quiz, questions })
            }
            None => None,
        };

        week_details.push(WeekDetail {
            week,
            topics,
            quiz,
        });
    }

    Ok(RoadmapDetail {
        roadmap,
        weeks: week_details,
    })
}

/// Deletes a roadmap; the schema cascades to weeks, topics, quizzes and
/// questions.
pub async fn delete(pool: &SqlitePool, user_id: i64, roadmap_id: i64) -> Result<(), AppError> {
    // Existence/ownership first so a foreign roadmap reads as 404.
    fetch_owned(pool, user_id, roadmap_id).await?;

    sqlx::query("DELETE FROM roadmaps WHERE id = ?")
        .bind(roadmap_id)
        .execute(pool)
        .await?;

    Ok(())
}
