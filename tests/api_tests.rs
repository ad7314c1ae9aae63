// tests/api_tests.rs

use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use skillpath::ai::AiError;
use skillpath::ai::client::LanguageModelClient;
use skillpath::ai::research::NoopResearcher;
use skillpath::config::{AiBackend, Config};
use skillpath::routes;
use skillpath::state::{AiClients, AppState};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

/// Scripted stand-in for the Generation Collaborator. Answers roadmap
/// prompts with a roadmap sized to the requested week count and quiz
/// prompts with a fixed 5-question quiz, both wrapped in chatty markdown
/// so the extractor is exercised end to end. Counts every call so tests
/// can assert that rejected inputs never reach the model.
struct ScriptedLlm {
    calls: Arc<AtomicUsize>,
}

impl ScriptedLlm {
    fn roadmap_json(total_weeks: usize) -> String {
        let weeks: Vec<serde_json::Value> = (1..=total_weeks)
            .map(|n| {
                serde_json::json!({
                    "title": format!("Week {} focus", n),
                    "description": format!("What week {} covers", n),
                    "goals": format!("Goals for week {}", n),
                    // Bogus ordinal the server must ignore.
                    "weekNumber": 99,
                    "topics": [
                        {
                            "name": format!("Topic {}.1", n),
                            "description": "First unit",
                            "estimatedHours": 3.5,
                            "order": 42,
                            "whyThisFirst": "Foundation before practice",
                            "searchStrings": ["query one", "query two"]
                        },
                        {
                            "name": format!("Topic {}.2", n),
                            "description": "Second unit",
                            "estimatedHours": 2,
                            "order": 7,
                            "whyThisFirst": "Builds on the first unit",
                            "searchStrings": ["query three"]
                        }
                    ]
                })
            })
            .collect();

        serde_json::json!({
            "title": "Scripted Learning Path",
            "description": "A deterministic plan for testing",
            "weeks": weeks
        })
        .to_string()
    }

    fn quiz_json() -> String {
        let questions: Vec<serde_json::Value> = (1..=5)
            .map(|n| {
                serde_json::json!({
                    "question": format!("Question number {}?", n),
                    "options": ["Alpha", "Beta", "Gamma", "Delta"],
                    "correctIndex": 1,
                    "explanation": "Beta is correct."
                })
            })
            .collect();
        serde_json::json!({ "questions": questions }).to_string()
    }
}

#[async_trait]
impl LanguageModelClient for ScriptedLlm {
    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if prompt.contains("multiple-choice questions") {
            return Ok(format!("Here you go!\n```json\n{}\n```", Self::quiz_json()));
        }

        // Mirror the week count the prompt asked for.
        let total_weeks = prompt
            .lines()
            .find(|l| l.starts_with("**Duration:**"))
            .and_then(|l| l.split_whitespace().nth(1))
            .and_then(|n| n.parse().ok())
            .unwrap_or(1);

        Ok(format!(
            "Here is your plan:\n```json\n{}\n```\nEnjoy!",
            Self::roadmap_json(total_weeks)
        ))
    }
}

/// Always-failing model, for asserting that nothing is persisted when
/// generation fails.
struct BrokenLlm;

#[async_trait]
impl LanguageModelClient for BrokenLlm {
    async fn complete(&self, _prompt: &str) -> Result<String, AiError> {
        Ok("I'm sorry, I cannot produce JSON today.".to_string())
    }
}

struct TestApp {
    address: String,
    llm_calls: Arc<AtomicUsize>,
}

/// Spawns the app on a random port against a fresh in-memory database.
async fn spawn_app_with(llm: Arc<dyn LanguageModelClient>, llm_calls: Arc<AtomicUsize>) -> TestApp {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .expect("Invalid sqlite options")
        .foreign_keys(true);

    // A single connection keeps the in-memory database alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .expect("Failed to open in-memory sqlite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        ai_backend: AiBackend::Groq,
        groq_api_key: None,
        gemini_api_key: None,
        perplexity_api_key: None,
        ai_timeout_secs: 5,
    };

    let state = AppState {
        pool,
        config,
        ai: AiClients {
            llm,
            research: Arc::new(NoopResearcher),
        },
    };

    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");

    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp { address, llm_calls }
}

async fn spawn_app() -> TestApp {
    let calls = Arc::new(AtomicUsize::new(0));
    spawn_app_with(
        Arc::new(ScriptedLlm {
            calls: calls.clone(),
        }),
        calls,
    )
    .await
}

/// Registers a fresh user and returns a bearer token.
async fn register_and_login(client: &reqwest::Client, address: &str) -> String {
    let username = format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8]);
    let body = serde_json::json!({
        "username": username,
        "password": "password123"
    });

    let resp = client
        .post(format!("{}/api/auth/register", address))
        .json(&body)
        .send()
        .await
        .expect("Register failed");
    assert_eq!(resp.status().as_u16(), 201);

    let login: serde_json::Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&body)
        .send()
        .await
        .expect("Login failed")
        .json()
        .await
        .expect("Failed to parse login json");

    login["token"].as_str().expect("Token not found").to_string()
}

async fn generate_roadmap(
    client: &reqwest::Client,
    address: &str,
    token: &str,
    total_weeks: i64,
) -> serde_json::Value {
    let resp = client
        .post(format!("{}/api/roadmaps/generate", address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "currentSkills": "I know basic HTML and CSS",
            "targetGoal": "become a React developer",
            "hoursPerWeek": 10,
            "totalWeeks": total_weeks
        }))
        .send()
        .await
        .expect("Generate failed");
    assert_eq!(resp.status().as_u16(), 201);

    let body: serde_json::Value = resp.json().await.unwrap();
    body["roadmap"].clone()
}

#[tokio::test]
async fn health_check_404() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/random_path_that_does_not_exist", app.address))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn register_rejects_short_username() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&serde_json::json!({
            "username": "yo",
            "password": "password123"
        }))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn register_duplicate_username_conflicts() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let body = serde_json::json!({
        "username": "duplicate_user",
        "password": "password123"
    });

    let first = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);

    let second = client
        .post(format!("{}/api/auth/register", app.address))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 409);
}

#[tokio::test]
async fn roadmap_routes_require_auth() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/roadmaps", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status().as_u16(), 401);
}

#[tokio::test]
async fn generates_roadmap_end_to_end() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &app.address).await;

    let roadmap = generate_roadmap(&client, &app.address, &token, 8).await;

    assert_eq!(roadmap["title"], "Scripted Learning Path");
    assert_eq!(roadmap["currentSkills"], "I know basic HTML and CSS");
    let weeks = roadmap["weeks"].as_array().unwrap();
    assert_eq!(weeks.len(), 8);

    // Ordinals are recomputed from array position, never taken from the
    // model (which claimed weekNumber 99 and order 42/7 for everything).
    for (i, week) in weeks.iter().enumerate() {
        assert_eq!(week["weekNumber"].as_i64().unwrap(), i as i64 + 1);
        let topics = week["topics"].as_array().unwrap();
        assert_eq!(topics.len(), 2);
        for (j, topic) in topics.iter().enumerate() {
            assert_eq!(topic["order"].as_i64().unwrap(), j as i64 + 1);
            assert_eq!(topic["isCompleted"], false);
        }
    }

    assert_eq!(app.llm_calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn input_bounds_checked_before_any_ai_call() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &app.address).await;

    for (hours, weeks) in [(0, 8), (10, 53), (61, 8), (10, 0)] {
        let resp = client
            .post(format!("{}/api/roadmaps/generate", app.address))
            .header("Authorization", format!("Bearer {}", token))
            .json(&serde_json::json!({
                "currentSkills": "I know basic HTML and CSS",
                "targetGoal": "become a React developer",
                "hoursPerWeek": hours,
                "totalWeeks": weeks
            }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status().as_u16(), 400);
    }

    assert_eq!(app.llm_calls.load(Ordering::SeqCst), 0);

    // Both extremes of the accepted range pass.
    generate_roadmap(&client, &app.address, &token, 1).await;
    let resp = client
        .post(format!("{}/api/roadmaps/generate", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "currentSkills": "I know basic HTML and CSS",
            "targetGoal": "become a React developer",
            "hoursPerWeek": 60,
            "totalWeeks": 52
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 201);
}

#[tokio::test]
async fn unsalvageable_ai_output_persists_nothing() {
    let calls = Arc::new(AtomicUsize::new(0));
    let app = spawn_app_with(Arc::new(BrokenLlm), calls).await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &app.address).await;

    let resp = client
        .post(format!("{}/api/roadmaps/generate", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "currentSkills": "I know basic HTML and CSS",
            "targetGoal": "become a React developer",
            "hoursPerWeek": 10,
            "totalWeeks": 8
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 502);

    let list: serde_json::Value = client
        .get(format!("{}/api/roadmaps", app.address))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(list["roadmaps"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn quiz_generation_is_idempotent_per_week() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &app.address).await;

    let roadmap = generate_roadmap(&client, &app.address, &token, 1).await;
    let week_id = roadmap["weeks"][0]["id"].as_i64().unwrap();

    let first = client
        .post(format!("{}/api/quiz/generate/{}", app.address, week_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(first.status().as_u16(), 201);
    let first: serde_json::Value = first.json().await.unwrap();
    let quiz_id = first["quiz"]["id"].as_i64().unwrap();
    assert_eq!(first["quiz"]["questions"].as_array().unwrap().len(), 5);

    let second = client
        .post(format!("{}/api/quiz/generate/{}", app.address, week_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(second.status().as_u16(), 200);
    let second: serde_json::Value = second.json().await.unwrap();
    assert_eq!(second["quiz"]["id"].as_i64().unwrap(), quiz_id);

    // Only one generation call reached the model.
    assert_eq!(app.llm_calls.load(Ordering::SeqCst), 2); // 1 roadmap + 1 quiz
}

#[tokio::test]
async fn quiz_submit_score_and_reset_round_trip() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &app.address).await;

    let roadmap = generate_roadmap(&client, &app.address, &token, 1).await;
    let week_id = roadmap["weeks"][0]["id"].as_i64().unwrap();

    let generated: serde_json::Value = client
        .post(format!("{}/api/quiz/generate/{}", app.address, week_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let quiz_id = generated["quiz"]["id"].as_i64().unwrap();
    let questions = generated["quiz"]["questions"].as_array().unwrap().clone();

    // All correct.
    let correct_answers: Vec<serde_json::Value> = questions
        .iter()
        .map(|q| {
            serde_json::json!({
                "questionId": q["id"],
                "selectedIndex": q["correctIndex"]
            })
        })
        .collect();

    let result: serde_json::Value = client
        .post(format!("{}/api/quiz/{}/submit", app.address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "answers": correct_answers }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(result["score"], 100);
    assert_eq!(result["correctCount"], 5);
    assert_eq!(result["totalQuestions"], 5);

    // All wrong (any index other than the correct one), resubmission
    // overwrites the previous attempt.
    let wrong_answers: Vec<serde_json::Value> = questions
        .iter()
        .map(|q| {
            let correct = q["correctIndex"].as_i64().unwrap();
            serde_json::json!({
                "questionId": q["id"],
                "selectedIndex": (correct + 1) % 4
            })
        })
        .collect();

    let result: serde_json::Value = client
        .post(format!("{}/api/quiz/{}/submit", app.address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "answers": wrong_answers }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(result["score"], 0);

    let fetched: serde_json::Value = client
        .get(format!("{}/api/quiz/{}", app.address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["quiz"]["score"], 0);
    for q in fetched["quiz"]["questions"].as_array().unwrap() {
        assert!(!q["userAnswer"].is_null());
    }

    // Reset clears score and answers; questions survive unchanged.
    let reset = client
        .post(format!("{}/api/quiz/{}/reset", app.address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(reset.status().as_u16(), 200);

    let fetched: serde_json::Value = client
        .get(format!("{}/api/quiz/{}", app.address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(fetched["quiz"]["score"].is_null());
    let after_reset = fetched["quiz"]["questions"].as_array().unwrap();
    assert_eq!(after_reset.len(), 5);
    for (before, after) in questions.iter().zip(after_reset) {
        assert_eq!(before["id"], after["id"]);
        assert_eq!(before["question"], after["question"]);
        assert!(after["userAnswer"].is_null());
    }
}

#[tokio::test]
async fn quiz_submit_ignores_unknown_question_ids() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &app.address).await;

    let roadmap = generate_roadmap(&client, &app.address, &token, 1).await;
    let week_id = roadmap["weeks"][0]["id"].as_i64().unwrap();

    let generated: serde_json::Value = client
        .post(format!("{}/api/quiz/generate/{}", app.address, week_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let quiz_id = generated["quiz"]["id"].as_i64().unwrap();
    let first_question = &generated["quiz"]["questions"][0];

    let result: serde_json::Value = client
        .post(format!("{}/api/quiz/{}/submit", app.address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({
            "answers": [
                { "questionId": first_question["id"], "selectedIndex": first_question["correctIndex"] },
                { "questionId": 999999, "selectedIndex": 0 }
            ]
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    // One correct answer out of five questions; the garbage id is ignored.
    assert_eq!(result["correctCount"], 1);
    assert_eq!(result["score"], 20);
    assert_eq!(result["results"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn deleting_roadmap_cascades_to_children() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &app.address).await;

    let roadmap = generate_roadmap(&client, &app.address, &token, 2).await;
    let roadmap_id = roadmap["id"].as_i64().unwrap();
    let week_id = roadmap["weeks"][0]["id"].as_i64().unwrap();

    let generated: serde_json::Value = client
        .post(format!("{}/api/quiz/generate/{}", app.address, week_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let quiz_id = generated["quiz"]["id"].as_i64().unwrap();

    let deleted = client
        .delete(format!("{}/api/roadmaps/{}", app.address, roadmap_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(deleted.status().as_u16(), 200);

    let get_roadmap = client
        .get(format!("{}/api/roadmaps/{}", app.address, roadmap_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(get_roadmap.status().as_u16(), 404);

    let get_quiz = client
        .get(format!("{}/api/quiz/{}", app.address, quiz_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap();
    assert_eq!(get_quiz.status().as_u16(), 404);
}

#[tokio::test]
async fn foreign_resources_read_as_not_found() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let owner = register_and_login(&client, &app.address).await;
    let intruder = register_and_login(&client, &app.address).await;

    let roadmap = generate_roadmap(&client, &app.address, &owner, 1).await;
    let roadmap_id = roadmap["id"].as_i64().unwrap();
    let week_id = roadmap["weeks"][0]["id"].as_i64().unwrap();
    let topic_id = roadmap["weeks"][0]["topics"][0]["id"].as_i64().unwrap();

    let get = client
        .get(format!("{}/api/roadmaps/{}", app.address, roadmap_id))
        .header("Authorization", format!("Bearer {}", intruder))
        .send()
        .await
        .unwrap();
    assert_eq!(get.status().as_u16(), 404);

    let quiz = client
        .post(format!("{}/api/quiz/generate/{}", app.address, week_id))
        .header("Authorization", format!("Bearer {}", intruder))
        .send()
        .await
        .unwrap();
    assert_eq!(quiz.status().as_u16(), 404);

    let patch = client
        .patch(format!("{}/api/roadmaps/topics/{}/complete", app.address, topic_id))
        .header("Authorization", format!("Bearer {}", intruder))
        .json(&serde_json::json!({ "isCompleted": true }))
        .send()
        .await
        .unwrap();
    assert_eq!(patch.status().as_u16(), 404);
}

#[tokio::test]
async fn topic_mutations_persist() {
    let app = spawn_app().await;
    let client = reqwest::Client::new();
    let token = register_and_login(&client, &app.address).await;

    let roadmap = generate_roadmap(&client, &app.address, &token, 1).await;
    let roadmap_id = roadmap["id"].as_i64().unwrap();
    let topic_id = roadmap["weeks"][0]["topics"][0]["id"].as_i64().unwrap();

    let completed: serde_json::Value = client
        .patch(format!("{}/api/roadmaps/topics/{}/complete", app.address, topic_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "isCompleted": true }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(completed["topic"]["isCompleted"], true);
    assert!(!completed["topic"]["completedAt"].is_null());

    client
        .patch(format!("{}/api/roadmaps/topics/{}/notes", app.address, topic_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "notes": "Revisit closures" }))
        .send()
        .await
        .unwrap();

    client
        .patch(format!("{}/api/roadmaps/topics/{}/bookmark", app.address, topic_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "isBookmarked": true }))
        .send()
        .await
        .unwrap();

    let fetched: serde_json::Value = client
        .get(format!("{}/api/roadmaps/{}", app.address, roadmap_id))
        .header("Authorization", format!("Bearer {}", token))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let topic = &fetched["roadmap"]["weeks"][0]["topics"][0];
    assert_eq!(topic["isCompleted"], true);
    assert_eq!(topic["notes"], "Revisit closures");
    assert_eq!(topic["isBookmarked"], true);

    // Unmarking clears the completion timestamp.
    let uncompleted: serde_json::Value = client
        .patch(format!("{}/api/roadmaps/topics/{}/complete", app.address, topic_id))
        .header("Authorization", format!("Bearer {}", token))
        .json(&serde_json::json!({ "isCompleted": false }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(uncompleted["topic"]["isCompleted"], false);
    assert!(uncompleted["topic"]["completedAt"].is_null());
}
