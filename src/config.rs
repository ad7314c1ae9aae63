// src/config.rs

use dotenvy::dotenv;
use std::env;

/// Which language-model backend the Generation Collaborator talks to.
/// Selected once at process start; pipeline code never branches on it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AiBackend {
    Groq,
    Gemini,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,

    pub ai_backend: AiBackend,
    pub groq_api_key: Option<String>,
    pub gemini_api_key: Option<String>,
    pub perplexity_api_key: Option<String>,
    /// Upper bound on every outbound AI call, in seconds.
    pub ai_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86400);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let ai_backend = match env::var("AI_BACKEND").as_deref() {
            Ok("gemini") => AiBackend::Gemini,
            _ => AiBackend::Groq,
        };

        let groq_api_key = env::var("GROQ_API_KEY").ok();
        let gemini_api_key = env::var("GEMINI_API_KEY").ok();
        let perplexity_api_key = env::var("PERPLEXITY_API_KEY").ok();

        let ai_timeout_secs = env::var("AI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(60);

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            ai_backend,
            groq_api_key,
            gemini_api_key,
            perplexity_api_key,
            ai_timeout_secs,
        }
    }
}
