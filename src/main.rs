// src/main.rs

use std::net::SocketAddr;
use std::str::FromStr;
use std::sync::Arc;

use dotenvy::dotenv;
use skillpath::ai::client::{GeminiClient, GroqClient, LanguageModelClient};
use skillpath::ai::research::{NoopResearcher, PerplexityClient, ResearchClient};
use skillpath::config::{AiBackend, Config};
use skillpath::routes;
use skillpath::state::{AiClients, AppState};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // Initialize Database Pool
    let connect_options = SqliteConnectOptions::from_str(&config.database_url)
        .expect("Invalid DATABASE_URL")
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(connect_options)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Database connected...");

    // Run Migrations Automatically
    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Migrations applied successfully.");

    // Wire up the AI collaborators selected by configuration
    let llm: Arc<dyn LanguageModelClient> = match config.ai_backend {
        AiBackend::Groq => {
            let key = config
                .groq_api_key
                .clone()
                .expect("GROQ_API_KEY must be set when AI_BACKEND=groq");
            Arc::new(GroqClient::new(key, config.ai_timeout_secs).expect("Failed to build Groq client"))
        }
        AiBackend::Gemini => {
            let key = config
                .gemini_api_key
                .clone()
                .expect("GEMINI_API_KEY must be set when AI_BACKEND=gemini");
            Arc::new(
                GeminiClient::new(key, config.ai_timeout_secs).expect("Failed to build Gemini client"),
            )
        }
    };

    let research: Arc<dyn ResearchClient> = match config.perplexity_api_key.clone() {
        Some(key) => Arc::new(
            PerplexityClient::new(key, config.ai_timeout_secs)
                .expect("Failed to build Perplexity client"),
        ),
        None => {
            tracing::warn!("PERPLEXITY_API_KEY not set; roadmaps will be generated without research");
            Arc::new(NoopResearcher)
        }
    };

    // Create AppState
    let state = AppState {
        pool,
        config: config.clone(),
        ai: AiClients { llm, research },
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let addr = SocketAddr::from(([0, 0, 0, 0], 3000));
    tracing::info!("skillpath listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();

    // Start the server
    axum::serve(listener, app).await.unwrap();
}
