// src/routes.rs

use axum::{
    Router,
    http::Method,
    middleware,
    routing::{get, patch, post},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{auth, quiz, roadmap, topic},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, roadmaps, quiz).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, AI clients).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let auth_routes = Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login));

    let roadmap_routes = Router::new()
        .route("/generate", post(roadmap::generate))
        .route("/", get(roadmap::list))
        .route("/{id}", get(roadmap::get).delete(roadmap::delete))
        .route("/topics/{id}/complete", patch(topic::set_completion))
        .route("/topics/{id}/notes", patch(topic::set_notes))
        .route("/topics/{id}/bookmark", patch(topic::set_bookmark))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let quiz_routes = Router::new()
        .route("/generate/{week_id}", post(quiz::generate))
        .route("/{quiz_id}", get(quiz::get))
        .route("/{quiz_id}/submit", post(quiz::submit))
        .route("/{quiz_id}/reset", post(quiz::reset))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/roadmaps", roadmap_routes)
        .nest("/api/quiz", quiz_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
