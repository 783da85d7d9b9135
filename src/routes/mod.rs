// ============================================================================
// Axum Routes Module
// ============================================================================
//
// Structure:
// - mod.rs: Main router assembly and middleware
// - health.rs: Health check endpoint
// - extractors.rs: Bearer-token extractors
// - middleware.rs: Request logging and CORS
//
// Route handlers live with their services (auth_service, image_service,
// user_service).
//
// ============================================================================

pub mod extractors;
mod health;
pub mod middleware;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

use crate::auth_service::handlers as auth;
use crate::context::AppContext;
use crate::image_service::handlers as images;
use crate::user_service::handlers as users;

/// Create the main application router with all routes
pub fn create_router(app_context: Arc<AppContext>) -> Router {
    let max_upload_size = app_context.config.analysis.max_upload_size;
    let cors = middleware::cors_layer(&app_context.config);

    Router::new()
        // Health
        .route("/health", get(health::health_check))
        // Authentication
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // Images
        .route("/api/images", get(images::all_images))
        .route("/api/images/upload", post(images::upload_image))
        .route(
            "/api/images/steganography",
            post(images::add_steganography).get(images::steganography_images),
        )
        .route("/api/images/verify", post(images::verify_image))
        .route("/api/images/my-images", get(images::my_images))
        .route("/api/images/ai-detected", get(images::ai_detected_images))
        .route("/api/images/test-flask", get(images::test_flask))
        .route("/api/images/flask-status", get(images::flask_status))
        .route(
            "/api/images/:id",
            get(images::get_image).delete(images::delete_image),
        )
        // Users
        .route("/api/users", get(users::list_users).post(users::create_user))
        .route(
            "/api/users/:id",
            get(users::get_user).delete(users::delete_user),
        )
        .layer(DefaultBodyLimit::max(max_upload_size))
        // Apply middleware (order matters - last added runs first)
        .layer(
            ServiceBuilder::new()
                // Tracing layer (outermost - runs first)
                .layer(TraceLayer::new_for_http())
                // Request logging
                .layer(axum::middleware::from_fn(middleware::request_logging))
                .layer(cors)
                .into_inner(),
        )
        .with_state(app_context)
}
