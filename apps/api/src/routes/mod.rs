pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::review::handlers as review;
use crate::review::handlers::MAX_UPLOAD_BYTES;
use crate::state::AppState;
use crate::uploads::handlers as uploads;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Write path
        .route(
            "/api/uploads",
            post(review::handle_upload).get(uploads::handle_list_uploads),
        )
        .route("/api/review", post(review::handle_review))
        .route(
            "/api/anonymous-review",
            post(review::handle_anonymous_review),
        )
        // Read path
        .route("/api/uploads/stats", get(uploads::handle_upload_stats))
        .route("/api/uploads/:id", get(uploads::handle_get_upload))
        .route("/api/admin/uploads", get(uploads::handle_admin_list_uploads))
        // Upload cap plus multipart envelope headroom
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024))
        .with_state(state)
}
