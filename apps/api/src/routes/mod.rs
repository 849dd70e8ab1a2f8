pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::analysis::handlers::handle_analyze_assignment;
use crate::announcements::handlers as announcements;
use crate::catalog::handlers as catalog;
use crate::chat::handlers::handle_chat;
use crate::state::AppState;
use crate::submissions::handlers as submissions;

/// Syllabus and submission uploads and large batches exceed axum's 2 MB default.
const MAX_BODY_BYTES: usize = 20 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Analyzer
        .route("/api/analyze-assignment", post(handle_analyze_assignment))
        // Chat assistant
        .route("/api/chat", post(handle_chat))
        // Catalog
        .route(
            "/api/courses",
            get(catalog::handle_list_courses)
                .post(catalog::handle_create_course)
                .delete(catalog::handle_delete_course),
        )
        .route("/api/courses/:id", get(catalog::handle_get_course))
        .route(
            "/api/assignments",
            get(catalog::handle_list_assignments).post(catalog::handle_create_assignment),
        )
        .route(
            "/api/rubrics",
            get(catalog::handle_list_rubrics).post(catalog::handle_create_rubrics),
        )
        .route("/api/students", get(catalog::handle_list_students))
        // Submissions
        .route("/api/submissions", get(submissions::handle_list_submissions))
        .route(
            "/api/submissions/upload",
            post(submissions::handle_upload_submission),
        )
        .route(
            "/api/submissions/file",
            get(submissions::handle_get_submission_file),
        )
        // Announcements
        .route(
            "/api/announcements",
            get(announcements::handle_list_announcements)
                .post(announcements::handle_create_announcement),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
