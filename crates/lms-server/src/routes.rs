//! Router

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{course, educator, health_check, user, webhooks};
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health
        .route("/health", get(health_check))
        // Provider webhooks
        .route("/clerk", post(webhooks::clerk_webhook))
        .route("/stripe", post(webhooks::stripe_webhook))
        // Public catalog
        .route("/api/course/all", get(course::all_courses))
        .route("/api/course/{id}", get(course::course_by_id))
        // Students
        .route("/api/user/data", get(user::user_data))
        .route("/api/user/enrolled-courses", get(user::enrolled_courses))
        .route("/api/user/purchase", post(user::purchase_course))
        .route("/api/user/update-course-progress", post(user::update_course_progress))
        .route("/api/user/get-course-progress", post(user::get_course_progress))
        .route("/api/user/add-rating", post(user::add_rating))
        // Educators
        .route("/api/educator/update-role", get(educator::update_role))
        .route("/api/educator/add-course", post(educator::add_course))
        .route("/api/educator/courses", get(educator::educator_courses))
        .route("/api/educator/dashboard", get(educator::dashboard))
        .route("/api/educator/enrolled-students", get(educator::enrolled_students))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
