//! Student Handlers

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::{HeaderMap, header::ORIGIN},
};
use lms_core::{Course, LectureId, LmsError, ProgressSummary, User};
use lms_payments::CheckoutStarted;
use serde::{Deserialize, Serialize};

use super::{MessageBody, Success, success};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRequest {
    pub course_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressRequest {
    pub course_id: String,
    pub lecture_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RatingRequest {
    pub course_id: String,
    pub rating: i64,
}

#[derive(Debug, Serialize)]
pub struct UserBody {
    pub user: User,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledCoursesBody {
    pub enrolled_courses: Vec<Course>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressBody {
    pub progress_data: ProgressSummary,
}

/// Current user's record
pub async fn user_data(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Success<UserBody>>, ApiError> {
    let user = state.user(&user_id).await?;
    Ok(success(UserBody { user }))
}

/// Full documents of the courses the user is enrolled in
pub async fn enrolled_courses(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Success<EnrolledCoursesBody>>, ApiError> {
    let enrolled_courses = state.catalog().enrolled_courses(&user_id).await?;
    Ok(success(EnrolledCoursesBody { enrolled_courses }))
}

/// Create a pending purchase and return the hosted checkout URL
pub async fn purchase_course(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    headers: HeaderMap,
    payload: Result<Json<CourseRequest>, JsonRejection>,
) -> Result<Json<Success<CheckoutStarted>>, ApiError> {
    let Json(request) = payload?;
    let origin = headers
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|o| !o.is_empty() && *o != "null")
        .unwrap_or(state.config.frontend_origin.as_str());

    let started = state
        .reconciler()?
        .initiate_purchase(&user_id, &request.course_id, origin)
        .await?;
    Ok(success(started))
}

/// Mark a lecture completed
pub async fn update_course_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<ProgressRequest>, JsonRejection>,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    let Json(request) = payload?;
    let outcome = state
        .progress()
        .record_lecture_completion(&user_id, &request.course_id, LectureId::new(request.lecture_id))
        .await?;
    Ok(success(MessageBody {
        message: outcome.message(),
    }))
}

/// Completed vs total lectures for one course
pub async fn get_course_progress(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<CourseRequest>, JsonRejection>,
) -> Result<Json<Success<ProgressBody>>, ApiError> {
    let Json(request) = payload?;
    let progress_data = state.progress().get_progress(&user_id, &request.course_id).await?;
    Ok(success(ProgressBody { progress_data }))
}

/// Add or replace the user's rating of a course they own
pub async fn add_rating(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    payload: Result<Json<RatingRequest>, JsonRejection>,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    let Json(request) = payload?;
    let rating = u8::try_from(request.rating)
        .map_err(|_| LmsError::InvalidInput("Rating must be between 1 and 5".into()))?;

    state.catalog().add_rating(&user_id, &request.course_id, rating).await?;
    Ok(success(MessageBody { message: "Rating added" }))
}
