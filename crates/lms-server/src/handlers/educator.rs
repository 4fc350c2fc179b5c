//! Educator Handlers

use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
};
use lms_core::{Course, CourseDraft, DashboardData, Role, StudentPurchase};
use serde::Serialize;

use super::{MessageBody, Success, success};
use crate::auth::{AuthUser, Educator};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct AddedCourseBody {
    pub message: &'static str,
    pub course: Course,
}

#[derive(Debug, Serialize)]
pub struct CoursesBody {
    pub courses: Vec<Course>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardBody {
    pub dashboard_data: DashboardData,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledStudentsBody {
    pub enrolled_students: Vec<StudentPurchase>,
}

/// Promote the caller to educator in the identity provider
pub async fn update_role(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Success<MessageBody>>, ApiError> {
    state.identity()?.set_role(&user_id, Role::Educator).await?;
    Ok(success(MessageBody {
        message: "You can publish a course now",
    }))
}

/// Validate and publish a new course owned by the caller
pub async fn add_course(
    State(state): State<AppState>,
    Educator(educator): Educator,
    payload: Result<Json<CourseDraft>, JsonRejection>,
) -> Result<Json<Success<AddedCourseBody>>, ApiError> {
    let Json(draft) = payload?;
    let course = state.catalog().add_course(&educator, draft).await?;
    Ok(success(AddedCourseBody {
        message: "Course Added",
        course,
    }))
}

/// Courses owned by the caller
pub async fn educator_courses(
    State(state): State<AppState>,
    Educator(educator): Educator,
) -> Result<Json<Success<CoursesBody>>, ApiError> {
    let courses = state.catalog().educator_courses(&educator).await?;
    Ok(success(CoursesBody { courses }))
}

/// Earnings, enrolled students and course count
pub async fn dashboard(
    State(state): State<AppState>,
    Educator(educator): Educator,
) -> Result<Json<Success<DashboardBody>>, ApiError> {
    let dashboard_data = state.dashboard().dashboard(&educator).await?;
    Ok(success(DashboardBody { dashboard_data }))
}

/// One entry per completed purchase of the caller's courses
pub async fn enrolled_students(
    State(state): State<AppState>,
    Educator(educator): Educator,
) -> Result<Json<Success<EnrolledStudentsBody>>, ApiError> {
    let enrolled_students = state.dashboard().enrolled_students(&educator).await?;
    Ok(success(EnrolledStudentsBody { enrolled_students }))
}
