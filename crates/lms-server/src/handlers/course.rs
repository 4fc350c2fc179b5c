//! Public Catalog Handlers

use axum::{
    Json,
    extract::{Path, State},
};
use lms_core::{Course, CourseSummary};
use serde::Serialize;

use super::{Success, success};
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CoursesBody {
    pub courses: Vec<CourseSummary>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDataBody {
    pub course_data: Course,
}

/// Published courses, newest first
pub async fn all_courses(
    State(state): State<AppState>,
) -> Result<Json<Success<CoursesBody>>, ApiError> {
    let courses = state.catalog().published().await?;
    Ok(success(CoursesBody { courses }))
}

/// One course with paid lecture URLs blanked
pub async fn course_by_id(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Success<CourseDataBody>>, ApiError> {
    let course_data = state.catalog().course_detail(&id).await?;
    Ok(success(CourseDataBody { course_data }))
}
