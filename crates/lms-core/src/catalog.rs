//! Course Catalog
//!
//! Browsing, authoring and rating of courses.

use std::sync::Arc;

use crate::course::{Course, CourseDraft, CourseSummary};
use crate::error::{LmsError, Result};
use crate::ids::{CourseId, UserId};
use crate::store::{CourseStore, UserStore};

/// Course catalog service
pub struct Catalog<S> {
    store: Arc<S>,
}

impl<S> Catalog<S>
where
    S: CourseStore + UserStore,
{
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Published courses without content or enrollment
    pub async fn published(&self) -> Result<Vec<CourseSummary>> {
        let courses = self.store.published_courses().await?;
        Ok(courses.iter().map(Course::summary).collect())
    }

    /// Course detail with paid lecture URLs blanked
    pub async fn course_detail(&self, course_id: &str) -> Result<Course> {
        let course_id = CourseId::parse(course_id)?;
        self.store
            .get_course(&course_id)
            .await?
            .map(Course::public_view)
            .ok_or_else(|| LmsError::NotFound("Course".into()))
    }

    /// Validate and store a new published course
    pub async fn add_course(&self, educator: &UserId, draft: CourseDraft) -> Result<Course> {
        let course = draft.into_course(educator.clone())?;
        self.store.save_course(&course).await?;

        tracing::info!(
            course_id = %course.id,
            educator = %educator,
            lectures = course.lecture_count(),
            "Course added"
        );
        Ok(course)
    }

    pub async fn educator_courses(&self, educator: &UserId) -> Result<Vec<Course>> {
        self.store.courses_by_educator(educator).await
    }

    /// Full course documents the user is enrolled in
    pub async fn enrolled_courses(&self, user_id: &UserId) -> Result<Vec<Course>> {
        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| LmsError::NotFound("User".into()))?;
        self.store.courses_by_ids(&user.enrolled_courses).await
    }

    /// Add or replace the user's rating and persist the course
    pub async fn add_rating(&self, user_id: &UserId, course_id: &str, rating: u8) -> Result<Course> {
        let course_id = CourseId::parse(course_id)?;
        if self.store.get_course(&course_id).await?.is_none() {
            return Err(LmsError::NotFound("Course".into()));
        }

        let enrolled = self
            .store
            .get_user(user_id)
            .await?
            .is_some_and(|u| u.is_enrolled(&course_id));
        if !enrolled {
            tracing::warn!(user_id = %user_id, course_id = %course_id, "Rating from non-enrolled user");
            return Err(LmsError::Forbidden("User has not purchased this course".into()));
        }

        let course = self
            .store
            .rate_course(&course_id, user_id.clone(), rating)
            .await?
            .ok_or_else(|| LmsError::NotFound("Course".into()))?;

        tracing::info!(user_id = %user_id, course_id = %course_id, rating, "Rating added");
        Ok(course)
    }
}
