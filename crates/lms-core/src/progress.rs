//! Enrollment Progress
//!
//! Per (user, course) set of completed lecture ids. Records are created
//! lazily on first completion and only ever grow.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LmsError, Result};
use crate::ids::{CourseId, LectureId, UserId};
use crate::store::{CourseStore, ProgressStore};

/// A progress document
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseProgress {
    pub user_id: UserId,

    pub course_id: CourseId,

    /// Completed lecture ids, insertion ordered, no duplicates
    pub lecture_completed: Vec<LectureId>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl CourseProgress {
    pub fn new(user_id: UserId, course_id: CourseId) -> Self {
        let now = Utc::now();
        Self {
            user_id,
            course_id,
            lecture_completed: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Record a lecture; returns false if it was already completed
    pub fn complete(&mut self, lecture_id: LectureId) -> bool {
        if self.lecture_completed.contains(&lecture_id) {
            return false;
        }
        self.lecture_completed.push(lecture_id);
        self.updated_at = Utc::now();
        true
    }
}

/// Result of recording a lecture completion
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LectureCompletion {
    /// First completion, persisted
    Recorded,

    /// Already completed; nothing changed
    AlreadyCompleted,
}

impl LectureCompletion {
    pub const fn message(self) -> &'static str {
        match self {
            Self::Recorded => "Progress Updated",
            Self::AlreadyCompleted => "Lecture Already Completed",
        }
    }
}

/// Progress figures for one course
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub course_id: CourseId,

    /// Completed lectures that still exist in the course
    pub completed_count: usize,

    /// Lectures across all chapters at query time
    pub total_lecture_count: usize,

    pub completed_lectures: Vec<LectureId>,
}

impl ProgressSummary {
    /// Whole-number completion percentage
    pub fn percent(&self) -> usize {
        if self.total_lecture_count == 0 {
            return 0;
        }
        self.completed_count * 100 / self.total_lecture_count
    }
}

/// Records and reports lecture completion
pub struct ProgressTracker<S> {
    store: Arc<S>,
}

impl<S> ProgressTracker<S>
where
    S: CourseStore + ProgressStore,
{
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Mark a lecture complete for the user
    pub async fn record_lecture_completion(
        &self,
        user_id: &UserId,
        course_id: &str,
        lecture_id: LectureId,
    ) -> Result<LectureCompletion> {
        let course_id = CourseId::parse(course_id)?;
        if lecture_id.is_blank() {
            return Err(LmsError::InvalidInput("Lecture ID is required".into()));
        }

        let course = self
            .store
            .get_course(&course_id)
            .await?
            .ok_or_else(|| LmsError::NotFound("Course".into()))?;
        if !course.has_lecture(&lecture_id) {
            return Err(LmsError::InvalidInput(format!(
                "Lecture {lecture_id} is not part of this course"
            )));
        }

        let appended = self
            .store
            .add_completed_lecture(user_id, &course_id, lecture_id.clone())
            .await?;

        if appended {
            tracing::info!(
                user_id = %user_id,
                course_id = %course_id,
                lecture_id = %lecture_id,
                "Lecture completed"
            );
            Ok(LectureCompletion::Recorded)
        } else {
            tracing::debug!(
                user_id = %user_id,
                course_id = %course_id,
                lecture_id = %lecture_id,
                "Lecture already completed"
            );
            Ok(LectureCompletion::AlreadyCompleted)
        }
    }

    /// Completed vs total lectures, computed against current course content
    pub async fn get_progress(&self, user_id: &UserId, course_id: &str) -> Result<ProgressSummary> {
        let course_id = CourseId::parse(course_id)?;
        let course = self
            .store
            .get_course(&course_id)
            .await?
            .ok_or_else(|| LmsError::NotFound("Course".into()))?;

        let completed_lectures: Vec<LectureId> = self
            .store
            .get_progress(user_id, &course_id)
            .await?
            .map(|p| p.lecture_completed)
            .unwrap_or_default()
            .into_iter()
            .filter(|id| course.has_lecture(id))
            .collect();

        Ok(ProgressSummary {
            course_id,
            completed_count: completed_lectures.len(),
            total_lecture_count: course.lecture_count(),
            completed_lectures,
        })
    }
}
