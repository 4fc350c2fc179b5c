//! Client Session
//!
//! One explicitly constructed handle per signed-in session. Clones share the
//! same state; pass it to whatever view or task needs it.

use std::collections::HashMap;
use std::sync::Arc;

use lms_core::{Course, CourseId, CourseSummary, ProgressSummary, Role, User};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    is_educator: bool,
    courses: Vec<CourseSummary>,
    enrolled_courses: Vec<Course>,
    progress: HashMap<CourseId, ProgressSummary>,
}

/// Shared per-session client state
#[derive(Clone, Debug, Default)]
pub struct ClientSession {
    state: Arc<RwLock<SessionState>>,
}

impl ClientSession {
    /// Create an empty session
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_user(&self, user: User) {
        let mut state = self.state.write().await;
        state.is_educator = user.role == Role::Educator;
        state.user = Some(user);
    }

    pub async fn user(&self) -> Option<User> {
        self.state.read().await.user.clone()
    }

    pub async fn set_educator(&self, is_educator: bool) {
        self.state.write().await.is_educator = is_educator;
    }

    pub async fn is_educator(&self) -> bool {
        self.state.read().await.is_educator
    }

    pub async fn set_courses(&self, courses: Vec<CourseSummary>) {
        self.state.write().await.courses = courses;
    }

    pub async fn courses(&self) -> Vec<CourseSummary> {
        self.state.read().await.courses.clone()
    }

    /// Store enrolled courses newest first (the server returns them in
    /// enrollment order)
    pub async fn set_enrolled_courses(&self, mut courses: Vec<Course>) {
        courses.reverse();
        self.state.write().await.enrolled_courses = courses;
    }

    pub async fn enrolled_courses(&self) -> Vec<Course> {
        self.state.read().await.enrolled_courses.clone()
    }

    pub async fn is_enrolled(&self, course_id: &CourseId) -> bool {
        self.state
            .read()
            .await
            .enrolled_courses
            .iter()
            .any(|c| &c.id == course_id)
    }

    pub async fn set_progress(&self, progress: ProgressSummary) {
        self.state
            .write()
            .await
            .progress
            .insert(progress.course_id, progress);
    }

    pub async fn progress(&self, course_id: &CourseId) -> Option<ProgressSummary> {
        self.state.read().await.progress.get(course_id).cloned()
    }

    /// Forget everything, e.g. on sign-out
    pub async fn clear(&self) {
        *self.state.write().await = SessionState::default();
    }
}
