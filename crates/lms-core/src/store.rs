//! Document Store
//!
//! One trait per collection. Every method is a single-document operation;
//! conditional writes (`add_*`, `transition_purchase`) check and mutate under
//! one lock so redelivered callbacks converge without application locks.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::course::Course;
use crate::error::Result;
use crate::ids::{CourseId, LectureId, PurchaseId, UserId};
use crate::progress::CourseProgress;
use crate::purchase::{Purchase, PurchaseStatus};
use crate::user::{User, UserProfile};

/// User collection
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user(&self, id: &UserId) -> Result<Option<User>>;

    /// Insert or replace
    async fn save_user(&self, user: &User) -> Result<()>;

    /// Returns whether a record was removed
    async fn delete_user(&self, id: &UserId) -> Result<bool>;

    async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>>;

    /// Append `course_id` to the user's enrolled courses unless present.
    /// Returns `Ok(None)` when the user does not exist, otherwise whether the
    /// reference was appended.
    async fn add_enrolled_course(&self, id: &UserId, course_id: CourseId) -> Result<Option<bool>>;

    /// Apply identity-provider profile fields in place, inserting a fresh
    /// record when absent. Enrollment is never touched. Returns true when
    /// the record was created.
    async fn upsert_profile(&self, id: &UserId, profile: UserProfile) -> Result<bool>;
}

/// Course collection
#[async_trait]
pub trait CourseStore: Send + Sync {
    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>>;

    /// Insert or replace
    async fn save_course(&self, course: &Course) -> Result<()>;

    async fn published_courses(&self) -> Result<Vec<Course>>;

    async fn courses_by_educator(&self, educator: &UserId) -> Result<Vec<Course>>;

    async fn courses_by_ids(&self, ids: &[CourseId]) -> Result<Vec<Course>>;

    /// Append `user_id` to the course's enrolled students unless present.
    /// Same return contract as [`UserStore::add_enrolled_course`].
    async fn add_enrolled_student(&self, id: &CourseId, user_id: UserId) -> Result<Option<bool>>;

    /// Insert or replace one user's rating in place. Returns the updated
    /// course, or `None` when it does not exist.
    async fn rate_course(&self, id: &CourseId, user_id: UserId, rating: u8) -> Result<Option<Course>>;
}

/// Purchase collection
#[async_trait]
pub trait PurchaseStore: Send + Sync {
    async fn get_purchase(&self, id: &PurchaseId) -> Result<Option<Purchase>>;

    /// Insert or replace
    async fn save_purchase(&self, purchase: &Purchase) -> Result<()>;

    async fn find_completed_purchase(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Purchase>>;

    async fn completed_purchases_for_courses(&self, course_ids: &[CourseId]) -> Result<Vec<Purchase>>;

    /// Move a pending purchase to `status`. Returns the updated document, or
    /// `None` when the purchase is absent or already terminal.
    async fn transition_purchase(
        &self,
        id: &PurchaseId,
        status: PurchaseStatus,
    ) -> Result<Option<Purchase>>;
}

/// Course progress collection
#[async_trait]
pub trait ProgressStore: Send + Sync {
    async fn get_progress(&self, user_id: &UserId, course_id: &CourseId) -> Result<Option<CourseProgress>>;

    /// Append a lecture, creating the record on first use. Returns false
    /// when the lecture was already recorded.
    async fn add_completed_lecture(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        lecture_id: LectureId,
    ) -> Result<bool>;
}

/// Every collection the services need
pub trait DocumentStore: UserStore + CourseStore + PurchaseStore + ProgressStore {}

impl<T> DocumentStore for T where T: UserStore + CourseStore + PurchaseStore + ProgressStore {}

/// In-memory document store (for development/testing)
pub struct MemoryStore {
    users: RwLock<HashMap<UserId, User>>,
    courses: RwLock<HashMap<CourseId, Course>>,
    purchases: RwLock<HashMap<PurchaseId, Purchase>>,
    progress: RwLock<HashMap<(UserId, CourseId), CourseProgress>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            courses: RwLock::new(HashMap::new()),
            purchases: RwLock::new(HashMap::new()),
            progress: RwLock::new(HashMap::new()),
        }
    }

    /// Number of purchase documents, for assertions
    pub async fn purchase_count(&self) -> usize {
        self.purchases.read().await.len()
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn get_user(&self, id: &UserId) -> Result<Option<User>> {
        Ok(self.users.read().await.get(id).cloned())
    }

    async fn save_user(&self, user: &User) -> Result<()> {
        self.users.write().await.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn delete_user(&self, id: &UserId) -> Result<bool> {
        Ok(self.users.write().await.remove(id).is_some())
    }

    async fn users_by_ids(&self, ids: &[UserId]) -> Result<Vec<User>> {
        let users = self.users.read().await;
        Ok(ids.iter().filter_map(|id| users.get(id).cloned()).collect())
    }

    async fn add_enrolled_course(&self, id: &UserId, course_id: CourseId) -> Result<Option<bool>> {
        let mut users = self.users.write().await;
        Ok(users.get_mut(id).map(|user| user.enroll(course_id)))
    }

    async fn upsert_profile(&self, id: &UserId, profile: UserProfile) -> Result<bool> {
        let mut users = self.users.write().await;
        if let Some(user) = users.get_mut(id) {
            user.apply_profile(profile);
            return Ok(false);
        }
        users.insert(id.clone(), User::new(id.clone(), profile));
        Ok(true)
    }
}

#[async_trait]
impl CourseStore for MemoryStore {
    async fn get_course(&self, id: &CourseId) -> Result<Option<Course>> {
        Ok(self.courses.read().await.get(id).cloned())
    }

    async fn save_course(&self, course: &Course) -> Result<()> {
        self.courses.write().await.insert(course.id, course.clone());
        Ok(())
    }

    async fn published_courses(&self) -> Result<Vec<Course>> {
        let courses = self.courses.read().await;
        let mut result: Vec<_> = courses.values().filter(|c| c.is_published).cloned().collect();
        result.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(result)
    }

    async fn courses_by_educator(&self, educator: &UserId) -> Result<Vec<Course>> {
        let courses = self.courses.read().await;
        let mut result: Vec<_> = courses
            .values()
            .filter(|c| &c.educator == educator)
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    async fn courses_by_ids(&self, ids: &[CourseId]) -> Result<Vec<Course>> {
        let courses = self.courses.read().await;
        Ok(ids.iter().filter_map(|id| courses.get(id).cloned()).collect())
    }

    async fn add_enrolled_student(&self, id: &CourseId, user_id: UserId) -> Result<Option<bool>> {
        let mut courses = self.courses.write().await;
        Ok(courses.get_mut(id).map(|course| course.enroll(user_id)))
    }

    async fn rate_course(&self, id: &CourseId, user_id: UserId, rating: u8) -> Result<Option<Course>> {
        let mut courses = self.courses.write().await;
        let Some(course) = courses.get_mut(id) else {
            return Ok(None);
        };
        course.rate(user_id, rating)?;
        Ok(Some(course.clone()))
    }
}

#[async_trait]
impl PurchaseStore for MemoryStore {
    async fn get_purchase(&self, id: &PurchaseId) -> Result<Option<Purchase>> {
        Ok(self.purchases.read().await.get(id).cloned())
    }

    async fn save_purchase(&self, purchase: &Purchase) -> Result<()> {
        self.purchases.write().await.insert(purchase.id, purchase.clone());
        Ok(())
    }

    async fn find_completed_purchase(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
    ) -> Result<Option<Purchase>> {
        let purchases = self.purchases.read().await;
        Ok(purchases
            .values()
            .find(|p| {
                &p.user_id == user_id
                    && &p.course_id == course_id
                    && p.status == PurchaseStatus::Completed
            })
            .cloned())
    }

    async fn completed_purchases_for_courses(&self, course_ids: &[CourseId]) -> Result<Vec<Purchase>> {
        let purchases = self.purchases.read().await;
        let mut result: Vec<_> = purchases
            .values()
            .filter(|p| p.status == PurchaseStatus::Completed && course_ids.contains(&p.course_id))
            .cloned()
            .collect();
        result.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(result)
    }

    async fn transition_purchase(
        &self,
        id: &PurchaseId,
        status: PurchaseStatus,
    ) -> Result<Option<Purchase>> {
        let mut purchases = self.purchases.write().await;
        let Some(purchase) = purchases.get_mut(id) else {
            return Ok(None);
        };
        if purchase.status.is_terminal() {
            return Ok(None);
        }
        purchase.status = status;
        purchase.updated_at = chrono::Utc::now();
        Ok(Some(purchase.clone()))
    }
}

#[async_trait]
impl ProgressStore for MemoryStore {
    async fn get_progress(&self, user_id: &UserId, course_id: &CourseId) -> Result<Option<CourseProgress>> {
        let progress = self.progress.read().await;
        Ok(progress.get(&(user_id.clone(), *course_id)).cloned())
    }

    async fn add_completed_lecture(
        &self,
        user_id: &UserId,
        course_id: &CourseId,
        lecture_id: LectureId,
    ) -> Result<bool> {
        let mut progress = self.progress.write().await;
        let record = progress
            .entry((user_id.clone(), *course_id))
            .or_insert_with(|| CourseProgress::new(user_id.clone(), *course_id));
        Ok(record.complete(lecture_id))
    }
}
