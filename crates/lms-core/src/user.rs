//! User Records
//!
//! Users are created, updated and deleted only by identity-provider lifecycle
//! events. Enrollment is appended by purchase reconciliation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{CourseId, UserId};

/// Account role, stored in the identity provider's public metadata
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Educator,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Educator => "educator",
        }
    }

    /// Lenient parse; anything other than "educator" is a student
    pub fn from_metadata(value: Option<&str>) -> Self {
        match value.map(str::to_ascii_lowercase).as_deref() {
            Some("educator") => Self::Educator,
            _ => Self::Student,
        }
    }
}

/// Profile fields supplied by the identity provider
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub email: String,
    pub name: String,
    pub image_url: String,
    pub role: Role,
}

/// A user document
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// External id from the identity provider
    pub id: UserId,

    pub email: String,

    /// Display name
    pub name: String,

    /// Avatar reference
    pub image_url: String,

    pub role: Role,

    /// Courses this user has completed a purchase for
    pub enrolled_courses: Vec<CourseId>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Create a user from an identity-provider profile
    pub fn new(id: UserId, profile: UserProfile) -> Self {
        let now = Utc::now();
        Self {
            id,
            email: profile.email,
            name: profile.name,
            image_url: profile.image_url,
            role: profile.role,
            enrolled_courses: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace profile fields, keeping enrollment intact
    pub fn apply_profile(&mut self, profile: UserProfile) {
        self.email = profile.email;
        self.name = profile.name;
        self.image_url = profile.image_url;
        self.role = profile.role;
        self.updated_at = Utc::now();
    }

    pub fn is_enrolled(&self, course_id: &CourseId) -> bool {
        self.enrolled_courses.contains(course_id)
    }

    /// Add a course reference; returns false when already present
    pub fn enroll(&mut self, course_id: CourseId) -> bool {
        if self.is_enrolled(&course_id) {
            return false;
        }
        self.enrolled_courses.push(course_id);
        self.updated_at = Utc::now();
        true
    }

    /// Public projection used in educator views
    pub fn card(&self) -> StudentCard {
        StudentCard {
            id: self.id.clone(),
            name: self.name.clone(),
            image_url: self.image_url.clone(),
        }
    }
}

/// Minimal student view (`name imageUrl`)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentCard {
    pub id: UserId,
    pub name: String,
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile() -> UserProfile {
        UserProfile {
            email: "ada@example.com".into(),
            name: "Ada Lovelace".into(),
            image_url: "https://img.example.com/ada.png".into(),
            role: Role::Student,
        }
    }

    #[test]
    fn test_enroll_is_idempotent() {
        let mut user = User::new(UserId::new("user_1"), profile());
        let course = CourseId::generate();

        assert!(user.enroll(course));
        assert!(!user.enroll(course));
        assert_eq!(user.enrolled_courses.len(), 1);
    }

    #[test]
    fn test_profile_update_keeps_enrollment() {
        let mut user = User::new(UserId::new("user_1"), profile());
        let course = CourseId::generate();
        user.enroll(course);

        let mut updated = profile();
        updated.name = "Ada King".into();
        updated.role = Role::Educator;
        user.apply_profile(updated);

        assert_eq!(user.name, "Ada King");
        assert_eq!(user.role, Role::Educator);
        assert!(user.is_enrolled(&course));
    }

    #[test]
    fn test_role_from_metadata() {
        assert_eq!(Role::from_metadata(Some("Educator")), Role::Educator);
        assert_eq!(Role::from_metadata(Some("admin")), Role::Student);
        assert_eq!(Role::from_metadata(None), Role::Student);
    }

    #[test]
    fn test_user_serializes_camel_case() {
        let user = User::new(UserId::new("user_1"), profile());
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("enrolledCourses").is_some());
        assert!(json.get("imageUrl").is_some());
    }
}
