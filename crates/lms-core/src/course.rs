//! Course Documents
//!
//! Courses are created by the educator authoring flow. Purchase
//! reconciliation only ever appends to `enrolled_students`.
//! Prices use `rust_decimal`; never f64 for money.

use chrono::{DateTime, Utc};
use rust_decimal::{Decimal, RoundingStrategy};
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::{LmsError, Result};
use crate::ids::{CourseId, LectureId, UserId};

/// Lowest accepted rating
pub const MIN_RATING: u8 = 1;

/// Highest accepted rating
pub const MAX_RATING: u8 = 5;

/// Highest accepted course price
pub const MAX_COURSE_PRICE: Decimal = dec!(1000000);

/// A single playable lecture
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lecture {
    pub lecture_id: LectureId,

    pub lecture_title: String,

    /// Duration in minutes
    pub lecture_duration: u32,

    /// Playable resource reference; blanked in public views unless free preview
    pub lecture_url: String,

    #[serde(default)]
    pub is_preview_free: bool,

    pub lecture_order: u32,
}

/// An ordered group of lectures
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub chapter_id: String,

    pub chapter_order: u32,

    pub chapter_title: String,

    #[serde(default)]
    pub chapter_content: Vec<Lecture>,
}

impl Chapter {
    /// Sum of lecture durations in minutes
    pub fn duration_minutes(&self) -> u64 {
        self.chapter_content
            .iter()
            .map(|l| u64::from(l.lecture_duration))
            .sum()
    }
}

/// One user's rating; at most one per user
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseRating {
    pub user_id: UserId,
    pub rating: u8,
}

/// Derived course figures, always computed from current content
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseAggregates {
    /// Floor of the mean rating; 0 means "no rating yet"
    pub rating_average: u8,

    pub rating_count: usize,

    /// Total duration in minutes
    pub total_duration: u64,

    pub lecture_count: usize,
}

/// Compute rating average, total duration and lecture count
pub fn compute_course_aggregates(course: &Course) -> CourseAggregates {
    CourseAggregates {
        rating_average: course.rating_average(),
        rating_count: course.course_ratings.len(),
        total_duration: course.total_duration_minutes(),
        lecture_count: course.lecture_count(),
    }
}

/// Charge for a course: `price × (1 − discount/100)`, rounded to cents
pub fn purchase_amount(price: Decimal, discount: u8) -> Decimal {
    let factor = Decimal::ONE - Decimal::from(discount) / dec!(100);
    (price * factor).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// A course document
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: CourseId,

    pub course_title: String,

    pub course_description: String,

    /// Already-uploaded thumbnail URL
    #[serde(default)]
    pub course_thumbnail: Option<String>,

    pub course_price: Decimal,

    /// Discount percent, 0..=100
    pub discount: u8,

    pub course_content: Vec<Chapter>,

    pub is_published: bool,

    /// Owning educator
    pub educator: UserId,

    pub enrolled_students: Vec<UserId>,

    pub course_ratings: Vec<CourseRating>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Course {
    /// Amount a purchase created now would be charged
    pub fn purchase_amount(&self) -> Decimal {
        purchase_amount(self.course_price, self.discount)
    }

    /// Total number of lectures across all chapters
    pub fn lecture_count(&self) -> usize {
        self.course_content
            .iter()
            .map(|c| c.chapter_content.len())
            .sum()
    }

    /// Total duration in minutes across all chapters
    pub fn total_duration_minutes(&self) -> u64 {
        self.course_content.iter().map(Chapter::duration_minutes).sum()
    }

    /// Floor of the mean of all ratings, or 0 without ratings
    pub fn rating_average(&self) -> u8 {
        if self.course_ratings.is_empty() {
            return 0;
        }
        let total: u64 = self
            .course_ratings
            .iter()
            .map(|r| u64::from(r.rating))
            .sum();
        let count = u64::try_from(self.course_ratings.len()).unwrap_or(u64::MAX);
        // Mean of u8 values always fits in u8; integer division floors.
        u8::try_from(total / count).unwrap_or(u8::MAX)
    }

    pub fn aggregates(&self) -> CourseAggregates {
        compute_course_aggregates(self)
    }

    pub fn has_lecture(&self, lecture_id: &LectureId) -> bool {
        self.lectures().any(|l| &l.lecture_id == lecture_id)
    }

    /// Iterate lectures in chapter order as stored
    pub fn lectures(&self) -> impl Iterator<Item = &Lecture> {
        self.course_content.iter().flat_map(|c| c.chapter_content.iter())
    }

    pub fn is_enrolled(&self, user_id: &UserId) -> bool {
        self.enrolled_students.contains(user_id)
    }

    /// Add a student reference; returns false when already present
    pub fn enroll(&mut self, user_id: UserId) -> bool {
        if self.is_enrolled(&user_id) {
            return false;
        }
        self.enrolled_students.push(user_id);
        self.updated_at = Utc::now();
        true
    }

    /// Insert or replace the caller's rating (last write wins)
    pub fn rate(&mut self, user_id: UserId, rating: u8) -> Result<()> {
        if !(MIN_RATING..=MAX_RATING).contains(&rating) {
            return Err(LmsError::InvalidInput(format!(
                "Rating must be between {MIN_RATING} and {MAX_RATING}"
            )));
        }

        match self.course_ratings.iter_mut().find(|r| r.user_id == user_id) {
            Some(existing) => existing.rating = rating,
            None => self.course_ratings.push(CourseRating { user_id, rating }),
        }
        self.updated_at = Utc::now();
        Ok(())
    }

    /// Public view: paid lecture URLs blanked
    pub fn public_view(mut self) -> Self {
        for lecture in self
            .course_content
            .iter_mut()
            .flat_map(|c| c.chapter_content.iter_mut())
        {
            if !lecture.is_preview_free {
                lecture.lecture_url.clear();
            }
        }
        self
    }

    /// Catalog listing entry without content or enrollment
    pub fn summary(&self) -> CourseSummary {
        CourseSummary {
            id: self.id,
            course_title: self.course_title.clone(),
            course_description: self.course_description.clone(),
            course_thumbnail: self.course_thumbnail.clone(),
            course_price: self.course_price,
            discount: self.discount,
            educator: self.educator.clone(),
            course_ratings: self.course_ratings.clone(),
            aggregates: self.aggregates(),
        }
    }
}

/// Catalog entry (`-courseContent -enrolledStudents`)
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseSummary {
    pub id: CourseId,
    pub course_title: String,
    pub course_description: String,
    pub course_thumbnail: Option<String>,
    pub course_price: Decimal,
    pub discount: u8,
    pub educator: UserId,
    pub course_ratings: Vec<CourseRating>,
    #[serde(flatten)]
    pub aggregates: CourseAggregates,
}

/// Course payload submitted by an educator
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDraft {
    pub course_title: String,

    #[serde(default)]
    pub course_description: String,

    #[serde(default)]
    pub course_thumbnail: Option<String>,

    pub course_price: Decimal,

    #[serde(default)]
    pub discount: u8,

    pub course_content: Vec<Chapter>,
}

impl CourseDraft {
    /// Validate and turn into a published course owned by `educator`
    pub fn into_course(self, educator: UserId) -> Result<Course> {
        self.validate()?;

        let now = Utc::now();
        Ok(Course {
            id: CourseId::generate(),
            course_title: self.course_title.trim().to_string(),
            course_description: self.course_description,
            course_thumbnail: self.course_thumbnail,
            course_price: self.course_price,
            discount: self.discount,
            course_content: self.course_content,
            is_published: true,
            educator,
            enrolled_students: Vec::new(),
            course_ratings: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    fn validate(&self) -> Result<()> {
        let invalid = |msg: &str| -> Result<()> { Err(LmsError::InvalidInput(msg.to_string())) };

        if self.course_title.trim().is_empty() {
            return invalid("Course title is required");
        }
        if self.course_price < Decimal::ZERO {
            return invalid("Course price cannot be negative");
        }
        if self.course_price > MAX_COURSE_PRICE {
            return invalid("Course price is too high");
        }
        if self.discount > 100 {
            return invalid("Discount must be between 0 and 100");
        }
        if self.course_content.is_empty() {
            return invalid("Invalid course content");
        }

        for chapter in &self.course_content {
            if chapter.chapter_content.is_empty() {
                return invalid("Invalid chapter content");
            }
            for lecture in &chapter.chapter_content {
                if lecture.lecture_id.is_blank() || lecture.lecture_order == 0 {
                    return invalid("Lecture ID and order are required");
                }
                if lecture.lecture_url.trim().is_empty() {
                    return invalid("Lecture URL is required");
                }
            }
        }

        Ok(())
    }
}
