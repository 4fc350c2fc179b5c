//! # lms-core
//!
//! Domain model and services for the learning platform backend.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         Services                              │
//! │  ┌─────────────┐  ┌─────────────┐  ┌──────────────────────┐  │
//! │  │   Catalog   │  │  Progress   │  │  Educator Dashboard  │  │
//! │  │  & Ratings  │  │   Tracker   │  │                      │  │
//! │  └──────┬──────┘  └──────┬──────┘  └──────────┬───────────┘  │
//! │         └────────────────┼────────────────────┘              │
//! │                  ┌───────▼────────┐   ┌──────────────────┐   │
//! │                  │ DocumentStore  │   │ IdentityProvider │   │
//! │                  │   (traits)     │   │    (Strategy)    │   │
//! │                  └────────────────┘   └──────────────────┘   │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Purchases are reconciled by `lms-payments`; users are created by the
//! identity lifecycle webhook in `lms-identity`.

pub mod catalog;
pub mod course;
pub mod dashboard;
pub mod error;
pub mod identity;
pub mod ids;
pub mod progress;
pub mod purchase;
pub mod store;
pub mod user;

pub use catalog::Catalog;
pub use course::{
    Chapter, Course, CourseAggregates, CourseDraft, CourseRating, CourseSummary, Lecture,
    compute_course_aggregates, purchase_amount,
};
pub use dashboard::{Dashboard, DashboardData, EnrolledStudent, StudentPurchase};
pub use error::{LmsError, Result};
pub use identity::IdentityProvider;
pub use ids::{CourseId, LectureId, PurchaseId, UserId};
pub use progress::{CourseProgress, LectureCompletion, ProgressSummary, ProgressTracker};
pub use purchase::{PaymentOutcome, Purchase, PurchaseStatus};
pub use store::{
    CourseStore, DocumentStore, MemoryStore, ProgressStore, PurchaseStore, UserStore,
};
pub use user::{Role, StudentCard, User, UserProfile};
