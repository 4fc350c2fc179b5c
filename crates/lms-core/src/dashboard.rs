//! Educator Dashboard
//!
//! Earnings and enrollment figures over an educator's courses. Only
//! completed purchases count.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::ids::UserId;
use crate::store::{CourseStore, PurchaseStore, UserStore};
use crate::user::StudentCard;

/// One enrolled student of one course
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrolledStudent {
    pub course_title: String,
    pub student: StudentCard,
}

/// Dashboard totals
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
    pub total_earnings: Decimal,
    pub enrolled_students_data: Vec<EnrolledStudent>,
    pub total_courses: usize,
}

/// A completed purchase joined with its student and course
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPurchase {
    pub student: StudentCard,
    pub course_title: String,
    pub purchase_date: DateTime<Utc>,
}

/// Educator reporting service
pub struct Dashboard<S> {
    store: Arc<S>,
}

impl<S> Dashboard<S>
where
    S: CourseStore + PurchaseStore + UserStore,
{
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn dashboard(&self, educator: &UserId) -> Result<DashboardData> {
        let courses = self.store.courses_by_educator(educator).await?;
        let course_ids: Vec<_> = courses.iter().map(|c| c.id).collect();

        let total_earnings = self
            .store
            .completed_purchases_for_courses(&course_ids)
            .await?
            .iter()
            .map(|p| p.amount)
            .sum();

        let mut enrolled_students_data = Vec::new();
        for course in &courses {
            let students = self.store.users_by_ids(&course.enrolled_students).await?;
            enrolled_students_data.extend(students.iter().map(|s| EnrolledStudent {
                course_title: course.course_title.clone(),
                student: s.card(),
            }));
        }

        Ok(DashboardData {
            total_earnings,
            enrolled_students_data,
            total_courses: courses.len(),
        })
    }

    /// One entry per completed purchase of the educator's courses
    pub async fn enrolled_students(&self, educator: &UserId) -> Result<Vec<StudentPurchase>> {
        let courses = self.store.courses_by_educator(educator).await?;
        let titles: HashMap<_, _> = courses.iter().map(|c| (c.id, c.course_title.clone())).collect();
        let course_ids: Vec<_> = titles.keys().copied().collect();

        let purchases = self.store.completed_purchases_for_courses(&course_ids).await?;
        let user_ids: Vec<_> = purchases.iter().map(|p| p.user_id.clone()).collect();
        let students: HashMap<_, _> = self
            .store
            .users_by_ids(&user_ids)
            .await?
            .into_iter()
            .map(|u| (u.id.clone(), u.card()))
            .collect();

        Ok(purchases
            .into_iter()
            .filter_map(|p| {
                let student = students.get(&p.user_id)?.clone();
                let course_title = titles.get(&p.course_id)?.clone();
                Some(StudentPurchase {
                    student,
                    course_title,
                    purchase_date: p.created_at,
                })
            })
            .collect())
    }
}
