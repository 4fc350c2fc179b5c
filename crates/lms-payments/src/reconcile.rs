//! Purchase Reconciliation
//!
//! Opens a pending purchase with a hosted checkout session, then applies the
//! provider's callbacks to move it to a terminal state.
//!
//! ```text
//! pending ──(checkout completed)──▶ completed
//!    │
//!    └────(payment failed)────────▶ failed
//!
//! completed / failed ──(any event)──▶ unchanged, acknowledged
//! ```
//!
//! Callbacks are delivered at least once and possibly out of order. Each
//! step is a conditional single-document write so a redelivered event
//! converges on the same state without locks: enrollment is appended only
//! when absent, and the status flips only from `pending`. Enrollment is fanned
//! out only once the stored status is `completed`, and again on every replay
//! of a completed purchase, so a crash between the flip and the fan-out is
//! repaired by redelivery and a purchase that ended `failed` never enrolls.

use std::sync::Arc;

use lms_core::{
    CourseId, DocumentStore, LmsError, PaymentOutcome, Purchase, PurchaseId, PurchaseStatus,
    UserId,
};
use serde::Serialize;

use crate::checkout::{CheckoutProvider, CheckoutRequest};
use crate::error::{PaymentError, Result};
use crate::signature::verify_signature;
use crate::webhook::{Correlation, PaymentEvent};

/// Where the provider sends the customer afterwards
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RedirectUrls {
    pub success_url: String,
    pub cancel_url: String,
}

impl RedirectUrls {
    /// Enrollments page on success, the course page on cancel
    pub fn for_course(origin: &str, course_id: &CourseId) -> Self {
        let origin = origin.trim_end_matches('/');
        Self {
            success_url: format!("{origin}/my-enrollments"),
            cancel_url: format!("{origin}/course-details/{course_id}"),
        }
    }
}

/// A purchase awaiting payment
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutStarted {
    pub purchase_id: PurchaseId,
    pub session_url: String,
}

/// What a verified callback did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CallbackOutcome {
    /// Pending purchase moved to a terminal status
    Applied {
        purchase_id: PurchaseId,
        status: PurchaseStatus,
    },

    /// Purchase was already terminal; nothing changed
    Replayed {
        purchase_id: PurchaseId,
        status: PurchaseStatus,
    },

    /// Checkout finished but payment has not cleared
    Awaiting,

    /// Event type we do not act on
    Ignored,
}

/// The purchase state machine
pub struct PurchaseReconciler<S> {
    store: Arc<S>,
    checkout: Arc<dyn CheckoutProvider>,
    webhook_secret: String,
}

impl<S> PurchaseReconciler<S>
where
    S: DocumentStore,
{
    /// Create a new reconciler
    pub fn new(
        store: Arc<S>,
        checkout: Arc<dyn CheckoutProvider>,
        webhook_secret: impl Into<String>,
    ) -> Self {
        Self {
            store,
            checkout,
            webhook_secret: webhook_secret.into(),
        }
    }

    /// Create a pending purchase and open a checkout session for it
    pub async fn initiate_purchase(
        &self,
        user_id: &UserId,
        course_id: &str,
        origin: &str,
    ) -> Result<CheckoutStarted> {
        let course_id = CourseId::parse(course_id)?;

        let user = self
            .store
            .get_user(user_id)
            .await?
            .ok_or_else(|| LmsError::NotFound("User".into()))?;
        let course = self
            .store
            .get_course(&course_id)
            .await?
            .ok_or_else(|| LmsError::NotFound("Course".into()))?;

        if self
            .store
            .find_completed_purchase(user_id, &course_id)
            .await?
            .is_some()
        {
            tracing::info!(user_id = %user_id, course_id = %course_id, "Course already purchased");
            return Err(LmsError::AlreadyPurchased.into());
        }

        let mut purchase = Purchase::new(user_id.clone(), course_id, course.purchase_amount());
        let unit_amount = purchase.amount_minor_units()?;
        self.store.save_purchase(&purchase).await?;

        let urls = RedirectUrls::for_course(origin, &course_id);
        let request = CheckoutRequest {
            purchase_id: purchase.id.to_string(),
            product_name: course.course_title.clone(),
            unit_amount,
            success_url: urls.success_url,
            cancel_url: urls.cancel_url,
            customer_email: Some(user.email).filter(|e| !e.is_empty()),
        };

        let session = match self.checkout.create_checkout_session(request).await {
            Ok(session) => session,
            Err(e) => {
                tracing::error!(
                    purchase_id = %purchase.id,
                    provider = self.checkout.name(),
                    error = %e,
                    "Checkout session creation failed; purchase left pending"
                );
                return Err(e);
            }
        };

        purchase.session_id = Some(session.id.clone());
        purchase.updated_at = chrono::Utc::now();
        self.store.save_purchase(&purchase).await?;

        tracing::info!(
            purchase_id = %purchase.id,
            user_id = %user_id,
            course_id = %course_id,
            amount = %purchase.amount,
            session_id = %session.id,
            "Purchase initiated"
        );

        Ok(CheckoutStarted {
            purchase_id: purchase.id,
            session_url: session.checkout_url,
        })
    }

    /// Verify a raw callback and apply it. Nothing is read or written
    /// unless the signature checks out.
    pub async fn apply_payment_callback(
        &self,
        payload: &str,
        signature: &str,
    ) -> Result<CallbackOutcome> {
        if let Err(e) = verify_signature(payload, signature, &self.webhook_secret) {
            tracing::warn!(error = %e, "Rejected payment webhook");
            return Err(e);
        }

        let event = PaymentEvent::parse(payload)?;
        self.apply(event).await
    }

    /// Apply an already verified event
    pub async fn apply(&self, event: PaymentEvent) -> Result<CallbackOutcome> {
        match event {
            PaymentEvent::Other { event_id, event_type } => {
                tracing::debug!(event_id = %event_id, event_type = %event_type, "Unhandled webhook event");
                Ok(CallbackOutcome::Ignored)
            }

            PaymentEvent::AwaitingPayment { event_id, session_id } => {
                tracing::info!(
                    event_id = %event_id,
                    session_id = %session_id,
                    "Checkout completed with payment pending"
                );
                Ok(CallbackOutcome::Awaiting)
            }

            PaymentEvent::Settled {
                event_id,
                event_type,
                outcome,
                correlation,
            } => {
                let purchase_id = self.resolve(&event_id, correlation).await?;
                tracing::info!(
                    event_id = %event_id,
                    event_type = %event_type,
                    purchase_id = %purchase_id,
                    "Processing payment webhook"
                );
                self.settle(&purchase_id, outcome).await
            }
        }
    }

    async fn resolve(&self, event_id: &str, correlation: Correlation) -> Result<PurchaseId> {
        let raw = match correlation {
            Correlation::PurchaseId(raw) => Some(raw),
            Correlation::PaymentIntent(intent) => {
                self.checkout.purchase_for_payment_intent(&intent).await?
            }
            Correlation::Missing => None,
        };

        let Some(raw) = raw else {
            tracing::warn!(event_id = %event_id, "Webhook event carries no purchase id");
            return Err(PaymentError::CorrelationMissing {
                event_id: event_id.to_string(),
            });
        };

        PurchaseId::parse(&raw).map_err(|_| {
            tracing::warn!(event_id = %event_id, purchase_id = %raw, "Malformed purchase id");
            PaymentError::Core(LmsError::NotFound("Purchase".into()))
        })
    }

    async fn settle(&self, purchase_id: &PurchaseId, outcome: PaymentOutcome) -> Result<CallbackOutcome> {
        let Some(purchase) = self.store.get_purchase(purchase_id).await? else {
            tracing::warn!(purchase_id = %purchase_id, "Webhook for unknown purchase");
            return Err(LmsError::NotFound("Purchase".into()).into());
        };

        let (status, applied) = match purchase.next_status(outcome) {
            Some(target) => match self.store.transition_purchase(purchase_id, target).await? {
                Some(updated) => (updated.status, true),
                // Lost the race to a concurrent delivery
                None => {
                    let current = self
                        .store
                        .get_purchase(purchase_id)
                        .await?
                        .map_or(purchase.status, |p| p.status);
                    (current, false)
                }
            },
            None => (purchase.status, false),
        };

        if status == PurchaseStatus::Completed {
            self.fan_out_enrollment(&purchase).await?;
        }

        if applied {
            tracing::info!(
                purchase_id = %purchase_id,
                user_id = %purchase.user_id,
                course_id = %purchase.course_id,
                status = %status,
                "Purchase settled"
            );
            Ok(CallbackOutcome::Applied {
                purchase_id: *purchase_id,
                status,
            })
        } else {
            tracing::info!(
                purchase_id = %purchase_id,
                status = %status,
                "Purchase already terminal; replay acknowledged"
            );
            Ok(CallbackOutcome::Replayed {
                purchase_id: *purchase_id,
                status,
            })
        }
    }

    async fn fan_out_enrollment(&self, purchase: &Purchase) -> Result<()> {
        let added_student = self
            .store
            .add_enrolled_student(&purchase.course_id, purchase.user_id.clone())
            .await?
            .ok_or_else(|| {
                tracing::error!(purchase_id = %purchase.id, course_id = %purchase.course_id, "Purchased course missing");
                LmsError::NotFound("Course".into())
            })?;

        let added_course = self
            .store
            .add_enrolled_course(&purchase.user_id, purchase.course_id)
            .await?
            .ok_or_else(|| {
                tracing::error!(purchase_id = %purchase.id, user_id = %purchase.user_id, "Purchasing user missing");
                LmsError::NotFound("User".into())
            })?;

        tracing::debug!(
            purchase_id = %purchase.id,
            added_student,
            added_course,
            "Enrollment fan-out"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockCheckoutProvider;
    use crate::signature::sign_payload;
    use async_trait::async_trait;
    use lms_core::{
        Chapter, Course, CourseDraft, CourseProgress, CourseStore, Lecture, LectureId, MemoryStore,
        ProgressStore, PurchaseStore, Role, User, UserProfile, UserStore,
    };
    use rust_decimal_macros::dec;
    use serde_json::json;

    /// Lets a failure event settle the purchase between a completion's read
    /// and its status flip
    struct FailureWinsRace {
        inner: Arc<MemoryStore>,
    }

    #[async_trait]
    impl UserStore for FailureWinsRace {
        async fn get_user(&self, id: &UserId) -> lms_core::Result<Option<User>> {
            self.inner.get_user(id).await
        }

        async fn save_user(&self, user: &User) -> lms_core::Result<()> {
            self.inner.save_user(user).await
        }

        async fn delete_user(&self, id: &UserId) -> lms_core::Result<bool> {
            self.inner.delete_user(id).await
        }

        async fn users_by_ids(&self, ids: &[UserId]) -> lms_core::Result<Vec<User>> {
            self.inner.users_by_ids(ids).await
        }

        async fn add_enrolled_course(&self, id: &UserId, course_id: CourseId) -> lms_core::Result<Option<bool>> {
            self.inner.add_enrolled_course(id, course_id).await
        }

        async fn upsert_profile(&self, id: &UserId, profile: UserProfile) -> lms_core::Result<bool> {
            self.inner.upsert_profile(id, profile).await
        }
    }

    #[async_trait]
    impl CourseStore for FailureWinsRace {
        async fn get_course(&self, id: &CourseId) -> lms_core::Result<Option<Course>> {
            self.inner.get_course(id).await
        }

        async fn save_course(&self, course: &Course) -> lms_core::Result<()> {
            self.inner.save_course(course).await
        }

        async fn published_courses(&self) -> lms_core::Result<Vec<Course>> {
            self.inner.published_courses().await
        }

        async fn courses_by_educator(&self, educator: &UserId) -> lms_core::Result<Vec<Course>> {
            self.inner.courses_by_educator(educator).await
        }

        async fn courses_by_ids(&self, ids: &[CourseId]) -> lms_core::Result<Vec<Course>> {
            self.inner.courses_by_ids(ids).await
        }

        async fn add_enrolled_student(&self, id: &CourseId, user_id: UserId) -> lms_core::Result<Option<bool>> {
            self.inner.add_enrolled_student(id, user_id).await
        }

        async fn rate_course(&self, id: &CourseId, user_id: UserId, rating: u8) -> lms_core::Result<Option<Course>> {
            self.inner.rate_course(id, user_id, rating).await
        }
    }

    #[async_trait]
    impl PurchaseStore for FailureWinsRace {
        async fn get_purchase(&self, id: &PurchaseId) -> lms_core::Result<Option<Purchase>> {
            self.inner.get_purchase(id).await
        }

        async fn save_purchase(&self, purchase: &Purchase) -> lms_core::Result<()> {
            self.inner.save_purchase(purchase).await
        }

        async fn find_completed_purchase(
            &self,
            user_id: &UserId,
            course_id: &CourseId,
        ) -> lms_core::Result<Option<Purchase>> {
            self.inner.find_completed_purchase(user_id, course_id).await
        }

        async fn completed_purchases_for_courses(&self, course_ids: &[CourseId]) -> lms_core::Result<Vec<Purchase>> {
            self.inner.completed_purchases_for_courses(course_ids).await
        }

        async fn transition_purchase(
            &self,
            id: &PurchaseId,
            status: PurchaseStatus,
        ) -> lms_core::Result<Option<Purchase>> {
            if status == PurchaseStatus::Completed {
                self.inner.transition_purchase(id, PurchaseStatus::Failed).await?;
            }
            self.inner.transition_purchase(id, status).await
        }
    }

    #[async_trait]
    impl ProgressStore for FailureWinsRace {
        async fn get_progress(&self, user_id: &UserId, course_id: &CourseId) -> lms_core::Result<Option<CourseProgress>> {
            self.inner.get_progress(user_id, course_id).await
        }

        async fn add_completed_lecture(
            &self,
            user_id: &UserId,
            course_id: &CourseId,
            lecture_id: LectureId,
        ) -> lms_core::Result<bool> {
            self.inner.add_completed_lecture(user_id, course_id, lecture_id).await
        }
    }

    const SECRET: &str = "whsec_reconcile_test";
    const ORIGIN: &str = "http://localhost:5173";

    struct Fixture {
        store: Arc<MemoryStore>,
        checkout: Arc<MockCheckoutProvider>,
        reconciler: PurchaseReconciler<MemoryStore>,
        user: UserId,
        course: Course,
    }

    async fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let checkout = Arc::new(MockCheckoutProvider::new());

        let user = User::new(
            UserId::new("user_student"),
            UserProfile {
                email: "student@example.com".into(),
                name: "Student".into(),
                image_url: String::new(),
                role: Role::Student,
            },
        );
        store.save_user(&user).await.unwrap();

        let course = CourseDraft {
            course_title: "Async Rust".into(),
            course_description: "Futures and executors".into(),
            course_thumbnail: None,
            course_price: dec!(100),
            discount: 20,
            course_content: vec![Chapter {
                chapter_id: "c1".into(),
                chapter_order: 1,
                chapter_title: "Intro".into(),
                chapter_content: vec![Lecture {
                    lecture_id: LectureId::new("l1"),
                    lecture_title: "Welcome".into(),
                    lecture_duration: 5,
                    lecture_url: "https://video.example.com/l1".into(),
                    is_preview_free: true,
                    lecture_order: 1,
                }],
            }],
        }
        .into_course(UserId::new("user_educator"))
        .unwrap();
        store.save_course(&course).await.unwrap();

        let reconciler = PurchaseReconciler::new(store.clone(), checkout.clone(), SECRET);
        Fixture {
            store,
            checkout,
            reconciler,
            user: user.id,
            course,
        }
    }

    fn signed(event_type: &str, object: &serde_json::Value) -> (String, String) {
        let payload = json!({ "id": "evt_1", "type": event_type, "data": { "object": object } }).to_string();
        let header = sign_payload(&payload, SECRET, chrono::Utc::now().timestamp()).unwrap();
        (payload, header)
    }

    fn completed(purchase_id: &PurchaseId) -> (String, String) {
        signed(
            "checkout.session.completed",
            &json!({
                "id": "cs_1",
                "object": "checkout.session",
                "payment_status": "paid",
                "metadata": { "purchaseId": purchase_id.to_string() }
            }),
        )
    }

    #[tokio::test]
    async fn test_initiate_creates_pending_purchase() {
        let f = fixture().await;
        let started = f
            .reconciler
            .initiate_purchase(&f.user, &f.course.id.to_string(), ORIGIN)
            .await
            .unwrap();

        let purchase = f.store.get_purchase(&started.purchase_id).await.unwrap().unwrap();
        assert_eq!(purchase.status, PurchaseStatus::Pending);
        assert_eq!(purchase.amount, dec!(80.00));
        assert_eq!(purchase.session_id.as_deref(), Some("cs_mock_1"));
        assert_eq!(started.session_url, "https://checkout.example.com/pay/cs_mock_1");

        let requests = f.checkout.requests().await;
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].unit_amount, 8000);
        assert_eq!(requests[0].purchase_id, started.purchase_id.to_string());
        assert_eq!(requests[0].success_url, "http://localhost:5173/my-enrollments");
        assert_eq!(
            requests[0].cancel_url,
            format!("http://localhost:5173/course-details/{}", f.course.id)
        );
        assert_eq!(requests[0].customer_email.as_deref(), Some("student@example.com"));
    }

    #[tokio::test]
    async fn test_already_purchased_creates_nothing() {
        let f = fixture().await;
        let started = f
            .reconciler
            .initiate_purchase(&f.user, &f.course.id.to_string(), ORIGIN)
            .await
            .unwrap();
        let (payload, header) = completed(&started.purchase_id);
        f.reconciler.apply_payment_callback(&payload, &header).await.unwrap();
        assert_eq!(f.store.purchase_count().await, 1);

        let err = f
            .reconciler
            .initiate_purchase(&f.user, &f.course.id.to_string(), ORIGIN)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Core(LmsError::AlreadyPurchased)));
        assert_eq!(f.store.purchase_count().await, 1);
        assert_eq!(f.checkout.requests().await.len(), 1);
    }

    #[tokio::test]
    async fn test_initiate_unknown_entities() {
        let f = fixture().await;
        let err = f
            .reconciler
            .initiate_purchase(&UserId::new("ghost"), &f.course.id.to_string(), ORIGIN)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Core(LmsError::NotFound(_))));

        let err = f
            .reconciler
            .initiate_purchase(&f.user, &CourseId::generate().to_string(), ORIGIN)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Core(LmsError::NotFound(_))));
        assert_eq!(f.store.purchase_count().await, 0);
    }

    #[tokio::test]
    async fn test_provider_failure_leaves_purchase_pending() {
        let f = fixture().await;
        f.checkout.set_failing(true);
        let err = f
            .reconciler
            .initiate_purchase(&f.user, &f.course.id.to_string(), ORIGIN)
            .await
            .unwrap_err();
        assert!(matches!(err, PaymentError::Stripe(_)));
        assert_eq!(f.store.purchase_count().await, 1);
    }

    #[tokio::test]
    async fn test_duplicate_callback_enrolls_once() {
        let f = fixture().await;
        let started = f
            .reconciler
            .initiate_purchase(&f.user, &f.course.id.to_string(), ORIGIN)
            .await
            .unwrap();
        let (payload, header) = completed(&started.purchase_id);

        let first = f.reconciler.apply_payment_callback(&payload, &header).await.unwrap();
        let second = f.reconciler.apply_payment_callback(&payload, &header).await.unwrap();

        assert_eq!(
            first,
            CallbackOutcome::Applied {
                purchase_id: started.purchase_id,
                status: PurchaseStatus::Completed
            }
        );
        assert_eq!(
            second,
            CallbackOutcome::Replayed {
                purchase_id: started.purchase_id,
                status: PurchaseStatus::Completed
            }
        );

        let course = f.store.get_course(&f.course.id).await.unwrap().unwrap();
        let user = f.store.get_user(&f.user).await.unwrap().unwrap();
        assert_eq!(course.enrolled_students, vec![f.user.clone()]);
        assert_eq!(user.enrolled_courses, vec![f.course.id]);
    }

    #[tokio::test]
    async fn test_concurrent_redelivery_converges() {
        let f = fixture().await;
        let started = f
            .reconciler
            .initiate_purchase(&f.user, &f.course.id.to_string(), ORIGIN)
            .await
            .unwrap();
        let (payload, header) = completed(&started.purchase_id);

        let (a, b) = tokio::join!(
            f.reconciler.apply_payment_callback(&payload, &header),
            f.reconciler.apply_payment_callback(&payload, &header),
        );
        let applied = [a.unwrap(), b.unwrap()]
            .iter()
            .filter(|o| matches!(o, CallbackOutcome::Applied { .. }))
            .count();
        assert_eq!(applied, 1);

        let course = f.store.get_course(&f.course.id).await.unwrap().unwrap();
        assert_eq!(course.enrolled_students.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_purchase_is_never_resurrected() {
        let f = fixture().await;
        let started = f
            .reconciler
            .initiate_purchase(&f.user, &f.course.id.to_string(), ORIGIN)
            .await
            .unwrap();
        let (failed, failed_sig) = signed(
            "checkout.session.async_payment_failed",
            &json!({ "id": "cs_1", "metadata": { "purchaseId": started.purchase_id.to_string() } }),
        );
        f.reconciler.apply_payment_callback(&failed, &failed_sig).await.unwrap();

        let (payload, header) = completed(&started.purchase_id);
        let outcome = f.reconciler.apply_payment_callback(&payload, &header).await.unwrap();
        assert!(matches!(
            outcome,
            CallbackOutcome::Replayed { status: PurchaseStatus::Failed, .. }
        ));

        let course = f.store.get_course(&f.course.id).await.unwrap().unwrap();
        assert!(course.enrolled_students.is_empty());
    }

    #[tokio::test]
    async fn test_failure_settling_mid_completion_never_enrolls() {
        let f = fixture().await;
        let started = f
            .reconciler
            .initiate_purchase(&f.user, &f.course.id.to_string(), ORIGIN)
            .await
            .unwrap();
        let racing = PurchaseReconciler::new(
            Arc::new(FailureWinsRace {
                inner: f.store.clone(),
            }),
            f.checkout.clone(),
            SECRET,
        );

        let (payload, header) = completed(&started.purchase_id);
        let outcome = racing.apply_payment_callback(&payload, &header).await.unwrap();
        assert_eq!(
            outcome,
            CallbackOutcome::Replayed {
                purchase_id: started.purchase_id,
                status: PurchaseStatus::Failed
            }
        );

        let course = f.store.get_course(&f.course.id).await.unwrap().unwrap();
        let user = f.store.get_user(&f.user).await.unwrap().unwrap();
        assert!(course.enrolled_students.is_empty());
        assert!(user.enrolled_courses.is_empty());
    }

    #[tokio::test]
    async fn test_replay_repairs_missing_fan_out() {
        let f = fixture().await;
        let started = f
            .reconciler
            .initiate_purchase(&f.user, &f.course.id.to_string(), ORIGIN)
            .await
            .unwrap();
        // Status flipped but the process stopped before enrolling
        f.store
            .transition_purchase(&started.purchase_id, PurchaseStatus::Completed)
            .await
            .unwrap();

        let (payload, header) = completed(&started.purchase_id);
        let outcome = f.reconciler.apply_payment_callback(&payload, &header).await.unwrap();
        assert!(matches!(
            outcome,
            CallbackOutcome::Replayed { status: PurchaseStatus::Completed, .. }
        ));

        let course = f.store.get_course(&f.course.id).await.unwrap().unwrap();
        let user = f.store.get_user(&f.user).await.unwrap().unwrap();
        assert_eq!(course.enrolled_students, vec![f.user.clone()]);
        assert_eq!(user.enrolled_courses, vec![f.course.id]);
    }

    #[tokio::test]
    async fn test_bad_signature_mutates_nothing() {
        let f = fixture().await;
        let started = f
            .reconciler
            .initiate_purchase(&f.user, &f.course.id.to_string(), ORIGIN)
            .await
            .unwrap();
        let (payload, _) = completed(&started.purchase_id);
        let forged = sign_payload(&payload, "whsec_attacker", chrono::Utc::now().timestamp()).unwrap();

        let err = f.reconciler.apply_payment_callback(&payload, &forged).await.unwrap_err();
        assert!(matches!(err, PaymentError::UnverifiedEvent(_)));

        let purchase = f.store.get_purchase(&started.purchase_id).await.unwrap().unwrap();
        assert_eq!(purchase.status, PurchaseStatus::Pending);
        let course = f.store.get_course(&f.course.id).await.unwrap().unwrap();
        assert!(course.enrolled_students.is_empty());
    }

    #[tokio::test]
    async fn test_missing_and_unknown_correlation() {
        let f = fixture().await;
        let (payload, header) = signed("checkout.session.completed", &json!({ "id": "cs_1" }));
        let err = f.reconciler.apply_payment_callback(&payload, &header).await.unwrap_err();
        assert!(matches!(err, PaymentError::CorrelationMissing { .. }));

        let (payload, header) = completed(&PurchaseId::generate());
        let err = f.reconciler.apply_payment_callback(&payload, &header).await.unwrap_err();
        assert!(matches!(err, PaymentError::Core(LmsError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_payment_intent_lookup() {
        let f = fixture().await;
        let started = f
            .reconciler
            .initiate_purchase(&f.user, &f.course.id.to_string(), ORIGIN)
            .await
            .unwrap();
        f.checkout
            .link_payment_intent("pi_1", &started.purchase_id.to_string())
            .await;

        let (payload, header) = signed(
            "payment_intent.payment_failed",
            &json!({ "id": "pi_1", "object": "payment_intent", "metadata": {} }),
        );
        let outcome = f.reconciler.apply_payment_callback(&payload, &header).await.unwrap();
        assert!(matches!(
            outcome,
            CallbackOutcome::Applied { status: PurchaseStatus::Failed, .. }
        ));
    }

    #[tokio::test]
    async fn test_unknown_event_acknowledged() {
        let f = fixture().await;
        let (payload, header) = signed("customer.created", &json!({ "id": "cus_1" }));
        let outcome = f.reconciler.apply_payment_callback(&payload, &header).await.unwrap();
        assert_eq!(outcome, CallbackOutcome::Ignored);
    }

    #[test]
    fn test_redirect_urls() {
        let id = CourseId::generate();
        let urls = RedirectUrls::for_course("https://learn.example.com/", &id);
        assert_eq!(urls.success_url, "https://learn.example.com/my-enrollments");
        assert_eq!(urls.cancel_url, format!("https://learn.example.com/course-details/{id}"));
    }
}
