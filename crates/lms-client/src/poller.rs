//! Enrollment Polling
//!
//! Purchases complete asynchronously through the payment webhook and there
//! is no push channel, so the enrollments view re-fetches on an interval
//! until its owner goes away.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use lms_core::Course;
use tokio::sync::Notify;
use tokio::task::JoinHandle;

use crate::api::ApiClient;
use crate::error::Result;
use crate::session::ClientSession;

/// Default delay between fetches
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Anything that can report the user's enrolled courses
#[async_trait]
pub trait EnrollmentSource: Send + Sync {
    async fn fetch_enrolled_courses(&self) -> Result<Vec<Course>>;
}

#[async_trait]
impl EnrollmentSource for ApiClient {
    async fn fetch_enrolled_courses(&self) -> Result<Vec<Course>> {
        self.enrolled_courses().await
    }
}

/// Periodic enrollment refresh bound to one owner.
///
/// Fetches immediately, then every `interval` while enabled. [`stop`] (or
/// dropping the poller) cancels the pending timer at once; a fetch already
/// in flight finishes but its result is thrown away.
///
/// [`stop`]: EnrollmentPoller::stop
pub struct EnrollmentPoller {
    enabled: Arc<AtomicBool>,
    wake: Arc<Notify>,
    handle: Option<JoinHandle<()>>,
}

impl EnrollmentPoller {
    /// Start polling on the current runtime
    pub fn start(
        source: Arc<dyn EnrollmentSource>,
        session: ClientSession,
        interval: Duration,
    ) -> Self {
        let enabled = Arc::new(AtomicBool::new(true));
        let wake = Arc::new(Notify::new());
        let handle = tokio::spawn(run(source, session, interval, enabled.clone(), wake.clone()));

        Self {
            enabled,
            wake,
            handle: Some(handle),
        }
    }

    pub fn is_running(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Stop polling; idempotent
    pub fn stop(&self) {
        if self.enabled.swap(false, Ordering::SeqCst) {
            self.wake.notify_one();
            tracing::debug!("Enrollment polling stopped");
        }
    }

    /// Stop and wait for the background task to exit
    pub async fn shutdown(mut self) {
        self.stop();
        if let Some(handle) = self.handle.take() {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Enrollment poller task failed");
            }
        }
    }
}

impl Drop for EnrollmentPoller {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run(
    source: Arc<dyn EnrollmentSource>,
    session: ClientSession,
    interval: Duration,
    enabled: Arc<AtomicBool>,
    wake: Arc<Notify>,
) {
    loop {
        let result = source.fetch_enrolled_courses().await;

        if !enabled.load(Ordering::SeqCst) {
            tracing::debug!("Discarding enrollment fetch completed after stop");
            break;
        }

        match result {
            Ok(courses) => {
                tracing::debug!(count = courses.len(), "Enrollment refreshed");
                session.set_enrolled_courses(courses).await;
            }
            Err(e) => tracing::warn!(error = %e, "Enrollment poll failed"),
        }

        tokio::select! {
            () = tokio::time::sleep(interval) => {}
            () = wake.notified() => break,
        }

        if !enabled.load(Ordering::SeqCst) {
            break;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClientError;
    use crate::session::tests::course;
    use std::sync::atomic::AtomicUsize;

    /// Returns one course per call; fails on the calls listed in `fail_on`
    struct CountingSource {
        calls: AtomicUsize,
        delay: Duration,
        fail_on: Vec<usize>,
    }

    impl CountingSource {
        fn new(delay: Duration, fail_on: Vec<usize>) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                delay,
                fail_on,
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EnrollmentSource for CountingSource {
        async fn fetch_enrolled_courses(&self) -> Result<Vec<Course>> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail_on.contains(&call) {
                return Err(ClientError::Api {
                    status: 503,
                    message: "unavailable".into(),
                });
            }
            Ok(vec![course("Polled")])
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_fetches_immediately_then_on_interval() {
        let source = CountingSource::new(Duration::ZERO, vec![]);
        let session = ClientSession::new();
        let poller = EnrollmentPoller::start(source.clone(), session.clone(), DEFAULT_POLL_INTERVAL);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(source.calls(), 1);
        assert_eq!(session.enrolled_courses().await.len(), 1);

        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        assert_eq!(source.calls(), 2);

        poller.stop();
        assert!(!poller.is_running());
        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 4).await;
        assert_eq!(source.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_cancels_timer() {
        let source = CountingSource::new(Duration::ZERO, vec![]);
        let poller = EnrollmentPoller::start(source.clone(), ClientSession::new(), DEFAULT_POLL_INTERVAL);

        tokio::time::sleep(Duration::from_millis(1)).await;
        drop(poller);
        tokio::time::sleep(DEFAULT_POLL_INTERVAL * 3).await;
        assert_eq!(source.calls(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_in_flight_result_discarded_after_stop() {
        let source = CountingSource::new(Duration::from_secs(1), vec![]);
        let session = ClientSession::new();
        let poller = EnrollmentPoller::start(source.clone(), session.clone(), DEFAULT_POLL_INTERVAL);

        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(source.calls(), 1);
        poller.shutdown().await;

        assert_eq!(source.calls(), 1);
        assert!(session.enrolled_courses().await.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_errors_do_not_stop_polling() {
        let source = CountingSource::new(Duration::ZERO, vec![1]);
        let session = ClientSession::new();
        let _poller = EnrollmentPoller::start(source.clone(), session.clone(), DEFAULT_POLL_INTERVAL);

        tokio::time::sleep(Duration::from_millis(1)).await;
        assert_eq!(source.calls(), 1);
        assert!(session.enrolled_courses().await.is_empty());

        tokio::time::sleep(DEFAULT_POLL_INTERVAL).await;
        assert_eq!(source.calls(), 2);
        assert_eq!(session.enrolled_courses().await.len(), 1);
    }
}
