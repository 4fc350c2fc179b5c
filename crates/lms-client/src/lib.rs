//! # lms-client
//!
//! Client-side building blocks for LMS frontends.
//!
//! - [`ApiClient`]: typed calls for the catalog and student endpoints
//! - [`ClientSession`]: per-session state, explicitly owned and cloned into
//!   whatever needs it
//! - [`EnrollmentPoller`]: refreshes enrolled courses while a purchase
//!   settles through the payment webhook
//!
//! ## Usage
//!
//! ```rust,ignore
//! use lms_client::{ApiClient, ClientSession, EnrollmentPoller, DEFAULT_POLL_INTERVAL};
//!
//! let api = Arc::new(ApiClient::new("http://localhost:5000").with_token(token));
//! let session = ClientSession::new();
//! session.set_user(api.user_data().await?).await;
//!
//! // While the enrollments view is open
//! let poller = EnrollmentPoller::start(api.clone(), session.clone(), DEFAULT_POLL_INTERVAL);
//! // ...on teardown
//! poller.stop();
//! ```

mod api;
mod error;
mod poller;
mod session;

pub use api::{ApiClient, PurchaseStarted};
pub use error::{ClientError, Result};
pub use poller::{DEFAULT_POLL_INTERVAL, EnrollmentPoller, EnrollmentSource};
pub use session::ClientSession;
