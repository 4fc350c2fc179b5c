//! API Client
//!
//! Typed calls against the LMS server. Every response is unwrapped from the
//! `{ "success": bool, ... }` envelope; `success: false` becomes
//! [`ClientError::Api`].

use lms_core::{Course, CourseSummary, ProgressSummary, User};
use reqwest::RequestBuilder;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};

use crate::error::{ClientError, Result};

/// Result of starting a checkout
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseStarted {
    pub purchase_id: String,
    pub session_url: String,
}

#[derive(Deserialize)]
struct CoursesBody {
    courses: Vec<CourseSummary>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseDataBody {
    course_data: Course,
}

#[derive(Deserialize)]
struct UserBody {
    user: User,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct EnrolledCoursesBody {
    enrolled_courses: Vec<Course>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProgressBody {
    progress_data: ProgressSummary,
}

#[derive(Deserialize)]
struct MessageBody {
    message: String,
}

/// HTTP client for one signed-in (or anonymous) user
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a new anonymous client
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
        }
    }

    /// Attach a session token sent as a bearer credential
    #[must_use]
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn call<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let request = match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        let body: Value = response.json().await?;

        if !status.is_success() || body.get("success").and_then(Value::as_bool) == Some(false) {
            let message = body
                .get("message")
                .and_then(Value::as_str)
                .unwrap_or("Request failed")
                .to_string();
            return Err(ClientError::Api {
                status: status.as_u16(),
                message,
            });
        }

        Ok(serde_json::from_value(body)?)
    }

    /// Published course listing
    pub async fn all_courses(&self) -> Result<Vec<CourseSummary>> {
        let body: CoursesBody = self.call(self.http.get(self.url("/api/course/all"))).await?;
        Ok(body.courses)
    }

    /// Course detail (paid lecture URLs blanked)
    pub async fn course(&self, course_id: &str) -> Result<Course> {
        let body: CourseDataBody = self
            .call(self.http.get(self.url(&format!("/api/course/{course_id}"))))
            .await?;
        Ok(body.course_data)
    }

    pub async fn user_data(&self) -> Result<User> {
        let body: UserBody = self.call(self.http.get(self.url("/api/user/data"))).await?;
        Ok(body.user)
    }

    pub async fn enrolled_courses(&self) -> Result<Vec<Course>> {
        let body: EnrolledCoursesBody = self
            .call(self.http.get(self.url("/api/user/enrolled-courses")))
            .await?;
        Ok(body.enrolled_courses)
    }

    /// Start a checkout; redirect the browser to `session_url`
    pub async fn purchase(&self, course_id: &str) -> Result<PurchaseStarted> {
        self.call(
            self.http
                .post(self.url("/api/user/purchase"))
                .json(&json!({ "courseId": course_id })),
        )
        .await
    }

    /// Mark a lecture completed; returns the server's message
    pub async fn update_progress(&self, course_id: &str, lecture_id: &str) -> Result<String> {
        let body: MessageBody = self
            .call(
                self.http
                    .post(self.url("/api/user/update-course-progress"))
                    .json(&json!({ "courseId": course_id, "lectureId": lecture_id })),
            )
            .await?;
        Ok(body.message)
    }

    pub async fn get_progress(&self, course_id: &str) -> Result<ProgressSummary> {
        let body: ProgressBody = self
            .call(
                self.http
                    .post(self.url("/api/user/get-course-progress"))
                    .json(&json!({ "courseId": course_id })),
            )
            .await?;
        Ok(body.progress_data)
    }

    pub async fn add_rating(&self, course_id: &str, rating: u8) -> Result<()> {
        let _: MessageBody = self
            .call(
                self.http
                    .post(self.url("/api/user/add-rating"))
                    .json(&json!({ "courseId": course_id, "rating": rating })),
            )
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_normalized() {
        let client = ApiClient::new("http://localhost:5000/").with_token("tok");
        assert_eq!(client.url("/api/user/data"), "http://localhost:5000/api/user/data");
        assert_eq!(client.token.as_deref(), Some("tok"));
    }

    #[test]
    fn test_purchase_started_shape() {
        let started: PurchaseStarted = serde_json::from_value(json!({
            "success": true,
            "purchaseId": "p-1",
            "sessionUrl": "https://checkout.example.com/pay/cs_1"
        }))
        .unwrap();
        assert_eq!(started.purchase_id, "p-1");
    }
}
