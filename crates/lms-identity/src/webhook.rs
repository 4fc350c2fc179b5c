//! User Lifecycle Webhooks
//!
//! Clerk delivers `user.*` events through Svix. The envelope is signed over
//! `"{svix-id}.{svix-timestamp}.{raw body}"` with HMAC-SHA256 keyed by the
//! base64 part of the `whsec_` secret, and `svix-signature` carries one or
//! more space separated `v1,<base64>` entries.

use std::sync::Arc;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use hmac::{Hmac, Mac};
use lms_core::{LmsError, Result, Role, UserId, UserProfile, UserStore};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Maximum age (either direction) of a signed envelope
pub const WEBHOOK_TOLERANCE_SECS: u64 = 300;

/// The three signature headers of a delivery
#[derive(Clone, Copy, Debug)]
pub struct WebhookHeaders<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

/// Verifies signed envelopes for one endpoint secret
#[derive(Clone)]
pub struct WebhookVerifier {
    key: Vec<u8>,
}

impl std::fmt::Debug for WebhookVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WebhookVerifier").finish_non_exhaustive()
    }
}

impl WebhookVerifier {
    /// Create from a `whsec_<base64>` secret
    pub fn new(secret: &str) -> Result<Self> {
        let encoded = secret.trim().trim_start_matches("whsec_");
        let key = STANDARD
            .decode(encoded)
            .map_err(|_| LmsError::Upstream("Webhook secret is not valid base64".into()))?;
        Ok(Self { key })
    }

    fn mac(&self, id: &str, timestamp: &str, payload: &str) -> Result<HmacSha256> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| LmsError::Upstream(e.to_string()))?;
        mac.update(format!("{id}.{timestamp}.{payload}").as_bytes());
        Ok(mac)
    }

    /// Verify against the current time
    pub fn verify(&self, headers: WebhookHeaders<'_>, payload: &str) -> Result<()> {
        self.verify_at(headers, payload, chrono::Utc::now().timestamp())
    }

    /// Verify against an explicit clock
    pub fn verify_at(&self, headers: WebhookHeaders<'_>, payload: &str, now: i64) -> Result<()> {
        let timestamp: i64 = headers
            .timestamp
            .trim()
            .parse()
            .map_err(|_| LmsError::UnverifiedEvent("Invalid timestamp header".into()))?;
        if now.abs_diff(timestamp) > WEBHOOK_TOLERANCE_SECS {
            return Err(LmsError::UnverifiedEvent("Message timestamp outside tolerance".into()));
        }

        let matched = headers
            .signature
            .split_whitespace()
            .filter_map(|entry| entry.strip_prefix("v1,"))
            .filter_map(|sig| STANDARD.decode(sig).ok())
            .any(|expected| {
                self.mac(headers.id, headers.timestamp, payload)
                    .is_ok_and(|mac| mac.verify_slice(&expected).is_ok())
            });

        if matched {
            Ok(())
        } else {
            Err(LmsError::UnverifiedEvent("No matching signature found".into()))
        }
    }

    /// Produce a `v1,<base64>` signature entry
    pub fn sign(&self, id: &str, timestamp: i64, payload: &str) -> Result<String> {
        let mac = self.mac(id, &timestamp.to_string(), payload)?;
        Ok(format!("v1,{}", STANDARD.encode(mac.finalize().into_bytes())))
    }
}

#[derive(Debug, Deserialize)]
struct LifecycleEvent {
    #[serde(rename = "type")]
    type_: String,
    data: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct EmailAddress {
    email_address: String,
}

/// User object carried by `user.created` and `user.updated`
#[derive(Debug, Deserialize)]
struct ClerkUserData {
    id: String,
    #[serde(default)]
    email_addresses: Vec<EmailAddress>,
    first_name: Option<String>,
    last_name: Option<String>,
    #[serde(default)]
    image_url: String,
    #[serde(default)]
    public_metadata: serde_json::Value,
}

impl ClerkUserData {
    fn profile(&self) -> UserProfile {
        let name = format!(
            "{} {}",
            self.first_name.as_deref().unwrap_or_default(),
            self.last_name.as_deref().unwrap_or_default()
        )
        .trim()
        .to_string();

        UserProfile {
            email: self
                .email_addresses
                .first()
                .map(|e| e.email_address.clone())
                .unwrap_or_default(),
            name,
            image_url: self.image_url.clone(),
            role: Role::from_metadata(
                self.public_metadata.get("role").and_then(serde_json::Value::as_str),
            ),
        }
    }
}

#[derive(Debug, Deserialize)]
struct DeletedUserData {
    id: String,
}

/// What a lifecycle event did
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LifecycleOutcome {
    Created(UserId),
    Updated(UserId),
    Deleted { user_id: UserId, existed: bool },
    Ignored(String),
}

/// Applies verified `user.*` events to the user collection
pub struct UserLifecycleHandler<S> {
    store: Arc<S>,
}

impl<S: UserStore> UserLifecycleHandler<S> {
    pub const fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Handle a verified raw body
    pub async fn handle(&self, payload: &str) -> Result<LifecycleOutcome> {
        let event: LifecycleEvent = serde_json::from_str(payload)
            .map_err(|e| LmsError::InvalidInput(format!("Malformed webhook body: {e}")))?;
        tracing::info!(event_type = %event.type_, "Processing identity webhook");

        match event.type_.as_str() {
            "user.created" | "user.updated" => {
                let data: ClerkUserData = serde_json::from_value(event.data)
                    .map_err(|e| LmsError::InvalidInput(format!("Malformed user data: {e}")))?;
                self.upsert(&data).await
            }
            "user.deleted" => {
                let data: DeletedUserData = serde_json::from_value(event.data)
                    .map_err(|e| LmsError::InvalidInput(format!("Malformed user data: {e}")))?;
                let user_id = UserId::new(data.id);
                let existed = self.store.delete_user(&user_id).await?;
                tracing::info!(user_id = %user_id, existed, "User deleted");
                Ok(LifecycleOutcome::Deleted { user_id, existed })
            }
            other => {
                tracing::debug!(event_type = %other, "Unhandled identity event");
                Ok(LifecycleOutcome::Ignored(other.to_string()))
            }
        }
    }

    async fn upsert(&self, data: &ClerkUserData) -> Result<LifecycleOutcome> {
        let user_id = UserId::new(data.id.clone());

        if self.store.upsert_profile(&user_id, data.profile()).await? {
            tracing::info!(user_id = %user_id, "User created");
            Ok(LifecycleOutcome::Created(user_id))
        } else {
            tracing::info!(user_id = %user_id, "User updated");
            Ok(LifecycleOutcome::Updated(user_id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lms_core::{CourseId, MemoryStore};
    use serde_json::json;

    // base64("lms-webhook-test-key")
    const SECRET: &str = "whsec_bG1zLXdlYmhvb2stdGVzdC1rZXk=";
    const NOW: i64 = 1_700_000_000;

    fn headers<'a>(signature: &'a str, timestamp: &'a str) -> WebhookHeaders<'a> {
        WebhookHeaders {
            id: "msg_1",
            timestamp,
            signature,
        }
    }

    #[test]
    fn test_signature_roundtrip_and_multiple_entries() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let payload = r#"{"type":"user.created","data":{}}"#;
        let sig = verifier.sign("msg_1", NOW, payload).unwrap();
        let header = format!("v1,AAAA {sig}");
        let ts = NOW.to_string();

        assert!(verifier.verify_at(headers(&header, &ts), payload, NOW + 10).is_ok());
        assert!(verifier.verify_at(headers(&header, &ts), "{}", NOW).is_err());
    }

    #[test]
    fn test_stale_or_wrong_key_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        let other = WebhookVerifier::new("whsec_b3RoZXIta2V5").unwrap();
        let payload = "{}";
        let ts = NOW.to_string();

        let sig = verifier.sign("msg_1", NOW, payload).unwrap();
        assert!(matches!(
            verifier.verify_at(headers(&sig, &ts), payload, NOW + 301),
            Err(LmsError::UnverifiedEvent(_))
        ));

        let forged = other.sign("msg_1", NOW, payload).unwrap();
        assert!(verifier.verify_at(headers(&forged, &ts), payload, NOW).is_err());
        assert!(verifier.verify_at(headers(&sig, "not-a-number"), payload, NOW).is_err());
    }

    #[test]
    fn test_extreme_timestamps_rejected() {
        let verifier = WebhookVerifier::new(SECRET).unwrap();
        for ts in [i64::MIN, i64::MAX] {
            let sig = verifier.sign("msg_1", ts, "{}").unwrap();
            assert!(matches!(
                verifier.verify_at(headers(&sig, &ts.to_string()), "{}", NOW),
                Err(LmsError::UnverifiedEvent(_))
            ));
        }
    }

    #[test]
    fn test_invalid_secret() {
        assert!(WebhookVerifier::new("whsec_***").is_err());
    }

    fn user_event(event_type: &str, first: &str) -> String {
        json!({
            "type": event_type,
            "data": {
                "id": "user_1",
                "email_addresses": [{ "email_address": "ada@example.com" }],
                "first_name": first,
                "last_name": "Lovelace",
                "image_url": "https://img.example.com/ada.png",
                "public_metadata": {}
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_create_then_update_preserves_enrollment() {
        let store = Arc::new(MemoryStore::new());
        let handler = UserLifecycleHandler::new(store.clone());
        let user_id = UserId::new("user_1");

        let created = handler.handle(&user_event("user.created", "Ada")).await.unwrap();
        assert_eq!(created, LifecycleOutcome::Created(user_id.clone()));

        let course_id = CourseId::generate();
        store.add_enrolled_course(&user_id, course_id).await.unwrap();

        let updated = handler.handle(&user_event("user.updated", "Augusta")).await.unwrap();
        assert_eq!(updated, LifecycleOutcome::Updated(user_id.clone()));

        let user = store.get_user(&user_id).await.unwrap().unwrap();
        assert_eq!(user.name, "Augusta Lovelace");
        assert_eq!(user.email, "ada@example.com");
        assert_eq!(user.role, Role::Student);
        assert_eq!(user.enrolled_courses, vec![course_id]);
    }

    #[tokio::test]
    async fn test_update_racing_enrollment_keeps_course() {
        let store = Arc::new(MemoryStore::new());
        let handler = UserLifecycleHandler::new(store.clone());
        let user_id = UserId::new("user_1");
        handler.handle(&user_event("user.created", "Ada")).await.unwrap();

        let mut courses = Vec::new();
        for _ in 0..4 {
            let course_id = CourseId::generate();
            let update = user_event("user.updated", "Augusta");
            let (updated, enrolled) = tokio::join!(
                handler.handle(&update),
                store.add_enrolled_course(&user_id, course_id),
            );
            assert_eq!(updated.unwrap(), LifecycleOutcome::Updated(user_id.clone()));
            assert_eq!(enrolled.unwrap(), Some(true));
            courses.push(course_id);
        }

        let user = store.get_user(&user_id).await.unwrap().unwrap();
        assert_eq!(user.enrolled_courses, courses);
    }

    #[tokio::test]
    async fn test_delete_absent_user_is_noop() {
        let handler = UserLifecycleHandler::new(Arc::new(MemoryStore::new()));
        let payload = json!({ "type": "user.deleted", "data": { "id": "user_9", "deleted": true } });
        let outcome = handler.handle(&payload.to_string()).await.unwrap();
        assert_eq!(
            outcome,
            LifecycleOutcome::Deleted {
                user_id: UserId::new("user_9"),
                existed: false
            }
        );
    }

    #[tokio::test]
    async fn test_other_events_ignored() {
        let handler = UserLifecycleHandler::new(Arc::new(MemoryStore::new()));
        let payload = json!({ "type": "session.created", "data": {} });
        assert!(matches!(
            handler.handle(&payload.to_string()).await.unwrap(),
            LifecycleOutcome::Ignored(t) if t == "session.created"
        ));
    }
}
