//! Mock Identity Provider
//!
//! Opaque bearer tokens mapped to users, with roles kept in memory.

use std::collections::HashMap;

use async_trait::async_trait;
use lms_core::{IdentityProvider, LmsError, Result, Role, UserId};
use tokio::sync::RwLock;

/// In-memory identity provider for tests and local development
#[derive(Default)]
pub struct MockIdentityProvider {
    tokens: RwLock<HashMap<String, UserId>>,
    roles: RwLock<HashMap<UserId, Role>>,
}

impl MockIdentityProvider {
    /// Create a new mock provider
    pub fn new() -> Self {
        Self::default()
    }

    /// Accept `token` as a credential for `user_id`
    pub async fn register(&self, token: &str, user_id: UserId, role: Role) {
        self.roles.write().await.insert(user_id.clone(), role);
        self.tokens.write().await.insert(token.to_string(), user_id);
    }
}

#[async_trait]
impl IdentityProvider for MockIdentityProvider {
    async fn authenticate(&self, bearer: &str) -> Result<UserId> {
        self.tokens
            .read()
            .await
            .get(bearer.trim())
            .cloned()
            .ok_or_else(|| LmsError::Unauthorized("Unknown session token".into()))
    }

    async fn role(&self, user_id: &UserId) -> Result<Role> {
        Ok(self.roles.read().await.get(user_id).copied().unwrap_or_default())
    }

    async fn set_role(&self, user_id: &UserId, role: Role) -> Result<()> {
        self.roles.write().await.insert(user_id.clone(), role);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_register_and_promote() {
        let provider = MockIdentityProvider::new();
        let user = UserId::new("user_1");
        provider.register("tok", user.clone(), Role::Student).await;

        assert_eq!(provider.authenticate("tok").await.unwrap(), user);
        assert!(provider.authenticate("nope").await.is_err());

        provider.set_role(&user, Role::Educator).await.unwrap();
        assert_eq!(provider.role(&user).await.unwrap(), Role::Educator);
    }
}
