//! Identity Provider Strategy
//!
//! Authentication, session tokens and role metadata live with an external
//! identity provider. The server works exclusively through this interface.

use async_trait::async_trait;

use crate::error::Result;
use crate::ids::UserId;
use crate::user::Role;

/// Strategy trait for identity providers
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Resolve a bearer credential to the user it was issued for
    async fn authenticate(&self, bearer: &str) -> Result<UserId>;

    /// Current role from the provider's user metadata
    async fn role(&self, user_id: &UserId) -> Result<Role>;

    /// Store a new role in the provider's user metadata
    async fn set_role(&self, user_id: &UserId, role: Role) -> Result<()>;

    /// Check if the provider is reachable and configured correctly
    async fn health_check(&self) -> Result<bool>;

    /// Provider name for logs
    fn name(&self) -> &str;
}
