//! Server Configuration

/// Settings read from the environment at startup
#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// Listen address
    pub bind_addr: String,

    /// Redirect base when a request carries no `Origin` header
    pub frontend_origin: String,

    /// Svix secret for the identity webhook (`whsec_...`)
    pub clerk_webhook_secret: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:5000".into(),
            frontend_origin: "http://localhost:5173".into(),
            clerk_webhook_secret: None,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or(defaults.bind_addr),
            frontend_origin: std::env::var("FRONTEND_ORIGIN").unwrap_or(defaults.frontend_origin),
            clerk_webhook_secret: std::env::var("CLERK_WEBHOOK_SECRET")
                .ok()
                .filter(|s| !s.trim().is_empty()),
        }
    }
}
