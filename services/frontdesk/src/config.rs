//! Server configuration

use anyhow::Result;

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the HTTP listener
    pub bind_addr: String,
    /// Whether the session cookie carries the `Secure` attribute
    pub cookie_secure: bool,
    /// Optional first admin account created on an empty database
    pub bootstrap_admin: Option<BootstrapAdmin>,
}

/// Credentials of the initial administrator
#[derive(Debug, Clone)]
pub struct BootstrapAdmin {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl ServerConfig {
    /// Create a new ServerConfig from environment variables
    ///
    /// # Environment Variables
    /// - `BIND_ADDR`: listen address (default: "0.0.0.0:3000")
    /// - `COOKIE_SECURE`: `true` in production (default: false)
    /// - `ADMIN_EMAIL` / `ADMIN_PASSWORD` / `ADMIN_NAME`: first admin, only
    ///   used while the user table is empty
    pub fn from_env() -> Result<Self> {
        let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let cookie_secure = std::env::var("COOKIE_SECURE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        let credentials = (std::env::var("ADMIN_EMAIL"), std::env::var("ADMIN_PASSWORD"));
        let bootstrap_admin = match credentials {
            (Ok(email), Ok(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some(BootstrapAdmin {
                    name: std::env::var("ADMIN_NAME")
                        .unwrap_or_else(|_| "Administrator".to_string()),
                    email: email.trim().to_string(),
                    password,
                })
            }
            _ => None,
        };

        Ok(ServerConfig {
            bind_addr,
            cookie_secure,
            bootstrap_admin,
        })
    }
}
