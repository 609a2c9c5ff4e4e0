use std::env;
use std::net::SocketAddr;

use crate::error::{AdminError, Result};

const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_STATIC_DIR: &str = "static";
const DEFAULT_BODY_LIMIT: usize = 10 * 1024 * 1024; // 10 MiB

/// Runtime configuration of the console server
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the backend REST service
    pub endpoint_server: String,

    /// Address the console listens on
    pub bind: SocketAddr,

    /// Directory served under `/static`
    pub static_dir: String,

    /// Largest request body relayed to the backend, in bytes
    pub body_limit: usize,
}

impl Config {
    /// Configuration pointing at `endpoint_server` with default settings.
    pub fn new(endpoint_server: impl Into<String>) -> Self {
        Config {
            endpoint_server: endpoint_server.into(),
            bind: SocketAddr::from(([127, 0, 0, 1], 3000)),
            static_dir: DEFAULT_STATIC_DIR.to_string(),
            body_limit: DEFAULT_BODY_LIMIT,
        }
    }

    /// Read the configuration from the environment
    ///
    /// # Environment
    /// * `ENDPOINT_SERVER` - backend base URL (required)
    /// * `ADMIN_BIND` - listen address, default `127.0.0.1:3000`
    /// * `ADMIN_STATIC_DIR` - static asset directory, default `static`
    /// * `ADMIN_BODY_LIMIT` - relayed body limit in bytes, default 10 MiB
    ///
    /// # Errors
    /// * Returns `AdminError::Config` if the endpoint is missing or a value does not parse
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an injectable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let endpoint_server = lookup("ENDPOINT_SERVER")
            .filter(|v| !v.trim().is_empty())
            .ok_or_else(|| AdminError::Config("ENDPOINT_SERVER is not set".to_string()))?;
        if !endpoint_server.starts_with("http://") && !endpoint_server.starts_with("https://") {
            return Err(AdminError::Config(format!(
                "ENDPOINT_SERVER must be an http(s) URL, got {}",
                endpoint_server
            )));
        }

        let bind = lookup("ADMIN_BIND")
            .unwrap_or_else(|| DEFAULT_BIND.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| AdminError::Config(format!("ADMIN_BIND: {}", e)))?;

        let static_dir = lookup("ADMIN_STATIC_DIR").unwrap_or_else(|| DEFAULT_STATIC_DIR.to_string());

        let body_limit = match lookup("ADMIN_BODY_LIMIT") {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|e| AdminError::Config(format!("ADMIN_BODY_LIMIT: {}", e)))?,
            None => DEFAULT_BODY_LIMIT,
        };

        Ok(Config {
            endpoint_server: endpoint_server.trim_end_matches('/').to_string(),
            bind,
            static_dir,
            body_limit,
        })
    }
}
