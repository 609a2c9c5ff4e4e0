//! Session plumbing for the console.
//!
//! Credentials live in HTTP-only cookies set by the login relays; the
//! signed-in operator's profile lives in a [`SessionContext`] that callers
//! own and pass explicitly. It is filled on load and cleared on logout.

use serde::{Deserialize, Serialize};

use crate::backend::SessionBackend;
use crate::error::Result;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";
pub const API_KEY_COOKIE: &str = "apiKey";
pub const PUBLIC_KEY_COOKIE: &str = "publicKey";

/// Every cookie the login relay sets.
pub const SESSION_COOKIES: [&str; 4] = [
    ACCESS_TOKEN_COOKIE,
    REFRESH_TOKEN_COOKIE,
    API_KEY_COOKIE,
    PUBLIC_KEY_COOKIE,
];

/// `Authorization` header value for a backend token.
///
/// The backend expects the literal scheme `Bear`.
pub fn bearer(token: &str) -> String {
    format!("Bear {}", token)
}

/// Tokens handed out by a successful admin login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyToken {
    pub access_token: String,
    pub refresh_token: String,
    pub api_key: String,
    pub public_key: String,
}

impl KeyToken {
    /// Cookie name and value pairs, in `SESSION_COOKIES` order.
    pub fn cookies(&self) -> [(&'static str, &str); 4] {
        [
            (ACCESS_TOKEN_COOKIE, self.access_token.as_str()),
            (REFRESH_TOKEN_COOKIE, self.refresh_token.as_str()),
            (API_KEY_COOKIE, self.api_key.as_str()),
            (PUBLIC_KEY_COOKIE, self.public_key.as_str()),
        ]
    }
}

/// Profile of the signed-in operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub email: String,
    #[serde(alias = "fullName")]
    pub name: String,
}

#[derive(Debug, Clone, Default)]
pub struct SessionContext {
    profile: Option<UserProfile>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the operator profile unless one is already loaded.
    ///
    /// Unauthorized and not-found responses surface as errors whose kind is
    /// a login redirect; the context stays empty.
    pub async fn init<B>(&mut self, backend: &B) -> Result<&UserProfile>
    where
        B: SessionBackend + ?Sized,
    {
        let profile = match self.profile.take() {
            Some(profile) => profile,
            None => {
                let profile = backend.user_profile().await?;
                log::info!("session started for {}", profile.email);
                profile
            }
        };
        Ok(self.profile.insert(profile))
    }

    /// Log out upstream and drop the profile.
    ///
    /// The local profile is cleared even when the upstream call fails.
    pub async fn logout<B>(&mut self, backend: &B) -> Result<()>
    where
        B: SessionBackend + ?Sized,
    {
        let result = backend.logout().await;
        self.teardown();
        result
    }

    pub fn teardown(&mut self) {
        if let Some(profile) = self.profile.take() {
            log::info!("session ended for {}", profile.email);
        }
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.profile.is_some()
    }
}
