//! Who is editing: the auth token sent with every request, and the profile the
//! backend reports for it.
//!
//! Passed explicitly to the API client instead of living in a process-wide store.

use serde::{Deserialize, Serialize};

/// Profile returned by `GET /api/auth/me`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl Profile {
    /// Display name, falling back to the local part of the email.
    #[must_use]
    pub fn name(&self) -> &str {
        match self.display_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => self.email.split('@').next().unwrap_or(&self.email),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    token: Option<String>,
}

impl Session {
    /// A session with no credentials.
    #[must_use]
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// A session authenticated by `token`. Blank tokens yield an anonymous session.
    #[must_use]
    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        if token.trim().is_empty() {
            return Self::anonymous();
        }
        Self { token: Some(token) }
    }

    /// `Cookie` header value carrying the auth token.
    #[must_use]
    pub fn cookie(&self) -> Option<String> {
        self.token.as_ref().map(|t| format!("token={t}"))
    }
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
