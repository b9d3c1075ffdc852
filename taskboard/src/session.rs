//! Authenticated session passed explicitly into every remote operation.

use std::fmt;

use crate::api::ApiError;

/// Bearer credentials for the remote API.
///
/// Tokens are issued by an external auth provider; this type only carries
/// them. `Debug` output never includes the token.
#[derive(Clone)]
pub struct Session {
    access_token: String,
    account_id: Option<String>,
}

impl Session {
    /// Creates a session from an access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            account_id: None,
        }
    }

    /// Attaches the signed-in account id.
    #[must_use]
    pub fn with_account(mut self, account_id: impl Into<String>) -> Self {
        self.account_id = Some(account_id.into());
        self
    }

    /// The raw access token.
    #[must_use]
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// The signed-in account, if known.
    #[must_use]
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    /// True when a non-blank token is present.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        !self.access_token.trim().is_empty()
    }

    /// The `Authorization` header value.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] when the token is missing, so no
    /// request is sent without credentials.
    pub fn bearer(&self) -> Result<String, ApiError> {
        if !self.is_authenticated() {
            return Err(ApiError::Unauthorized("missing access token".to_string()));
        }
        Ok(format!("Bearer {}", self.access_token))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("account_id", &self.account_id)
            .finish()
    }
}
