//! AWS request plumbing shared by the blob store and the model engine.

pub mod sigv4;

use std::fmt;

use crate::config::required_var;
use crate::error::Result;

pub use sigv4::{sha256_hex, sign_request, SigningParams};

/// Static AWS credentials resolved at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"..")
            .field("session_token", &self.session_token.as_ref().map(|_| ".."))
            .finish()
    }
}

impl AwsCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            session_token,
        }
    }

    /// Read the standard `AWS_*` credential variables. The result is never refreshed.
    pub fn from_env() -> Result<Self> {
        let session_token = std::env::var("AWS_SESSION_TOKEN")
            .ok()
            .filter(|t| !t.is_empty());
        if session_token.is_some() {
            tracing::warn!("AWS_SESSION_TOKEN set; temporary credentials are not refreshed, restart before they expire");
        }
        Ok(Self {
            access_key_id: required_var("AWS_ACCESS_KEY_ID")?,
            secret_access_key: required_var("AWS_SECRET_ACCESS_KEY")?,
            session_token,
        })
    }

    /// Credentials as environment variables for child processes.
    pub fn to_env(&self) -> Vec<(String, String)> {
        let mut env = vec![
            ("AWS_ACCESS_KEY_ID".to_string(), self.access_key_id.clone()),
            (
                "AWS_SECRET_ACCESS_KEY".to_string(),
                self.secret_access_key.clone(),
            ),
        ];
        if let Some(token) = &self.session_token {
            env.push(("AWS_SESSION_TOKEN".to_string(), token.clone()));
        }
        env
    }
}
