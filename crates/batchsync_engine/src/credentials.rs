use std::sync::RwLock;

use serde::{Deserialize, Serialize};

/// Token pair issued by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: u64,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: default_token_type(),
            expires_in: 0,
        }
    }

    pub(crate) fn is_complete(&self) -> bool {
        !self.access_token.is_empty() && !self.refresh_token.is_empty()
    }
}

/// Bearer credentials shared by every request the accessor makes.
///
/// With `bypass` set no Authorization header is sent at all; this is only
/// meant for local development against an unauthenticated backend.
#[derive(Debug, Default)]
pub struct Credentials {
    tokens: RwLock<Option<AuthTokens>>,
    bypass: bool,
}

impl Credentials {
    pub fn new(tokens: Option<AuthTokens>) -> Self {
        Self {
            tokens: RwLock::new(tokens),
            bypass: false,
        }
    }

    pub fn bypassed() -> Self {
        Self {
            tokens: RwLock::new(None),
            bypass: true,
        }
    }

    pub fn is_bypassed(&self) -> bool {
        self.bypass
    }

    pub fn access_token(&self) -> Option<String> {
        if self.bypass {
            return None;
        }
        let guard = self.tokens.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard.as_ref().map(|tokens| tokens.access_token.clone())
    }

    pub fn refresh_token(&self) -> Option<String> {
        let guard = self.tokens.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        guard
            .as_ref()
            .map(|tokens| tokens.refresh_token.clone())
            .filter(|token| !token.is_empty())
    }

    pub fn has_tokens(&self) -> bool {
        self.access_token().is_some()
    }

    pub fn set(&self, tokens: AuthTokens) {
        let mut guard = self.tokens.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = Some(tokens);
    }

    pub fn clear(&self) {
        let mut guard = self.tokens.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        *guard = None;
    }
}
