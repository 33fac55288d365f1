use serde::{Deserialize, Serialize};
use time::Date;

use crate::auth::extractors::AuthorizedUser;
use crate::auth::repo_types::{AuthProvider, User};

/// Inbound identity-provider claims, as posted by the client after the
/// provider-side handshake.
#[derive(Debug, Deserialize)]
pub struct ProviderClaims {
    pub identity_id: String,
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub date_of_birth: Option<Date>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    pub auth_provider: AuthProvider,
    #[serde(default)]
    pub raw_session_token: Option<String>,
}

/// Request body for login: re-arm the stored session for a known identity.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub identity_id: String,
    pub raw_session_token: String,
}

/// Request body for logout.
#[derive(Debug, Deserialize)]
pub struct LogoutRequest {
    pub identity_id: String,
}

/// Public part of the user returned to the client.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub identity_id: String,
    pub email: String,
    pub display_name: String,
    pub auth_provider: AuthProvider,
}

impl From<&User> for PublicUser {
    fn from(user: &User) -> Self {
        Self {
            identity_id: user.identity_id.clone(),
            email: user.email.clone(),
            display_name: user.display_name.clone(),
            auth_provider: user.auth_provider,
        }
    }
}

impl From<AuthorizedUser> for PublicUser {
    fn from(user: AuthorizedUser) -> Self {
        Self {
            identity_id: user.identity_id,
            email: user.email,
            display_name: user.display_name,
            auth_provider: user.auth_provider,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: &'static str,
}
