use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

/// Which identity provider most recently authenticated the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "auth_provider", rename_all = "lowercase")]
pub enum AuthProvider {
    Google,
    Email,
}

/// User record in the database. One row per unique `identity_id` AND per
/// unique `email`; an account merge rewrites `identity_id` in place.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub identity_id: String, // provider-issued subject, unique
    pub email: String,       // unique, secondary reconciliation key
    pub display_name: String,
    pub date_of_birth: Date,
    pub avatar_url: Option<String>,
    pub auth_provider: AuthProvider,
    #[serde(skip_serializing)]
    pub session_token: Option<String>, // stored verbatim, never exposed in JSON
    pub session_expiry: Option<OffsetDateTime>, // absent means no active session
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

/// Field set for a first-time reconciliation insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub identity_id: String,
    pub email: String,
    pub display_name: String,
    pub date_of_birth: Date,
    pub avatar_url: Option<String>,
    pub auth_provider: AuthProvider,
    pub session_token: Option<String>,
    pub session_expiry: Option<OffsetDateTime>,
}
