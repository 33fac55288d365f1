use lazy_static::lazy_static;
use regex::Regex;
use time::{Duration, OffsetDateTime};
use tracing::{debug, info};

use crate::auth::dto::ProviderClaims;
use crate::auth::repo::UserStore;
use crate::auth::repo_types::{NewUser, User};
use crate::config::MergePolicy;
use crate::error::ApiError;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Which reconciliation branch won.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Known `identity_id`: returning session on the same provider.
    Refreshed,
    /// Known `email` under a new provider identity: record rebound in place.
    Merged,
    /// First time seen: fresh record.
    Created,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Map inbound provider claims to exactly one local User record. Total over
/// well-formed input: every call yields a materialized user, with at most one
/// store write. First matching branch wins: identity_id, then email, then
/// create.
pub async fn reconcile(
    store: &dyn UserStore,
    policy: MergePolicy,
    ttl_hours: i64,
    claims: ProviderClaims,
) -> Result<(User, ReconcileOutcome), ApiError> {
    if claims.identity_id.trim().is_empty() {
        return Err(ApiError::InvalidClaims("identity_id is required".into()));
    }
    let email = claims.email.trim().to_lowercase();
    if email.is_empty() {
        return Err(ApiError::InvalidClaims("email is required".into()));
    }
    if !is_valid_email(&email) {
        return Err(ApiError::InvalidClaims(format!("invalid email: {email}")));
    }

    let now = OffsetDateTime::now_utc();
    let ttl = Duration::hours(ttl_hours);

    // Branch 1: same provider identity as before.
    if let Some(mut user) = store.find_by_identity(&claims.identity_id).await? {
        if let Some(token) = claims.raw_session_token {
            user.session_token = Some(token);
            user.session_expiry = Some(now + ttl);
            user.is_active = true;
            if user.auth_provider != claims.auth_provider {
                info!(
                    identity_id = %user.identity_id,
                    provider = ?claims.auth_provider,
                    "auth provider changed on returning identity"
                );
                user.auth_provider = claims.auth_provider;
            }
            let user = store.update(&user).await?;
            return Ok((user, ReconcileOutcome::Refreshed));
        }
        // No fresh token supplied: nothing to persist.
        debug!(identity_id = %user.identity_id, "reconcile without token, record untouched");
        return Ok((user, ReconcileOutcome::Refreshed));
    }

    // Branch 2: same person, different provider than previously recorded.
    if let Some(mut user) = store.find_by_email(&email).await? {
        if policy == MergePolicy::Reject {
            return Err(ApiError::IdentityConflict);
        }
        info!(
            email = %user.email,
            old_identity = %user.identity_id,
            new_identity = %claims.identity_id,
            "rebinding account to new provider identity"
        );
        user.identity_id = claims.identity_id;
        user.auth_provider = claims.auth_provider;
        user.session_expiry = claims.raw_session_token.as_ref().map(|_| now + ttl);
        user.session_token = claims.raw_session_token;
        user.is_active = true;
        if let Some(name) = non_empty(claims.display_name) {
            user.display_name = name;
        }
        if let Some(url) = non_empty(claims.avatar_url) {
            user.avatar_url = Some(url);
        }
        let user = store.update(&user).await?;
        return Ok((user, ReconcileOutcome::Merged));
    }

    // Branch 3: never seen before.
    let display_name = non_empty(claims.display_name)
        .ok_or_else(|| ApiError::InvalidClaims("display_name is required".into()))?;
    let date_of_birth = claims
        .date_of_birth
        .ok_or_else(|| ApiError::InvalidClaims("date_of_birth is required".into()))?;
    let new = NewUser {
        identity_id: claims.identity_id,
        email,
        display_name,
        date_of_birth,
        avatar_url: non_empty(claims.avatar_url),
        auth_provider: claims.auth_provider,
        session_expiry: claims.raw_session_token.as_ref().map(|_| now + ttl),
        session_token: claims.raw_session_token,
    };
    let user = store.insert(new).await?;
    info!(identity_id = %user.identity_id, email = %user.email, "new user created");
    Ok((user, ReconcileOutcome::Created))
}
