use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
};
use time::OffsetDateTime;
use tracing::warn;

use crate::auth::repo::UserStore;
use crate::auth::repo_types::AuthProvider;
use crate::auth::token::decode_unverified;
use crate::error::ApiError;
use crate::state::AppState;

/// Identity resolved by the session gate, attached to the request for
/// downstream handlers.
#[derive(Debug, Clone)]
pub struct AuthorizedUser {
    pub identity_id: String,
    pub email: String,
    pub display_name: String,
    pub auth_provider: AuthProvider,
}

/// Validate a presented bearer token against the stored session state.
/// Ordered checks; every failure is terminal for the request and is never
/// downgraded to an anonymous pass.
pub async fn authorize(
    store: &dyn UserStore,
    token: &str,
) -> Result<AuthorizedUser, ApiError> {
    let claims = decode_unverified(token)?;

    let subject = claims
        .sub
        .filter(|s| !s.is_empty())
        .ok_or(ApiError::Unauthenticated("session token missing subject"))?;

    let user = store
        .find_by_identity(&subject)
        .await?
        .ok_or(ApiError::UserNotFound)?;

    if !user.is_active {
        return Err(ApiError::AccountDisabled);
    }

    // The stored token is the authenticity anchor: the decoder never checks
    // signatures, so a presented token only passes if it is the exact string
    // we last issued a session for.
    if let Some(stored) = &user.session_token {
        if stored != token {
            warn!(identity_id = %user.identity_id, "presented token does not match stored session");
            return Err(ApiError::SessionMismatch);
        }
    }

    if let Some(expiry) = user.session_expiry {
        if expiry < OffsetDateTime::now_utc() {
            return Err(ApiError::SessionExpired);
        }
    }

    Ok(AuthorizedUser {
        identity_id: user.identity_id,
        email: user.email,
        display_name: user.display_name,
        auth_provider: user.auth_provider,
    })
}

/// Pull the raw token from `Authorization: Bearer <t>` or, failing that, the
/// configured provider-specific fallback header.
fn bearer_token(headers: &HeaderMap, fallback_header: &str) -> Option<String> {
    if let Some(auth) = headers.get(AUTHORIZATION).and_then(|h| h.to_str().ok()) {
        if let Some(token) = auth
            .strip_prefix("Bearer ")
            .or_else(|| auth.strip_prefix("bearer "))
        {
            return Some(token.to_string());
        }
    }
    headers
        .get(fallback_header)
        .and_then(|h| h.to_str().ok())
        .map(|s| s.to_string())
}

#[async_trait]
impl FromRequestParts<AppState> for AuthorizedUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers, &state.config.session.fallback_header)
            .ok_or(ApiError::Unauthenticated("no session token provided"))?;
        authorize(state.users.as_ref(), &token).await
    }
}

#[cfg(test)]
mod tests {
    use time::macros::date;
    use time::Duration;
    use uuid::Uuid;

    use super::*;
    use crate::auth::repo::memory::MemoryUserStore;
    use crate::auth::repo_types::User;
    use crate::auth::token::tests::mint;

    fn seeded(store: &MemoryUserStore, identity_id: &str, token: Option<&str>) -> User {
        let user = User {
            id: Uuid::new_v4(),
            identity_id: identity_id.to_string(),
            email: "a@x.com".to_string(),
            display_name: "Ada".to_string(),
            date_of_birth: date!(1990 - 06 - 15),
            avatar_url: None,
            auth_provider: AuthProvider::Email,
            session_token: token.map(|t| t.to_string()),
            session_expiry: token.map(|_| OffsetDateTime::now_utc() + Duration::hours(1)),
            is_active: true,
            created_at: OffsetDateTime::now_utc(),
        };
        store.seed(user.clone());
        user
    }

    #[tokio::test]
    async fn valid_session_passes_the_gate() {
        let store = MemoryUserStore::default();
        let token = mint("p_1", "a@x.com", 4102444800);
        seeded(&store, "p_1", Some(&token));

        let user = authorize(&store, &token).await.expect("authorized");
        assert_eq!(user.identity_id, "p_1");
        assert_eq!(user.email, "a@x.com");
        assert_eq!(user.auth_provider, AuthProvider::Email);
    }

    #[tokio::test]
    async fn unknown_subject_fails_user_not_found() {
        let store = MemoryUserStore::default();
        let token = mint("p_missing", "a@x.com", 4102444800);

        let err = authorize(&store, &token).await.unwrap_err();
        assert!(matches!(err, ApiError::UserNotFound));
    }

    #[tokio::test]
    async fn disabled_account_fails_even_with_matching_token() {
        let store = MemoryUserStore::default();
        let token = mint("p_1", "a@x.com", 4102444800);
        let mut user = seeded(&store, "p_1", Some(&token));
        user.is_active = false;
        store.update(&user).await.expect("update");

        let err = authorize(&store, &token).await.unwrap_err();
        assert!(matches!(err, ApiError::AccountDisabled));
    }

    #[tokio::test]
    async fn replaced_session_fails_mismatch() {
        let store = MemoryUserStore::default();
        let stale = mint("p_1", "a@x.com", 4102444800);
        let current = mint("p_1", "a@x.com", 4102444801);
        seeded(&store, "p_1", Some(&current));

        let err = authorize(&store, &stale).await.unwrap_err();
        assert!(matches!(err, ApiError::SessionMismatch));
    }

    #[tokio::test]
    async fn expired_session_fails_even_when_tokens_match() {
        let store = MemoryUserStore::default();
        let token = mint("p_1", "a@x.com", 4102444800);
        let mut user = seeded(&store, "p_1", Some(&token));
        user.session_expiry = Some(OffsetDateTime::now_utc() - Duration::hours(1));
        store.update(&user).await.expect("update");

        let err = authorize(&store, &token).await.unwrap_err();
        assert!(matches!(err, ApiError::SessionExpired));
    }

    #[tokio::test]
    async fn token_without_subject_is_unauthenticated() {
        use base64::engine::general_purpose::URL_SAFE_NO_PAD;
        use base64::Engine;
        let store = MemoryUserStore::default();
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"RS256"}"#);
        let payload = URL_SAFE_NO_PAD.encode(br#"{"email":"a@x.com"}"#);
        let token = format!("{header}.{payload}.sig");

        let err = authorize(&store, &token).await.unwrap_err();
        assert!(matches!(err, ApiError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn garbage_token_is_malformed() {
        let store = MemoryUserStore::default();
        let err = authorize(&store, "not-a-token").await.unwrap_err();
        assert!(matches!(err, ApiError::MalformedToken));
    }

    #[test]
    fn bearer_token_prefers_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, "Bearer abc".parse().unwrap());
        headers.insert("provider_session_token", "def".parse().unwrap());
        assert_eq!(
            bearer_token(&headers, "provider_session_token").as_deref(),
            Some("abc")
        );
    }

    #[test]
    fn bearer_token_falls_back_to_provider_header() {
        let mut headers = HeaderMap::new();
        headers.insert("provider_session_token", "def".parse().unwrap());
        assert_eq!(
            bearer_token(&headers, "provider_session_token").as_deref(),
            Some("def")
        );
        assert_eq!(bearer_token(&HeaderMap::new(), "provider_session_token"), None);
    }
}
