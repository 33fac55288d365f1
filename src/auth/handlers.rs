use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use time::{Duration, OffsetDateTime};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{LoginRequest, LogoutRequest, MessageResponse, ProviderClaims, PublicUser},
        extractors::AuthorizedUser,
        repo::UserStore,
        repo_types::User,
        services::{reconcile, ReconcileOutcome},
    },
    error::ApiError,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/create", post(create_user))
        .route("/user/login", post(login))
        .route("/user/logout", post(logout))
        .route("/user/profile", get(profile))
        .route("/user/:identity_id", get(get_user))
}

/// POST /api/user/create — reconcile inbound provider claims into exactly one
/// local user record.
#[instrument(skip(state, claims))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(claims): Json<ProviderClaims>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let session = &state.config.session;
    let (user, outcome) = reconcile(
        state.users.as_ref(),
        session.merge_policy,
        session.ttl_hours,
        claims,
    )
    .await?;

    info!(identity_id = %user.identity_id, ?outcome, "user reconciled");
    let status = match outcome {
        ReconcileOutcome::Created => StatusCode::CREATED,
        ReconcileOutcome::Refreshed | ReconcileOutcome::Merged => StatusCode::OK,
    };
    Ok((status, Json(user)))
}

/// POST /api/user/login — store a fresh session token for a known identity.
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<PublicUser>, ApiError> {
    if payload.identity_id.trim().is_empty() || payload.raw_session_token.trim().is_empty() {
        return Err(ApiError::Validation(
            "identity_id and raw_session_token are required".into(),
        ));
    }

    let mut user = state
        .users
        .find_by_identity(&payload.identity_id)
        .await?
        .ok_or(ApiError::NotFound("user not found"))?;

    user.session_token = Some(payload.raw_session_token);
    user.session_expiry =
        Some(OffsetDateTime::now_utc() + Duration::hours(state.config.session.ttl_hours));
    user.is_active = true;
    let user = state.users.update(&user).await?;

    info!(identity_id = %user.identity_id, "login successful");
    Ok(Json(PublicUser::from(&user)))
}

/// POST /api/user/logout — clear the stored session marker.
#[instrument(skip(state, payload))]
pub async fn logout(
    State(state): State<AppState>,
    Json(payload): Json<LogoutRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    if payload.identity_id.trim().is_empty() {
        return Err(ApiError::Validation("identity_id is required".into()));
    }

    let mut user = state
        .users
        .find_by_identity(&payload.identity_id)
        .await?
        .ok_or(ApiError::NotFound("user not found"))?;

    user.session_token = None;
    user.session_expiry = None;
    state.users.update(&user).await?;

    info!(identity_id = %payload.identity_id, "logout successful");
    Ok(Json(MessageResponse {
        message: "logout successful",
    }))
}

/// GET /api/user/profile — the gate already resolved the caller.
#[instrument]
pub async fn profile(user: AuthorizedUser) -> Json<PublicUser> {
    Json(PublicUser::from(user))
}

/// GET /api/user/:identity_id
#[instrument(skip(state, _caller))]
pub async fn get_user(
    State(state): State<AppState>,
    _caller: AuthorizedUser,
    Path(identity_id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user = state
        .users
        .find_by_identity(&identity_id)
        .await?
        .ok_or(ApiError::NotFound("user not found"))?;
    Ok(Json(user))
}
