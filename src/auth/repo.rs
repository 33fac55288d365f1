use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::auth::repo_types::{NewUser, User};

/// Store failures surfaced to callers, never retried internally. A unique-key
/// race between concurrent first logins for the same email lands here as
/// `Duplicate` rather than crashing the request.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("duplicate key on {0}")]
    Duplicate(&'static str),
    #[error("store unavailable: {0}")]
    Unavailable(#[source] sqlx::Error),
}

/// Narrow contract over the identity record store: atomic single-record
/// read/write by primary key (`identity_id`) and secondary unique key
/// (`email`).
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_identity(&self, identity_id: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn insert(&self, user: NewUser) -> Result<User, StoreError>;
    /// Persist the full record, keyed by the internal row id.
    async fn update(&self, user: &User) -> Result<User, StoreError>;
}

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const USER_COLUMNS: &str = "id, identity_id, email, display_name, date_of_birth, avatar_url, \
     auth_provider, session_token, session_expiry, is_active, created_at";

fn map_sqlx(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            let key = if db.message().contains("email") {
                "email"
            } else {
                "identity_id"
            };
            return StoreError::Duplicate(key);
        }
    }
    StoreError::Unavailable(e)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_identity(&self, identity_id: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE identity_id = $1"
        ))
        .bind(identity_id)
        .fetch_optional(&self.db)
        .await
        .map_err(map_sqlx)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email)
            .fetch_optional(&self.db)
            .await
            .map_err(map_sqlx)
    }

    async fn insert(&self, user: NewUser) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (identity_id, email, display_name, date_of_birth,
                               avatar_url, auth_provider, session_token, session_expiry)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(&user.identity_id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.date_of_birth)
        .bind(&user.avatar_url)
        .bind(user.auth_provider)
        .bind(&user.session_token)
        .bind(user.session_expiry)
        .fetch_one(&self.db)
        .await
        .map_err(map_sqlx)
    }

    async fn update(&self, user: &User) -> Result<User, StoreError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET identity_id = $2, email = $3, display_name = $4, date_of_birth = $5,
                avatar_url = $6, auth_provider = $7, session_token = $8,
                session_expiry = $9, is_active = $10
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.identity_id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(user.date_of_birth)
        .bind(&user.avatar_url)
        .bind(user.auth_provider)
        .bind(&user.session_token)
        .bind(user.session_expiry)
        .bind(user.is_active)
        .fetch_one(&self.db)
        .await
        .map_err(map_sqlx)
    }
}
