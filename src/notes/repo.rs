use async_trait::async_trait;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::auth::repo::StoreError;

#[derive(Debug, Clone, Serialize, FromRow)]
pub struct Note {
    pub id: Uuid,
    pub user_id: String, // provider identity of the owner
    pub content: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Note persistence, always scoped by the owning identity. Ownership misses
/// on update/delete read as "not there" rather than "not yours".
#[async_trait]
pub trait NoteStore: Send + Sync {
    async fn insert(&self, user_id: &str, content: &str) -> Result<Note, StoreError>;
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Note>, StoreError>;
    async fn update_content(
        &self,
        id: Uuid,
        user_id: &str,
        content: &str,
    ) -> Result<Option<Note>, StoreError>;
    async fn delete(&self, id: Uuid, user_id: &str) -> Result<bool, StoreError>;
}

pub struct PgNoteStore {
    db: PgPool,
}

impl PgNoteStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl NoteStore for PgNoteStore {
    async fn insert(&self, user_id: &str, content: &str) -> Result<Note, StoreError> {
        sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (user_id, content)
            VALUES ($1, $2)
            RETURNING id, user_id, content, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(content)
        .fetch_one(&self.db)
        .await
        .map_err(StoreError::Unavailable)
    }

    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Note>, StoreError> {
        sqlx::query_as::<_, Note>(
            r#"
            SELECT id, user_id, content, created_at, updated_at
            FROM notes
            WHERE user_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.db)
        .await
        .map_err(StoreError::Unavailable)
    }

    async fn update_content(
        &self,
        id: Uuid,
        user_id: &str,
        content: &str,
    ) -> Result<Option<Note>, StoreError> {
        sqlx::query_as::<_, Note>(
            r#"
            UPDATE notes
            SET content = $3, updated_at = now()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, content, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(user_id)
        .bind(content)
        .fetch_optional(&self.db)
        .await
        .map_err(StoreError::Unavailable)
    }

    async fn delete(&self, id: Uuid, user_id: &str) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.db)
            .await
            .map_err(StoreError::Unavailable)?;
        Ok(result.rows_affected() > 0)
    }
}
