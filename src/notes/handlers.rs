use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{dto::MessageResponse, extractors::AuthorizedUser},
    error::ApiError,
    notes::{
        dto::NoteRequest,
        repo::{Note, NoteStore},
    },
    state::AppState,
};

pub fn note_routes() -> Router<AppState> {
    Router::new()
        .route("/note/create", post(create_note))
        .route("/note", get(list_notes))
        .route("/note/:note_id", put(update_note).delete(delete_note))
}

fn trimmed_content(body: &NoteRequest) -> Result<&str, ApiError> {
    let content = body.content.trim();
    if content.is_empty() {
        return Err(ApiError::Validation("note content is required".into()));
    }
    Ok(content)
}

/// POST /api/note/create
#[instrument(skip(state, user, body), fields(user = %user.identity_id))]
pub async fn create_note(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Json(body): Json<NoteRequest>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let content = trimmed_content(&body)?;
    let note = state.notes.insert(&user.identity_id, content).await?;
    info!(note_id = %note.id, "note created");
    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /api/note — caller's notes, newest first.
#[instrument(skip(state, user), fields(user = %user.identity_id))]
pub async fn list_notes(
    State(state): State<AppState>,
    user: AuthorizedUser,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state.notes.list_for_user(&user.identity_id).await?;
    Ok(Json(notes))
}

/// PUT /api/note/:note_id — ownership miss reads as not-found.
#[instrument(skip(state, user, body), fields(user = %user.identity_id))]
pub async fn update_note(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Path(note_id): Path<Uuid>,
    Json(body): Json<NoteRequest>,
) -> Result<Json<Note>, ApiError> {
    let content = trimmed_content(&body)?;
    let note = state
        .notes
        .update_content(note_id, &user.identity_id, content)
        .await?
        .ok_or(ApiError::NotFound("note not found"))?;
    Ok(Json(note))
}

/// DELETE /api/note/:note_id
#[instrument(skip(state, user), fields(user = %user.identity_id))]
pub async fn delete_note(
    State(state): State<AppState>,
    user: AuthorizedUser,
    Path(note_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, ApiError> {
    let deleted = state.notes.delete(note_id, &user.identity_id).await?;
    if !deleted {
        return Err(ApiError::NotFound("note not found"));
    }
    info!(%note_id, "note deleted");
    Ok(Json(MessageResponse {
        message: "note deleted",
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::repo_types::AuthProvider;

    fn caller(identity_id: &str) -> AuthorizedUser {
        AuthorizedUser {
            identity_id: identity_id.to_string(),
            email: "a@x.com".to_string(),
            display_name: "Ada".to_string(),
            auth_provider: AuthProvider::Email,
        }
    }

    #[tokio::test]
    async fn whitespace_only_content_is_rejected_and_nothing_persists() {
        let state = AppState::fake();
        let err = create_note(
            State(state.clone()),
            caller("p_1"),
            Json(NoteRequest {
                content: "  ".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::Validation(_)));

        let notes = state.notes.list_for_user("p_1").await.expect("list");
        assert!(notes.is_empty());
    }

    #[tokio::test]
    async fn create_trims_and_lists_newest_first() {
        let state = AppState::fake();
        create_note(
            State(state.clone()),
            caller("p_1"),
            Json(NoteRequest {
                content: "  first  ".into(),
            }),
        )
        .await
        .expect("create first");
        create_note(
            State(state.clone()),
            caller("p_1"),
            Json(NoteRequest {
                content: "second".into(),
            }),
        )
        .await
        .expect("create second");

        let Json(notes) = list_notes(State(state), caller("p_1")).await.expect("list");
        assert_eq!(notes.len(), 2);
        assert_eq!(notes[0].content, "second");
        assert_eq!(notes[1].content, "first");
    }

    #[tokio::test]
    async fn update_and_delete_are_scoped_to_the_owner() {
        let state = AppState::fake();
        let (_, Json(note)) = create_note(
            State(state.clone()),
            caller("p_1"),
            Json(NoteRequest {
                content: "mine".into(),
            }),
        )
        .await
        .expect("create");

        // Another identity cannot see, edit, or delete it.
        let err = update_note(
            State(state.clone()),
            caller("p_2"),
            Path(note.id),
            Json(NoteRequest {
                content: "hijacked".into(),
            }),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        let err = delete_note(State(state.clone()), caller("p_2"), Path(note.id))
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::NotFound(_)));

        // The owner can.
        let Json(updated) = update_note(
            State(state.clone()),
            caller("p_1"),
            Path(note.id),
            Json(NoteRequest {
                content: "edited".into(),
            }),
        )
        .await
        .expect("update");
        assert_eq!(updated.content, "edited");

        delete_note(State(state.clone()), caller("p_1"), Path(note.id))
            .await
            .expect("delete");
        let notes = state.notes.list_for_user("p_1").await.expect("list");
        assert!(notes.is_empty());
    }
}
