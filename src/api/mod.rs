//! Route handlers. Each one performs a single store call and shapes one
//! JSON response; failures flow out as [`AppError`].

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use chrono::Utc;
use tracing::info;

use crate::error::AppError;
use crate::models::{MessageResponse, Todo, TodoPayload};
use crate::state::AppState;

const TODO_NOT_FOUND: &str = "Todo not found";
const COMPLETED_NOT_FOUND: &str = "Completed todo not found";

fn has_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    else {
        return false;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// A request without a JSON content type, or with an empty body, counts as
/// an empty payload. Only a body that is not JSON at all is rejected.
fn read_payload(headers: &HeaderMap, body: &Bytes) -> Result<TodoPayload, AppError> {
    if !has_json_content_type(headers) || body.iter().all(u8::is_ascii_whitespace) {
        return Ok(TodoPayload::default());
    }

    serde_json::from_slice(body).map_err(|e| {
        AppError::BadRequest(format!("Failed to parse the request body as JSON: {}", e))
    })
}

pub async fn health(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.store.ping().await?;
    Ok(StatusCode::OK)
}

pub async fn list_active_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = state.store.find_by_completed(false).await?;
    Ok(Json(todos))
}

pub async fn list_all_todos(State(state): State<AppState>) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = state.store.find_all().await?;
    Ok(Json(todos))
}

pub async fn list_completed_todos(
    State(state): State<AppState>,
) -> Result<Json<Vec<Todo>>, AppError> {
    let todos = state.store.find_by_completed(true).await?;
    Ok(Json(todos))
}

pub async fn get_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Todo>, AppError> {
    let todo = state
        .store
        .find_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(TODO_NOT_FOUND))?;
    Ok(Json(todo))
}

pub async fn create_todo(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let payload = read_payload(&headers, &body)?;
    let todo = state.store.insert(payload.title, payload.description).await?;
    info!(id = %todo.id, "todo created");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("Todo added successfully")),
    ))
}

pub async fn update_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<MessageResponse>, AppError> {
    let payload = read_payload(&headers, &body)?;
    // the updated document is not echoed back
    state
        .store
        .update_by_id(&id, payload.title, payload.description)
        .await?
        .ok_or_else(|| AppError::not_found(TODO_NOT_FOUND))?;
    Ok(Json(MessageResponse::new("Todo updated successfully")))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .store
        .delete_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(TODO_NOT_FOUND))?;
    info!(%id, "todo deleted");
    Ok(Json(MessageResponse::new("Todo deleted successfully")))
}

/// Completing twice moves `completedOn` to the latest call.
pub async fn complete_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .store
        .complete_by_id(&id, Utc::now())
        .await?
        .ok_or_else(|| AppError::not_found(TODO_NOT_FOUND))?;
    info!(%id, "todo completed");
    Ok(Json(MessageResponse::new("Todo marked as completed")))
}

/// Deletes by id without checking that the todo is actually completed.
pub async fn delete_completed_todo(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    state
        .store
        .delete_by_id(&id)
        .await?
        .ok_or_else(|| AppError::not_found(COMPLETED_NOT_FOUND))?;
    info!(%id, "completed todo deleted");
    Ok(Json(MessageResponse::new("Completed todo deleted successfully")))
}

#[cfg(test)]
mod tests {
    use axum::http::HeaderValue;

    use super::*;

    fn json_headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn recognises_json_content_types() {
        assert!(has_json_content_type(&json_headers("application/json")));
        assert!(has_json_content_type(&json_headers("application/json; charset=utf-8")));
        assert!(has_json_content_type(&json_headers("application/merge-patch+json")));
        assert!(!has_json_content_type(&json_headers("text/plain")));
        assert!(!has_json_content_type(&HeaderMap::new()));
    }

    #[test]
    fn empty_json_body_is_an_empty_payload() {
        let headers = json_headers("application/json");
        assert_eq!(
            read_payload(&headers, &Bytes::new()).unwrap(),
            TodoPayload::default()
        );
        assert_eq!(
            read_payload(&headers, &Bytes::from_static(b"  \n")).unwrap(),
            TodoPayload::default()
        );
    }

    #[test]
    fn invalid_json_is_rejected() {
        let err = read_payload(
            &json_headers("application/json"),
            &Bytes::from_static(b"{\"title\": "),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }
}
