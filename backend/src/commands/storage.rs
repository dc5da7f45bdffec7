//! Public photo URLs

use crate::app::AppState;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

/// Serve a stored object with a content type guessed from its key
pub async fn serve_object(State(state): State<AppState>, Path(key): Path<String>) -> Response {
    match state.storage.read(&key).await {
        Ok(data) => {
            let mime = mime_guess::from_path(&key).first_or_octet_stream();
            ([(header::CONTENT_TYPE, mime.to_string())], data).into_response()
        }
        Err(e) => {
            tracing::debug!("Object {} not served: {}", key, e);
            StatusCode::NOT_FOUND.into_response()
        }
    }
}
