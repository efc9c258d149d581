//! Route handlers
//!
//! Each handler reads the encoding flag once and uses it for both the
//! request body and the response body.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::codec::Encoding;
use crate::error::TodoError;
use crate::item::Item;
use super::{ApiError, AppState};

const MISSING_TEXT_ON_CREATE: &str = "You should provide a text for todo list item";
const MISSING_TEXT_ON_UPDATE: &str = "You should provide a text to update todo list item";

type HandlerResult = Result<Response, ApiError>;

#[derive(Debug, Default, Deserialize)]
pub(crate) struct EncodingParams {
    use_protobuf: Option<String>,
}

impl EncodingParams {
    fn encoding(&self) -> Result<Encoding, TodoError> {
        Encoding::from_flag(self.use_protobuf.as_deref())
    }
}

/// Item ids in paths are plain decimal digits; anything else (signs
/// included) names nothing
fn parse_id(raw: &str) -> Result<u64, ApiError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ApiError::unknown_id(raw));
    }
    raw.parse::<u64>().map_err(|_| ApiError::unknown_id(raw))
}

fn encoded(status: StatusCode, encoding: Encoding, body: Vec<u8>) -> Response {
    (status, [(header::CONTENT_TYPE, encoding.content_type())], body).into_response()
}

fn encoded_item(status: StatusCode, encoding: Encoding, item: &Item) -> HandlerResult {
    Ok(encoded(status, encoding, encoding.encode_item(item)?))
}

/// GET /
pub(crate) async fn list_items(
    State(state): State<AppState>,
    Query(params): Query<EncodingParams>,
) -> HandlerResult {
    let encoding = params.encoding()?;
    let items = state.run(|store| store.list()).await?;

    Ok(encoded(StatusCode::OK, encoding, encoding.encode_list(&items)?))
}

/// GET /{id}
pub(crate) async fn get_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(params): Query<EncodingParams>,
) -> HandlerResult {
    let id = parse_id(&raw_id)?;
    let encoding = params.encoding()?;
    let item = state.run(move |store| store.get(id)).await?;

    encoded_item(StatusCode::OK, encoding, &item)
}

/// DELETE /{id}
pub(crate) async fn delete_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
) -> HandlerResult {
    let id = parse_id(&raw_id)?;
    state.run(move |store| store.delete(id)).await?;

    Ok(StatusCode::NO_CONTENT.into_response())
}

/// POST /
pub(crate) async fn create_item(
    State(state): State<AppState>,
    Query(params): Query<EncodingParams>,
    body: Bytes,
) -> HandlerResult {
    let encoding = params.encoding()?;
    let patch = encoding.decode_patch(&body)?;
    let text = patch
        .text
        .ok_or_else(|| TodoError::Validation(MISSING_TEXT_ON_CREATE.to_string()))?;

    let item = state.run(move |store| store.create(&text)).await?;
    tracing::debug!(id = item.id, "item created");

    encoded_item(StatusCode::CREATED, encoding, &item)
}

/// PUT /{id}
///
/// The item must exist before the body is looked at: an update of a
/// missing id is a 404 even when the body is also invalid.
pub(crate) async fn update_item(
    State(state): State<AppState>,
    Path(raw_id): Path<String>,
    Query(params): Query<EncodingParams>,
    body: Bytes,
) -> HandlerResult {
    let id = parse_id(&raw_id)?;
    let encoding = params.encoding()?;
    state.run(move |store| store.get(id)).await?;

    let patch = encoding.decode_patch(&body)?;
    if patch.text.is_none() {
        return Err(TodoError::Validation(MISSING_TEXT_ON_UPDATE.to_string()).into());
    }

    let item = state.run(move |store| store.update(id, &patch)).await?;

    encoded_item(StatusCode::OK, encoding, &item)
}
