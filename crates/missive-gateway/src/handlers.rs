// SPDX-FileCopyrightText: 2026 Missive Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers for the messages API.
//!
//! Handles POST /, GET /, GET /{id}, PATCH /{id}, DELETE /{id} and the
//! unauthenticated GET /health.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::error;

use missive_core::{HealthStatus, MessageId, MissiveError, MutationOutcome, UserId, Version};

use crate::models::{
    EditedMessageTextV1, MessageReadMarkV1, MessageUpdatesV1, NewPersonalMessageV1,
    PersonalMessageV1, MIME_EDITED_MESSAGE_TEXT_V1, MIME_MESSAGE_READ_MARK_V1,
    MIME_MESSAGE_UPDATES_V1, MIME_NEW_PERSONAL_MESSAGE_V1, MIME_PERSONAL_MESSAGE_V1,
};
use crate::server::GatewayState;

/// Header carrying the id under which a server-side failure was logged.
pub const ISSUE_ID_HEADER: HeaderName = HeaderName::from_static("x-issue-id");

/// A [`MissiveError`] rendered as an HTTP response.
///
/// Request errors become 400 with the message as plain text. Infrastructure
/// failures are logged with a fresh issue id and answered with a bare 500
/// that carries only that id.
#[derive(Debug)]
pub struct ApiError(pub MissiveError);

impl From<MissiveError> for ApiError {
    fn from(e: MissiveError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0 {
            MissiveError::InvalidRequest(msg) | MissiveError::Forbidden(msg) => {
                (StatusCode::BAD_REQUEST, msg).into_response()
            }
            MissiveError::Unauthenticated => StatusCode::UNAUTHORIZED.into_response(),
            other => {
                let issue = uuid::Uuid::new_v4().to_string();
                error!(issue_id = %issue, error = %other, "request failed");
                let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
                if let Ok(value) = HeaderValue::from_str(&issue) {
                    response.headers_mut().insert(ISSUE_ID_HEADER, value);
                }
                response
            }
        }
    }
}

/// Map a conditional-update outcome to its status. `Applied` carries the new ETag.
pub fn outcome_response(outcome: MutationOutcome) -> Response {
    match outcome {
        MutationOutcome::Applied(version) => (StatusCode::OK, etag(version)).into_response(),
        MutationOutcome::NotFound => StatusCode::NOT_FOUND.into_response(),
        MutationOutcome::Deleted => StatusCode::GONE.into_response(),
        MutationOutcome::VersionConflict => StatusCode::PRECONDITION_FAILED.into_response(),
        MutationOutcome::NotModified => StatusCode::NOT_MODIFIED.into_response(),
    }
}

fn etag(version: Version) -> [(HeaderName, String); 1] {
    [(header::ETAG, version.to_string())]
}

fn header_str<'a>(headers: &'a HeaderMap, name: HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}

/// Parse a path id. Anything non-numeric is simply not found.
fn parse_id(raw: &str) -> Result<MessageId, Response> {
    raw.parse::<i64>()
        .map(MessageId)
        .map_err(|_| StatusCode::NOT_FOUND.into_response())
}

/// Parse `If-Match` into the expected version. Missing or malformed is 412.
fn parse_if_match(headers: &HeaderMap) -> Result<Version, Response> {
    header_str(headers, header::IF_MATCH)
        .map(|v| v.trim().trim_matches('"'))
        .and_then(|v| v.parse::<i64>().ok())
        .map(Version)
        .ok_or_else(|| StatusCode::PRECONDITION_FAILED.into_response())
}

fn parse_body<T: DeserializeOwned>(body: &Bytes, schema: &str) -> Result<T, Response> {
    serde_json::from_slice(body).map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            format!("request body violates '{schema}' schema"),
        )
            .into_response()
    })
}

/// POST /
pub async fn send_message(
    State(state): State<GatewayState>,
    Extension(user): Extension<UserId>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    if header_str(&headers, header::CONTENT_TYPE) != Some(MIME_NEW_PERSONAL_MESSAGE_V1) {
        return Ok(StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response());
    }
    let draft: NewPersonalMessageV1 = match parse_body(&body, "newPersonalMessage.v1") {
        Ok(draft) => draft,
        Err(response) => return Ok(response),
    };

    let created = state.service.send(&user, draft.into()).await?;
    Ok((
        StatusCode::CREATED,
        [
            (header::LOCATION, format!("/{}", created.id)),
            (header::ETAG, created.version.to_string()),
        ],
    )
        .into_response())
}

/// Query parameters of GET /. Kept as strings so bad input gets a precise message.
#[derive(Debug, Default, Deserialize)]
pub struct SyncParams {
    pub after: Option<String>,
    pub limit: Option<String>,
}

/// GET /
pub async fn sync_messages(
    State(state): State<GatewayState>,
    Extension(user): Extension<UserId>,
    headers: HeaderMap,
    Query(params): Query<SyncParams>,
) -> Result<Response, ApiError> {
    match header_str(&headers, header::ACCEPT) {
        None | Some("") => {}
        Some(accept) if accept == MIME_MESSAGE_UPDATES_V1 => {}
        Some(_) => return Ok(StatusCode::NOT_ACCEPTABLE.into_response()),
    }

    let after = parse_integer_param(params.after.as_deref(), "after")?;
    let limit = parse_integer_param(params.limit.as_deref(), "limit")?;

    let entries = state.service.sync(&user, after, limit).await?;
    Ok((
        [(header::CONTENT_TYPE, MIME_MESSAGE_UPDATES_V1)],
        Json(MessageUpdatesV1::from(entries)),
    )
        .into_response())
}

fn parse_integer_param(raw: Option<&str>, name: &str) -> Result<Option<i64>, MissiveError> {
    match raw {
        None | Some("") => Ok(None),
        Some(v) => v.parse().map(Some).map_err(|_| {
            MissiveError::InvalidRequest(format!("parameter '{name}' must be an integer"))
        }),
    }
}

/// GET /{id}
pub async fn get_message(
    State(state): State<GatewayState>,
    Extension(user): Extension<UserId>,
    Path(raw_id): Path<String>,
) -> Result<Response, ApiError> {
    let id = match parse_id(&raw_id) {
        Ok(id) => id,
        Err(response) => return Ok(response),
    };
    let Some(message) = state.service.get(&user, id).await? else {
        return Ok(StatusCode::NOT_FOUND.into_response());
    };
    Ok((
        [(header::CONTENT_TYPE, MIME_PERSONAL_MESSAGE_V1)],
        Json(PersonalMessageV1::from(message)),
    )
        .into_response())
}

/// PATCH /{id}
///
/// The content type picks the change: new text or a read mark.
pub async fn modify_message(
    State(state): State<GatewayState>,
    Extension(user): Extension<UserId>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, ApiError> {
    let mime = header_str(&headers, header::CONTENT_TYPE);
    if mime != Some(MIME_EDITED_MESSAGE_TEXT_V1) && mime != Some(MIME_MESSAGE_READ_MARK_V1) {
        return Ok(StatusCode::UNSUPPORTED_MEDIA_TYPE.into_response());
    }
    let (id, expected) = match (parse_id(&raw_id), parse_if_match(&headers)) {
        (Err(response), _) | (_, Err(response)) => return Ok(response),
        (Ok(id), Ok(expected)) => (id, expected),
    };
    // A message the user cannot see is 404 whatever the body holds.
    if state.service.get(&user, id).await?.is_none() {
        return Ok(StatusCode::NOT_FOUND.into_response());
    }

    let outcome = if mime == Some(MIME_EDITED_MESSAGE_TEXT_V1) {
        let edit: EditedMessageTextV1 = match parse_body(&body, "editedMessageText.v1") {
            Ok(edit) => edit,
            Err(response) => return Ok(response),
        };
        state
            .service
            .edit_text(&user, id, expected, edit.text)
            .await?
    } else {
        let mark: MessageReadMarkV1 = match parse_body(&body, "messageReadMark.v1") {
            Ok(mark) => mark,
            Err(response) => return Ok(response),
        };
        if !mark.read {
            return Err(MissiveError::InvalidRequest(
                "a message cannot be marked as unread".into(),
            )
            .into());
        }
        state.service.mark_read(&user, id, expected).await?
    };
    Ok(outcome_response(outcome))
}

/// DELETE /{id}
pub async fn delete_message(
    State(state): State<GatewayState>,
    Extension(user): Extension<UserId>,
    Path(raw_id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let (id, expected) = match (parse_id(&raw_id), parse_if_match(&headers)) {
        (Err(response), _) | (_, Err(response)) => return Ok(response),
        (Ok(id), Ok(expected)) => (id, expected),
    };
    let outcome = state.service.delete(&user, id, expected).await?;
    Ok(outcome_response(outcome))
}

/// Response body for GET /health.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
}

/// GET /health (unauthenticated)
pub async fn health(State(state): State<GatewayState>) -> Response {
    let (code, status) = match state.service.health().await {
        Ok(HealthStatus::Healthy) => (StatusCode::OK, "healthy".to_string()),
        Ok(HealthStatus::Degraded(reason)) => (StatusCode::OK, format!("degraded: {reason}")),
        Ok(HealthStatus::Unhealthy(reason)) => {
            (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {reason}"))
        }
        Err(e) => (StatusCode::SERVICE_UNAVAILABLE, format!("unhealthy: {e}")),
    };
    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_secs: state.start_time.elapsed().as_secs(),
        }),
    )
        .into_response()
}
