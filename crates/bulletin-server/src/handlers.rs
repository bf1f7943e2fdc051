//! Request handlers for the grade endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Form, Json,
};
use bulletin_model::{GradeResponse, RawGradeRequest};

use crate::error::ApiError;
use crate::server::AppState;

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// POST /api/fetch-grades: log in to the portal and return the raw bulletin markup.
pub async fn fetch_grades(State(state): State<Arc<AppState>>, request: Request) -> Response {
    match run_fetch(&state, request).await {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response_with(state.diagnostics),
    }
}

async fn run_fetch(state: &AppState, request: Request) -> Result<GradeResponse, ApiError> {
    let raw = read_grade_request(request).await?;
    let grade_request = bulletin_validate::validate_request(raw).map_err(ApiError::Validation)?;

    let raw_html = bulletin_acquire::fetch_grades(&state.portal, &state.client, &grade_request).await?;
    Ok(GradeResponse { raw_html })
}

/// Decode the body as a urlencoded form or JSON. An empty body decodes to an
/// empty request so that it is reported as missing fields.
async fn read_grade_request(request: Request) -> Result<RawGradeRequest, ApiError> {
    if is_form(request.headers()) {
        let Form(raw) = Form::<RawGradeRequest>::from_request(request, &())
            .await
            .map_err(|e| body_rejection(e.status(), e.body_text()))?;
        return Ok(raw);
    }

    let bytes = Bytes::from_request(request, &())
        .await
        .map_err(|e| body_rejection(e.status(), e.body_text()))?;
    if bytes.is_empty() {
        return Ok(RawGradeRequest::default());
    }

    let Json(raw) = Json::<RawGradeRequest>::from_bytes(&bytes)
        .map_err(|e| ApiError::InvalidBody(e.body_text()))?;
    Ok(raw)
}

/// Oversized bodies keep their 413; every other undecodable body is a 400.
fn body_rejection(status: StatusCode, reason: String) -> ApiError {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::BodyTooLarge(reason)
    } else {
        ApiError::InvalidBody(reason)
    }
}

fn is_form(headers: &HeaderMap) -> bool {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"))
}
