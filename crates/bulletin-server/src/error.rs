//! Translation of failures into HTTP status codes and JSON error envelopes.

use std::error::Error as StdError;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use bulletin_acquire::FetchError;
use bulletin_model::ErrorEnvelope;
use bulletin_validate::ValidationError;

/// How much failure detail goes back to the caller.
///
/// Full detail is always logged server-side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Diagnostics {
    /// Echo raw portal bodies and cause chains in error envelopes.
    #[default]
    Expose,
    /// Return only the error summary.
    Redact,
}

#[derive(Debug)]
pub enum ApiError {
    /// The body could not be decoded at all.
    InvalidBody(String),
    /// The body exceeded the extractor's size limit.
    BodyTooLarge(String),
    Validation(Vec<ValidationError>),
    Fetch(FetchError),
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        Self::Fetch(e)
    }
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody(_) | Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::BodyTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Fetch(FetchError::LoginRejected { .. }) => StatusCode::UNAUTHORIZED,
            Self::Fetch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn envelope(&self, diagnostics: Diagnostics) -> ErrorEnvelope {
        match self {
            Self::InvalidBody(reason) => ErrorEnvelope::new("Invalid request body").with_details(reason.clone()),
            Self::BodyTooLarge(reason) => ErrorEnvelope::new("Request body too large").with_details(reason.clone()),
            Self::Validation(errors) => {
                let fields: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
                ErrorEnvelope::new("Missing required fields").with_details(fields.join(", "))
            }
            Self::Fetch(err) => {
                let envelope = ErrorEnvelope::new(fetch_summary(err));
                if diagnostics == Diagnostics::Redact {
                    return envelope;
                }
                match err {
                    FetchError::TokenMissing => envelope,
                    FetchError::LoginRejected { body } | FetchError::GradesUnavailable { body } => {
                        envelope.with_details(body.clone())
                    }
                    FetchError::Client(_) | FetchError::Transport { .. } => {
                        let chain = cause_chain(err);
                        envelope
                            .with_details(chain.join(": "))
                            .with_stack(render_stack(&chain))
                    }
                }
            }
        }
    }

    /// Log the failure and build the response.
    pub fn into_response_with(self, diagnostics: Diagnostics) -> Response {
        let status = self.status();
        match &self {
            Self::Fetch(err @ (FetchError::Client(_) | FetchError::Transport { .. })) => {
                tracing::error!(status = %status, error = %cause_chain(err).join(": "), "Grade fetch failed");
            }
            Self::Fetch(err) => {
                tracing::warn!(status = %status, error = %err, body_bytes = ?err.body().map(str::len), "Grade fetch failed");
            }
            Self::InvalidBody(reason) | Self::BodyTooLarge(reason) => {
                tracing::warn!(status = %status, reason = %reason, "Rejected request body")
            }
            Self::Validation(errors) => tracing::warn!(status = %status, missing = errors.len(), "Rejected request"),
        }
        (status, Json(self.envelope(diagnostics))).into_response()
    }
}

fn fetch_summary(err: &FetchError) -> &'static str {
    match err {
        FetchError::TokenMissing => "Failed to retrieve CSRF token",
        FetchError::LoginRejected { .. } => "Login failed",
        FetchError::GradesUnavailable { .. } => "Could not fetch grades",
        FetchError::Client(_) | FetchError::Transport { .. } => "Something went wrong",
    }
}

/// The error followed by each of its sources, outermost first.
fn cause_chain(err: &(dyn StdError + 'static)) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    chain
}

fn render_stack(chain: &[String]) -> String {
    let mut lines = Vec::with_capacity(chain.len());
    for (i, message) in chain.iter().enumerate() {
        if i == 0 {
            lines.push(message.clone());
        } else {
            lines.push(format!("  caused by: {message}"));
        }
    }
    lines.join("\n")
}
