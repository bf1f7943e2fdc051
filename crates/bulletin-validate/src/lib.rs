use bulletin_model::{GradeRequest, RawGradeRequest};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Validate a raw grade-fetch request.
///
/// Every one of `username`, `password`, `semester` and `year` must be present
/// and non-empty. All missing fields are reported, not just the first one.
pub fn validate_request(raw: RawGradeRequest) -> Result<GradeRequest, Vec<ValidationError>> {
    let mut errors = Vec::new();

    let username = required("username", raw.username, &mut errors);
    let password = required("password", raw.password, &mut errors);
    let semester = required("semester", raw.semester, &mut errors);
    let year = required("year", raw.year, &mut errors);

    match (username, password, semester, year) {
        (Some(username), Some(password), Some(semester), Some(year)) => Ok(GradeRequest {
            username,
            password,
            semester,
            year,
        }),
        _ => {
            for e in &errors {
                tracing::warn!("{e}");
            }
            Err(errors)
        }
    }
}

fn required(
    name: &'static str,
    value: Option<String>,
    errors: &mut Vec<ValidationError>,
) -> Option<String> {
    match value {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.push(ValidationError::MissingField(name));
            None
        }
    }
}
