use serde::{Deserialize, Serialize};

/// A grade-fetch request exactly as submitted by the caller.
///
/// Every field is optional here so that missing values can be reported
/// as a validation failure rather than a deserialization error.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawGradeRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Portal session identifier for the grading period (sent as `IdSession`).
    #[serde(default)]
    pub semester: Option<String>,
    /// Academic year, e.g. "2023/2024".
    #[serde(default)]
    pub year: Option<String>,
}

/// A validated grade-fetch request: all four fields present and non-empty.
#[derive(Clone, PartialEq, Eq)]
pub struct GradeRequest {
    pub username: String,
    pub password: String,
    pub semester: String,
    pub year: String,
}

impl GradeRequest {
    /// The starting year of the academic year, i.e. everything before the first `/`.
    pub fn year_prefix(&self) -> &str {
        year_prefix(&self.year)
    }
}

// Hand-written so the password never ends up in logs.
impl std::fmt::Debug for GradeRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GradeRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("semester", &self.semester)
            .field("year", &self.year)
            .finish()
    }
}

/// Return the segment of an academic year before the first `/`.
///
/// "2023/2024" becomes "2023"; a value without a separator is returned as is.
pub fn year_prefix(year: &str) -> &str {
    year.split('/').next().unwrap_or(year)
}
