use serde::Serialize;

/// A grade report fetched from the portal, with provenance.
#[derive(Debug, Clone, Serialize)]
pub struct FetchedBulletin {
    pub source: SourceInfo,
    pub raw_html: String,
}

/// Provenance information about a fetch. Never carries credentials.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub url: String,
    pub fetched_at: String,
    /// Academic year as requested (e.g. "2023/2024").
    pub year: String,
    pub semester: String,
}

impl FetchedBulletin {
    /// Wrap a raw grade document, stamping it with the current time.
    pub fn new(url: &str, year: &str, semester: &str, raw_html: String) -> Self {
        Self {
            source: SourceInfo {
                url: url.to_string(),
                fetched_at: chrono::Utc::now().to_rfc3339(),
                year: year.to_string(),
                semester: semester.to_string(),
            },
            raw_html,
        }
    }

    /// Generate a source.md provenance file.
    pub fn source_md(&self) -> String {
        format!(
            "# Source\n\n\
             - **URL:** {}\n\
             - **Fetched:** {}\n\
             - **Year:** {}\n\
             - **Semester:** {}\n\
             - **Bytes:** {}\n",
            self.source.url,
            self.source.fetched_at,
            self.source.year,
            self.source.semester,
            self.raw_html.len(),
        )
    }
}
