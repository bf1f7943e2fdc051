//! Markup heuristics for reading portal responses.
//!
//! The portal answers 200 for both good and bad outcomes, so each step is
//! judged by a fragment of markup it only produces on success. Each rule has
//! exactly one predicate here; the session code never matches strings itself.

use scraper::{Html, Selector};

/// Name of the hidden anti-forgery input on the login form.
pub const TOKEN_FIELD: &str = "__RequestVerificationToken";

/// Only rendered for an authenticated user (the "change password" link).
pub const LOGGED_IN_MARKER: &str = "ChangePassword";

/// Header label of a populated bulletin table.
pub const GRADE_TABLE_MARKER: &str = "Classe";

/// Extract the anti-forgery token from the login page.
///
/// Returns `None` when the field is absent or its value is empty.
pub fn extract_token(html: &str) -> Option<String> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse(&format!(r#"input[name="{TOKEN_FIELD}"]"#)).expect("valid selector");

    document
        .select(&selector)
        .next()
        .and_then(|input| input.value().attr("value"))
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Whether a login response is the authenticated landing page.
pub fn is_logged_in(body: &str) -> bool {
    body.contains(LOGGED_IN_MARKER)
}

/// Whether a bulletins response carries a grade table.
pub fn has_grade_table(body: &str) -> bool {
    !body.is_empty() && body.contains(GRADE_TABLE_MARKER)
}
