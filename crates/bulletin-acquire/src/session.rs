use std::sync::Arc;

use bulletin_model::GradeRequest;
use reqwest::cookie::Jar;
use reqwest::header::{ORIGIN, REFERER};
use reqwest::{Client, RequestBuilder};

use crate::config::{ClientConfig, PortalConfig};
use crate::error::{FetchError, Step};
use crate::markers;

/// Fetch the raw bulletin markup for one student.
///
/// Runs the full portal choreography on a fresh session: login page for the
/// anti-forgery token, login, switch the portal to English, then request the
/// bulletins fragment. Stops at the first step that fails.
pub async fn fetch_grades(
    portal: &PortalConfig,
    config: &ClientConfig,
    request: &GradeRequest,
) -> Result<String, FetchError> {
    tracing::info!(username = %request.username, year = %request.year, semester = %request.semester, "Fetching bulletin");

    let session = PortalSession::new(portal.clone(), config)?;
    let token = session.fetch_token().await?;
    session.login(&request.username, &request.password, &token).await?;
    session.set_culture().await;
    let html = session
        .fetch_bulletins(request.year_prefix(), &request.semester)
        .await?;

    tracing::info!(username = %request.username, bytes = html.len(), "Fetched bulletin");
    Ok(html)
}

/// A browser-like session against the portal: one client, one cookie jar.
///
/// Sessions are never shared; build a new one per grade request.
pub struct PortalSession {
    client: Client,
    portal: PortalConfig,
}

impl PortalSession {
    pub fn new(portal: PortalConfig, config: &ClientConfig) -> Result<Self, FetchError> {
        let jar = Arc::new(Jar::default());
        let mut builder = Client::builder()
            .cookie_provider(jar)
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone());

        match &config.proxy {
            Some(proxy) => {
                let mut outbound = reqwest::Proxy::all(proxy.url()).map_err(FetchError::Client)?;
                if let Some(creds) = &proxy.credentials {
                    outbound = outbound.basic_auth(&creds.username, &creds.password);
                }
                tracing::debug!(proxy = %proxy.url(), "Routing portal traffic through proxy");
                builder = builder.proxy(outbound);
            }
            // Direct means direct: ignore HTTP(S)_PROXY from the environment.
            None => builder = builder.no_proxy(),
        }

        let client = builder.build().map_err(FetchError::Client)?;
        Ok(Self { client, portal })
    }

    /// GET the login page and pull the anti-forgery token out of its form.
    pub async fn fetch_token(&self) -> Result<String, FetchError> {
        let url = self.portal.login_url();
        tracing::debug!(url = %url, "Fetching login page");

        let html = read_body(Step::LoginPage, self.client.get(&url)).await?;
        tracing::debug!(bytes = html.len(), "Received login page");

        markers::extract_token(&html).ok_or(FetchError::TokenMissing)
    }

    /// POST the login form. The jar keeps the resulting authentication cookie.
    pub async fn login(&self, username: &str, password: &str, token: &str) -> Result<(), FetchError> {
        let url = self.portal.login_url();
        tracing::debug!(url = %url, username = %username, "Submitting login form");

        let request = self.browser_post(&url, &url).form(&[
            ("UserName", username),
            ("Password", password),
            (markers::TOKEN_FIELD, token),
        ]);
        let body = read_body(Step::Login, request).await?;

        if !markers::is_logged_in(&body) {
            tracing::warn!(username = %username, bytes = body.len(), "Login rejected");
            return Err(FetchError::LoginRejected { body });
        }
        tracing::info!(username = %username, "Logged in");
        Ok(())
    }

    /// Ask the portal to render English. Best effort: failures are logged and ignored.
    pub async fn set_culture(&self) {
        let url = self.portal.culture_url();
        tracing::debug!(url = %url, "Switching portal culture to en");

        match self.client.post(&url).query(&[("culture", "en")]).send().await {
            Ok(response) if !response.status().is_success() => {
                tracing::warn!(status = %response.status(), "Culture switch returned non-success status");
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!(step = %Step::SetCulture, error = %e, "Culture switch failed, continuing");
            }
        }
    }

    /// POST the bulletins query as the portal's own AJAX call would.
    ///
    /// `annee` is the starting year only (e.g. "2023"), `id_session` the term.
    pub async fn fetch_bulletins(&self, annee: &str, id_session: &str) -> Result<String, FetchError> {
        let url = self.portal.bulletins_url();
        tracing::debug!(url = %url, annee = %annee, id_session = %id_session, "Requesting bulletins");

        let request = self
            .browser_post(&url, &self.portal.grades_referer())
            .header("X-Requested-With", "XMLHttpRequest")
            .form(&[("Annee", annee), ("IdSession", id_session)]);
        let body = read_body(Step::Bulletins, request).await?;

        if !markers::has_grade_table(&body) {
            tracing::warn!(bytes = body.len(), "Bulletins response has no grade table");
            return Err(FetchError::GradesUnavailable { body });
        }
        Ok(body)
    }

    fn browser_post(&self, url: &str, referer: &str) -> RequestBuilder {
        self.client
            .post(url)
            .header(REFERER, referer)
            .header(ORIGIN, self.portal.origin())
    }
}

async fn read_body(step: Step, request: RequestBuilder) -> Result<String, FetchError> {
    let response = request.send().await.map_err(FetchError::transport(step))?;
    tracing::debug!(%step, status = %response.status(), "Portal responded");

    response
        .error_for_status()
        .map_err(FetchError::transport(step))?
        .text()
        .await
        .map_err(FetchError::transport(step))
}
