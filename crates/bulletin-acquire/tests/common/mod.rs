// In-process stand-in for the Moutamadris portal.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::{Form, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;

pub const TOKEN: &str = "CfDJ8-mock-token";

/// One request the mock portal received.
#[derive(Debug, Clone)]
pub struct Hit {
    pub path: String,
    pub form: HashMap<String, String>,
    pub query: HashMap<String, String>,
    pub headers: HeaderMap,
}

impl Hit {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

pub struct MockPortal {
    /// Known accounts: username -> password.
    pub users: HashMap<String, String>,
    pub serve_token: bool,
    pub login_page_delay: Option<Duration>,
    pub culture_status: StatusCode,
    /// Replaces the generated grade table when set.
    pub grades_body: Option<String>,
    pub hits: Mutex<Vec<Hit>>,
}

impl Default for MockPortal {
    fn default() -> Self {
        let mut users = HashMap::new();
        users.insert("alice@taalim.ma".to_string(), "alice-pw".to_string());
        users.insert("bob@taalim.ma".to_string(), "bob-pw".to_string());
        Self {
            users,
            serve_token: true,
            login_page_delay: None,
            culture_status: StatusCode::OK,
            grades_body: None,
            hits: Mutex::new(Vec::new()),
        }
    }
}

impl MockPortal {
    pub fn hits(&self) -> Vec<Hit> {
        self.hits.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.hits().into_iter().map(|h| h.path).collect()
    }

    fn record(&self, path: &str, headers: &HeaderMap, form: HashMap<String, String>, query: HashMap<String, String>) {
        self.hits.lock().unwrap().push(Hit {
            path: path.to_string(),
            form,
            query,
            headers: headers.clone(),
        });
    }
}

pub fn cookies(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            Some((name.to_string(), value.to_string()))
        })
        .collect()
}

async fn login_page(State(portal): State<Arc<MockPortal>>, headers: HeaderMap) -> Response {
    portal.record("GET /Account", &headers, HashMap::new(), HashMap::new());
    if let Some(delay) = portal.login_page_delay {
        tokio::time::sleep(delay).await;
    }

    if !portal.serve_token {
        return "<html><body><h1>Maintenance</h1></body></html>".into_response();
    }

    let html = format!(
        r#"<html><body><form method="post" action="/moutamadris/Account">
        <input name="__RequestVerificationToken" type="hidden" value="{TOKEN}" />
        <input name="UserName" type="text" /><input name="Password" type="password" />
        </form></body></html>"#
    );
    (
        [(header::SET_COOKIE, ".AspNetCore.Antiforgery=af-cookie; Path=/")],
        html,
    )
        .into_response()
}

async fn login(
    State(portal): State<Arc<MockPortal>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    portal.record("POST /Account", &headers, form.clone(), HashMap::new());

    let token_ok = form.get("__RequestVerificationToken").map(String::as_str) == Some(TOKEN)
        && cookies(&headers).contains_key(".AspNetCore.Antiforgery");
    let user = form.get("UserName").cloned().unwrap_or_default();
    let password_ok = portal.users.get(&user).is_some() && portal.users.get(&user) == form.get("Password");

    if token_ok && password_ok {
        (
            [(header::SET_COOKIE, format!("session={user}; Path=/"))],
            r#"<html><body><a href="/moutamadris/Account/ChangePassword">Change password</a></body></html>"#,
        )
            .into_response()
    } else {
        r#"<html><body><div class="validation-summary-errors">Invalid login attempt</div></body></html>"#
            .into_response()
    }
}

async fn set_culture(
    State(portal): State<Arc<MockPortal>>,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
) -> Response {
    portal.record("POST /General/SetCulture", &headers, HashMap::new(), query);
    (
        portal.culture_status,
        [(header::SET_COOKIE, "culture=en; Path=/")],
        "",
    )
        .into_response()
}

async fn bulletins(
    State(portal): State<Arc<MockPortal>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    portal.record("POST /TuteurEleves/GetBulletins", &headers, form.clone(), HashMap::new());

    if let Some(body) = &portal.grades_body {
        return body.clone().into_response();
    }

    let ajax = headers.get("x-requested-with").and_then(|v| v.to_str().ok()) == Some("XMLHttpRequest");
    let jar = cookies(&headers);
    let Some(user) = jar.get("session").filter(|_| ajax) else {
        return String::new().into_response();
    };

    let annee = form.get("Annee").cloned().unwrap_or_default();
    let id_session = form.get("IdSession").cloned().unwrap_or_default();
    let culture = jar.get("culture").cloned().unwrap_or_else(|| "fr".to_string());
    format!(
        r#"<table class="bulletin" data-culture="{culture}"><tr><th>Classe</th><td>3APIC-2</td></tr><tr><td class="student">{user}</td><td class="annee">{annee}</td><td class="session">{id_session}</td></tr></table>"#
    )
    .into_response()
}

/// Start a mock portal on a random local port.
pub async fn start_portal(portal: MockPortal) -> (SocketAddr, Arc<MockPortal>) {
    let portal = Arc::new(portal);
    let app = Router::new()
        .route("/moutamadris/Account", get(login_page).post(login))
        .route("/moutamadris/General/SetCulture", post(set_culture))
        .route("/moutamadris/TuteurEleves/GetBulletins", post(bulletins))
        .with_state(portal.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, portal)
}

pub fn portal_url(addr: SocketAddr) -> String {
    format!("http://{addr}/moutamadris")
}
