// Minimal Moutamadris stand-in plus a running bulletin server in front of it.

#![allow(dead_code)]

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Form, State},
    http::{header, HeaderMap},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use bulletin_acquire::{ClientConfig, PortalConfig};
use bulletin_server::{AppState, Diagnostics};
use tokio::net::TcpListener;

pub const PASSWORD: &str = "correct-horse";

/// What the fake portal serves.
#[derive(Default)]
pub struct FakePortal {
    pub omit_token: bool,
    pub grades_body: Option<String>,
    /// Total requests received, any route.
    pub requests: AtomicUsize,
}

impl FakePortal {
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

fn session_user(headers: &HeaderMap) -> Option<String> {
    let cookie = headers.get(header::COOKIE)?.to_str().ok()?;
    cookie
        .split(';')
        .find_map(|pair| pair.trim().strip_prefix("session="))
        .map(str::to_string)
}

async fn login_page(State(portal): State<Arc<FakePortal>>) -> Response {
    portal.requests.fetch_add(1, Ordering::SeqCst);
    if portal.omit_token {
        return "<html><body>no form today</body></html>".into_response();
    }
    r#"<form><input name="__RequestVerificationToken" type="hidden" value="tok" /></form>"#.into_response()
}

async fn login(State(portal): State<Arc<FakePortal>>, Form(form): Form<HashMap<String, String>>) -> Response {
    portal.requests.fetch_add(1, Ordering::SeqCst);
    let user = form.get("UserName").cloned().unwrap_or_default();
    let ok = form.get("Password").map(String::as_str) == Some(PASSWORD)
        && form.get("__RequestVerificationToken").map(String::as_str) == Some("tok");
    if !ok {
        return "<p>Identifiant ou mot de passe incorrect</p>".into_response();
    }
    (
        [(header::SET_COOKIE, format!("session={user}; Path=/"))],
        r#"<a href="/moutamadris/Account/ChangePassword">x</a>"#,
    )
        .into_response()
}

async fn set_culture(State(portal): State<Arc<FakePortal>>) -> &'static str {
    portal.requests.fetch_add(1, Ordering::SeqCst);
    ""
}

async fn bulletins(
    State(portal): State<Arc<FakePortal>>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    portal.requests.fetch_add(1, Ordering::SeqCst);
    if let Some(body) = &portal.grades_body {
        return body.clone().into_response();
    }
    let Some(user) = session_user(&headers) else {
        return String::new().into_response();
    };
    format!(
        "<table><tr><th>Classe</th></tr><tr><td>{user}</td><td>{}</td><td>{}</td></tr></table>",
        form.get("Annee").cloned().unwrap_or_default(),
        form.get("IdSession").cloned().unwrap_or_default(),
    )
    .into_response()
}

async fn listen(app: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

/// Start the fake portal and a bulletin server pointed at it.
/// Returns the bulletin server's base URL.
pub async fn start(portal: FakePortal, diagnostics: Diagnostics) -> (String, Arc<FakePortal>) {
    let portal = Arc::new(portal);
    let portal_app = Router::new()
        .route("/moutamadris/Account", get(login_page).post(login))
        .route("/moutamadris/General/SetCulture", post(set_culture))
        .route("/moutamadris/TuteurEleves/GetBulletins", post(bulletins))
        .with_state(portal.clone());
    let portal_addr = listen(portal_app).await;

    let state = AppState {
        portal: PortalConfig::new(&format!("http://{portal_addr}/moutamadris")).unwrap(),
        client: ClientConfig::default(),
        diagnostics,
    };
    let server_addr = listen(bulletin_server::router(state)).await;
    (format!("http://{server_addr}"), portal)
}

/// Start a bulletin server whose portal address has nothing listening on it.
pub async fn start_unreachable(diagnostics: Diagnostics) -> String {
    // Bind then drop to get a free port.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let portal_addr = listener.local_addr().unwrap();
    drop(listener);

    let state = AppState {
        portal: PortalConfig::new(&format!("http://{portal_addr}/moutamadris")).unwrap(),
        client: ClientConfig::default(),
        diagnostics,
    };
    let server_addr = listen(bulletin_server::router(state)).await;
    format!("http://{server_addr}")
}
