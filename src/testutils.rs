use crate::backend::{AgendaBackend, MockAgendaStore};
use crate::configuration::Configuration;
use crate::error::BackendError;
use crate::http::create_app;
use crate::local_store::LocalStore;
use crate::session::SESSION_COOKIE;
use axum::body::Body;
use axum::http::header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE};
use axum::http::Request;
use axum::response::Response;
use axum::Router;
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tower::ServiceExt;

#[derive(Clone)]
pub struct TestConfiguration {
    pub static_dir: PathBuf,
}

impl Default for TestConfiguration {
    fn default() -> Self {
        Self {
            static_dir: PathBuf::from("static"),
        }
    }
}

impl Configuration for TestConfiguration {
    fn website_title(&self) -> String {
        "Agendamentos de Teste".into()
    }

    fn session_secret(&self) -> String {
        "segredo-de-teste".into()
    }

    fn static_dir(&self) -> PathBuf {
        self.static_dir.clone()
    }

    fn port(&self) -> u16 {
        0
    }

    fn database_url(&self) -> Option<String> {
        None
    }
}

/// Router over a fresh in-memory store, plus a handle to inspect that store.
pub fn test_app() -> (Router, LocalStore) {
    let store = LocalStore::default();
    let app = create_app(store.clone(), &TestConfiguration::default());
    (app, store)
}

/// Backend that hands out a single prepared mock store.
#[derive(Clone)]
pub struct MockBackend(Arc<Mutex<Option<MockAgendaStore>>>);

impl MockBackend {
    pub fn app_with(store: MockAgendaStore) -> Router {
        let backend = Self(Arc::new(Mutex::new(Some(store))));
        create_app(backend, &TestConfiguration::default())
    }

    pub fn app_without_store() -> Router {
        let backend = Self(Arc::new(Mutex::new(None)));
        create_app(backend, &TestConfiguration::default())
    }
}

impl AgendaBackend for MockBackend {
    type Store = MockAgendaStore;

    fn open(&self) -> Result<Self::Store, BackendError> {
        self.0
            .lock()
            .unwrap()
            .take()
            .ok_or_else(|| BackendError::Connection("Supposed to fail".into()))
    }
}

pub async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_owned())).unwrap()
}

pub fn location(response: &Response) -> &str {
    response
        .headers()
        .get(LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
}

/// The `session=<value>` pair from the response's Set-Cookie header.
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(|value| value.split(';').next())
        .find(|pair| pair.starts_with(&format!("{SESSION_COOKIE}=")))
        .map(str::to_owned)
}

pub async fn body_text(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Logs in through the login form and returns the session cookie.
pub async fn log_in(app: &Router, email: &str, password: &str) -> String {
    let body = format!("email={email}&senha={password}");
    let response = send(app, post_form("/login", &body, None)).await;
    session_cookie(&response).expect("login should set a session cookie")
}
