//! Test utilities for integration tests.
//!
//! Provides an in-memory credential store, an injectable classifier with
//! call tracking, and helpers for driving the router with form and
//! multipart requests.

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use image::RgbImage;
use tempfile::TempDir;
use tokio::sync::RwLock;
use tower::ServiceExt;

use eyeintel::classify::{ImageClassifier, InferenceEngine};
use eyeintel::error::{ClassifyError, CredentialError};
use eyeintel::server::{create_router, AppState, RouterConfig, SessionAuth};
use eyeintel::users::{password, User, UserStore};
use eyeintel::{ImageIntake, ReportGenerator};

// =============================================================================
// In-Memory User Store
// =============================================================================

/// A user store holding records in memory, hashing passwords the same
/// way as the SQLite store.
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, User>>,
    next_id: AtomicI64,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self {
            users: RwLock::new(HashMap::new()),
            next_id: AtomicI64::new(1),
        }
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn register(&self, username: &str, pw: &str) -> Result<User, CredentialError> {
        let mut users = self.users.write().await;
        if users.contains_key(username) {
            return Err(CredentialError::DuplicateUsername {
                username: username.to_string(),
            });
        }

        let user = User {
            id: self.next_id.fetch_add(1, Ordering::SeqCst),
            username: username.to_string(),
            password_hash: password::hash_password(pw)?,
        };
        users.insert(username.to_string(), user.clone());
        Ok(user)
    }

    async fn authenticate(&self, username: &str, pw: &str) -> Result<User, CredentialError> {
        let users = self.users.read().await;
        let user = users
            .get(username)
            .ok_or(CredentialError::InvalidCredentials)?;

        if password::verify_password(pw, &user.password_hash)? {
            Ok(user.clone())
        } else {
            Err(CredentialError::InvalidCredentials)
        }
    }
}

// =============================================================================
// Counting Classifier
// =============================================================================

/// A classifier returning a fixed score vector and counting invocations.
///
/// Useful for asserting that rejected uploads never reach the model.
pub struct CountingClassifier {
    scores: Vec<f32>,
    calls: Arc<AtomicUsize>,
}

impl CountingClassifier {
    pub fn new(scores: Vec<f32>) -> (Self, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        (
            Self {
                scores,
                calls: Arc::clone(&calls),
            },
            calls,
        )
    }
}

impl ImageClassifier for CountingClassifier {
    fn class_scores(&self, _image: &RgbImage) -> Result<Vec<f32>, ClassifyError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.scores.clone())
    }
}

// =============================================================================
// Test Application
// =============================================================================

/// A router plus the temporary upload directory backing it.
pub struct TestApp {
    pub router: Router,
    pub upload_dir: TempDir,
}

/// Build an application around an arbitrary engine.
pub fn test_app_with_engine(engine: InferenceEngine) -> TestApp {
    let upload_dir = tempfile::tempdir().unwrap();

    let state = AppState::new(
        MemoryUserStore::new(),
        engine,
        SessionAuth::new("test-secret-key", Duration::from_secs(3600)),
        ImageIntake::new(upload_dir.path()),
        ReportGenerator::new(upload_dir.path()),
    );

    TestApp {
        router: create_router(state, RouterConfig::new().with_tracing(false)),
        upload_dir,
    }
}

/// Build an application whose classifier returns `scores`, plus the
/// invocation counter.
pub fn test_app(scores: &[f32]) -> (TestApp, Arc<AtomicUsize>) {
    let (classifier, calls) = CountingClassifier::new(scores.to_vec());
    let app = test_app_with_engine(InferenceEngine::from_classifier(Box::new(classifier)));
    (app, calls)
}

// =============================================================================
// Request Helpers
// =============================================================================

/// POST an urlencoded form.
pub async fn post_form(router: &Router, path: &str, body: &str) -> Response {
    let request = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
        .body(Body::from(body.to_string()))
        .unwrap();

    router.clone().oneshot(request).await.unwrap()
}

/// GET a path, optionally with a Cookie header.
pub async fn get_path(router: &Router, path: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().method("GET").uri(path);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let request = builder.body(Body::empty()).unwrap();
    router.clone().oneshot(request).await.unwrap()
}

/// Build a single-part multipart body.
///
/// `filename: None` produces a plain form field without a filename.
pub fn multipart_body(
    field_name: &str,
    filename: Option<&str>,
    bytes: &[u8],
) -> (String, Vec<u8>) {
    let boundary = "eyeintel-test-boundary";

    let disposition = match filename {
        Some(name) => format!("form-data; name=\"{}\"; filename=\"{}\"", field_name, name),
        None => format!("form-data; name=\"{}\"", field_name),
    };

    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{}\r\nContent-Disposition: {}\r\nContent-Type: application/octet-stream\r\n\r\n",
            boundary, disposition
        )
        .as_bytes(),
    );
    body.extend_from_slice(bytes);
    body.extend_from_slice(format!("\r\n--{}--\r\n", boundary).as_bytes());

    (
        format!("multipart/form-data; boundary={}", boundary),
        body,
    )
}

/// POST a multipart body, optionally with a Cookie header.
pub async fn post_multipart(
    router: &Router,
    path: &str,
    cookie: Option<&str>,
    content_type: &str,
    body: Vec<u8>,
) -> Response {
    let mut builder = Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, content_type);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }

    let request = builder.body(Body::from(body)).unwrap();
    router.clone().oneshot(request).await.unwrap()
}

/// Extract the session cookie set by a login response, as a Cookie
/// header value.
pub fn session_cookie_from(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .find_map(|value| {
            let value = value.to_str().ok()?;
            if value.starts_with("eyeintel_session=") && !value.starts_with("eyeintel_session=;") {
                Some(value.split(';').next().unwrap().to_string())
            } else {
                None
            }
        })
}

/// Register a user and log in, returning the session cookie.
pub async fn register_and_login(router: &Router, username: &str, pw: &str) -> String {
    let body = format!("username={}&password={}", username, pw);

    let response = post_form(router, "/register", &body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = post_form(router, "/login", &body).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    session_cookie_from(&response).expect("login should set a session cookie")
}

/// Collect a response body into a string.
pub async fn body_string(response: Response) -> String {
    String::from_utf8(body_bytes(response).await).unwrap()
}

/// Collect a response body into raw bytes.
pub async fn body_bytes(response: Response) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

/// Encode a small RGB image as PNG bytes.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, image::Rgb([90, 60, 30]));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}
