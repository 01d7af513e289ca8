//! HTTP request handlers for the EyeIntel application.
//!
//! # Endpoints
//!
//! - `GET /` - Landing page
//! - `GET,POST /register` - Create a user
//! - `GET,POST /login` - Authenticate and establish a session
//! - `GET /logout` - Clear the session (protected)
//! - `GET,POST /detector` - Upload and classify a fundus image (protected)
//! - `GET /health` - Health check endpoint

use std::sync::Arc;

use axum::{
    extract::{Multipart, State},
    http::{header, HeaderMap, StatusCode},
    response::{AppendHeaders, Html, IntoResponse, Redirect, Response},
    Form, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::classify::InferenceEngine;
use crate::error::{ClassifyError, CredentialError, IntakeError, ReportError};
use crate::intake::ImageIntake;
use crate::report::ReportGenerator;
use crate::users::UserStore;

use super::pages::{self, ResultOutcome, ResultView};
use super::session::{self, CurrentUser, SessionAuth};

// =============================================================================
// Application State
// =============================================================================

/// Shared application state, passed to all handlers via Axum's State
/// extractor.
pub struct AppState<S: UserStore> {
    /// The credential store
    pub users: Arc<S>,

    /// The inference engine, constructed once at startup
    pub engine: Arc<InferenceEngine>,

    /// Session cookie issuing and verification
    pub sessions: SessionAuth,

    /// Upload validation and persistence
    pub intake: ImageIntake,

    /// Report rendering
    pub reports: ReportGenerator,
}

impl<S: UserStore> AppState<S> {
    /// Assemble the application state from its components.
    pub fn new(
        users: S,
        engine: InferenceEngine,
        sessions: SessionAuth,
        intake: ImageIntake,
        reports: ReportGenerator,
    ) -> Self {
        Self {
            users: Arc::new(users),
            engine: Arc::new(engine),
            sessions,
            intake,
            reports,
        }
    }
}

impl<S: UserStore> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            users: Arc::clone(&self.users),
            engine: Arc::clone(&self.engine),
            sessions: self.sessions.clone(),
            intake: self.intake.clone(),
            reports: self.reports.clone(),
        }
    }
}

// =============================================================================
// Request Parameters
// =============================================================================

/// Form fields for registration and login.
#[derive(Debug, Deserialize)]
pub struct CredentialsForm {
    /// Requested or existing username
    pub username: String,

    /// Plaintext password (hashed before storage, compared on login)
    pub password: String,
}

// =============================================================================
// Response Types
// =============================================================================

/// JSON error response returned for internal error conditions.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error type identifier (e.g., "storage_error")
    pub error: String,

    /// Human-readable error message
    pub message: String,

    /// HTTP status code (included for convenience)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl ErrorResponse {
    /// Create a new error response.
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: None,
        }
    }

    /// Create a new error response with status code.
    pub fn with_status(
        error: impl Into<String>,
        message: impl Into<String>,
        status: StatusCode,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            status: Some(status.as_u16()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,

    /// Whether the classifier loaded successfully
    pub model_available: bool,
}

// =============================================================================
// Error Mapping
// =============================================================================

fn error_json(status: StatusCode, error_type: &str, message: String) -> Response {
    if status.is_server_error() {
        error!(
            error_type = error_type,
            status = status.as_u16(),
            "Server error: {}",
            message
        );
    } else {
        warn!(
            error_type = error_type,
            status = status.as_u16(),
            "Client error: {}",
            message
        );
    }

    let error_response = ErrorResponse::with_status(error_type, message, status);
    (status, Json(error_response)).into_response()
}

/// Convert IntakeError to HTTP response.
///
/// Validation failures are normally converted into flash messages before
/// this runs; reaching it means a storage-level failure.
impl IntoResponse for IntakeError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            IntakeError::NoFileSelected => (StatusCode::BAD_REQUEST, "no_file_selected"),
            IntakeError::InvalidFileType { .. } => (StatusCode::BAD_REQUEST, "invalid_file_type"),
            IntakeError::Io(_) => (StatusCode::INTERNAL_SERVER_ERROR, "storage_error"),
        };
        error_json(status, error_type, self.to_string())
    }
}

/// Convert ClassifyError to HTTP response.
///
/// Model unavailability is rendered into the result page instead;
/// reaching this impl means a decoding or inference failure, which is
/// fatal to the request.
impl IntoResponse for ClassifyError {
    fn into_response(self) -> Response {
        let (status, error_type) = match &self {
            ClassifyError::Unavailable { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "model_unavailable")
            }
            ClassifyError::Decode(_) => (StatusCode::INTERNAL_SERVER_ERROR, "decode_error"),
            ClassifyError::Inference(_) => (StatusCode::INTERNAL_SERVER_ERROR, "inference_error"),
        };
        error_json(status, error_type, self.to_string())
    }
}

/// Convert ReportError to HTTP response.
impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let error_type = match &self {
            ReportError::Pdf(_) => "report_error",
            ReportError::Io(_) => "storage_error",
        };
        error_json(StatusCode::INTERNAL_SERVER_ERROR, error_type, self.to_string())
    }
}

fn credential_failure(err: CredentialError) -> Response {
    error_json(
        StatusCode::INTERNAL_SERVER_ERROR,
        "credential_store_error",
        err.to_string(),
    )
}

// =============================================================================
// Response Helpers
// =============================================================================

/// Redirect carrying a flash message for the target page.
fn flash_redirect(to: &'static str, message: &str) -> Response {
    (
        AppendHeaders([(header::SET_COOKIE, session::flash_cookie(message))]),
        Redirect::to(to),
    )
        .into_response()
}

/// Render a page, clearing the flash cookie if one was consumed.
fn render_with_flash(
    flash: Option<String>,
    render: impl FnOnce(Option<&str>) -> String,
) -> Response {
    let html = render(flash.as_deref());
    if flash.is_some() {
        (
            AppendHeaders([(header::SET_COOKIE, session::clear_flash_cookie())]),
            Html(html),
        )
            .into_response()
    } else {
        Html(html).into_response()
    }
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
pub async fn health_handler<S: UserStore>(State(state): State<AppState<S>>) -> Response {
    let response = HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_available: state.engine.is_available(),
    };
    Json(response).into_response()
}

/// Serve the landing page.
///
/// # Endpoint
///
/// `GET /`
pub async fn landing_handler(headers: HeaderMap) -> Response {
    render_with_flash(session::take_flash(&headers), pages::landing_page)
}

/// Serve the registration form.
///
/// # Endpoint
///
/// `GET /register`
pub async fn register_page_handler(headers: HeaderMap) -> Response {
    render_with_flash(session::take_flash(&headers), pages::register_page)
}

/// Create a user from the registration form.
///
/// Redirects to the login form on success, back to the registration form
/// with a flash message on duplicate usernames.
///
/// # Endpoint
///
/// `POST /register`
pub async fn register_submit<S: UserStore>(
    State(state): State<AppState<S>>,
    Form(form): Form<CredentialsForm>,
) -> Response {
    if form.username.is_empty() || form.password.is_empty() {
        return flash_redirect("/register", "Username and password are required");
    }

    match state.users.register(&form.username, &form.password).await {
        Ok(user) => {
            info!(username = %user.username, id = user.id, "User registered");
            flash_redirect("/login", "Registration successful. Please log in.")
        }
        Err(CredentialError::DuplicateUsername { .. }) => {
            debug!(username = %form.username, "Registration rejected: username taken");
            flash_redirect("/register", "Username already exists")
        }
        Err(e) => credential_failure(e),
    }
}

/// Serve the login form.
///
/// # Endpoint
///
/// `GET /login`
pub async fn login_page_handler(headers: HeaderMap) -> Response {
    render_with_flash(session::take_flash(&headers), pages::login_page)
}

/// Authenticate and establish a session.
///
/// On success sets the session cookie and redirects to the detector; on
/// failure redirects back to the login form with a flash message.
///
/// # Endpoint
///
/// `POST /login`
pub async fn login_submit<S: UserStore>(
    State(state): State<AppState<S>>,
    Form(form): Form<CredentialsForm>,
) -> Response {
    match state
        .users
        .authenticate(&form.username, &form.password)
        .await
    {
        Ok(user) => {
            info!(username = %user.username, "Login successful");
            (
                AppendHeaders([(
                    header::SET_COOKIE,
                    state.sessions.session_cookie(user.id, &user.username),
                )]),
                Redirect::to("/detector"),
            )
                .into_response()
        }
        Err(CredentialError::InvalidCredentials) => {
            debug!(username = %form.username, "Login rejected");
            flash_redirect("/login", "Invalid credentials")
        }
        Err(e) => credential_failure(e),
    }
}

/// Clear the session and redirect to the login form.
///
/// # Endpoint
///
/// `GET /logout` (protected)
pub async fn logout_handler(CurrentUser(user): CurrentUser) -> Response {
    info!(username = %user.username, "Logout");
    (
        AppendHeaders([
            (header::SET_COOKIE, session::clear_session_cookie()),
            (
                header::SET_COOKIE,
                session::flash_cookie("Logged out successfully."),
            ),
        ]),
        Redirect::to("/login"),
    )
        .into_response()
}

/// Serve the upload form.
///
/// # Endpoint
///
/// `GET /detector` (protected)
pub async fn detector_page_handler(
    CurrentUser(user): CurrentUser,
    headers: HeaderMap,
) -> Response {
    render_with_flash(session::take_flash(&headers), |flash| {
        pages::detector_page(&user.username, flash)
    })
}

/// Run the classification pipeline on an uploaded image.
///
/// Validates the multipart upload, persists the image, classifies it and
/// generates the PDF report, then renders the result page. Validation
/// failures flash a message and redirect back to the form; a missing
/// model is rendered as a soft error result without a report.
///
/// # Endpoint
///
/// `POST /detector` (protected)
pub async fn detector_submit<S: UserStore>(
    State(state): State<AppState<S>>,
    CurrentUser(user): CurrentUser,
    mut multipart: Multipart,
) -> Response {
    // Find the uploaded file part.
    let mut upload = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() == Some("file") {
                    let filename = field.file_name().unwrap_or("").to_string();
                    match field.bytes().await {
                        Ok(data) => {
                            upload = Some((filename, data));
                            break;
                        }
                        Err(e) => {
                            warn!("Failed to read upload body: {}", e);
                            return flash_redirect("/detector", "Upload failed");
                        }
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Malformed multipart request: {}", e);
                return flash_redirect("/detector", "Upload failed");
            }
        }
    }

    let Some((filename, data)) = upload else {
        return flash_redirect("/detector", "No file part");
    };

    let stored = match state.intake.validate_and_store(&filename, data).await {
        Ok(stored) => stored,
        Err(e @ IntakeError::NoFileSelected) | Err(e @ IntakeError::InvalidFileType { .. }) => {
            debug!(username = %user.username, filename = %filename, "Upload rejected: {}", e);
            return flash_redirect("/detector", &e.to_string());
        }
        Err(e) => return e.into_response(),
    };

    info!(username = %user.username, file = %stored.filename, "Image stored, classifying");

    let view = match state.engine.classify(&stored.bytes) {
        Ok(prediction) => {
            let label = prediction.label.display_name();
            let report_path =
                match state
                    .reports
                    .generate(label, prediction.confidence, &stored.filename)
                {
                    Ok(path) => path,
                    Err(e) => return e.into_response(),
                };
            let report_name = report_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or_default()
                .to_string();

            info!(
                label = label,
                confidence = prediction.confidence,
                report = %report_name,
                "Classification complete"
            );

            ResultView {
                label: label.to_string(),
                outcome: ResultOutcome::Classified {
                    confidence: prediction.confidence,
                    image_url: format!("/uploads/{}", urlencoding::encode(&stored.filename)),
                    report_url: format!("/uploads/{}", urlencoding::encode(&report_name)),
                },
            }
        }
        Err(ClassifyError::Unavailable { reason }) => {
            error!("Classification unavailable: {}", reason);
            ResultView {
                label: "Error".to_string(),
                outcome: ResultOutcome::Unavailable {
                    message: "Model not loaded. Please check the server logs.".to_string(),
                },
            }
        }
        Err(e) => return e.into_response(),
    };

    Html(pages::result_page(&view)).into_response()
}

// =============================================================================
// Tests
// =============================================================================
