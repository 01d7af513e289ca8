//! Signed session cookies for EyeIntel.
//!
//! Sessions are HMAC-SHA256 signed cookies, no server-side session
//! store. A session token binds the user id, username and an expiry
//! timestamp:
//!
//! ```text
//! token = "{id}:{urlencoded_username}:{exp}:{sig}"
//! sig   = HMAC-SHA256(secret_key, "{id}:{urlencoded_username}:{exp}")
//! ```
//!
//! # Security Properties
//!
//! - **Identity binding**: the signature covers id, username and expiry,
//!   so none can be tampered with independently
//! - **Time-limited**: tokens expire after the configured TTL
//! - **Constant-time comparison**: signature verification uses
//!   constant-time comparison to prevent timing attacks
//!
//! Flash messages ride on a second, unsigned short-lived cookie; they
//! carry no authority, only text shown once on the next page load.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use axum::{
    extract::{FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use hmac::{Hmac, Mac};
use http::{header, request::Parts, HeaderMap};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

// =============================================================================
// Types
// =============================================================================

/// HMAC-SHA256 type alias
type HmacSha256 = Hmac<Sha256>;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "eyeintel_session";

/// Name of the flash-message cookie.
pub const FLASH_COOKIE: &str = "eyeintel_flash";

/// Session verification error types.
#[derive(Debug, Clone)]
pub enum SessionError {
    /// Token does not have the expected field structure
    Malformed,

    /// Session has expired
    Expired {
        /// When the session expired
        expired_at: u64,
        /// Current time
        current_time: u64,
    },

    /// Signature is invalid
    InvalidSignature,
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::Malformed => write!(f, "Malformed session token"),
            SessionError::Expired {
                expired_at,
                current_time,
            } => write!(
                f,
                "Session expired at {} (current time: {})",
                expired_at, current_time
            ),
            SessionError::InvalidSignature => write!(f, "Invalid session signature"),
        }
    }
}

/// The authenticated identity attached to a request.
#[derive(Debug, Clone)]
pub struct SessionUser {
    /// User record id
    pub id: i64,

    /// Username at login time
    pub username: String,
}

// =============================================================================
// Session Authentication
// =============================================================================

/// Issues and verifies signed session cookies.
#[derive(Clone)]
pub struct SessionAuth {
    /// Secret key for HMAC computation
    secret_key: Vec<u8>,

    /// How long an issued session stays valid
    ttl: Duration,
}

impl SessionAuth {
    /// Create an authenticator with the given secret key and session
    /// lifetime.
    ///
    /// The key should be at least 32 bytes for security.
    pub fn new(secret_key: impl AsRef<[u8]>, ttl: Duration) -> Self {
        Self {
            secret_key: secret_key.as_ref().to_vec(),
            ttl,
        }
    }

    /// Issue a session token for a user, expiring after the configured
    /// TTL.
    pub fn issue(&self, id: i64, username: &str) -> String {
        let expiry = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs()
            + self.ttl.as_secs();
        self.issue_with_expiry(id, username, expiry)
    }

    /// Issue a session token with a specific expiry timestamp.
    pub fn issue_with_expiry(&self, id: i64, username: &str, expiry: u64) -> String {
        let message = format!("{}:{}:{}", id, urlencoding::encode(username), expiry);
        let signature = self.compute_signature(&message);
        format!("{}:{}", message, signature)
    }

    /// Verify a session token.
    ///
    /// Checks the expiry first, then the signature in constant time.
    pub fn verify(&self, token: &str) -> Result<SessionUser, SessionError> {
        let (message, signature) = token.rsplit_once(':').ok_or(SessionError::Malformed)?;

        let fields: Vec<&str> = message.split(':').collect();
        if fields.len() != 3 {
            return Err(SessionError::Malformed);
        }

        let id: i64 = fields[0].parse().map_err(|_| SessionError::Malformed)?;
        let username = urlencoding::decode(fields[1])
            .map_err(|_| SessionError::Malformed)?
            .into_owned();
        let expiry: u64 = fields[2].parse().map_err(|_| SessionError::Malformed)?;

        let current_time = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_secs();
        if current_time > expiry {
            return Err(SessionError::Expired {
                expired_at: expiry,
                current_time,
            });
        }

        let provided_sig = hex::decode(signature).map_err(|_| SessionError::InvalidSignature)?;
        let expected_sig =
            hex::decode(self.compute_signature(message)).expect("own signature is valid hex");

        if provided_sig.ct_eq(&expected_sig).into() {
            Ok(SessionUser { id, username })
        } else {
            Err(SessionError::InvalidSignature)
        }
    }

    /// `Set-Cookie` value establishing a session for a user.
    pub fn session_cookie(&self, id: i64, username: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            self.issue(id, username),
            self.ttl.as_secs()
        )
    }

    /// Compute the HMAC-SHA256 signature for a token message.
    fn compute_signature(&self, message: &str) -> String {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret_key).expect("HMAC can take key of any size");
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

/// `Set-Cookie` value clearing the session (logout).
pub fn clear_session_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", SESSION_COOKIE)
}

// =============================================================================
// Cookie Plumbing
// =============================================================================

/// Extract a named cookie value from the request headers.
pub fn cookie_value(headers: &HeaderMap, name: &str) -> Option<String> {
    let raw = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in raw.split(';') {
        if let Some((key, value)) = pair.trim().split_once('=') {
            if key == name {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// `Set-Cookie` value carrying a flash message for the next page load.
pub fn flash_cookie(message: &str) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; Max-Age=60",
        FLASH_COOKIE,
        urlencoding::encode(message)
    )
}

/// `Set-Cookie` value clearing the flash message after it was shown.
pub fn clear_flash_cookie() -> String {
    format!("{}=; Path=/; HttpOnly; Max-Age=0", FLASH_COOKIE)
}

/// Read the pending flash message, if any.
pub fn take_flash(headers: &HeaderMap) -> Option<String> {
    let raw = cookie_value(headers, FLASH_COOKIE)?;
    if raw.is_empty() {
        return None;
    }
    Some(urlencoding::decode(&raw).ok()?.into_owned())
}

// =============================================================================
// Axum Middleware
// =============================================================================

/// Axum middleware guarding session-protected routes.
///
/// A request without a valid session cookie is redirected to the login
/// flow instead of reaching the wrapped handler. On success the
/// verified [`SessionUser`] is attached to the request extensions for
/// the [`CurrentUser`] extractor.
pub async fn require_session(
    State(auth): State<SessionAuth>,
    mut request: Request,
    next: Next,
) -> Response {
    let token = cookie_value(request.headers(), SESSION_COOKIE);

    match token.as_deref().map(|t| auth.verify(t)) {
        Some(Ok(user)) => {
            request.extensions_mut().insert(user);
            next.run(request).await
        }
        Some(Err(e)) => {
            debug!("Session rejected: {}", e);
            Redirect::to("/login").into_response()
        }
        None => Redirect::to("/login").into_response(),
    }
}

/// Axum extractor for the authenticated user on protected routes.
///
/// Relies on [`require_session`] having attached the identity; a route
/// that was not wrapped rejects with a redirect to the login flow.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub SessionUser);

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Redirect;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionUser>()
            .cloned()
            .map(CurrentUser)
            .ok_or_else(|| Redirect::to("/login"))
    }
}

// =============================================================================
// Tests
// =============================================================================
