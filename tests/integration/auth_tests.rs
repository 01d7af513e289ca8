//! Integration tests for registration, login, logout and session gating.

use axum::http::{header, StatusCode};

use super::test_utils::{
    body_string, get_path, post_form, register_and_login, session_cookie_from, test_app,
};

const SCORES: [f32; 4] = [0.25, 0.25, 0.25, 0.25];

fn location(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .expect("response should redirect")
        .to_str()
        .unwrap()
}

// =============================================================================
// Registration and Login
// =============================================================================

#[tokio::test]
async fn test_register_then_login_succeeds() {
    let (app, _) = test_app(&SCORES);

    let response = post_form(&app.router, "/register", "username=alice&password=pw1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let response = post_form(&app.router, "/login", "username=alice&password=pw1").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/detector");
    assert!(session_cookie_from(&response).is_some());
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let (app, _) = test_app(&SCORES);

    let response = post_form(&app.router, "/register", "username=alice&password=first").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = post_form(&app.router, "/register", "username=alice&password=second").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register");

    // The original record is untouched: its password still works, the
    // second one never registered.
    let response = post_form(&app.router, "/login", "username=alice&password=first").await;
    assert_eq!(location(&response), "/detector");

    let response = post_form(&app.router, "/login", "username=alice&password=second").await;
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_wrong_password_rejected() {
    let (app, _) = test_app(&SCORES);

    post_form(&app.router, "/register", "username=alice&password=right").await;

    let response = post_form(&app.router, "/login", "username=alice&password=wrong").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
    assert!(session_cookie_from(&response).is_none());
}

#[tokio::test]
async fn test_unknown_user_rejected() {
    let (app, _) = test_app(&SCORES);

    let response = post_form(&app.router, "/login", "username=nobody&password=pw").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_empty_registration_rejected() {
    let (app, _) = test_app(&SCORES);

    let response = post_form(&app.router, "/register", "username=&password=").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/register");
}

// =============================================================================
// Session Gating
// =============================================================================

#[tokio::test]
async fn test_detector_requires_session() {
    let (app, _) = test_app(&SCORES);

    let response = get_path(&app.router, "/detector", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_detector_with_session() {
    let (app, _) = test_app(&SCORES);
    let cookie = register_and_login(&app.router, "alice", "pw").await;

    let response = get_path(&app.router, "/detector", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("alice"));
    assert!(body.contains("multipart/form-data"));
}

#[tokio::test]
async fn test_tampered_session_redirects_to_login() {
    let (app, _) = test_app(&SCORES);
    let cookie = register_and_login(&app.router, "alice", "pw").await;

    // Flip the last signature character.
    let mut tampered = cookie.clone();
    let last = tampered.pop().unwrap();
    tampered.push(if last == '0' { '1' } else { '0' });

    let response = get_path(&app.router, "/detector", Some(&tampered)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

#[tokio::test]
async fn test_logout_clears_session() {
    let (app, _) = test_app(&SCORES);
    let cookie = register_and_login(&app.router, "alice", "pw").await;

    let response = get_path(&app.router, "/logout", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");

    let cleared = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|v| {
            let v = v.to_str().unwrap();
            v.starts_with("eyeintel_session=;") && v.contains("Max-Age=0")
        });
    assert!(cleared, "logout should expire the session cookie");
}

#[tokio::test]
async fn test_logout_requires_session() {
    let (app, _) = test_app(&SCORES);

    let response = get_path(&app.router, "/logout", None).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login");
}

// =============================================================================
// Flash Messages
// =============================================================================

#[tokio::test]
async fn test_failed_login_flashes_message() {
    let (app, _) = test_app(&SCORES);

    let response = post_form(&app.router, "/login", "username=nobody&password=pw").await;
    let flash_cookie = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .find_map(|v| {
            let v = v.to_str().ok()?;
            v.starts_with("eyeintel_flash=")
                .then(|| v.split(';').next().unwrap().to_string())
        })
        .expect("failed login should flash a message");

    // Following the redirect renders the message once and clears it.
    let response = get_path(&app.router, "/login", Some(&flash_cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cleared = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .any(|v| {
            let v = v.to_str().unwrap();
            v.starts_with("eyeintel_flash=;") && v.contains("Max-Age=0")
        });
    assert!(cleared, "rendering the flash should clear the cookie");

    let body = body_string(response).await;
    assert!(body.contains("Invalid credentials"));
}

// =============================================================================
// Public Pages
// =============================================================================

#[tokio::test]
async fn test_landing_page_is_public() {
    let (app, _) = test_app(&SCORES);

    let response = get_path(&app.router, "/", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    assert!(body.contains("EyeIntel"));
}

#[tokio::test]
async fn test_health_endpoint() {
    let (app, _) = test_app(&SCORES);

    let response = get_path(&app.router, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_string(response).await;
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["status"], "ok");
    assert_eq!(json["model_available"], true);
}
