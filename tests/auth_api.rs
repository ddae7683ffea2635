mod common;

use axum::http::{Method, StatusCode};
use serde_json::json;

use common::{token_after, TestApp};

#[tokio::test]
async fn register_returns_public_user() {
    let mut app = TestApp::new();

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "username": "agent007",
                "email": "Agent007@Gmail.com",
                "password": "12345678",
            })),
        )
        .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["username"], "agent007");
    assert_eq!(body["email"], "agent007@gmail.com");
    assert!(body["avatar"]
        .as_str()
        .unwrap()
        .starts_with("https://www.gravatar.com/avatar/"));
    assert!(body.get("hashed_password").is_none());
    assert!(body.get("password").is_none());

    let mail = app.next_email().await;
    assert_eq!(mail.to, "agent007@gmail.com");
    assert_eq!(mail.subject, "Confirm your email");
}

#[tokio::test]
async fn register_rejects_duplicates_and_invalid_input() {
    let mut app = TestApp::new();
    app.signup_and_login("agent007", "agent007@gmail.com", "12345678")
        .await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "username": "other",
                "email": "agent007@gmail.com",
                "password": "12345678",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "You can't use this email");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "username": "agent007",
                "email": "other@gmail.com",
                "password": "12345678",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "You can't use this username");

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "username": "shorty",
                "email": "shorty@gmail.com",
                "password": "123",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({ "username": "nomail" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn register_rejects_email_longer_than_255_characters() {
    let app = TestApp::new();
    let email = format!("{}@example.com", "a".repeat(250));

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "username": "agent007",
                "email": email,
                "password": "12345678",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["message"], "email: Email must be at most 255 characters");

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/reset_password",
            None,
            Some(json!({ "email": email, "password": "new_secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn login_requires_confirmed_email_and_valid_credentials() {
    let mut app = TestApp::new();

    let (status, _) = app
        .json(
            Method::POST,
            "/api/auth/register",
            None,
            Some(json!({
                "username": "agent007",
                "email": "agent007@gmail.com",
                "password": "12345678",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.login("agent007", "12345678").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Email is not confirmed");

    let mail = app.next_email().await;
    let token = token_after(&mail.text_body, "/api/auth/confirmed_email/");

    let (status, body) = app
        .get(&format!("/api/auth/confirmed_email/{}", token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Email confirmed");

    let (_, body) = app
        .get(&format!("/api/auth/confirmed_email/{}", token), None)
        .await;
    assert_eq!(body["message"], "Your email is already confirmed");

    let (status, body) = app.login("agent007", "wrong").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Wrong credentials");

    let (status, body) = app.login("nobody", "12345678").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Wrong credentials");

    let (status, body) = app.login("agent007", "12345678").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["token_type"], "bearer");

    let token = body["access_token"].as_str().unwrap();
    let (status, body) = app.get("/api/users/me", Some(token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["username"], "agent007");
}

#[tokio::test]
async fn login_with_missing_form_fields_is_unprocessable() {
    let app = TestApp::new();

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/api/auth/login")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(axum::body::Body::from("username=agent007"))
        .unwrap();

    let (status, _, _) = app.send(request).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn confirmation_link_with_bad_token_is_rejected() {
    let app = TestApp::new();

    let (status, _) = app
        .get("/api/auth/confirmed_email/not-a-token", None)
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn request_email_resends_confirmation() {
    let mut app = TestApp::new();

    app.json(
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": "agent007",
            "email": "agent007@gmail.com",
            "password": "12345678",
        })),
    )
    .await;
    app.next_email().await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/request_email",
            None,
            Some(json!({ "email": "agent007@gmail.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Check your mail for verification");
    assert_eq!(app.next_email().await.to, "agent007@gmail.com");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/request_email",
            None,
            Some(json!({ "email": "ghost@gmail.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Check your mail for verification");
}

#[tokio::test]
async fn password_reset_replaces_old_password() {
    let mut app = TestApp::new();
    app.signup_and_login("agent007", "agent007@gmail.com", "12345678")
        .await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/reset_password",
            None,
            Some(json!({ "email": "agent007@gmail.com", "password": "new_secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Check your email");

    // Nothing changes until the link is followed
    let (status, _) = app.login("agent007", "12345678").await;
    assert_eq!(status, StatusCode::OK);

    let mail = app.next_email().await;
    assert_eq!(mail.subject, "Important: Update your account information");
    let token = token_after(&mail.text_body, "/api/auth/confirm_reset_password/");

    let (status, body) = app
        .get(&format!("/api/auth/confirm_reset_password/{}", token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password successfully changed");

    let (status, _) = app.login("agent007", "12345678").await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = app.login("agent007", "new_secret").await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn password_reset_for_unconfirmed_account_is_rejected() {
    let app = TestApp::new();

    app.json(
        Method::POST,
        "/api/auth/register",
        None,
        Some(json!({
            "username": "agent007",
            "email": "agent007@gmail.com",
            "password": "12345678",
        })),
    )
    .await;

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/reset_password",
            None,
            Some(json!({ "email": "agent007@gmail.com", "password": "new_secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Email not confirmed");

    let (status, body) = app
        .json(
            Method::POST,
            "/api/auth/reset_password",
            None,
            Some(json!({ "email": "ghost@gmail.com", "password": "new_secret" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Check your email");
}
