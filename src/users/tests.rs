//! Tests for users module
//!
//! Registration, profile reads and updates, password changes and pictures,
//! all through the router.

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::app::test_support::{body_json, TestApp};
    use crate::common::Validator;
    use crate::users::models::RegisterRequest;
    use crate::users::validators::{valid_email, AccountValidator};

    #[test]
    fn test_email_shape() {
        assert!(valid_email("pat@example.com"));
        assert!(valid_email("first.last+tag@sub.example.org"));
        assert!(!valid_email("pat"));
        assert!(!valid_email("pat@example"));
        assert!(!valid_email("pat @example.com"));
    }

    #[test]
    fn test_register_validation_collects_errors() {
        let result = AccountValidator.validate(&RegisterRequest {
            email: "nope".into(),
            password: "short".into(),
            full_name: Some("x".repeat(300)),
        });
        assert!(!result.is_valid);
        let fields: Vec<_> = result.errors.iter().map(|e| e.field.as_str()).collect();
        assert_eq!(fields, vec!["email", "password", "full_name"]);
    }

    #[tokio::test]
    async fn test_register_returns_account_without_credentials() {
        let app = TestApp::new().await;
        let body = app.register("pat@example.com", "password123").await;

        assert!(body["id"].is_i64());
        assert_eq!(body["email"], "pat@example.com");
        assert_eq!(body["is_active"], true);
        assert_eq!(body["is_verified"], false);
        assert!(body.get("hashed_password").is_none());
    }

    #[tokio::test]
    async fn test_duplicate_registration_conflicts() {
        let app = TestApp::new().await;
        app.register("pat@example.com", "password123").await;

        // Email comparison ignores case
        let response = app
            .json(
                "POST",
                "/users/register",
                None,
                Some(json!({ "email": "PAT@example.com", "password": "password123" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_register_rejects_short_password() {
        let app = TestApp::new().await;
        let response = app
            .json(
                "POST",
                "/users/register",
                None,
                Some(json!({ "email": "pat@example.com", "password": "short" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_profile_details_and_update() {
        let app = TestApp::new().await;
        let (access, _) = app.signed_in("pat@example.com").await;

        let response = app.json("GET", "/users/profile-details", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = app
            .json("GET", "/users/profile-details", Some(&access), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["email"], "pat@example.com");
        assert!(body["last_login"].is_string());

        let response = app
            .json(
                "PATCH",
                "/users/profile-update",
                Some(&access),
                Some(json!({ "full_name": "Pat Doe" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["full_name"], "Pat Doe");
    }

    #[tokio::test]
    async fn test_change_password() {
        let app = TestApp::new().await;
        let (access, _) = app.signed_in("pat@example.com").await;

        let response = app
            .json(
                "POST",
                "/users/change-password",
                Some(&access),
                Some(json!({ "current_password": "wrong-password", "new_password": "newpassword1" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = app
            .json(
                "POST",
                "/users/change-password",
                Some(&access),
                Some(json!({ "current_password": "password123", "new_password": "newpassword1" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["message"],
            "Password changed successfully"
        );

        let response = app.login("pat@example.com", "password123").await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let response = app.login("pat@example.com", "newpassword1").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_upload_picture_requires_image_data_url() {
        let app = TestApp::new().await;
        let (access, _) = app.signed_in("pat@example.com").await;

        let response = app
            .json(
                "POST",
                "/users/upload-picture",
                Some(&access),
                Some(json!({ "picture": "https://example.com/me.png" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let picture = "data:image/png;base64,iVBORw0KGgo=";
        let response = app
            .json(
                "POST",
                "/users/upload-picture",
                Some(&access),
                Some(json!({ "picture": picture })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["picture"], picture);
    }
}
