//! Tests for tasks module

#[cfg(test)]
mod tests {
    use axum::http::StatusCode;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    use crate::app::test_support::{body_json, TestApp};
    use crate::tasks::models::{Task, UpdateTaskRequest};

    fn new_task() -> serde_json::Value {
        json!({
            "name": "Write report",
            "description": "Quarterly numbers",
            "due_date": "2030-01-01T09:00:00Z"
        })
    }

    #[test]
    fn test_completion_stamps_and_clears_timestamp() {
        let due = Utc.with_ymd_and_hms(2030, 1, 1, 9, 0, 0).unwrap();
        let now = Utc.with_ymd_and_hms(2029, 6, 1, 12, 0, 0).unwrap();
        let mut task = Task {
            id: 1,
            user_id: 1,
            name: "a".into(),
            description: None,
            priority: "medium".into(),
            due_date: due,
            completed: false,
            created_at: now,
            completed_at: None,
        };

        task.apply(
            UpdateTaskRequest {
                name: Some("b".into()),
                ..Default::default()
            },
            now,
        );
        assert_eq!(task.name, "b");
        assert!(task.completed_at.is_none());

        task.apply(
            UpdateTaskRequest {
                completed: Some(true),
                ..Default::default()
            },
            now,
        );
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(now));

        task.apply(
            UpdateTaskRequest {
                completed: Some(false),
                ..Default::default()
            },
            now,
        );
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
    }

    #[tokio::test]
    async fn test_task_crud_flow() {
        let app = TestApp::new().await;
        let (access, _) = app.signed_in("pat@example.com").await;

        let response = app
            .json("POST", "/tasks/create", Some(&access), Some(new_task()))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let task = body_json(response).await;
        assert_eq!(task["priority"], "medium");
        assert_eq!(task["completed"], false);
        assert!(task["completed_at"].is_null());
        let id = task["id"].as_i64().unwrap();

        let response = app
            .json("GET", "/tasks/get/all-tasks", Some(&access), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await.as_array().unwrap().len(), 1);

        let uri = format!("/tasks/update/{id}");
        let response = app
            .json(
                "PATCH",
                &uri,
                Some(&access),
                Some(json!({ "completed": true, "priority": "high" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let updated = body_json(response).await;
        assert_eq!(updated["completed"], true);
        assert_eq!(updated["priority"], "high");
        assert!(updated["completed_at"].is_string());
        assert_eq!(updated["name"], "Write report");

        let response = app
            .json("GET", &format!("/tasks/get/{id}"), Some(&access), None)
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_json(response).await["completed"], true);

        let uri = format!("/tasks/delete/{id}");
        let response = app.json("DELETE", &uri, Some(&access), None).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            body_json(response).await["message"],
            "Task deleted successfully"
        );

        let response = app.json("DELETE", &uri, Some(&access), None).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_update_distinguishes_null_from_absent() {
        let absent: UpdateTaskRequest = serde_json::from_value(json!({ "name": "x" })).unwrap();
        assert!(absent.description.is_none());

        let cleared: UpdateTaskRequest =
            serde_json::from_value(json!({ "description": null })).unwrap();
        assert_eq!(cleared.description, Some(None));

        let set: UpdateTaskRequest =
            serde_json::from_value(json!({ "description": "notes" })).unwrap();
        assert_eq!(set.description, Some(Some("notes".to_string())));
    }

    #[tokio::test]
    async fn test_description_can_be_cleared() {
        let app = TestApp::new().await;
        let (access, _) = app.signed_in("pat@example.com").await;
        let response = app
            .json("POST", "/tasks/create", Some(&access), Some(new_task()))
            .await;
        let id = body_json(response).await["id"].as_i64().unwrap();
        let uri = format!("/tasks/update/{id}");

        let response = app
            .json("PATCH", &uri, Some(&access), Some(json!({ "priority": "low" })))
            .await;
        assert_eq!(body_json(response).await["description"], "Quarterly numbers");

        let response = app
            .json("PATCH", &uri, Some(&access), Some(json!({ "description": null })))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_json(response).await["description"].is_null());
    }

    #[tokio::test]
    async fn test_tasks_of_other_accounts_are_not_found() {
        let app = TestApp::new().await;
        let (owner, _) = app.signed_in("owner@example.com").await;
        let (other, _) = app.signed_in("other@example.com").await;

        let response = app
            .json("POST", "/tasks/create", Some(&owner), Some(new_task()))
            .await;
        let id = body_json(response).await["id"].as_i64().unwrap();

        let response = app
            .json("GET", &format!("/tasks/get/{id}"), Some(&other), None)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .json(
                "PATCH",
                &format!("/tasks/update/{id}"),
                Some(&other),
                Some(json!({ "name": "mine now" })),
            )
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .json("DELETE", &format!("/tasks/delete/{id}"), Some(&other), None)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .json("GET", "/tasks/get/all-tasks", Some(&other), None)
            .await;
        assert!(body_json(response).await.as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_rejects_unknown_priority() {
        let app = TestApp::new().await;
        let (access, _) = app.signed_in("pat@example.com").await;

        let mut body = new_task();
        body["priority"] = json!("urgent");
        let response = app
            .json("POST", "/tasks/create", Some(&access), Some(body))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_tasks_require_authentication() {
        let app = TestApp::new().await;
        let response = app.json("GET", "/tasks/get/all-tasks", None, None).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
