//! API route definitions.

use axum::Router;
use serde::Deserialize;

use bursar_shared::types::UserId;

use crate::AppState;

pub mod accounts;
pub mod admin;
pub mod approval_rules;
pub mod approvals;
pub mod health;
pub mod journal_entries;
pub mod reconciliation;

/// Request body carrying only the acting user.
#[derive(Debug, Deserialize)]
pub struct ActorRequest {
    /// User performing the action.
    pub actor_id: UserId,
}

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(accounts::routes())
        .merge(journal_entries::routes())
        .merge(approval_rules::routes())
        .merge(approvals::routes())
        .merge(reconciliation::routes())
        .merge(admin::routes())
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use rstest::rstest;
    use sea_orm::DatabaseConnection;
    use serde_json::Value;
    use tower::ServiceExt;

    use bursar_shared::ConfigHandle;
    use bursar_shared::config::{
        AppConfig, ApprovalConfig, DatabaseConfig, ReconciliationConfig, ServerConfig,
    };

    use crate::{AppState, create_router};

    fn state() -> AppState {
        AppState {
            db: DatabaseConnection::Disconnected,
            config: ConfigHandle::new(AppConfig {
                server: ServerConfig::default(),
                database: DatabaseConfig {
                    url: "postgres://localhost/bursar".to_string(),
                    max_connections: 1,
                    min_connections: 1,
                },
                reconciliation: ReconciliationConfig::default(),
                approval: ApprovalConfig::default(),
            }),
        }
    }

    async fn get(uri: &str) -> (StatusCode, Value) {
        let response = create_router(state())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    async fn post(uri: &str, body: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = create_router(state()).oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_health() {
        let (status, body) = get("/api/v1/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "healthy");
    }

    #[rstest]
    #[case("/api/v1/approvals?filter=someday")]
    #[case("/api/v1/reconciliation/unmatched?start_date=2026-02-01&end_date=2026-01-01")]
    #[tokio::test]
    async fn test_bad_query_is_validation_error(#[case] uri: &str) {
        let (status, body) = get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_body_missing_field_is_validation_error() {
        let (status, body) = post(
            "/api/v1/approvals/0b9c5c1e-8f3a-4d59-9a47-2f7e1f0f5a11/reject",
            r#"{"notes":"dup"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        let errors = body["errors"].as_array().unwrap();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].as_str().unwrap().contains("reviewer_id"));
    }

    #[rstest]
    #[case("/api/v1/approvals/not-a-uuid/reject", r#"{"reviewer_id":null,"notes":"x"}"#)]
    #[case("/api/v1/journal-entries", "{not json")]
    #[tokio::test]
    async fn test_malformed_request_is_validation_error(#[case] uri: &str, #[case] body: &str) {
        let (status, body) = post(uri, body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["errors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_store_failure_renders_envelope() {
        let (status, body) = get("/api/v1/accounts").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "DATABASE_ERROR");
        assert_eq!(body["retryable"], false);
    }
}
