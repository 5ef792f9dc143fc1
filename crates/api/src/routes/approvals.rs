//! Approval queue and review routes.

use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::info;

use bursar_core::workflow::QueueFilter;
use bursar_db::WorkflowRepository;
use bursar_shared::AppError;
use bursar_shared::types::{ApprovalRequestId, UserId};

use crate::AppState;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::response::{error_response, respond};

/// Creates the approval routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/approvals", get(get_queue))
        .route("/approvals/stats", get(get_stats))
        .route("/approvals/{request_id}/approve", post(approve))
        .route("/approvals/{request_id}/reject", post(reject))
}

/// Query parameters for the approval queue.
#[derive(Debug, Deserialize)]
pub struct QueueQuery {
    /// `pending` (default) or `all`.
    pub filter: Option<String>,
}

/// Request body for approving a request.
#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    /// The reviewer.
    pub reviewer_id: UserId,
    /// Optional notes.
    pub notes: Option<String>,
}

/// Request body for rejecting a request.
#[derive(Debug, Deserialize)]
pub struct RejectRequest {
    /// The reviewer.
    pub reviewer_id: UserId,
    /// Why the request is rejected; required.
    #[serde(default)]
    pub notes: String,
}

/// GET `/approvals?filter=pending|all` - The approval queue.
async fn get_queue(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<QueueQuery>,
) -> impl IntoResponse {
    let filter = match query.filter.as_deref() {
        None => QueueFilter::default(),
        Some(raw) => match QueueFilter::parse(raw) {
            Some(filter) => filter,
            None => {
                return error_response(AppError::validation(format!(
                    "Unknown filter '{raw}', expected 'pending' or 'all'"
                )));
            }
        },
    };
    respond(WorkflowRepository::new(state.db).approval_queue(filter).await)
}

/// GET `/approvals/stats` - Request counts and pending amount.
async fn get_stats(State(state): State<AppState>) -> impl IntoResponse {
    respond(WorkflowRepository::new(state.db).approval_stats().await)
}

/// POST `/approvals/{request_id}/approve` - Approve a pending request.
///
/// The entry is posted according to the configured posting policy.
async fn approve(
    State(state): State<AppState>,
    ApiPath(request_id): ApiPath<ApprovalRequestId>,
    ApiJson(payload): ApiJson<ApproveRequest>,
) -> impl IntoResponse {
    let policy = state.config.current().approval.posting_policy;
    info!(
        request_id = %request_id,
        reviewer_id = %payload.reviewer_id,
        ?policy,
        "Approving request"
    );
    respond(
        WorkflowRepository::new(state.db)
            .approve_request(request_id, payload.reviewer_id, payload.notes, policy)
            .await,
    )
}

/// POST `/approvals/{request_id}/reject` - Reject a pending request and void
/// its entry.
async fn reject(
    State(state): State<AppState>,
    ApiPath(request_id): ApiPath<ApprovalRequestId>,
    ApiJson(payload): ApiJson<RejectRequest>,
) -> impl IntoResponse {
    respond(
        WorkflowRepository::new(state.db)
            .reject_request(request_id, payload.reviewer_id, &payload.notes)
            .await,
    )
}
