//! Approval rule management routes.

use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, patch},
};
use serde::Deserialize;

use bursar_core::workflow::NewApprovalRule;
use bursar_db::ApprovalRuleRepository;
use bursar_shared::types::{ApprovalRuleId, UserId};

use crate::AppState;
use crate::extract::{ApiJson, ApiPath};
use crate::response::{respond, respond_created};

/// Creates the approval rules routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/approval-rules", get(list_rules).post(create_rule))
        .route("/approval-rules/{rule_id}", patch(set_rule_active))
}

/// Request body for creating a rule.
#[derive(Debug, Deserialize)]
pub struct CreateRuleRequest {
    /// User creating the rule.
    pub actor_id: UserId,
    /// The rule.
    #[serde(flatten)]
    pub rule: NewApprovalRule,
}

/// Request body for activating or deactivating a rule.
#[derive(Debug, Deserialize)]
pub struct UpdateRuleRequest {
    /// User changing the rule.
    pub actor_id: UserId,
    /// New active flag.
    pub is_active: bool,
}

/// GET `/approval-rules` - List all rules.
async fn list_rules(State(state): State<AppState>) -> impl IntoResponse {
    respond(ApprovalRuleRepository::new(state.db).list_rules().await)
}

/// POST `/approval-rules` - Create a rule.
async fn create_rule(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateRuleRequest>,
) -> impl IntoResponse {
    respond_created(
        ApprovalRuleRepository::new(state.db)
            .create_rule(payload.rule, payload.actor_id)
            .await,
    )
}

/// PATCH `/approval-rules/{rule_id}` - Activate or deactivate a rule.
async fn set_rule_active(
    State(state): State<AppState>,
    ApiPath(rule_id): ApiPath<ApprovalRuleId>,
    ApiJson(payload): ApiJson<UpdateRuleRequest>,
) -> impl IntoResponse {
    respond(
        ApprovalRuleRepository::new(state.db)
            .set_rule_active(rule_id, payload.is_active, payload.actor_id)
            .await,
    )
}
