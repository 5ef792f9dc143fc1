//! Chart of accounts routes.

use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::get,
};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;

use bursar_core::ledger::NewAccount;
use bursar_db::AccountRepository;
use bursar_db::LedgerRepository;
use bursar_shared::types::{AccountId, UserId};

use super::ActorRequest;
use crate::AppState;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::response::{respond, respond_created};

/// Creates the account routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounts", get(list_accounts).post(create_account))
        .route("/accounts/{account_id}", axum::routing::delete(delete_account))
        .route("/accounts/{account_id}/balance", get(get_account_balance))
}

/// Request body for creating an account.
#[derive(Debug, Deserialize)]
pub struct CreateAccountRequest {
    /// User creating the account.
    pub actor_id: UserId,
    /// The account.
    #[serde(flatten)]
    pub account: NewAccount,
}

/// Query parameters for an account balance.
#[derive(Debug, Deserialize)]
pub struct BalanceQuery {
    /// Balance date (inclusive); today when omitted.
    pub as_of: Option<NaiveDate>,
}

/// GET `/accounts` - List accounts by code.
async fn list_accounts(State(state): State<AppState>) -> impl IntoResponse {
    respond(AccountRepository::new(state.db).list_accounts().await)
}

/// POST `/accounts` - Create an account.
async fn create_account(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateAccountRequest>,
) -> impl IntoResponse {
    respond_created(
        AccountRepository::new(state.db)
            .create_account(payload.account, payload.actor_id)
            .await,
    )
}

/// DELETE `/accounts/{account_id}` - Delete an unreferenced account.
async fn delete_account(
    State(state): State<AppState>,
    ApiPath(account_id): ApiPath<AccountId>,
    ApiJson(payload): ApiJson<ActorRequest>,
) -> impl IntoResponse {
    respond(
        AccountRepository::new(state.db)
            .delete_account(account_id, payload.actor_id)
            .await
            .map(|()| serde_json::json!({ "deleted": account_id })),
    )
}

/// GET `/accounts/{account_id}/balance?as_of=` - Posted balance at a date.
async fn get_account_balance(
    State(state): State<AppState>,
    ApiPath(account_id): ApiPath<AccountId>,
    ApiQuery(query): ApiQuery<BalanceQuery>,
) -> impl IntoResponse {
    let as_of = query.as_of.unwrap_or_else(|| Utc::now().date_naive());
    respond(
        LedgerRepository::new(state.db)
            .account_balance(account_id, as_of)
            .await,
    )
}
