//! Bank reconciliation routes: bank accounts, statements, matching, close-out.

use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use serde::Deserialize;

use bursar_core::reconciliation::{
    MatchTolerance, NewBankAccount, NewBankStatement, StatementLineInput,
};
use bursar_db::ReconciliationRepository;
use bursar_shared::AppError;
use bursar_shared::types::{BankAccountId, BankStatementId, JournalEntryId, StatementLineId, UserId};

use super::ActorRequest;
use crate::AppState;
use crate::extract::{ApiJson, ApiPath, ApiQuery};
use crate::response::{error_response, respond, respond_created};

/// Creates the reconciliation routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/bank-accounts", get(list_bank_accounts).post(create_bank_account))
        .route("/bank-statements", get(list_statements).post(create_statement))
        .route("/bank-statements/{statement_id}", get(get_statement))
        .route("/bank-statements/{statement_id}/lines", post(add_line))
        .route("/bank-statements/{statement_id}/reconcile", post(reconcile_statement))
        .route("/statement-lines/{line_id}/match", post(match_line))
        .route("/statement-lines/{line_id}/unmatch", post(unmatch_line))
        .route("/reconciliation/unmatched", get(unmatched_transactions))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for creating a bank account.
#[derive(Debug, Deserialize)]
pub struct CreateBankAccountRequest {
    /// User creating the bank account.
    pub actor_id: UserId,
    /// The bank account.
    #[serde(flatten)]
    pub account: NewBankAccount,
}

/// Request body for creating a statement.
#[derive(Debug, Deserialize)]
pub struct CreateStatementRequest {
    /// User importing the statement.
    pub actor_id: UserId,
    /// The statement header.
    #[serde(flatten)]
    pub statement: NewBankStatement,
}

/// Request body for adding a statement line.
#[derive(Debug, Deserialize)]
pub struct AddLineRequest {
    /// User importing the line.
    pub actor_id: UserId,
    /// The line.
    #[serde(flatten)]
    pub line: StatementLineInput,
}

/// Request body for matching a line to a transaction.
#[derive(Debug, Deserialize)]
pub struct MatchRequest {
    /// User making the match.
    pub actor_id: UserId,
    /// The journal entry to match.
    pub transaction_id: JournalEntryId,
}

/// Query parameters for listing statements.
#[derive(Debug, Deserialize)]
pub struct StatementsQuery {
    /// Only statements of this bank account.
    pub bank_account_id: Option<BankAccountId>,
}

/// Query parameters for unmatched ledger transactions.
#[derive(Debug, Deserialize)]
pub struct UnmatchedQuery {
    /// Start of the date range (inclusive).
    pub start_date: NaiveDate,
    /// End of the date range (inclusive).
    pub end_date: NaiveDate,
    /// Only transactions plausibly belonging to this bank account.
    pub bank_account_id: Option<BankAccountId>,
}

// ============================================================================
// Route Handlers
// ============================================================================

/// GET `/bank-accounts` - List bank accounts.
async fn list_bank_accounts(State(state): State<AppState>) -> impl IntoResponse {
    respond(ReconciliationRepository::new(state.db).list_bank_accounts().await)
}

/// POST `/bank-accounts` - Create a bank account.
async fn create_bank_account(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateBankAccountRequest>,
) -> impl IntoResponse {
    respond_created(
        ReconciliationRepository::new(state.db)
            .create_bank_account(&payload.account, payload.actor_id)
            .await,
    )
}

/// GET `/bank-statements?bank_account_id=` - List statements.
async fn list_statements(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<StatementsQuery>,
) -> impl IntoResponse {
    respond(
        ReconciliationRepository::new(state.db)
            .list_statements(query.bank_account_id)
            .await,
    )
}

/// POST `/bank-statements` - Create a pending statement.
async fn create_statement(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateStatementRequest>,
) -> impl IntoResponse {
    let scale = state.config.current().reconciliation.minor_unit_scale;
    respond_created(
        ReconciliationRepository::new(state.db)
            .create_statement(&payload.statement, scale, payload.actor_id)
            .await,
    )
}

/// GET `/bank-statements/{statement_id}` - Statement with its lines.
async fn get_statement(
    State(state): State<AppState>,
    ApiPath(statement_id): ApiPath<BankStatementId>,
) -> impl IntoResponse {
    respond(
        ReconciliationRepository::new(state.db)
            .get_statement_with_lines(statement_id)
            .await,
    )
}

/// POST `/bank-statements/{statement_id}/lines` - Add a line.
async fn add_line(
    State(state): State<AppState>,
    ApiPath(statement_id): ApiPath<BankStatementId>,
    ApiJson(payload): ApiJson<AddLineRequest>,
) -> impl IntoResponse {
    let scale = state.config.current().reconciliation.minor_unit_scale;
    respond_created(
        ReconciliationRepository::new(state.db)
            .add_line(statement_id, &payload.line, scale, payload.actor_id)
            .await,
    )
}

/// POST `/bank-statements/{statement_id}/reconcile` - Close out a statement.
async fn reconcile_statement(
    State(state): State<AppState>,
    ApiPath(statement_id): ApiPath<BankStatementId>,
    ApiJson(payload): ApiJson<ActorRequest>,
) -> impl IntoResponse {
    let tolerance = state.config.current().reconciliation.closing_tolerance();
    respond(
        ReconciliationRepository::new(state.db)
            .reconcile_statement(statement_id, payload.actor_id, tolerance)
            .await,
    )
}

/// POST `/statement-lines/{line_id}/match` - Match a line to a transaction.
async fn match_line(
    State(state): State<AppState>,
    ApiPath(line_id): ApiPath<StatementLineId>,
    ApiJson(payload): ApiJson<MatchRequest>,
) -> impl IntoResponse {
    let tolerance = MatchTolerance::from(&state.config.current().reconciliation);
    respond(
        ReconciliationRepository::new(state.db)
            .match_line(line_id, payload.transaction_id, payload.actor_id, tolerance)
            .await,
    )
}

/// POST `/statement-lines/{line_id}/unmatch` - Clear a match.
async fn unmatch_line(
    State(state): State<AppState>,
    ApiPath(line_id): ApiPath<StatementLineId>,
    ApiJson(payload): ApiJson<ActorRequest>,
) -> impl IntoResponse {
    respond(
        ReconciliationRepository::new(state.db)
            .unmatch_line(line_id, payload.actor_id)
            .await,
    )
}

/// GET `/reconciliation/unmatched?start_date=&end_date=&bank_account_id=` -
/// Posted transactions no line is matched to.
async fn unmatched_transactions(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UnmatchedQuery>,
) -> impl IntoResponse {
    if query.start_date > query.end_date {
        return error_response(AppError::validation(
            "start_date must not be after end_date",
        ));
    }
    respond(
        ReconciliationRepository::new(state.db)
            .unmatched_transactions(query.start_date, query.end_date, query.bank_account_id)
            .await,
    )
}
