//! Journal entry routes: record, fetch, post, void.

use axum::{
    Router,
    extract::State,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Deserialize;

use bursar_core::ledger::NewJournalEntry;
use bursar_db::LedgerRepository;
use bursar_shared::types::{JournalEntryId, UserId};

use super::ActorRequest;
use crate::AppState;
use crate::extract::{ApiJson, ApiPath};
use crate::response::{respond, respond_created};

/// Creates the journal entry routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/journal-entries", post(create_entry))
        .route("/journal-entries/{entry_id}", get(get_entry))
        .route("/journal-entries/{entry_id}/post", post(post_entry))
        .route("/journal-entries/{entry_id}/void", post(void_entry))
}

/// Request body for voiding an entry.
#[derive(Debug, Deserialize)]
pub struct VoidRequest {
    /// User voiding the entry.
    pub actor_id: UserId,
    /// Why the entry is voided.
    pub reason: String,
}

/// POST `/journal-entries` - Record an unposted entry.
///
/// Matching approval rules open requests in the same transaction.
async fn create_entry(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<NewJournalEntry>,
) -> impl IntoResponse {
    let scale = state.config.current().reconciliation.minor_unit_scale;
    respond_created(
        LedgerRepository::new(state.db)
            .create_entry(payload, scale)
            .await,
    )
}

/// GET `/journal-entries/{entry_id}` - Entry with lines and approval requests.
async fn get_entry(
    State(state): State<AppState>,
    ApiPath(entry_id): ApiPath<JournalEntryId>,
) -> impl IntoResponse {
    respond(LedgerRepository::new(state.db).get_entry(entry_id).await)
}

/// POST `/journal-entries/{entry_id}/post` - Post an approved entry.
async fn post_entry(
    State(state): State<AppState>,
    ApiPath(entry_id): ApiPath<JournalEntryId>,
    ApiJson(payload): ApiJson<ActorRequest>,
) -> impl IntoResponse {
    respond(
        LedgerRepository::new(state.db)
            .post_entry(entry_id, payload.actor_id)
            .await,
    )
}

/// POST `/journal-entries/{entry_id}/void` - Void an entry.
async fn void_entry(
    State(state): State<AppState>,
    ApiPath(entry_id): ApiPath<JournalEntryId>,
    ApiJson(payload): ApiJson<VoidRequest>,
) -> impl IntoResponse {
    respond(
        LedgerRepository::new(state.db)
            .void_entry(entry_id, &payload.reason, payload.actor_id)
            .await,
    )
}
