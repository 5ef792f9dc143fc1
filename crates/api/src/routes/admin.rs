//! Administrative routes.

use axum::{Router, extract::State, response::IntoResponse, routing::post};
use serde_json::json;
use tracing::{info, warn};

use bursar_shared::AppError;

use crate::AppState;
use crate::response::{error_response, ok};

/// Creates the admin routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/admin/config/reload", post(reload_config))
}

/// POST `/admin/config/reload` - Re-read configuration sources.
///
/// On failure the running configuration stays in effect.
async fn reload_config(State(state): State<AppState>) -> impl IntoResponse {
    match state.config.reload() {
        Ok(config) => {
            let recon = &config.reconciliation;
            info!(
                amount_tolerance = %recon.amount_tolerance(),
                date_tolerance_days = recon.date_tolerance_days,
                closing_tolerance = %recon.closing_tolerance(),
                posting_policy = ?config.approval.posting_policy,
                "Configuration reloaded"
            );
            ok(json!({
                "reconciliation": {
                    "amount_tolerance": recon.amount_tolerance(),
                    "minor_unit_scale": recon.minor_unit_scale,
                    "date_tolerance_days": recon.date_tolerance_days,
                    "closing_tolerance": recon.closing_tolerance(),
                },
                "approval": {
                    "posting_policy": config.approval.posting_policy,
                },
            }))
        }
        Err(e) => {
            warn!(error = %e, "Configuration reload failed, keeping previous");
            error_response(AppError::Internal(format!("Configuration reload failed: {e}")))
        }
    }
}
