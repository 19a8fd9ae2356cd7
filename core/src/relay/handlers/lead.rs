//! Lead intake
//! Handles POST /lead: validate, notify Telegram, forward a raw copy

use axum::{
    body::Bytes,
    extract::State,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;

use crate::error::RelayError;
use crate::relay::lead::LeadRecord;
use crate::relay::mappers::parse_json_body;
use crate::relay::notify::DeliveryStatus;
use crate::relay::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadResponse {
    pub ok: bool,
    pub telegram: bool,
    pub tg_results: Vec<DeliveryStatus>,
    pub forward: bool,
    pub fwd_resp: Option<String>,
}

/// Handle POST /lead
pub async fn handle_lead(State(state): State<AppState>, body: Bytes) -> Result<Response, RelayError> {
    let payload = parse_json_body(&body);
    let lead = LeadRecord::from_payload(&payload)?;

    tracing::info!("Lead received | Source: {} | Recipients: {}", lead.source, state.notifier.recipient_count());

    let text = lead.render_message();
    let (notified, forwarded) = tokio::join!(
        state.notifier.send_to_all(&text),
        state.forwarder.forward(&payload),
    );
    let forwarded = forwarded.unwrap_or_default();

    Ok(Json(LeadResponse {
        ok: true,
        telegram: notified.ok,
        tg_results: notified.results,
        forward: forwarded.ok,
        fwd_resp: forwarded.response,
    })
    .into_response())
}
