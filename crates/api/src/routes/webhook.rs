use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Form, OriginalUri, State},
    http::{HeaderMap, Uri, header},
};
use capmatch_config::Settings;
use capmatch_services::twilio::verify_signature;

use crate::{error::ApiError, state::AppState};

const SIGNATURE_HEADER: &str = "x-twilio-signature";

/// Room status callback endpoint. Once the signature passes, the request
/// is always acknowledged with `{"ok": true}`: processing failures are
/// logged, never surfaced, so the provider does not retry.
pub async fn twilio_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    Form(form): Form<BTreeMap<String, String>>,
) -> Result<Json<serde_json::Value>, ApiError> {
    authenticate(&state.settings, &headers, &uri, &form)?;

    state.processor.process(&form).await;

    Ok(Json(serde_json::json!({ "ok": true })))
}

/// Plaintext sibling of the webhook endpoint for manual connectivity
/// checks. Same authentication, no state changes.
pub async fn twilio_webhook_plain(
    State(state): State<AppState>,
    headers: HeaderMap,
    OriginalUri(uri): OriginalUri,
    Form(form): Form<BTreeMap<String, String>>,
) -> Result<&'static str, ApiError> {
    authenticate(&state.settings, &headers, &uri, &form)?;

    Ok("OK")
}

fn authenticate(
    settings: &Settings,
    headers: &HeaderMap,
    uri: &Uri,
    form: &BTreeMap<String, String>,
) -> Result<(), ApiError> {
    let url = external_url(settings, headers, uri);
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    if !verify_signature(
        &url,
        form,
        signature,
        settings.twilio.auth_token.as_deref(),
    ) {
        return Err(ApiError::Forbidden("Invalid Twilio signature".to_string()));
    }

    Ok(())
}

/// Reconstructs the URL exactly as the provider addressed it. The
/// signature covers the full external URL, so behind a reverse proxy the
/// internal socket address is useless: prefer the configured external
/// base, then the forwarding headers.
fn external_url(settings: &Settings, headers: &HeaderMap, uri: &Uri) -> String {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");

    if let Some(base) = settings.server.external_url.as_deref() {
        return format!("{}{}", base.trim_end_matches('/'), path_and_query);
    }

    let header_str = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
    };

    let proto = header_str("x-forwarded-proto").unwrap_or("http");
    let host = header_str("x-forwarded-host")
        .or_else(|| {
            headers
                .get(header::HOST)
                .and_then(|value| value.to_str().ok())
        })
        .unwrap_or("localhost");

    format!("{proto}://{host}{path_and_query}")
}
