use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{Request, StatusCode};
use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use tower::ServiceExt;

use capmatch_api::{build_router, state::AppState};
use capmatch_config::{
    DatabaseSettings, GeminiSettings, ServerSettings, Settings, TwilioSettings,
};
use capmatch_services::dao::{PresenceStore, StoreResult};
use capmatch_services::event::SessionEventProcessor;
use capmatch_services::summarizer::{
    MeetingSummary, SummarizeError, Summarizer, SummaryResult,
};

/// In-memory store that records the operations the webhook triggered.
#[derive(Default)]
struct RecordingStore {
    inserted: Mutex<Vec<(String, String, String)>>,
    deleted: Mutex<Vec<String>>,
    completed: Mutex<Vec<(String, String, bool)>>,
    events: Mutex<Vec<String>>,
}

#[async_trait::async_trait]
impl PresenceStore for RecordingStore {
    async fn insert_active_participant(
        &self,
        sid: &str,
        identity: &str,
        room: &str,
    ) -> StoreResult<()> {
        self.inserted.lock().unwrap().push((
            sid.to_string(),
            identity.to_string(),
            room.to_string(),
        ));
        Ok(())
    }

    async fn delete_active_participant(&self, sid: &str) -> StoreResult<u64> {
        self.deleted.lock().unwrap().push(sid.to_string());
        Ok(1)
    }

    async fn set_transcription_completed(
        &self,
        sid: &str,
        room: &str,
        completed: bool,
    ) -> StoreResult<u64> {
        self.completed
            .lock()
            .unwrap()
            .push((sid.to_string(), room.to_string(), completed));
        Ok(1)
    }

    async fn fetch_transcript(&self, _sid: &str, _room: &str) -> StoreResult<Option<String>> {
        Ok(None)
    }

    async fn update_transcription_summary(
        &self,
        _sid: &str,
        _room: &str,
        _raw: Option<&str>,
        _parsed: Option<&SummaryResult>,
    ) -> StoreResult<u64> {
        Ok(1)
    }

    async fn record_room_event(
        &self,
        event: &str,
        _room: Option<&str>,
        _sid: Option<&str>,
        _payload: &BTreeMap<String, String>,
    ) -> StoreResult<()> {
        self.events.lock().unwrap().push(event.to_string());
        Ok(())
    }
}

struct NoopSummarizer;

#[async_trait::async_trait]
impl Summarizer for NoopSummarizer {
    async fn summarize(&self, _transcript: &str) -> Result<MeetingSummary, SummarizeError> {
        Err(SummarizeError::NotConfigured)
    }
}

fn settings(auth_token: Option<&str>) -> Settings {
    Settings {
        server: ServerSettings {
            host: "127.0.0.1".to_string(),
            port: 8081,
            external_url: None,
            allowed_origins: None,
        },
        database: DatabaseSettings {
            uri: "mongodb://localhost:27017".to_string(),
            name: "capmatch-test".to_string(),
        },
        twilio: TwilioSettings {
            auth_token: auth_token.map(str::to_string),
        },
        gemini: GeminiSettings {
            api_key: None,
            model: "gemini-2.5-flash".to_string(),
            endpoint: "https://generativelanguage.googleapis.com".to_string(),
            timeout_secs: 5,
        },
    }
}

fn app(auth_token: Option<&str>) -> (axum::Router, Arc<RecordingStore>) {
    let store = Arc::new(RecordingStore::default());
    let processor = Arc::new(SessionEventProcessor::new(
        store.clone(),
        Arc::new(NoopSummarizer),
    ));
    let state = AppState {
        settings: Arc::new(settings(auth_token)),
        processor,
    };
    (build_router(state), store)
}

fn form_body(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn twilio_signature(token: &str, url: &str, pairs: &[(&str, &str)]) -> String {
    let mut sorted = pairs.to_vec();
    sorted.sort();
    let mut data = url.to_string();
    for (key, value) in sorted {
        data.push_str(key);
        data.push_str(value);
    }
    let mut mac =
        Hmac::<Sha1>::new_from_slice(token.as_bytes()).expect("HMAC accepts any key length");
    mac.update(data.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

fn webhook_request(body: String, signature: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/")
        .header("host", "localhost:8081")
        .header("content-type", "application/x-www-form-urlencoded");
    if let Some(signature) = signature {
        builder = builder.header("x-twilio-signature", signature);
    }
    builder.body(Body::from(body)).unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const CONNECT_FORM: &[(&str, &str)] = &[
    ("StatusCallbackEvent", "participant-connected"),
    ("RoomName", "planning"),
    ("ParticipantSid", "PA0002"),
    ("ParticipantIdentity", "bob"),
];

const DISCONNECT_FORM: &[(&str, &str)] = &[
    ("StatusCallbackEvent", "participant-disconnected"),
    ("RoomName", "planning"),
    ("ParticipantSid", "PA0002"),
    ("ParticipantIdentity", "bob"),
];

#[tokio::test]
async fn health_returns_ok() {
    let (app, _) = app(None);

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn connect_without_configured_token_is_acknowledged() {
    let (app, store) = app(None);

    let response = app
        .oneshot(webhook_request(form_body(CONNECT_FORM), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "ok": true }));
    assert_eq!(
        *store.inserted.lock().unwrap(),
        vec![(
            "PA0002".to_string(),
            "bob".to_string(),
            "planning".to_string()
        )],
    );
    assert_eq!(
        *store.completed.lock().unwrap(),
        vec![("PA0002".to_string(), "planning".to_string(), false)],
    );
}

#[tokio::test]
async fn tampered_signature_is_rejected() {
    let (app, store) = app(Some("secret123"));

    let signature = twilio_signature("secret123", "http://localhost:8081/", CONNECT_FORM);
    let mut tampered = CONNECT_FORM.to_vec();
    tampered[1] = ("RoomName", "some-other-room");

    let response = app
        .oneshot(webhook_request(form_body(&tampered), Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    let json = body_json(response).await;
    assert_eq!(json["error"], "forbidden");
    assert!(store.inserted.lock().unwrap().is_empty());
    assert!(store.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn valid_signature_is_accepted() {
    let (app, store) = app(Some("secret123"));

    let signature = twilio_signature("secret123", "http://localhost:8081/", DISCONNECT_FORM);

    let response = app
        .oneshot(webhook_request(form_body(DISCONNECT_FORM), Some(&signature)))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, serde_json::json!({ "ok": true }));
    assert_eq!(*store.deleted.lock().unwrap(), vec!["PA0002".to_string()]);
    assert_eq!(
        *store.completed.lock().unwrap(),
        vec![("PA0002".to_string(), "planning".to_string(), true)],
    );
}

#[tokio::test]
async fn missing_signature_with_configured_token_is_permissive() {
    // Documented trade-off: only requests that carry a signature header are
    // validated against it.
    let (app, _) = app(Some("secret123"));

    let response = app
        .oneshot(webhook_request(form_body(CONNECT_FORM), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn unknown_event_is_acknowledged_without_state_changes() {
    let (app, store) = app(None);

    let form = &[("StatusCallbackEvent", "room-created"), ("RoomName", "planning")];
    let response = app
        .oneshot(webhook_request(form_body(form), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert!(store.inserted.lock().unwrap().is_empty());
    assert!(store.deleted.lock().unwrap().is_empty());
    assert_eq!(*store.events.lock().unwrap(), vec!["room-created".to_string()]);
}

#[tokio::test]
async fn plain_endpoint_returns_ok_text() {
    let (app, store) = app(None);

    let request = Request::builder()
        .method("POST")
        .uri("/twilio/webhook/plain")
        .header("host", "localhost:8081")
        .header("content-type", "application/x-www-form-urlencoded")
        .body(Body::from(form_body(CONNECT_FORM)))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"OK");
    // Connectivity check only, nothing is processed.
    assert!(store.inserted.lock().unwrap().is_empty());
    assert!(store.events.lock().unwrap().is_empty());
}
