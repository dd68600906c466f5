//! HTTP submission client tests against an in-process issue API
//!
//! A small `axum` server bound to `127.0.0.1:0` stands in for the issue
//! API. It records every multipart upload it receives and answers with a
//! scripted status and body, so the tests need no external services.

use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use civic_report::api::client::build_http_client;
use civic_report::api::{
    login, AuthScheme, AuthSession, HttpSubmissionClient, LoginIdentity, SubmissionClient,
    SubmissionError,
};
use civic_report::config::ApiConfig;
use civic_report::report::{
    package, DraftField, FieldUpdate, IssueDraft, Photo, ReportWizard, SubmitError,
};
use reqwest::Client;

// ─── Test Server ──────────────────────────────────────────────────────────────

/// One multipart part as seen by the server
#[derive(Debug, Clone)]
struct ReceivedPart {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default)]
struct ReceivedRequest {
    authorization: Option<String>,
    parts: Vec<ReceivedPart>,
}

/// Scripted reply for the issues endpoint
#[derive(Clone)]
struct Reply {
    status: StatusCode,
    retry_after: Option<&'static str>,
    body: String,
}

impl Reply {
    fn new(status: StatusCode, body: Value) -> Self {
        Self {
            status,
            retry_after: None,
            body: body.to_string(),
        }
    }
}

#[derive(Clone)]
struct ServerState {
    reply: Reply,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

async fn create_issue(
    State(state): State<ServerState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let mut request = ReceivedRequest {
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        parts: Vec::new(),
    };

    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let bytes = field.bytes().await.unwrap().to_vec();
        request.parts.push(ReceivedPart {
            name,
            filename,
            content_type,
            bytes,
        });
    }
    state.received.lock().unwrap().push(request);

    let mut response = (state.reply.status, state.reply.body.clone()).into_response();
    if let Some(retry_after) = state.reply.retry_after {
        response
            .headers_mut()
            .insert(header::RETRY_AFTER, retry_after.parse().unwrap());
    }
    response
}

async fn login_handler(Json(body): Json<Value>) -> Response {
    if body["username"] == "keyuser" && body["password"] == "secret" {
        return Json(json!({"key": "tok-key"})).into_response();
    }

    let identity_ok = body["username"] == "ada" || body["email"] == "ada@example.com";
    if identity_ok && body["password"] == "secret" {
        Json(json!({
            "user": {"id": 1, "username": "ada"},
            "tokens": {"access": "access-123", "refresh": "refresh-456"}
        }))
        .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Invalid credentials"})),
        )
            .into_response()
    }
}

async fn refresh_handler(Json(body): Json<Value>) -> Response {
    if body["refresh"] == "refresh-456" {
        Json(json!({"access": "access-789"})).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"detail": "Token is invalid or expired"})),
        )
            .into_response()
    }
}

struct TestServer {
    base_url: String,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl TestServer {
    async fn start(reply: Reply) -> Self {
        let received = Arc::new(Mutex::new(Vec::new()));
        let state = ServerState {
            reply,
            received: Arc::clone(&received),
        };
        let app = Router::new()
            .route("/api/issues/", post(create_issue))
            .route("/api/auth/login/", post(login_handler))
            .route("/api/auth/token/refresh/", post(refresh_handler))
            .with_state(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{}/api/", addr),
            received,
        }
    }

    fn requests(&self) -> Vec<ReceivedRequest> {
        self.received.lock().unwrap().clone()
    }

    fn client(&self, session: AuthSession) -> HttpSubmissionClient {
        let config = ApiConfig {
            base_url: self.base_url.clone(),
            timeout_secs: 5,
            ..ApiConfig::default()
        };
        HttpSubmissionClient::from_config(&config, session).unwrap()
    }
}

// ─── Fixtures ─────────────────────────────────────────────────────────────────

fn complete_draft() -> IssueDraft {
    let mut draft = IssueDraft::default();
    for update in [
        FieldUpdate::Title("Broken streetlight".to_string()),
        FieldUpdate::Description("Light out for a week".to_string()),
        FieldUpdate::Location("Elm St & 3rd".to_string()),
        FieldUpdate::Category("Public Safety".to_string()),
        FieldUpdate::Photos(vec![
            Photo::from_bytes("night.jpg", "image/jpeg", vec![1, 2, 3]),
            Photo::from_bytes("pole.png", "image/png", vec![4, 5]),
        ]),
        FieldUpdate::Severity("Medium".to_string()),
        FieldUpdate::FullName("Ada Lovelace".to_string()),
        FieldUpdate::Email("ada@example.com".to_string()),
        FieldUpdate::Phone("555-0100".to_string()),
    ] {
        draft.apply(update);
    }
    draft
}

fn session() -> AuthSession {
    AuthSession::new("access-123", AuthScheme::Bearer)
}

// ─── Tests ────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_submit_sends_multipart_with_auth_header() {
    let server = TestServer::start(Reply::new(
        StatusCode::CREATED,
        json!({
            "id": 17,
            "ai_category": "Public Safety",
            "ai_confidence": 0.92,
            "ai_analysis": {"detected": "streetlight"}
        }),
    ))
    .await;
    let client = server.client(session());

    let receipt = client.submit(package(&complete_draft()).unwrap()).await.unwrap();
    assert_eq!(receipt.id, "17");
    let ai = receipt.ai.unwrap();
    assert_eq!(ai.category.as_deref(), Some("Public Safety"));
    assert_eq!(ai.confidence, Some(0.92));

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.authorization.as_deref(), Some("Bearer access-123"));

    let names: Vec<&str> = request.parts.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "title",
            "description",
            "location",
            "category",
            "severity",
            "contact",
            "email",
            "phone",
            "photos",
            "photos"
        ]
    );

    let contact = request.parts.iter().find(|p| p.name == "contact").unwrap();
    assert_eq!(contact.bytes, b"Ada Lovelace");
    assert!(contact.filename.is_none());

    let photos: Vec<&ReceivedPart> = request.parts.iter().filter(|p| p.name == "photos").collect();
    assert_eq!(photos[0].filename.as_deref(), Some("night.jpg"));
    assert_eq!(photos[0].content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(photos[0].bytes, vec![1, 2, 3]);
    assert_eq!(photos[1].filename.as_deref(), Some("pole.png"));
    assert_eq!(photos[1].content_type.as_deref(), Some("image/png"));
}

#[tokio::test]
async fn test_token_scheme_header() {
    let server = TestServer::start(Reply::new(StatusCode::CREATED, json!({"id": "abc"}))).await;
    let client = server.client(AuthSession::new("tok", AuthScheme::Token));

    client.submit(package(&complete_draft()).unwrap()).await.unwrap();
    assert_eq!(
        server.requests()[0].authorization.as_deref(),
        Some("Token tok")
    );
}

#[tokio::test]
async fn test_non_json_success_body_still_succeeds() {
    let server = TestServer::start(Reply {
        status: StatusCode::OK,
        retry_after: None,
        body: "created".to_string(),
    })
    .await;
    let client = server.client(session());

    let receipt = client.submit(package(&complete_draft()).unwrap()).await.unwrap();
    assert_eq!(receipt.id, "unknown");
    assert!(receipt.ai.is_none());
}

#[tokio::test]
async fn test_field_errors_are_surfaced_through_wizard() {
    let server = TestServer::start(Reply::new(
        StatusCode::BAD_REQUEST,
        json!({"email": ["rejected"]}),
    ))
    .await;
    let client = server.client(session());

    let mut wizard = ReportWizard::with_draft(complete_draft());
    while wizard.advance() {}
    let before = wizard.draft().clone();

    let err = wizard.submit(&client).await.unwrap_err();
    let SubmitError::Submission(failure) = &err else {
        panic!("expected submission failure, got {:?}", err);
    };
    assert_eq!(failure.status(), Some(400));
    assert_eq!(failure.messages_for(DraftField::Email), ["rejected".to_string()]);

    assert_eq!(wizard.step_number(), 6);
    assert_eq!(wizard.draft(), &before);
}

#[tokio::test]
async fn test_unauthorized_maps_to_auth_error() {
    let server = TestServer::start(Reply::new(
        StatusCode::UNAUTHORIZED,
        json!({"detail": "Token expired"}),
    ))
    .await;
    let client = server.client(session());

    let err = client
        .submit(package(&complete_draft()).unwrap())
        .await
        .unwrap_err();
    assert!(err.is_auth_error());
    assert!(matches!(
        &err,
        SubmissionError::Unauthorized { message: Some(m) } if m == "Token expired"
    ));
}

#[tokio::test]
async fn test_rate_limit_reads_retry_after() {
    let server = TestServer::start(Reply {
        status: StatusCode::TOO_MANY_REQUESTS,
        retry_after: Some("30"),
        body: String::new(),
    })
    .await;
    let client = server.client(session());

    let err = client
        .submit(package(&complete_draft()).unwrap())
        .await
        .unwrap_err();
    assert!(err.is_rate_limited());
    assert!(matches!(
        err,
        SubmissionError::RateLimited {
            retry_after_secs: Some(30)
        }
    ));
}

#[tokio::test]
async fn test_unreachable_server_is_network_error() {
    // Bind then drop to get a port with nothing listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpSubmissionClient::new(format!("http://{}/api/", addr), session());
    let err = client
        .submit(package(&complete_draft()).unwrap())
        .await
        .unwrap_err();
    assert!(matches!(err, SubmissionError::Network { .. }));
}

#[tokio::test]
async fn test_login_returns_session() {
    let server = TestServer::start(Reply::new(StatusCode::CREATED, json!({}))).await;
    let http = build_http_client(&ApiConfig::default()).unwrap();

    let session = login(
        &http,
        &server.base_url,
        &LoginIdentity::Username("ada".to_string()),
        "secret",
        AuthScheme::Bearer,
    )
    .await
    .unwrap();
    assert_eq!(session.authorization(), "Bearer access-123");
    assert_eq!(session.refresh_token(), Some("refresh-456"));

    let by_email = login(
        &http,
        &server.base_url,
        &LoginIdentity::Email("ada@example.com".to_string()),
        "secret",
        AuthScheme::Bearer,
    )
    .await
    .unwrap();
    assert_eq!(by_email.authorization(), "Bearer access-123");
}

#[tokio::test]
async fn test_login_with_bad_password_is_unauthorized() {
    let server = TestServer::start(Reply::new(StatusCode::CREATED, json!({}))).await;
    let http = build_http_client(&ApiConfig::default()).unwrap();

    let err = login(
        &http,
        &server.base_url,
        &LoginIdentity::Username("ada".to_string()),
        "wrong",
        AuthScheme::Bearer,
    )
    .await
    .unwrap_err();
    assert!(err.is_auth_error());
}

#[tokio::test]
async fn test_login_accepts_token_key_reply() {
    let server = TestServer::start(Reply::new(StatusCode::CREATED, json!({}))).await;
    let http = build_http_client(&ApiConfig::default()).unwrap();

    let session = login(
        &http,
        &server.base_url,
        &LoginIdentity::Username("keyuser".to_string()),
        "secret",
        AuthScheme::Token,
    )
    .await
    .unwrap();
    assert_eq!(session.authorization(), "Token tok-key");
    assert!(session.refresh_token().is_none());
}

#[tokio::test]
async fn test_refresh_swaps_access_token_and_keeps_refresh() {
    let server = TestServer::start(Reply::new(StatusCode::CREATED, json!({"id": 1}))).await;
    let http = Client::new();

    let session = login(
        &http,
        &server.base_url,
        &LoginIdentity::Username("ada".to_string()),
        "secret",
        AuthScheme::Bearer,
    )
    .await
    .unwrap();

    let refreshed = session.refresh(&http, &server.base_url).await.unwrap();
    assert_eq!(refreshed.authorization(), "Bearer access-789");
    assert_eq!(refreshed.refresh_token(), Some("refresh-456"));

    // The refreshed session is what reaches the issues endpoint
    server
        .client(refreshed)
        .submit(package(&complete_draft()).unwrap())
        .await
        .unwrap();
    assert_eq!(
        server.requests()[0].authorization.as_deref(),
        Some("Bearer access-789")
    );
}

#[tokio::test]
async fn test_refresh_with_stale_token_is_unauthorized() {
    let server = TestServer::start(Reply::new(StatusCode::CREATED, json!({}))).await;
    let session = AuthSession::new("old", AuthScheme::Bearer).with_refresh_token("stale");

    let err = session
        .refresh(&Client::new(), &server.base_url)
        .await
        .unwrap_err();
    assert!(matches!(
        &err,
        SubmissionError::Unauthorized { message: Some(m) } if m == "Token is invalid or expired"
    ));
}

#[tokio::test]
async fn test_hand_built_part_with_bad_mime_is_still_sent() {
    let server = TestServer::start(Reply::new(StatusCode::CREATED, json!({"id": 3}))).await;
    let client = server.client(session());

    let mut payload = package(&complete_draft()).unwrap();
    payload.file_parts[0].mime_type = "not a mime".to_string();

    let receipt = client.submit(payload).await.unwrap();
    assert_eq!(receipt.id, "3");

    let requests = server.requests();
    let photo = requests[0]
        .parts
        .iter()
        .find(|p| p.filename.as_deref() == Some("night.jpg"))
        .unwrap();
    assert_ne!(photo.content_type.as_deref(), Some("not a mime"));
    assert_eq!(photo.bytes, vec![1, 2, 3]);
}
