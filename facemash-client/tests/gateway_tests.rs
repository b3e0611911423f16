//! Integration tests for the request gateway and the HTTP persons repository
//!
//! Tests cover:
//! - Path normalization under /api, credential header, query parameters
//! - Status classification (auth vs unknown), transport failures, timeouts
//! - Envelope unwrapping and the `call_envelope` result shape
//! - Endpoint shapes used by `HttpPersonsApi`

mod helpers;

use std::sync::Arc;
use std::time::Duration;

use facemash_client::api::{HttpPersonsApi, PersonsApi};
use facemash_client::duo::DuoScope;
use facemash_client::error::ErrorKind;
use facemash_client::gateway::{CallOptions, Method, RequestGateway, TransportError};
use facemash_client::imaging::PhotoSize;
use facemash_common::api::VoteRequest;
use facemash_common::preferences::{ClassRange, Preferences};
use facemash_common::Gender;
use helpers::ScriptedTransport;
use serde_json::{json, Value};

const BASE_URL: &str = "https://backend.example/";
const INIT_DATA: &str = "query_id=AAE&user=%7B%22id%22%3A1%7D&hash=abc";

fn gateway(transport: &Arc<ScriptedTransport>, credential: Option<&str>) -> RequestGateway {
    RequestGateway::new(
        transport.clone(),
        BASE_URL,
        credential.map(str::to_string),
        Duration::from_secs(5),
    )
}

fn person_json(id: i64, gender: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Name{}", id),
        "surname": format!("Surname{}", id),
        "schoolClass": "10-1",
        "rating": 1000.0,
        "photo": null,
        "male": gender
    })
}

#[tokio::test]
async fn test_request_shape() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.respond(200, "[]");
    let gw = gateway(&transport, Some(INIT_DATA));

    let _: Vec<Value> = gw
        .get("persons", CallOptions::new().query("includePhotos", false))
        .await
        .unwrap();

    let request = transport.last_request();
    assert_eq!(request.method, Method::Get);
    assert_eq!(request.url, "https://backend.example/api/persons");
    assert_eq!(request.header("authorization"), Some(&*format!("tma {}", INIT_DATA)));
    assert_eq!(request.header("Content-Type"), Some("application/json"));
    assert_eq!(request.query_param("includePhotos"), Some("false"));
    assert!(request.body.is_none());
}

#[tokio::test]
async fn test_path_already_under_api_root() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.respond(200, "null");
    let gw = gateway(&transport, None);

    let _: Value = gw.get("/api/persons/7", CallOptions::new()).await.unwrap();

    let request = transport.last_request();
    assert_eq!(request.url, "https://backend.example/api/persons/7");
    assert_eq!(request.header("Authorization"), None);
}

/// **Given** a backend answering 401 and then 500
/// **When** two calls are made
/// **Then** the first is an AuthError and the second an UnknownError with the status
#[tokio::test]
async fn test_status_classification() {
    let transport = Arc::new(ScriptedTransport::new());
    transport
        .respond(401, "invalid init data")
        .respond(500, "Internal Server Error");
    let gw = gateway(&transport, Some(INIT_DATA));

    let err = gw.get::<Value>("persons", CallOptions::new()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::AuthError);
    assert!(err.message.contains("invalid init data"));

    let err = gw.get::<Value>("persons", CallOptions::new()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownError);
    assert!(err.message.starts_with("HTTP 500"));
}

#[tokio::test]
async fn test_transport_failure_is_network_error() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.fail(TransportError::Connect("connection refused".to_string()));
    let gw = gateway(&transport, None);

    let err = gw.get::<Value>("persons", CallOptions::new()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::NetworkError);
}

#[tokio::test(start_paused = true)]
async fn test_hanging_call_times_out() {
    // Nothing scripted: the transport never answers
    let transport = Arc::new(ScriptedTransport::new());
    let gw = gateway(&transport, None);

    let err = gw
        .get::<Value>(
            "persons",
            CallOptions::new().timeout(Duration::from_millis(250)),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::NetworkError);
    assert!(err.message.contains("250 ms"));
    assert_eq!(transport.last_request().timeout, Duration::from_millis(250));
}

#[tokio::test]
async fn test_blank_credential_never_sent() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.respond(200, "[]");
    let gw = gateway(&transport, Some("   "));

    let err = gw.get::<Value>("persons", CallOptions::new()).await.unwrap_err();

    assert_eq!(err.kind, ErrorKind::AuthError);
    assert!(transport.requests().is_empty());
}

#[tokio::test]
async fn test_failed_envelope_and_call_envelope() {
    let transport = Arc::new(ScriptedTransport::new());
    transport
        .respond(200, r#"{"success": false, "message": "Not enough persons"}"#)
        .respond(200, r#"{"success": true, "data": {"n": 3}}"#)
        .respond(503, "");
    let gw = gateway(&transport, None);

    let err = gw.get::<Value>("persons", CallOptions::new()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::UnknownError);
    assert_eq!(err.message, "Not enough persons");

    let ok = gw
        .call_envelope::<Value>(Method::Get, "persons", None, CallOptions::new())
        .await;
    assert!(ok.success);
    assert_eq!(ok.data, Some(json!({"n": 3})));

    let failed = gw
        .call_envelope::<Value>(Method::Get, "persons", None, CallOptions::new())
        .await;
    assert!(!failed.success);
    assert!(failed.data.is_none());
    assert!(failed.message.unwrap().starts_with("Unknown error: HTTP 503"));
}

#[tokio::test]
async fn test_roster_request() {
    let transport = Arc::new(ScriptedTransport::new());
    let body = json!([person_json(1, "male"), person_json(2, "female")]).to_string();
    transport.respond(200, &body);
    let api = HttpPersonsApi::new(gateway(&transport, Some(INIT_DATA)));

    let roster = api.fetch_roster().await.unwrap();

    assert_eq!(roster.len(), 2);
    assert_eq!(roster[1].gender, Gender::Female);
    let request = transport.last_request();
    assert_eq!(request.url, "https://backend.example/api/persons");
    assert_eq!(request.query_param("includePhotos"), Some("false"));
}

#[tokio::test]
async fn test_person_request_carries_photo_size() {
    let transport = Arc::new(ScriptedTransport::new());
    transport
        .respond(200, &person_json(7, "male").to_string())
        .respond(200, &person_json(8, "male").to_string());
    let api = HttpPersonsApi::new(gateway(&transport, None));

    let person = api.fetch_person(7, PhotoSize::new(144, 144)).await.unwrap();
    assert_eq!(person.id, 7);
    let request = transport.last_request();
    assert_eq!(request.url, "https://backend.example/api/persons/7");
    assert_eq!(request.query_param("photoWidth"), Some("144"));
    assert_eq!(request.query_param("photoHeight"), Some("144"));

    // A response for someone else is rejected
    let err = api.fetch_person(7, PhotoSize::new(144, 144)).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::ValidationError);
}

/// **Given** a female duo scope without class preference
/// **When** a duo is fetched
/// **Then** `oldSchool` is omitted; after choosing seniors it is `true`
#[tokio::test]
async fn test_duo_request_query() {
    let transport = Arc::new(ScriptedTransport::new());
    let body = json!([person_json(1, "female"), person_json(2, "female")]).to_string();
    transport.respond(200, &body).respond(200, &body);
    let api = HttpPersonsApi::new(gateway(&transport, None));
    let scope = DuoScope::new(Gender::Female, PhotoSize::new(700, 800));

    let candidates = api.fetch_duo(&scope).await.unwrap();
    assert_eq!(candidates.len(), 2);

    let request = transport.last_request();
    assert_eq!(request.url, "https://backend.example/api/persons/duo/filter/female");
    assert_eq!(request.query_param("haveAvatar"), Some("false"));
    assert_eq!(request.query_param("oldSchool"), None);
    assert_eq!(request.query_param("photoWidth"), Some("700"));
    assert_eq!(request.query_param("photoHeight"), Some("800"));

    let senior = scope.with_preferences(&Preferences {
        only_with_photo: true,
        class_range: ClassRange::Senior,
    });
    api.fetch_duo(&senior).await.unwrap();

    let request = transport.last_request();
    assert_eq!(request.query_param("haveAvatar"), Some("true"));
    assert_eq!(request.query_param("oldSchool"), Some("true"));
}

#[tokio::test]
async fn test_vote_request_with_empty_response() {
    let transport = Arc::new(ScriptedTransport::new());
    transport.respond(204, "");
    let api = HttpPersonsApi::new(gateway(&transport, Some(INIT_DATA)));

    api.submit_vote(VoteRequest {
        winner_id: 5,
        loser_id: 9,
    })
    .await
    .unwrap();

    let request = transport.last_request();
    assert_eq!(request.method, Method::Post);
    assert_eq!(request.url, "https://backend.example/api/persons/duo/vote");
    assert_eq!(request.body, Some(json!({"winnerId": 5, "loserId": 9})));
}
