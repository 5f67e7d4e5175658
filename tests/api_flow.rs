//! End-to-end checks against a live server on an ephemeral port

use std::sync::Arc;

use clap::Parser;
use docgate::{store::MemoryStore, AppState, Args};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use tokio::net::TcpListener;

async fn spawn_server(extra: &[&str]) -> String {
    let mut argv = vec![
        "docgate",
        "--dev-mode",
        "--store",
        "memory",
        "--jwt-secret",
        "integration-secret-with-at-least-32-chars",
    ];
    argv.extend_from_slice(extra);
    let args = Args::try_parse_from(argv).unwrap();
    let state = Arc::new(AppState::new(args, Arc::new(MemoryStore::new())).unwrap());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(docgate::serve(listener, state));

    format!("http://{}", addr)
}

async fn login(client: &Client, base: &str, username: &str) -> String {
    let resp = client
        .post(format!("{}/api/login", base))
        .json(&json!({ "username": username }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_crud_over_http() {
    let base = spawn_server(&[]).await;
    let client = Client::new();
    let token = login(&client, &base, "alice").await;

    let resp = client
        .post(format!("{}/api/widgets", base))
        .bearer_auth(&token)
        .json(&json!({ "name": "foo" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::CREATED);
    assert!(resp.headers().contains_key("x-request-id"));
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["message"], "widget added");
    let id = body["data"]["_id"].as_str().unwrap().to_string();

    let resp = client
        .put(format!("{}/api/widgets/{}", base, id))
        .bearer_auth(&token)
        .json(&json!({ "color": "red" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "widget updated successfully" }));

    let body: Value = client
        .get(format!("{}/api/widgets", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!([{ "_id": id, "name": "foo", "color": "red" }]));

    let resp = client
        .delete(format!("{}/api/widgets/{}", base, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = client
        .get(format!("{}/api/widgets/{}", base, id))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "widget not found" }));
}

#[tokio::test]
async fn test_errors_over_http() {
    let base = spawn_server(&[]).await;
    let client = Client::new();

    let resp = client.get(format!("{}/api/widgets", base)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let token = login(&client, &base, "alice").await;

    let resp = client
        .get(format!("{}/api/widgets/not-an-id", base))
        .bearer_auth(&token)
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Invalid id: not-an-id" }));

    let resp = client.get(format!("{}/nowhere", base)).send().await.unwrap();
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Route not found" }));

    let resp = client
        .request(reqwest::Method::OPTIONS, format!("{}/api/widgets", base))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_body_limit_over_http() {
    let base = spawn_server(&["--max-body-bytes", "64"]).await;
    let client = Client::new();
    let token = login(&client, &base, "alice").await;

    let resp = client
        .post(format!("{}/api/widgets", base))
        .bearer_auth(&token)
        .json(&json!({ "blob": "x".repeat(256) }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": "Request body too large" }));
}
