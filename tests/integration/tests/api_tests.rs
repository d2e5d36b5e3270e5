//! API Integration Tests
//!
//! Each test spawns a server on in-memory repositories with a scripted
//! platform, so no external services are required.
//!
//! Run with: cargo test -p integration-tests --test api_tests

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use integration_tests::*;
use reqwest::StatusCode;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use vault_api::extractors::UPDATE_SECRET_HEADER;
use vault_core::PlatformError;

async fn issue_token(server: &TestServer, message_ids: &[i64]) -> String {
    let response = server
        .post_admin("/api/v1/tokens", &json!({ "message_ids": message_ids }))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::CREATED).await.unwrap();
    body["token"].as_str().unwrap().to_string()
}

fn open_link(user_id: vault_core::ChatId, token: &str) -> Value {
    json!({ "type": "OPEN_LINK", "user_id": user_id, "token": token })
}

fn join_event(kind: &str, user_id: vault_core::ChatId, channel_id: vault_core::ChatId) -> Value {
    json!({ "type": kind, "user_id": user_id, "channel_id": channel_id })
}

// ============================================================================
// Health Check Tests
// ============================================================================

#[tokio::test]
async fn test_health_check() {
    let server = TestServer::start(Arc::new(FakePlatform::new())).await.unwrap();

    let response = server.get("/health").await.unwrap();
    assert!(response.headers().contains_key("x-request-id"));
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "healthy");
}

#[tokio::test]
async fn test_readiness_follows_scheduler() {
    let server = TestServer::start(Arc::new(FakePlatform::new())).await.unwrap();

    let response = server.get("/health/ready").await.unwrap();
    let body: Value = assert_json(response, StatusCode::SERVICE_UNAVAILABLE)
        .await
        .unwrap();
    assert_eq!(body["checks"]["scheduler"], "stopped");
    assert_eq!(body["checks"]["platform"], "healthy");

    let shutdown = CancellationToken::new();
    let _task = server.context().scheduler().clone().start(shutdown.clone());

    let response = server.get("/health/ready").await.unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["status"], "ready");
    shutdown.cancel();
}

// ============================================================================
// Admin Token Tests
// ============================================================================

#[tokio::test]
async fn test_admin_routes_require_key() {
    let server = TestServer::start(Arc::new(FakePlatform::new())).await.unwrap();
    let body = json!({ "message_ids": [1] });

    let response = server.post("/api/v1/tokens", &body).await.unwrap();
    let error: Value = assert_json(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(error["error"]["code"], "MISSING_AUTHORIZATION");

    let response = server
        .client
        .post(format!("{}/api/v1/tokens", server.base_url()))
        .bearer_auth("wrong-key")
        .json(&body)
        .send()
        .await
        .unwrap();
    let error: Value = assert_json(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(error["error"]["code"], "INVALID_API_KEY");

    let response = server.get("/api/v1/stats").await.unwrap();
    assert_status(response, StatusCode::UNAUTHORIZED).await.unwrap();
}

#[tokio::test]
async fn test_create_and_inspect_token() {
    let server = TestServer::start(Arc::new(FakePlatform::new())).await.unwrap();

    let response = server
        .post_admin(
            "/api/v1/tokens",
            &json!({ "message_ids": [3, 1, 2], "expires_in": 3600, "created_by": 1 }),
        )
        .await
        .unwrap();
    let created: Value = assert_json(response, StatusCode::CREATED).await.unwrap();

    let token = created["token"].as_str().unwrap();
    assert_eq!(
        created["link"],
        format!("https://t.me/VaultTestBot?start={token}")
    );
    let ids: Vec<i64> = created["files"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["message_id"].as_i64().unwrap())
        .collect();
    assert_eq!(ids, vec![3, 1, 2]);
    assert!(created["expires_at"].is_string());

    let response = server
        .get_admin(&format!("/api/v1/tokens/{token}"))
        .await
        .unwrap();
    let fetched: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(fetched["token"], token);
    assert_eq!(fetched["expired"], false);
    assert_eq!(fetched["access_count"], 0);
    assert!(fetched.get("last_accessed_at").is_none());
}

#[tokio::test]
async fn test_create_range_token() {
    let server = TestServer::start(Arc::new(FakePlatform::new())).await.unwrap();

    let response = server
        .post_admin(
            "/api/v1/tokens/range",
            &json!({ "first_message_id": 12, "last_message_id": 10 }),
        )
        .await
        .unwrap();
    let created: Value = assert_json(response, StatusCode::CREATED).await.unwrap();
    assert_eq!(created["files"].as_array().unwrap().len(), 3);
    assert_eq!(created["files"][0]["message_id"], 10);

    let response = server
        .post_admin(
            "/api/v1/tokens/range",
            &json!({ "first_message_id": 1, "last_message_id": 500 }),
        )
        .await
        .unwrap();
    let error: Value = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(error["error"]["code"], "BATCH_TOO_LARGE");
}

#[tokio::test]
async fn test_token_validation_errors() {
    let server = TestServer::start(Arc::new(FakePlatform::new())).await.unwrap();

    let response = server
        .post_admin("/api/v1/tokens", &json!({ "message_ids": [] }))
        .await
        .unwrap();
    let error: Value = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(error["error"]["code"], "VALIDATION_ERROR");
    assert!(error["error"]["details"]["message_ids"].is_array());

    let response = server
        .post_admin("/api/v1/tokens", &json!({ "message_ids": "nope" }))
        .await
        .unwrap();
    let error: Value = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(error["error"]["code"], "INVALID_BODY");

    let response = server
        .get_admin("/api/v1/tokens/does-not-exist")
        .await
        .unwrap();
    let error: Value = assert_json(response, StatusCode::NOT_FOUND).await.unwrap();
    assert_eq!(error["error"]["code"], "UNKNOWN_TOKEN");
}

// ============================================================================
// Update Tests
// ============================================================================

#[tokio::test]
async fn test_open_link_delivers_files() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    let server = TestServer::start(platform.clone()).await.unwrap();
    let token = issue_token(&server, &[11, 12]).await;

    let response = server
        .post_update(&open_link(U1, &token))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body["status"], "completed");
    assert_eq!(body["result"]["outcome"], "delivered");
    assert_eq!(body["result"]["summary"]["delivered"], 2);
    assert_eq!(body["result"]["summary"]["requested"], 2);
    assert_eq!(platform.copied_files(), vec![11, 12]);
}

#[tokio::test]
async fn test_open_link_denied_lists_missing_channels() {
    let platform = Arc::new(FakePlatform::new());
    platform.join(C1, U2);
    platform.join(C3, U2);
    let server = TestServer::start(platform.clone()).await.unwrap();
    let token = issue_token(&server, &[11]).await;

    let response = server
        .post_update(&open_link(U2, &token))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();

    assert_eq!(body["result"]["outcome"], "denied");
    let missing = body["result"]["missing"].as_array().unwrap();
    assert_eq!(missing.len(), 1);
    assert_eq!(missing[0]["channel_id"], json!(C2));
    assert_eq!(missing[0]["join_url"], "https://t.me/second_channel");
    assert!(platform.copies().is_empty());
}

#[tokio::test]
async fn test_join_request_flow_over_http() {
    let platform = Arc::new(FakePlatform::new());
    platform.join(C1, U3);
    platform.join(C2, U3);
    let server = TestServer::start(platform.clone()).await.unwrap();
    let token = issue_token(&server, &[31]).await;

    let response = server
        .post_update(&open_link(U3, &token))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["result"]["outcome"], "denied");

    for kind in ["JOIN_REQUEST", "JOIN_REQUEST_APPROVED"] {
        let response = server
            .post_update(&join_event(kind, U3, C3))
            .await
            .unwrap();
        let body: Value = assert_json(response, StatusCode::ACCEPTED).await.unwrap();
        assert_eq!(body["status"], "accepted");
    }

    let checks = platform.membership_checks();
    let response = server
        .post_update(&open_link(U3, &token))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["result"]["outcome"], "delivered");
    assert_eq!(platform.membership_checks(), checks);
}

#[tokio::test]
async fn test_join_event_for_unknown_channel_rejected() {
    let server = TestServer::start(Arc::new(FakePlatform::new())).await.unwrap();

    let response = server
        .post_update(&join_event(
            "JOIN_REQUEST",
            U1,
            vault_core::ChatId::new(-1_009_999_999_999),
        ))
        .await
        .unwrap();
    let error: Value = assert_json(response, StatusCode::NOT_FOUND).await.unwrap();
    assert_eq!(error["error"]["code"], "UNKNOWN_CHANNEL");
}

#[tokio::test]
async fn test_updates_require_relay_secret() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    let server = TestServer::start(platform.clone()).await.unwrap();
    let token = issue_token(&server, &[1]).await;

    let response = server
        .post("/api/v1/updates", &open_link(U1, &token))
        .await
        .unwrap();
    let error: Value = assert_json(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(error["error"]["code"], "INVALID_UPDATE_SECRET");

    let response = server
        .client
        .post(format!("{}/api/v1/updates", server.base_url()))
        .header(UPDATE_SECRET_HEADER, "not-the-secret")
        .json(&join_event("JOIN_REQUEST_APPROVED", U2, C3))
        .send()
        .await
        .unwrap();
    let error: Value = assert_json(response, StatusCode::UNAUTHORIZED).await.unwrap();
    assert_eq!(error["error"]["code"], "INVALID_UPDATE_SECRET");

    assert!(platform.copies().is_empty());
    assert_eq!(platform.membership_checks(), 0);
    assert!(server.context().subscription_cache().is_empty());
}

#[tokio::test]
async fn test_approval_for_open_channel_refused() {
    let platform = Arc::new(FakePlatform::new());
    let server = TestServer::start(platform.clone()).await.unwrap();
    let token = issue_token(&server, &[1]).await;

    for channel in [C1, C2] {
        let response = server
            .post_update(&join_event("JOIN_REQUEST_APPROVED", U1, channel))
            .await
            .unwrap();
        let error: Value = assert_json(response, StatusCode::CONFLICT).await.unwrap();
        assert_eq!(error["error"]["code"], "CHANNEL_NOT_GATED");
    }
    assert!(server.context().subscription_cache().is_empty());

    let response = server
        .post_update(&open_link(U1, &token))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["result"]["outcome"], "denied");
    assert!(platform.membership_checks() > 0);
    assert!(platform.copies().is_empty());
}

#[tokio::test]
async fn test_future_dated_approval_is_cached_at_arrival() {
    let server = TestServer::start(Arc::new(FakePlatform::new())).await.unwrap();
    let far_future = (Utc::now() + chrono::Duration::days(365)).to_rfc3339();

    let response = server
        .post_update(&join_event("JOIN_REQUEST", U3, C3))
        .await
        .unwrap();
    assert_status(response, StatusCode::ACCEPTED).await.unwrap();

    let mut approved = join_event("JOIN_REQUEST_APPROVED", U3, C3);
    approved["timestamp"] = json!(far_future);
    let response = server.post_update(&approved).await.unwrap();
    assert_status(response, StatusCode::ACCEPTED).await.unwrap();

    let record = server
        .context()
        .subscription_cache()
        .record(U3, C3)
        .unwrap();
    assert!(record.checked_at <= Utc::now());
}

#[tokio::test]
async fn test_client_disconnect_stops_delivery() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    platform.slow_copies(Duration::from_millis(200));
    let config = test_config(&[("AUTO_DELETE_TIME", "600")]).unwrap();
    let server = TestServer::start_with_config(platform.clone(), config)
        .await
        .unwrap();
    let token = issue_token(&server, &[1, 2, 3, 4]).await;

    let sent = server
        .update_request(&open_link(U1, &token))
        .timeout(Duration::from_millis(300))
        .send()
        .await;
    assert!(sent.is_err());

    // Let the copy in flight finish
    tokio::time::sleep(Duration::from_millis(800)).await;

    assert!(platform.copied_files().len() < 4);
    assert_eq!(server.context().delivery_repo().count().await.unwrap(), 0);
    assert_eq!(server.context().scheduler().pending(), 0);
}

#[tokio::test]
async fn test_malformed_update_rejected() {
    let server = TestServer::start(Arc::new(FakePlatform::new())).await.unwrap();

    let response = server
        .post_update(&json!({ "type": "SOMETHING_ELSE" }))
        .await
        .unwrap();
    let error: Value = assert_json(response, StatusCode::BAD_REQUEST).await.unwrap();
    assert_eq!(error["error"]["code"], "INVALID_BODY");
}

#[tokio::test]
async fn test_open_link_with_unknown_token() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    let server = TestServer::start(platform).await.unwrap();

    let response = server
        .post_update(&open_link(U1, "not-a-real-token"))
        .await
        .unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(body["result"]["outcome"], "invalid_link");
}

#[tokio::test]
async fn test_platform_outage_returns_service_unavailable() {
    let platform = Arc::new(FakePlatform::new());
    platform.fail_membership(PlatformError::Timeout);
    let server = TestServer::start(platform).await.unwrap();
    let token = issue_token(&server, &[1]).await;

    let response = server
        .post_update(&open_link(U1, &token))
        .await
        .unwrap();
    let error: Value = assert_json(response, StatusCode::SERVICE_UNAVAILABLE)
        .await
        .unwrap();
    assert_eq!(error["error"]["code"], "PLATFORM_UNAVAILABLE");
}

// ============================================================================
// Stats Tests
// ============================================================================

#[tokio::test]
async fn test_stats_after_delivery() {
    let platform = Arc::new(FakePlatform::new());
    platform.join_all(U1);
    let config = test_config(&[("AUTO_DELETE_TIME", "600")]).unwrap();
    let server = TestServer::start_with_config(platform, config).await.unwrap();
    let token = issue_token(&server, &[1, 2]).await;
    server
        .post_update(&open_link(U1, &token))
        .await
        .unwrap();

    let response = server.get_admin("/api/v1/stats").await.unwrap();
    let body: Value = assert_json(response, StatusCode::OK).await.unwrap();
    let stats = &body["data"];

    assert_eq!(stats["users"], 1);
    assert_eq!(stats["tokens"], 1);
    assert_eq!(stats["pending_deletions"], 2);
    assert_eq!(stats["token_accesses"], 1);
    assert_eq!(stats["counters"]["file_delivered"], 2);

    let response = server
        .get_admin(&format!("/api/v1/tokens/{token}"))
        .await
        .unwrap();
    let fetched: Value = assert_json(response, StatusCode::OK).await.unwrap();
    assert_eq!(fetched["access_count"], 1);
    assert!(fetched["last_accessed_at"].is_string());
}
