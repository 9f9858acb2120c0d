//! HTTP API integration tests.
//!
//! Tests for REST API endpoints (health check, room list / creation,
//! message history).

mod fixtures;
use fixtures::TestServer;

#[tokio::test]
async fn test_health_endpoint() {
    // テスト項目: /api/health エンドポイントが正常に動作する
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let response = client
        .get(format!("{}/api/health", server.base_url()))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_rooms_list_is_initially_empty() {
    // テスト項目: 起動直後の /api/rooms は空配列を返す
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let response = client
        .get(format!("{}/api/rooms", server.base_url()))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 200);

    let body: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body, serde_json::json!([]));
}

#[tokio::test]
async fn test_create_room_requires_credential() {
    // テスト項目: トークンなしのルーム作成は 401 で拒否される
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let response = client
        .post(format!("{}/api/rooms", server.base_url()))
        .json(&serde_json::json!({"name": "general"}))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 401);
}

#[tokio::test]
async fn test_create_room_and_list() {
    // テスト項目: 有効なトークンでルームを作成でき、一覧に現れる
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let token = server.token_for(1, "alice");

    // when (操作):
    let response = client
        .post(format!("{}/api/rooms", server.base_url()))
        .bearer_auth(&token)
        .json(&serde_json::json!({"name": "general"}))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 201);

    let created: serde_json::Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(created["name"], "general");
    let room_id = created["id"].as_i64().expect("room id");

    let rooms: serde_json::Value = client
        .get(format!("{}/api/rooms", server.base_url()))
        .send()
        .await
        .expect("Failed to send request")
        .json()
        .await
        .expect("Failed to parse JSON");
    assert_eq!(rooms, serde_json::json!([{"id": room_id, "name": "general"}]));
}

#[tokio::test]
async fn test_create_duplicate_room_conflicts() {
    // テスト項目: 同名ルームの 2 回目の作成は 409 を返す
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let token = server.token_for(1, "alice");
    client
        .post(format!("{}/api/rooms", server.base_url()))
        .bearer_auth(&token)
        .json(&serde_json::json!({"name": "general"}))
        .send()
        .await
        .expect("Failed to send request");

    // when (操作):
    let response = client
        .post(format!("{}/api/rooms", server.base_url()))
        .bearer_auth(&token)
        .json(&serde_json::json!({"name": "general"}))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 409);
}

#[tokio::test]
async fn test_create_room_rejects_blank_name() {
    // テスト項目: 空白のみのルーム名は 400 を返す
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();
    let token = server.token_for(1, "alice");

    // when (操作):
    let response = client
        .post(format!("{}/api/rooms", server.base_url()))
        .bearer_auth(&token)
        .json(&serde_json::json!({"name": "   "}))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_message_history_unknown_room_not_found() {
    // テスト項目: 存在しないルームの履歴取得は 404 を返す
    // given (前提条件):
    let server = TestServer::start().await;
    let client = reqwest::Client::new();

    // when (操作):
    let response = client
        .get(format!("{}/api/messages/999", server.base_url()))
        .send()
        .await
        .expect("Failed to send request");

    // then (期待する結果):
    assert_eq!(response.status(), 404);
}
