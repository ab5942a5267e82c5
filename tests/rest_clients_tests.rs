// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! REST clients for the hosted identity, record and blob services, run
//! against local mock servers.

use munchfeed::db::{RealtimeDbStore, RecordStore};
use munchfeed::error::{AppError, AuthError};
use munchfeed::services::{BlobStore, FirebaseAuth, FirebaseStorage, IdentityProvider, SessionToken};
use pretty_assertions::assert_eq;
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn signed_in_session() -> SessionToken {
    let session = SessionToken::new();
    session.set(Some("id-token".to_string()));
    session
}

// ─── Identity ────────────────────────────────────────────────────

#[tokio::test]
async fn test_sign_in_sets_session_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .and(query_param("key", "api-key"))
        .and(body_partial_json(json!({
            "email": "ada@example.com",
            "returnSecureToken": true,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "localId": "uid-1",
            "email": "ada@example.com",
            "displayName": "ada",
            "idToken": "fresh-token",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let session = SessionToken::new();
    let auth = FirebaseAuth::new(&format!("{}/v1", server.uri()), "api-key", session.clone());
    let identity = auth.sign_in(" ada@example.com ", "Pass123!").await.unwrap();

    assert_eq!(identity.id, "uid-1");
    assert_eq!(identity.display_name.as_deref(), Some("ada"));
    assert_eq!(session.get().as_deref(), Some("fresh-token"));
    assert_eq!(auth.current_identity(), Some(identity));

    auth.sign_out();
    assert!(session.get().is_none());
}

#[tokio::test]
async fn test_provider_error_codes_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signInWithPassword"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "INVALID_LOGIN_CREDENTIALS"}
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/accounts:signUp"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": {"code": 400, "message": "EMAIL_EXISTS"}
        })))
        .mount(&server)
        .await;

    let auth = FirebaseAuth::new(&format!("{}/v1", server.uri()), "api-key", SessionToken::new());
    assert!(matches!(
        auth.sign_in("ada@example.com", "nope").await,
        Err(AppError::Auth(AuthError::WrongCredentials))
    ));
    assert!(matches!(
        auth.sign_up("ada@example.com", "Pass123!").await,
        Err(AppError::Auth(AuthError::EmailInUse))
    ));
    assert!(auth.current_identity().is_none());
}

#[tokio::test]
async fn test_update_display_name_requires_session() {
    let server = MockServer::start().await;
    let auth = FirebaseAuth::new(&format!("{}/v1", server.uri()), "api-key", SessionToken::new());
    assert!(matches!(
        auth.update_display_name("ada").await,
        Err(AppError::Auth(AuthError::NotSignedIn))
    ));
}

// ─── Realtime database ───────────────────────────────────────────

#[tokio::test]
async fn test_read_and_absent_read() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users/u1.json"))
        .and(query_param("auth", "id-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"username": "ada"})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/users/u2.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
        .mount(&server)
        .await;

    let db = RealtimeDbStore::new(&server.uri(), signed_in_session());
    assert_eq!(
        db.read("users/u1").await.unwrap(),
        Some(json!({"username": "ada"}))
    );
    assert_eq!(db.read("/users/u2/").await.unwrap(), None);
}

#[tokio::test]
async fn test_write_update_and_remove() {
    let server = MockServer::start().await;
    Mock::given(method("PUT"))
        .and(path("/posts/p1.json"))
        .and(body_partial_json(json!({"userId": "u1"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"userId": "u1"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PATCH"))
        .and(path("/users/u1.json"))
        .and(body_partial_json(json!({"location": "Oakland"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"location": "Oakland"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/posts/p1.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
        .expect(2)
        .mount(&server)
        .await;

    let db = RealtimeDbStore::new(&server.uri(), signed_in_session());
    db.write("posts/p1", &json!({"userId": "u1"})).await.unwrap();

    let mut fields = serde_json::Map::new();
    fields.insert("location".to_string(), json!("Oakland"));
    db.update("users/u1", &fields).await.unwrap();

    // Removing twice is fine.
    db.remove("posts/p1").await.unwrap();
    db.remove("posts/p1").await.unwrap();
}

#[tokio::test]
async fn test_query_children_by_field() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/posts.json"))
        .and(query_param("orderBy", "\"userId\""))
        .and(query_param("equalTo", "\"u1\""))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "p1": {"userId": "u1"},
            "p2": {"userId": "u1"},
        })))
        .mount(&server)
        .await;

    let db = RealtimeDbStore::new(&server.uri(), signed_in_session());
    let mut children = db
        .query_children_by_field("posts", "userId", &json!("u1"))
        .await
        .unwrap();
    children.sort_by(|a, b| a.0.cmp(&b.0));
    let keys: Vec<_> = children.iter().map(|(k, _)| k.as_str()).collect();
    assert_eq!(keys, vec!["p1", "p2"]);
}

#[tokio::test]
async fn test_rejected_request_is_permission_denied() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/users.json"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "Permission denied"})))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path("/users/u1.json"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let db = RealtimeDbStore::new(&server.uri(), SessionToken::new());
    assert!(matches!(
        db.read("users").await,
        Err(AppError::PermissionDenied(_))
    ));
    assert!(matches!(
        db.write("users/u1", &json!({"username": "ada"})).await,
        Err(AppError::Database(_))
    ));
}

#[tokio::test]
async fn test_subscribe_streams_changes() {
    let server = MockServer::start().await;
    let body = concat!(
        "event: put\n",
        "data: {\"path\":\"/\",\"data\":{\"c1\":{\"text\":\"yum\"}}}\n\n",
        "event: keep-alive\n",
        "data: null\n\n",
        "event: put\n",
        "data: {\"path\":\"/c1\",\"data\":null}\n\n",
    );
    Mock::given(method("GET"))
        .and(path("/postComments/p1.json"))
        .and(header("accept", "text/event-stream"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"))
        .mount(&server)
        .await;

    let db = RealtimeDbStore::new(&server.uri(), signed_in_session());
    let mut subscription = db.subscribe("postComments/p1").await.unwrap();

    let first = subscription.next().await.unwrap();
    assert_eq!(first.path, "postComments/p1");
    assert_eq!(first.data, Some(json!({"c1": {"text": "yum"}})));

    let second = subscription.next().await.unwrap();
    assert_eq!(second.path, "postComments/p1/c1");
    assert_eq!(second.data, None);

    assert!(subscription.next().await.is_none());
}

// ─── Blob storage ────────────────────────────────────────────────

#[tokio::test]
async fn test_upload_and_resolve_url() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v0/b/bucket/o"))
        .and(query_param("uploadType", "media"))
        .and(query_param("name", "posts/u1/p1.jpg"))
        .and(header("authorization", "Firebase id-token"))
        .and(header("content-type", "image/jpeg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"name": "posts/u1/p1.jpg"})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v0/b/bucket/o/posts%2Fu1%2Fp1.jpg"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "posts/u1/p1.jpg",
            "downloadTokens": "tok-a,tok-b",
        })))
        .mount(&server)
        .await;

    let base = format!("{}/v0", server.uri());
    let storage = FirebaseStorage::new(&base, "bucket", signed_in_session());
    storage
        .upload("posts/u1/p1.jpg", vec![0xFF, 0xD8], "image/jpeg")
        .await
        .unwrap();

    let url = storage.resolve_url("posts/u1/p1.jpg").await.unwrap();
    assert_eq!(
        url,
        format!("{}/b/bucket/o/posts%2Fu1%2Fp1.jpg?alt=media&token=tok-a", base)
    );
}

#[tokio::test]
async fn test_delete_absent_blob_succeeds() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/v0/b/bucket/o/posts%2Fu1%2Fgone.jpg"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/v0/b/bucket/o/posts%2Fu1%2Fstuck.jpg"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let storage = FirebaseStorage::new(&format!("{}/v0", server.uri()), "bucket", signed_in_session());
    storage.delete("posts/u1/gone.jpg").await.unwrap();
    assert!(matches!(
        storage.delete("posts/u1/stuck.jpg").await,
        Err(AppError::Storage(_))
    ));
}
