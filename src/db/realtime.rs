// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Hosted realtime database over its REST interface.
//!
//! Handles:
//! - Point reads, writes and removes (`{path}.json`)
//! - Child queries by field (`orderBy` / `equalTo`)
//! - Live subscriptions via the `text/event-stream` endpoint

use super::{paths, RecordChange, RecordStore, Subscription};
use crate::error::{AppError, Result};
use crate::services::identity::SessionToken;
use async_trait::async_trait;
use futures_util::StreamExt;
use serde::Deserialize;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// REST client for the hosted realtime database.
#[derive(Clone)]
pub struct RealtimeDbStore {
    http: reqwest::Client,
    base_url: String,
    session: SessionToken,
}

impl RealtimeDbStore {
    /// Create a client for the database at `base_url`.
    ///
    /// Requests carry the id token currently held by `session`, if any.
    pub fn new(base_url: &str, session: SessionToken) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
        }
    }

    fn url(&self, path: &str) -> String {
        let path = paths::segments(path).join("/");
        format!("{}/{}.json", self.base_url, path)
    }

    fn auth_params(&self) -> Vec<(&'static str, String)> {
        self.session
            .get()
            .map(|token| vec![("auth", token)])
            .unwrap_or_default()
    }

    /// Check response status and return error if not successful.
    async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(AppError::PermissionDenied(format!("HTTP {}: {}", status, body)));
        }
        Err(AppError::Database(format!("HTTP {}: {}", status, body)))
    }

    async fn read_json(response: reqwest::Response) -> Result<Value> {
        Self::check_response(response)
            .await?
            .json()
            .await
            .map_err(|e| AppError::Database(format!("JSON parse error: {}", e)))
    }
}

#[async_trait]
impl RecordStore for RealtimeDbStore {
    async fn read(&self, path: &str) -> Result<Option<Value>> {
        let response = self
            .http
            .get(self.url(path))
            .query(&self.auth_params())
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        let value = Self::read_json(response).await?;
        Ok((!value.is_null()).then_some(value))
    }

    async fn write(&self, path: &str, value: &Value) -> Result<()> {
        let response = self
            .http
            .put(self.url(path))
            .query(&self.auth_params())
            .json(value)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::check_response(response).await?;
        Ok(())
    }

    async fn update(&self, path: &str, fields: &Map<String, Value>) -> Result<()> {
        let response = self
            .http
            .patch(self.url(path))
            .query(&self.auth_params())
            .json(fields)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        Self::check_response(response).await?;
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        let response = self
            .http
            .delete(self.url(path))
            .query(&self.auth_params())
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        // Removing an absent node returns 200 with a null body.
        Self::check_response(response).await?;
        Ok(())
    }

    async fn query_children_by_field(
        &self,
        path: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>> {
        let mut params = self.auth_params();
        params.push(("orderBy", format!("\"{}\"", field)));
        params.push(("equalTo", value.to_string()));

        let response = self
            .http
            .get(self.url(path))
            .query(&params)
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        match Self::read_json(response).await? {
            Value::Object(map) => Ok(map.into_iter().collect()),
            Value::Null => Ok(Vec::new()),
            other => Err(AppError::Database(format!(
                "Unexpected query response at {}: {}",
                path, other
            ))),
        }
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription> {
        let response = self
            .http
            .get(self.url(path))
            .query(&self.auth_params())
            .header(reqwest::header::ACCEPT, "text/event-stream")
            .send()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        let response = Self::check_response(response).await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        let task_token = token.clone();
        let base = paths::segments(path).join("/");

        tokio::spawn(async move {
            let mut stream = response.bytes_stream();
            let mut parser = SseParser::default();
            loop {
                let chunk = tokio::select! {
                    _ = task_token.cancelled() => break,
                    chunk = stream.next() => chunk,
                };
                let bytes = match chunk {
                    Some(Ok(bytes)) => bytes,
                    Some(Err(e)) => {
                        tracing::warn!(path = %base, error = %e, "Record stream failed");
                        break;
                    }
                    None => break,
                };
                for event in parser.push(&bytes) {
                    match event.into_changes(&base) {
                        StreamStep::Changes(changes) => {
                            for change in changes {
                                if tx.send(change).is_err() {
                                    return;
                                }
                            }
                        }
                        StreamStep::Ignore => {}
                        StreamStep::Close(reason) => {
                            tracing::info!(path = %base, reason, "Record stream closed by server");
                            return;
                        }
                    }
                }
            }
            tracing::debug!(path = %base, "Record stream ended");
        });

        Ok(Subscription::new(path, rx, token))
    }
}

/// A single server-sent event.
#[derive(Debug, Clone, PartialEq)]
pub struct SseEvent {
    pub event: String,
    pub data: String,
}

enum StreamStep {
    Changes(Vec<RecordChange>),
    Ignore,
    Close(&'static str),
}

#[derive(Deserialize)]
struct StreamPayload {
    path: String,
    data: Value,
}

impl SseEvent {
    fn into_changes(self, base: &str) -> StreamStep {
        match self.event.as_str() {
            "put" | "patch" => {
                let Ok(payload) = serde_json::from_str::<StreamPayload>(&self.data) else {
                    tracing::warn!(data = %self.data, "Malformed record stream payload");
                    return StreamStep::Ignore;
                };
                let at = paths::join(base, &payload.path);
                let changes = match (self.event.as_str(), payload.data) {
                    // A patch updates each named child independently.
                    ("patch", Value::Object(children)) => children
                        .into_iter()
                        .map(|(key, value)| RecordChange {
                            path: paths::join(&at, &key),
                            data: (!value.is_null()).then_some(value),
                        })
                        .collect(),
                    (_, value) => vec![RecordChange {
                        path: at,
                        data: (!value.is_null()).then_some(value),
                    }],
                };
                StreamStep::Changes(changes)
            }
            "cancel" => StreamStep::Close("cancel"),
            "auth_revoked" => StreamStep::Close("auth_revoked"),
            _ => StreamStep::Ignore,
        }
    }
}

/// Incremental `text/event-stream` parser over raw byte chunks.
#[derive(Debug, Default)]
pub struct SseParser {
    buf: Vec<u8>,
    event: String,
    data: Vec<String>,
}

impl SseParser {
    /// Feed a chunk; returns every event completed by it.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<SseEvent> {
        self.buf.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.event.is_empty() || !self.data.is_empty() {
                    events.push(SseEvent {
                        event: std::mem::take(&mut self.event),
                        data: std::mem::take(&mut self.data).join("\n"),
                    });
                }
            } else if let Some(value) = line.strip_prefix("event:") {
                self.event = value.trim().to_string();
            } else if let Some(value) = line.strip_prefix("data:") {
                self.data.push(value.trim_start().to_string());
            }
        }

        events
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_sse_parser_handles_split_chunks() {
        let mut parser = SseParser::default();
        assert!(parser.push(b"event: put\nda").is_empty());
        let events = parser.push(b"ta: {\"path\":\"/\",\"data\":null}\n\n");
        assert_eq!(
            events,
            vec![SseEvent {
                event: "put".to_string(),
                data: "{\"path\":\"/\",\"data\":null}".to_string(),
            }]
        );
    }

    #[test]
    fn test_keep_alive_is_ignored() {
        let mut parser = SseParser::default();
        let events = parser.push(b"event: keep-alive\ndata: null\n\n");
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0].clone().into_changes("posts"),
            StreamStep::Ignore
        ));
    }

    #[test]
    fn test_put_event_maps_to_absolute_path() {
        let event = SseEvent {
            event: "put".to_string(),
            data: json!({"path": "/c1", "data": {"text": "yum"}}).to_string(),
        };
        let StreamStep::Changes(changes) = event.into_changes("postComments/p1") else {
            panic!("expected changes");
        };
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].path, "postComments/p1/c1");
        assert_eq!(changes[0].data, Some(json!({"text": "yum"})));
    }

    #[test]
    fn test_patch_event_splits_children() {
        let event = SseEvent {
            event: "patch".to_string(),
            data: json!({"path": "/", "data": {"a": 1, "b": null}}).to_string(),
        };
        let StreamStep::Changes(changes) = event.into_changes("users/u1") else {
            panic!("expected changes");
        };
        assert_eq!(changes.len(), 2);
        assert_eq!(changes[0].path, "users/u1/a");
        assert_eq!(changes[1].data, None);
    }

    #[test]
    fn test_cancel_closes_stream() {
        let event = SseEvent {
            event: "cancel".to_string(),
            data: "null".to_string(),
        };
        assert!(matches!(event.into_changes("x"), StreamStep::Close(_)));
    }
}
