// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process record store.
//!
//! Holds the whole tree as a single JSON value with the same semantics as the
//! hosted database: writing `null` or an empty object removes the node, and
//! empty parents are pruned. Failures can be injected per operation and path
//! prefix to exercise partial-failure handling.

use super::{paths, RecordChange, RecordStore, Subscription};
use crate::error::{AppError, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Map, Value};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Store operation, for failure injection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    Read,
    Write,
    Remove,
    Query,
}

#[derive(Debug, Clone)]
struct FailureRule {
    op: StoreOp,
    prefix: String,
    permission: bool,
    once: bool,
}

#[derive(Debug)]
struct Subscriber {
    path: String,
    tx: mpsc::UnboundedSender<RecordChange>,
    token: CancellationToken,
}

/// In-memory `RecordStore`.
#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    root: Mutex<Value>,
    subscribers: Mutex<Vec<Subscriber>>,
    failures: Mutex<Vec<FailureRule>>,
}

impl MemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every `op` on paths under `prefix` with a network error.
    pub fn fail_on(&self, op: StoreOp, prefix: &str) {
        self.add_rule(op, prefix, false, false);
    }

    /// Fail the next `op` on a path under `prefix`, then recover.
    pub fn fail_once(&self, op: StoreOp, prefix: &str) {
        self.add_rule(op, prefix, false, true);
    }

    /// Reject every `op` on paths under `prefix` as permission denied.
    pub fn deny(&self, op: StoreOp, prefix: &str) {
        self.add_rule(op, prefix, true, false);
    }

    pub fn clear_failures(&self) {
        self.failures.lock().clear();
    }

    /// Copy of the entire tree.
    pub fn snapshot(&self) -> Value {
        self.root.lock().clone()
    }

    fn add_rule(&self, op: StoreOp, prefix: &str, permission: bool, once: bool) {
        self.failures.lock().push(FailureRule {
            op,
            prefix: prefix.to_string(),
            permission,
            once,
        });
    }

    fn check_failure(&self, op: StoreOp, path: &str) -> Result<()> {
        let mut rules = self.failures.lock();
        let hit = rules.iter().position(|rule| {
            rule.op == op
                && paths::related(&rule.prefix, path)
                && paths::segments(&rule.prefix).len() <= paths::segments(path).len()
        });
        let Some(index) = hit else {
            return Ok(());
        };
        let rule = if rules[index].once {
            rules.remove(index)
        } else {
            rules[index].clone()
        };
        tracing::debug!(?op, path, "Injected record store failure");
        if rule.permission {
            Err(AppError::PermissionDenied(format!("{:?} {}", op, path)))
        } else {
            Err(AppError::Database(format!(
                "injected {:?} failure at {}",
                op, path
            )))
        }
    }

    fn notify(&self, path: &str, data: Option<Value>) {
        let mut subscribers = self.subscribers.lock();
        subscribers.retain(|sub| !sub.token.is_cancelled() && !sub.tx.is_closed());
        for sub in subscribers.iter() {
            if paths::related(&sub.path, path) {
                let _ = sub.tx.send(RecordChange {
                    path: path.to_string(),
                    data: data.clone(),
                });
            }
        }
    }
}

fn get_at<'a>(node: &'a Value, segs: &[&str]) -> Option<&'a Value> {
    segs.iter()
        .try_fold(node, |cur, seg| cur.as_object()?.get(*seg))
}

fn set_at(node: &mut Value, segs: &[&str], value: Value) {
    match segs.split_first() {
        None => *node = value,
        Some((head, rest)) => {
            if !node.is_object() {
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                let child = map.entry(head.to_string()).or_insert(Value::Null);
                set_at(child, rest, value);
            }
        }
    }
}

fn is_empty_node(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}

fn remove_at(node: &mut Value, segs: &[&str]) {
    let Some((head, rest)) = segs.split_first() else {
        *node = Value::Null;
        return;
    };
    let Value::Object(map) = node else {
        return;
    };
    if rest.is_empty() {
        map.remove(*head);
        return;
    }
    if let Some(child) = map.get_mut(*head) {
        remove_at(child, rest);
        if is_empty_node(child) {
            map.remove(*head);
        }
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn read(&self, path: &str) -> Result<Option<Value>> {
        self.check_failure(StoreOp::Read, path)?;
        let root = self.root.lock();
        Ok(get_at(&root, &paths::segments(path))
            .filter(|v| !is_empty_node(v))
            .cloned())
    }

    async fn write(&self, path: &str, value: &Value) -> Result<()> {
        self.check_failure(StoreOp::Write, path)?;
        let segs = paths::segments(path);
        {
            let mut root = self.root.lock();
            if is_empty_node(value) {
                remove_at(&mut root, &segs);
            } else {
                set_at(&mut root, &segs, value.clone());
            }
        }
        let data = (!is_empty_node(value)).then(|| value.clone());
        self.notify(path, data);
        Ok(())
    }

    async fn remove(&self, path: &str) -> Result<()> {
        self.check_failure(StoreOp::Remove, path)?;
        let existed = {
            let mut root = self.root.lock();
            let segs = paths::segments(path);
            let existed = get_at(&root, &segs).is_some();
            remove_at(&mut root, &segs);
            existed
        };
        if existed {
            self.notify(path, None);
        }
        Ok(())
    }

    async fn query_children_by_field(
        &self,
        path: &str,
        field: &str,
        value: &Value,
    ) -> Result<Vec<(String, Value)>> {
        self.check_failure(StoreOp::Query, path)?;
        let root = self.root.lock();
        let children = match get_at(&root, &paths::segments(path)) {
            Some(Value::Object(map)) => map
                .iter()
                .filter(|(_, child)| child.get(field) == Some(value))
                .map(|(key, child)| (key.clone(), child.clone()))
                .collect(),
            _ => Vec::new(),
        };
        Ok(children)
    }

    async fn subscribe(&self, path: &str) -> Result<Subscription> {
        self.check_failure(StoreOp::Read, path)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let token = CancellationToken::new();
        self.subscribers.lock().push(Subscriber {
            path: path.to_string(),
            tx,
            token: token.clone(),
        });
        Ok(Subscription::new(path, rx, token))
    }
}
