//! Shared fixtures for registry integration tests.

#![allow(dead_code, clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response};
use charm_common::{AgentPatch, AgentRecord, NewAgent, NewVersion, TokenPolicy, VersionRecord};
use http_body_util::BodyExt;
use serde_json::Value;

use charm_registry::auth::TokenShapeVerifier;
use charm_registry::server::{AppState, build_app};
use charm_registry::store::{MemoryStore, RegistryStore, StoreError};

pub const OWNER: &str = "3f2504e0-4f89-11d3-9a0c-0305e82c3301";

/// How the [`ScriptedStore`] misbehaves.
#[derive(Debug, Default, Clone, Copy)]
pub struct Faults {
    /// Number of leading `find_agent_by_slug` calls that report "not found"
    /// even when the row exists, simulating a read that raced an insert.
    pub stale_finds: usize,
    /// `insert_agent` accepts the write but returns no row.
    pub insert_returns_nothing: bool,
    /// `find_agent_by_slug` fails with a backend error.
    pub find_fails: bool,
    /// `upsert_version` fails with a backend error.
    pub upsert_fails: bool,
}

/// Wraps a [`MemoryStore`], counting calls and injecting faults.
pub struct ScriptedStore {
    pub inner: Arc<MemoryStore>,
    faults: Faults,
    stale_left: AtomicUsize,
    pub calls: AtomicUsize,
    pub writes: AtomicUsize,
}

impl ScriptedStore {
    pub fn new(faults: Faults) -> Self {
        Self {
            inner: Arc::new(MemoryStore::new()),
            faults,
            stale_left: AtomicUsize::new(faults.stale_finds),
            calls: AtomicUsize::new(0),
            writes: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn hit(&self, write: bool) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if write {
            self.writes.fetch_add(1, Ordering::SeqCst);
        }
    }
}

#[async_trait]
impl RegistryStore for ScriptedStore {
    async fn find_agent_by_slug(&self, slug: &str) -> Result<Option<AgentRecord>, StoreError> {
        self.hit(false);
        if self.faults.find_fails {
            return Err(StoreError::Backend("500: connection reset".to_string()));
        }
        let stale = self
            .stale_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if stale {
            return Ok(None);
        }
        self.inner.find_agent_by_slug(slug).await
    }

    async fn insert_agent(&self, agent: &NewAgent) -> Result<Option<AgentRecord>, StoreError> {
        self.hit(true);
        if self.faults.insert_returns_nothing {
            return Ok(None);
        }
        self.inner.insert_agent(agent).await
    }

    async fn update_agent(&self, agent_id: &str, patch: &AgentPatch) -> Result<(), StoreError> {
        self.hit(true);
        self.inner.update_agent(agent_id, patch).await
    }

    async fn upsert_version(&self, version: &NewVersion) -> Result<(), StoreError> {
        self.hit(true);
        if self.faults.upsert_fails {
            return Err(StoreError::Backend("500: disk full".to_string()));
        }
        self.inner.upsert_version(version).await
    }

    async fn list_versions(&self, agent_id: &str) -> Result<Vec<VersionRecord>, StoreError> {
        self.hit(false);
        self.inner.list_versions(agent_id).await
    }

    async fn list_orphaned_agents(&self) -> Result<Vec<AgentRecord>, StoreError> {
        self.hit(false);
        self.inner.list_orphaned_agents().await
    }
}

pub fn app_with(store: Arc<dyn RegistryStore>, policy: TokenPolicy) -> Router {
    build_app(AppState {
        store,
        verifier: Arc::new(TokenShapeVerifier::new(policy)),
        public_host: "charm.ai".into(),
        service_name: "Charm Registry".into(),
    })
}

pub fn publish_request(auth: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::post("/v1/agents").header("content-type", "application/json");
    if let Some(auth) = auth {
        builder = builder.header("authorization", auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

pub async fn json_body(response: Response<Body>) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
