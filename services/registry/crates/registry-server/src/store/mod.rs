//! Storage port for agents and versions.
//!
//! The registry keeps no state of its own: every request is resolved
//! against a [`RegistryStore`]. The store is expected to enforce two
//! uniqueness constraints, `agents.slug` and `versions(agent_id, version)`,
//! and to offer atomic single-row writes. Nothing here assumes
//! cross-statement transactions.

mod memory;
mod supabase;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use charm_common::{
    AgentPatch, AgentRecord, NewAgent, NewVersion, RegistryServerConfig, StoreBackend,
    VersionRecord,
};
use thiserror::Error;

pub use memory::MemoryStore;
pub use supabase::SupabaseStore;

/// Failures reported by a store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    #[error("duplicate key: {0}")]
    Conflict(String),

    /// The store answered with an error status.
    #[error("{0}")]
    Backend(String),

    /// The request never produced a usable response.
    #[error("store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("unexpected store response: {0}")]
    Decode(String),
}

/// Row operations the registry needs from its backing store.
#[async_trait]
pub trait RegistryStore: Send + Sync {
    /// Look up an agent by its unique slug.
    async fn find_agent_by_slug(&self, slug: &str) -> Result<Option<AgentRecord>, StoreError>;

    /// Insert a new agent and return the stored row.
    ///
    /// `Ok(None)` means the store accepted the write but returned no row.
    /// A slug collision is reported as [`StoreError::Conflict`].
    async fn insert_agent(&self, agent: &NewAgent) -> Result<Option<AgentRecord>, StoreError>;

    /// Overwrite `name` and `description` of an existing agent.
    async fn update_agent(&self, agent_id: &str, patch: &AgentPatch) -> Result<(), StoreError>;

    /// Insert the version row, or overwrite the existing row for the same
    /// `(agent_id, version)` pair.
    async fn upsert_version(&self, version: &NewVersion) -> Result<(), StoreError>;

    /// All version rows of one agent.
    async fn list_versions(&self, agent_id: &str) -> Result<Vec<VersionRecord>, StoreError>;

    /// Agents with no version rows at all.
    async fn list_orphaned_agents(&self) -> Result<Vec<AgentRecord>, StoreError>;
}

/// Build the store selected by `config`.
pub fn from_config(config: &RegistryServerConfig) -> anyhow::Result<Arc<dyn RegistryStore>> {
    match config.store {
        StoreBackend::Supabase => {
            let creds = config.supabase_credentials()?;
            let store = SupabaseStore::new(&creds, Duration::from_secs(config.store_timeout_secs))?;
            Ok(Arc::new(store))
        }
        StoreBackend::Memory => {
            tracing::warn!("using in-memory store; all agents are lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}
