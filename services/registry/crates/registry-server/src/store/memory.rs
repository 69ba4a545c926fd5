//! Process-local store with the same uniqueness rules as the Supabase schema.

use async_trait::async_trait;
use charm_common::{AgentPatch, AgentRecord, NewAgent, NewVersion, VersionRecord};
use chrono::Utc;
use tokio::sync::Mutex;

use super::{RegistryStore, StoreError};

#[derive(Default)]
struct Tables {
    agents: Vec<AgentRecord>,
    versions: Vec<VersionRecord>,
}

/// In-memory [`RegistryStore`] for local development and tests.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of agent rows.
    pub async fn agent_count(&self) -> usize {
        self.tables.lock().await.agents.len()
    }

    /// Number of version rows across all agents.
    pub async fn version_count(&self) -> usize {
        self.tables.lock().await.versions.len()
    }

    /// Insert an agent row as-is, bypassing the publish flow.
    pub async fn seed_agent(&self, agent: AgentRecord) {
        self.tables.lock().await.agents.push(agent);
    }
}

#[async_trait]
impl RegistryStore for MemoryStore {
    async fn find_agent_by_slug(&self, slug: &str) -> Result<Option<AgentRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables.agents.iter().find(|a| a.slug == slug).cloned())
    }

    async fn insert_agent(&self, agent: &NewAgent) -> Result<Option<AgentRecord>, StoreError> {
        let mut tables = self.tables.lock().await;
        if tables.agents.iter().any(|a| a.slug == agent.slug) {
            return Err(StoreError::Conflict(format!(
                "agents_slug_key: slug '{}' already exists",
                agent.slug
            )));
        }
        let record = AgentRecord {
            id: uuid::Uuid::new_v4().to_string(),
            owner_id: agent.owner_id.clone(),
            slug: agent.slug.clone(),
            name: agent.name.clone(),
            description: agent.description.clone(),
            is_public: agent.is_public,
            created_at: Some(Utc::now()),
        };
        tables.agents.push(record.clone());
        Ok(Some(record))
    }

    async fn update_agent(&self, agent_id: &str, patch: &AgentPatch) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        // PATCH with an unmatched filter is a no-op in PostgREST too.
        if let Some(agent) = tables.agents.iter_mut().find(|a| a.id == agent_id) {
            agent.name.clone_from(&patch.name);
            agent.description.clone_from(&patch.description);
        }
        Ok(())
    }

    async fn upsert_version(&self, version: &NewVersion) -> Result<(), StoreError> {
        let mut tables = self.tables.lock().await;
        let existing = tables
            .versions
            .iter_mut()
            .find(|v| v.agent_id == version.agent_id && v.version == version.version);
        match existing {
            Some(row) => {
                row.uac.clone_from(&version.uac);
                row.repo_url.clone_from(&version.repo_url);
                row.commit_hash.clone_from(&version.commit_hash);
                row.branch.clone_from(&version.branch);
            }
            None => tables.versions.push(VersionRecord {
                agent_id: version.agent_id.clone(),
                version: version.version.clone(),
                uac: version.uac.clone(),
                repo_url: version.repo_url.clone(),
                commit_hash: version.commit_hash.clone(),
                branch: version.branch.clone(),
                created_at: Some(Utc::now()),
            }),
        }
        Ok(())
    }

    async fn list_versions(&self, agent_id: &str) -> Result<Vec<VersionRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .versions
            .iter()
            .filter(|v| v.agent_id == agent_id)
            .cloned()
            .collect())
    }

    async fn list_orphaned_agents(&self) -> Result<Vec<AgentRecord>, StoreError> {
        let tables = self.tables.lock().await;
        Ok(tables
            .agents
            .iter()
            .filter(|a| !tables.versions.iter().any(|v| v.agent_id == a.id))
            .cloned()
            .collect())
    }
}
