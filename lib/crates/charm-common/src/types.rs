use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Submitted agent configuration document.
///
/// Schema-less: the registry reads `persona.name`, `persona.description`
/// and `version` out of it and stores the rest untouched.
pub type Uac = serde_json::Map<String, serde_json::Value>;

/// A row in the `agents` table.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentRecord {
    pub id: String,
    pub owner_id: String,
    pub slug: String,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    pub is_public: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// A nullable text column read as an empty string.
fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Insert payload for a new agent. `id` is assigned by the store.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NewAgent {
    pub owner_id: String,
    pub slug: String,
    pub name: String,
    pub description: String,
    pub is_public: bool,
}

/// Fields rewritten when an existing agent is republished.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AgentPatch {
    pub name: String,
    pub description: String,
}

/// A row in the `versions` table, keyed by `(agent_id, version)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct VersionRecord {
    pub agent_id: String,
    pub version: String,
    pub uac: Uac,
    pub repo_url: String,
    pub commit_hash: String,
    pub branch: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

/// Upsert payload for a version row.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewVersion {
    pub agent_id: String,
    pub version: String,
    pub uac: Uac,
    pub repo_url: String,
    pub commit_hash: String,
    pub branch: String,
}

/// Source provenance of a published version.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RepoInfo {
    pub url: String,
    pub branch: String,
    pub commit: String,
}

/// Body of `POST /v1/agents`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublishRequest {
    pub uac: Uac,
    pub repo: RepoInfo,
}

/// Status reported by a successful publish.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PublishStatus {
    Published,
}

/// Success body of `POST /v1/agents`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublishResponse {
    pub status: PublishStatus,
    pub agent_id: String,
    pub slug: String,
    pub version: String,
    pub url: String,
}

/// Body of `GET /`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
}

/// Body of `GET /v1/agents/{slug}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentDetail {
    pub agent: AgentRecord,
    pub versions: Vec<VersionRecord>,
}

/// Error body shared by every non-2xx response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorBody {
    pub detail: String,
}
