//! Supabase (PostgREST) adapter.
//!
//! Tables live under `<project>/rest/v1/<table>`. Every request carries the
//! service-role key both as `apikey` and as a bearer token.

use std::time::Duration;

use async_trait::async_trait;
use charm_common::{
    AgentPatch, AgentRecord, NewAgent, NewVersion, SupabaseCredentials, VersionRecord,
};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use super::{RegistryStore, StoreError};

const AGENTS: &str = "agents";
const VERSIONS: &str = "versions";

/// Postgres error code for `unique_violation`.
const UNIQUE_VIOLATION: &str = "23505";

/// Error body returned by PostgREST.
#[derive(Debug, Default, Deserialize)]
struct PostgrestError {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

/// Agent row with an embedded `versions(count)` aggregate.
#[derive(Debug, Deserialize)]
struct AgentWithVersionCount {
    #[serde(flatten)]
    agent: AgentRecord,
    #[serde(default)]
    versions: Vec<CountRow>,
}

#[derive(Debug, Deserialize)]
struct CountRow {
    count: u64,
}

/// [`RegistryStore`] backed by a Supabase project.
#[derive(Clone)]
pub struct SupabaseStore {
    client: reqwest::Client,
    rest_url: String,
}

impl std::fmt::Debug for SupabaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseStore")
            .field("rest_url", &self.rest_url)
            .finish_non_exhaustive()
    }
}

impl SupabaseStore {
    /// Build a client for the project in `creds`. No request is sent yet.
    pub fn new(creds: &SupabaseCredentials, timeout: Duration) -> Result<Self, StoreError> {
        let mut apikey = HeaderValue::from_str(&creds.service_key)
            .map_err(|e| StoreError::Backend(format!("invalid service key: {e}")))?;
        apikey.set_sensitive(true);
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", creds.service_key))
            .map_err(|e| StoreError::Backend(format!("invalid service key: {e}")))?;
        bearer.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert("apikey", apikey);
        headers.insert(AUTHORIZATION, bearer);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", creds.url.trim_end_matches('/')),
        })
    }

    fn table(&self, name: &str) -> String {
        format!("{}/{name}", self.rest_url)
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, StoreError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(classify_error(status, &body))
    }

    async fn rows<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Vec<T>, StoreError> {
        let response = self.send(request).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Map a non-2xx PostgREST response onto [`StoreError`].
fn classify_error(status: StatusCode, body: &str) -> StoreError {
    let parsed: PostgrestError = serde_json::from_str(body).unwrap_or_default();
    let message = match (parsed.message, parsed.details) {
        (Some(m), Some(d)) => format!("{m} ({d})"),
        (Some(m), None) => m,
        (None, _) if body.trim().is_empty() => status.to_string(),
        (None, _) => body.trim().to_string(),
    };
    if status == StatusCode::CONFLICT || parsed.code.as_deref() == Some(UNIQUE_VIOLATION) {
        StoreError::Conflict(message)
    } else {
        StoreError::Backend(format!("{}: {message}", status.as_u16()))
    }
}

#[async_trait]
impl RegistryStore for SupabaseStore {
    async fn find_agent_by_slug(&self, slug: &str) -> Result<Option<AgentRecord>, StoreError> {
        let request = self.client.get(self.table(AGENTS)).query(&[
            ("select", "*".to_string()),
            ("slug", format!("eq.{slug}")),
            ("limit", "1".to_string()),
        ]);
        let rows: Vec<AgentRecord> = self.rows(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn insert_agent(&self, agent: &NewAgent) -> Result<Option<AgentRecord>, StoreError> {
        let request = self
            .client
            .post(self.table(AGENTS))
            .header("Prefer", "return=representation")
            .json(agent);
        let rows: Vec<AgentRecord> = self.rows(request).await?;
        Ok(rows.into_iter().next())
    }

    async fn update_agent(&self, agent_id: &str, patch: &AgentPatch) -> Result<(), StoreError> {
        let request = self
            .client
            .patch(self.table(AGENTS))
            .query(&[("id", format!("eq.{agent_id}"))])
            .header("Prefer", "return=minimal")
            .json(patch);
        self.send(request).await?;
        Ok(())
    }

    async fn upsert_version(&self, version: &NewVersion) -> Result<(), StoreError> {
        let request = self
            .client
            .post(self.table(VERSIONS))
            .query(&[("on_conflict", "agent_id,version")])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(version);
        self.send(request).await?;
        Ok(())
    }

    async fn list_versions(&self, agent_id: &str) -> Result<Vec<VersionRecord>, StoreError> {
        let request = self.client.get(self.table(VERSIONS)).query(&[
            ("select", "*".to_string()),
            ("agent_id", format!("eq.{agent_id}")),
        ]);
        self.rows(request).await
    }

    async fn list_orphaned_agents(&self) -> Result<Vec<AgentRecord>, StoreError> {
        let request = self
            .client
            .get(self.table(AGENTS))
            .query(&[("select", "*,versions(count)")]);
        let rows: Vec<AgentWithVersionCount> = self.rows(request).await?;
        Ok(rows
            .into_iter()
            .filter(|row| row.versions.iter().all(|c| c.count == 0))
            .map(|row| row.agent)
            .collect())
    }
}
