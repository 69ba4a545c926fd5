//! Publish reconciliation: upsert an agent by slug, then upsert its version.
//!
//! The two writes are separate store calls. A failure between them leaves an
//! agent without versions; `charm-admin orphans` reports those, and a
//! republish from the owner fills the gap because the slug is stable.

use charm_common::{
    AgentDraft, AgentPatch, AgentRecord, CallerIdentity, NewAgent, NewVersion, PublishRequest,
    derive_slug, public_url,
};
use thiserror::Error;

use crate::store::{RegistryStore, StoreError};

/// Failures of the publish flow after the request has been accepted.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Failed to create agent record")]
    AgentNotCreated,

    #[error("agent '{0}' conflicted on insert but could not be found afterwards")]
    ConflictUnresolved(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Result of a successful publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishOutcome {
    pub agent_id: String,
    pub slug: String,
    pub version: String,
    pub url: String,
    /// Whether this call inserted the agent row.
    pub created: bool,
}

/// Publish `request` on behalf of `owner`.
///
/// Any store failure aborts immediately; writes already made are kept.
pub async fn publish_agent(
    store: &dyn RegistryStore,
    owner: &CallerIdentity,
    request: &PublishRequest,
    public_host: &str,
) -> Result<PublishOutcome, PublishError> {
    let draft = AgentDraft::from_uac(&request.uac);
    let slug = derive_slug(&draft.name, owner.as_str());

    let (agent_id, created) = match store.find_agent_by_slug(&slug).await? {
        Some(existing) => (update_existing(store, &existing, owner, &draft).await?, false),
        None => create_or_adopt(store, &slug, owner, &draft).await?,
    };

    let version = NewVersion {
        agent_id: agent_id.clone(),
        version: draft.version.clone(),
        uac: request.uac.clone(),
        repo_url: request.repo.url.clone(),
        commit_hash: request.repo.commit.clone(),
        branch: request.repo.branch.clone(),
    };
    store.upsert_version(&version).await?;

    tracing::info!(
        slug = %slug,
        agent_id = %agent_id,
        version = %draft.version,
        created,
        "agent published",
    );

    Ok(PublishOutcome {
        url: public_url(public_host, &slug),
        agent_id,
        slug,
        version: draft.version,
        created,
    })
}

async fn update_existing(
    store: &dyn RegistryStore,
    existing: &AgentRecord,
    owner: &CallerIdentity,
    draft: &AgentDraft,
) -> Result<String, PublishError> {
    if existing.owner_id != owner.as_str() {
        tracing::warn!(
            slug = %existing.slug,
            "republish from a caller other than the recorded owner",
        );
    }
    let patch = AgentPatch {
        name: draft.name.clone(),
        description: draft.description.clone(),
    };
    store.update_agent(&existing.id, &patch).await?;
    Ok(existing.id.clone())
}

/// Insert the agent; if a concurrent publish won the slug, take its row.
async fn create_or_adopt(
    store: &dyn RegistryStore,
    slug: &str,
    owner: &CallerIdentity,
    draft: &AgentDraft,
) -> Result<(String, bool), PublishError> {
    let new_agent = NewAgent {
        owner_id: owner.as_str().to_string(),
        slug: slug.to_string(),
        name: draft.name.clone(),
        description: draft.description.clone(),
        is_public: true,
    };
    match store.insert_agent(&new_agent).await {
        Ok(Some(row)) => Ok((row.id, true)),
        Ok(None) => Err(PublishError::AgentNotCreated),
        Err(StoreError::Conflict(reason)) => {
            tracing::warn!(slug, %reason, "slug taken by a concurrent publish, updating instead");
            let existing = store
                .find_agent_by_slug(slug)
                .await?
                .ok_or_else(|| PublishError::ConflictUnresolved(slug.to_string()))?;
            let id = update_existing(store, &existing, owner, draft).await?;
            Ok((id, false))
        }
        Err(e) => Err(e.into()),
    }
}
