use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use charm_common::{AgentDetail, HealthResponse, PublishRequest, PublishResponse, PublishStatus};

use crate::auth::Caller;
use crate::error::ApiError;
use crate::publish::publish_agent;
use crate::server::AppState;

/// `GET /`
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: state.service_name.to_string(),
    })
}

/// `GET /health`, for container and load-balancer probes.
pub async fn probe() -> StatusCode {
    StatusCode::OK
}

/// `POST /v1/agents`
pub async fn publish(
    State(state): State<AppState>,
    Caller(owner): Caller,
    payload: Result<Json<PublishRequest>, JsonRejection>,
) -> Result<Json<PublishResponse>, ApiError> {
    let Json(request) = payload?;
    let outcome = publish_agent(state.store.as_ref(), &owner, &request, &state.public_host).await?;
    Ok(Json(PublishResponse {
        status: PublishStatus::Published,
        agent_id: outcome.agent_id,
        slug: outcome.slug,
        version: outcome.version,
        url: outcome.url,
    }))
}

/// `GET /v1/agents/{slug}`
pub async fn get_agent(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<AgentDetail>, ApiError> {
    let Some(agent) = state.store.find_agent_by_slug(&slug).await? else {
        return Err(ApiError::NotFound(format!("agent '{slug}' not found")));
    };
    let versions = state.store.list_versions(&agent.id).await?;
    Ok(Json(AgentDetail { agent, versions }))
}
