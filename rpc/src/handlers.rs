//! RPC request handlers.

use std::net::SocketAddr;

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use knock_types::{redact, GroupCode, KnockId, MemberId, NetworkAddress, PushToken};
use serde::{Deserialize, Serialize};

use crate::address::observe_address;
use crate::error::RpcError;
use crate::extract::JsonBody;
use crate::server::AppState;

// ── Groups ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CreateGroupRequest {
    pub member_id: MemberId,
    pub push_token: PushToken,
    pub name: String,
}

#[derive(Deserialize)]
pub struct JoinGroupRequest {
    pub member_id: MemberId,
    pub push_token: PushToken,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GroupResponse {
    pub group_code: GroupCode,
    pub name: String,
    pub members: usize,
}

// ── Knocks ───────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct InitiateKnockRequest {
    pub member_id: MemberId,
    pub group_code: GroupCode,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InitiateKnockResponse {
    pub knock_id: KnockId,
    pub notified: usize,
    pub delivered: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warning: Option<String>,
}

#[derive(Deserialize)]
pub struct ReportAddressRequest {
    pub member_id: MemberId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReportAddressResponse {
    #[serde(rename = "match")]
    pub matched: bool,
}

// ── Telemetry ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub open_knocks: usize,
}

fn client_address(
    state: &AppState,
    headers: &HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
) -> Result<NetworkAddress, RpcError> {
    observe_address(headers, peer.map(|ConnectInfo(addr)| addr), state.trust_forwarded_for)
        .ok_or_else(|| RpcError::InvalidRequest("client address could not be observed".into()))
}

fn parse_group(raw: &str) -> Result<GroupCode, RpcError> {
    Ok(GroupCode::parse(raw)?)
}

pub async fn create_group(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    JsonBody(req): JsonBody<CreateGroupRequest>,
) -> Result<(StatusCode, Json<GroupResponse>), RpcError> {
    let directory = state.directory()?;
    let address = client_address(&state, &headers, peer).ok();
    let group = directory
        .create_group(&req.name, req.member_id, req.push_token, address)
        .await?;
    Ok((
        StatusCode::CREATED,
        Json(GroupResponse {
            members: group.members.len(),
            group_code: group.code,
            name: group.name,
        }),
    ))
}

pub async fn join_group(
    State(state): State<AppState>,
    Path(code): Path<String>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    JsonBody(req): JsonBody<JoinGroupRequest>,
) -> Result<Json<GroupResponse>, RpcError> {
    let directory = state.directory()?;
    let code = parse_group(&code)?;
    let address = client_address(&state, &headers, peer).ok();
    tracing::info!(group = %code, member = %redact(req.member_id.as_str()), "join group");
    let group = directory
        .upsert_member(&code, req.member_id, req.push_token, address)
        .await?;
    Ok(Json(GroupResponse {
        members: group.members.len(),
        group_code: group.code,
        name: group.name,
    }))
}

pub async fn leave_group(
    State(state): State<AppState>,
    Path((code, member_id)): Path<(String, String)>,
) -> Result<StatusCode, RpcError> {
    let directory = state.directory()?;
    let code = parse_group(&code)?;
    let member = MemberId::new(member_id)?;
    if directory.remove_member(&code, &member).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(RpcError::Knock(knock_session::KnockError::NotMember(code)))
    }
}

pub async fn initiate_knock(
    State(state): State<AppState>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    JsonBody(req): JsonBody<InitiateKnockRequest>,
) -> Result<Json<InitiateKnockResponse>, RpcError> {
    let address = client_address(&state, &headers, peer)?;
    let outcome = state
        .registry
        .initiate(&req.member_id, &req.group_code, address)
        .await?;
    Ok(Json(InitiateKnockResponse {
        knock_id: outcome.knock_id,
        notified: outcome.notified,
        delivered: outcome.delivered,
        failed: outcome.failed.len(),
        warning: outcome.delivery_failure().map(|e| e.to_string()),
    }))
}

pub async fn report_address(
    State(state): State<AppState>,
    Path(knock_id): Path<String>,
    headers: HeaderMap,
    peer: Option<ConnectInfo<SocketAddr>>,
    JsonBody(req): JsonBody<ReportAddressRequest>,
) -> Result<Json<ReportAddressResponse>, RpcError> {
    let knock_id = KnockId::parse(&knock_id).map_err(|_| RpcError::UnknownKnock(knock_id))?;
    let address = client_address(&state, &headers, peer)?;
    let matched = state
        .registry
        .report(&req.member_id, knock_id, &address)
        .await?;
    Ok(Json(ReportAddressResponse { matched }))
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        open_knocks: state.registry.open_count(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, RpcError> {
    state
        .metrics
        .observe(&state.registry.stats(), state.registry.open_count());
    let body = state
        .metrics
        .encode()
        .map_err(|e| RpcError::Server(e.to_string()))?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
