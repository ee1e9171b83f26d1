use std::collections::BTreeMap;

use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use serde_json::json;

use seqstore_core::{
    is_loose_dna, AddressMap, RangeMap, RealDigest, RequesterMap, SequenceError, SequenceStore,
};

use crate::error::ServerResult;

/// Shared handler state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub store: SequenceStore,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".into(),
            version: env!("CARGO_PKG_VERSION").into(),
        }
    }
}

/// Body of a single-sequence write. A missing field reads as empty.
#[derive(Debug, Deserialize)]
pub struct SequenceBody {
    #[serde(default)]
    pub sequence: String,
}

#[derive(Debug, Deserialize)]
pub struct ChunkBody {
    #[serde(default)]
    pub sequence: String,
    #[serde(default)]
    pub ranges: RangeMap,
}

/// Reject empty or non-nucleotide input before it reaches the store.
fn checked_sequence(sequence: String) -> ServerResult<Bytes> {
    if sequence.is_empty() {
        return Err(SequenceError::EmptyContent.into());
    }
    if !is_loose_dna(sequence.as_bytes()) {
        return Err(SequenceError::InvalidSequence("sequence contains non-nucleotide characters".into()).into());
    }
    Ok(Bytes::from(sequence))
}

fn as_text(content: &Bytes) -> String {
    String::from_utf8_lossy(content).into_owned()
}

pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::default())
}

pub async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(json!({
        "name": "seqstore-server",
        "version": env!("CARGO_PKG_VERSION"),
        "digest": state.store.hasher().algorithm(),
        "write_batch_size": state.store.write_batch_size(),
    }))
}

/// `GET /v1/sequence/:address`
pub async fn get_sequence(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> ServerResult<Response> {
    let response = match state.store.get(Some(&address)).await? {
        Some(content) if !content.is_empty() => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; charset=utf-8")],
            content,
        )
            .into_response(),
        _ => StatusCode::NO_CONTENT.into_response(),
    };
    Ok(response)
}

/// `POST /v1/sequence`
pub async fn write_sequence(
    State(state): State<AppState>,
    Json(body): Json<SequenceBody>,
) -> ServerResult<Json<RealDigest>> {
    let content = checked_sequence(body.sequence)?;
    Ok(Json(state.store.write(content).await?))
}

/// `POST /v1/sequence/:digest`
pub async fn write_verified_sequence(
    State(state): State<AppState>,
    Path(digest): Path<String>,
    Json(body): Json<SequenceBody>,
) -> ServerResult<Json<RealDigest>> {
    let content = checked_sequence(body.sequence)?;
    Ok(Json(state.store.write_verified(&digest, content).await?))
}

/// `POST /v1/sequences/get`
pub async fn get_sequences(
    State(state): State<AppState>,
    Json(requesters): Json<RequesterMap>,
) -> ServerResult<Json<BTreeMap<String, Option<String>>>> {
    let resolved = state.store.get_many(&requesters).await?;
    let body = resolved
        .into_iter()
        .map(|(id, content)| (id, content.as_ref().map(as_text)))
        .collect();
    Ok(Json(body))
}

/// `POST /v1/sequences/chunks`
pub async fn write_chunks(
    State(state): State<AppState>,
    Json(body): Json<ChunkBody>,
) -> ServerResult<Json<AddressMap>> {
    let content = checked_sequence(body.sequence)?;
    Ok(Json(state.store.write_chunks(content, &body.ranges).await?))
}

/// `POST /v1/sequences/write`
pub async fn write_many(
    State(state): State<AppState>,
    Json(entries): Json<BTreeMap<String, String>>,
) -> ServerResult<Json<serde_json::Value>> {
    let entries = entries
        .into_iter()
        .map(|(key, sequence)| (key, Bytes::from(sequence)))
        .collect();
    let written = state.store.write_many(entries).await?;
    Ok(Json(json!({ "written": written })))
}
