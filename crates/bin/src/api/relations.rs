//! Favorites, collection and wishlist routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::Value;

use armory::relation::{Relation, RelationFlags, RelationType, TargetKind};

use super::{AppState, auth::CurrentUser, error::ApiResult};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/relations/{kind}/add", post(add))
        .route("/relations/{kind}/remove", post(remove))
        .route("/relations/{kind}/check", get(check))
        .route("/relations/{kind}/{list}", get(list))
}

#[derive(Deserialize)]
struct RelationRequest {
    id: i64,
    relation_type: RelationType,
}

#[derive(Deserialize)]
struct CheckQuery {
    id: i64,
}

fn target_kind(segment: &str) -> Result<TargetKind, armory::Error> {
    Ok(TargetKind::from_path_segment(segment)?)
}

/// `favorites` is accepted for the favorite list next to the singular form.
fn list_type(segment: &str) -> Result<RelationType, armory::Error> {
    match segment {
        "favorites" => Ok(RelationType::Favorite),
        other => Ok(other.parse()?),
    }
}

async fn add(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(kind): Path<String>,
    Json(request): Json<RelationRequest>,
) -> ApiResult<(StatusCode, Json<Relation>)> {
    let target = target_kind(&kind)?.target(request.id);
    let relation = state
        .armory
        .relations()
        .add(user.id, target, request.relation_type)
        .await?;
    Ok((StatusCode::CREATED, Json(relation)))
}

async fn remove(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(kind): Path<String>,
    Json(request): Json<RelationRequest>,
) -> ApiResult<StatusCode> {
    let target = target_kind(&kind)?.target(request.id);
    state
        .armory
        .relations()
        .remove(user.id, target, request.relation_type)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn check(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(kind): Path<String>,
    Query(query): Query<CheckQuery>,
) -> ApiResult<Json<RelationFlags>> {
    let target = target_kind(&kind)?.target(query.id);
    Ok(Json(state.armory.relations().check(user.id, target).await?))
}

async fn list(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path((kind, list)): Path<(String, String)>,
) -> ApiResult<Json<Vec<Value>>> {
    let kind = target_kind(&kind)?;
    let relation_type = list_type(&list)?;
    let records = state
        .armory
        .relations()
        .list_records(user.id, kind, relation_type)
        .await?;
    Ok(Json(records))
}
