//! Loadout routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};

use armory::{
    catalog::Page,
    loadout::{Loadout, LoadoutId, LoadoutQuery, NewLoadout, ToggleOutcome},
};

use super::{
    AppState,
    auth::{CurrentUser, MaybeUser},
    error::ApiResult,
};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/loadouts", get(list).post(create))
        .route("/loadouts/{id}", get(show).put(update).delete(destroy))
        .route("/loadouts/{id}/like", post(like))
        .route("/loadouts/{id}/favorite", post(favorite))
}

async fn list(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Query(query): Query<LoadoutQuery>,
) -> ApiResult<Json<Page<Loadout>>> {
    let viewer = viewer.map(|user| user.id);
    Ok(Json(state.armory.loadouts().list(viewer, &query).await?))
}

async fn create(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(loadout): Json<NewLoadout>,
) -> ApiResult<(StatusCode, Json<Loadout>)> {
    let created = state.armory.loadouts().create(user.id, loadout).await?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn show(
    State(state): State<AppState>,
    MaybeUser(viewer): MaybeUser,
    Path(id): Path<LoadoutId>,
) -> ApiResult<Json<Loadout>> {
    let viewer = viewer.map(|user| user.id);
    Ok(Json(state.armory.loadouts().get(id, viewer).await?))
}

async fn update(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<LoadoutId>,
    Json(loadout): Json<NewLoadout>,
) -> ApiResult<Json<Loadout>> {
    Ok(Json(state.armory.loadouts().update(user.id, id, loadout).await?))
}

async fn destroy(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<LoadoutId>,
) -> ApiResult<StatusCode> {
    state.armory.loadouts().delete(&user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<LoadoutId>,
) -> ApiResult<Json<ToggleOutcome>> {
    Ok(Json(state.armory.loadouts().toggle_like(user.id, id).await?))
}

async fn favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<LoadoutId>,
) -> ApiResult<Json<ToggleOutcome>> {
    Ok(Json(state.armory.loadouts().toggle_favorite(user.id, id).await?))
}
