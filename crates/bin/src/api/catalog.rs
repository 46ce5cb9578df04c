//! Catalog routes. Anyone can read; only staff can write.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::get,
};

use armory::{
    catalog::{
        ArmorSet, CatalogItem, ItemId, ListQuery, Page, Record, SetCost, SetId,
        items::{
            Armor, BattlePass, Booster, Cape, Helmet, Passive, PrimaryWeapon, SecondaryWeapon,
            Stratagem, Throwable, Warbond,
        },
    },
    user::Users,
};

use super::{AppState, auth::CurrentUser, error::ApiResult};

pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(item_routes::<Helmet>())
        .merge(item_routes::<Armor>())
        .merge(item_routes::<Cape>())
        .merge(item_routes::<Passive>())
        .merge(item_routes::<Warbond>())
        .merge(item_routes::<BattlePass>())
        .merge(item_routes::<Booster>())
        .merge(item_routes::<Stratagem>())
        .merge(item_routes::<PrimaryWeapon>())
        .merge(item_routes::<SecondaryWeapon>())
        .merge(item_routes::<Throwable>())
        .route("/catalog/sets", get(list_sets).post(create_set))
        .route(
            "/catalog/sets/{id}",
            get(get_set).put(update_set).delete(delete_set),
        )
        .route("/catalog/sets/{id}/cost", get(set_cost))
}

/// `/catalog/{kind}` and `/catalog/{kind}/{id}` for one item kind.
fn item_routes<T: CatalogItem>() -> Router<AppState> {
    let base = format!("/catalog/{}", T::KIND.path_segment());
    Router::new()
        .route(&base, get(list_items::<T>).post(create_item::<T>))
        .route(
            &format!("{base}/{{id}}"),
            get(get_item::<T>)
                .put(update_item::<T>)
                .delete(delete_item::<T>),
        )
}

async fn list_items<T: CatalogItem>(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<Record<T>>>> {
    Ok(Json(state.armory.catalog().table::<T>().list(&query).await?))
}

async fn get_item<T: CatalogItem>(
    State(state): State<AppState>,
    Path(id): Path<ItemId>,
) -> ApiResult<Json<Record<T>>> {
    Ok(Json(state.armory.catalog().table::<T>().get(id).await?))
}

async fn create_item<T: CatalogItem>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(item): Json<T>,
) -> ApiResult<(StatusCode, Json<Record<T>>)> {
    Users::require_staff(&user)?;
    let record = state.armory.catalog().table::<T>().insert(item).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_item<T: CatalogItem>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ItemId>,
    Json(item): Json<T>,
) -> ApiResult<Json<Record<T>>> {
    Users::require_staff(&user)?;
    Ok(Json(state.armory.catalog().table::<T>().update(id, item).await?))
}

async fn delete_item<T: CatalogItem>(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<ItemId>,
) -> ApiResult<StatusCode> {
    Users::require_staff(&user)?;
    state.armory.catalog().table::<T>().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn list_sets(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Json<Page<Record<ArmorSet>>>> {
    Ok(Json(state.armory.catalog().sets().list(&query).await?))
}

async fn get_set(
    State(state): State<AppState>,
    Path(id): Path<SetId>,
) -> ApiResult<Json<Record<ArmorSet>>> {
    Ok(Json(state.armory.catalog().sets().get(id).await?))
}

async fn create_set(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Json(set): Json<ArmorSet>,
) -> ApiResult<(StatusCode, Json<Record<ArmorSet>>)> {
    Users::require_staff(&user)?;
    let record = state.armory.catalog().sets().insert(set).await?;
    Ok((StatusCode::CREATED, Json(record)))
}

async fn update_set(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<SetId>,
    Json(set): Json<ArmorSet>,
) -> ApiResult<Json<Record<ArmorSet>>> {
    Users::require_staff(&user)?;
    Ok(Json(state.armory.catalog().sets().update(id, set).await?))
}

async fn delete_set(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(id): Path<SetId>,
) -> ApiResult<StatusCode> {
    Users::require_staff(&user)?;
    state.armory.catalog().sets().delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn set_cost(
    State(state): State<AppState>,
    Path(id): Path<SetId>,
) -> ApiResult<Json<SetCost>> {
    Ok(Json(state.armory.catalog().sets().total_cost(id).await?))
}
