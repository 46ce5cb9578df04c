//! API-facing relation operations

use std::sync::Arc;

use armory::{
    catalog::{ItemKind, items::Booster},
    relation::{RelationEvent, RelationHook, RelationTarget, RelationType, TargetKind},
    sync::CascadeContext,
};
use serde_json::json;

use crate::helpers::*;

#[tokio::test]
async fn add_rejects_missing_targets_and_unrelatable_kinds() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;

    let err = armory
        .relations()
        .add(user.id, RelationTarget::Item(ItemKind::Helmet, 404), RelationType::Favorite)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = armory
        .relations()
        .add(user.id, RelationTarget::Set(404), RelationType::Favorite)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = armory
        .relations()
        .add(user.id, RelationTarget::Item(ItemKind::Passive, 1), RelationType::Favorite)
        .await
        .unwrap_err();
    assert!(err.is_validation_error());
}

#[tokio::test]
async fn add_rejects_a_target_of_the_wrong_kind() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;
    let helmet_id = helmet(&armory, "Only A Helmet", 10).await;

    let err = armory
        .relations()
        .add(
            user.id,
            RelationTarget::Item(ItemKind::Cape, helmet_id),
            RelationType::Wishlist,
        )
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn component_writes_require_an_item_of_the_store_kind() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;
    let helmet_id = helmet(&armory, "Real Helmet", 10).await;
    let cape_id = cape(&armory, "Real Cape", 10).await;
    let relations = armory.relations();
    let helmets = relations.components(ItemKind::Helmet).unwrap();

    let err = relations
        .create_component(user.id, ItemKind::Helmet, cape_id, RelationType::Favorite)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = helmets
        .create(user.id, 404, RelationType::Favorite)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    let err = helmets
        .get_or_create(user.id, cape_id, RelationType::Collection)
        .await
        .unwrap_err();
    assert!(err.is_not_found());

    assert!(
        helmets
            .list_by_user(user.id, None)
            .await
            .unwrap()
            .is_empty()
    );

    helmets
        .create(user.id, helmet_id, RelationType::Favorite)
        .await
        .unwrap();
    assert!(
        !helmets
            .get_or_create(user.id, helmet_id, RelationType::Favorite)
            .await
            .unwrap()
    );
    assert_eq!(
        helmets.list_by_user(user.id, None).await.unwrap(),
        vec![helmet_id]
    );
}

#[tokio::test]
async fn remove_missing_relation_is_not_found() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;
    let id = helmet(&armory, "Unloved", 10).await;

    let err = armory
        .relations()
        .remove(user.id, RelationTarget::Item(ItemKind::Helmet, id), RelationType::Favorite)
        .await
        .unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn favorite_is_independent_of_collection_and_wishlist() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;
    let id = cape(&armory, "Independent", 10).await;
    let target = RelationTarget::Item(ItemKind::Cape, id);
    let relations = armory.relations();

    relations.add(user.id, target, RelationType::Favorite).await.unwrap();
    relations.add(user.id, target, RelationType::Collection).await.unwrap();

    let flags = relations.check(user.id, target).await.unwrap();
    assert!(flags.favorite && flags.collection && !flags.wishlist);

    relations.remove(user.id, target, RelationType::Favorite).await.unwrap();
    let flags = relations.check(user.id, target).await.unwrap();
    assert!(!flags.favorite && flags.collection);
}

#[tokio::test]
async fn lists_return_ids_and_records_newest_first() {
    let (armory, clock, _mailer) = test_armory_with_clock().await;
    let user = test_user(&armory, "diver").await;
    let relations = armory.relations();

    let mut ids = Vec::new();
    for name in ["Hellpod Space Optimization", "Vitality Enhancement", "Stamina Enhancement"] {
        let booster: Booster = serde_json::from_value(json!({ "name": name, "cost": 0 })).unwrap();
        let id = armory.catalog().table::<Booster>().insert(booster).await.unwrap().id;
        clock.advance_secs(1);
        relations
            .add(user.id, RelationTarget::Item(ItemKind::Booster, id), RelationType::Wishlist)
            .await
            .unwrap();
        ids.push(id);
    }

    let listed = relations
        .list_ids(user.id, TargetKind::Item(ItemKind::Booster), RelationType::Wishlist)
        .await
        .unwrap();
    let expected: Vec<_> = ids.iter().rev().copied().collect();
    assert_eq!(listed, expected);

    let records = relations
        .list_records(user.id, TargetKind::Item(ItemKind::Booster), RelationType::Wishlist)
        .await
        .unwrap();
    assert_eq!(records.len(), 3);
    assert_eq!(records[0]["name"], "Stamina Enhancement");
    assert_eq!(records[0]["id"], ids[2]);

    assert!(
        relations
            .list_ids(user.id, TargetKind::Item(ItemKind::Booster), RelationType::Collection)
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn set_lists_return_set_records() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "Listed", true).await;

    armory
        .relations()
        .add(user.id, RelationTarget::Set(s.set), RelationType::Collection)
        .await
        .unwrap();

    let records = armory
        .relations()
        .list_records(user.id, TargetKind::Set, RelationType::Collection)
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["name"], "Listed");
    assert_eq!(records[0]["helmet_id"], s.helmet);
}

struct FailingHook;

impl RelationHook for FailingHook {
    fn on_relation_changed(&self, _: &RelationEvent, _: &CascadeContext) -> armory::Result<()> {
        Err(armory::Error::Config("hook failure".to_string()))
    }
}

#[tokio::test]
async fn failing_hooks_do_not_fail_writes() {
    let armory = test_builder()
        .hook(Arc::new(FailingHook))
        .in_memory()
        .await
        .unwrap();
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "Hooked", true).await;

    armory
        .relations()
        .add(user.id, RelationTarget::Set(s.set), RelationType::Favorite)
        .await
        .unwrap();
    assert!(
        armory
            .relations()
            .components(ItemKind::Armor)
            .unwrap()
            .exists(user.id, s.armor, RelationType::Favorite)
            .await
            .unwrap()
    );
}

#[tokio::test]
async fn concurrent_get_or_create_inserts_once() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;
    let id = helmet(&armory, "Contested", 10).await;
    let store = armory.relations().components(ItemKind::Helmet).unwrap();

    let (a, b) = tokio::join!(
        store.get_or_create(user.id, id, RelationType::Favorite),
        store.get_or_create(user.id, id, RelationType::Favorite),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert!(a ^ b, "exactly one call creates the row");
    assert_eq!(
        store.list_by_user(user.id, Some(RelationType::Favorite)).await.unwrap(),
        vec![id]
    );
}
