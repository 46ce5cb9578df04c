use armory::{catalog::ItemKind, relation::RelationType, sync::SyncPolicy};

use crate::helpers::*;

const FAV: RelationType = RelationType::Favorite;

#[tokio::test]
async fn capeless_set_is_not_completed_by_default() {
    let armory = test_armory().await;
    assert!(armory.config().sync.require_cape);
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "Bare", false).await;

    let relations = armory.relations();
    relations.create_component(user.id, ItemKind::Helmet, s.helmet, FAV).await.unwrap();
    relations.create_component(user.id, ItemKind::Armor, s.armor, FAV).await.unwrap();

    assert!(!relations.sets().exists(user.id, s.set, FAV).await.unwrap());
}

#[tokio::test]
async fn capeless_set_completes_when_cape_is_optional() {
    let armory = test_builder()
        .sync_policy(SyncPolicy {
            require_cape: false,
        })
        .in_memory()
        .await
        .unwrap();
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "Bare", false).await;

    let relations = armory.relations();
    relations.create_component(user.id, ItemKind::Helmet, s.helmet, FAV).await.unwrap();
    assert!(!relations.sets().exists(user.id, s.set, FAV).await.unwrap());
    relations.create_component(user.id, ItemKind::Armor, s.armor, FAV).await.unwrap();
    assert!(relations.sets().exists(user.id, s.set, FAV).await.unwrap());
}

#[tokio::test]
async fn caped_set_still_needs_its_cape_when_cape_is_optional() {
    let armory = test_builder()
        .sync_policy(SyncPolicy {
            require_cape: false,
        })
        .in_memory()
        .await
        .unwrap();
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "Full", true).await;

    let relations = armory.relations();
    relations.create_component(user.id, ItemKind::Helmet, s.helmet, FAV).await.unwrap();
    relations.create_component(user.id, ItemKind::Armor, s.armor, FAV).await.unwrap();
    assert!(!relations.sets().exists(user.id, s.set, FAV).await.unwrap());
}

#[tokio::test]
async fn non_component_kinds_never_complete_sets() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "Full", true).await;
    let stratagem: armory::catalog::items::Stratagem = serde_json::from_value(serde_json::json!({
        "name": "Orbital Laser",
        "department": "Orbital Cannons",
        "codex": ["right", "down", "up", "right", "down"],
        "cooldown": 300,
        "cost": 0,
        "unlock_level": 10
    }))
    .unwrap();
    let id = armory
        .catalog()
        .table::<armory::catalog::items::Stratagem>()
        .insert(stratagem)
        .await
        .unwrap()
        .id;

    armory
        .relations()
        .create_component(user.id, ItemKind::Stratagem, id, FAV)
        .await
        .unwrap();
    assert!(!armory.relations().sets().exists(user.id, s.set, FAV).await.unwrap());
}
