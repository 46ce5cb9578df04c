//! Call-count checks for the cascade guard.

use armory::{
    catalog::ItemKind,
    relation::{RelationEvent, RelationType},
    sync::Handler,
};

use crate::helpers::*;

const FAV: RelationType = RelationType::Favorite;

#[tokio::test]
async fn set_creation_writes_each_component_exactly_once() {
    let (armory, hook) = test_armory_with_hook().await;
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "Recon", true).await;

    armory.relations().create_set(user.id, s.set, FAV).await.unwrap();

    let events = hook.events();
    assert_eq!(
        events,
        vec![
            RelationEvent::SetCreated {
                user: user.id,
                set: s.set,
                relation_type: FAV
            },
            RelationEvent::ComponentCreated {
                user: user.id,
                kind: ItemKind::Helmet,
                item: s.helmet,
                relation_type: FAV
            },
            RelationEvent::ComponentCreated {
                user: user.id,
                kind: ItemKind::Armor,
                item: s.armor,
                relation_type: FAV
            },
            RelationEvent::ComponentCreated {
                user: user.id,
                kind: ItemKind::Cape,
                item: s.cape.unwrap(),
                relation_type: FAV
            },
        ]
    );

    let contexts = hook.contexts();
    assert!(!contexts[0].is_cascade());
    for ctx in &contexts[1..] {
        assert_eq!(ctx.depth(), 1);
        assert!(ctx.is_suppressed(Handler::ComponentCreated));
        assert!(!ctx.is_suppressed(Handler::SetCreated));
    }
}

#[tokio::test]
async fn completing_a_set_upward_does_not_bounce_back_down() {
    let (armory, hook) = test_armory_with_hook().await;
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "Engineer", true).await;

    let relations = armory.relations();
    relations.create_component(user.id, ItemKind::Helmet, s.helmet, FAV).await.unwrap();
    relations.create_component(user.id, ItemKind::Armor, s.armor, FAV).await.unwrap();
    hook.clear();

    relations
        .create_component(user.id, ItemKind::Cape, s.cape.unwrap(), FAV)
        .await
        .unwrap();

    assert_eq!(
        hook.events(),
        vec![
            RelationEvent::ComponentCreated {
                user: user.id,
                kind: ItemKind::Cape,
                item: s.cape.unwrap(),
                relation_type: FAV
            },
            RelationEvent::SetCreated {
                user: user.id,
                set: s.set,
                relation_type: FAV
            },
        ]
    );
    let contexts = hook.contexts();
    assert!(contexts[1].is_suppressed(Handler::SetCreated));
}

#[tokio::test]
async fn deletions_cascade_one_level_only() {
    let (armory, hook) = test_armory_with_hook().await;
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "Medic", true).await;
    armory.relations().create_set(user.id, s.set, FAV).await.unwrap();
    hook.clear();

    armory.relations().delete_set(user.id, s.set, FAV).await.unwrap();
    let events = hook.events();
    assert_eq!(events.len(), 4);
    assert!(matches!(events[0], RelationEvent::SetDeleted { .. }));
    assert!(
        events[1..]
            .iter()
            .all(|e| matches!(e, RelationEvent::ComponentDeleted { .. }))
    );

    armory.relations().create_set(user.id, s.set, FAV).await.unwrap();
    hook.clear();

    armory
        .relations()
        .delete_component(user.id, ItemKind::Armor, s.armor, FAV)
        .await
        .unwrap();
    let events = hook.events();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], RelationEvent::ComponentDeleted { .. }));
    assert!(matches!(events[1], RelationEvent::SetDeleted { .. }));

    // The helmet and cape relations survive the upward deletion.
    let helmets = armory.relations().components(ItemKind::Helmet).unwrap();
    assert!(helmets.exists(user.id, s.helmet, FAV).await.unwrap());
}

#[tokio::test]
async fn suppression_ends_with_the_cascade() {
    let (armory, hook) = test_armory_with_hook().await;
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "Scout", true).await;

    // A cascade that ran before must not keep its handler suppressed: a
    // later direct write still synchronizes.
    armory.relations().create_set(user.id, s.set, FAV).await.unwrap();
    armory.relations().delete_set(user.id, s.set, FAV).await.unwrap();
    hook.clear();

    let relations = armory.relations();
    relations.create_component(user.id, ItemKind::Helmet, s.helmet, FAV).await.unwrap();
    relations.create_component(user.id, ItemKind::Armor, s.armor, FAV).await.unwrap();
    relations
        .create_component(user.id, ItemKind::Cape, s.cape.unwrap(), FAV)
        .await
        .unwrap();

    assert!(relations.sets().exists(user.id, s.set, FAV).await.unwrap());
    assert!(hook.contexts().iter().all(|ctx| ctx.depth() <= 1));
}
