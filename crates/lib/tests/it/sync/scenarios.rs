use armory::{
    catalog::ItemKind,
    relation::{RelationTarget, RelationType},
};

use crate::helpers::*;

#[tokio::test]
async fn favoriting_a_set_then_its_helmet_is_a_duplicate() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "S1", true).await;

    armory
        .relations()
        .add(user.id, RelationTarget::Set(s.set), RelationType::Favorite)
        .await
        .unwrap();

    let relations = armory.relations();
    for (kind, item) in [
        (ItemKind::Helmet, s.helmet),
        (ItemKind::Armor, s.armor),
        (ItemKind::Cape, s.cape.unwrap()),
    ] {
        let flags = relations
            .check(user.id, RelationTarget::Item(kind, item))
            .await
            .unwrap();
        assert!(flags.favorite, "{kind} should be favorited");
    }

    let before = relations
        .list_ids(
            user.id,
            armory::relation::TargetKind::Item(ItemKind::Helmet),
            RelationType::Favorite,
        )
        .await
        .unwrap();
    let err = relations
        .add(
            user.id,
            RelationTarget::Item(ItemKind::Helmet, s.helmet),
            RelationType::Favorite,
        )
        .await
        .unwrap_err();
    assert!(err.is_duplicate_relation());
    let after = relations
        .list_ids(
            user.id,
            armory::relation::TargetKind::Item(ItemKind::Helmet),
            RelationType::Favorite,
        )
        .await
        .unwrap();
    assert_eq!(before, after);
}

#[tokio::test]
async fn set_is_favorited_only_after_the_third_piece() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "S1", true).await;
    let relations = armory.relations();

    for (step, (kind, item)) in [
        (ItemKind::Helmet, s.helmet),
        (ItemKind::Armor, s.armor),
        (ItemKind::Cape, s.cape.unwrap()),
    ]
    .into_iter()
    .enumerate()
    {
        relations
            .add(user.id, RelationTarget::Item(kind, item), RelationType::Favorite)
            .await
            .unwrap();
        let set_flags = relations.check(user.id, RelationTarget::Set(s.set)).await.unwrap();
        assert_eq!(set_flags.favorite, step == 2);
    }
}

#[tokio::test]
async fn collecting_an_armor_removes_it_from_the_wishlist() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;
    let a1 = armor(&armory, "A1", 300).await;
    let target = RelationTarget::Item(ItemKind::Armor, a1);

    armory
        .relations()
        .add(user.id, target, RelationType::Wishlist)
        .await
        .unwrap();
    armory
        .relations()
        .add(user.id, target, RelationType::Collection)
        .await
        .unwrap();

    let flags = armory.relations().check(user.id, target).await.unwrap();
    assert!(flags.collection);
    assert!(!flags.wishlist);

    // And back again.
    armory
        .relations()
        .add(user.id, target, RelationType::Wishlist)
        .await
        .unwrap();
    let flags = armory.relations().check(user.id, target).await.unwrap();
    assert!(!flags.collection);
    assert!(flags.wishlist);
}

#[tokio::test]
async fn collecting_a_set_moves_its_pieces_out_of_the_wishlist() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "Vanguard", true).await;
    let relations = armory.relations();

    relations
        .add(user.id, RelationTarget::Set(s.set), RelationType::Wishlist)
        .await
        .unwrap();
    relations
        .add(user.id, RelationTarget::Set(s.set), RelationType::Collection)
        .await
        .unwrap();

    let set_flags = relations.check(user.id, RelationTarget::Set(s.set)).await.unwrap();
    assert!(set_flags.collection && !set_flags.wishlist);
    let helmet_flags = relations
        .check(user.id, RelationTarget::Item(ItemKind::Helmet, s.helmet))
        .await
        .unwrap();
    assert!(helmet_flags.collection && !helmet_flags.wishlist);
}
