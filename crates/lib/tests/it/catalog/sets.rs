use armory::catalog::{
    ArmorSet, ItemKind, ListQuery, SetComponents,
    items::{Cape, Helmet},
};

use crate::helpers::*;

#[tokio::test]
async fn sets_validate_their_components() {
    let armory = test_armory().await;
    let h = helmet(&armory, "H", 100).await;
    let a = armor(&armory, "A", 200).await;

    let swapped = ArmorSet {
        name: "Swapped".to_string(),
        helmet_id: a,
        armor_id: h,
        cape_id: None,
    };
    let err = armory.catalog().sets().insert(swapped).await.unwrap_err();
    assert!(err.is_validation_error());

    let missing = ArmorSet {
        name: "Missing".to_string(),
        helmet_id: h,
        armor_id: a,
        cape_id: Some(9_999),
    };
    assert!(armory.catalog().sets().insert(missing).await.is_err());
}

#[tokio::test]
async fn total_cost_tolerates_a_missing_cape() {
    let armory = test_armory().await;
    let with_cape = armor_set(&armory, "Caped", true).await;
    let without = armor_set(&armory, "Bare", false).await;

    let cost = armory.catalog().sets().total_cost(with_cape.set).await.unwrap();
    assert_eq!((cost.helmet, cost.armor, cost.cape, cost.total), (150, 250, 100, 500));

    let cost = armory.catalog().sets().total_cost(without.set).await.unwrap();
    assert_eq!((cost.cape, cost.total), (0, 400));
}

#[tokio::test]
async fn membership_index_answers_both_directions() {
    let armory = test_armory().await;
    let s1 = armor_set(&armory, "One", true).await;
    let a2 = armor(&armory, "Second Armor", 10).await;
    let s2 = armor_set_from(&armory, "Two", s1.helmet, a2, None).await;

    let membership = armory.catalog().membership();
    assert_eq!(
        membership.sets_containing(ItemKind::Helmet, s1.helmet).await.unwrap(),
        vec![s1.set, s2.set]
    );
    assert_eq!(
        membership.sets_containing(ItemKind::Armor, a2).await.unwrap(),
        vec![s2.set]
    );
    assert!(
        membership
            .sets_containing(ItemKind::Stratagem, s1.helmet)
            .await
            .unwrap()
            .is_empty()
    );

    assert_eq!(
        membership.components_of(s2.set).await.unwrap(),
        SetComponents {
            helmet: s1.helmet,
            armor: a2,
            cape: None
        }
    );
    assert!(membership.components_of(9_999).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn deleting_a_component_deletes_its_sets_and_their_relations() {
    let armory = test_armory().await;
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "Doomed", true).await;
    armory
        .relations()
        .create_set(user.id, s.set, armory::relation::RelationType::Favorite)
        .await
        .unwrap();

    armory.catalog().table::<Cape>().delete(s.cape.unwrap()).await.unwrap();

    assert!(!armory.catalog().sets().exists(s.set).await.unwrap());
    assert!(
        armory
            .relations()
            .sets()
            .list_by_user(user.id, None)
            .await
            .unwrap()
            .is_empty()
    );
    // Relations on the surviving pieces are kept.
    assert!(
        armory
            .relations()
            .components(ItemKind::Helmet)
            .unwrap()
            .exists(user.id, s.helmet, armory::relation::RelationType::Favorite)
            .await
            .unwrap()
    );
    armory.catalog().table::<Helmet>().get(s.helmet).await.unwrap();
}

#[tokio::test]
async fn sets_list_by_name() {
    let armory = test_armory().await;
    armor_set(&armory, "Beta", true).await;
    armor_set(&armory, "Alpha", false).await;

    let page = armory.catalog().sets().list(&ListQuery::default()).await.unwrap();
    assert_eq!(page.count, 2);
    let names: Vec<_> = page.results.iter().map(|r| r.item.name.as_str()).collect();
    assert_eq!(names, vec!["Alpha", "Beta"]);

    let page = armory.catalog().sets().list(&ListQuery::search("alp")).await.unwrap();
    assert_eq!(page.count, 1);
}
