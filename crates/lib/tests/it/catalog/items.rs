use armory::catalog::{
    ListQuery,
    items::{Armor, Helmet, Passive, PrimaryWeapon, Source},
};
use serde_json::json;

use crate::helpers::*;

fn passive(name: &str) -> Passive {
    serde_json::from_value(json!({
        "name": name,
        "description": "Reduces recoil when crouching or prone.",
        "effect": "+30% recoil reduction"
    }))
    .unwrap()
}

#[tokio::test]
async fn insert_get_update_delete() {
    let armory = test_armory().await;
    let helmets = armory.catalog().table::<Helmet>();

    let id = helmet(&armory, "B-01 Tactical", 150).await;
    let record = helmets.get(id).await.unwrap();
    assert_eq!(record.item.name, "B-01 Tactical");
    assert_eq!(record.item.source, Source::Store);
    assert_eq!(record.item.source.currency(), "Super Credits");

    let mut changed = record.item.clone();
    changed.cost = 75;
    changed.source = Source::Pass;
    let updated = helmets.update(id, changed).await.unwrap();
    assert_eq!(updated.item.cost, 75);
    assert_eq!(updated.item.source.currency(), "Medals");

    helmets.delete(id).await.unwrap();
    assert!(helmets.get(id).await.unwrap_err().is_not_found());
    assert!(helmets.delete(id).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn names_are_unique_per_kind() {
    let armory = test_armory().await;
    helmet(&armory, "Trench Engineer", 150).await;

    let dup: Helmet = serde_json::from_value(json!({ "name": "Trench Engineer" })).unwrap();
    let err = armory.catalog().table::<Helmet>().insert(dup).await.unwrap_err();
    assert!(err.is_conflict());

    // Same name in another kind is fine.
    cape(&armory, "Trench Engineer", 50).await;
}

#[tokio::test]
async fn blank_names_are_rejected() {
    let armory = test_armory().await;
    let blank: Helmet = serde_json::from_value(json!({ "name": "   " })).unwrap();
    let err = armory.catalog().table::<Helmet>().insert(blank).await.unwrap_err();
    assert!(err.is_validation_error());
}

#[tokio::test]
async fn references_must_point_at_the_right_kind() {
    let armory = test_armory().await;
    let passives = armory.catalog().table::<Passive>();
    let passive_id = passives.insert(passive("Peak Physique")).await.unwrap().id;
    let helmet_id = helmet(&armory, "Not A Passive", 10).await;

    let good: Armor = serde_json::from_value(json!({
        "name": "SC-34 Infiltrator",
        "category": "light",
        "armor": "50",
        "speed": "550",
        "stamina": "125",
        "passive_id": passive_id
    }))
    .unwrap();
    let record = armory.catalog().table::<Armor>().insert(good).await.unwrap();
    assert_eq!(record.item.passive_id, Some(passive_id));

    let bad: Armor = serde_json::from_value(json!({
        "name": "SC-30 Trailblazer",
        "category": "light",
        "passive_id": helmet_id
    }))
    .unwrap();
    let err = armory.catalog().table::<Armor>().insert(bad).await.unwrap_err();
    assert!(err.is_validation_error());
}

#[tokio::test]
async fn list_searches_both_names_and_paginates() {
    let armory = test_armory().await;
    let weapons = armory.catalog().table::<PrimaryWeapon>();
    for (name, pt) in [
        ("AR-23 Liberator", "AR-23 Libertador"),
        ("AR-23P Liberator Penetrator", "AR-23P Libertador Penetrante"),
        ("SG-225 Breaker", "SG-225 Quebrador"),
    ] {
        let weapon: PrimaryWeapon = serde_json::from_value(json!({
            "name": name,
            "name_pt_br": pt,
            "weapon_type": "assault_rifle",
            "damage_value": 60,
            "damage_type": "ballistic",
            "max_penetration": 3
        }))
        .unwrap();
        weapons.insert(weapon).await.unwrap();
    }

    let page = weapons.list(&ListQuery::search("liberator")).await.unwrap();
    assert_eq!(page.count, 2);
    assert_eq!(page.results.len(), 2);

    let page = weapons.list(&ListQuery::search("quebrador")).await.unwrap();
    assert_eq!(page.count, 1);
    assert_eq!(page.results[0].item.name, "SG-225 Breaker");

    let paged = weapons
        .list(&ListQuery {
            page: Some(2),
            page_size: Some(2),
            ..ListQuery::default()
        })
        .await
        .unwrap();
    assert_eq!(paged.count, 3);
    assert_eq!(paged.results.len(), 1);
    // Ordered by name.
    assert_eq!(paged.results[0].item.name, "SG-225 Breaker");
}

#[tokio::test]
async fn weapon_stats_serialize_flat() {
    let armory = test_armory().await;
    let weapon: PrimaryWeapon = serde_json::from_value(json!({
        "name": "PLAS-1 Scorcher",
        "weapon_type": "energy",
        "damage_value": 100,
        "damage_type": "fire",
        "max_penetration": 4
    }))
    .unwrap();
    let record = armory
        .catalog()
        .table::<PrimaryWeapon>()
        .insert(weapon)
        .await
        .unwrap();

    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["damage_type"], "fire");
    assert_eq!(value["max_penetration"], 4);
    assert_eq!(value["id"], record.id);
}
