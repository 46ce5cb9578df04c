use armory::catalog::items::Helmet;

use crate::helpers::*;

#[tokio::test]
async fn every_catalog_mutation_bumps_the_version() {
    let (armory, clock, _mailer) = test_armory_with_clock().await;
    let version = armory.catalog().version();

    let initial = version.current().await.unwrap();
    // Stable across reads.
    assert_eq!(version.current().await.unwrap(), initial);

    clock.advance_secs(10);
    let id = helmet(&armory, "Versioned", 10).await;
    let after_insert = version.current().await.unwrap();
    assert!(after_insert > initial);

    clock.advance_secs(10);
    let record = armory.catalog().table::<Helmet>().get(id).await.unwrap();
    armory.catalog().table::<Helmet>().update(id, record.item).await.unwrap();
    let after_update = version.current().await.unwrap();
    assert!(after_update > after_insert);

    clock.advance_secs(10);
    let s = armor_set(&armory, "Versioned Set", false).await;
    let after_set = version.current().await.unwrap();
    assert!(after_set > after_update);

    clock.advance_secs(10);
    armory.catalog().sets().delete(s.set).await.unwrap();
    assert!(version.current().await.unwrap() > after_set);
}

#[tokio::test]
async fn relation_writes_do_not_bump_the_version() {
    let (armory, clock, _mailer) = test_armory_with_clock().await;
    let user = test_user(&armory, "diver").await;
    let s = armor_set(&armory, "Quiet", true).await;
    let before = armory.catalog().version().current().await.unwrap();

    clock.advance_secs(60);
    armory
        .relations()
        .create_set(user.id, s.set, armory::relation::RelationType::Wishlist)
        .await
        .unwrap();

    assert_eq!(armory.catalog().version().current().await.unwrap(), before);
}
