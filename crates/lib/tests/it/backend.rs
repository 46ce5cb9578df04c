//! Backend and on-disk persistence tests

use armory::{
    backend::{Backend, schema},
    catalog::{ItemKind, items::Helmet},
    relation::RelationType,
};

use crate::helpers::*;

#[tokio::test]
async fn schema_version_is_recorded() {
    let backend = Backend::in_memory().await.unwrap();
    let (version,): (i64,) = sqlx::query_as("SELECT MAX(version) FROM schema_version")
        .fetch_one(backend.pool())
        .await
        .unwrap();
    assert_eq!(version, schema::SCHEMA_VERSION);
}

#[tokio::test]
async fn state_survives_reopening_the_database() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("armory.db");

    let (user_id, s) = {
        let armory = test_builder().open(&path).await.unwrap();
        let user = test_user(&armory, "persistent").await;
        let s = armor_set(&armory, "Durable", true).await;
        armory
            .relations()
            .create_set(user.id, s.set, RelationType::Collection)
            .await
            .unwrap();
        armory.close().await;
        (user.id, s)
    };

    let armory = test_builder().open(&path).await.unwrap();
    let helmet = armory.catalog().table::<Helmet>().get(s.helmet).await.unwrap();
    assert_eq!(helmet.item.name, "Durable Helmet");
    assert!(
        armory
            .relations()
            .components(ItemKind::Cape)
            .unwrap()
            .exists(user_id, s.cape.unwrap(), RelationType::Collection)
            .await
            .unwrap()
    );
    let user = armory
        .users()
        .authenticate("persistent", TEST_PASSWORD)
        .await
        .unwrap();
    assert_eq!(user.id, user_id);
}

#[tokio::test]
async fn invalid_config_is_rejected_before_opening() {
    let mut config = test_config();
    config.auth.jwt_secret = "short".to_string();
    let err = armory::Armory::builder(config).in_memory().await.unwrap_err();
    assert_eq!(err.module(), "config");
}
