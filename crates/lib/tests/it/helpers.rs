use std::sync::{Arc, Mutex};

use armory::{
    Armory, ArmoryBuilder, AuthConfig, Config, FixedClock,
    catalog::{
        ArmorSet, ItemId, ItemKind, SetId,
        items::{Armor, Cape, Helmet},
    },
    relation::{RelationEvent, RelationHook, RelationType, Relations},
    sync::CascadeContext,
    user::{MemoryMailer, NewUser, User, UserId},
};
use serde_json::json;

pub const TEST_PASSWORD: &str = "for-super-earth";

pub fn test_config() -> Config {
    let frontend = url::Url::parse("http://localhost:3000").unwrap();
    Config::new(AuthConfig::new("integration-test-secret", frontend))
}

pub fn test_builder() -> ArmoryBuilder {
    Armory::builder(test_config())
}

/// In-memory instance with default settings.
pub async fn test_armory() -> Armory {
    test_builder()
        .in_memory()
        .await
        .expect("Failed to build in-memory armory")
}

/// In-memory instance with a controllable clock and an inspectable outbox.
pub async fn test_armory_with_clock() -> (Armory, Arc<FixedClock>, MemoryMailer) {
    let clock = Arc::new(FixedClock::default());
    let mailer = MemoryMailer::new();
    let armory = test_builder()
        .clock(clock.clone())
        .mailer(Arc::new(mailer.clone()))
        .in_memory()
        .await
        .expect("Failed to build in-memory armory");
    (armory, clock, mailer)
}

/// Register a user named `name` with [`TEST_PASSWORD`].
pub async fn test_user(armory: &Armory, name: &str) -> User {
    armory
        .users()
        .register(NewUser {
            username: name.to_string(),
            email: format!("{name}@super.earth"),
            password: TEST_PASSWORD.to_string(),
        })
        .await
        .expect("Failed to register user")
}

pub async fn helmet(armory: &Armory, name: &str, cost: i64) -> ItemId {
    let helmet: Helmet = serde_json::from_value(json!({ "name": name, "cost": cost })).unwrap();
    armory.catalog().table::<Helmet>().insert(helmet).await.unwrap().id
}

pub async fn armor(armory: &Armory, name: &str, cost: i64) -> ItemId {
    let armor: Armor =
        serde_json::from_value(json!({ "name": name, "category": "medium", "cost": cost }))
            .unwrap();
    armory.catalog().table::<Armor>().insert(armor).await.unwrap().id
}

pub async fn cape(armory: &Armory, name: &str, cost: i64) -> ItemId {
    let cape: Cape = serde_json::from_value(json!({ "name": name, "cost": cost })).unwrap();
    armory.catalog().table::<Cape>().insert(cape).await.unwrap().id
}

/// An armor set together with the ids of its components.
#[derive(Clone, Copy, Debug)]
pub struct SetFixture {
    pub set: SetId,
    pub helmet: ItemId,
    pub armor: ItemId,
    pub cape: Option<ItemId>,
}

/// Create a set named `name` with fresh components.
pub async fn armor_set(armory: &Armory, name: &str, with_cape: bool) -> SetFixture {
    let helmet = helmet(armory, &format!("{name} Helmet"), 150).await;
    let armor = armor(armory, &format!("{name} Armor"), 250).await;
    let cape = if with_cape {
        Some(cape(armory, &format!("{name} Cape"), 100).await)
    } else {
        None
    };
    armor_set_from(armory, name, helmet, armor, cape).await
}

/// Create a set named `name` from existing components.
pub async fn armor_set_from(
    armory: &Armory,
    name: &str,
    helmet: ItemId,
    armor: ItemId,
    cape: Option<ItemId>,
) -> SetFixture {
    let set = armory
        .catalog()
        .sets()
        .insert(ArmorSet {
            name: name.to_string(),
            helmet_id: helmet,
            armor_id: armor,
            cape_id: cape,
        })
        .await
        .unwrap()
        .id;
    SetFixture {
        set,
        helmet,
        armor,
        cape,
    }
}

/// Whether the user holds `relation_type` on the item.
pub async fn holds(
    relations: &Relations,
    user: UserId,
    kind: ItemKind,
    item: ItemId,
    relation_type: RelationType,
) -> bool {
    relations
        .components(kind)
        .unwrap()
        .exists(user, item, relation_type)
        .await
        .unwrap()
}

/// Hook that records every relation change with its context.
#[derive(Default)]
pub struct RecordingHook {
    events: Mutex<Vec<(RelationEvent, CascadeContext)>>,
}

impl RecordingHook {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn events(&self) -> Vec<RelationEvent> {
        self.events.lock().unwrap().iter().map(|(e, _)| *e).collect()
    }

    pub fn contexts(&self) -> Vec<CascadeContext> {
        self.events.lock().unwrap().iter().map(|(_, c)| *c).collect()
    }

    pub fn clear(&self) {
        self.events.lock().unwrap().clear();
    }
}

impl RelationHook for RecordingHook {
    fn on_relation_changed(
        &self,
        event: &RelationEvent,
        ctx: &CascadeContext,
    ) -> armory::Result<()> {
        self.events.lock().unwrap().push((*event, *ctx));
        Ok(())
    }
}

/// In-memory instance with a [`RecordingHook`] attached.
pub async fn test_armory_with_hook() -> (Armory, Arc<RecordingHook>) {
    let hook = RecordingHook::new();
    let armory = test_builder()
        .hook(hook.clone())
        .in_memory()
        .await
        .expect("Failed to build in-memory armory");
    (armory, hook)
}
