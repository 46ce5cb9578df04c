//! Item definitions for every catalog kind.
//!
//! Each struct is the client-editable body of an item; ids and timestamps are
//! attached by [`Record`](super::Record) when the item is read back.

use serde::{Deserialize, Serialize};

use super::{CatalogItem, ItemId, ItemKind};

/// How an item is acquired in game.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    #[default]
    Store,
    Pass,
    Other,
}

impl Source {
    /// Currency the item's `cost` is denominated in.
    pub fn currency(&self) -> &'static str {
        match self {
            Source::Pass => "Medals",
            Source::Store | Source::Other => "Super Credits",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArmorCategory {
    Light,
    Medium,
    Heavy,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Helmet {
    pub name: String,
    #[serde(default)]
    pub name_pt_br: Option<String>,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub cost: i64,
    /// Battle pass the helmet is unlocked from.
    #[serde(default)]
    pub pass_id: Option<ItemId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cape {
    pub name: String,
    #[serde(default)]
    pub name_pt_br: Option<String>,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub pass_id: Option<ItemId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Armor {
    pub name: String,
    #[serde(default)]
    pub name_pt_br: Option<String>,
    pub category: ArmorCategory,
    /// Armor rating as displayed in game.
    #[serde(default)]
    pub armor: String,
    #[serde(default)]
    pub speed: String,
    #[serde(default)]
    pub stamina: String,
    #[serde(default)]
    pub passive_id: Option<ItemId>,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub pass_id: Option<ItemId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Passive {
    pub name: String,
    #[serde(default)]
    pub name_pt_br: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub effect: String,
}

/// Page-based unlock track shared by warbonds and battle passes.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PassPricing {
    #[serde(default)]
    pub earnable_credits: i64,
    #[serde(default)]
    pub medal_cost_all_pages: i64,
    #[serde(default)]
    pub medal_cost_all_items: i64,
    #[serde(default)]
    pub page_count: i64,
    #[serde(default)]
    pub super_credit_cost: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Warbond {
    pub name: String,
    #[serde(default)]
    pub name_pt_br: Option<String>,
    #[serde(flatten)]
    pub pricing: PassPricing,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BattlePass {
    pub name: String,
    #[serde(default)]
    pub name_pt_br: Option<String>,
    #[serde(flatten)]
    pub pricing: PassPricing,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Booster {
    pub name: String,
    #[serde(default)]
    pub name_pt_br: Option<String>,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub warbond_id: Option<ItemId>,
    #[serde(default)]
    pub cost: i64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Stratagem {
    pub name: String,
    #[serde(default)]
    pub name_pt_br: Option<String>,
    pub department: String,
    /// Directional input sequence, e.g. `["up", "down", "right"]`.
    #[serde(default)]
    pub codex: Vec<String>,
    /// Cooldown in seconds.
    #[serde(default)]
    pub cooldown: i64,
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub unlock_level: i64,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Acid,
    Arc,
    #[default]
    Ballistic,
    Explosion,
    Fire,
    Impact,
    Laser,
    Melee,
    Gas,
}

/// Stats shared by primary, secondary and throwable weapons.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WeaponStats {
    pub weapon_type: String,
    #[serde(default)]
    pub damage_value: i64,
    #[serde(default)]
    pub damage_type: DamageType,
    /// 0 (no hitbox) through 12 (indestructible).
    #[serde(default)]
    pub max_penetration: u8,
    #[serde(default)]
    pub source: Source,
    #[serde(default)]
    pub cost: i64,
    #[serde(default)]
    pub warbond_id: Option<ItemId>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrimaryWeapon {
    pub name: String,
    #[serde(default)]
    pub name_pt_br: Option<String>,
    #[serde(flatten)]
    pub stats: WeaponStats,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SecondaryWeapon {
    pub name: String,
    #[serde(default)]
    pub name_pt_br: Option<String>,
    #[serde(flatten)]
    pub stats: WeaponStats,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Throwable {
    pub name: String,
    #[serde(default)]
    pub name_pt_br: Option<String>,
    #[serde(flatten)]
    pub stats: WeaponStats,
}

impl CatalogItem for Helmet {
    const KIND: ItemKind = ItemKind::Helmet;

    fn name(&self) -> &str {
        &self.name
    }

    fn references(&self) -> Vec<(&'static str, ItemKind, ItemId)> {
        self.pass_id
            .map(|id| ("pass_id", ItemKind::BattlePass, id))
            .into_iter()
            .collect()
    }

    fn cost(&self) -> i64 {
        self.cost
    }
}

impl CatalogItem for Cape {
    const KIND: ItemKind = ItemKind::Cape;

    fn name(&self) -> &str {
        &self.name
    }

    fn references(&self) -> Vec<(&'static str, ItemKind, ItemId)> {
        self.pass_id
            .map(|id| ("pass_id", ItemKind::BattlePass, id))
            .into_iter()
            .collect()
    }

    fn cost(&self) -> i64 {
        self.cost
    }
}

impl CatalogItem for Armor {
    const KIND: ItemKind = ItemKind::Armor;

    fn name(&self) -> &str {
        &self.name
    }

    fn references(&self) -> Vec<(&'static str, ItemKind, ItemId)> {
        let mut refs = Vec::new();
        if let Some(id) = self.passive_id {
            refs.push(("passive_id", ItemKind::Passive, id));
        }
        if let Some(id) = self.pass_id {
            refs.push(("pass_id", ItemKind::BattlePass, id));
        }
        refs
    }

    fn cost(&self) -> i64 {
        self.cost
    }
}

impl CatalogItem for Passive {
    const KIND: ItemKind = ItemKind::Passive;

    fn name(&self) -> &str {
        &self.name
    }
}

impl CatalogItem for Warbond {
    const KIND: ItemKind = ItemKind::Warbond;

    fn name(&self) -> &str {
        &self.name
    }

    fn cost(&self) -> i64 {
        self.pricing.super_credit_cost
    }
}

impl CatalogItem for BattlePass {
    const KIND: ItemKind = ItemKind::BattlePass;

    fn name(&self) -> &str {
        &self.name
    }

    fn cost(&self) -> i64 {
        self.pricing.super_credit_cost
    }
}

impl CatalogItem for Booster {
    const KIND: ItemKind = ItemKind::Booster;

    fn name(&self) -> &str {
        &self.name
    }

    fn references(&self) -> Vec<(&'static str, ItemKind, ItemId)> {
        self.warbond_id
            .map(|id| ("warbond_id", ItemKind::Warbond, id))
            .into_iter()
            .collect()
    }

    fn cost(&self) -> i64 {
        self.cost
    }
}

impl CatalogItem for Stratagem {
    const KIND: ItemKind = ItemKind::Stratagem;

    fn name(&self) -> &str {
        &self.name
    }

    fn cost(&self) -> i64 {
        self.cost
    }
}

fn weapon_references(stats: &WeaponStats) -> Vec<(&'static str, ItemKind, ItemId)> {
    stats
        .warbond_id
        .map(|id| ("warbond_id", ItemKind::Warbond, id))
        .into_iter()
        .collect()
}

impl CatalogItem for PrimaryWeapon {
    const KIND: ItemKind = ItemKind::PrimaryWeapon;

    fn name(&self) -> &str {
        &self.name
    }

    fn references(&self) -> Vec<(&'static str, ItemKind, ItemId)> {
        weapon_references(&self.stats)
    }

    fn cost(&self) -> i64 {
        self.stats.cost
    }
}

impl CatalogItem for SecondaryWeapon {
    const KIND: ItemKind = ItemKind::SecondaryWeapon;

    fn name(&self) -> &str {
        &self.name
    }

    fn references(&self) -> Vec<(&'static str, ItemKind, ItemId)> {
        weapon_references(&self.stats)
    }

    fn cost(&self) -> i64 {
        self.stats.cost
    }
}

impl CatalogItem for Throwable {
    const KIND: ItemKind = ItemKind::Throwable;

    fn name(&self) -> &str {
        &self.name
    }

    fn references(&self) -> Vec<(&'static str, ItemKind, ItemId)> {
        weapon_references(&self.stats)
    }

    fn cost(&self) -> i64 {
        self.stats.cost
    }
}
