//! Items and rarity tiers.

use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::npc::double_option;
use super::{default_full, normalize_label, Entity, EntityData, EntityRecord};
use crate::store::EntityStore;
use crate::types::EntityKind;

/// Rarity tier of an item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Rarity {
    /// Everyday goods.
    #[default]
    Common,
    /// Somewhat hard to find.
    Uncommon,
    /// Rarely seen.
    Rare,
    /// One of a handful.
    Epic,
    /// The stuff of legend.
    Legendary,
}

impl Rarity {
    /// The value band documented for this tier.
    #[must_use]
    pub fn value_band(self) -> RangeInclusive<f32> {
        match self {
            Self::Common => 0.0..=50.0,
            Self::Uncommon => 25.0..=200.0,
            Self::Rare => 100.0..=1_000.0,
            Self::Epic => 500.0..=5_000.0,
            Self::Legendary => 2_000.0..=f32::MAX,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Epic => "epic",
            Self::Legendary => "legendary",
        }
    }
}

impl From<String> for Rarity {
    fn from(raw: String) -> Self {
        match normalize_label(&raw).as_str() {
            "uncommon" => Self::Uncommon,
            "rare" => Self::Rare,
            "epic" | "very_rare" => Self::Epic,
            "legendary" | "artifact" | "mythic" => Self::Legendary,
            _ => Self::Common,
        }
    }
}

impl From<Rarity> for String {
    fn from(value: Rarity) -> Self {
        value.as_str().to_string()
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A physical object, lying at a location or held by someone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default)]
    pub description: String,
    /// Category, e.g. "weapon".
    #[serde(default)]
    pub item_type: String,
    /// Value in coin.
    #[serde(default)]
    pub value: f32,
    /// Weight in pounds.
    #[serde(default)]
    pub weight: f32,
    /// Condition in [0, 100].
    #[serde(default = "default_full")]
    pub durability: f32,
    /// Rarity tier.
    #[serde(default)]
    pub rarity: Rarity,
    /// Id of the location the item lies at.
    #[serde(default)]
    pub location: Option<String>,
    /// Id of the holder (an NPC id or `"player"`).
    #[serde(default)]
    pub owner: Option<String>,
}

impl Item {
    /// Create a common, unplaced item.
    #[must_use]
    pub fn new(name: impl Into<String>, value: f32, weight: f32) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            item_type: String::new(),
            value,
            weight,
            durability: 100.0,
            rarity: Rarity::Common,
            location: None,
            owner: None,
        }
    }

    /// Set the rarity tier.
    #[must_use]
    pub fn with_rarity(mut self, rarity: Rarity) -> Self {
        self.rarity = rarity;
        self
    }

    /// Give the item to a holder.
    #[must_use]
    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }
}

/// Partial update for an [`Item`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ItemPatch {
    /// New display name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
    /// New category.
    pub item_type: Option<String>,
    /// New value.
    pub value: Option<f32>,
    /// New weight.
    pub weight: Option<f32>,
    /// New durability.
    pub durability: Option<f32>,
    /// New rarity.
    pub rarity: Option<Rarity>,
    /// New location; `Some(None)` clears it.
    #[serde(default, with = "double_option")]
    pub location: Option<Option<String>>,
    /// New owner; `Some(None)` clears it.
    #[serde(default, with = "double_option")]
    pub owner: Option<Option<String>>,
}

impl EntityData for Item {
    const KIND: EntityKind = EntityKind::Item;
    type Patch = ItemPatch;

    fn name(&self) -> &str {
        &self.name
    }

    fn apply_patch(&mut self, patch: ItemPatch) {
        if let Some(name) = patch.name {
            self.name = name;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(item_type) = patch.item_type {
            self.item_type = item_type;
        }
        if let Some(value) = patch.value {
            self.value = value;
        }
        if let Some(weight) = patch.weight {
            self.weight = weight;
        }
        if let Some(durability) = patch.durability {
            self.durability = durability;
        }
        if let Some(rarity) = patch.rarity {
            self.rarity = rarity;
        }
        if let Some(location) = patch.location {
            self.location = location;
        }
        if let Some(owner) = patch.owner {
            self.owner = owner;
        }
    }

    fn into_entity(record: EntityRecord<Self>) -> Entity {
        Entity::Item(record)
    }

    fn collection(store: &EntityStore) -> &BTreeMap<String, EntityRecord<Self>> {
        &store.items
    }

    fn collection_mut(store: &mut EntityStore) -> &mut BTreeMap<String, EntityRecord<Self>> {
        &mut store.items
    }
}
