//! Prefab catalog describing how each entity tag is materialised.

use std::collections::BTreeMap;

use rooftop_runner_core::{
    EntityCategory, EntityTag, Hitbox, PowerUpKind, COIN_TAG, DOUBLE_JUMP_TAG, OBSTACLE_TAG,
    SHIELD_TAG,
};
use serde::{Deserialize, Serialize};

/// Payload cloned into every entity of a tag.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EntityBody {
    /// Collision class of the entity.
    pub category: EntityCategory,
    /// Collision box of the entity.
    pub hitbox: Hitbox,
}

/// Catalog line binding a tag to its prefab and pool size.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    /// Category key shared with the spawner.
    pub tag: EntityTag,
    /// Collision class assigned to entities of the tag.
    pub category: EntityCategory,
    /// Collision box assigned to entities of the tag.
    #[serde(default)]
    pub hitbox: Hitbox,
    /// Initial pool size; tags without a size are instantiated directly.
    #[serde(default)]
    pub pool_size: Option<usize>,
}

impl CatalogEntry {
    /// Body cloned into entities of this tag.
    #[must_use]
    pub const fn body(&self) -> EntityBody {
        EntityBody {
            category: self.category,
            hitbox: self.hitbox,
        }
    }
}

/// Catalog matching the stock obstacle, coin and power-up prefabs.
#[must_use]
pub fn default_catalog() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            tag: EntityTag::from(OBSTACLE_TAG),
            category: EntityCategory::Obstacle,
            hitbox: Hitbox::new(0.5, 1.0),
            pool_size: Some(10),
        },
        CatalogEntry {
            tag: EntityTag::from(COIN_TAG),
            category: EntityCategory::Coin,
            hitbox: Hitbox::new(0.4, 0.4),
            pool_size: Some(30),
        },
        CatalogEntry {
            tag: EntityTag::from(SHIELD_TAG),
            category: EntityCategory::PowerUp(PowerUpKind::Shield),
            hitbox: Hitbox::new(0.5, 0.5),
            pool_size: Some(3),
        },
        CatalogEntry {
            tag: EntityTag::from(DOUBLE_JUMP_TAG),
            category: EntityCategory::PowerUp(PowerUpKind::DoubleJump),
            hitbox: Hitbox::new(0.5, 0.5),
            pool_size: Some(3),
        },
    ]
}

/// Lookup of prefab bodies used for unpooled fallback instantiation.
#[derive(Debug, Default)]
pub(crate) struct Catalog {
    bodies: BTreeMap<EntityTag, EntityBody>,
}

impl Catalog {
    pub(crate) fn from_entries(entries: &[CatalogEntry]) -> Self {
        let bodies = entries
            .iter()
            .map(|entry| (entry.tag.clone(), entry.body()))
            .collect();
        Self { bodies }
    }

    pub(crate) fn body(&self, tag: &EntityTag) -> Option<EntityBody> {
        self.bodies.get(tag).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_catalog_covers_every_spawn_tag() {
        let catalog = Catalog::from_entries(&default_catalog());
        for tag in [OBSTACLE_TAG, COIN_TAG, SHIELD_TAG, DOUBLE_JUMP_TAG] {
            assert!(
                catalog.body(&EntityTag::from(tag)).is_some(),
                "missing prefab for {tag}"
            );
        }
    }

    #[test]
    fn power_up_tags_resolve_to_their_kind() {
        let catalog = Catalog::from_entries(&default_catalog());
        let body = catalog
            .body(&EntityTag::from(DOUBLE_JUMP_TAG))
            .expect("double jump prefab");
        assert_eq!(
            body.category,
            EntityCategory::PowerUp(PowerUpKind::DoubleJump)
        );
    }
}
