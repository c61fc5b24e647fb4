#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reusable entity pool partitioned by category tag.
//!
//! Every registered tag owns a FIFO queue of idle slots. Acquiring pops the
//! oldest released slot, and releasing pushes the slot to the back of its
//! queue, so the active set and the idle queues never share an entity. Pools
//! grow on demand instead of rejecting requests once a tag runs dry.

use std::collections::{BTreeMap, VecDeque};

use rooftop_runner_core::{EntityId, EntityTag, WorldPoint};
use tracing::{debug, trace};

/// Container an entity is parented to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Holder {
    /// The entity lives in the scene and takes part in the simulation.
    Scene,
    /// The entity is parked in the pool's neutral holding area.
    Holding,
}

/// Slot owned by the pool together with its cloned payload.
#[derive(Clone, Debug)]
pub struct PooledEntity<T> {
    id: EntityId,
    tag: EntityTag,
    active: bool,
    pooled: bool,
    usable: bool,
    holder: Holder,
    position: WorldPoint,
    rotation: f32,
    body: T,
}

impl<T> PooledEntity<T> {
    fn new(id: EntityId, tag: EntityTag, body: T, pooled: bool) -> Self {
        Self {
            id,
            tag,
            active: false,
            pooled,
            usable: true,
            holder: Holder::Holding,
            position: WorldPoint::default(),
            rotation: 0.0,
            body,
        }
    }

    /// Identity of the slot.
    #[must_use]
    pub const fn id(&self) -> EntityId {
        self.id
    }

    /// Category key the slot belongs to.
    #[must_use]
    pub fn tag(&self) -> &EntityTag {
        &self.tag
    }

    /// Reports whether the slot is currently handed out.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Reports whether the slot returns to an idle queue when released.
    #[must_use]
    pub const fn is_pooled(&self) -> bool {
        self.pooled
    }

    /// Reports whether the slot can still be handed out.
    #[must_use]
    pub const fn is_usable(&self) -> bool {
        self.usable
    }

    /// Container the slot is parented to.
    #[must_use]
    pub const fn holder(&self) -> Holder {
        self.holder
    }

    /// Position assigned on the latest acquisition or move.
    #[must_use]
    pub const fn position(&self) -> WorldPoint {
        self.position
    }

    /// Orientation assigned on the latest acquisition, in radians.
    #[must_use]
    pub const fn rotation(&self) -> f32 {
        self.rotation
    }

    /// Payload cloned from the tag's prefab.
    #[must_use]
    pub const fn body(&self) -> &T {
        &self.body
    }

    /// Moves the slot to a new position.
    pub fn set_position(&mut self, position: WorldPoint) {
        self.position = position;
    }

    fn activate(&mut self, position: WorldPoint, rotation: f32) {
        self.active = true;
        self.holder = Holder::Scene;
        self.position = position;
        self.rotation = rotation;
    }

    fn deactivate(&mut self) {
        self.active = false;
        self.holder = Holder::Holding;
    }
}

/// Tag-keyed pool of reusable entities.
#[derive(Debug)]
pub struct EntityPool<T> {
    slots: BTreeMap<EntityId, PooledEntity<T>>,
    idle: BTreeMap<EntityTag, VecDeque<EntityId>>,
    prefabs: BTreeMap<EntityTag, T>,
    next_id: u32,
}

impl<T> Default for EntityPool<T> {
    fn default() -> Self {
        Self {
            slots: BTreeMap::new(),
            idle: BTreeMap::new(),
            prefabs: BTreeMap::new(),
            next_id: 0,
        }
    }
}

impl<T: Clone> EntityPool<T> {
    /// Creates an empty pool without registered tags.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tag with its prefab and pre-allocates `size` idle slots.
    ///
    /// Registering an existing tag replaces its prefab and adds `size` more
    /// idle slots.
    pub fn register(&mut self, tag: EntityTag, prefab: T, size: usize) {
        let _ = self.prefabs.insert(tag.clone(), prefab.clone());
        let _ = self.idle.entry(tag.clone()).or_default();
        for _ in 0..size {
            let id = self.insert_slot(tag.clone(), prefab.clone(), true);
            self.idle.entry(tag.clone()).or_default().push_back(id);
        }
        debug!(%tag, size, "registered entity pool");
    }

    /// Hands out an entity of the requested tag at the provided placement.
    ///
    /// Returns `None` when the tag was never registered. A stale idle slot is
    /// discarded and replaced by a fresh instance, and an empty idle queue
    /// grows the pool.
    pub fn acquire(
        &mut self,
        tag: &EntityTag,
        position: WorldPoint,
        rotation: f32,
    ) -> Option<EntityId> {
        let Some(prefab) = self.prefabs.get(tag) else {
            trace!(%tag, "acquire requested for unknown tag");
            return None;
        };
        let prefab = prefab.clone();

        let id = match self.dequeue(tag) {
            Some(id) if self.slots.get(&id).is_some_and(|slot| slot.usable) => id,
            Some(stale) => {
                let _ = self.slots.remove(&stale);
                debug!(%tag, entity = stale.get(), "replaced stale pooled entity");
                self.insert_slot(tag.clone(), prefab, true)
            }
            None => {
                let id = self.insert_slot(tag.clone(), prefab, true);
                debug!(%tag, entity = id.get(), "pool exhausted, allocated new entity");
                id
            }
        };

        let slot = self.slots.get_mut(&id)?;
        slot.activate(position, rotation);
        Some(id)
    }

    /// Creates an active entity that bypasses pooling entirely.
    ///
    /// Releasing such an entity destroys it.
    pub fn instantiate(
        &mut self,
        tag: EntityTag,
        body: T,
        position: WorldPoint,
        rotation: f32,
    ) -> EntityId {
        let id = self.insert_slot(tag, body, false);
        if let Some(slot) = self.slots.get_mut(&id) {
            slot.activate(position, rotation);
        }
        id
    }
}

impl<T> EntityPool<T> {
    /// Deactivates an entity and parks it in the holding area.
    ///
    /// Returns `false` when the entity is unknown or already idle, which makes
    /// repeated releases harmless.
    pub fn release(&mut self, id: EntityId) -> bool {
        let Some(slot) = self.slots.get_mut(&id) else {
            return false;
        };
        if !slot.active {
            return false;
        }

        if !slot.pooled || !slot.usable {
            let _ = self.slots.remove(&id);
            return true;
        }

        slot.deactivate();
        self.idle
            .entry(slot.tag.clone())
            .or_default()
            .push_back(id);
        true
    }

    /// Flags a slot as unusable so the next acquisition replaces it.
    pub fn invalidate(&mut self, id: EntityId) -> bool {
        match self.slots.get_mut(&id) {
            Some(slot) => {
                slot.usable = false;
                true
            }
            None => false,
        }
    }

    /// Looks up a slot by identity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&PooledEntity<T>> {
        self.slots.get(&id)
    }

    /// Looks up a slot by identity for mutation.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut PooledEntity<T>> {
        self.slots.get_mut(&id)
    }

    /// Iterator over active slots in identifier order.
    pub fn active(&self) -> impl Iterator<Item = &PooledEntity<T>> {
        self.slots.values().filter(|slot| slot.active)
    }

    /// Mutable iterator over active slots in identifier order.
    pub fn active_mut(&mut self) -> impl Iterator<Item = &mut PooledEntity<T>> {
        self.slots.values_mut().filter(|slot| slot.active)
    }

    /// Identifiers waiting in the tag's idle queue, oldest first.
    pub fn idle_ids<'a>(&'a self, tag: &EntityTag) -> impl Iterator<Item = EntityId> + 'a {
        self.idle
            .get(tag)
            .into_iter()
            .flat_map(|queue| queue.iter().copied())
    }

    /// Number of idle slots queued for the tag.
    #[must_use]
    pub fn idle_count(&self, tag: &EntityTag) -> usize {
        self.idle.get(tag).map_or(0, VecDeque::len)
    }

    /// Number of live slots of the tag, active or idle.
    #[must_use]
    pub fn allocated_count(&self, tag: &EntityTag) -> usize {
        self.slots.values().filter(|slot| &slot.tag == tag).count()
    }

    /// Number of active slots across every tag.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active().count()
    }

    /// Reports whether the tag has a registered prefab.
    #[must_use]
    pub fn is_registered(&self, tag: &EntityTag) -> bool {
        self.prefabs.contains_key(tag)
    }

    /// Prefab registered for the tag.
    #[must_use]
    pub fn prefab(&self, tag: &EntityTag) -> Option<&T> {
        self.prefabs.get(tag)
    }

    /// Tears the pool down, dropping every slot and registration.
    pub fn clear(&mut self) {
        self.slots.clear();
        self.idle.clear();
        self.prefabs.clear();
    }

    fn dequeue(&mut self, tag: &EntityTag) -> Option<EntityId> {
        self.idle.get_mut(tag)?.pop_front()
    }

    fn insert_slot(&mut self, tag: EntityTag, body: T, pooled: bool) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        let _ = self
            .slots
            .insert(id, PooledEntity::new(id, tag, body, pooled));
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partitioned(pool: &EntityPool<u8>, tag: &EntityTag) {
        let idle: Vec<EntityId> = pool.idle_ids(tag).collect();
        for id in &idle {
            let slot = pool.get(*id).expect("idle id must be allocated");
            assert!(!slot.is_active(), "idle slot {} is active", id.get());
            assert_eq!(slot.holder(), Holder::Holding);
        }
        let active = pool.active().filter(|slot| slot.tag() == tag).count();
        assert_eq!(active + idle.len(), pool.allocated_count(tag));
    }

    #[test]
    fn active_and_idle_sets_stay_disjoint() {
        let tag = EntityTag::from("Coin");
        let mut pool = EntityPool::new();
        pool.register(tag.clone(), 0u8, 3);
        assert_partitioned(&pool, &tag);

        let mut handed_out = Vec::new();
        for index in 0..5 {
            let position = WorldPoint::new(index as f32, 0.0);
            let id = pool.acquire(&tag, position, 0.0).expect("known tag");
            handed_out.push(id);
            assert_partitioned(&pool, &tag);
        }
        assert_eq!(pool.allocated_count(&tag), 5);

        for id in handed_out.iter().step_by(2) {
            assert!(pool.release(*id));
            assert_partitioned(&pool, &tag);
        }
        assert!(!pool.release(handed_out[0]));
        assert_partitioned(&pool, &tag);
        assert_eq!(pool.idle_count(&tag), 3);
    }

    #[test]
    fn released_stale_slot_is_discarded() {
        let tag = EntityTag::from("Obstacle");
        let mut pool = EntityPool::new();
        pool.register(tag.clone(), 1u8, 1);
        let id = pool
            .acquire(&tag, WorldPoint::default(), 0.0)
            .expect("known tag");
        assert!(pool.invalidate(id));
        assert!(pool.release(id));
        assert!(pool.get(id).is_none());
        assert_eq!(pool.idle_count(&tag), 0);
    }
}
