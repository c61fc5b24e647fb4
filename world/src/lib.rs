#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Rooftop Runner.
//!
//! The world owns the game session (lifecycle, speed curve, score and running
//! time) together with every entity currently scrolling through the scene.
//! It is mutated exclusively through [`apply`] and observed through the
//! [`query`] module.

mod catalog;

use std::time::Duration;

use rooftop_runner_core::{Command, EntityId, EntityTag, Event, SessionState, WorldPoint};
use rooftop_runner_pool::EntityPool;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace, warn};

use self::catalog::Catalog;
pub use self::catalog::{default_catalog, CatalogEntry, EntityBody};

/// Tuning knobs for the session state machine and the entity registry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Scroll speed applied when a run starts, in world units per second.
    pub initial_speed: f32,
    /// Hard ceiling for the scroll speed.
    pub max_speed: f32,
    /// Fractional speed gain applied whenever the increase interval elapses.
    pub speed_increase_rate: f32,
    /// Running time between two speed increases, in milliseconds.
    pub speed_increase_interval_ms: u64,
    /// Screen-space x behind which active entities are swept back to the pool.
    pub despawn_line_x: f32,
    /// Prefabs and pool sizes for every entity tag.
    pub catalog: Vec<CatalogEntry>,
}

impl Tuning {
    /// Running time between two speed increases.
    #[must_use]
    pub fn speed_increase_interval(&self) -> Duration {
        Duration::from_millis(self.speed_increase_interval_ms)
    }
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            initial_speed: 5.0,
            max_speed: 20.0,
            speed_increase_rate: 0.1,
            speed_increase_interval_ms: 1_000,
            despawn_line_x: -43.0,
            catalog: default_catalog(),
        }
    }
}

/// Represents the authoritative Rooftop Runner world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    tuning: Tuning,
    state: SessionState,
    speed: f32,
    score: u32,
    elapsed: Duration,
    speed_timer: Duration,
    tick_index: u64,
    pool: EntityPool<EntityBody>,
    catalog: Catalog,
}

impl World {
    /// Creates a new world using the stock tuning.
    #[must_use]
    pub fn new() -> Self {
        Self::with_tuning(Tuning::default())
    }

    /// Creates a new world with the provided tuning and pre-filled pools.
    #[must_use]
    pub fn with_tuning(tuning: Tuning) -> Self {
        let mut pool = EntityPool::new();
        for entry in &tuning.catalog {
            if let Some(size) = entry.pool_size {
                pool.register(entry.tag.clone(), entry.body(), size);
            }
        }
        let catalog = Catalog::from_entries(&tuning.catalog);

        Self {
            banner: rooftop_runner_core::WELCOME_BANNER,
            state: SessionState::Idle,
            speed: tuning.initial_speed,
            score: 0,
            elapsed: Duration::ZERO,
            speed_timer: Duration::ZERO,
            tick_index: 0,
            pool,
            catalog,
            tuning,
        }
    }

    fn reset_session_values(&mut self) {
        self.speed = self.tuning.initial_speed;
        self.score = 0;
        self.elapsed = Duration::ZERO;
        self.speed_timer = Duration::ZERO;
    }

    fn advance(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        self.elapsed = self.elapsed.saturating_add(dt);
        out_events.push(Event::TimeAdvanced { dt });
        out_events.push(Event::TimeChanged {
            elapsed: self.elapsed,
        });

        self.speed_timer = self.speed_timer.saturating_add(dt);
        if self.speed_timer >= self.tuning.speed_increase_interval() {
            self.speed_timer = Duration::ZERO;
            let next = (self.speed * (1.0 + self.tuning.speed_increase_rate))
                .min(self.tuning.max_speed);
            if next > self.speed {
                self.speed = next;
                debug!(speed = self.speed, "scroll speed increased");
                out_events.push(Event::SpeedChanged { speed: self.speed });
            }
        }

        let dx = -self.speed * dt.as_secs_f32();
        for slot in self.pool.active_mut() {
            let moved = slot.position().translated(dx, 0.0);
            slot.set_position(moved);
        }
    }

    fn spawn(&mut self, tag: EntityTag, position: WorldPoint, out_events: &mut Vec<Event>) {
        let (entity, pooled) = match self.pool.acquire(&tag, position, 0.0) {
            Some(entity) => (entity, true),
            None => {
                let Some(body) = self.catalog.body(&tag) else {
                    warn!(%tag, "no prefab registered for tag, spawn skipped");
                    return;
                };
                (self.pool.instantiate(tag.clone(), body, position, 0.0), false)
            }
        };

        trace!(%tag, entity = entity.get(), pooled, x = position.x(), y = position.y(), "entity spawned");
        out_events.push(Event::EntitySpawned {
            entity,
            tag,
            position,
            pooled,
        });
    }

    fn release(&mut self, entity: EntityId, out_events: &mut Vec<Event>) {
        let Some(tag) = self.pool.get(entity).map(|slot| slot.tag().clone()) else {
            return;
        };
        if self.pool.release(entity) {
            trace!(%tag, entity = entity.get(), "entity released");
            out_events.push(Event::EntityReleased { entity, tag });
        }
    }

    fn release_where<F>(&mut self, predicate: F, out_events: &mut Vec<Event>)
    where
        F: Fn(WorldPoint) -> bool,
    {
        let doomed: Vec<EntityId> = self
            .pool
            .active()
            .filter(|slot| predicate(slot.position()))
            .map(|slot| slot.id())
            .collect();
        for entity in doomed {
            self.release(entity, out_events);
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Start => {
            if world.state != SessionState::Idle {
                debug!(state = ?world.state, "start ignored outside idle");
                return;
            }
            world.reset_session_values();
            world.state = SessionState::Running;
            info!(speed = world.speed, "session started");
            out_events.push(Event::Started);
        }
        Command::Pause => {
            if world.state == SessionState::Running {
                world.state = SessionState::Paused;
                info!("session paused");
                out_events.push(Event::Paused);
            }
        }
        Command::Resume => {
            if world.state == SessionState::Paused {
                world.state = SessionState::Running;
                info!("session resumed");
                out_events.push(Event::Resumed);
            }
        }
        Command::GameOver => {
            if matches!(world.state, SessionState::Running | SessionState::Paused) {
                world.state = SessionState::Over;
                info!(
                    score = world.score,
                    elapsed = world.elapsed.as_secs_f32(),
                    "session over"
                );
                out_events.push(Event::GameOver);
            }
        }
        Command::Reset => {
            world.release_where(|_| true, out_events);
            world.reset_session_values();
            world.state = SessionState::Idle;
            info!("session reset");
            out_events.push(Event::SessionReset);
        }
        Command::AddScore { points } => {
            if points == 0 {
                return;
            }
            if !matches!(world.state, SessionState::Running | SessionState::Paused) {
                debug!(points, state = ?world.state, "score ignored outside a run");
                return;
            }
            world.score = world.score.saturating_add(points);
            out_events.push(Event::ScoreChanged { score: world.score });
        }
        Command::Tick { dt } => {
            if world.state == SessionState::Running {
                world.advance(dt, out_events);
            }
        }
        Command::SpawnEntity { tag, position } => world.spawn(tag, position, out_events),
        Command::ReleaseEntity { entity } => world.release(entity, out_events),
        Command::SweepEntities => {
            let line = world.tuning.despawn_line_x;
            world.release_where(|position| position.x() < line, out_events);
        }
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use super::{EntityBody, Tuning, World};
    use rooftop_runner_core::{
        EntityId, EntitySnapshot, EntityView, SessionSnapshot, SessionState,
    };
    use rooftop_runner_pool::{EntityPool, PooledEntity};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Captures the session values owned by the state machine.
    #[must_use]
    pub fn session(world: &World) -> SessionSnapshot {
        SessionSnapshot {
            state: world.state,
            speed: world.speed,
            score: world.score,
            elapsed: world.elapsed,
        }
    }

    /// Lifecycle state of the session.
    #[must_use]
    pub fn state(world: &World) -> SessionState {
        world.state
    }

    /// Current scroll speed.
    #[must_use]
    pub fn speed(world: &World) -> f32 {
        world.speed
    }

    /// Points accumulated during the run.
    #[must_use]
    pub fn score(world: &World) -> u32 {
        world.score
    }

    /// Running time accumulated during the run.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.elapsed
    }

    /// Number of running ticks processed since the world was created.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Tuning the world was created with.
    #[must_use]
    pub fn tuning(world: &World) -> &Tuning {
        &world.tuning
    }

    /// Read-only access to the entity pool.
    #[must_use]
    pub fn pool(world: &World) -> &EntityPool<EntityBody> {
        &world.pool
    }

    /// Captures a read-only view of the active entities.
    #[must_use]
    pub fn entity_view(world: &World) -> EntityView {
        EntityView::from_snapshots(world.pool.active().map(snapshot).collect())
    }

    /// Captures a single active entity.
    #[must_use]
    pub fn entity(world: &World, id: EntityId) -> Option<EntitySnapshot> {
        world
            .pool
            .get(id)
            .filter(|slot| slot.is_active())
            .map(snapshot)
    }

    fn snapshot(slot: &PooledEntity<EntityBody>) -> EntitySnapshot {
        EntitySnapshot {
            id: slot.id(),
            tag: slot.tag().clone(),
            category: slot.body().category,
            position: slot.position(),
            hitbox: slot.body().hitbox,
            pooled: slot.is_pooled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tick(world: &mut World, millis: u64) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::Tick {
                dt: Duration::from_millis(millis),
            },
            &mut events,
        );
        events
    }

    #[test]
    fn ticks_are_ignored_until_started() {
        let mut world = World::new();
        assert!(tick(&mut world, 16).is_empty());
        assert_eq!(query::elapsed(&world), Duration::ZERO);
        assert_eq!(query::tick_index(&world), 0);
    }

    #[test]
    fn speed_timer_resets_instead_of_carrying_remainder() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::Start, &mut events);

        let _ = tick(&mut world, 1_500);
        assert!((query::speed(&world) - 5.5).abs() < 1e-4);

        let events = tick(&mut world, 600);
        assert!(
            !events
                .iter()
                .any(|event| matches!(event, Event::SpeedChanged { .. })),
            "the leftover 500ms must not count toward the next interval"
        );
    }

    #[test]
    fn speed_saturates_silently_at_maximum() {
        let mut world = World::with_tuning(Tuning {
            initial_speed: 19.0,
            ..Tuning::default()
        });
        let mut events = Vec::new();
        apply(&mut world, Command::Start, &mut events);

        let first = tick(&mut world, 1_000);
        assert!(first.contains(&Event::SpeedChanged { speed: 20.0 }));

        let second = tick(&mut world, 1_000);
        assert!(!second
            .iter()
            .any(|event| matches!(event, Event::SpeedChanged { .. })));
        assert!((query::speed(&world) - 20.0).abs() < f32::EPSILON);
    }

    #[test]
    fn active_entities_scroll_with_speed() {
        let mut world = World::new();
        let mut events = Vec::new();
        apply(&mut world, Command::Start, &mut events);
        apply(
            &mut world,
            Command::SpawnEntity {
                tag: EntityTag::from("Obstacle"),
                position: WorldPoint::new(50.0, -12.59),
            },
            &mut events,
        );

        let _ = tick(&mut world, 500);

        let view = query::entity_view(&world);
        let obstacle = view.iter().next().expect("obstacle remains active");
        assert!((obstacle.position.x() - 47.5).abs() < 1e-4);
    }
}
