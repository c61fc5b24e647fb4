#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Rooftop Runner engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters and systems submit
//! [`Command`] values describing desired mutations, the world executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! for systems to react to deterministically. Systems consume event streams,
//! query immutable snapshots, and respond with new command batches or, for the
//! effect and player systems, with events of their own.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Rooftop Runner.";

/// Pool tag shared by every obstacle entity.
pub const OBSTACLE_TAG: &str = "Obstacle";
/// Pool tag shared by every coin entity.
pub const COIN_TAG: &str = "Coin";
/// Pool tag shared by shield power-up entities.
pub const SHIELD_TAG: &str = "Shield";
/// Pool tag shared by double-jump power-up entities.
pub const DOUBLE_JUMP_TAG: &str = "DoubleJump";

/// Lifecycle state of the game session.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No run is in progress; the session waits for a start request.
    #[default]
    Idle,
    /// The run is advancing and reacting to ticks.
    Running,
    /// The run is suspended; ticks are ignored until resumed.
    Paused,
    /// The run ended; only a reset returns the session to idle.
    Over,
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Starts a new run from the idle state.
    Start,
    /// Suspends a running session.
    Pause,
    /// Resumes a paused session.
    Resume,
    /// Ends the current run.
    GameOver,
    /// Restores idle values and asks dependants to drop their transient state.
    Reset,
    /// Adds the provided number of points to the score.
    AddScore {
        /// Points awarded; a zero increment is ignored.
        points: u32,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Requests that an entity with the given tag be materialised.
    SpawnEntity {
        /// Category key used to select the pool and prefab.
        tag: EntityTag,
        /// Screen-space position the entity should occupy.
        position: WorldPoint,
    },
    /// Returns an entity to its pool, or destroys it when it was never pooled.
    ReleaseEntity {
        /// Identifier of the entity being released.
        entity: EntityId,
    },
    /// Releases every active entity that scrolled past the despawn line.
    SweepEntities,
}

/// Events broadcast after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A new run started.
    Started,
    /// The running session was paused.
    Paused,
    /// The paused session resumed.
    Resumed,
    /// The run ended.
    GameOver,
    /// The session returned to idle and dependants must reset.
    SessionReset,
    /// Indicates that the running simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Reports the total running time of the current session.
    TimeChanged {
        /// Accumulated running time.
        elapsed: Duration,
    },
    /// Reports that the scroll speed changed.
    SpeedChanged {
        /// Scroll speed after the change, in world units per second.
        speed: f32,
    },
    /// Reports that the score changed.
    ScoreChanged {
        /// Score after the change.
        score: u32,
    },
    /// Confirms that an entity was materialised in the world.
    EntitySpawned {
        /// Identifier assigned to the entity.
        entity: EntityId,
        /// Category key of the entity.
        tag: EntityTag,
        /// Screen-space position the entity occupies.
        position: WorldPoint,
        /// Whether the entity was drawn from a pool rather than instantiated directly.
        pooled: bool,
    },
    /// Confirms that an entity left the world.
    EntityReleased {
        /// Identifier of the released entity.
        entity: EntityId,
        /// Category key of the released entity.
        tag: EntityTag,
    },
    /// Acknowledges that a timed effect was (re)armed.
    EffectActivated {
        /// Effect that became active.
        effect: EffectKind,
    },
    /// Acknowledges that a timed effect is inactive.
    EffectDeactivated {
        /// Effect that became inactive.
        effect: EffectKind,
    },
    /// The player left the ground or used a double jump.
    PlayerJumped {
        /// Whether the jump consumed the double-jump upgrade.
        double_jump: bool,
    },
    /// The player touched the ground after being airborne.
    PlayerLanded,
    /// The player hit an obstacle without protection.
    PlayerDied,
    /// The player picked up a coin.
    CoinCollected {
        /// Coin entity that was collected.
        entity: EntityId,
    },
    /// The player picked up a power-up.
    PowerUpCollected {
        /// Power-up entity that was collected.
        entity: EntityId,
        /// Kind of power-up that was collected.
        power_up: PowerUpKind,
    },
    /// The player passed through an obstacle while shielded.
    ObstacleAbsorbed {
        /// Obstacle entity that was absorbed.
        entity: EntityId,
    },
}

/// Unique identifier assigned to an entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Free-form category key partitioning pooled entities.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityTag(String);

impl EntityTag {
    /// Creates a tag from the provided name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name of the tag.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for EntityTag {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for EntityTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Position in the side-view plane, measured in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct WorldPoint {
    x: f32,
    y: f32,
}

impl WorldPoint {
    /// Creates a new point from its coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate; larger values lie further ahead of the player.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate; larger values lie higher above the ground.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Returns a copy of the point shifted by the provided offsets.
    #[must_use]
    pub fn translated(self, dx: f32, dy: f32) -> Self {
        Self::new(self.x + dx, self.y + dy)
    }

    /// Squared Euclidean distance between two points.
    #[must_use]
    pub fn distance_squared(self, other: WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }
}

/// Axis-aligned collision box centred on an entity position.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hitbox {
    /// Half of the box width in world units.
    pub half_width: f32,
    /// Half of the box height in world units.
    pub half_height: f32,
}

impl Hitbox {
    /// Creates a hitbox from its half extents.
    #[must_use]
    pub const fn new(half_width: f32, half_height: f32) -> Self {
        Self {
            half_width,
            half_height,
        }
    }

    /// Reports whether two boxes centred at the given points intersect.
    ///
    /// Boxes that merely touch along an edge do not overlap.
    #[must_use]
    pub fn overlaps(self, center: WorldPoint, other: Hitbox, other_center: WorldPoint) -> bool {
        let dx = (center.x() - other_center.x()).abs();
        let dy = (center.y() - other_center.y()).abs();
        dx < self.half_width + other.half_width && dy < self.half_height + other.half_height
    }
}

impl Default for Hitbox {
    fn default() -> Self {
        Self::new(0.5, 0.5)
    }
}

/// Collision class of a world entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityCategory {
    /// Lethal unless the player is shielded.
    Obstacle,
    /// Awards points on contact.
    Coin,
    /// Activates a timed effect on contact.
    PowerUp(PowerUpKind),
}

/// Closed set of collectible power-ups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Grants obstacle immunity for its duration.
    Shield,
    /// Grants one extra mid-air jump per airborne phase for its duration.
    DoubleJump,
}

impl PowerUpKind {
    /// Every power-up kind in declaration order.
    pub const ALL: [PowerUpKind; 2] = [PowerUpKind::Shield, PowerUpKind::DoubleJump];

    /// Effect activated when the power-up is collected.
    #[must_use]
    pub const fn effect(self) -> EffectKind {
        match self {
            Self::Shield => EffectKind::Shield,
            Self::DoubleJump => EffectKind::DoubleJump,
        }
    }
}

/// Timed buffs tracked by the effect scheduler.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectKind {
    /// Obstacle immunity.
    Shield,
    /// Mid-air jump upgrade.
    DoubleJump,
}

impl EffectKind {
    /// Every effect kind in declaration order.
    pub const ALL: [EffectKind; 2] = [EffectKind::Shield, EffectKind::DoubleJump];
}

/// Immutable copy of the session values owned by the state machine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SessionSnapshot {
    /// Lifecycle state of the session.
    pub state: SessionState,
    /// Current scroll speed in world units per second.
    pub speed: f32,
    /// Points accumulated during the run.
    pub score: u32,
    /// Running time accumulated during the run.
    pub elapsed: Duration,
}

/// Immutable representation of a single active entity used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct EntitySnapshot {
    /// Identifier assigned to the entity.
    pub id: EntityId,
    /// Category key of the entity.
    pub tag: EntityTag,
    /// Collision class of the entity.
    pub category: EntityCategory,
    /// Screen-space position of the entity.
    pub position: WorldPoint,
    /// Collision box of the entity.
    pub hitbox: Hitbox,
    /// Whether the entity belongs to a pool.
    pub pooled: bool,
}

/// Read-only snapshot describing all active entities.
#[derive(Clone, Debug, Default)]
pub struct EntityView {
    snapshots: Vec<EntitySnapshot>,
}

impl EntityView {
    /// Creates a new entity view from the provided snapshots.
    #[must_use]
    pub fn from_snapshots(mut snapshots: Vec<EntitySnapshot>) -> Self {
        snapshots.sort_by_key(|snapshot| snapshot.id);
        Self { snapshots }
    }

    /// Iterator over the captured snapshots in deterministic order.
    pub fn iter(&self) -> impl Iterator<Item = &EntitySnapshot> {
        self.snapshots.iter()
    }

    /// Looks up the snapshot of a specific entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&EntitySnapshot> {
        self.snapshots
            .binary_search_by_key(&id, |snapshot| snapshot.id)
            .ok()
            .map(|index| &self.snapshots[index])
    }

    /// Number of captured snapshots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    /// Reports whether the view is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    /// Consumes the view, yielding the underlying snapshots.
    #[must_use]
    pub fn into_vec(self) -> Vec<EntitySnapshot> {
        self.snapshots
    }
}
