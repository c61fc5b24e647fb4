#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic procedural spawner emitting obstacle, coin and power-up spawn commands.
//!
//! The spawner keeps its own reference x, the distance scrolled since the run
//! started, and places every decision a fixed offset ahead of it. Decisions
//! are separated by a minimum safe-zone distance and recorded until they fall
//! behind the cleanup distance.

use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rooftop_runner_core::{
    Command, EntityCategory, EntityTag, Event, PowerUpKind, SessionSnapshot, WorldPoint, COIN_TAG,
    DOUBLE_JUMP_TAG, OBSTACLE_TAG, SHIELD_TAG,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Pool tags requested for each spawn category; an unset tag skips that category.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnTags {
    /// Tag used for obstacles.
    pub obstacle: Option<EntityTag>,
    /// Tag used for single coins and coin rows.
    pub coin: Option<EntityTag>,
    /// Tag used for shield power-ups.
    pub shield: Option<EntityTag>,
    /// Tag used for double-jump power-ups.
    pub double_jump: Option<EntityTag>,
}

impl SpawnTags {
    fn power_up(&self, kind: PowerUpKind) -> Option<&EntityTag> {
        match kind {
            PowerUpKind::Shield => self.shield.as_ref(),
            PowerUpKind::DoubleJump => self.double_jump.as_ref(),
        }
    }
}

impl Default for SpawnTags {
    fn default() -> Self {
        Self {
            obstacle: Some(EntityTag::from(OBSTACLE_TAG)),
            coin: Some(EntityTag::from(COIN_TAG)),
            shield: Some(EntityTag::from(SHIELD_TAG)),
            double_jump: Some(EntityTag::from(DOUBLE_JUMP_TAG)),
        }
    }
}

/// Configuration parameters required to construct the spawning system.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Distance ahead of the reference x at which decisions are placed.
    pub spawn_offset_x: f32,
    /// Lower bound of the re-arm interval, in milliseconds.
    pub min_interval_ms: u64,
    /// Upper bound of the re-arm interval, in milliseconds.
    pub max_interval_ms: u64,
    /// Delay between the start of a run and the first decision, in milliseconds.
    pub initial_delay_ms: u64,
    /// Minimum separation between two tracked decision points.
    pub safe_zone_width: f32,
    /// Distance behind the reference x after which records are forgotten.
    pub cleanup_distance: f32,
    /// Row obstacles are placed on.
    pub obstacle_y: f32,
    /// Row power-ups are placed on.
    pub power_up_y: f32,
    /// Lowest row a coin may be placed on.
    pub min_coin_y: f32,
    /// Highest row a coin may be placed on.
    pub max_coin_y: f32,
    /// Probability of a power-up decision.
    pub power_up_chance: f32,
    /// Probability of an obstacle decision.
    pub obstacle_chance: f32,
    /// Probability of a coin decision.
    pub coin_chance: f32,
    /// Probability budgeted for empty decisions.
    ///
    /// Only the configuration check reads it: classification walks the other
    /// three chances and treats every roll past them as empty, so any share
    /// left unassigned up to one also spawns nothing.
    pub nothing_chance: f32,
    /// Probability that a coin decision lays out a row instead of a single coin.
    pub coin_row_chance: f32,
    /// Longest coin row.
    pub max_coins_in_row: u32,
    /// Horizontal gap between coins of a row.
    pub coin_spacing: f32,
    /// Seed feeding every random draw.
    pub seed: u64,
    /// Pool tags requested per category.
    pub tags: SpawnTags,
}

impl Config {
    /// Delay before the first decision of a run.
    #[must_use]
    pub fn initial_delay(&self) -> Duration {
        Duration::from_millis(self.initial_delay_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            spawn_offset_x: 50.0,
            min_interval_ms: 2_000,
            max_interval_ms: 4_000,
            initial_delay_ms: 2_000,
            safe_zone_width: 5.0,
            cleanup_distance: 30.0,
            obstacle_y: -12.59,
            power_up_y: -3.0,
            min_coin_y: -12.59,
            max_coin_y: -3.0,
            power_up_chance: 0.1,
            obstacle_chance: 0.4,
            coin_chance: 0.5,
            nothing_chance: 0.0,
            coin_row_chance: 0.3,
            max_coins_in_row: 6,
            coin_spacing: 2.0,
            seed: 0x5eed_2d11_7a3c_0f42,
            tags: SpawnTags::default(),
        }
    }
}

/// Decision point tracked for safe-zone checks.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnRecord {
    /// Decision point in scrolled-world coordinates.
    pub position: WorldPoint,
    /// Category spawned at the decision point.
    pub category: EntityCategory,
    /// Reference x at the time the decision was made.
    pub created_at_distance: f32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Decision {
    PowerUp,
    Obstacle,
    Coins,
    Nothing,
}

/// Pure system that deterministically emits spawn commands while the run advances.
#[derive(Debug)]
pub struct Spawning {
    config: Config,
    rng: ChaCha8Rng,
    countdown: Option<Duration>,
    travelled: f32,
    records: Vec<SpawnRecord>,
}

impl Spawning {
    /// Creates a new spawning system using the supplied configuration.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            countdown: None,
            travelled: 0.0,
            records: Vec::new(),
        }
    }

    /// Consumes events and the session snapshot to emit spawn commands.
    pub fn handle(&mut self, events: &[Event], session: &SessionSnapshot, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::Started => {
                    self.clear();
                    self.countdown = Some(self.config.initial_delay());
                }
                Event::SessionReset => {
                    self.clear();
                    self.countdown = None;
                }
                Event::TimeAdvanced { dt } => self.advance(*dt, session.speed, out),
                _ => {}
            }
        }
    }

    /// Decision points currently tracked for safe-zone checks.
    #[must_use]
    pub fn records(&self) -> &[SpawnRecord] {
        &self.records
    }

    /// Distance scrolled since the run started.
    #[must_use]
    pub fn travelled(&self) -> f32 {
        self.travelled
    }

    /// Time left until the next decision, if the timer is armed.
    #[must_use]
    pub fn countdown(&self) -> Option<Duration> {
        self.countdown
    }

    fn clear(&mut self) {
        self.records.clear();
        self.travelled = 0.0;
    }

    fn advance(&mut self, dt: Duration, speed: f32, out: &mut Vec<Command>) {
        self.travelled += speed * dt.as_secs_f32();

        if let Some(remaining) = self.countdown {
            if dt >= remaining {
                self.decide(out);
                self.countdown = Some(self.next_interval());
            } else {
                self.countdown = Some(remaining - dt);
            }
        }

        let horizon = self.travelled - self.config.cleanup_distance;
        self.records.retain(|record| record.position.x() >= horizon);
    }

    fn next_interval(&mut self) -> Duration {
        let low = self.config.min_interval_ms;
        let high = self.config.max_interval_ms.max(low);
        Duration::from_millis(self.rng.gen_range(low..=high))
    }

    fn decide(&mut self, out: &mut Vec<Command>) {
        let mut candidate = WorldPoint::new(
            self.travelled + self.config.spawn_offset_x,
            self.config.obstacle_y,
        );
        if !self.is_safe(candidate) {
            candidate = candidate.translated(self.config.safe_zone_width, 0.0);
            trace!(x = candidate.x(), "candidate shifted past safe zone");
        }

        let screen_x = candidate.x() - self.travelled;
        let category = match self.classify() {
            Decision::PowerUp => self.spawn_power_up(screen_x, out),
            Decision::Obstacle => self.spawn_obstacle(screen_x, out),
            Decision::Coins => self.spawn_coins(screen_x, out),
            Decision::Nothing => None,
        };

        if let Some(category) = category {
            self.records.push(SpawnRecord {
                position: candidate,
                category,
                created_at_distance: self.travelled,
            });
        }
    }

    fn is_safe(&self, candidate: WorldPoint) -> bool {
        let min_distance_squared = self.config.safe_zone_width * self.config.safe_zone_width;
        self.records
            .iter()
            .all(|record| record.position.distance_squared(candidate) >= min_distance_squared)
    }

    fn classify(&mut self) -> Decision {
        let roll: f32 = self.rng.gen();
        let power_up = self.config.power_up_chance;
        let obstacle = power_up + self.config.obstacle_chance;
        let coins = obstacle + self.config.coin_chance;

        if roll < power_up {
            Decision::PowerUp
        } else if roll < obstacle {
            Decision::Obstacle
        } else if roll < coins {
            Decision::Coins
        } else {
            Decision::Nothing
        }
    }

    fn spawn_obstacle(&mut self, x: f32, out: &mut Vec<Command>) -> Option<EntityCategory> {
        let Some(tag) = self.config.tags.obstacle.clone() else {
            debug!("obstacle tag unset, spawn skipped");
            return None;
        };
        out.push(Command::SpawnEntity {
            tag,
            position: WorldPoint::new(x, self.config.obstacle_y),
        });
        Some(EntityCategory::Obstacle)
    }

    fn spawn_power_up(&mut self, x: f32, out: &mut Vec<Command>) -> Option<EntityCategory> {
        let kind = if self.rng.gen::<f32>() < 0.5 {
            PowerUpKind::Shield
        } else {
            PowerUpKind::DoubleJump
        };
        let Some(tag) = self.config.tags.power_up(kind).cloned() else {
            debug!(?kind, "power-up tag unset, spawn skipped");
            return None;
        };
        out.push(Command::SpawnEntity {
            tag,
            position: WorldPoint::new(x, self.config.power_up_y),
        });
        Some(EntityCategory::PowerUp(kind))
    }

    fn spawn_coins(&mut self, x: f32, out: &mut Vec<Command>) -> Option<EntityCategory> {
        let row = self.rng.gen::<f32>() < self.config.coin_row_chance;
        let Some(tag) = self.config.tags.coin.clone() else {
            debug!("coin tag unset, spawn skipped");
            return None;
        };

        let count = if row {
            self.rng.gen_range(1..=self.config.max_coins_in_row.max(1))
        } else {
            1
        };
        let y = self.coin_row_height();
        for position in coin_row_layout(x, count, self.config.coin_spacing, y) {
            out.push(Command::SpawnEntity {
                tag: tag.clone(),
                position,
            });
        }
        Some(EntityCategory::Coin)
    }

    fn coin_row_height(&mut self) -> f32 {
        let low = self.config.min_coin_y;
        let high = self.config.max_coin_y.max(low);
        self.rng.gen_range(low..=high)
    }
}

fn coin_row_layout(anchor_x: f32, count: u32, spacing: f32, y: f32) -> Vec<WorldPoint> {
    (0..count)
        .map(|index| WorldPoint::new(anchor_x + index as f32 * spacing, y))
        .collect()
}
