#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Player simulation covering jumps, vertical physics and collision outcomes.

use std::{collections::BTreeSet, time::Duration};

use rooftop_runner_core::{
    Command, EffectKind, EntityCategory, EntityId, EntitySnapshot, EntityView, Event, Hitbox,
    WorldPoint,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, trace};

/// Tuning for the player body.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Fixed horizontal position of the player.
    pub anchor_x: f32,
    /// Lowest vertical position; touching it lands the player.
    pub ground_y: f32,
    /// Highest vertical position a jump may reach.
    pub ceiling_y: f32,
    /// Upward velocity applied by every jump.
    pub jump_force: f32,
    /// Vertical acceleration applied while airborne.
    pub gravity: f32,
    /// Collision box of the player.
    pub hitbox: Hitbox,
    /// Points awarded per collected coin.
    pub coin_value: u32,
}

impl Config {
    /// Canonical spawn position.
    #[must_use]
    pub fn spawn_position(&self) -> WorldPoint {
        WorldPoint::new(self.anchor_x, self.ground_y)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            anchor_x: -13.0,
            ground_y: -12.59,
            ceiling_y: -3.0,
            jump_force: 15.0,
            gravity: -40.0,
            hitbox: Hitbox::new(0.5, 1.0),
            coin_value: 10,
        }
    }
}

/// Vertical motion state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Motion {
    /// Standing on the ground.
    Grounded,
    /// In the air after a jump.
    Airborne {
        /// Whether a mid-air jump can still be spent during this airborne phase.
        double_jump_available: bool,
    },
}

/// Observable player state.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerState {
    /// Vertical motion state.
    pub motion: Motion,
    /// Whether the player hit an obstacle without protection.
    pub dead: bool,
    /// Whether the shield effect is active.
    pub has_shield: bool,
    /// Whether the double-jump effect is active.
    pub has_double_jump: bool,
    /// Current position.
    pub position: WorldPoint,
    /// Current vertical velocity.
    pub vertical_velocity: f32,
}

impl PlayerState {
    fn spawned(config: &Config) -> Self {
        Self {
            motion: Motion::Grounded,
            dead: false,
            has_shield: false,
            has_double_jump: false,
            position: config.spawn_position(),
            vertical_velocity: 0.0,
        }
    }
}

/// Player system reacting to session, effect and time events.
#[derive(Debug)]
pub struct Player {
    config: Config,
    state: PlayerState,
    running: bool,
    contacts: BTreeSet<EntityId>,
}

impl Player {
    /// Creates a grounded player at the canonical spawn position.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            state: PlayerState::spawned(&config),
            config,
            running: false,
            contacts: BTreeSet::new(),
        }
    }

    /// Current player state.
    #[must_use]
    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    /// Player tuning.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Attempts a jump, or a double jump while airborne.
    ///
    /// Ignored while dead, outside a running session, or when no jump is
    /// available.
    pub fn request_jump(&mut self, out: &mut Vec<Event>) {
        if self.state.dead || !self.running {
            return;
        }

        match self.state.motion {
            Motion::Grounded => {
                self.state.vertical_velocity = self.config.jump_force;
                self.state.motion = Motion::Airborne {
                    double_jump_available: self.state.has_double_jump,
                };
                trace!("player jumped");
                out.push(Event::PlayerJumped { double_jump: false });
            }
            Motion::Airborne {
                double_jump_available: true,
            } if self.state.has_double_jump => {
                self.state.vertical_velocity = self.config.jump_force;
                self.state.motion = Motion::Airborne {
                    double_jump_available: false,
                };
                trace!("player double jumped");
                out.push(Event::PlayerJumped { double_jump: true });
            }
            Motion::Airborne { .. } => {}
        }
    }

    /// Consumes events and the entity view, emitting commands and player events.
    pub fn handle(
        &mut self,
        events: &[Event],
        entities: &EntityView,
        commands: &mut Vec<Command>,
        emitted: &mut Vec<Event>,
    ) {
        let mut elapsed = Duration::ZERO;
        for event in events {
            match event {
                Event::Started | Event::Resumed => self.running = true,
                Event::Paused => self.running = false,
                Event::GameOver => {
                    self.running = false;
                    self.state.dead = true;
                }
                Event::SessionReset => {
                    self.running = false;
                    self.reset_player();
                }
                Event::EffectActivated { effect } => self.set_effect(*effect, true),
                Event::EffectDeactivated { effect } => self.set_effect(*effect, false),
                Event::TimeAdvanced { dt } => elapsed = elapsed.saturating_add(*dt),
                // Pooled ids are recycled; a reused id is a new contact.
                Event::EntitySpawned { entity, .. } | Event::EntityReleased { entity, .. } => {
                    let _ = self.contacts.remove(entity);
                }
                _ => {}
            }
        }

        if elapsed.is_zero() || !self.running || self.state.dead {
            return;
        }

        self.integrate(elapsed, emitted);
        self.detect_collisions(entities, commands, emitted);
    }

    /// Classifies an overlap with an entity and reacts to it.
    ///
    /// Ignored once the player is dead.
    pub fn on_overlap(
        &mut self,
        entity: &EntitySnapshot,
        commands: &mut Vec<Command>,
        emitted: &mut Vec<Event>,
    ) {
        if self.state.dead {
            return;
        }

        match entity.category {
            EntityCategory::Obstacle if self.state.has_shield => {
                debug!(entity = entity.id.get(), "obstacle absorbed by shield");
                emitted.push(Event::ObstacleAbsorbed { entity: entity.id });
            }
            EntityCategory::Obstacle => {
                self.state.dead = true;
                info!(entity = entity.id.get(), "player hit an obstacle");
                emitted.push(Event::PlayerDied);
                commands.push(Command::GameOver);
            }
            EntityCategory::Coin => {
                emitted.push(Event::CoinCollected { entity: entity.id });
                commands.push(Command::AddScore {
                    points: self.config.coin_value,
                });
                commands.push(Command::ReleaseEntity { entity: entity.id });
            }
            EntityCategory::PowerUp(power_up) => {
                debug!(?power_up, entity = entity.id.get(), "power-up collected");
                emitted.push(Event::PowerUpCollected {
                    entity: entity.id,
                    power_up,
                });
                commands.push(Command::ReleaseEntity { entity: entity.id });
            }
        }
    }

    /// Restores the canonical spawn state.
    pub fn reset_player(&mut self) {
        self.state = PlayerState::spawned(&self.config);
        self.contacts.clear();
    }

    fn set_effect(&mut self, effect: EffectKind, active: bool) {
        match effect {
            EffectKind::Shield => self.state.has_shield = active,
            EffectKind::DoubleJump => {
                self.state.has_double_jump = active;
                if !active {
                    if let Motion::Airborne {
                        double_jump_available,
                    } = &mut self.state.motion
                    {
                        *double_jump_available = false;
                    }
                }
            }
        }
    }

    fn integrate(&mut self, dt: Duration, emitted: &mut Vec<Event>) {
        if self.state.motion == Motion::Grounded {
            return;
        }

        let seconds = dt.as_secs_f32();
        self.state.vertical_velocity += self.config.gravity * seconds;
        let mut y = self.state.position.y() + self.state.vertical_velocity * seconds;

        if y >= self.config.ceiling_y {
            y = self.config.ceiling_y;
            self.state.vertical_velocity = self.state.vertical_velocity.min(0.0);
        }
        if y <= self.config.ground_y {
            y = self.config.ground_y;
            self.state.vertical_velocity = 0.0;
            self.state.motion = Motion::Grounded;
            trace!("player landed");
            emitted.push(Event::PlayerLanded);
        }

        self.state.position = WorldPoint::new(self.config.anchor_x, y);
    }

    fn detect_collisions(
        &mut self,
        entities: &EntityView,
        commands: &mut Vec<Command>,
        emitted: &mut Vec<Event>,
    ) {
        let hitbox = self.config.hitbox;
        let position = self.state.position;
        let overlapping: BTreeSet<EntityId> = entities
            .iter()
            .filter(|entity| hitbox.overlaps(position, entity.hitbox, entity.position))
            .map(|entity| entity.id)
            .collect();

        for id in &overlapping {
            if self.contacts.contains(id) {
                continue;
            }
            if let Some(entity) = entities.get(*id) {
                self.on_overlap(entity, commands, emitted);
            }
        }
        self.contacts = overlapping;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running_player() -> Player {
        let mut player = Player::new(Config::default());
        let mut commands = Vec::new();
        let mut emitted = Vec::new();
        player.handle(
            &[Event::Started],
            &EntityView::default(),
            &mut commands,
            &mut emitted,
        );
        player
    }

    #[test]
    fn airborne_player_lands_back_on_ground() {
        let mut player = running_player();
        let mut events = Vec::new();
        player.request_jump(&mut events);

        let mut landed = false;
        for _ in 0..120 {
            let mut emitted = Vec::new();
            player.integrate(Duration::from_millis(16), &mut emitted);
            if emitted.contains(&Event::PlayerLanded) {
                landed = true;
                break;
            }
            assert!(player.state.position.y() <= player.config.ceiling_y);
        }

        assert!(landed);
        assert_eq!(player.state.motion, Motion::Grounded);
        assert!((player.state.position.y() - player.config.ground_y).abs() < f32::EPSILON);
    }

    #[test]
    fn ceiling_clamps_upward_velocity() {
        let mut player = Player::new(Config {
            jump_force: 200.0,
            ..Config::default()
        });
        player.running = true;
        let mut events = Vec::new();
        player.request_jump(&mut events);
        player.integrate(Duration::from_millis(100), &mut events);

        assert!((player.state.position.y() - player.config.ceiling_y).abs() < f32::EPSILON);
        assert!(player.state.vertical_velocity <= 0.0);
    }
}
