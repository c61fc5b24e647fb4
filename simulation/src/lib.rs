#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Fixed-order tick pipeline wiring the world and the pure systems together.
//!
//! Every command and event of a tick lands in one ordered log. Each system
//! keeps a cursor into that log so it observes every event exactly once, and
//! the commands it answers with are applied to the world before the next
//! stage runs. The finished log is published to bus subscribers.

mod bus;
mod config;

use std::time::Duration;

use rooftop_runner_core::{Command, Event};
use rooftop_runner_system_effects::EffectScheduler;
use rooftop_runner_system_player::Player;
use rooftop_runner_system_spawning::Spawning;
use rooftop_runner_world::{self as world, query, World};
use tracing::{debug, info};

pub use self::bus::{EventBus, Subscription};
pub use self::config::{ConfigError, GameConfig};

#[derive(Clone, Copy, Debug, Default)]
struct Cursors {
    spawning: usize,
    effects: usize,
    player: usize,
}

/// Headless Rooftop Runner session.
#[derive(Debug)]
pub struct Simulation {
    world: World,
    spawning: Spawning,
    effects: EffectScheduler,
    player: Player,
    bus: EventBus,
    log: Vec<Event>,
    cursors: Cursors,
}

impl Simulation {
    /// Validates the configuration and assembles an idle session.
    pub fn new(config: GameConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(seed = config.spawning.seed, "simulation ready");
        Ok(Self {
            world: World::with_tuning(config.world),
            spawning: Spawning::new(config.spawning),
            effects: EffectScheduler::new(config.effects),
            player: Player::new(config.player),
            bus: EventBus::new(),
            log: Vec::new(),
            cursors: Cursors::default(),
        })
    }

    /// Registers a listener for every published event.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(&Event) + 'static,
    {
        self.bus.subscribe(listener)
    }

    /// Starts a run from idle.
    pub fn start(&mut self) {
        self.submit(Command::Start);
    }

    /// Pauses a running session.
    pub fn pause(&mut self) {
        self.submit(Command::Pause);
    }

    /// Resumes a paused session.
    pub fn resume(&mut self) {
        self.submit(Command::Resume);
    }

    /// Ends the current run.
    pub fn game_over(&mut self) {
        self.submit(Command::GameOver);
    }

    /// Returns every system to its idle state.
    pub fn reset(&mut self) {
        self.submit(Command::Reset);
    }

    /// Awards points to the current run.
    pub fn add_score(&mut self, points: u32) {
        self.submit(Command::AddScore { points });
    }

    /// Applies a command outside the tick and propagates its consequences.
    pub fn submit(&mut self, command: Command) {
        self.apply(command);
        self.propagate();
        self.publish();
    }

    /// Forwards a jump request to the player.
    pub fn request_jump(&mut self) {
        let mut emitted = Vec::new();
        self.player.request_jump(&mut emitted);
        self.log.extend(emitted);
        self.propagate();
        self.publish();
    }

    /// Advances the session by one tick.
    pub fn tick(&mut self, dt: Duration) {
        self.apply(Command::Tick { dt });
        self.propagate();
        self.apply(Command::SweepEntities);
        self.propagate();
        self.publish();
    }

    /// Authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Player system.
    #[must_use]
    pub fn player(&self) -> &Player {
        &self.player
    }

    /// Effect scheduler.
    #[must_use]
    pub fn effects(&self) -> &EffectScheduler {
        &self.effects
    }

    /// Procedural spawner.
    #[must_use]
    pub fn spawning(&self) -> &Spawning {
        &self.spawning
    }

    fn apply(&mut self, command: Command) {
        world::apply(&mut self.world, command, &mut self.log);
    }

    fn apply_all(&mut self, commands: Vec<Command>) {
        for command in commands {
            self.apply(command);
        }
    }

    fn pending(&self, cursor: usize) -> Vec<Event> {
        self.log[cursor..].to_vec()
    }

    fn propagate(&mut self) {
        let mut rounds = 0_usize;
        loop {
            let mut progressed = false;

            if self.cursors.spawning < self.log.len() {
                let events = self.pending(self.cursors.spawning);
                self.cursors.spawning = self.log.len();
                let session = query::session(&self.world);
                let mut commands = Vec::new();
                self.spawning.handle(&events, &session, &mut commands);
                self.apply_all(commands);
                progressed = true;
            }

            if self.cursors.effects < self.log.len() {
                let events = self.pending(self.cursors.effects);
                self.cursors.effects = self.log.len();
                self.effects.handle(&events, &mut self.log);
                progressed = true;
            }

            if self.cursors.player < self.log.len() {
                let events = self.pending(self.cursors.player);
                self.cursors.player = self.log.len();
                let view = query::entity_view(&self.world);
                let mut commands = Vec::new();
                self.player
                    .handle(&events, &view, &mut commands, &mut self.log);
                self.apply_all(commands);
                progressed = true;
            }

            if !progressed {
                break;
            }
            rounds += 1;
        }
        if rounds > 1 {
            debug!(rounds, "propagation needed follow-up rounds");
        }
    }

    fn publish(&mut self) {
        let events = std::mem::take(&mut self.log);
        self.cursors = Cursors::default();
        self.bus.publish(&events);
    }
}
