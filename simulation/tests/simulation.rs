use std::{cell::RefCell, rc::Rc, time::Duration};

use rooftop_runner_core::{
    Command, EffectKind, EntityTag, Event, SessionState, WorldPoint, COIN_TAG, DOUBLE_JUMP_TAG,
    OBSTACLE_TAG, SHIELD_TAG,
};
use rooftop_runner_simulation::{ConfigError, GameConfig, Simulation, Subscription};
use rooftop_runner_world::query;

const SECOND: Duration = Duration::from_secs(1);

/// Constant speed and no procedural spawns, so tests place every entity themselves.
fn quiet_config() -> GameConfig {
    let mut config = GameConfig::default();
    config.world.speed_increase_rate = 0.0;
    config.spawning.power_up_chance = 0.0;
    config.spawning.obstacle_chance = 0.0;
    config.spawning.coin_chance = 0.0;
    config.spawning.nothing_chance = 1.0;
    config
}

/// Places an entity so that the next one-second tick scrolls it onto the player.
fn place_in_path(simulation: &mut Simulation, tag: &str) {
    let x = simulation.player().config().anchor_x + query::speed(simulation.world());
    let y = simulation.player().config().ground_y;
    simulation.submit(Command::SpawnEntity {
        tag: EntityTag::from(tag),
        position: WorldPoint::new(x, y),
    });
}

fn recorder(simulation: &Simulation) -> (Rc<RefCell<Vec<Event>>>, Subscription) {
    let events = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&events);
    let subscription = simulation.subscribe(move |event| sink.borrow_mut().push(event.clone()));
    (events, subscription)
}

fn quiet_running() -> Simulation {
    let mut simulation = Simulation::new(quiet_config()).expect("valid config");
    simulation.start();
    simulation
}

#[test]
fn shield_covers_its_whole_duration_then_expires() {
    let mut simulation = quiet_running();
    let (events, _subscription) = recorder(&simulation);

    place_in_path(&mut simulation, SHIELD_TAG);
    simulation.tick(SECOND);
    assert!(simulation.effects().is_active(EffectKind::Shield));
    assert!(simulation.player().state().has_shield);

    for second in 1..=10 {
        if second == 2 || second == 8 {
            place_in_path(&mut simulation, OBSTACLE_TAG);
        }
        simulation.tick(SECOND);
        assert!(!simulation.player().state().dead, "alive at t={second}");
    }
    let absorbed = events
        .borrow()
        .iter()
        .filter(|event| matches!(event, Event::ObstacleAbsorbed { .. }))
        .count();
    assert_eq!(absorbed, 2);
    assert!(!simulation.effects().is_active(EffectKind::Shield));
    assert!(events.borrow().contains(&Event::EffectDeactivated {
        effect: EffectKind::Shield
    }));

    place_in_path(&mut simulation, OBSTACLE_TAG);
    simulation.tick(SECOND);
    assert!(simulation.player().state().dead, "shield expired at t=10");
    assert_eq!(query::state(simulation.world()), SessionState::Over);
}

#[test]
fn expiring_shield_is_seen_by_the_player_in_the_same_tick() {
    let mut config = quiet_config();
    config.effects.shield_duration_ms = 2_000;
    let mut simulation = Simulation::new(config).expect("valid config");
    simulation.start();

    place_in_path(&mut simulation, SHIELD_TAG);
    simulation.tick(SECOND);
    simulation.tick(SECOND);

    place_in_path(&mut simulation, OBSTACLE_TAG);
    simulation.tick(SECOND);
    assert!(simulation.player().state().dead);
}

#[test]
fn every_coin_scores_ten_points() {
    let mut simulation = quiet_running();
    let (events, _subscription) = recorder(&simulation);

    for _ in 0..7 {
        place_in_path(&mut simulation, COIN_TAG);
        simulation.tick(SECOND);
    }

    assert_eq!(query::score(simulation.world()), 70);
    let collected = events
        .borrow()
        .iter()
        .filter(|event| matches!(event, Event::CoinCollected { .. }))
        .count();
    assert_eq!(collected, 7);
    assert!(query::entity_view(simulation.world()).is_empty());
    assert_eq!(
        query::pool(simulation.world()).idle_count(&EntityTag::from(COIN_TAG)),
        30,
        "collected coins return to the pool"
    );
}

#[test]
fn recycled_coin_is_collected_again() {
    let mut config = quiet_config();
    for entry in &mut config.world.catalog {
        if entry.tag == EntityTag::from(COIN_TAG) {
            entry.pool_size = Some(1);
        }
    }
    let mut simulation = Simulation::new(config).expect("valid config");
    simulation.start();
    let (events, _subscription) = recorder(&simulation);

    place_in_path(&mut simulation, COIN_TAG);
    simulation.tick(SECOND);
    place_in_path(&mut simulation, COIN_TAG);
    simulation.tick(SECOND);

    let spawned: Vec<_> = events
        .borrow()
        .iter()
        .filter_map(|event| match event {
            Event::EntitySpawned { entity, .. } => Some(*entity),
            _ => None,
        })
        .collect();
    assert_eq!(spawned.len(), 2);
    assert_eq!(spawned[0], spawned[1], "single slot is reused");
    assert_eq!(query::score(simulation.world()), 20);
}

#[test]
fn dead_player_ignores_every_input() {
    let mut simulation = quiet_running();
    place_in_path(&mut simulation, OBSTACLE_TAG);
    simulation.tick(SECOND);
    assert!(simulation.player().state().dead);

    let (events, _subscription) = recorder(&simulation);
    simulation.request_jump();
    simulation.add_score(10);
    place_in_path(&mut simulation, COIN_TAG);
    simulation.tick(SECOND);

    assert_eq!(query::score(simulation.world()), 0);
    assert!(!events.borrow().iter().any(|event| matches!(
        event,
        Event::PlayerJumped { .. } | Event::ScoreChanged { .. } | Event::CoinCollected { .. }
    )));
}

#[test]
fn collected_double_jump_allows_one_extra_jump() {
    let mut simulation = quiet_running();
    let (events, _subscription) = recorder(&simulation);
    place_in_path(&mut simulation, DOUBLE_JUMP_TAG);
    simulation.tick(SECOND);
    assert!(simulation.player().state().has_double_jump);

    simulation.request_jump();
    simulation.request_jump();
    simulation.request_jump();

    let jumps: Vec<bool> = events
        .borrow()
        .iter()
        .filter_map(|event| match event {
            Event::PlayerJumped { double_jump } => Some(*double_jump),
            _ => None,
        })
        .collect();
    assert_eq!(jumps, vec![false, true]);
}

#[test]
fn speed_compounds_through_the_pipeline() {
    let mut simulation = Simulation::new(GameConfig::default()).expect("valid config");
    simulation.start();

    simulation.tick(SECOND);
    assert!((query::speed(simulation.world()) - 5.5).abs() < 1e-4);
    simulation.tick(SECOND);
    assert!((query::speed(simulation.world()) - 6.05).abs() < 1e-4);
}

#[test]
fn pause_freezes_time_and_spawning() {
    let mut simulation = Simulation::new(GameConfig::default()).expect("valid config");
    simulation.start();
    simulation.pause();

    for _ in 0..10 {
        simulation.tick(SECOND);
    }
    assert_eq!(query::elapsed(simulation.world()), Duration::ZERO);
    assert!(query::entity_view(simulation.world()).is_empty());

    simulation.resume();
    simulation.tick(SECOND);
    assert_eq!(query::elapsed(simulation.world()), SECOND);
}

#[test]
fn reset_after_game_over_allows_a_new_run() {
    let mut simulation = quiet_running();
    place_in_path(&mut simulation, SHIELD_TAG);
    simulation.tick(SECOND);
    simulation.game_over();
    assert!(simulation.player().state().dead);

    let (events, _subscription) = recorder(&simulation);
    simulation.reset();

    assert_eq!(query::state(simulation.world()), SessionState::Idle);
    assert!(!simulation.player().state().dead);
    assert!(simulation.effects().active().is_empty());
    assert!(simulation.spawning().records().is_empty());
    assert_eq!(
        events.borrow().last(),
        Some(&Event::EffectDeactivated {
            effect: EffectKind::DoubleJump
        })
    );
    assert!(events.borrow().contains(&Event::SessionReset));

    simulation.start();
    assert_eq!(query::state(simulation.world()), SessionState::Running);
}

#[test]
fn dropped_subscription_receives_nothing() {
    let mut simulation = quiet_running();
    let (events, subscription) = recorder(&simulation);
    simulation.tick(SECOND);
    let seen = events.borrow().len();
    assert!(seen > 0);

    drop(subscription);
    simulation.tick(SECOND);
    assert_eq!(events.borrow().len(), seen);
}

#[test]
fn identical_sessions_replay_identically() {
    let first = replay();
    let second = replay();
    assert!(first
        .iter()
        .any(|event| matches!(event, Event::EntitySpawned { .. })));
    assert_eq!(first, second, "replay diverged between runs");
}

fn replay() -> Vec<Event> {
    let mut simulation = Simulation::new(GameConfig::default()).expect("valid config");
    let (events, _subscription) = recorder(&simulation);
    simulation.start();
    for step in 0..900 {
        if step % 40 == 0 {
            simulation.request_jump();
        }
        simulation.tick(Duration::from_millis(16));
    }
    let log = events.borrow().clone();
    log
}

#[test]
fn configuration_loads_from_toml() {
    let config = GameConfig::from_toml_str(
        r#"
        [world]
        initial_speed = 8.0
        max_speed = 30.0

        [spawning]
        seed = 99
        min_interval_ms = 1500

        [effects]
        shield_duration_ms = 5000

        [player]
        coin_value = 25
        "#,
    )
    .expect("valid document");

    assert!((config.world.initial_speed - 8.0).abs() < f32::EPSILON);
    assert_eq!(config.spawning.seed, 99);
    assert_eq!(config.spawning.max_interval_ms, 4_000);
    assert_eq!(config.effects.shield_duration_ms, 5_000);
    assert_eq!(config.player.coin_value, 25);

    let mut simulation = Simulation::new(config).expect("valid config");
    simulation.start();
    assert!((query::speed(simulation.world()) - 8.0).abs() < f32::EPSILON);
}

#[test]
fn invalid_configuration_is_rejected_at_construction() {
    let mut config = GameConfig::default();
    config.player.ground_y = 0.0;
    config.player.ceiling_y = -1.0;
    assert!(matches!(
        Simulation::new(config),
        Err(ConfigError::VerticalBounds { .. })
    ));

    assert!(matches!(
        GameConfig::from_toml_str("[world]\ninitial_speed = \"fast\""),
        Err(ConfigError::Parse(_))
    ));
}
