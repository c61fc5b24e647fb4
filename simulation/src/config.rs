//! Aggregated game configuration and its validation.

use rooftop_runner_system_effects::Config as EffectsConfig;
use rooftop_runner_system_player::Config as PlayerConfig;
use rooftop_runner_system_spawning::Config as SpawningConfig;
use rooftop_runner_world::Tuning;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const PROBABILITY_SLACK: f32 = 1e-4;

/// Every tunable constant of a session.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Session state machine and entity registry tuning.
    pub world: Tuning,
    /// Procedural spawner tuning.
    pub spawning: SpawningConfig,
    /// Power-up durations.
    pub effects: EffectsConfig,
    /// Player body tuning.
    pub player: PlayerConfig,
}

/// Reasons a configuration is rejected.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The TOML document could not be parsed.
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A numeric field is NaN or infinite.
    #[error("{name} must be finite, got {value}")]
    NonFinite {
        /// Name of the offending field.
        name: &'static str,
        /// Configured value.
        value: f32,
    },
    /// Initial speed is not positive or exceeds the maximum.
    #[error("initial speed {initial} must be positive and at most the max speed {max}")]
    InvalidSpeed {
        /// Configured initial speed.
        initial: f32,
        /// Configured maximum speed.
        max: f32,
    },
    /// Speed increase rate is negative.
    #[error("speed increase rate {0} must not be negative")]
    NegativeRate(f32),
    /// Speed increase interval is zero.
    #[error("speed increase interval must be longer than zero")]
    ZeroSpeedInterval,
    /// Spawn interval bounds are inverted.
    #[error("spawn interval minimum {min_ms}ms exceeds maximum {max_ms}ms")]
    SpawnIntervalRange {
        /// Configured lower bound.
        min_ms: u64,
        /// Configured upper bound.
        max_ms: u64,
    },
    /// A probability lies outside `[0, 1]`.
    #[error("{name} probability {value} must lie within [0, 1]")]
    ProbabilityOutOfRange {
        /// Name of the offending field.
        name: &'static str,
        /// Configured value.
        value: f32,
    },
    /// The spawn category probabilities add up to more than one.
    #[error("spawn category probabilities sum to {total}, more than 1")]
    ProbabilitiesExceedOne {
        /// Sum of the four category probabilities.
        total: f32,
    },
    /// The ground lies at or above the jump ceiling.
    #[error("ground {ground} must lie below the jump ceiling {ceiling}")]
    VerticalBounds {
        /// Configured ground row.
        ground: f32,
        /// Configured ceiling row.
        ceiling: f32,
    },
    /// Coin height bounds are inverted.
    #[error("minimum coin row {min} exceeds maximum coin row {max}")]
    CoinRowBounds {
        /// Configured lower row.
        min: f32,
        /// Configured upper row.
        max: f32,
    },
    /// Coin rows cannot hold a single coin.
    #[error("coin rows must allow at least one coin")]
    EmptyCoinRow,
    /// A distance or extent is negative.
    #[error("{name} must not be negative, got {value}")]
    NegativeExtent {
        /// Name of the offending field.
        name: &'static str,
        /// Configured value.
        value: f32,
    },
}

impl GameConfig {
    /// Parses and validates a TOML document; missing fields keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks the cross-field constraints the systems rely on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.check_finite()?;

        let world = &self.world;
        if world.initial_speed <= 0.0 || world.initial_speed > world.max_speed {
            return Err(ConfigError::InvalidSpeed {
                initial: world.initial_speed,
                max: world.max_speed,
            });
        }
        if world.speed_increase_rate < 0.0 {
            return Err(ConfigError::NegativeRate(world.speed_increase_rate));
        }
        if world.speed_increase_interval_ms == 0 {
            return Err(ConfigError::ZeroSpeedInterval);
        }

        let spawning = &self.spawning;
        if spawning.min_interval_ms > spawning.max_interval_ms {
            return Err(ConfigError::SpawnIntervalRange {
                min_ms: spawning.min_interval_ms,
                max_ms: spawning.max_interval_ms,
            });
        }
        let chances = [
            ("power-up", spawning.power_up_chance),
            ("obstacle", spawning.obstacle_chance),
            ("coin", spawning.coin_chance),
            ("nothing", spawning.nothing_chance),
        ];
        for (name, value) in chances
            .iter()
            .copied()
            .chain([("coin row", spawning.coin_row_chance)])
        {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::ProbabilityOutOfRange { name, value });
            }
        }
        let total: f32 = chances.iter().map(|(_, value)| value).sum();
        if total > 1.0 + PROBABILITY_SLACK {
            return Err(ConfigError::ProbabilitiesExceedOne { total });
        }
        if spawning.min_coin_y > spawning.max_coin_y {
            return Err(ConfigError::CoinRowBounds {
                min: spawning.min_coin_y,
                max: spawning.max_coin_y,
            });
        }
        let coin_span = spawning.max_coin_y - spawning.min_coin_y;
        if !coin_span.is_finite() {
            return Err(ConfigError::NonFinite {
                name: "coin row span",
                value: coin_span,
            });
        }
        if spawning.max_coins_in_row == 0 {
            return Err(ConfigError::EmptyCoinRow);
        }

        let player = &self.player;
        if player.ground_y >= player.ceiling_y {
            return Err(ConfigError::VerticalBounds {
                ground: player.ground_y,
                ceiling: player.ceiling_y,
            });
        }

        let mut extents = vec![
            ("safe zone width", spawning.safe_zone_width),
            ("cleanup distance", spawning.cleanup_distance),
            ("coin spacing", spawning.coin_spacing),
            ("player hitbox width", player.hitbox.half_width),
            ("player hitbox height", player.hitbox.half_height),
        ];
        for entry in &world.catalog {
            extents.push(("catalog hitbox width", entry.hitbox.half_width));
            extents.push(("catalog hitbox height", entry.hitbox.half_height));
        }
        if let Some((name, value)) = extents.into_iter().find(|(_, value)| *value < 0.0) {
            return Err(ConfigError::NegativeExtent { name, value });
        }

        Ok(())
    }

    fn check_finite(&self) -> Result<(), ConfigError> {
        let world = &self.world;
        let spawning = &self.spawning;
        let player = &self.player;
        let mut fields = vec![
            ("initial speed", world.initial_speed),
            ("max speed", world.max_speed),
            ("speed increase rate", world.speed_increase_rate),
            ("despawn line", world.despawn_line_x),
            ("spawn offset", spawning.spawn_offset_x),
            ("safe zone width", spawning.safe_zone_width),
            ("cleanup distance", spawning.cleanup_distance),
            ("obstacle row", spawning.obstacle_y),
            ("power-up row", spawning.power_up_y),
            ("minimum coin row", spawning.min_coin_y),
            ("maximum coin row", spawning.max_coin_y),
            ("power-up probability", spawning.power_up_chance),
            ("obstacle probability", spawning.obstacle_chance),
            ("coin probability", spawning.coin_chance),
            ("nothing probability", spawning.nothing_chance),
            ("coin row probability", spawning.coin_row_chance),
            ("coin spacing", spawning.coin_spacing),
            ("player anchor", player.anchor_x),
            ("ground", player.ground_y),
            ("jump ceiling", player.ceiling_y),
            ("jump force", player.jump_force),
            ("gravity", player.gravity),
            ("player hitbox width", player.hitbox.half_width),
            ("player hitbox height", player.hitbox.half_height),
        ];
        for entry in &world.catalog {
            fields.push(("catalog hitbox width", entry.hitbox.half_width));
            fields.push(("catalog hitbox height", entry.hitbox.half_height));
        }
        match fields.into_iter().find(|(_, value)| !value.is_finite()) {
            Some((name, value)) => Err(ConfigError::NonFinite { name, value }),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(GameConfig::default().validate().is_ok());
    }

    #[test]
    fn empty_document_yields_defaults() {
        let config = GameConfig::from_toml_str("").expect("empty config parses");
        assert_eq!(config, GameConfig::default());
    }

    #[test]
    fn inverted_intervals_are_rejected() {
        let error = GameConfig::from_toml_str(
            r#"
            [spawning]
            min_interval_ms = 5000
            max_interval_ms = 1000
            "#,
        )
        .expect_err("inverted range");
        assert!(matches!(
            error,
            ConfigError::SpawnIntervalRange {
                min_ms: 5000,
                max_ms: 1000
            }
        ));
    }

    #[test]
    fn oversubscribed_probabilities_are_rejected() {
        let error = GameConfig::from_toml_str(
            r#"
            [spawning]
            nothing_chance = 0.5
            "#,
        )
        .expect_err("sum above one");
        assert!(matches!(error, ConfigError::ProbabilitiesExceedOne { .. }));
    }

    #[test]
    fn nan_speed_is_rejected() {
        let error = GameConfig::from_toml_str(
            r#"
            [world]
            initial_speed = nan
            "#,
        )
        .expect_err("nan speed");
        assert!(matches!(
            error,
            ConfigError::NonFinite {
                name: "initial speed",
                ..
            }
        ));
    }

    #[test]
    fn infinite_gravity_is_rejected() {
        let mut config = GameConfig::default();
        config.player.gravity = f32::NEG_INFINITY;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::NonFinite {
                name: "gravity",
                ..
            })
        ));
    }

    #[test]
    fn coin_rows_wider_than_a_float_are_rejected() {
        let error = GameConfig::from_toml_str(
            r#"
            [spawning]
            coin_chance = 1.0
            power_up_chance = 0.0
            obstacle_chance = 0.0
            min_coin_y = -3.0e38
            max_coin_y = 3.0e38
            "#,
        )
        .expect_err("span overflows");
        assert!(matches!(
            error,
            ConfigError::NonFinite {
                name: "coin row span",
                ..
            }
        ));
    }
}
