#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deadline table for the timed player effects.
//!
//! Each effect kind owns one independent timeline. Activation overwrites the
//! pending deadline instead of stacking, and every activation or expiration is
//! acknowledged with an event.

use std::{collections::BTreeMap, time::Duration};

use rooftop_runner_core::{EffectKind, Event, PowerUpKind};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Default duration granted by each power-up.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Shield duration in milliseconds.
    pub shield_duration_ms: u64,
    /// Double-jump duration in milliseconds.
    pub double_jump_duration_ms: u64,
}

impl Config {
    /// Duration granted when the provided power-up is collected.
    #[must_use]
    pub fn duration_for(&self, power_up: PowerUpKind) -> Duration {
        let millis = match power_up {
            PowerUpKind::Shield => self.shield_duration_ms,
            PowerUpKind::DoubleJump => self.double_jump_duration_ms,
        };
        Duration::from_millis(millis)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            shield_duration_ms: 10_000,
            double_jump_duration_ms: 10_000,
        }
    }
}

/// Effect currently counting down.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ActiveEffect {
    /// Kind of the effect.
    pub kind: EffectKind,
    /// Time left before the effect expires.
    pub remaining: Duration,
}

/// Scheduler that activates and expires timed effects.
#[derive(Debug, Default)]
pub struct EffectScheduler {
    config: Config,
    deadlines: BTreeMap<EffectKind, Duration>,
}

impl EffectScheduler {
    /// Creates a scheduler with no active effects.
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            deadlines: BTreeMap::new(),
        }
    }

    /// Reacts to time, power-up collection and session resets.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Event>) {
        for event in events {
            match event {
                Event::TimeAdvanced { dt } => self.advance(*dt, out),
                Event::PowerUpCollected { power_up, .. } => {
                    let duration = self.config.duration_for(*power_up);
                    self.activate(power_up.effect(), duration, out);
                }
                Event::SessionReset => self.reset_all(out),
                _ => {}
            }
        }
    }

    /// Arms the effect for `duration`, replacing any pending expiration.
    ///
    /// The activation is acknowledged even when the effect was already active.
    pub fn activate(&mut self, kind: EffectKind, duration: Duration, out: &mut Vec<Event>) {
        let previous = self.deadlines.insert(kind, duration);
        debug!(?kind, ?duration, rearmed = previous.is_some(), "effect activated");
        out.push(Event::EffectActivated { effect: kind });
    }

    /// Counts every pending deadline down and expires the ones that elapsed.
    pub fn advance(&mut self, dt: Duration, out: &mut Vec<Event>) {
        let mut expired = Vec::new();
        for (kind, remaining) in &mut self.deadlines {
            *remaining = remaining.saturating_sub(dt);
            if remaining.is_zero() {
                expired.push(*kind);
            }
        }

        for kind in expired {
            let _ = self.deadlines.remove(&kind);
            debug!(?kind, "effect expired");
            out.push(Event::EffectDeactivated { effect: kind });
        }
    }

    /// Cancels every pending expiration and acknowledges both kinds as inactive.
    pub fn reset_all(&mut self, out: &mut Vec<Event>) {
        self.deadlines.clear();
        for kind in EffectKind::ALL {
            out.push(Event::EffectDeactivated { effect: kind });
        }
    }

    /// Reports whether the effect is currently active.
    #[must_use]
    pub fn is_active(&self, kind: EffectKind) -> bool {
        self.deadlines.contains_key(&kind)
    }

    /// Time left before the effect expires.
    #[must_use]
    pub fn remaining(&self, kind: EffectKind) -> Option<Duration> {
        self.deadlines.get(&kind).copied()
    }

    /// Active effects in kind order.
    #[must_use]
    pub fn active(&self) -> Vec<ActiveEffect> {
        self.deadlines
            .iter()
            .map(|(kind, remaining)| ActiveEffect {
                kind: *kind,
                remaining: *remaining,
            })
            .collect()
    }

    /// Configured durations.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timelines_are_independent() {
        let mut scheduler = EffectScheduler::new(Config::default());
        let mut out = Vec::new();
        scheduler.activate(EffectKind::Shield, Duration::from_secs(3), &mut out);
        scheduler.activate(EffectKind::DoubleJump, Duration::from_secs(5), &mut out);
        out.clear();

        scheduler.advance(Duration::from_secs(3), &mut out);
        assert_eq!(
            out,
            vec![Event::EffectDeactivated {
                effect: EffectKind::Shield
            }]
        );
        assert_eq!(
            scheduler.remaining(EffectKind::DoubleJump),
            Some(Duration::from_secs(2))
        );
    }

    #[test]
    fn durations_follow_power_up_kind() {
        let config = Config {
            shield_duration_ms: 1_500,
            double_jump_duration_ms: 2_500,
        };
        assert_eq!(
            config.duration_for(PowerUpKind::Shield),
            Duration::from_millis(1_500)
        );
        assert_eq!(
            config.duration_for(PowerUpKind::DoubleJump),
            Duration::from_millis(2_500)
        );
    }
}
