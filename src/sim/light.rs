//! Light field: the player's shrinking, flickering radius of vision
//!
//! The logical radius only ever shrinks and drives the game-over check. The
//! flicker is cosmetic: it widens the drawn radius and nudges the mask centre
//! but never feeds back into the logical radius.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::consts::LIGHT_COLOR;
use crate::settings::DecayPolicy;

/// Share of the flicker applied to the mask centre offset
const FLICKER_OFFSET_FACTOR: f32 = 0.1;

/// One concentric disc of the visibility mask
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightRing {
    pub radius: f32,
    /// Light strength, 0 at the edge of the effective radius
    pub alpha: u8,
}

/// Per-frame light mask, subtracted from the darkness overlay by the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibilityMask {
    /// Mask centre (player position plus flicker offset)
    pub center: Vec2,
    /// Drawn radius including flicker
    pub effective_radius: f32,
    pub color: [u8; 3],
    /// Outermost ring first; smaller rings are drawn over larger ones
    pub rings: Vec<LightRing>,
}

impl VisibilityMask {
    /// Fully dark mask
    pub fn dark(center: Vec2) -> Self {
        Self {
            center,
            effective_radius: 0.0,
            color: LIGHT_COLOR,
            rings: Vec::new(),
        }
    }

    /// Light alpha at a pixel: the innermost ring covering it wins
    pub fn alpha_at(&self, point: Vec2) -> u8 {
        let dist = point.distance(self.center);
        self.rings
            .iter()
            .rev()
            .find(|ring| dist <= ring.radius)
            .map(|ring| ring.alpha)
            .unwrap_or(0)
    }

    pub fn is_dark(&self) -> bool {
        self.rings.is_empty()
    }
}

/// Why the light went out
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Exhaustion {
    /// Radius decayed to zero
    Radius,
    /// Timer budget elapsed
    Timer,
}

/// Light configuration for one level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LightConfig {
    pub base_radius: f32,
    pub decay: DecayPolicy,
    pub flicker_amplitude: f32,
    /// Flicker angular speed (radians per second)
    pub flicker_speed: f32,
    pub ring_step: f32,
    /// Seconds before the light goes out regardless of radius
    pub duration: Option<f32>,
}

/// Light state for the current level
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightField {
    config: LightConfig,
    /// Radius lost so far
    decayed: f32,
    /// Flicker phase accumulator (seconds)
    flicker_time: f32,
    /// Seconds of light used
    elapsed: f32,
    exhausted: Option<Exhaustion>,
    exhaustion_reported: bool,
}

impl LightField {
    /// A light that starts with no radius is exhausted from the outset
    pub fn new(config: LightConfig) -> Self {
        Self {
            config,
            decayed: 0.0,
            flicker_time: 0.0,
            elapsed: 0.0,
            exhausted: (config.base_radius <= 0.0).then_some(Exhaustion::Radius),
            exhaustion_reported: false,
        }
    }

    pub fn config(&self) -> &LightConfig {
        &self.config
    }

    /// Logical radius used for game-over checks
    pub fn radius(&self) -> f32 {
        if self.exhausted == Some(Exhaustion::Timer) {
            return 0.0;
        }
        (self.config.base_radius - self.decayed).max(0.0)
    }

    /// Seconds of light remaining, if timer-limited
    pub fn remaining_secs(&self) -> Option<f32> {
        self.config.duration.map(|d| (d - self.elapsed).max(0.0))
    }

    pub fn elapsed_secs(&self) -> f32 {
        self.elapsed
    }

    pub fn exhaustion(&self) -> Option<Exhaustion> {
        self.exhausted
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted.is_some()
    }

    /// Current flicker term `amplitude * sin(speed * t)`
    pub fn flicker(&self) -> f32 {
        self.config.flicker_amplitude * (self.config.flicker_speed * self.flicker_time).sin()
    }

    /// Report an accepted move (only decays under `DecayPolicy::PerMove`)
    pub fn on_move(&mut self) {
        if let DecayPolicy::PerMove { step } = self.config.decay {
            self.decay_by(step);
        }
    }

    /// Advance time by `dt` seconds and build this frame's mask
    pub fn tick(&mut self, dt: f32, player_pos: Vec2) -> VisibilityMask {
        if self.exhausted.is_none() {
            if let DecayPolicy::PerSecond { rate } = self.config.decay {
                self.decay_by(rate * dt);
            }
            self.elapsed += dt;
            if let Some(duration) = self.config.duration {
                if self.elapsed >= duration {
                    self.exhausted = Some(Exhaustion::Timer);
                }
            }
            if self.exhausted.is_none() && self.radius() <= 0.0 {
                self.exhausted = Some(Exhaustion::Radius);
            }
        }
        self.flicker_time += dt;
        self.mask(player_pos)
    }

    /// Returns the exhaustion cause the first time it is polled after the light goes out
    pub fn take_exhaustion(&mut self) -> Option<Exhaustion> {
        if self.exhaustion_reported {
            return None;
        }
        let cause = self.exhausted?;
        self.exhaustion_reported = true;
        Some(cause)
    }

    /// Mask for the current radius and flicker phase
    pub fn mask(&self, player_pos: Vec2) -> VisibilityMask {
        let radius = self.radius();
        if radius <= 0.0 {
            return VisibilityMask::dark(player_pos);
        }

        let phase = self.config.flicker_speed * self.flicker_time;
        let flicker = Vec2::new(phase.sin(), phase.cos()) * self.config.flicker_amplitude;
        let effective_radius = radius + flicker.x.abs();
        let center = player_pos + flicker * FLICKER_OFFSET_FACTOR;

        VisibilityMask {
            center,
            effective_radius,
            color: LIGHT_COLOR,
            rings: light_rings(effective_radius, self.config.ring_step),
        }
    }

    fn decay_by(&mut self, amount: f32) {
        if self.exhausted.is_some() {
            return;
        }
        self.decayed = (self.decayed + amount.max(0.0)).min(self.config.base_radius);
        if self.radius() <= 0.0 {
            self.exhausted = Some(Exhaustion::Radius);
        }
    }
}

/// Concentric rings from `radius` down to zero with linear alpha falloff
pub fn light_rings(radius: f32, step: f32) -> Vec<LightRing> {
    if radius <= 0.0 || step <= 0.0 {
        return Vec::new();
    }
    let outer = radius.floor();
    let count = (outer / step).ceil() as usize;
    (0..count)
        .map(|i| outer - i as f32 * step)
        .filter(|r| *r > 0.0)
        .map(|r| LightRing {
            radius: r,
            alpha: (255.0 * (1.0 - r / radius)).clamp(0.0, 255.0) as u8,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn config(decay: DecayPolicy) -> LightConfig {
        LightConfig {
            base_radius: 200.0,
            decay,
            flicker_amplitude: 15.0,
            flicker_speed: 6.0,
            ring_step: 10.0,
            duration: None,
        }
    }

    #[test]
    fn test_per_move_depletes_after_forty_moves() {
        let mut light = LightField::new(config(DecayPolicy::PerMove { step: 5.0 }));
        let mut signals = 0;
        for i in 0..40 {
            assert!(!light.is_exhausted(), "exhausted early at move {i}");
            light.on_move();
            light.tick(1.0 / 60.0, Vec2::ZERO);
            if light.take_exhaustion().is_some() {
                signals += 1;
            }
        }
        assert_eq!(light.radius(), 0.0);
        assert_eq!(light.exhaustion(), Some(Exhaustion::Radius));

        // More moves and ticks never report again
        for _ in 0..10 {
            light.on_move();
            light.tick(1.0 / 60.0, Vec2::ZERO);
            if light.take_exhaustion().is_some() {
                signals += 1;
            }
        }
        assert_eq!(signals, 1);
        assert_eq!(light.radius(), 0.0);
    }

    #[test]
    fn test_zero_radius_light_is_exhausted_while_idle() {
        let mut light = LightField::new(LightConfig {
            base_radius: 0.0,
            ..config(DecayPolicy::PerMove { step: 5.0 })
        });
        assert!(light.is_exhausted());
        light.tick(1.0 / 60.0, Vec2::ZERO);
        assert_eq!(light.take_exhaustion(), Some(Exhaustion::Radius));
        for _ in 0..600 {
            light.tick(1.0 / 60.0, Vec2::ZERO);
        }
        assert_eq!(light.take_exhaustion(), None);
        assert_eq!(light.radius(), 0.0);
    }

    #[test]
    fn test_per_move_ignores_idle_ticks() {
        let mut light = LightField::new(config(DecayPolicy::PerMove { step: 5.0 }));
        for _ in 0..600 {
            light.tick(1.0 / 60.0, Vec2::ZERO);
        }
        assert_eq!(light.radius(), 200.0);
    }

    #[test]
    fn test_per_second_decay() {
        let mut light = LightField::new(config(DecayPolicy::PerSecond { rate: 20.0 }));
        light.on_move();
        assert_eq!(light.radius(), 200.0);
        for _ in 0..60 {
            light.tick(1.0 / 60.0, Vec2::ZERO);
        }
        assert!((light.radius() - 180.0).abs() < 1e-3);
    }

    #[test]
    fn test_timer_exhaustion() {
        let mut light = LightField::new(LightConfig {
            duration: Some(1.0),
            ..config(DecayPolicy::PerSecond { rate: 0.0 })
        });
        for _ in 0..59 {
            light.tick(1.0 / 60.0, Vec2::ZERO);
        }
        assert!(!light.is_exhausted());
        assert!(light.remaining_secs().unwrap() > 0.0);
        for _ in 0..2 {
            light.tick(1.0 / 60.0, Vec2::ZERO);
        }
        assert_eq!(light.take_exhaustion(), Some(Exhaustion::Timer));
        assert_eq!(light.take_exhaustion(), None);
        assert_eq!(light.radius(), 0.0);
        assert!(light.mask(Vec2::ZERO).is_dark());
    }

    #[test]
    fn test_flicker_does_not_touch_logical_radius() {
        let mut light = LightField::new(config(DecayPolicy::PerMove { step: 5.0 }));
        let mut widened = false;
        for _ in 0..120 {
            let mask = light.tick(1.0 / 60.0, Vec2::new(100.0, 100.0));
            assert_eq!(light.radius(), 200.0);
            assert!(mask.effective_radius >= 200.0);
            assert!(mask.effective_radius <= 215.0);
            assert!(mask.center.distance(Vec2::new(100.0, 100.0)) <= 1.5 + 1e-4);
            widened |= mask.effective_radius > 200.0;
        }
        assert!(widened);
    }

    #[test]
    fn test_rings_fall_off_linearly() {
        let rings = light_rings(100.0, 10.0);
        assert_eq!(rings.len(), 10);
        assert_eq!(rings[0], LightRing { radius: 100.0, alpha: 0 });
        assert_eq!(rings[5].radius, 50.0);
        assert_eq!(rings[5].alpha, 127);
        assert_eq!(rings[9], LightRing { radius: 10.0, alpha: 229 });
        assert!(rings.windows(2).all(|w| w[0].radius > w[1].radius && w[0].alpha <= w[1].alpha));
    }

    #[test]
    fn test_alpha_at() {
        let mask = VisibilityMask {
            center: Vec2::ZERO,
            effective_radius: 100.0,
            color: LIGHT_COLOR,
            rings: light_rings(100.0, 10.0),
        };
        assert_eq!(mask.alpha_at(Vec2::new(5.0, 0.0)), 229);
        assert_eq!(mask.alpha_at(Vec2::new(45.0, 0.0)), 127);
        assert_eq!(mask.alpha_at(Vec2::new(150.0, 0.0)), 0);
    }

    proptest! {
        #[test]
        fn prop_radius_non_increasing(
            steps in proptest::collection::vec((any::<bool>(), 0.0f32..0.1), 1..400),
            per_move in any::<bool>(),
        ) {
            let decay = if per_move {
                DecayPolicy::PerMove { step: 5.0 }
            } else {
                DecayPolicy::PerSecond { rate: 50.0 }
            };
            let mut light = LightField::new(LightConfig {
                duration: Some(5.0),
                ..config(decay)
            });
            let mut last = light.radius();
            let mut hit_zero = false;
            for (moved, dt) in steps {
                if moved {
                    light.on_move();
                }
                light.tick(dt, Vec2::ZERO);
                let r = light.radius();
                prop_assert!(r <= last);
                prop_assert!(r >= 0.0);
                if hit_zero {
                    prop_assert_eq!(r, 0.0);
                }
                hit_zero |= r == 0.0;
                last = r;
            }
        }
    }
}
