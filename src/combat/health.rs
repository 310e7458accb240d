//! Hit points for anything that can be damaged.
use bevy::prelude::*;

use crate::error::{require_positive, ConfigError};

/// What a call to [`Health::take_damage`] did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DamageOutcome {
    /// Already dead, or the amount was not a positive finite number.
    Ignored,
    Damaged { remaining: f32 },
    /// This hit brought health to zero.
    Killed,
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Health {
    max: f32,
    current: f32,
    dead: bool,
}

impl Health {
    /// Full health.
    ///
    /// # Errors
    /// `max` must be finite and positive.
    pub fn new(max: f32) -> Result<Self, ConfigError> {
        let max = require_positive("max health", max)?;
        Ok(Self { max, current: max, dead: false })
    }

    #[must_use]
    pub fn max(&self) -> f32 { self.max }
    #[must_use]
    pub fn current(&self) -> f32 { self.current }
    #[must_use]
    pub fn is_dead(&self) -> bool { self.dead }

    /// Current health as a share of max, `0.0..=1.0`.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        self.current / self.max
    }

    pub fn take_damage(&mut self, amount: f32) -> DamageOutcome {
        if self.dead || !amount.is_finite() || amount <= 0.0 {
            return DamageOutcome::Ignored;
        }
        self.current -= amount;
        if self.current <= 0.0 {
            self.current = 0.0;
            self.dead = true;
            DamageOutcome::Killed
        } else {
            DamageOutcome::Damaged { remaining: self.current }
        }
    }

    /// Heal by `amount`, capped at max. A dead entity comes back only if
    /// the result is above zero. Returns the new current health.
    pub fn restore(&mut self, amount: f32) -> f32 {
        if amount.is_finite() && amount > 0.0 {
            self.current = (self.current + amount).min(self.max);
            if self.current > 0.0 {
                self.dead = false;
            }
        }
        self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_full() {
        let h = Health::new(50.0).unwrap();
        assert_eq!(h.current(), 50.0);
        assert!(!h.is_dead());
        assert_eq!(h.fraction(), 1.0);
    }

    #[test]
    fn rejects_bad_max() {
        assert!(Health::new(0.0).is_err());
        assert!(Health::new(f32::NAN).is_err());
    }

    #[test]
    fn overkill_clamps_to_zero_once() {
        let mut h = Health::new(30.0).unwrap();
        assert_eq!(h.take_damage(10.0), DamageOutcome::Damaged { remaining: 20.0 });
        assert_eq!(h.take_damage(100.0), DamageOutcome::Killed);
        assert_eq!(h.current(), 0.0);
        assert!(h.is_dead());
        assert_eq!(h.take_damage(5.0), DamageOutcome::Ignored);
    }

    #[test]
    fn exact_lethal_damage_kills() {
        let mut h = Health::new(10.0).unwrap();
        assert_eq!(h.take_damage(10.0), DamageOutcome::Killed);
    }

    #[test]
    fn non_positive_damage_is_ignored() {
        let mut h = Health::new(10.0).unwrap();
        assert_eq!(h.take_damage(0.0), DamageOutcome::Ignored);
        assert_eq!(h.take_damage(-3.0), DamageOutcome::Ignored);
        assert_eq!(h.take_damage(f32::INFINITY), DamageOutcome::Ignored);
        assert_eq!(h.current(), 10.0);
    }

    #[test]
    fn restore_caps_and_revives() {
        let mut h = Health::new(10.0).unwrap();
        h.take_damage(4.0);
        assert_eq!(h.restore(100.0), 10.0);

        h.take_damage(20.0);
        assert!(h.is_dead());
        assert_eq!(h.restore(0.0), 0.0);
        assert!(h.is_dead());
        assert_eq!(h.restore(3.0), 3.0);
        assert!(!h.is_dead());
    }
}
