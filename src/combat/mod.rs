//! Health, damage sources and death.
//!
//! Weapons and contact both go through [`deal_damage`], so a kill always
//! produces exactly one [`DeathEvent`].
pub mod damage;
pub mod health;

pub use damage::*;
pub use health::*;
