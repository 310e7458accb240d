//! Things the player does by looking at the world: shooting and using.
//!
//! Both go through [`ScreenRay::try_to_hit`] against the active camera.
pub mod interact;
pub mod screen_ray;
pub mod weapon;

pub use interact::*;
pub use screen_ray::*;
pub use weapon::*;
