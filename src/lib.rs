pub mod camera;
pub mod combat;
pub mod debug;
pub mod error;
pub mod input;
pub mod interaction;
pub mod physics;
pub mod player;
pub mod ron;
pub mod settings;
pub mod ui;
