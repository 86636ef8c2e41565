pub mod constants;
pub mod engine;
pub mod error;
pub mod events;
pub mod geometry;
pub mod hazards;
pub mod input;
pub mod scoreboard;
pub mod snake;
pub mod snapshot;
pub mod timers;
pub mod types;
