pub mod config;
pub mod constants;
pub mod engine;
pub mod error;
pub mod ghost;
pub mod level;
pub mod mover;
pub mod rng;
pub mod types;
