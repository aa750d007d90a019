// tarmac_core/src/lib.rs

pub mod assists;
pub mod config;
pub mod context;
pub mod drivetrain;
pub mod error;
pub mod models;
pub mod prelude;
pub mod telemetry;
pub mod types;
pub mod utils;
pub mod vehicle;
pub mod wheel;
