// tarmac_sim/src/simulation/plugins/mod.rs

pub mod vehicles;
pub mod world;
