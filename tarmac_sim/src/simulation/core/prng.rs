// tarmac_sim/src/simulation/core/prng.rs

use bevy::prelude::Resource;
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use rand_distr::{Distribution, Normal};

/// A newtype wrapper around `ChaCha8Rng` to make it a Bevy Resource.
/// This is the central, deterministic pseudo-random number generator for the simulation.
#[derive(Resource)]
pub struct SimulationRng(pub ChaCha8Rng);

/// Zero-mean Gaussian noise on the suspension force, standing in for an
/// uneven road surface.
#[derive(Resource, Debug, Clone, Copy)]
pub struct RoadRoughness {
    noise: Option<Normal<f64>>,
}

impl RoadRoughness {
    /// A non-positive or non-finite deviation yields a perfectly smooth road.
    pub fn new(stddev: f64) -> Self {
        let noise = (stddev.is_finite() && stddev > 0.0)
            .then(|| Normal::new(0.0, stddev).ok())
            .flatten();
        Self { noise }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        self.noise.map_or(0.0, |normal| normal.sample(rng))
    }
}
