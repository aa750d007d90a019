// tarmac_core/src/config/ground.rs

use serde::{Deserialize, Serialize};

/// Surface properties looked up by the index a contact report carries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroundMaterial {
    pub name: String,
    pub forward_stiffness: f64,
    pub sideways_stiffness: f64,
    /// Forward slip above which TCS starts cutting torque.
    pub slip_threshold: f64,
    /// Extra rolling resistance the host applies on this surface.
    pub damping: f64,
}

impl Default for GroundMaterial {
    fn default() -> Self {
        Self::new("asphalt", 1.0, 1.0, 0.25, 0.0)
    }
}

impl GroundMaterial {
    pub fn new(
        name: &str,
        forward_stiffness: f64,
        sideways_stiffness: f64,
        slip_threshold: f64,
        damping: f64,
    ) -> Self {
        Self {
            name: name.to_string(),
            forward_stiffness,
            sideways_stiffness,
            slip_threshold,
            damping,
        }
    }

    /// Asphalt first, so that index 0 is the road.
    pub fn standard_set() -> Vec<Self> {
        vec![
            Self::default(),
            Self::new("grass", 0.7, 0.6, 0.15, 0.5),
            Self::new("sand", 0.5, 0.45, 0.1, 1.5),
            Self::new("gravel", 0.75, 0.65, 0.2, 0.3),
            Self::new("ice", 0.25, 0.2, 0.05, 0.0),
        ]
    }
}
