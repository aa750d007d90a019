// tarmac_core/src/models/friction.rs

use serde::{Deserialize, Serialize};

/// A tire friction curve in the extremum/asymptote form most wheel-contact
/// models use.
///
/// The curve rises from (0, 0) to the extremum point, falls (or rises) to the
/// asymptote point, then stays flat. The whole curve is scaled by `stiffness`,
/// which is the parameter the vehicle adapts every tick.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrictionCurve {
    pub extremum_slip: f64,
    pub extremum_value: f64,
    pub asymptote_slip: f64,
    pub asymptote_value: f64,
    pub stiffness: f64,
}

impl Default for FrictionCurve {
    fn default() -> Self {
        Self::forward()
    }
}

impl FrictionCurve {
    /// Stock longitudinal curve.
    pub fn forward() -> Self {
        Self {
            extremum_slip: 0.4,
            extremum_value: 1.0,
            asymptote_slip: 0.8,
            asymptote_value: 0.5,
            stiffness: 1.0,
        }
    }

    /// Stock lateral curve.
    pub fn sideways() -> Self {
        Self {
            extremum_slip: 0.2,
            extremum_value: 1.0,
            asymptote_slip: 0.5,
            asymptote_value: 0.75,
            stiffness: 1.0,
        }
    }

    /// Returns a copy with a different stiffness.
    pub fn with_stiffness(mut self, stiffness: f64) -> Self {
        self.stiffness = stiffness;
        self
    }

    /// Normalized friction coefficient for a signed slip. The result carries
    /// the sign of `slip` and is scaled by stiffness.
    pub fn evaluate(&self, slip: f64) -> f64 {
        if slip.is_nan() {
            return 0.0;
        }
        let s = slip.abs();
        let ex_slip = self.extremum_slip.max(1e-6);
        let as_slip = self.asymptote_slip.max(ex_slip + 1e-6);

        let value = if s <= ex_slip {
            // Linear at the origin, flat at the extremum.
            let t = s / ex_slip;
            self.extremum_value * t * (2.0 - t)
        } else if s <= as_slip {
            let t = (s - ex_slip) / (as_slip - ex_slip);
            let eased = t * t * (3.0 - 2.0 * t);
            self.extremum_value + (self.asymptote_value - self.extremum_value) * eased
        } else {
            self.asymptote_value
        };

        value * self.stiffness * slip.signum()
    }
}
