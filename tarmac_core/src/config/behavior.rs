// tarmac_core/src/config/behavior.rs

use serde::{Deserialize, Serialize};

use crate::models::friction::FrictionCurve;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorKind {
    Simulator,
    Racing,
    SemiArcade,
    Drift,
    Fun,
}

impl BehaviorKind {
    pub const ALL: [BehaviorKind; 5] = [
        BehaviorKind::Simulator,
        BehaviorKind::Racing,
        BehaviorKind::SemiArcade,
        BehaviorKind::Drift,
        BehaviorKind::Fun,
    ];
}

/// A named bundle of handling settings applied over a vehicle's own tuning.
///
/// Strength fields are `(min, max)` bounds the vehicle's value is clamped into,
/// so a profile narrows tuning instead of erasing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BehaviorProfile {
    pub kind: BehaviorKind,
    pub steering_helper: bool,
    pub traction_helper: bool,
    pub abs: bool,
    pub esp: bool,
    pub tcs: bool,
    pub drift_mode: bool,
    pub steer_helper_linear_strength: (f64, f64),
    pub steer_helper_angular_strength: (f64, f64),
    pub traction_helper_strength: (f64, f64),
    pub anti_roll_minimum: f64,
    pub gear_shift_threshold: f64,
    /// Lower bound on the high-speed steer angle [deg].
    pub high_speed_steer_angle_minimum: f64,
    pub forward_friction: FrictionCurve,
    pub sideways_friction: FrictionCurve,
}

impl BehaviorProfile {
    pub fn preset(kind: BehaviorKind) -> Self {
        let base = Self {
            kind,
            steering_helper: true,
            traction_helper: true,
            abs: true,
            esp: true,
            tcs: true,
            drift_mode: false,
            steer_helper_linear_strength: (0.0, 0.5),
            steer_helper_angular_strength: (0.0, 0.5),
            traction_helper_strength: (0.0, 0.5),
            anti_roll_minimum: 500.0,
            gear_shift_threshold: 0.8,
            high_speed_steer_angle_minimum: 5.0,
            forward_friction: FrictionCurve::forward(),
            sideways_friction: FrictionCurve::sideways(),
        };

        match kind {
            BehaviorKind::Simulator => Self {
                steering_helper: false,
                traction_helper: false,
                steer_helper_linear_strength: (0.0, 0.0),
                steer_helper_angular_strength: (0.0, 0.0),
                traction_helper_strength: (0.0, 0.0),
                ..base
            },
            BehaviorKind::Racing => Self {
                steer_helper_linear_strength: (0.1, 0.3),
                steer_helper_angular_strength: (0.1, 0.3),
                traction_helper_strength: (0.1, 0.3),
                anti_roll_minimum: 1500.0,
                gear_shift_threshold: 0.9,
                forward_friction: FrictionCurve::forward().with_stiffness(1.1),
                sideways_friction: FrictionCurve::sideways().with_stiffness(1.1),
                ..base
            },
            BehaviorKind::SemiArcade => Self {
                steer_helper_linear_strength: (0.25, 1.0),
                steer_helper_angular_strength: (0.25, 1.0),
                traction_helper_strength: (0.25, 1.0),
                anti_roll_minimum: 2000.0,
                high_speed_steer_angle_minimum: 10.0,
                sideways_friction: FrictionCurve::sideways().with_stiffness(1.25),
                ..base
            },
            BehaviorKind::Drift => Self {
                abs: false,
                esp: false,
                tcs: false,
                drift_mode: true,
                steer_helper_linear_strength: (0.0, 0.25),
                steer_helper_angular_strength: (0.25, 1.0),
                traction_helper_strength: (0.0, 0.1),
                anti_roll_minimum: 2500.0,
                gear_shift_threshold: 0.75,
                high_speed_steer_angle_minimum: 20.0,
                forward_friction: FrictionCurve::forward().with_stiffness(0.9),
                sideways_friction: FrictionCurve {
                    extremum_slip: 0.35,
                    extremum_value: 0.9,
                    asymptote_slip: 0.8,
                    asymptote_value: 0.65,
                    stiffness: 0.8,
                },
                ..base
            },
            BehaviorKind::Fun => Self {
                esp: false,
                steer_helper_linear_strength: (0.5, 1.0),
                steer_helper_angular_strength: (0.5, 1.0),
                traction_helper_strength: (0.5, 1.0),
                anti_roll_minimum: 3000.0,
                gear_shift_threshold: 0.7,
                high_speed_steer_angle_minimum: 15.0,
                forward_friction: FrictionCurve::forward().with_stiffness(1.5),
                sideways_friction: FrictionCurve::sideways().with_stiffness(1.5),
                ..base
            },
        }
    }

    /// One profile per [`BehaviorKind`], in declaration order.
    pub fn presets() -> Vec<Self> {
        BehaviorKind::ALL.into_iter().map(Self::preset).collect()
    }
}
