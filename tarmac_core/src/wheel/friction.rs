// tarmac_core/src/wheel/friction.rs

//! Per-tick friction adaptation.
//!
//! The configured curves are never mutated; each tick a fresh pair is derived
//! from them and the current surface, handbrake, deflation and drift state.

use crate::config::GroundMaterial;
use crate::models::friction::FrictionCurve;

/// Handbrake lever position above which the rear starts sliding.
const HANDBRAKE_SLIDE: f64 = 0.75;

#[derive(Debug, Clone, Copy)]
pub struct FrictionInputs<'a> {
    pub ground: Option<&'a GroundMaterial>,
    pub handbrake: f64,
    pub can_handbrake: bool,
    /// Scale on sideways stiffness from the traction helper.
    pub sideways_multiplier: f64,
    /// Stiffness scale while deflated, 1 otherwise.
    pub deflation: f64,
    pub drift: Option<DriftInputs>,
    pub is_front: bool,
}

#[derive(Debug, Clone, Copy)]
pub struct DriftInputs {
    /// Chassis lateral velocity [m/s].
    pub lateral_velocity: f64,
    pub forward_slip: f64,
}

/// Returns the (forward, sideways) curves for this tick.
pub fn adapt(
    forward: &FrictionCurve,
    sideways: &FrictionCurve,
    inputs: &FrictionInputs,
) -> (FrictionCurve, FrictionCurve) {
    let (ground_forward, ground_sideways) = inputs
        .ground
        .map_or((1.0, 1.0), |g| (g.forward_stiffness, g.sideways_stiffness));

    let mut fwd = forward.with_stiffness(forward.stiffness * ground_forward * inputs.deflation);
    let mut side = sideways.with_stiffness(
        sideways.stiffness * ground_sideways * inputs.sideways_multiplier * inputs.deflation,
    );

    if inputs.can_handbrake && inputs.handbrake > HANDBRAKE_SLIDE {
        side.stiffness *= 0.5;
    }

    if let Some(drift) = inputs.drift {
        let sq = drift.lateral_velocity.powi(2) / 100.0 + drift.forward_slip.max(0.0);
        let (forward_floor, sideways_floor) = if inputs.is_front { (0.75, 0.45) } else { (0.5, 0.4) };
        apply_drift(&mut fwd, sq, forward_floor);
        apply_drift(&mut side, sq, sideways_floor);
    }

    (fwd, side)
}

fn apply_drift(curve: &mut FrictionCurve, sq: f64, floor: f64) {
    curve.extremum_value = (1.0 - sq).clamp(floor, 1.0);
    curve.asymptote_value = (0.75 - sq / 2.0).clamp(floor, 1.0);
}
