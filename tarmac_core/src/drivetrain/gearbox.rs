// tarmac_core/src/drivetrain/gearbox.rs

//! Gear table and the shift state machine.
//!
//! A shift is never instant: every request goes through `Shifting`, holds the
//! clutch open for the shift delay and only then commits the new gear and
//! direction. Requests made while a shift is in progress are dropped.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{GearboxConfig, ShiftMode};
use crate::utils::math::lerp;

/// Pedal position that counts as "pressed" for reverse arbitration.
const PEDAL_ENGAGED: f64 = 0.1;
/// Brake pedal needed at a standstill to request reverse.
const REVERSE_BRAKE: f64 = 0.9;
/// Forward velocity band [m/s] treated as "stopped" when switching direction.
const STOPPED_VELOCITY: f64 = 1.0;
/// Speed [km/h] below which a released brake re-arms reverse.
const REVERSE_REARM_SPEED: f64 = 5.0;

// =========================================================================
// == Gear Table ==
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gear {
    pub ratio: f64,
    /// Highest speed this gear is meant to reach [km/h].
    pub max_speed: f64,
    /// Speed above which the gearbox shifts out of this gear [km/h].
    pub target_shift_speed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GearTable {
    gears: Vec<Gear>,
    built_for: (usize, f64, f64),
}

impl GearTable {
    /// Stock ratios per gear count. Each row strictly decreases.
    fn ratios(count: usize) -> &'static [f64] {
        match count {
            0 | 1 => &[1.0],
            2 => &[2.0, 1.0],
            3 => &[2.0, 1.5, 1.0],
            4 => &[2.86, 1.62, 1.0, 0.72],
            5 => &[4.23, 2.52, 1.66, 1.22, 1.0],
            6 => &[4.35, 2.5, 1.66, 1.23, 1.0, 0.85],
            7 => &[4.5, 2.5, 1.66, 1.23, 1.0, 0.9, 0.8],
            _ => &[4.6, 2.5, 1.86, 1.43, 1.23, 1.05, 0.9, 0.72],
        }
    }

    /// Builds `count` gears (clamped to 1..=8) spread over `top_speed`.
    pub fn build(count: usize, top_speed: f64, shift_threshold: f64) -> Self {
        let ratios = Self::ratios(count);
        let n = ratios.len() as f64;
        let top_speed = top_speed.max(1.0);

        let gears = ratios
            .iter()
            .enumerate()
            .map(|(i, &ratio)| {
                let step = (i + 1) as f64;
                Gear {
                    ratio,
                    max_speed: (top_speed / n * step).round(),
                    target_shift_speed: lerp(0.0, top_speed * shift_threshold, step / n).round(),
                }
            })
            .collect();

        Self {
            gears,
            built_for: (count, top_speed, shift_threshold),
        }
    }

    pub fn matches(&self, count: usize, top_speed: f64, shift_threshold: f64) -> bool {
        self.built_for == (count, top_speed.max(1.0), shift_threshold)
    }

    pub fn gear(&self, index: usize) -> Option<&Gear> {
        self.gears.get(index)
    }

    pub fn gears(&self) -> &[Gear] {
        &self.gears
    }

    pub fn len(&self) -> usize {
        self.gears.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gears.is_empty()
    }

    pub fn last_index(&self) -> usize {
        self.gears.len().saturating_sub(1)
    }
}

// =========================================================================
// == State Machine ==
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GearTarget {
    Neutral,
    Gear(usize),
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GearState {
    Neutral,
    /// Zero-based forward gear.
    InGear(usize),
    Reverse,
    Shifting { target: GearTarget, remaining: f64 },
}

impl GearState {
    pub fn is_shifting(&self) -> bool {
        matches!(self, GearState::Shifting { .. })
    }
}

/// A committed shift.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GearChange {
    pub from: GearState,
    pub to: GearState,
}

/// Per-tick gearbox inputs. Pedals are the effective ones, after the reverse swap.
#[derive(Debug, Clone, Copy)]
pub struct GearboxInputs {
    pub speed_kmh: f64,
    /// Signed velocity along the chassis forward axis [m/s].
    pub forward_velocity: f64,
    pub rpm: f64,
    pub throttle: f64,
    pub brake: f64,
    pub dt: f64,
}

#[derive(Debug, Clone)]
pub struct Gearbox {
    config: GearboxConfig,
    top_speed: f64,
    table: Option<GearTable>,
    state: GearState,
    /// State the current shift started from.
    shift_origin: GearState,
    gear: usize,
    direction: i8,
    reverse_allowed: bool,
}

impl Gearbox {
    pub fn new(config: &GearboxConfig, top_speed: f64) -> Self {
        Self {
            config: config.clone(),
            top_speed,
            table: None,
            state: GearState::InGear(0),
            shift_origin: GearState::InGear(0),
            gear: 0,
            direction: 1,
            reverse_allowed: true,
        }
    }

    /// Replaces the tunables. The gear table is rebuilt lazily if anything it
    /// depends on changed.
    pub fn sync_config(&mut self, config: &GearboxConfig, top_speed: f64) {
        self.config = config.clone();
        self.top_speed = top_speed;
    }

    /// The gear table, rebuilt if gear count, top speed or threshold changed.
    pub fn table(&mut self) -> &GearTable {
        let (count, top, threshold) = (
            self.config.gear_count,
            self.top_speed,
            self.config.shift_threshold,
        );
        let stale = self
            .table
            .as_ref()
            .map_or(true, |t| !t.matches(count, top, threshold));
        if stale {
            debug!(count, top_speed = top, threshold, "building gear table");
            self.table = Some(GearTable::build(count, top, threshold));
        }
        self.table
            .get_or_insert_with(|| GearTable::build(count, top, threshold))
    }

    pub fn state(&self) -> GearState {
        self.state
    }

    /// Zero-based index of the engaged forward gear (0 in reverse).
    pub fn gear(&self) -> usize {
        self.gear
    }

    /// +1 forward, -1 reverse, 0 neutral.
    pub fn direction(&self) -> i8 {
        self.direction
    }

    pub fn is_shifting(&self) -> bool {
        self.state.is_shifting()
    }

    pub fn is_neutral(&self) -> bool {
        self.state == GearState::Neutral
    }

    pub fn reverse_allowed(&self) -> bool {
        self.reverse_allowed
    }

    pub fn current_gear(&mut self) -> Gear {
        let index = self.gear;
        let table = self.table();
        table
            .gear(index)
            .or_else(|| table.gear(table.last_index()))
            .copied()
            .unwrap_or(Gear {
                ratio: 1.0,
                max_speed: 0.0,
                target_shift_speed: 0.0,
            })
    }

    // --- Requests ---

    fn begin_shift(&mut self, target: GearTarget) -> bool {
        if self.is_shifting() {
            return false;
        }
        debug!(?target, from = ?self.state, "shift requested");
        self.shift_origin = self.state;
        self.state = GearState::Shifting {
            target,
            remaining: self.config.shift_delay.max(0.0),
        };
        true
    }

    pub fn shift_up(&mut self) -> bool {
        let last = self.table().last_index();
        match self.state {
            GearState::InGear(n) if n < last => self.begin_shift(GearTarget::Gear(n + 1)),
            GearState::Neutral | GearState::Reverse => self.begin_shift(GearTarget::Gear(0)),
            _ => false,
        }
    }

    pub fn shift_down(&mut self) -> bool {
        match self.state {
            GearState::InGear(n) if n > 0 => self.begin_shift(GearTarget::Gear(n - 1)),
            GearState::InGear(0) | GearState::Neutral if self.reverse_allowed => {
                self.begin_shift(GearTarget::Reverse)
            }
            _ => false,
        }
    }

    pub fn shift_to_neutral(&mut self) -> bool {
        match self.state {
            GearState::Neutral | GearState::Shifting { .. } => false,
            _ => self.begin_shift(GearTarget::Neutral),
        }
    }

    // --- Update ---

    /// Advances the state machine one tick. Returns the change committed this
    /// tick, if any.
    pub fn update(&mut self, inputs: &GearboxInputs) -> Option<GearChange> {
        if !self.config.auto_reverse {
            self.update_reverse_latch(inputs);
        } else {
            self.reverse_allowed = true;
        }

        if let GearState::Shifting { target, remaining } = self.state {
            let remaining = remaining - inputs.dt;
            if remaining > 0.0 {
                self.state = GearState::Shifting { target, remaining };
                return None;
            }
            return Some(self.commit(target));
        }

        if let Some(target) = self.automatic_target(inputs) {
            self.begin_shift(target);
        }
        None
    }

    fn update_reverse_latch(&mut self, inputs: &GearboxInputs) {
        if inputs.brake < 0.5 && inputs.speed_kmh < REVERSE_REARM_SPEED {
            self.reverse_allowed = true;
        } else if inputs.brake > 0.0 && inputs.forward_velocity > STOPPED_VELOCITY {
            self.reverse_allowed = false;
        }
    }

    fn automatic_target(&mut self, inputs: &GearboxInputs) -> Option<GearTarget> {
        let mode = self.config.mode;
        if mode == ShiftMode::Manual {
            return None;
        }
        let auto_direction = mode == ShiftMode::Automatic;
        let (shift_up_rpm, shift_down_rpm) = (self.config.shift_up_rpm, self.config.shift_down_rpm);
        let direction = self.direction;
        let reverse_allowed = self.reverse_allowed;
        let state = self.state;
        let table = self.table();

        let wants_reverse = inputs.brake >= REVERSE_BRAKE
            && inputs.forward_velocity <= STOPPED_VELOCITY
            && reverse_allowed
            && direction != -1;

        match state {
            GearState::InGear(n) => {
                let up = table.gear(n).is_some_and(|g| {
                    n < table.last_index()
                        && direction == 1
                        && inputs.speed_kmh >= g.target_shift_speed
                        && inputs.rpm >= shift_up_rpm
                });
                let down = n > 0
                    && table.gear(n - 1).is_some_and(|g| {
                        inputs.speed_kmh < g.target_shift_speed && inputs.rpm <= shift_down_rpm
                    });

                if up {
                    Some(GearTarget::Gear(n + 1))
                } else if down {
                    Some(GearTarget::Gear(n - 1))
                } else if n == 0 && auto_direction && wants_reverse {
                    Some(GearTarget::Reverse)
                } else {
                    None
                }
            }
            GearState::Neutral if auto_direction => {
                if wants_reverse {
                    Some(GearTarget::Reverse)
                } else if inputs.throttle >= PEDAL_ENGAGED {
                    Some(GearTarget::Gear(0))
                } else {
                    None
                }
            }
            GearState::Reverse if auto_direction => {
                (inputs.throttle < PEDAL_ENGAGED && inputs.forward_velocity >= -STOPPED_VELOCITY)
                    .then_some(GearTarget::Gear(0))
            }
            _ => None,
        }
    }

    fn commit(&mut self, target: GearTarget) -> GearChange {
        let from = self.shift_origin;
        self.state = match target {
            GearTarget::Gear(n) => {
                let last = self.table().last_index();
                self.gear = n.min(last);
                self.direction = 1;
                GearState::InGear(self.gear)
            }
            GearTarget::Reverse => {
                self.gear = 0;
                self.direction = -1;
                GearState::Reverse
            }
            GearTarget::Neutral => {
                self.direction = 0;
                GearState::Neutral
            }
        };
        debug!(?from, to = ?self.state, "gear committed");
        GearChange {
            from,
            to: self.state,
        }
    }
}
