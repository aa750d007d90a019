// tarmac_core/src/models/mod.rs

//! Pure curve models evaluated by the drivetrain and the wheel contacts.

pub mod curve;
pub mod friction;
