//! Output control: ambient band classification and brightness ramps.

pub mod ambient;
pub mod ramp;
