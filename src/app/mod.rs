//! Application core: domain logic behind port traits.
//!
//! This module contains the business rules for the Nightwatch controller:
//! shared control state, command handling, and the sensor monitoring
//! loop.  All interaction with hardware happens through **port traits**
//! defined in [`ports`], keeping this layer fully testable without real
//! peripherals.

pub mod commands;
pub mod events;
pub mod monitor;
pub mod ports;
pub mod service;
pub mod state;
