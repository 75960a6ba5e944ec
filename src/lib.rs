//! Nightwatch firmware library.
//!
//! Exposes the pure-logic modules for integration testing and external
//! inspection. All ESP-IDF-specific code is guarded by the `espidf`
//! feature within each module; host builds substitute simulations.

#![deny(unused_must_use)]

pub mod actuators;
pub mod app;
pub mod config;
pub mod console;
pub mod control;
pub mod error;
pub mod fault;
pub mod pins;
pub mod safety;

pub mod adapters;
pub mod drivers;
pub mod sensors;
