//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world (serial console
//! today) that the [`LightingService`](super::service::LightingService)
//! interprets and acts upon.  Identifiers arrive as raw text and are
//! validated by the service, so rejection messages stay in one place.

use serde::Serialize;

use super::state::StatusSnapshot;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppCommand {
    /// Report the full controller status.
    GetStatus,

    /// Switch to the fault mode with this code ("1".."12").
    SetFaultMode(String),

    /// Switch a light on or off by name.
    SetActuator { name: String, on: bool },
}

/// Successful reply to an [`AppCommand`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AppResponse {
    Status(StatusSnapshot),
    Message { message: String },
}

impl AppResponse {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message {
            message: text.into(),
        }
    }
}
