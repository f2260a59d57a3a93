//! Control wire protocol
//!
//! One command per UDP datagram, encoded as compact JSON with a `command`
//! discriminator:
//!
//! ```text
//! {"command":"play","types":"sa","channel_id":0,"volume":0.8}
//! {"command":"change","hz":40,"ms":90,"amp":1.0,"fade_out_ms":5}
//! {"command":"reset"}
//! ```
//!
//! The bare bytes `reset` are accepted as a legacy reset. Unknown extra
//! fields (timestamps and the like) are ignored.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{ProtocolError, ProtocolResult};

/// Largest UDP payload over IPv4 (bytes)
pub const MAX_PAYLOAD: usize = 65_507;

/// Legacy reset datagram
pub const LEGACY_RESET: &[u8] = b"reset";

const COMMAND_NAMES: [&str; 3] = ["play", "change", "reset"];

/// Which pre-rendered grain a `play` refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrainKind {
    /// Slowly adapting (pressure) grain
    Sa,
    /// Rapidly adapting (motion) grain
    Ra,
}

/// Remote rendering command.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "lowercase")]
pub enum ControlCommand {
    /// Play a pre-rendered grain
    Play {
        /// Grain to play
        types: GrainKind,
        /// Output channel
        channel_id: i32,
        /// Volume, clamped by the player
        volume: f32,
    },
    /// Replace the RA grain
    Change {
        /// Frequency (Hz)
        hz: u32,
        /// Length (ms)
        ms: u32,
        /// Amplitude
        amp: f32,
        /// Release (ms)
        fade_out_ms: u32,
    },
    /// Out-of-band hardware reset request
    Reset,
}

impl ControlCommand {
    /// Wire name of the command
    pub fn name(&self) -> &'static str {
        match self {
            Self::Play { .. } => "play",
            Self::Change { .. } => "change",
            Self::Reset => "reset",
        }
    }
}

fn trim_ascii_whitespace(mut bytes: &[u8]) -> &[u8] {
    while let [first, rest @ ..] = bytes {
        if first.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    while let [rest @ .., last] = bytes {
        if last.is_ascii_whitespace() {
            bytes = rest;
        } else {
            break;
        }
    }
    bytes
}

/// Decode one datagram.
///
/// # Errors
///
/// [`ProtocolError::UnknownCommand`] for JSON with an unrecognized
/// `command`, [`ProtocolError::Decode`] for anything else that is neither a
/// valid command nor the legacy reset.
pub fn decode(datagram: &[u8]) -> ProtocolResult<ControlCommand> {
    let trimmed = trim_ascii_whitespace(datagram);
    if trimmed == LEGACY_RESET {
        return Ok(ControlCommand::Reset);
    }

    let value: Value = serde_json::from_slice(trimmed).map_err(|e| ProtocolError::Decode {
        reason: e.to_string(),
    })?;
    if let Some(name) = value.get("command").and_then(Value::as_str) {
        if !COMMAND_NAMES.contains(&name) {
            return Err(ProtocolError::UnknownCommand(name.to_string()));
        }
    }

    serde_json::from_value(value).map_err(|e| ProtocolError::Decode {
        reason: e.to_string(),
    })
}

/// Reject payloads that do not fit in one datagram.
///
/// # Errors
///
/// [`ProtocolError::PayloadTooLarge`] above [`MAX_PAYLOAD`] bytes.
pub fn check_payload(payload: &[u8]) -> ProtocolResult<()> {
    if payload.len() > MAX_PAYLOAD {
        return Err(ProtocolError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }
    Ok(())
}

/// Encode a command as compact JSON.
///
/// # Errors
///
/// [`ProtocolError::Encode`] if serialization fails,
/// [`ProtocolError::PayloadTooLarge`] if the result exceeds one datagram.
pub fn encode(command: &ControlCommand) -> ProtocolResult<Vec<u8>> {
    let payload = serde_json::to_vec(command).map_err(ProtocolError::Encode)?;
    check_payload(&payload)?;
    Ok(payload)
}
