//! UDP control bridge
//!
//! - [`protocol`]: JSON command codec with the legacy `reset` datagram
//! - [`server`]: tokio receive loop dispatching to a [`RemoteRenderer`]
//! - [`client`]: blocking sender for scripts and the CLI
//!
//! ```rust,ignore
//! use spiketouch_native::bridge::{ControlClient, GrainKind};
//!
//! let client = ControlClient::new("192.168.0.20:5005")?;
//! client.change(40, 90, 1.0, 5)?;
//! client.play(GrainKind::Ra, 1, 0.8)?;
//! ```

pub mod client;
pub mod protocol;
pub mod server;

pub use client::ControlClient;
pub use protocol::{check_payload, decode, encode, ControlCommand, GrainKind, LEGACY_RESET, MAX_PAYLOAD};
pub use server::{ControlServer, RemoteRenderer, ServerStats};
