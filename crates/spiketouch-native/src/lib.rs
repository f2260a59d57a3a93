//! SpikeTouch Native - Host runtime for the haptic pipeline
//!
//! This crate runs the `no_std` core on a desktop or single-board host:
//! - Configuration loading and validation (JSON)
//! - Shared grain cache so the tick loop never synthesizes
//! - Pointer tracking with a torn-read-free snapshot handoff
//! - Haptic engine and a fixed-rate tick scheduler
//! - UDP control bridge for remote rendering
//!
//! # Modules
//!
//! - [`config`]: [`HapticConfig`] and its sections
//! - [`cache`]: [`GrainCache`]
//! - [`player`]: [`ChannelPlayer`] seam and built-in players
//! - [`pointer`]: [`PointerTracker`] and [`PointerSnapshot`]
//! - [`engine`]: [`HapticEngine`]
//! - [`scheduler`]: [`Scheduler`] and [`SchedulerHandle`]
//! - [`bridge`]: UDP control protocol, server and client
//! - [`error`]: Error types

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::cast_possible_truncation)]

pub mod bridge;
pub mod cache;
pub mod config;
pub mod engine;
pub mod error;
pub mod player;
pub mod pointer;
pub mod scheduler;

// Re-export key types
pub use cache::{GrainCache, GrainKey};
pub use config::{HapticConfig, PointerConfig, SchedulerConfig, ServerConfig, SoundConfig};
pub use engine::HapticEngine;
pub use error::{BridgeError, BridgeResult, ConfigError, ConfigResult, ProtocolError, ProtocolResult};
pub use player::{ChannelPlayer, RecordingPlayer, TracingPlayer, Volume};
pub use pointer::{PointerSnapshot, PointerTracker};
pub use scheduler::{Scheduler, SchedulerHandle, SchedulerStats};
