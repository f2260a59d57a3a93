//! UDP control server
//!
//! Receives [`ControlCommand`] datagrams and dispatches them to a
//! [`RemoteRenderer`], which holds the SA and RA grains and plays them on a
//! [`ChannelPlayer`]. Bad datagrams are logged and dropped; the loop only
//! ends when its shutdown future resolves.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use spiketouch_core::audio::{GrainSpec, MaterialShape, SoundBuffer, MAX_DURATION_MS};
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

use super::protocol::{decode, ControlCommand, GrainKind};
use crate::cache::GrainCache;
use crate::config::{HapticConfig, ServerConfig};
use crate::error::{BridgeResult, ConfigResult};
use crate::player::{ChannelPlayer, Volume};

// ============================================================================
// Renderer
// ============================================================================

/// Plays grains on behalf of a remote controller.
pub struct RemoteRenderer {
    cache: Arc<GrainCache>,
    player: Arc<dyn ChannelPlayer>,
    sa: Arc<SoundBuffer>,
    ra: Arc<SoundBuffer>,
    resets: u64,
}

impl RemoteRenderer {
    /// Start with the pressure grain as SA and the default material's
    /// motion grain as RA.
    ///
    /// # Errors
    ///
    /// [`ConfigError::UnknownMaterial`](crate::error::ConfigError::UnknownMaterial)
    /// if the default material is missing.
    pub fn new(
        config: &HapticConfig,
        cache: Arc<GrainCache>,
        player: Arc<dyn ChannelPlayer>,
    ) -> ConfigResult<Self> {
        let material = config.material(&config.default_material)?;
        let sa = cache.get_or_synthesize(&MaterialShape::Sine, config.sound.pressure.spec());
        let ra = cache.get_or_synthesize(&material.shape, config.sound.motion.spec_for(material));
        Ok(Self {
            cache,
            player,
            sa,
            ra,
            resets: 0,
        })
    }

    /// Execute one command.
    pub fn apply(&mut self, command: &ControlCommand) {
        match *command {
            ControlCommand::Play {
                types,
                channel_id,
                volume,
            } => {
                let Ok(channel) = u8::try_from(channel_id) else {
                    warn!(channel_id, "Channel id out of range, ignoring play");
                    return;
                };
                let buffer = match types {
                    GrainKind::Sa => &self.sa,
                    GrainKind::Ra => &self.ra,
                };
                self.player.play(buffer, channel, Volume::new(volume));
            }
            ControlCommand::Change {
                hz,
                ms,
                amp,
                fade_out_ms,
            } => {
                if f64::from(ms) > MAX_DURATION_MS {
                    warn!(ms, max_ms = MAX_DURATION_MS, "RA grain length capped");
                }
                let spec = GrainSpec::new(
                    f64::from(hz),
                    f64::from(ms),
                    f64::from(amp),
                    f64::from(fade_out_ms),
                );
                // Remote grains are arbitrary, so they replace RA without
                // entering the shared cache
                self.ra = Arc::new(self.cache.synthesizer().sine(spec));
                debug!(hz, ms, amp, fade_out_ms, samples = self.ra.len(), "RA grain replaced");
            }
            ControlCommand::Reset => {
                // Hardware reset is not performed here, only reported
                self.resets += 1;
                warn!(count = self.resets, "Reset requested");
            }
        }
    }

    /// Current SA grain
    pub fn sa(&self) -> &Arc<SoundBuffer> {
        &self.sa
    }

    /// Current RA grain
    pub fn ra(&self) -> &Arc<SoundBuffer> {
        &self.ra
    }

    /// Reset requests seen
    pub fn resets(&self) -> u64 {
        self.resets
    }
}

impl std::fmt::Debug for RemoteRenderer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteRenderer")
            .field("sa_samples", &self.sa.len())
            .field("ra_samples", &self.ra.len())
            .field("resets", &self.resets)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Server
// ============================================================================

/// Datagram counters from one server run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ServerStats {
    /// Commands decoded and applied
    pub dispatched: u64,
    /// Datagrams dropped as malformed
    pub dropped: u64,
}

/// Bound control socket.
#[derive(Debug)]
pub struct ControlServer {
    socket: UdpSocket,
    recv_buffer: usize,
}

impl ControlServer {
    /// Bind the configured address.
    ///
    /// # Errors
    ///
    /// [`BridgeError::Network`](crate::error::BridgeError::Network) if the
    /// address cannot be bound.
    pub async fn bind(config: &ServerConfig) -> BridgeResult<Self> {
        let socket = UdpSocket::bind(&config.bind).await?;
        info!("UDP control listening on {}", socket.local_addr()?);
        Ok(Self {
            socket,
            recv_buffer: config.recv_buffer.max(1),
        })
    }

    /// Address actually bound (useful with port 0)
    ///
    /// # Errors
    ///
    /// Socket query failure.
    pub fn local_addr(&self) -> BridgeResult<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Receive and dispatch until `shutdown` resolves.
    ///
    /// # Errors
    ///
    /// Never fails on bad input; receive errors are logged and the loop
    /// continues.
    pub async fn run<F>(
        self,
        renderer: &mut RemoteRenderer,
        shutdown: F,
    ) -> BridgeResult<ServerStats>
    where
        F: Future<Output = ()>,
    {
        let mut buf = vec![0u8; self.recv_buffer];
        let mut stats = ServerStats::default();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                () = &mut shutdown => {
                    info!(
                        dispatched = stats.dispatched,
                        dropped = stats.dropped,
                        "UDP control server stopping"
                    );
                    break;
                }
                received = self.socket.recv_from(&mut buf) => match received {
                    Ok((len, peer)) => match decode(&buf[..len]) {
                        Ok(command) => {
                            debug!(%peer, command = command.name(), "Control command");
                            renderer.apply(&command);
                            stats.dispatched += 1;
                        }
                        Err(e) => {
                            warn!(%peer, len, "Dropping datagram: {e}");
                            stats.dropped += 1;
                        }
                    },
                    Err(e) => warn!("UDP receive failed: {e}"),
                },
            }
        }

        Ok(stats)
    }
}
