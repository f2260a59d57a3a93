//! UDP control client

use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use super::protocol::{check_payload, encode, ControlCommand, GrainKind, LEGACY_RESET};
use crate::error::BridgeResult;

/// Sends control commands to a [`ControlServer`](super::ControlServer).
#[derive(Debug)]
pub struct ControlClient {
    socket: UdpSocket,
    target: SocketAddr,
}

impl ControlClient {
    /// Create a client for `target` (e.g., "127.0.0.1:5005")
    ///
    /// # Errors
    ///
    /// Bind failure or an unresolvable target.
    pub fn new(target: &str) -> BridgeResult<Self> {
        let socket = UdpSocket::bind("0.0.0.0:0")?;
        let target = target.to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(io::ErrorKind::InvalidInput, format!("Invalid target address: {target}"))
        })?;
        Ok(Self { socket, target })
    }

    /// Server address
    pub fn target(&self) -> SocketAddr {
        self.target
    }

    /// Send a command; returns bytes sent.
    ///
    /// # Errors
    ///
    /// Encoding, size or socket errors.
    pub fn send(&self, command: &ControlCommand) -> BridgeResult<usize> {
        let payload = encode(command)?;
        Ok(self.socket.send_to(&payload, self.target)?)
    }

    /// Send raw bytes after the size check
    ///
    /// # Errors
    ///
    /// [`ProtocolError::PayloadTooLarge`](crate::error::ProtocolError::PayloadTooLarge)
    /// or socket errors.
    pub fn send_raw(&self, payload: &[u8]) -> BridgeResult<usize> {
        check_payload(payload)?;
        Ok(self.socket.send_to(payload, self.target)?)
    }

    /// Send the legacy bare `reset`
    ///
    /// # Errors
    ///
    /// Socket errors.
    pub fn send_reset_legacy(&self) -> BridgeResult<usize> {
        self.send_raw(LEGACY_RESET)
    }

    /// Play a pre-rendered grain
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn play(&self, types: GrainKind, channel_id: i32, volume: f32) -> BridgeResult<usize> {
        self.send(&ControlCommand::Play {
            types,
            channel_id,
            volume,
        })
    }

    /// Replace the RA grain
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn change(&self, hz: u32, ms: u32, amp: f32, fade_out_ms: u32) -> BridgeResult<usize> {
        self.send(&ControlCommand::Change {
            hz,
            ms,
            amp,
            fade_out_ms,
        })
    }

    /// Request a reset
    ///
    /// # Errors
    ///
    /// See [`send`](Self::send).
    pub fn reset(&self) -> BridgeResult<usize> {
        self.send(&ControlCommand::Reset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::protocol::{decode, MAX_PAYLOAD};
    use crate::error::{BridgeError, ProtocolError};

    #[test]
    fn test_send_reaches_socket() {
        let server = UdpSocket::bind("127.0.0.1:0").unwrap();
        let client = ControlClient::new(&server.local_addr().unwrap().to_string()).unwrap();

        client.change(40, 90, 1.0, 5).unwrap();
        client.send_reset_legacy().unwrap();

        let mut buf = [0u8; 1024];
        let (len, _) = server.recv_from(&mut buf).unwrap();
        assert!(matches!(decode(&buf[..len]).unwrap(), ControlCommand::Change { hz: 40, .. }));
        let (len, _) = server.recv_from(&mut buf).unwrap();
        assert_eq!(&buf[..len], b"reset");
    }

    #[test]
    fn test_oversized_raw_rejected() {
        let client = ControlClient::new("127.0.0.1:9").unwrap();
        let err = client.send_raw(&vec![0u8; MAX_PAYLOAD + 1]).unwrap_err();
        assert!(matches!(err, BridgeError::Protocol(ProtocolError::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_bad_target() {
        assert!(ControlClient::new("not an address").is_err());
    }
}
