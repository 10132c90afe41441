//! Typed packets for the configuration and play states.
//!
//! Only packets the translator inspects are decoded. Every other
//! packet id lands in the `Other` variant of its enum, which keeps
//! the id and body bytes so it re-encodes exactly as received.
//! Fields we never touch are likewise kept as trailing byte vectors.

use crate::protocol::{Decode, DecodeFallback, Decoder, Encode, Encoder};
use std::fmt::Debug;

pub mod client;
pub mod server;

/// Type encoding for a side (client or server).
pub trait Side: Send + Sync + 'static + Copy + Clone {
    type SendPacket<State: ProtocolState>: Encode + Debug + AsRef<str> + Send + 'static;
    type RecvPacket<State: ProtocolState>: Decode + Debug + AsRef<str> + Send + 'static;
}

pub mod side {
    use super::*;

    #[derive(Debug, Copy, Clone)]
    pub struct Server;
    impl Side for Server {
        type SendPacket<State: ProtocolState> = State::ServerPacket;
        type RecvPacket<State: ProtocolState> = State::ClientPacket;
    }

    #[derive(Debug, Copy, Clone)]
    pub struct Client;
    impl Side for Client {
        type SendPacket<State: ProtocolState> = State::ClientPacket;
        type RecvPacket<State: ProtocolState> = State::ServerPacket;
    }
}

/// Type encoding for a protocol state.
pub trait ProtocolState: Send + Sync + 'static {
    /// Packet type sent by the server in this state.
    type ServerPacket: Encode + Decode + Debug + AsRef<str> + Send + 'static;
    /// Packet type sent by the client in this state.
    type ClientPacket: Encode + Decode + Debug + AsRef<str> + Send + 'static;
}

pub mod state {
    use super::*;

    #[derive(Debug, Copy, Clone)]
    pub struct Configuration;
    impl ProtocolState for Configuration {
        type ServerPacket = server::configuration::Packet;
        type ClientPacket = client::configuration::Packet;
    }

    #[derive(Debug, Copy, Clone)]
    pub struct Play;
    impl ProtocolState for Play {
        type ServerPacket = server::play::Packet;
        type ClientPacket = client::play::Packet;
    }
}

/// A packet whose id no variant claims.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownPacket {
    pub id: i32,
    pub data: Vec<u8>,
}

impl DecodeFallback for UnknownPacket {
    fn decode_fallback(
        discriminant: i64,
        decoder: &mut Decoder,
    ) -> Result<Self, crate::protocol::DecodeError> {
        Ok(Self {
            id: i32::try_from(discriminant)?,
            data: decoder.consume_rest().to_vec(),
        })
    }
}

impl Encode for UnknownPacket {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_var_int(self.id);
        encoder.write_slice(&self.data);
    }
}

/// Resource pack status reported by the client.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ResourcePackStatus {
    SuccessfullyLoaded,
    Declined,
    FailedDownload,
    Accepted,
    Downloaded,
    InvalidUrl,
    FailedReload,
    Discarded,
}

impl Decode for ResourcePackStatus {
    fn decode(decoder: &mut Decoder) -> Result<Self, crate::protocol::DecodeError> {
        let status = match decoder.read_var_int()? {
            0 => Self::SuccessfullyLoaded,
            1 => Self::Declined,
            2 => Self::FailedDownload,
            3 => Self::Accepted,
            4 => Self::Downloaded,
            5 => Self::InvalidUrl,
            6 => Self::FailedReload,
            7 => Self::Discarded,
            other => {
                return Err(anyhow::anyhow!("invalid resource pack status {other}").into())
            }
        };
        Ok(status)
    }
}

impl Encode for ResourcePackStatus {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_var_int(*self as i32);
    }
}
