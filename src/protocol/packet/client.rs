//! Packets sent by the client.

pub mod configuration;
pub mod play;
