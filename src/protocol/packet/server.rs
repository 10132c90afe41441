//! Packets sent by the server.

pub mod configuration;
pub mod play;
