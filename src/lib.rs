//! Packet substitution layer that lets a Minecraft server use custom
//! blocks, items and projectiles with unmodified clients.
//!
//! The server keeps the real, custom identities in its world and
//! inventories. Every packet sent to a client is rewritten so it only
//! describes vanilla data:
//! * custom block states become surrogate vanilla states, in single block
//!   updates as well as in the bit-packed palettes of chunk payloads;
//! * custom item stacks become vanilla material stacks carrying a hidden
//!   tag with the real item id, which is used to restore them when the
//!   client sends the stack back;
//! * custom projectiles are spawned as item displays showing their item.
//!
//! Packets the client sends are rewritten in the other direction. Some
//! client behavior depends on data the client was never shown, such as
//! how long a block takes to break, so the translator also sends
//! corrective packets of its own.
//!
//! # Connection lifecycle
//! A [`ConnectionTranslator`] is created per connection from a shared
//! [`TranslatorContext`]. The host runs every decoded packet through
//! [`TranslatePacket::translate_packet`] for the current side and state,
//! and creative-mode slot frames additionally through
//! [`ConnectionTranslator::translate_raw_serverbound`] before decoding.
//! Connections of clients bridged from Bedrock Edition are left untouched.

pub mod block_cache;
pub mod break_speed;
pub mod chat;
pub mod chunk_rewrite;
pub mod classification;
pub mod config;
pub mod entity_id;
pub mod error;
pub mod host;
pub mod item_codec;
mod packet_translation;
pub mod painting;
pub mod position;
pub mod projectile;
pub mod protocol;
pub mod registry;
pub mod resource_pack;

pub use config::Config;
pub use error::TranslateError;
pub use packet_translation::{ConnectionTranslator, TranslatePacket, TranslatorContext};
