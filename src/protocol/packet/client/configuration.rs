use crate::protocol::packet::{ResourcePackStatus, UnknownPacket};
use minecraft_surrogate_macros::{Decode, Encode, FromVariants};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Encode, Decode, FromVariants, strum::AsRefStr)]
#[encoding(discriminant = "varint")]
pub enum Packet {
    #[encoding(id = 0x06)]
    ResourcePackResponse(ResourcePackResponse),
    #[encoding(fallback)]
    Other(UnknownPacket),
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ResourcePackResponse {
    pub uuid: Uuid,
    pub status: ResourcePackStatus,
}
