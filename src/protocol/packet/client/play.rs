use crate::{
    position::BlockPosition,
    protocol::{
        item::ItemStack,
        packet::UnknownPacket,
    },
};
use minecraft_surrogate_macros::{Decode, Encode, FromVariants};

pub use super::configuration::ResourcePackResponse;

/// Packet id of [`SetCreativeModeSlot`], for inspection of undecoded frames.
pub const SET_CREATIVE_MODE_SLOT_ID: i32 = 0x37;

#[derive(Debug, Clone, PartialEq, Encode, Decode, FromVariants, strum::AsRefStr)]
#[encoding(discriminant = "varint")]
pub enum Packet {
    #[encoding(id = 0x11)]
    ClickContainer(ClickContainer),
    #[encoding(id = 0x28)]
    PlayerAction(PlayerAction),
    #[encoding(id = 0x30)]
    ResourcePackResponse(ResourcePackResponse),
    #[encoding(id = 0x34)]
    SetHeldItem(SetHeldItem),
    #[encoding(id = 0x37)]
    SetCreativeModeSlot(SetCreativeModeSlot),
    #[encoding(fallback)]
    Other(UnknownPacket),
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ChangedSlot {
    pub slot: i16,
    pub item: ItemStack,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ClickContainer {
    #[encoding(varint)]
    pub window_id: i32,
    #[encoding(varint)]
    pub state_id: i32,
    pub slot: i16,
    pub button: i8,
    #[encoding(varint)]
    pub mode: i32,
    #[encoding(length_prefix = "varint")]
    pub changed_slots: Vec<ChangedSlot>,
    pub carried: ItemStack,
}

/// Values of [`PlayerAction::status`].
pub mod action {
    pub const START_DESTROY_BLOCK: i32 = 0;
    pub const ABORT_DESTROY_BLOCK: i32 = 1;
    pub const STOP_DESTROY_BLOCK: i32 = 2;
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct PlayerAction {
    #[encoding(varint)]
    pub status: i32,
    pub position: BlockPosition,
    pub face: u8,
    #[encoding(varint)]
    pub sequence: i32,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SetHeldItem {
    pub slot: i16,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SetCreativeModeSlot {
    pub slot: i16,
    pub item: ItemStack,
}
