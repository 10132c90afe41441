use crate::{
    position::{BlockPosition, SectionPosition},
    protocol::{
        decoder,
        item::ItemStack,
        metadata::Metadata,
        packet::UnknownPacket,
        Decode, Decoder, Encode, Encoder, VarInt,
    },
};
use bitflags::bitflags;
use minecraft_surrogate_macros::{Decode, Encode, FromVariants};
use uuid::Uuid;

pub use super::configuration::AddResourcePack;

#[derive(Debug, Clone, PartialEq, Encode, Decode, FromVariants, strum::AsRefStr)]
#[encoding(discriminant = "varint")]
pub enum Packet {
    #[encoding(id = 0x00)]
    Bundle(Bundle),
    #[encoding(id = 0x01)]
    SpawnEntity(SpawnEntity),
    #[encoding(id = 0x08)]
    BlockUpdate(BlockUpdate),
    #[encoding(id = 0x11)]
    CloseContainer(CloseContainer),
    #[encoding(id = 0x12)]
    SetContainerContents(SetContainerContents),
    #[encoding(id = 0x14)]
    SetContainerSlot(SetContainerSlot),
    #[encoding(id = 0x23)]
    EntityPositionSync(EntityPositionSync),
    #[encoding(id = 0x25)]
    UnloadChunk(UnloadChunk),
    #[encoding(id = 0x2c)]
    ChunkAndLightData(ChunkAndLightData),
    #[encoding(id = 0x2d)]
    WorldEvent(WorldEvent),
    #[encoding(id = 0x2e)]
    Particle(Particle),
    #[encoding(id = 0x30)]
    Login(Login),
    #[encoding(id = 0x33)]
    UpdateEntityPosition(UpdateEntityPosition),
    #[encoding(id = 0x34)]
    UpdateEntityPositionAndRotation(UpdateEntityPositionAndRotation),
    #[encoding(id = 0x36)]
    UpdateEntityRotation(UpdateEntityRotation),
    #[encoding(id = 0x39)]
    OpenScreen(OpenScreen),
    #[encoding(id = 0x4f)]
    AddResourcePack(AddResourcePack),
    #[encoding(id = 0x50)]
    Respawn(Respawn),
    #[encoding(id = 0x52)]
    UpdateSectionBlocks(UpdateSectionBlocks),
    #[encoding(id = 0x5e)]
    SetCursorItem(SetCursorItem),
    #[encoding(id = 0x61)]
    SetEntityMetadata(SetEntityMetadata),
    #[encoding(id = 0x63)]
    SetEntityVelocity(SetEntityVelocity),
    #[encoding(id = 0x64)]
    SetEquipment(SetEquipment),
    #[encoding(id = 0x67)]
    SetHeldItem(SetHeldItem),
    #[encoding(id = 0x6a)]
    SetPlayerInventory(SetPlayerInventory),
    #[encoding(id = 0x77)]
    SystemChatMessage(SystemChatMessage),
    #[encoding(id = 0x7b)]
    TeleportEntity(TeleportEntity),
    #[encoding(id = 0x81)]
    UpdateAttributes(UpdateAttributes),
    #[encoding(id = 0x83)]
    UpdateRecipes(UpdateRecipes),
    #[encoding(fallback)]
    Other(UnknownPacket),
}

/// Packets delivered to the client atomically.
/// Each nested packet is VarInt-length-prefixed.
#[derive(Debug, Clone, PartialEq)]
pub struct Bundle {
    pub packets: Vec<Packet>,
}
impl Encode for Bundle {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_var_int(self.packets.len().try_into().unwrap_or(i32::MAX));
        for packet in &self.packets {
            encoder.write_length_prefixed(packet);
        }
    }
}
impl Decode for Bundle {
    fn decode(decoder: &mut Decoder) -> decoder::Result<Self> {
        let length = decoder.read_var_int()?;
        let mut packets = Vec::new();
        for _ in 0..length {
            packets.push(decoder.read_length_prefixed()?);
        }
        Ok(Self { packets })
    }
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SpawnEntity {
    #[encoding(varint)]
    pub entity_id: i32,
    pub uuid: Uuid,
    #[encoding(varint)]
    pub entity_type: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[encoding(angle)]
    pub pitch: f32,
    #[encoding(angle)]
    pub yaw: f32,
    #[encoding(angle)]
    pub head_yaw: f32,
    #[encoding(varint)]
    pub data: i32,
    pub velocity_x: i16,
    pub velocity_y: i16,
    pub velocity_z: i16,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct BlockUpdate {
    pub position: BlockPosition,
    #[encoding(varint)]
    pub state: i32,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct CloseContainer {
    #[encoding(varint)]
    pub window_id: i32,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SetContainerContents {
    #[encoding(varint)]
    pub window_id: i32,
    #[encoding(varint)]
    pub state_id: i32,
    #[encoding(length_prefix = "varint")]
    pub slots: Vec<ItemStack>,
    pub carried: ItemStack,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SetContainerSlot {
    #[encoding(varint)]
    pub window_id: i32,
    #[encoding(varint)]
    pub state_id: i32,
    pub slot: i16,
    pub item: ItemStack,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct EntityPositionSync {
    #[encoding(varint)]
    pub entity_id: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub velocity_z: f64,
    pub yaw: f32,
    pub pitch: f32,
    pub on_ground: bool,
}

/// The chunk position is written as a single long with Z in the high half.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct UnloadChunk {
    pub chunk_z: i32,
    pub chunk_x: i32,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct Heightmap {
    #[encoding(varint)]
    pub kind: i32,
    #[encoding(length_prefix = "varint")]
    pub values: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct ChunkAndLightData {
    pub chunk_x: i32,
    pub chunk_z: i32,
    #[encoding(length_prefix = "varint")]
    pub heightmaps: Vec<Heightmap>,
    /// Concatenated chunk sections, bottom to top.
    #[encoding(length_prefix = "varint")]
    pub data: Vec<u8>,
    /// Block entities and light data.
    #[encoding(length_prefix = "inferred")]
    pub rest: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct WorldEvent {
    pub event: i32,
    pub position: BlockPosition,
    pub data: i32,
    pub disable_relative_volume: bool,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct Particle {
    pub long_distance: bool,
    pub always_show: bool,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub offset_x: f32,
    pub offset_y: f32,
    pub offset_z: f32,
    pub max_speed: f32,
    pub count: i32,
    pub options: ParticleOptions,
}

/// Particle type ids whose options are a block state.
pub const BLOCK_STATE_PARTICLES: [i32; 5] = [1, 2, 28, 29, 107];
/// Particle type id whose options are an item stack.
pub const ITEM_PARTICLE: i32 = 46;

#[derive(Debug, Clone, PartialEq)]
pub enum ParticleOptions {
    Block { kind: i32, state: i32 },
    Item { kind: i32, item: ItemStack },
    Other { kind: i32, data: Vec<u8> },
}
impl Encode for ParticleOptions {
    fn encode(&self, encoder: &mut Encoder) {
        match self {
            ParticleOptions::Block { kind, state } => {
                encoder.write_var_int(*kind);
                encoder.write_var_int(*state);
            }
            ParticleOptions::Item { kind, item } => {
                encoder.write_var_int(*kind);
                item.encode(encoder);
            }
            ParticleOptions::Other { kind, data } => {
                encoder.write_var_int(*kind);
                encoder.write_slice(data);
            }
        }
    }
}
impl Decode for ParticleOptions {
    fn decode(decoder: &mut Decoder) -> decoder::Result<Self> {
        let kind = decoder.read_var_int()?;
        if BLOCK_STATE_PARTICLES.contains(&kind) {
            Ok(ParticleOptions::Block {
                kind,
                state: decoder.read_var_int()?,
            })
        } else if kind == ITEM_PARTICLE {
            Ok(ParticleOptions::Item {
                kind,
                item: ItemStack::decode(decoder)?,
            })
        } else {
            Ok(ParticleOptions::Other {
                kind,
                data: decoder.consume_rest().to_vec(),
            })
        }
    }
}

/// The host resolves the dimension type and supplies its vertical extent.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct Login {
    pub entity_id: i32,
    pub min_y: i32,
    pub height: i32,
    #[encoding(length_prefix = "inferred")]
    pub rest: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct UpdateEntityPosition {
    #[encoding(varint)]
    pub entity_id: i32,
    pub delta_x: i16,
    pub delta_y: i16,
    pub delta_z: i16,
    pub on_ground: bool,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct UpdateEntityPositionAndRotation {
    #[encoding(varint)]
    pub entity_id: i32,
    pub delta_x: i16,
    pub delta_y: i16,
    pub delta_z: i16,
    #[encoding(angle)]
    pub yaw: f32,
    #[encoding(angle)]
    pub pitch: f32,
    pub on_ground: bool,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct UpdateEntityRotation {
    #[encoding(varint)]
    pub entity_id: i32,
    #[encoding(angle)]
    pub yaw: f32,
    #[encoding(angle)]
    pub pitch: f32,
    pub on_ground: bool,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct OpenScreen {
    #[encoding(varint)]
    pub window_id: i32,
    #[encoding(varint)]
    pub menu_type: i32,
    #[encoding(length_prefix = "inferred")]
    pub title: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct Respawn {
    pub min_y: i32,
    pub height: i32,
    #[encoding(length_prefix = "inferred")]
    pub rest: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct UpdateSectionBlocks {
    pub section: SectionPosition,
    #[encoding(length_prefix = "varint")]
    pub blocks: Vec<SectionBlock>,
}

/// One entry of a section update: VarLong `state << 12 | x << 8 | z << 4 | y`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SectionBlock {
    pub state: i32,
    pub offset: u16,
}
impl Encode for SectionBlock {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_var_long((i64::from(self.state) << 12) | i64::from(self.offset & 0xFFF));
    }
}
impl Decode for SectionBlock {
    fn decode(decoder: &mut Decoder) -> decoder::Result<Self> {
        let packed = decoder.read_var_long()?;
        Ok(Self {
            state: i32::try_from(packed >> 12)?,
            offset: (packed & 0xFFF) as u16,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SetCursorItem {
    pub item: ItemStack,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SetEntityMetadata {
    #[encoding(varint)]
    pub entity_id: i32,
    pub metadata: Metadata,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SetEntityVelocity {
    #[encoding(varint)]
    pub entity_id: i32,
    pub velocity_x: i16,
    pub velocity_y: i16,
    pub velocity_z: i16,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EquipmentSlot {
    MainHand,
    OffHand,
    Feet,
    Legs,
    Chest,
    Head,
    Body,
    Saddle,
}

impl EquipmentSlot {
    pub fn is_hand(self) -> bool {
        matches!(self, EquipmentSlot::MainHand | EquipmentSlot::OffHand)
    }

    fn from_id(id: u8) -> decoder::Result<Self> {
        let slot = match id {
            0 => Self::MainHand,
            1 => Self::OffHand,
            2 => Self::Feet,
            3 => Self::Legs,
            4 => Self::Chest,
            5 => Self::Head,
            6 => Self::Body,
            7 => Self::Saddle,
            other => return Err(anyhow::anyhow!("invalid equipment slot {other}").into()),
        };
        Ok(slot)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EquipmentEntry {
    pub slot: EquipmentSlot,
    pub item: ItemStack,
}

/// Entries are chained by the top bit of each slot byte.
#[derive(Debug, Clone, PartialEq)]
pub struct SetEquipment {
    pub entity_id: i32,
    pub equipment: Vec<EquipmentEntry>,
}
impl Encode for SetEquipment {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_var_int(self.entity_id);
        for (i, entry) in self.equipment.iter().enumerate() {
            let more = if i + 1 < self.equipment.len() { 0x80 } else { 0 };
            encoder.write_u8(entry.slot as u8 | more);
            entry.item.encode(encoder);
        }
    }
}
impl Decode for SetEquipment {
    fn decode(decoder: &mut Decoder) -> decoder::Result<Self> {
        let entity_id = decoder.read_var_int()?;
        let mut equipment = Vec::new();
        loop {
            let byte = decoder.read_u8()?;
            equipment.push(EquipmentEntry {
                slot: EquipmentSlot::from_id(byte & 0x7F)?,
                item: ItemStack::decode(decoder)?,
            });
            if byte & 0x80 == 0 {
                break;
            }
        }
        Ok(Self {
            entity_id,
            equipment,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SetHeldItem {
    #[encoding(varint)]
    pub slot: i32,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SetPlayerInventory {
    #[encoding(varint)]
    pub slot: i32,
    pub item: ItemStack,
}

/// The host hands over the text component as JSON.
#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct SystemChatMessage {
    pub content: String,
    pub overlay: bool,
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Relatives: i32 {
        const X = 0x0001;
        const Y = 0x0002;
        const Z = 0x0004;
        const YAW = 0x0008;
        const PITCH = 0x0010;
        const DELTA_X = 0x0020;
        const DELTA_Y = 0x0040;
        const DELTA_Z = 0x0080;
        const ROTATE_DELTA = 0x0100;
    }
}
impl Encode for Relatives {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_i32(self.bits());
    }
}
impl Decode for Relatives {
    fn decode(decoder: &mut Decoder) -> decoder::Result<Self> {
        Ok(Relatives::from_bits_retain(decoder.read_i32()?))
    }
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct TeleportEntity {
    #[encoding(varint)]
    pub entity_id: i32,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub velocity_x: f64,
    pub velocity_y: f64,
    pub velocity_z: f64,
    pub yaw: f32,
    pub pitch: f32,
    pub relatives: Relatives,
    pub on_ground: bool,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct AttributeModifier {
    pub id: String,
    pub amount: f64,
    pub operation: u8,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct AttributeProperty {
    #[encoding(varint)]
    pub attribute: i32,
    pub base: f64,
    #[encoding(length_prefix = "varint")]
    pub modifiers: Vec<AttributeModifier>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct UpdateAttributes {
    #[encoding(varint)]
    pub entity_id: i32,
    #[encoding(length_prefix = "varint")]
    pub properties: Vec<AttributeProperty>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct PropertySet {
    pub id: String,
    #[encoding(length_prefix = "varint")]
    pub items: Vec<VarInt>,
}

#[derive(Debug, Clone, PartialEq, Encode, Decode)]
pub struct UpdateRecipes {
    #[encoding(length_prefix = "varint")]
    pub property_sets: Vec<PropertySet>,
    /// Stonecutter recipes.
    #[encoding(length_prefix = "inferred")]
    pub rest: Vec<u8>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::{decode_exact, encode_to_vec};

    #[test]
    fn bundle_nests_length_prefixed_packets() {
        let bundle = Packet::Bundle(Bundle {
            packets: vec![
                Packet::SetHeldItem(SetHeldItem { slot: 3 }),
                Packet::Other(UnknownPacket {
                    id: 0x26,
                    data: vec![9, 9],
                }),
            ],
        });
        let bytes = encode_to_vec(&bundle);
        // id, count, then (length, id, slot) and (length, id, data..)
        assert_eq!(bytes, [0x00, 2, 2, 0x67, 3, 3, 0x26, 9, 9]);
        assert_eq!(decode_exact::<Packet>(&bytes).unwrap(), bundle);
    }

    #[test]
    fn equipment_uses_continuation_bit() {
        let packet = SetEquipment {
            entity_id: 7,
            equipment: vec![
                EquipmentEntry {
                    slot: EquipmentSlot::MainHand,
                    item: ItemStack::new(10, 1),
                },
                EquipmentEntry {
                    slot: EquipmentSlot::Head,
                    item: ItemStack::empty(),
                },
            ],
        };
        let bytes = encode_to_vec(&packet);
        assert_eq!(bytes[1], 0x80);
        assert_eq!(decode_exact::<SetEquipment>(&bytes).unwrap(), packet);
    }

    #[test]
    fn section_block_packs_state_above_offset() {
        let entry = SectionBlock {
            state: 2,
            offset: 0x3A5,
        };
        let bytes = encode_to_vec(&entry);
        let mut decoder = Decoder::new(&bytes);
        assert_eq!(decoder.read_var_long().unwrap(), (2 << 12) | 0x3A5);
        assert_eq!(decode_exact::<SectionBlock>(&bytes).unwrap(), entry);
    }

    #[test]
    fn particle_options_by_kind() {
        let block: ParticleOptions = decode_exact(&[1, 42]).unwrap();
        assert_eq!(block, ParticleOptions::Block { kind: 1, state: 42 });
        let other: ParticleOptions = decode_exact(&[5, 1, 2, 3]).unwrap();
        assert_eq!(
            other,
            ParticleOptions::Other {
                kind: 5,
                data: vec![1, 2, 3]
            }
        );
    }
}
