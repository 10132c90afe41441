//! Entity metadata (synchronized entity data) records.

use crate::protocol::{item::ItemStack, Decode, DecodeError, Decoder, Encode, Encoder};

pub mod serializer {
    pub const BYTE: i32 = 0;
    pub const VAR_INT: i32 = 1;
    pub const FLOAT: i32 = 3;
    pub const ITEM_STACK: i32 = 7;
    pub const BLOCK_STATE: i32 = 14;
    pub const OPTIONAL_BLOCK_STATE: i32 = 15;
    pub const VECTOR3: i32 = 29;
    pub const QUATERNION: i32 = 30;
}

const END_MARKER: u8 = 0xFF;

#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    Byte(i8),
    VarInt(i32),
    Float(f32),
    ItemStack(ItemStack),
    BlockState(i32),
    /// Zero means absent.
    OptionalBlockState(i32),
    Vector3([f32; 3]),
    /// `x, y, z, w`
    Quaternion([f32; 4]),
    Opaque { serializer: i32, data: Vec<u8> },
}

impl MetadataValue {
    pub fn serializer(&self) -> i32 {
        match self {
            MetadataValue::Byte(_) => serializer::BYTE,
            MetadataValue::VarInt(_) => serializer::VAR_INT,
            MetadataValue::Float(_) => serializer::FLOAT,
            MetadataValue::ItemStack(_) => serializer::ITEM_STACK,
            MetadataValue::BlockState(_) => serializer::BLOCK_STATE,
            MetadataValue::OptionalBlockState(_) => serializer::OPTIONAL_BLOCK_STATE,
            MetadataValue::Vector3(_) => serializer::VECTOR3,
            MetadataValue::Quaternion(_) => serializer::QUATERNION,
            MetadataValue::Opaque { serializer, .. } => *serializer,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetadataEntry {
    pub index: u8,
    pub value: MetadataValue,
}

impl MetadataEntry {
    pub fn new(index: u8, value: MetadataValue) -> Self {
        Self { index, value }
    }
}

/// Entries up to and excluding the `0xFF` terminator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata(pub Vec<MetadataEntry>);

impl Decode for Metadata {
    fn decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let mut entries = Vec::new();
        loop {
            let index = decoder.read_u8()?;
            if index == END_MARKER {
                break;
            }
            let serializer = decoder.read_var_int()?;
            let value = match serializer {
                serializer::BYTE => MetadataValue::Byte(decoder.read_i8()?),
                serializer::VAR_INT => MetadataValue::VarInt(decoder.read_var_int()?),
                serializer::FLOAT => MetadataValue::Float(decoder.read_f32()?),
                serializer::ITEM_STACK => MetadataValue::ItemStack(ItemStack::decode(decoder)?),
                serializer::BLOCK_STATE => MetadataValue::BlockState(decoder.read_var_int()?),
                serializer::OPTIONAL_BLOCK_STATE => {
                    MetadataValue::OptionalBlockState(decoder.read_var_int()?)
                }
                serializer::VECTOR3 => MetadataValue::Vector3([
                    decoder.read_f32()?,
                    decoder.read_f32()?,
                    decoder.read_f32()?,
                ]),
                serializer::QUATERNION => MetadataValue::Quaternion([
                    decoder.read_f32()?,
                    decoder.read_f32()?,
                    decoder.read_f32()?,
                    decoder.read_f32()?,
                ]),
                _ => MetadataValue::Opaque {
                    serializer,
                    data: decoder.read_byte_array()?.to_vec(),
                },
            };
            entries.push(MetadataEntry { index, value });
        }
        Ok(Self(entries))
    }
}

impl Encode for Metadata {
    fn encode(&self, encoder: &mut Encoder) {
        for entry in &self.0 {
            encoder.write_u8(entry.index);
            encoder.write_var_int(entry.value.serializer());
            match &entry.value {
                MetadataValue::Byte(x) => encoder.write_i8(*x),
                MetadataValue::VarInt(x)
                | MetadataValue::BlockState(x)
                | MetadataValue::OptionalBlockState(x) => {
                    encoder.write_var_int(*x);
                }
                MetadataValue::Float(x) => encoder.write_f32(*x),
                MetadataValue::ItemStack(stack) => stack.encode(encoder),
                MetadataValue::Vector3(v) => v.iter().for_each(|&x| encoder.write_f32(x)),
                MetadataValue::Quaternion(q) => q.iter().for_each(|&x| encoder.write_f32(x)),
                MetadataValue::Opaque { data, .. } => encoder.write_byte_array(data),
            }
        }
        encoder.write_u8(END_MARKER);
    }
}
