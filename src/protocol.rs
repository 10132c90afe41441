pub const PROTOCOL_VERSION: i32 = 774; // 1.21.11

pub(crate) mod decoder;
mod encoder;
pub mod item;
pub mod metadata;
pub mod nbt;
pub mod packet;

pub use decoder::{Decode, DecodeError, DecodeFallback, Decoder};
pub use encoder::{pack_degrees, Encode, Encoder};

/// Protocol states in which packets pass through the translator.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConnectionState {
    Configuration,
    Play,
}

/// An `i32` that is VarInt-encoded, for use inside lists.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarInt(pub i32);

impl Decode for VarInt {
    fn decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        decoder.read_var_int().map(VarInt)
    }
}

impl Encode for VarInt {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_var_int(self.0);
    }
}

/// Encodes a value into a fresh buffer.
pub fn encode_to_vec(value: &impl Encode) -> Vec<u8> {
    let mut buffer = Vec::new();
    value.encode(&mut Encoder::new(&mut buffer));
    buffer
}

/// Decodes a value that must span the whole buffer.
pub fn decode_exact<T: Decode>(bytes: &[u8]) -> Result<T, DecodeError> {
    let mut decoder = Decoder::new(bytes);
    let value = T::decode(&mut decoder)?;
    if !decoder.is_finished() {
        return Err(DecodeError::TrailingBytes(decoder.buffer().len()));
    }
    Ok(value)
}
