use crate::position::{BlockPosition, SectionPosition};
use std::{convert::Infallible, num::TryFromIntError, str::Utf8Error};
use uuid::Uuid;

/// An error while decoding packets.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("need at least {0} more bytes")]
    EndOfStream(usize),
    #[error("invalid boolean pattern {0} - expected either 0 or 1")]
    InvalidBool(u8),
    #[error("varint / varlong is too long")]
    VarIntTooLong,
    #[error("string exceeds max allowed length")]
    StringTooLong,
    #[error("length-prefixed value has {0} trailing bytes")]
    TrailingBytes(usize),
    #[error(transparent)]
    Utf8(#[from] Utf8Error),
    #[error(transparent)]
    IntConversion(#[from] TryFromIntError),
    /// Special variant for derive macro integer conversions to work.
    /// Cannot occur.
    #[error(transparent)]
    Infallible(#[from] Infallible),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T, E = DecodeError> = std::result::Result<T, E>;

const MAX_STRING_LENGTH: usize = i16::MAX as usize;

/// Reads protocol values from the front of a byte slice.
#[derive(Debug)]
pub struct Decoder<'a> {
    buffer: &'a [u8],
}

macro_rules! big_endian_readers {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self) -> Result<$ty> {
                self.consume().map(<$ty>::from_be_bytes)
            }
        )*
    };
}

impl<'a> Decoder<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self { buffer }
    }

    /// The bytes not read yet.
    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    pub fn is_finished(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn consume_slice(&mut self, n: usize) -> Result<&'a [u8]> {
        if n > self.buffer.len() {
            return Err(DecodeError::EndOfStream(n - self.buffer.len()));
        }
        let (data, rest) = self.buffer.split_at(n);
        self.buffer = rest;
        Ok(data)
    }

    pub fn consume_rest(&mut self) -> &'a [u8] {
        std::mem::take(&mut self.buffer)
    }

    pub fn consume<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut array = [0u8; N];
        array.copy_from_slice(self.consume_slice(N)?);
        Ok(array)
    }

    big_endian_readers! {
        read_u8: u8,
        read_i8: i8,
        read_u16: u16,
        read_i16: i16,
        read_u32: u32,
        read_i32: i32,
        read_u64: u64,
        read_i64: i64,
        read_f32: f32,
        read_f64: f64,
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            x => Err(DecodeError::InvalidBool(x)),
        }
    }

    /// Reads at most `max_bytes` seven-bit groups.
    fn read_var(&mut self, max_bytes: usize) -> Result<(u64, usize)> {
        let mut value = 0u64;
        for read in 0..max_bytes {
            let byte = self.read_u8()?;
            value |= u64::from(byte & 0x7f) << (7 * read);
            if byte & 0x80 == 0 {
                return Ok((value, read + 1));
            }
        }
        Err(DecodeError::VarIntTooLong)
    }

    pub fn read_var_int(&mut self) -> Result<i32> {
        // Bits past the 32nd are dropped, as in the vanilla reader.
        self.read_var(5).map(|(value, _)| value as u32 as i32)
    }

    pub fn read_var_long(&mut self) -> Result<i64> {
        self.read_var(10).map(|(value, _)| value as i64)
    }

    pub fn read_block_position(&mut self) -> Result<BlockPosition> {
        self.read_i64().map(BlockPosition::from_long)
    }

    pub fn read_string(&mut self) -> Result<&'a str> {
        let length = usize::try_from(self.read_var_int()?)?;
        if length > MAX_STRING_LENGTH {
            return Err(DecodeError::StringTooLong);
        }
        Ok(std::str::from_utf8(self.consume_slice(length)?)?)
    }

    /// Reads a VarInt-length-prefixed byte slice.
    pub fn read_byte_array(&mut self) -> Result<&'a [u8]> {
        let length = usize::try_from(self.read_var_int()?)?;
        self.consume_slice(length)
    }

    /// Reads a VarInt-length-prefixed value, requiring the
    /// value to consume exactly the prefixed length.
    pub fn read_length_prefixed<T: Decode>(&mut self) -> Result<T> {
        let mut inner = Decoder::new(self.read_byte_array()?);
        let value = T::decode(&mut inner)?;
        if !inner.is_finished() {
            return Err(DecodeError::TrailingBytes(inner.buffer().len()));
        }
        Ok(value)
    }

    pub fn read_angle(&mut self) -> Result<f32> {
        Ok(f32::from(self.read_u8()?) * 360.0 / 256.0)
    }
}

/// A type that can be read from a [`Decoder`].
pub trait Decode: Sized {
    fn decode(decoder: &mut Decoder) -> Result<Self>;
}

/// Implemented by the catch-all variant of a packet enum,
/// which keeps discriminants no other variant claims.
pub trait DecodeFallback: Sized {
    fn decode_fallback(discriminant: i64, decoder: &mut Decoder) -> Result<Self>;
}

macro_rules! decode_with {
    ($($ty:ty => $read:ident),* $(,)?) => {
        $(
            impl Decode for $ty {
                fn decode(decoder: &mut Decoder) -> Result<Self> {
                    decoder.$read()
                }
            }
        )*
    };
}

decode_with! {
    u8 => read_u8,
    i8 => read_i8,
    u16 => read_u16,
    i16 => read_i16,
    u32 => read_u32,
    i32 => read_i32,
    u64 => read_u64,
    i64 => read_i64,
    f32 => read_f32,
    f64 => read_f64,
    bool => read_bool,
    BlockPosition => read_block_position,
}

impl Decode for String {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_string().map(str::to_owned)
    }
}

impl Decode for u128 {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.consume().map(u128::from_be_bytes)
    }
}

impl Decode for Uuid {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        u128::decode(decoder).map(Uuid::from_u128)
    }
}

impl Decode for SectionPosition {
    fn decode(decoder: &mut Decoder) -> Result<Self> {
        decoder.read_i64().map(SectionPosition::from_long)
    }
}

impl Decode for () {
    fn decode(_decoder: &mut Decoder) -> Result<Self> {
        Ok(())
    }
}
