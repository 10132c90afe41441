use crate::position::{BlockPosition, SectionPosition};
use uuid::Uuid;

/// Appends protocol values to a byte buffer.
#[derive(Debug)]
pub struct Encoder<'a> {
    buffer: &'a mut Vec<u8>,
}

macro_rules! big_endian_writers {
    ($($name:ident: $ty:ty),* $(,)?) => {
        $(
            pub fn $name(&mut self, x: $ty) {
                self.buffer.extend_from_slice(&x.to_be_bytes());
            }
        )*
    };
}

impl<'a> Encoder<'a> {
    /// Existing contents of `buffer` are kept; writes append.
    pub fn new(buffer: &'a mut Vec<u8>) -> Self {
        Self { buffer }
    }

    pub fn write_u8(&mut self, x: u8) {
        self.buffer.push(x);
    }

    pub fn write_i8(&mut self, x: i8) {
        self.write_u8(bytemuck::cast(x));
    }

    big_endian_writers! {
        write_u16: u16,
        write_i16: i16,
        write_u32: u32,
        write_i32: i32,
        write_u64: u64,
        write_i64: i64,
        write_f32: f32,
        write_f64: f64,
    }

    pub fn write_bool(&mut self, x: bool) {
        self.write_u8(u8::from(x));
    }

    /// Raw bytes, without a length prefix.
    pub fn write_slice(&mut self, slice: &[u8]) {
        self.buffer.extend_from_slice(slice);
    }

    /// Seven bits per byte, least significant group first.
    fn write_var(&mut self, mut x: u64) -> usize {
        let start = self.buffer.len();
        loop {
            let group = (x & 0x7f) as u8;
            x >>= 7;
            if x == 0 {
                self.buffer.push(group);
                return self.buffer.len() - start;
            }
            self.buffer.push(group | 0x80);
        }
    }

    /// Returns the number of bytes written.
    pub fn write_var_int(&mut self, x: i32) -> usize {
        self.write_var(u64::from(bytemuck::cast::<i32, u32>(x)))
    }

    pub fn write_var_long(&mut self, x: i64) {
        self.write_var(bytemuck::cast(x));
    }

    pub fn write_block_position(&mut self, position: BlockPosition) {
        self.write_i64(position.as_long());
    }

    /// Writes a VarInt-length-prefixed byte slice.
    pub fn write_byte_array(&mut self, bytes: &[u8]) {
        self.write_var_int(bytes.len().try_into().unwrap_or(i32::MAX));
        self.write_slice(bytes);
    }

    /// Encodes `value` into a scratch buffer and writes it
    /// with a VarInt length prefix.
    pub fn write_length_prefixed(&mut self, value: &impl Encode) {
        let mut scratch = Vec::new();
        value.encode(&mut Encoder::new(&mut scratch));
        self.write_byte_array(&scratch);
    }

    pub fn write_string(&mut self, x: &str) {
        self.write_byte_array(x.as_bytes());
    }

    pub fn write_angle(&mut self, degrees: f32) {
        self.write_u8(pack_degrees(degrees));
    }
}

/// Packs an angle in degrees into 1/256ths of a turn.
pub fn pack_degrees(degrees: f32) -> u8 {
    ((degrees * 256.0 / 360.0).floor() as i32) as u8
}

/// A type that can be written to an [`Encoder`].
pub trait Encode {
    fn encode(&self, encoder: &mut Encoder);
}

macro_rules! encode_with {
    ($($ty:ty => $write:ident),* $(,)?) => {
        $(
            impl Encode for $ty {
                fn encode(&self, encoder: &mut Encoder) {
                    encoder.$write(*self);
                }
            }
        )*
    };
}

encode_with! {
    u8 => write_u8,
    i8 => write_i8,
    u16 => write_u16,
    i16 => write_i16,
    u32 => write_u32,
    i32 => write_i32,
    u64 => write_u64,
    i64 => write_i64,
    f32 => write_f32,
    f64 => write_f64,
    bool => write_bool,
    BlockPosition => write_block_position,
}

impl Encode for String {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_string(self);
    }
}

impl Encode for u128 {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_slice(&self.to_be_bytes());
    }
}

impl Encode for Uuid {
    fn encode(&self, encoder: &mut Encoder) {
        self.as_u128().encode(encoder);
    }
}

impl Encode for SectionPosition {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_i64(self.as_long());
    }
}

impl Encode for () {
    fn encode(&self, _encoder: &mut Encoder) {}
}
