//! Network NBT: a root tag without a name, as used since 1.20.2.

use crate::protocol::{Decode, DecodeError, Decoder, Encode, Encoder};

const MAX_DEPTH: usize = 512;

#[derive(Debug, Clone, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<Tag>),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn type_id(&self) -> u8 {
        match self {
            Tag::Byte(_) => 1,
            Tag::Short(_) => 2,
            Tag::Int(_) => 3,
            Tag::Long(_) => 4,
            Tag::Float(_) => 5,
            Tag::Double(_) => 6,
            Tag::ByteArray(_) => 7,
            Tag::String(_) => 8,
            Tag::List(_) => 9,
            Tag::Compound(_) => 10,
            Tag::IntArray(_) => 11,
            Tag::LongArray(_) => 12,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }

    fn read_payload(decoder: &mut Decoder, type_id: u8, depth: usize) -> Result<Self, DecodeError> {
        if depth > MAX_DEPTH {
            return Err(anyhow::anyhow!("NBT nested deeper than {MAX_DEPTH}").into());
        }
        let tag = match type_id {
            1 => Tag::Byte(decoder.read_i8()?),
            2 => Tag::Short(decoder.read_i16()?),
            3 => Tag::Int(decoder.read_i32()?),
            4 => Tag::Long(decoder.read_i64()?),
            5 => Tag::Float(decoder.read_f32()?),
            6 => Tag::Double(decoder.read_f64()?),
            7 => {
                let length = array_length(decoder)?;
                let bytes = decoder.consume_slice(length)?;
                Tag::ByteArray(bytes.iter().map(|&b| b as i8).collect())
            }
            8 => Tag::String(read_nbt_string(decoder)?),
            9 => {
                let element_type = decoder.read_u8()?;
                let length = array_length(decoder)?;
                let mut list = Vec::new();
                if element_type != 0 {
                    for _ in 0..length {
                        list.push(Tag::read_payload(decoder, element_type, depth + 1)?);
                    }
                }
                Tag::List(list)
            }
            10 => Tag::Compound(Compound::read_payload(decoder, depth + 1)?),
            11 => {
                let length = array_length(decoder)?;
                let mut ints = Vec::new();
                for _ in 0..length {
                    ints.push(decoder.read_i32()?);
                }
                Tag::IntArray(ints)
            }
            12 => {
                let length = array_length(decoder)?;
                let mut longs = Vec::new();
                for _ in 0..length {
                    longs.push(decoder.read_i64()?);
                }
                Tag::LongArray(longs)
            }
            other => return Err(anyhow::anyhow!("invalid NBT tag type {other}").into()),
        };
        Ok(tag)
    }

    fn write_payload(&self, encoder: &mut Encoder) {
        match self {
            Tag::Byte(x) => encoder.write_i8(*x),
            Tag::Short(x) => encoder.write_i16(*x),
            Tag::Int(x) => encoder.write_i32(*x),
            Tag::Long(x) => encoder.write_i64(*x),
            Tag::Float(x) => encoder.write_f32(*x),
            Tag::Double(x) => encoder.write_f64(*x),
            Tag::ByteArray(bytes) => {
                encoder.write_i32(bytes.len() as i32);
                for &b in bytes {
                    encoder.write_i8(b);
                }
            }
            Tag::String(s) => write_nbt_string(encoder, s),
            Tag::List(list) => {
                encoder.write_u8(list.first().map_or(0, Tag::type_id));
                encoder.write_i32(list.len() as i32);
                for tag in list {
                    tag.write_payload(encoder);
                }
            }
            Tag::Compound(compound) => compound.write_payload(encoder),
            Tag::IntArray(ints) => {
                encoder.write_i32(ints.len() as i32);
                for &x in ints {
                    encoder.write_i32(x);
                }
            }
            Tag::LongArray(longs) => {
                encoder.write_i32(longs.len() as i32);
                for &x in longs {
                    encoder.write_i64(x);
                }
            }
        }
    }
}

/// A compound tag. Keeps insertion order so unchanged
/// compounds re-encode to the same bytes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Compound {
    entries: Vec<(String, Tag)>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &str) -> Option<&Tag> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Inserts or replaces `key`, keeping the position of an existing entry.
    pub fn insert(&mut self, key: impl Into<String>, value: Tag) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Tag> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Tag)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    fn read_payload(decoder: &mut Decoder, depth: usize) -> Result<Self, DecodeError> {
        let mut compound = Compound::new();
        loop {
            let type_id = decoder.read_u8()?;
            if type_id == 0 {
                break;
            }
            let name = read_nbt_string(decoder)?;
            let tag = Tag::read_payload(decoder, type_id, depth)?;
            compound.entries.push((name, tag));
        }
        Ok(compound)
    }

    fn write_payload(&self, encoder: &mut Encoder) {
        for (name, tag) in &self.entries {
            encoder.write_u8(tag.type_id());
            write_nbt_string(encoder, name);
            tag.write_payload(encoder);
        }
        encoder.write_u8(0);
    }
}

impl<K: Into<String>> FromIterator<(K, Tag)> for Compound {
    fn from_iter<T: IntoIterator<Item = (K, Tag)>>(iter: T) -> Self {
        let mut compound = Compound::new();
        for (k, v) in iter {
            compound.insert(k, v);
        }
        compound
    }
}

/// Nameless root tag.
impl Decode for Tag {
    fn decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        let type_id = decoder.read_u8()?;
        Tag::read_payload(decoder, type_id, 0)
    }
}

impl Encode for Tag {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_u8(self.type_id());
        self.write_payload(encoder);
    }
}

/// Nameless root compound.
impl Decode for Compound {
    fn decode(decoder: &mut Decoder) -> Result<Self, DecodeError> {
        match Tag::decode(decoder)? {
            Tag::Compound(compound) => Ok(compound),
            other => Err(anyhow::anyhow!("expected compound root, found tag type {}", other.type_id()).into()),
        }
    }
}

impl Encode for Compound {
    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_u8(10);
        self.write_payload(encoder);
    }
}

fn array_length(decoder: &mut Decoder) -> Result<usize, DecodeError> {
    let length = usize::try_from(decoder.read_i32()?)?;
    // Every element takes at least one byte.
    if length > decoder.buffer().len() {
        return Err(DecodeError::EndOfStream(length - decoder.buffer().len()));
    }
    Ok(length)
}

/// NBT strings are Java's modified UTF-8: NUL takes two bytes and
/// supplementary characters are written as surrogate pairs.
fn read_nbt_string(decoder: &mut Decoder) -> Result<String, DecodeError> {
    let length = usize::from(decoder.read_u16()?);
    let bytes = decoder.consume_slice(length)?;
    cesu8::from_java_cesu8(bytes)
        .map(|s| s.into_owned())
        .map_err(|e| DecodeError::Other(anyhow::format_err!("invalid NBT string: {e}")))
}

fn modified_utf8_len(c: char) -> usize {
    match u32::from(c) {
        0 => 2,
        0x01..=0x7f => 1,
        0x80..=0x7ff => 2,
        0x800..=0xffff => 3,
        _ => 6,
    }
}

/// Strings longer than the `u16` length prefix allows are cut at the
/// last whole character that fits.
fn write_nbt_string(encoder: &mut Encoder, s: &str) {
    let mut end = 0;
    let mut length = 0;
    for (index, c) in s.char_indices() {
        length += modified_utf8_len(c);
        if length > usize::from(u16::MAX) {
            break;
        }
        end = index + c.len_utf8();
    }
    let bytes = cesu8::to_java_cesu8(&s[..end]);
    encoder.write_u16(bytes.len() as u16);
    encoder.write_slice(&bytes);
}
