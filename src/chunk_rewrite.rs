//! Replacing custom block states inside chunk section payloads.
//!
//! Sections are laid out back to back: a block count (`i16`), a block
//! states container and a biomes container. Containers start with a
//! bits-per-entry byte that selects the palette:
//!
//! | bits (blocks) | bits (biomes) | palette                         |
//! |---------------|---------------|---------------------------------|
//! | 0             | 0             | single value, no data           |
//! | 1..=8         | 1..=3         | VarInt-prefixed list of ids     |
//! | otherwise     | otherwise     | none, data holds ids directly   |
//!
//! followed by the packed data longs without a length prefix. Block
//! containers with a palette use at least 4 bits per entry. Entries never
//! straddle two longs.

use crate::{
    block_cache::BlockCache,
    error::TranslateError,
    position::{BlockPosition, ChunkPosition},
    protocol::{decoder, DecodeError, Decoder, Encoder},
    registry::SubstitutionRegistry,
};

const SECTION_CELLS: usize = 4096;
const BIOME_CELLS: usize = 64;

/// Vertical extent of the current dimension.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct WorldBounds {
    pub min_y: i32,
    pub sections: i32,
}

impl WorldBounds {
    pub fn new(min_y: i32, height: i32) -> Self {
        let max_y = min_y + height - 1;
        Self {
            min_y,
            sections: (max_y >> 4) - (min_y >> 4) + 1,
        }
    }
}

/// Widest entry a container may use; state and biome ids are `i32`s.
const MAX_BITS_PER_ENTRY: u8 = 32;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum ContainerKind {
    Blocks,
    Biomes,
}

impl ContainerKind {
    fn cells(self) -> usize {
        match self {
            ContainerKind::Blocks => SECTION_CELLS,
            ContainerKind::Biomes => BIOME_CELLS,
        }
    }

    fn max_indirect_bits(self) -> u8 {
        match self {
            ContainerKind::Blocks => 8,
            ContainerKind::Biomes => 3,
        }
    }

    fn min_indirect_bits(self) -> u8 {
        match self {
            ContainerKind::Blocks => 4,
            ContainerKind::Biomes => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Palette {
    Single(i32),
    Indirect(Vec<i32>),
    Direct,
}

#[derive(Debug, Clone, PartialEq)]
struct PalettedContainer {
    /// As written on the wire.
    bits_byte: u8,
    palette: Palette,
    data: Vec<u64>,
}

impl PalettedContainer {
    fn decode(decoder: &mut Decoder, kind: ContainerKind) -> decoder::Result<Self> {
        let bits_byte = decoder.read_u8()?;
        if bits_byte > MAX_BITS_PER_ENTRY {
            return Err(DecodeError::Other(anyhow::format_err!(
                "{bits_byte} bits per entry is out of range"
            )));
        }
        let palette = if bits_byte == 0 {
            Palette::Single(decoder.read_var_int()?)
        } else if bits_byte <= kind.max_indirect_bits() {
            let length = decoder.read_var_int()?;
            let mut entries = Vec::new();
            for _ in 0..length {
                entries.push(decoder.read_var_int()?);
            }
            Palette::Indirect(entries)
        } else {
            Palette::Direct
        };
        let mut container = Self {
            bits_byte,
            palette,
            data: Vec::new(),
        };
        for _ in 0..container.data_longs(kind) {
            container.data.push(decoder.read_u64()?);
        }
        Ok(container)
    }

    fn encode(&self, encoder: &mut Encoder) {
        encoder.write_u8(self.bits_byte);
        match &self.palette {
            Palette::Single(value) => {
                encoder.write_var_int(*value);
            }
            Palette::Indirect(entries) => {
                encoder.write_var_int(entries.len() as i32);
                for &entry in entries {
                    encoder.write_var_int(entry);
                }
            }
            Palette::Direct => {}
        }
        for &long in &self.data {
            encoder.write_u64(long);
        }
    }

    fn bits(&self, kind: ContainerKind) -> u8 {
        match self.palette {
            Palette::Single(_) => 0,
            Palette::Indirect(_) => self.bits_byte.max(kind.min_indirect_bits()),
            Palette::Direct => self.bits_byte,
        }
    }

    fn data_longs(&self, kind: ContainerKind) -> usize {
        let bits = usize::from(self.bits(kind));
        if bits == 0 {
            return 0;
        }
        let per_long = 64 / bits;
        kind.cells().div_ceil(per_long)
    }

    fn get(&self, bits: u8, index: usize) -> u64 {
        let per_long = 64 / usize::from(bits);
        let shift = (index % per_long) * usize::from(bits);
        (self.data[index / per_long] >> shift) & mask(bits)
    }

    fn set(&mut self, bits: u8, index: usize, value: u64) {
        let per_long = 64 / usize::from(bits);
        let shift = (index % per_long) * usize::from(bits);
        let long = &mut self.data[index / per_long];
        *long = (*long & !(mask(bits) << shift)) | ((value & mask(bits)) << shift);
    }
}

fn mask(bits: u8) -> u64 {
    if bits >= 64 {
        u64::MAX
    } else {
        (1 << bits) - 1
    }
}

struct Section<'a> {
    block_count: i16,
    blocks: PalettedContainer,
    /// Biome container bytes, copied verbatim.
    biomes: &'a [u8],
}

/// Skips a biome container, returning its bytes.
fn read_biomes<'a>(decoder: &mut Decoder<'a>) -> decoder::Result<&'a [u8]> {
    let start = decoder.buffer();
    PalettedContainer::decode(decoder, ContainerKind::Biomes)?;
    Ok(&start[..start.len() - decoder.buffer().len()])
}

/// Rewrites every custom block in a chunk's section data and refreshes
/// the cache for the chunk.
///
/// Returns `Ok(None)` when nothing needed replacing, in which case
/// `data` should be sent unchanged.
pub fn rewrite_chunk(
    registry: &SubstitutionRegistry,
    cache: &mut BlockCache,
    chunk: ChunkPosition,
    bounds: WorldBounds,
    data: &[u8],
) -> Result<Option<Vec<u8>>, TranslateError> {
    if bounds.sections <= 0 {
        return Ok(None);
    }
    cache.unload_chunk(chunk);

    let mut decoder = Decoder::new(data);
    let mut sections = Vec::new();
    let mut changed = false;
    for index in 0..bounds.sections as usize {
        let mut section = decode_section(&mut decoder).map_err(|source| {
            TranslateError::MalformedChunk {
                section: index,
                custom_seen: changed,
                source,
            }
        })?;
        let section_y = bounds.min_y + 16 * index as i32;
        let origin = BlockPosition::new(chunk.min_block_x(), section_y, chunk.min_block_z());
        changed |= rewrite_section(registry, cache, origin, &mut section.blocks)?;
        sections.push(section);
    }

    if !changed {
        return Ok(None);
    }

    let mut buffer = Vec::with_capacity(data.len());
    let mut encoder = Encoder::new(&mut buffer);
    for section in &sections {
        encoder.write_i16(section.block_count);
        section.blocks.encode(&mut encoder);
        encoder.write_slice(section.biomes);
    }
    encoder.write_slice(decoder.buffer());
    Ok(Some(buffer))
}

fn decode_section<'a>(decoder: &mut Decoder<'a>) -> decoder::Result<Section<'a>> {
    Ok(Section {
        block_count: decoder.read_i16()?,
        blocks: PalettedContainer::decode(decoder, ContainerKind::Blocks)?,
        biomes: read_biomes(decoder)?,
    })
}

fn cell_position(origin: BlockPosition, index: usize) -> BlockPosition {
    BlockPosition::new(
        origin.x + (index & 15) as i32,
        origin.y + (index >> 8) as i32,
        origin.z + ((index >> 4) & 15) as i32,
    )
}

/// Returns whether any state was replaced.
fn rewrite_section(
    registry: &SubstitutionRegistry,
    cache: &mut BlockCache,
    origin: BlockPosition,
    container: &mut PalettedContainer,
) -> Result<bool, TranslateError> {
    let bits = container.bits(ContainerKind::Blocks);
    match &mut container.palette {
        Palette::Single(state) => {
            if registry.is_custom_state(*state) {
                for index in 0..SECTION_CELLS {
                    cache.insert(cell_position(origin, index), *state);
                }
            }
            match registry.surrogate_for(*state) {
                Some(surrogate) if surrogate != *state => {
                    *state = surrogate;
                    Ok(true)
                }
                _ => Ok(false),
            }
        }
        Palette::Indirect(entries) => {
            let custom: Vec<bool> = entries.iter().map(|&s| registry.is_custom_state(s)).collect();
            let real = entries.clone();
            let mut changed = false;
            for entry in entries.iter_mut() {
                if let Some(surrogate) = registry.surrogate_for(*entry) {
                    changed |= surrogate != *entry;
                    *entry = surrogate;
                }
            }
            if custom.contains(&true) {
                for index in 0..SECTION_CELLS {
                    let palette_index = container.get(bits, index) as usize;
                    if custom.get(palette_index) == Some(&true) {
                        cache.insert(cell_position(origin, index), real[palette_index]);
                    }
                }
            }
            Ok(changed)
        }
        Palette::Direct => {
            let mut changed = false;
            for index in 0..SECTION_CELLS {
                let state = container.get(bits, index) as i32;
                if registry.is_custom_state(state) {
                    cache.insert(cell_position(origin, index), state);
                }
                if let Some(surrogate) = registry.surrogate_for(state) {
                    if surrogate == state {
                        continue;
                    }
                    if surrogate < 0 || u64::try_from(surrogate).map_or(true, |s| s > mask(bits)) {
                        return Err(TranslateError::SurrogateTooWide {
                            state: surrogate,
                            bits,
                        });
                    }
                    container.set(bits, index, surrogate as u64);
                    changed = true;
                }
            }
            Ok(changed)
        }
    }
}
