use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkPosition {
    pub x: i32,
    pub z: i32,
}

impl ChunkPosition {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    pub fn min_block_x(self) -> i32 {
        self.x << 4
    }

    pub fn min_block_z(self) -> i32 {
        self.z << 4
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl BlockPosition {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn chunk(self) -> ChunkPosition {
        ChunkPosition {
            x: self.x.div_euclid(16),
            z: self.z.div_euclid(16),
        }
    }

    /// Packs the position into 64 bits: 26 bits of X, 26 bits of Z
    /// and 12 bits of Y, from most to least significant.
    pub fn as_long(self) -> i64 {
        ((i64::from(self.x) & 0x3FF_FFFF) << 38)
            | ((i64::from(self.z) & 0x3FF_FFFF) << 12)
            | (i64::from(self.y) & 0xFFF)
    }

    pub fn from_long(value: i64) -> Self {
        Self {
            x: (value >> 38) as i32,
            y: (value << 52 >> 52) as i32,
            z: (value << 26 >> 38) as i32,
        }
    }
}

/// Position of a 16x16x16 chunk section, packed on the wire
/// as 22 bits of X, 22 bits of Z and 20 bits of Y.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SectionPosition {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl SectionPosition {
    pub fn from_long(value: i64) -> Self {
        Self {
            x: (value >> 42) as i32,
            y: (value << 44 >> 44) as i32,
            z: (value << 22 >> 42) as i32,
        }
    }

    pub fn as_long(self) -> i64 {
        ((i64::from(self.x) & 0x3F_FFFF) << 42)
            | ((i64::from(self.z) & 0x3F_FFFF) << 20)
            | (i64::from(self.y) & 0xF_FFFF)
    }

    /// Resolves a packed `xzy` nibble offset (as used by
    /// section block updates) to an absolute block position.
    pub fn relative(self, packed: u16) -> BlockPosition {
        BlockPosition {
            x: (self.x << 4) + i32::from((packed >> 8) & 0xF),
            y: (self.y << 4) + i32::from(packed & 0xF),
            z: (self.z << 4) + i32::from((packed >> 4) & 0xF),
        }
    }
}
