//! Base types for the header and index tables of BTD files.

use binrw::BinRead;

/// Size of [`BtdHeader`] in bytes
pub const HEADER_SIZE: usize = 92;

/// The only supported format version
pub const BTD_VERSION: u32 = 6;

/// Cells along each side of a tile
pub const TILE_CELLS: i32 = 8;

/// BTD file header
///
/// Starts with "BTDB". Every offset is absolute, except those of the block descriptors, which
/// are relative to `block_data_offset`.
#[derive(BinRead, Debug, Copy, Clone, PartialEq)]
#[br(magic = b"BTDB", little)]
pub struct BtdHeader {
    pub version: u32,

    /// Lowest height in the world
    pub min_height: f32,

    /// Highest height in the world
    pub max_height: f32,

    /// X coordinate of the south west cell
    pub cell_min_x: i32,

    /// Y coordinate of the south west cell
    pub cell_min_y: i32,

    /// X coordinate of the north east cell
    pub cell_max_x: i32,

    /// Y coordinate of the north east cell
    pub cell_max_y: i32,

    pub land_texture_count: u32,
    pub ground_cover_count: u32,

    /// Table of land texture form IDs
    pub land_texture_offset: u32,

    /// Table of ground cover form IDs
    pub ground_cover_offset: u32,

    /// Minimum and maximum height of each cell
    pub height_range_offset: u32,

    /// Eight land texture IDs plus one per cell quadrant
    pub land_texture_map_offset: u32,

    /// Eight ground cover IDs per cell quadrant
    pub ground_cover_map_offset: u32,

    /// Tile tables, finest LOD first
    pub tile_table_offsets: [u32; 5],

    pub block_count: u32,

    /// Table of compressed block descriptors
    pub block_table_offset: u32,

    /// Start of the compressed data
    pub block_data_offset: u32,
}

impl BtdHeader {
    /// World width in cells
    pub fn cells_x(&self) -> usize {
        (i64::from(self.cell_max_x) - i64::from(self.cell_min_x) + 1).max(0) as usize
    }

    /// World height in cells
    pub fn cells_y(&self) -> usize {
        (i64::from(self.cell_max_y) - i64::from(self.cell_min_y) + 1).max(0) as usize
    }

    /// World width in tiles
    pub fn tiles_x(&self) -> usize {
        self.cells_x().div_ceil(TILE_CELLS as usize)
    }

    /// World height in tiles
    pub fn tiles_y(&self) -> usize {
        self.cells_y().div_ceil(TILE_CELLS as usize)
    }
}

/// Location of one compressed block
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct BlockDescriptor {
    /// Offset relative to the start of the compressed data
    pub offset: u32,
    pub size: u32,
}

/// Consecutive blocks of a descriptor table
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct BlockRange {
    pub first: u32,
    pub count: u32,
}

impl BlockRange {
    /// Indices of the blocks in this range
    pub fn blocks(&self) -> std::ops::Range<usize> {
        let first = self.first as usize;
        first..first + self.count as usize
    }
}

/// Contents of a compressed block
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum BlockKind {
    /// Interleaved height and land texture opacity
    Height = 0,

    /// Ground cover bit masks, finest LOD only
    GroundCover = 1,

    /// RGB555 vertex colors, LOD 2 to 4
    Color = 2,
}

/// Entry of a LOD tile table, one block range per [`BlockKind`]
#[derive(BinRead, Debug, Default, Copy, Clone, PartialEq, Eq)]
#[br(little)]
pub struct TileRecord {
    pub ranges: [BlockRange; 3],
}

impl TileRecord {
    /// Blocks of one kind
    pub fn range(&self, kind: BlockKind) -> BlockRange {
        self.ranges[kind as usize]
    }
}
