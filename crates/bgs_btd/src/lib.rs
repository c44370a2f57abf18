//! This library handles reading **BTD** terrain databases.
//!
//! # BTD Format Documentation
//!
//! A BTD file covers a rectangle of cells. Each cell is 128x128 height samples at the finest
//! level of detail (LOD 0); LOD `l` keeps every `2^l`th sample. Terrain is compressed in
//! blocks that hold one layer of one cell at one LOD, and is decoded in tiles of 8x8 cells.
//! All integers are little-endian.
//!
//! ## Header
//!
//! | Offset (bytes) | Field                   | Description                                   |
//! |----------------|-------------------------|-----------------------------------------------|
//! | 0x0000         | Magic number            | 4 bytes: "BTDB"                               |
//! | 0x0004         | Version                 | 4 bytes: 6                                    |
//! | 0x0008         | Minimum Height          | 4 bytes: f32                                  |
//! | 0x000C         | Maximum Height          | 4 bytes: f32                                  |
//! | 0x0010         | Cell Bounds             | 16 bytes: min X, min Y, max X, max Y as i32   |
//! | 0x0020         | Land Texture Count      | 4 bytes                                       |
//! | 0x0024         | Ground Cover Count      | 4 bytes                                       |
//! | 0x0028         | Land Texture Offset     | 4 bytes: form IDs, 4 bytes each               |
//! | 0x002C         | Ground Cover Offset     | 4 bytes: form IDs, 4 bytes each               |
//! | 0x0030         | Height Range Offset     | 4 bytes: min and max f32 per cell             |
//! | 0x0034         | Land Texture Map Offset | 4 bytes: 4 quadrants x 8 IDs + 1 per cell     |
//! | 0x0038         | Ground Cover Map Offset | 4 bytes: 4 quadrants x 8 IDs per cell         |
//! | 0x003C         | Tile Table Offsets      | 20 bytes: LOD 0 to LOD 4                      |
//! | 0x0050         | Block Count             | 4 bytes                                       |
//! | 0x0054         | Block Table Offset      | 4 bytes: offset u32 and size u32 per block    |
//! | 0x0058         | Block Data Offset       | 4 bytes: base of the block offsets            |
//!
//! Cells are numbered row by row from the south west corner. A tile table has one 24 byte
//! entry per tile holding three `first block, block count` ranges: height and land texture,
//! ground cover (LOD 0 only) and terrain color (LOD 2 to 4 only).
//!
//! ## Blocks
//!
//! A decompressed block starts with the position of its cell inside the tile (`x u8, y u8`)
//! followed by samples in row order. LOD 4 stores every sample; finer LODs skip the samples
//! whose row and column are both even, as those belong to the next coarser LOD.
//!
//! | Kind          | Samples per row | Sample                            |
//! |---------------|-----------------|-----------------------------------|
//! | Height        | `128 >> lod`    | height u16, land texture alpha u16 |
//! | Ground cover  | 128             | u8 bit mask                       |
//! | Terrain color | `128 >> lod`    | RGB555 u16, stored at 32x32 per cell |
//!

mod decode;
pub mod error;
pub mod layers;
pub mod read;
mod tile;
pub mod types;

pub use bgs_archive::FileBuffer;
pub use error::{Error, ErrorKind};
pub use layers::LayerMask;
pub use read::TerrainStore;
