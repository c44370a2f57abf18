//! In-memory BTD images for tests.
#![allow(dead_code)]

use std::io::Write;
use std::sync::OnceLock;

use flate2::{write::ZlibEncoder, Compression};

pub const HEIGHT: usize = 0;
pub const GROUND_COVER: usize = 1;
pub const COLOR: usize = 2;

/// Full resolution height of sample (`i`, `j`) of cell (`x`, `y`)
pub fn height(x: i32, y: i32, i: usize, j: usize) -> u16 {
    ((x * 977 + y * 131) as u16).wrapping_add((i * 3 + j * 5) as u16)
}

/// Full resolution land texture opacity
pub fn opacity(x: i32, _y: i32, i: usize, j: usize) -> u16 {
    ((i ^ j) as u16).wrapping_mul(257).wrapping_add(x as u16)
}

/// Ground cover mask
pub fn cover(_x: i32, y: i32, i: usize, j: usize) -> u8 {
    ((i / 16 + j / 16) as u8) ^ (y as u8)
}

/// Terrain color on the 32x32 grid of a cell
pub fn color(x: i32, _y: i32, i: usize, j: usize) -> u16 {
    (i + j * 32) as u16 | ((x as u16 & 1) << 15)
}

/// Stored land texture map byte, ID + 1 with 0 for none
pub fn land_slot(cell: usize, quadrant: usize, k: usize) -> u8 {
    ((cell + quadrant + k) % 5) as u8
}

/// Stored ground cover map byte, 0xFF for none
pub fn cover_slot(cell: usize, quadrant: usize, k: usize) -> u8 {
    if k < 4 {
        ((cell + quadrant * 2 + k) % 3) as u8
    } else {
        0xFF
    }
}

/// Shape of a generated world
pub struct World {
    pub min: (i32, i32),
    pub max: (i32, i32),
    pub min_height: f32,
    pub max_height: f32,
    pub land_textures: Vec<u32>,
    pub ground_covers: Vec<u32>,
}

impl World {
    pub fn cells_x(&self) -> usize {
        (self.max.0 - self.min.0 + 1) as usize
    }

    pub fn cells_y(&self) -> usize {
        (self.max.1 - self.min.1 + 1) as usize
    }

    /// Row major index of a cell
    pub fn cell_index(&self, x: i32, y: i32) -> usize {
        (y - self.min.1) as usize * self.cells_x() + (x - self.min.0) as usize
    }
}

/// A compressed block of a generated image
#[derive(Debug, Clone)]
pub struct BlockInfo {
    pub lod: usize,
    pub kind: usize,
    pub cell: (i32, i32),
    /// Absolute offset in the image
    pub offset: usize,
    pub size: usize,
}

/// A generated BTD file
pub struct BtdImage {
    pub data: Vec<u8>,
    pub blocks: Vec<BlockInfo>,
}

impl BtdImage {
    /// Blocks of one kind and LOD whose cell lies in the tile of cell (`x`, `y`)
    pub fn tile_blocks(&self, world: &World, x: i32, y: i32, kind: usize, lod: usize) -> usize {
        let tile = |(cx, cy): (i32, i32)| ((cx - world.min.0) / 8, (cy - world.min.1) / 8);
        self.blocks
            .iter()
            .filter(|b| b.kind == kind && b.lod == lod && tile(b.cell) == tile((x, y)))
            .count()
    }
}

fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::fast());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn put_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn inherited(lod: usize, i: usize, j: usize) -> bool {
    lod < 4 && i % 2 == 0 && j % 2 == 0
}

fn payload(kind: usize, lod: usize, (x, y): (i32, i32), (cx, cy): (usize, usize)) -> Vec<u8> {
    let mut out = vec![cx as u8, cy as u8];
    let n = 128 >> lod;
    match kind {
        HEIGHT => {
            let step = 1 << lod;
            for j in 0..n {
                for i in 0..n {
                    if inherited(lod, i, j) {
                        continue;
                    }
                    let (fi, fj) = (i * step, j * step);
                    out.extend_from_slice(&height(x, y, fi, fj).to_le_bytes());
                    out.extend_from_slice(&opacity(x, y, fi, fj).to_le_bytes());
                }
            }
        }
        GROUND_COVER => {
            for j in 0..128 {
                for i in 0..128 {
                    out.push(cover(x, y, i, j));
                }
            }
        }
        _ => {
            let step = 1 << (lod - 2);
            for j in 0..n {
                for i in 0..n {
                    if inherited(lod, i, j) {
                        continue;
                    }
                    out.extend_from_slice(&color(x, y, i * step, j * step).to_le_bytes());
                }
            }
        }
    }
    out
}

/// Build a BTD file holding every layer of every cell of `world`.
pub fn btd(world: &World) -> BtdImage {
    let (cells_x, cells_y) = (world.cells_x(), world.cells_y());
    let cells = cells_x * cells_y;
    let (tiles_x, tiles_y) = (cells_x.div_ceil(8), cells_y.div_ceil(8));

    let mut blocks: Vec<BlockInfo> = Vec::new();
    let mut compressed = Vec::new();
    let mut tables: Vec<Vec<[(u32, u32); 3]>> = vec![Vec::new(); 5];
    for (lod, table) in tables.iter_mut().enumerate() {
        for ty in 0..tiles_y {
            for tx in 0..tiles_x {
                let mut ranges = [(0u32, 0u32); 3];
                for (kind, range) in ranges.iter_mut().enumerate() {
                    if (kind == GROUND_COVER && lod != 0) || (kind == COLOR && lod < 2) {
                        continue;
                    }
                    let first = blocks.len();
                    for cy in 0..8 {
                        for cx in 0..8 {
                            let (gx, gy) = (tx * 8 + cx, ty * 8 + cy);
                            if gx >= cells_x || gy >= cells_y {
                                continue;
                            }
                            let cell = (world.min.0 + gx as i32, world.min.1 + gy as i32);
                            let block = zlib(&payload(kind, lod, cell, (cx, cy)));
                            blocks.push(BlockInfo {
                                lod,
                                kind,
                                cell,
                                offset: compressed.len(),
                                size: block.len(),
                            });
                            compressed.extend_from_slice(&block);
                        }
                    }
                    *range = (first as u32, (blocks.len() - first) as u32);
                }
                table.push(ranges);
            }
        }
    }

    let land_texture_offset = 92;
    let ground_cover_offset = land_texture_offset + world.land_textures.len() * 4;
    let height_range_offset = ground_cover_offset + world.ground_covers.len() * 4;
    let land_map_offset = height_range_offset + cells * 8;
    let cover_map_offset = land_map_offset + cells * 32;
    let tile_tables_offset = cover_map_offset + cells * 32;
    let tile_table_size = tiles_x * tiles_y * 24;
    let block_table_offset = tile_tables_offset + 5 * tile_table_size;
    let block_data_offset = block_table_offset + blocks.len() * 8;

    let mut out = b"BTDB".to_vec();
    put_u32(&mut out, 6);
    out.extend_from_slice(&world.min_height.to_le_bytes());
    out.extend_from_slice(&world.max_height.to_le_bytes());
    for value in [world.min.0, world.min.1, world.max.0, world.max.1] {
        out.extend_from_slice(&value.to_le_bytes());
    }
    put_u32(&mut out, world.land_textures.len() as u32);
    put_u32(&mut out, world.ground_covers.len() as u32);
    for offset in [
        land_texture_offset,
        ground_cover_offset,
        height_range_offset,
        land_map_offset,
        cover_map_offset,
    ] {
        put_u32(&mut out, offset as u32);
    }
    for lod in 0..5 {
        put_u32(&mut out, (tile_tables_offset + lod * tile_table_size) as u32);
    }
    put_u32(&mut out, blocks.len() as u32);
    put_u32(&mut out, block_table_offset as u32);
    put_u32(&mut out, block_data_offset as u32);
    assert_eq!(out.len(), 92);

    for &id in world.land_textures.iter().chain(&world.ground_covers) {
        put_u32(&mut out, id);
    }
    for cell in 0..cells {
        out.extend_from_slice(&(cell as f32).to_le_bytes());
        out.extend_from_slice(&(cell as f32 + 100.0).to_le_bytes());
    }
    for slot in [land_slot, cover_slot] {
        for cell in 0..cells {
            for quadrant in 0..4 {
                for k in 0..8 {
                    out.push(slot(cell, quadrant, k));
                }
            }
        }
    }
    for table in &tables {
        for ranges in table {
            for (first, count) in ranges {
                put_u32(&mut out, *first);
                put_u32(&mut out, *count);
            }
        }
    }
    for block in &blocks {
        put_u32(&mut out, block.offset as u32);
        put_u32(&mut out, block.size as u32);
    }
    assert_eq!(out.len(), block_data_offset);
    out.extend_from_slice(&compressed);

    for block in &mut blocks {
        block.offset += block_data_offset;
    }
    BtdImage { data: out, blocks }
}

/// A 12x10 cell world, 2x2 tiles of which only the south west one is full
pub fn world() -> &'static World {
    static WORLD: OnceLock<World> = OnceLock::new();
    WORLD.get_or_init(|| World {
        min: (-2, -1),
        max: (9, 8),
        min_height: -512.0,
        max_height: 4096.0,
        land_textures: vec![0x0001_0A00, 0x0001_0A01, 0x0001_0A02, 0x0001_0A03],
        ground_covers: vec![0x0002_0B00, 0x0002_0B01, 0x0002_0B02],
    })
}

/// The image of [`world`]
pub fn image() -> &'static BtdImage {
    static IMAGE: OnceLock<BtdImage> = OnceLock::new();
    IMAGE.get_or_init(|| btd(world()))
}
