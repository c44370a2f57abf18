//! Types for reading BTD terrain files

use std::io::Cursor;
use std::path::Path;

use bgs_archive::FileBuffer;
use binrw::BinRead;
use byteorder::{ByteOrder, LE};
use tracing::{debug, instrument};

use crate::decode::{fork_join, BlockSource, Job};
use crate::error::{Error, Result};
use crate::layers::{Layer, LayerMask, MAX_LOD, MIN_COLOR_LOD};
use crate::tile::{Tile, TileCache};
use crate::types::{BlockDescriptor, BtdHeader, TileRecord, BTD_VERSION, HEADER_SIZE, TILE_CELLS};

/// Tiles kept decoded unless configured otherwise
pub const DEFAULT_CACHE_CAPACITY: usize = 4;

/// Size of one quadrant entry of the texture set maps
const QUADRANT_IDS: usize = 8;

/// Reader for a BTD terrain file
///
/// Terrain is decoded in tiles of 8x8 cells. A fixed number of tiles stays cached; each
/// accessor decodes only the layers its tile is missing.
///
/// ```no_run
/// use bgs_btd::TerrainStore;
///
/// fn print_heights(path: &std::path::Path) -> bgs_btd::error::Result<()> {
///     let mut terrain = TerrainStore::open(path)?;
///     let mut heights = vec![0u16; 32 * 32];
///     terrain.cell_height_map(&mut heights, terrain.cell_min_x(), terrain.cell_min_y(), 2)?;
///     println!("{:?}", &heights[..32]);
///     Ok(())
/// }
/// ```
pub struct TerrainStore {
    buffer: FileBuffer,
    header: BtdHeader,
    blocks: Vec<BlockDescriptor>,
    /// Tile tables, finest LOD first
    tiles: [Vec<TileRecord>; 5],
    cache: TileCache,
    workers: usize,
    decoded_blocks: u64,
}

impl std::fmt::Debug for TerrainStore {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("TerrainStore")
            .field("header", &self.header)
            .field("cache_capacity", &self.cache.capacity())
            .field("workers", &self.workers)
            .finish()
    }
}

/// Check that `count` entries of `size` bytes at `offset` fit in `len` bytes.
fn check_table(len: usize, what: &str, offset: u32, count: usize, size: usize) -> Result<()> {
    let end = count
        .checked_mul(size)
        .and_then(|bytes| bytes.checked_add(offset as usize));
    match end {
        Some(end) if end <= len => Ok(()),
        _ => Err(Error::InvalidTerrain(format!(
            "{what} at offset {offset} with {count} entries exceeds the file size of {len}"
        ))),
    }
}

fn read_table<T>(data: &[u8], offset: u32, count: usize) -> Result<Vec<T>>
where
    T: for<'a> BinRead<Args<'a> = ()>,
{
    let mut reader = Cursor::new(data);
    reader.set_position(u64::from(offset));
    (0..count)
        .map(|_| T::read_le(&mut reader))
        .collect::<binrw::BinResult<Vec<T>>>()
        .map_err(Error::from)
}

/// Check that every layer of every tile has at least one block per cell of the world.
fn check_coverage(header: &BtdHeader, tiles: &[Vec<TileRecord>; 5]) -> Result<()> {
    let cells = TILE_CELLS as usize;
    let (cells_x, cells_y) = (header.cells_x(), header.cells_y());
    for layer in Layer::ALL {
        let table = &tiles[usize::from(layer.lod)];
        for (tile, record) in table.iter().enumerate() {
            let (tx, ty) = (tile % header.tiles_x(), tile / header.tiles_x());
            let needed = (cells_x - tx * cells).min(cells) * (cells_y - ty * cells).min(cells);
            let count = record.range(layer.kind).count as usize;
            if count < needed {
                return Err(Error::InvalidTerrain(format!(
                    "LOD{} {:?} blocks of tile ({tx}, {ty}) cover {count} of {needed} cells",
                    layer.lod, layer.kind
                )));
            }
        }
    }
    Ok(())
}

fn default_workers() -> usize {
    std::thread::available_parallelism().map_or(1, usize::from)
}

impl TerrainStore {
    /// Open the terrain file at `path`.
    #[instrument(err)]
    pub fn open(path: &Path) -> Result<TerrainStore> {
        Self::from_buffer(FileBuffer::open(path)?)
    }

    /// Parse a terrain file that is already in memory.
    #[instrument(skip_all, err)]
    pub fn from_buffer(buffer: FileBuffer) -> Result<TerrainStore> {
        let data: &[u8] = &buffer;
        if data.len() < HEADER_SIZE {
            return Err(Error::InvalidTerrain(format!(
                "{} bytes are too short for a header",
                data.len()
            )));
        }

        let header = BtdHeader::read(&mut Cursor::new(data))?;
        if header.version != BTD_VERSION {
            return Err(Error::UnsupportedVersion(header.version));
        }
        if header.cell_max_x < header.cell_min_x || header.cell_max_y < header.cell_min_y {
            return Err(Error::InvalidTerrain(format!(
                "empty world from ({}, {}) to ({}, {})",
                header.cell_min_x, header.cell_min_y, header.cell_max_x, header.cell_max_y
            )));
        }

        let len = data.len();
        let too_large = || Error::InvalidTerrain("world is too large".to_owned());
        let cells = header.cells_x().checked_mul(header.cells_y()).ok_or_else(too_large)?;
        let tile_count = header.tiles_x() * header.tiles_y();
        let land_textures = header.land_texture_count as usize;
        let ground_covers = header.ground_cover_count as usize;
        check_table(len, "land texture table", header.land_texture_offset, land_textures, 4)?;
        check_table(len, "ground cover table", header.ground_cover_offset, ground_covers, 4)?;
        check_table(len, "cell height ranges", header.height_range_offset, cells, 8)?;
        check_table(len, "land texture map", header.land_texture_map_offset, cells, 32)?;
        check_table(len, "ground cover map", header.ground_cover_map_offset, cells, 32)?;
        let block_count = header.block_count as usize;
        check_table(len, "block table", header.block_table_offset, block_count, 8)?;
        for offset in header.tile_table_offsets {
            check_table(len, "tile table", offset, tile_count, 24)?;
        }

        let blocks: Vec<BlockDescriptor> =
            read_table(data, header.block_table_offset, block_count)?;
        let compressed = &data[(header.block_data_offset as usize).min(len)..];
        for (index, block) in blocks.iter().enumerate() {
            let end = u64::from(block.offset) + u64::from(block.size);
            if end > compressed.len() as u64 {
                return Err(Error::InvalidTerrain(format!(
                    "block {index} lies outside the file"
                )));
            }
        }

        let mut tiles: [Vec<TileRecord>; 5] = Default::default();
        for (lod, table) in tiles.iter_mut().enumerate() {
            *table = read_table(data, header.tile_table_offsets[lod], tile_count)?;
            for record in table.iter() {
                for range in record.ranges {
                    if range.blocks().end > blocks.len() {
                        return Err(Error::InvalidTerrain(format!(
                            "LOD{lod} tile table refers to missing blocks {:?}",
                            range.blocks()
                        )));
                    }
                }
            }
        }
        check_coverage(&header, &tiles)?;

        debug!(
            cells_x = header.cells_x(),
            cells_y = header.cells_y(),
            blocks = blocks.len(),
            "parsed terrain header"
        );

        Ok(TerrainStore {
            buffer,
            header,
            blocks,
            tiles,
            cache: TileCache::new(DEFAULT_CACHE_CAPACITY),
            workers: default_workers(),
            decoded_blocks: 0,
        })
    }

    /// X coordinate of the south west cell
    pub fn cell_min_x(&self) -> i32 {
        self.header.cell_min_x
    }

    /// Y coordinate of the south west cell
    pub fn cell_min_y(&self) -> i32 {
        self.header.cell_min_y
    }

    /// X coordinate of the north east cell
    pub fn cell_max_x(&self) -> i32 {
        self.header.cell_max_x
    }

    /// Y coordinate of the north east cell
    pub fn cell_max_y(&self) -> i32 {
        self.header.cell_max_y
    }

    pub fn min_height(&self) -> f32 {
        self.header.min_height
    }

    pub fn max_height(&self) -> f32 {
        self.header.max_height
    }

    pub fn land_texture_count(&self) -> usize {
        self.header.land_texture_count as usize
    }

    pub fn ground_cover_count(&self) -> usize {
        self.header.ground_cover_count as usize
    }

    /// Form ID of land texture `n`
    pub fn land_texture(&self, n: usize) -> Result<u32> {
        let count = self.land_texture_count();
        self.form_id("land texture", self.header.land_texture_offset, n, count)
    }

    /// Form ID of ground cover `n`
    pub fn ground_cover(&self, n: usize) -> Result<u32> {
        let count = self.ground_cover_count();
        self.form_id("ground cover", self.header.ground_cover_offset, n, count)
    }

    fn form_id(
        &self,
        table: &'static str,
        offset: u32,
        index: usize,
        count: usize,
    ) -> Result<u32> {
        if index >= count {
            return Err(Error::IndexOutOfBounds {
                table,
                index,
                count,
            });
        }
        let start = offset as usize + index * 4;
        Ok(LE::read_u32(&self.buffer[start..start + 4]))
    }

    /// Lowest and highest point of a cell
    pub fn cell_height_range(&self, x: i32, y: i32) -> Result<(f32, f32)> {
        let start = self.header.height_range_offset as usize + self.cell_index(x, y)? * 8;
        let range = &self.buffer[start..start + 8];
        Ok((LE::read_f32(&range[..4]), LE::read_f32(&range[4..])))
    }

    /// Number of tiles kept decoded
    pub fn cache_capacity(&self) -> usize {
        self.cache.capacity()
    }

    /// Change the number of tiles kept decoded, at least one.
    ///
    /// Changing the capacity discards every cached tile.
    pub fn set_cache_capacity(&mut self, n: usize) {
        let n = n.max(1);
        if n != self.cache.capacity() {
            debug!(capacity = n, "resizing tile cache");
            self.cache = TileCache::new(n);
        }
    }

    /// Number of threads decoding the blocks of a tile
    pub fn worker_count(&self) -> usize {
        self.workers
    }

    /// Change the number of threads decoding the blocks of a tile, at least one.
    pub fn set_worker_count(&mut self, n: usize) {
        self.workers = n.max(1);
    }

    /// Total number of compressed blocks decoded so far
    pub fn decoded_block_count(&self) -> u64 {
        self.decoded_blocks
    }

    /// Position of a cell in the per-cell tables
    fn cell_index(&self, x: i32, y: i32) -> Result<usize> {
        let h = &self.header;
        if x < h.cell_min_x || x > h.cell_max_x || y < h.cell_min_y || y > h.cell_max_y {
            return Err(Error::CellOutOfBounds { x, y });
        }
        let dx = (i64::from(x) - i64::from(h.cell_min_x)) as usize;
        let dy = (i64::from(y) - i64::from(h.cell_min_y)) as usize;
        Ok(dy * h.cells_x() + dx)
    }

    /// Tile of a cell: its index in the tile tables and the cell position inside it
    fn locate(&self, x: i32, y: i32) -> Result<(usize, (usize, usize))> {
        self.cell_index(x, y)?;
        let dx = (i64::from(x) - i64::from(self.header.cell_min_x)) as usize;
        let dy = (i64::from(y) - i64::from(self.header.cell_min_y)) as usize;
        let cells = TILE_CELLS as usize;
        let tile = (dy / cells) * self.header.tiles_x() + dx / cells;
        Ok((tile, (dx % cells, dy % cells)))
    }

    /// Make sure the tile holding cell (`x`, `y`) has every layer of `layers` decoded.
    ///
    /// A tile that is not cached takes over the next cache slot in turn. On failure none of
    /// the requested layers is marked as decoded.
    #[instrument(level = "debug", skip(self), err)]
    pub fn load_tile(&mut self, x: i32, y: i32, layers: LayerMask) -> Result<()> {
        self.load(x, y, layers).map(|_| ())
    }

    /// Load a tile and return its cache slot together with the cell position inside it.
    fn load(&mut self, x: i32, y: i32, layers: LayerMask) -> Result<(usize, (usize, usize))> {
        let (tile_index, cell) = self.locate(x, y)?;
        let origin = (x - cell.0 as i32, y - cell.1 as i32);

        let (slot, hit) = self.cache.claim(origin);
        let missing = (layers & LayerMask::all()).difference(self.cache.tile(slot).layers);
        if missing.is_empty() {
            return Ok((slot, cell));
        }
        if !hit {
            debug!(?origin, slot, "tile cache miss");
        }

        let jobs: Vec<Job> = missing
            .layers()
            .flat_map(|layer| {
                self.tiles[usize::from(layer.lod)][tile_index]
                    .range(layer.kind)
                    .blocks()
                    .map(move |block| Job { block, layer })
            })
            .collect();

        let data: &[u8] = &self.buffer;
        let source = BlockSource {
            data: &data[(self.header.block_data_offset as usize).min(data.len())..],
            descriptors: &self.blocks,
        };
        debug!(?missing, blocks = jobs.len(), workers = self.workers, "decoding tile");
        let decoded = fork_join(&jobs, self.workers, |job| source.decode(job));
        self.decoded_blocks += jobs.len() as u64;
        let payloads = decoded?;

        let tile: &mut Tile = self.cache.tile_mut(slot);
        tile.allocate(missing);
        for (job, payload) in jobs.iter().zip(&payloads) {
            tile.scatter(job.layer, payload);
        }
        tile.layers |= missing;

        Ok((slot, cell))
    }

    /// Check a caller buffer against the window size of `lod`.
    fn check_window<T>(buf: &[T], lod: u8, min_lod: u8) -> Result<()> {
        if !(min_lod..=MAX_LOD).contains(&lod) {
            return Err(Error::InvalidArgument(format!(
                "LOD {lod} is outside {min_lod} to {MAX_LOD}"
            )));
        }
        let n = 128usize >> lod;
        if buf.len() < n * n {
            return Err(Error::InvalidArgument(format!(
                "buffer of {} samples is smaller than {n}x{n}",
                buf.len()
            )));
        }
        Ok(())
    }

    /// Copy the heights of a cell at `lod` into `buf`, `128 >> lod` samples per row from south
    /// to north.
    pub fn cell_height_map(&mut self, buf: &mut [u16], x: i32, y: i32, lod: u8) -> Result<()> {
        Self::check_window(buf, lod, 0)?;
        let (slot, cell) = self.load(x, y, LayerMask::height(lod))?;
        self.cache.tile(slot).copy_height(buf, cell, lod);
        Ok(())
    }

    /// Copy the land texture opacities of a cell at `lod` into `buf`.
    pub fn cell_land_texture(&mut self, buf: &mut [u16], x: i32, y: i32, lod: u8) -> Result<()> {
        Self::check_window(buf, lod, 0)?;
        let (slot, cell) = self.load(x, y, LayerMask::height(lod))?;
        self.cache.tile(slot).copy_land_texture(buf, cell, lod);
        Ok(())
    }

    /// Copy the ground cover masks of a cell into `buf`, sub-sampled to `lod`.
    pub fn cell_ground_cover(&mut self, buf: &mut [u8], x: i32, y: i32, lod: u8) -> Result<()> {
        Self::check_window(buf, lod, 0)?;
        let (slot, cell) = self.load(x, y, LayerMask::ground_cover())?;
        self.cache.tile(slot).copy_ground_cover(buf, cell, lod);
        Ok(())
    }

    /// Copy the RGB555 vertex colors of a cell at `lod` (2 to 4) into `buf`.
    pub fn cell_terrain_color(&mut self, buf: &mut [u16], x: i32, y: i32, lod: u8) -> Result<()> {
        Self::check_window(buf, lod, MIN_COLOR_LOD)?;
        let (slot, cell) = self.load(x, y, LayerMask::color(lod))?;
        self.cache.tile(slot).copy_color(buf, cell, lod);
        Ok(())
    }

    /// Texture IDs of the four quadrants of a cell.
    ///
    /// Each quadrant (south west, south east, north west, north east) takes 16 bytes: eight
    /// land texture IDs followed by eight ground cover IDs, 0xFF where a slot is unused.
    pub fn cell_texture_set(&self, buf: &mut [u8; 64], x: i32, y: i32) -> Result<()> {
        let cell = self.cell_index(x, y)?;
        let entry = cell * 4 * QUADRANT_IDS;
        let land = self.header.land_texture_map_offset as usize + entry;
        let cover = self.header.ground_cover_map_offset as usize + entry;

        for (quadrant, out) in buf.chunks_exact_mut(2 * QUADRANT_IDS).enumerate() {
            let at = quadrant * QUADRANT_IDS;
            let (land_ids, cover_ids) = out.split_at_mut(QUADRANT_IDS);
            for (id, &stored) in land_ids.iter_mut().zip(&self.buffer[land + at..]) {
                *id = stored.checked_sub(1).unwrap_or(0xFF);
            }
            cover_ids.copy_from_slice(&self.buffer[cover + at..cover + at + QUADRANT_IDS]);
        }
        Ok(())
    }
}
