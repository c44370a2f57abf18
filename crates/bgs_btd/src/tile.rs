//! Decoded tiles and the cache holding them

use std::collections::HashMap;

use tracing::debug;

use crate::layers::{Layer, LayerMask, MIN_COLOR_LOD};
use crate::types::BlockKind;

/// Full resolution samples along each side of a cell
pub(crate) const CELL_SAMPLES: usize = 128;

/// Terrain color samples along each side of a cell
pub(crate) const CELL_COLOR_SAMPLES: usize = 32;

/// Full resolution samples along each side of a tile
pub(crate) const TILE_SAMPLES: usize = 8 * CELL_SAMPLES;

/// Terrain color samples along each side of a tile
pub(crate) const TILE_COLOR_SAMPLES: usize = 8 * CELL_COLOR_SAMPLES;

/// Decoded data of 8x8 cells
///
/// Buffers are allocated the first time a layer of their kind is decoded and zeroed when the
/// slot is reused for another tile.
#[derive(Debug, Default)]
pub(crate) struct Tile {
    /// South west cell, `None` while the slot is unused
    pub origin: Option<(i32, i32)>,
    pub layers: LayerMask,
    height: Vec<u16>,
    land_texture: Vec<u16>,
    ground_cover: Vec<u8>,
    color: Vec<u16>,
}

fn ensure_len<T: Copy + Default>(buffer: &mut Vec<T>, len: usize) {
    if buffer.len() != len {
        buffer.clear();
        buffer.resize(len, T::default());
    }
}

/// Copy every `step`th sample of an `n` x `n` window starting at (`x0`, `y0`).
fn copy_window<T: Copy>(
    out: &mut [T],
    src: &[T],
    width: usize,
    (x0, y0): (usize, usize),
    n: usize,
    step: usize,
) {
    for (j, row) in out.chunks_exact_mut(n).take(n).enumerate() {
        let start = (y0 + j * step) * width + x0;
        for (i, sample) in row.iter_mut().enumerate() {
            *sample = src[start + i * step];
        }
    }
}

impl Tile {
    /// Allocate the buffers the layers of `layers` are written to.
    pub fn allocate(&mut self, layers: LayerMask) {
        let full = TILE_SAMPLES * TILE_SAMPLES;
        if layers.intersects(LayerMask::height(0)) {
            ensure_len(&mut self.height, full);
            ensure_len(&mut self.land_texture, full);
        }
        if layers.contains(LayerMask::GROUND_COVER) {
            ensure_len(&mut self.ground_cover, full);
        }
        if layers.intersects(LayerMask::color(MIN_COLOR_LOD)) {
            ensure_len(&mut self.color, TILE_COLOR_SAMPLES * TILE_COLOR_SAMPLES);
        }
    }

    /// Forget every decoded layer and zero the buffers.
    fn clear(&mut self) {
        self.layers = LayerMask::empty();
        self.height.fill(0);
        self.land_texture.fill(0);
        self.ground_cover.fill(0);
        self.color.fill(0);
    }

    /// Write a decompressed block whose size has been checked against its layer.
    pub fn scatter(&mut self, layer: Layer, payload: &[u8]) {
        let [cx, cy, ref samples @ ..] = *payload else {
            return;
        };
        let (cx, cy) = (usize::from(cx), usize::from(cy));
        let n = layer.row_samples();

        match layer.kind {
            BlockKind::Height => {
                ensure_len(&mut self.height, TILE_SAMPLES * TILE_SAMPLES);
                ensure_len(&mut self.land_texture, TILE_SAMPLES * TILE_SAMPLES);
                let step = 1 << layer.lod;
                let positions = (0..n)
                    .flat_map(|j| (0..n).map(move |i| (i, j)))
                    .filter(|&(i, j)| !layer.inherits(i, j));
                for ((i, j), sample) in positions.zip(samples.chunks_exact(4)) {
                    let index = (cy * CELL_SAMPLES + j * step) * TILE_SAMPLES
                        + cx * CELL_SAMPLES
                        + i * step;
                    self.height[index] = u16::from_le_bytes([sample[0], sample[1]]);
                    self.land_texture[index] = u16::from_le_bytes([sample[2], sample[3]]);
                }
            }
            BlockKind::GroundCover => {
                ensure_len(&mut self.ground_cover, TILE_SAMPLES * TILE_SAMPLES);
                for (j, row) in samples.chunks_exact(CELL_SAMPLES).enumerate() {
                    let start = (cy * CELL_SAMPLES + j) * TILE_SAMPLES + cx * CELL_SAMPLES;
                    self.ground_cover[start..start + CELL_SAMPLES].copy_from_slice(row);
                }
            }
            BlockKind::Color => {
                ensure_len(&mut self.color, TILE_COLOR_SAMPLES * TILE_COLOR_SAMPLES);
                let step = 1 << (layer.lod - MIN_COLOR_LOD);
                let positions = (0..n)
                    .flat_map(|j| (0..n).map(move |i| (i, j)))
                    .filter(|&(i, j)| !layer.inherits(i, j));
                for ((i, j), sample) in positions.zip(samples.chunks_exact(2)) {
                    let index = (cy * CELL_COLOR_SAMPLES + j * step) * TILE_COLOR_SAMPLES
                        + cx * CELL_COLOR_SAMPLES
                        + i * step;
                    self.color[index] = u16::from_le_bytes([sample[0], sample[1]]);
                }
            }
        }
    }

    /// Heights of cell (`cx`, `cy`) of this tile at `lod`
    pub fn copy_height(&self, out: &mut [u16], (cx, cy): (usize, usize), lod: u8) {
        let origin = (cx * CELL_SAMPLES, cy * CELL_SAMPLES);
        copy_window(out, &self.height, TILE_SAMPLES, origin, 128 >> lod, 1 << lod);
    }

    /// Land texture opacities of cell (`cx`, `cy`) of this tile at `lod`
    pub fn copy_land_texture(&self, out: &mut [u16], (cx, cy): (usize, usize), lod: u8) {
        let origin = (cx * CELL_SAMPLES, cy * CELL_SAMPLES);
        copy_window(out, &self.land_texture, TILE_SAMPLES, origin, 128 >> lod, 1 << lod);
    }

    /// Ground cover masks of cell (`cx`, `cy`) of this tile, sub-sampled to `lod`
    pub fn copy_ground_cover(&self, out: &mut [u8], (cx, cy): (usize, usize), lod: u8) {
        let origin = (cx * CELL_SAMPLES, cy * CELL_SAMPLES);
        copy_window(out, &self.ground_cover, TILE_SAMPLES, origin, 128 >> lod, 1 << lod);
    }

    /// Terrain colors of cell (`cx`, `cy`) of this tile at `lod`
    pub fn copy_color(&self, out: &mut [u16], (cx, cy): (usize, usize), lod: u8) {
        let origin = (cx * CELL_COLOR_SAMPLES, cy * CELL_COLOR_SAMPLES);
        let step = 1 << (lod - MIN_COLOR_LOD);
        copy_window(out, &self.color, TILE_COLOR_SAMPLES, origin, 128 >> lod, step);
    }
}

/// Fixed number of tile slots, reused in round-robin order
///
/// A miss always claims the slot after the one claimed last, whether or not the tile in it was
/// used recently.
#[derive(Debug)]
pub(crate) struct TileCache {
    slots: Vec<Tile>,
    lookup: HashMap<(i32, i32), usize>,
    next: usize,
}

impl TileCache {
    pub fn new(capacity: usize) -> TileCache {
        TileCache {
            slots: (0..capacity.max(1)).map(|_| Tile::default()).collect(),
            lookup: HashMap::new(),
            next: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Slot of the tile at `origin` and whether it was cached already
    ///
    /// On a miss the next slot in turn is emptied and assigned to `origin`.
    pub fn claim(&mut self, origin: (i32, i32)) -> (usize, bool) {
        if let Some(&slot) = self.lookup.get(&origin) {
            return (slot, true);
        }

        let slot = self.next;
        self.next = (self.next + 1) % self.slots.len();

        let tile = &mut self.slots[slot];
        if let Some(evicted) = tile.origin.take() {
            debug!(slot, ?evicted, "evicting tile");
            self.lookup.remove(&evicted);
        }
        tile.origin = Some(origin);
        tile.clear();
        self.lookup.insert(origin, slot);

        (slot, false)
    }

    pub fn tile(&self, slot: usize) -> &Tile {
        &self.slots[slot]
    }

    pub fn tile_mut(&mut self, slot: usize) -> &mut Tile {
        &mut self.slots[slot]
    }
}
