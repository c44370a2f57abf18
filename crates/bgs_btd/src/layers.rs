//! Decoded layers of a tile

use bitflags::bitflags;

use crate::types::BlockKind;

/// Coarsest level of detail
pub const MAX_LOD: u8 = 4;

/// Finest level of detail that stores terrain color
pub const MIN_COLOR_LOD: u8 = 2;

bitflags! {
    /// Set of layers decoded into a tile
    ///
    /// Each height and color bit stands for the samples added at that LOD only, so a full
    /// resolution layer at LOD `l` needs every bit from `l` to 4.
    #[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
    pub struct LayerMask: u32 {
        const HEIGHT_LOD0 = 1 << 0;
        const HEIGHT_LOD1 = 1 << 1;
        const HEIGHT_LOD2 = 1 << 2;
        const HEIGHT_LOD3 = 1 << 3;
        const HEIGHT_LOD4 = 1 << 4;
        const GROUND_COVER = 1 << 5;
        const COLOR_LOD2 = 1 << 6;
        const COLOR_LOD3 = 1 << 7;
        const COLOR_LOD4 = 1 << 8;
    }
}

impl LayerMask {
    /// Layers needed for height and land texture at `lod`
    pub fn height(lod: u8) -> LayerMask {
        (lod..=MAX_LOD)
            .map(|l| LayerMask::from_bits_retain(LayerMask::HEIGHT_LOD0.bits() << l))
            .collect()
    }

    /// Layers needed for terrain color at `lod`
    pub fn color(lod: u8) -> LayerMask {
        (lod.max(MIN_COLOR_LOD)..=MAX_LOD)
            .map(|l| {
                LayerMask::from_bits_retain(LayerMask::COLOR_LOD2.bits() << (l - MIN_COLOR_LOD))
            })
            .collect()
    }

    /// Layers needed for ground cover at any LOD
    pub fn ground_cover() -> LayerMask {
        LayerMask::GROUND_COVER
    }

    /// The single layers in this mask
    pub(crate) fn layers(self) -> impl Iterator<Item = Layer> {
        Layer::ALL
            .into_iter()
            .filter(move |layer| self.contains(layer.mask()))
    }
}

/// One bit of a [`LayerMask`]: the blocks of one kind at one LOD
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub(crate) struct Layer {
    pub kind: BlockKind,
    pub lod: u8,
}

impl Layer {
    pub const ALL: [Layer; 9] = [
        Layer::new(BlockKind::Height, 0),
        Layer::new(BlockKind::Height, 1),
        Layer::new(BlockKind::Height, 2),
        Layer::new(BlockKind::Height, 3),
        Layer::new(BlockKind::Height, 4),
        Layer::new(BlockKind::GroundCover, 0),
        Layer::new(BlockKind::Color, 2),
        Layer::new(BlockKind::Color, 3),
        Layer::new(BlockKind::Color, 4),
    ];

    const fn new(kind: BlockKind, lod: u8) -> Layer {
        Layer { kind, lod }
    }

    pub fn mask(&self) -> LayerMask {
        match self.kind {
            BlockKind::Height => LayerMask::from_bits_retain(1 << self.lod),
            BlockKind::GroundCover => LayerMask::GROUND_COVER,
            BlockKind::Color => {
                LayerMask::from_bits_retain(LayerMask::COLOR_LOD2.bits() << (self.lod - 2))
            }
        }
    }

    /// Samples per row of a cell
    pub fn row_samples(&self) -> usize {
        128 >> self.lod
    }

    /// Whether a sample is already stored by the next coarser LOD
    pub fn inherits(&self, i: usize, j: usize) -> bool {
        self.kind != BlockKind::GroundCover && self.lod < MAX_LOD && i % 2 == 0 && j % 2 == 0
    }

    /// Size of a decompressed block, including the two byte cell position
    pub fn payload_size(&self) -> usize {
        let n = self.row_samples();
        let samples = if self.kind == BlockKind::GroundCover || self.lod == MAX_LOD {
            n * n
        } else {
            n * n - (n / 2) * (n / 2)
        };
        let sample_size = match self.kind {
            BlockKind::Height => 4,
            BlockKind::GroundCover => 1,
            BlockKind::Color => 2,
        };
        2 + samples * sample_size
    }
}
