use bgs_btd::TerrainStore;
use clap::{Args, ValueEnum};
use miette::{miette, Context, IntoDiagnostic, Result};
use std::{
    fs::File,
    io::{BufWriter, Write},
    path::PathBuf,
};
use tracing::info;

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// Vertex heights, u16
    Height,
    /// Land texture opacities, u16
    LandTexture,
    /// Ground cover masks, u8
    GroundCover,
    /// RGB555 vertex colors, u16, LOD 2 to 4
    Color,
    /// 64 texture IDs per cell
    TextureSet,
}

#[derive(Args)]
pub struct DumpArgs {
    /// An input BTD file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target file
    #[arg(short, long, value_name = "FILE")]
    output: PathBuf,

    /// Layer to write
    #[arg(long, value_enum)]
    format: Format,

    /// Level of detail, 0 is full resolution
    #[arg(short, long, default_value_t = 0)]
    lod: u8,

    /// Westmost cell, defaults to the edge of the world
    #[arg(long, allow_hyphen_values = true)]
    x_min: Option<i32>,

    /// Southmost cell, defaults to the edge of the world
    #[arg(long, allow_hyphen_values = true)]
    y_min: Option<i32>,

    /// Eastmost cell, defaults to the edge of the world
    #[arg(long, allow_hyphen_values = true)]
    x_max: Option<i32>,

    /// Northmost cell, defaults to the edge of the world
    #[arg(long, allow_hyphen_values = true)]
    y_max: Option<i32>,

    /// Number of tiles kept decoded
    #[arg(long, value_name = "TILES")]
    cache: Option<usize>,

    /// Number of threads decoding a tile
    #[arg(short, long)]
    workers: Option<usize>,
}

impl DumpArgs {
    pub fn handle(&self) -> Result<()> {
        let mut terrain = TerrainStore::open(&self.file)?;

        let x_min = self.x_min.unwrap_or(terrain.cell_min_x());
        let y_min = self.y_min.unwrap_or(terrain.cell_min_y());
        let x_max = self.x_max.unwrap_or(terrain.cell_max_x());
        let y_max = self.y_max.unwrap_or(terrain.cell_max_y());
        if x_max < x_min || y_max < y_min {
            return Err(miette!(
                "empty cell range ({x_min}, {y_min}) to ({x_max}, {y_max})"
            ));
        }

        terrain.set_cache_capacity(self.cache.unwrap_or(row_capacity(x_min, x_max)));
        if let Some(workers) = self.workers {
            terrain.set_worker_count(workers);
        }

        let file = File::create(&self.output)
            .into_diagnostic()
            .context(format!("creating {}", &self.output.display()))?;
        let mut out = BufWriter::new(file);
        info!(
            "writing {:?} of ({x_min}, {y_min}) to ({x_max}, {y_max}) at LOD {} to {}",
            self.format,
            self.lod,
            self.output.display()
        );

        let cells = Cells {
            min: (x_min, y_min),
            max: (x_max, y_max),
        };
        let out = &mut out;
        match self.format {
            Format::Height => {
                self.write_rows(&mut terrain, out, cells, TerrainStore::cell_height_map)?
            }
            Format::LandTexture => {
                self.write_rows(&mut terrain, out, cells, TerrainStore::cell_land_texture)?
            }
            Format::GroundCover => {
                self.write_rows(&mut terrain, out, cells, TerrainStore::cell_ground_cover)?
            }
            Format::Color => {
                self.write_rows(&mut terrain, out, cells, TerrainStore::cell_terrain_color)?
            }
            Format::TextureSet => {
                let mut ids = [0u8; 64];
                for y in (y_min..=y_max).rev() {
                    for x in x_min..=x_max {
                        terrain.cell_texture_set(&mut ids, x, y)?;
                        out.write_all(&ids).into_diagnostic()?;
                    }
                }
            }
        }

        out.flush()
            .into_diagnostic()
            .context(format!("writing {}", &self.output.display()))?;
        info!("decoded {} blocks", terrain.decoded_block_count());

        Ok(())
    }

    /// Rows from north to south, cells from west to east
    fn write_rows<T: Sample>(
        &self,
        terrain: &mut TerrainStore,
        out: &mut impl Write,
        cells: Cells,
        read: impl Fn(&mut TerrainStore, &mut [T], i32, i32, u8) -> bgs_btd::error::Result<()>,
    ) -> Result<()> {
        let n = 128usize >> self.lod.min(7);
        let mut samples = vec![T::default(); n * n];
        for y in (cells.min.1..=cells.max.1).rev() {
            let mut rows: Vec<Vec<u8>> = vec![Vec::new(); n];
            for x in cells.min.0..=cells.max.0 {
                read(terrain, &mut samples, x, y, self.lod)?;
                for (row, line) in rows.iter_mut().zip(samples.chunks_exact(n)) {
                    for sample in line {
                        sample.write_le(row);
                    }
                }
            }

            for row in rows.iter().rev() {
                out.write_all(row).into_diagnostic()?;
            }
        }
        Ok(())
    }
}

/// Tiles kept decoded while writing cells `x_min..=x_max` row by row: one row of tiles plus
/// the tile the next row starts in.
fn row_capacity(x_min: i32, x_max: i32) -> usize {
    let width = (i64::from(x_max) - i64::from(x_min) + 1).max(0) as usize;
    width.div_ceil(8) + 1
}

/// Rectangle of cells, both corners included
#[derive(Debug, Copy, Clone)]
struct Cells {
    min: (i32, i32),
    max: (i32, i32),
}

trait Sample: Copy + Default {
    fn write_le(self, out: &mut Vec<u8>);
}

impl Sample for u8 {
    fn write_le(self, out: &mut Vec<u8>) {
        out.push(self);
    }
}

impl Sample for u16 {
    fn write_le(self, out: &mut Vec<u8>) {
        out.extend_from_slice(&self.to_le_bytes());
    }
}
