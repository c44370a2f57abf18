use bgs_btd::TerrainStore;
use clap::Args;
use miette::Result;
use std::path::PathBuf;

#[derive(Args)]
pub struct InfoArgs {
    /// An input BTD file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,
}

impl InfoArgs {
    pub fn handle(&self) -> Result<()> {
        let terrain = TerrainStore::open(&self.file)?;

        println!(
            "cells: ({}, {}) to ({}, {})",
            terrain.cell_min_x(),
            terrain.cell_min_y(),
            terrain.cell_max_x(),
            terrain.cell_max_y()
        );
        println!(
            "height: {} to {}",
            terrain.min_height(),
            terrain.max_height()
        );

        println!("land textures: {}", terrain.land_texture_count());
        for n in 0..terrain.land_texture_count() {
            println!("  {n:3}: {:08X}", terrain.land_texture(n)?);
        }
        println!("ground covers: {}", terrain.ground_cover_count());
        for n in 0..terrain.ground_cover_count() {
            println!("  {n:3}: {:08X}", terrain.ground_cover(n)?);
        }

        Ok(())
    }
}
