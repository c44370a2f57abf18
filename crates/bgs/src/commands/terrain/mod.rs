pub mod dump;
pub mod info;

#[derive(clap::Subcommand)]
pub enum TerrainCommands {
    /// Print the header of a BTD file
    Info(info::InfoArgs),
    /// Write one layer of a BTD file as raw little-endian samples
    Dump(dump::DumpArgs),
}

impl TerrainCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            TerrainCommands::Info(info) => info.handle(),
            TerrainCommands::Dump(dump) => dump.handle(),
        }
    }
}
