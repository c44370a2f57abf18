pub mod archive;
pub mod terrain;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle BA2 and BSA archives
    Archive {
        #[command(subcommand)]
        command: archive::ArchiveCommands,
    },
    /// Handle BTD terrain files
    Terrain {
        #[command(subcommand)]
        command: terrain::TerrainCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Archive { command } => command.handle(),
            Commands::Terrain { command } => command.handle(),
        }
    }
}
