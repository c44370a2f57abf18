use bgs_archive::ArchiveReader;
use clap::Args;
use miette::Result;
use std::path::PathBuf;
use tracing::info;

use super::FilterArgs;

#[derive(Args)]
pub struct ListArgs {
    /// Archives, or directories of archives, later ones take precedence
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,

    #[command(flatten)]
    filter: FilterArgs,
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let archives = ArchiveReader::open_all(&self.paths, &self.filter.filter())?;
        info!(
            "{} files in {} archives",
            archives.len(),
            archives.archive_count()
        );

        for name in archives.file_names() {
            println!("{:>12} {}", archives.file_size(name)?, name);
        }

        Ok(())
    }
}
