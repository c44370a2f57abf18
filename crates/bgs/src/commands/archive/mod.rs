use bgs_archive::ArchiveFilter;
use clap::Args;

pub mod extract;
pub mod list;

#[derive(clap::Subcommand)]
pub enum ArchiveCommands {
    /// List the files of one or more archives
    List(list::ListArgs),
    /// Extract the files of one or more archives into a directory
    Extract(extract::ExtractArgs),
}

impl ArchiveCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            ArchiveCommands::List(list) => list.handle(),
            ArchiveCommands::Extract(extract) => extract.handle(),
        }
    }
}

/// Name patterns shared by the archive commands
#[derive(Args)]
pub struct FilterArgs {
    /// Only handle files whose path contains one of these
    #[arg(short, long, value_name = "PATTERN")]
    include: Vec<String>,

    /// Skip files whose path contains one of these
    #[arg(short, long, value_name = "PATTERN")]
    exclude: Vec<String>,
}

impl FilterArgs {
    pub fn filter(&self) -> ArchiveFilter {
        ArchiveFilter::builder()
            .include(self.include.clone())
            .exclude(self.exclude.clone())
            .build()
    }
}
