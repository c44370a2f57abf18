use bgs_archive::ArchiveReader;
use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use std::{
    fs::File,
    io::Write,
    path::{Component, Path, PathBuf},
};
use tracing::{info, warn};

use super::FilterArgs;

#[derive(Args)]
pub struct ExtractArgs {
    /// Archives, or directories of archives, later ones take precedence
    #[arg(value_name = "PATH", required = true)]
    paths: Vec<PathBuf>,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    #[command(flatten)]
    filter: FilterArgs,

    /// Allow overwriting existing files
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let archives = ArchiveReader::open_all(&self.paths, &self.filter.filter())?;

        let mut buffer = Vec::new();
        for name in archives.file_names() {
            let relative = Path::new(name);
            if !relative.components().all(|c| matches!(c, Component::Normal(_))) {
                warn!("skipping {name}, it would be written outside the target");
                continue;
            }

            let p = self.directory.join(relative);
            info!("writing {}", p.display());

            if let Some(parent) = p.parent() {
                std::fs::create_dir_all(parent)
                    .into_diagnostic()
                    .context(format!("creating {}", parent.display()))?;
            }
            let mut out = if !self.overwrite {
                File::create_new(&p)
                    .into_diagnostic()
                    .context(format!("creating {}", &p.display()))?
            } else {
                File::create(&p)
                    .into_diagnostic()
                    .context(format!("creating {}", &p.display()))?
            };

            archives
                .extract_into(&mut buffer, name)
                .context(format!("extracting {name}"))?;
            out.write_all(&buffer)
                .into_diagnostic()
                .context(format!("writing {}", &p.display()))?;
        }

        Ok(())
    }
}
