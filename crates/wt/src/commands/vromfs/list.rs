use clap::Args;
use miette::{miette, Context, IntoDiagnostic, Result};
use owo_colors::{OwoColorize, Stream::Stdout};
use std::{fs::File, path::PathBuf};
use tracing::{error, info};
use wt_vromfs::VromfsArchive;

#[derive(Args)]
pub struct ListArgs {
    /// An input VROMFS file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Only list BLK files
    #[arg(long, default_value_t = false)]
    blk: bool,

    /// Decode every BLK file and report the ones that fail
    #[arg(long, default_value_t = false)]
    check: bool,
}

fn check(vromfs: &VromfsArchive) -> Result<()> {
    #[cfg(feature = "parallel")]
    let results = vromfs.par_decode_blk_files();
    #[cfg(not(feature = "parallel"))]
    let results = vromfs.blk_files().collect::<Vec<_>>();

    let total = results.len();
    let mut failed = 0;
    for (name, result) in results {
        if let Err(e) = result {
            failed += 1;
            error!("{name}: {e}");
        }
    }

    info!("decoded {} of {total} blk files", total - failed);
    if failed > 0 {
        return Err(miette!("{failed} blk files failed to decode"));
    }
    Ok(())
}

impl ListArgs {
    pub fn handle(&self) -> Result<()> {
        let f = File::open(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?;
        let vromfs = VromfsArchive::new(f)?;

        let header = vromfs.header();
        println!(
            "{} {:?} {} ({} files)",
            self.file.display().if_supports_color(Stdout, |t| t.bold()),
            header.vromfs_type,
            header.platform_name(),
            vromfs.len()
        );
        if let Some(ext) = vromfs.ext_header() {
            println!("version {}", ext.version_string());
        }

        for file in vromfs.files().filter(|f| !self.blk || f.is_blk()) {
            println!(
                "{:>10} {}",
                file.size().if_supports_color(Stdout, |t| t.green()),
                file.name()
            );
        }

        if let Some(total) = vromfs.decompressed_size() {
            println!("{:>10} total", total);
        }

        if self.check {
            check(&vromfs)?;
        }
        Ok(())
    }
}
