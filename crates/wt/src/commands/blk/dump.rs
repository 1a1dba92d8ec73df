use clap::{Args, ValueEnum};
use miette::{miette, Context, IntoDiagnostic, Result};
use std::{fs::File, path::PathBuf};
use tracing::{debug, info};
use wt_blk::Blk;
use wt_vromfs::VromfsArchive;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Format {
    /// One `name:type=value` line per parameter
    #[default]
    Text,
    /// Ordered JSON object, repeated names become arrays
    Json,
}

#[derive(Args)]
pub struct DumpArgs {
    /// A BLK file, or the name of a file inside the archive given with `--vromfs`
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// Read the file from this VROMFS archive, using its shared name map and dictionary
    #[arg(long, value_name = "ARCHIVE")]
    vromfs: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t)]
    format: Format,
}

impl DumpArgs {
    fn decode(&self) -> Result<Blk> {
        let Some(archive) = &self.vromfs else {
            let data = std::fs::read(&self.file)
                .into_diagnostic()
                .context(format!("path: {}", &self.file.display()))?;
            let name = self.file.display().to_string();
            return Blk::decode(&name, &data, None)
                .context(format!("decoding {}", self.file.display()));
        };

        let f = File::open(archive)
            .into_diagnostic()
            .context(format!("path: {}", archive.display()))?;
        let vromfs = VromfsArchive::new(f)?;
        info!("read {} files from {}", vromfs.len(), archive.display());

        let name = self
            .file
            .to_str()
            .ok_or(miette!("unable to convert {} to a string", self.file.display()))?;
        vromfs
            .decode_blk(name)
            .context(format!("decoding {name}"))
    }

    pub fn handle(&self) -> Result<()> {
        let blk = self.decode()?;
        debug!(packing = ?blk.packing(), blocks = blk.block_count());

        match self.format {
            Format::Text => print!("{}", blk.to_text()),
            Format::Json => println!("{}", serde_json::to_string_pretty(&blk).into_diagnostic()?),
        }
        Ok(())
    }
}
