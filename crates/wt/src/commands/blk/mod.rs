pub mod dump;

#[derive(clap::Subcommand)]
pub enum BlkCommands {
    /// Print the contents of a BLK file
    Dump(dump::DumpArgs),
}

impl BlkCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            BlkCommands::Dump(dump) => dump.handle(),
        }
    }
}
