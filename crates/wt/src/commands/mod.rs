pub mod blk;
pub mod vromfs;

#[derive(clap::Subcommand)]
pub enum Commands {
    /// Handle VROMFS archives
    Vromfs {
        #[command(subcommand)]
        command: vromfs::VromfsCommands,
    },
    /// Handle BLK files
    Blk {
        #[command(subcommand)]
        command: blk::BlkCommands,
    },
}

impl Commands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            Commands::Vromfs { command } => command.handle(),
            Commands::Blk { command } => command.handle(),
        }
    }
}
