pub mod extract;
pub mod list;

#[derive(clap::Subcommand)]
pub enum VromfsCommands {
    /// List the files of a VROMFS archive
    List(list::ListArgs),
    /// Extract a VROMFS archive into a directory
    Extract(extract::ExtractArgs),
}

impl VromfsCommands {
    pub fn handle(&self) -> miette::Result<()> {
        match self {
            VromfsCommands::List(list) => list.handle(),
            VromfsCommands::Extract(extract) => extract.handle(),
        }
    }
}
