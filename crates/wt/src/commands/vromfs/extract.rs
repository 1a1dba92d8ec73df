use clap::Args;
use miette::{Context, IntoDiagnostic, Result};
use std::{
    fs::File,
    io::Write,
    path::{Component, Path, PathBuf},
};
use tracing::{info, warn};
use wt_vromfs::VromfsArchive;

#[derive(Args)]
pub struct ExtractArgs {
    /// An input VROMFS file
    #[arg(short, long, value_name = "FILE")]
    file: PathBuf,

    /// A target directory
    #[arg(short, long, value_name = "DIR")]
    directory: PathBuf,

    /// Allow overwriting the target
    #[arg(long, default_value_t = false)]
    overwrite: bool,
}

/// Relative path for an archive entry, `None` if it would leave the target directory
fn enclosed_name(name: &str) -> Option<PathBuf> {
    let mut path = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => path.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    (!path.as_os_str().is_empty()).then_some(path)
}

impl ExtractArgs {
    pub fn handle(&self) -> Result<()> {
        let f = File::open(&self.file)
            .into_diagnostic()
            .context(format!("path: {}", &self.file.display()))?;
        let vromfs = VromfsArchive::new(f)?;

        for file in vromfs.files() {
            let Some(name) = enclosed_name(file.name()) else {
                warn!("skipping unsafe path {}", file.name());
                continue;
            };

            let p = self.directory.join(name);
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

            out.write_all(file.data()).into_diagnostic()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use crate::commands::vromfs::extract::enclosed_name;

    #[test]
    fn enclosed_names() {
        assert_eq!(
            enclosed_name("config/wpcost.blk"),
            Some(PathBuf::from("config").join("wpcost.blk"))
        );
        assert_eq!(enclosed_name("./nm"), Some(PathBuf::from("nm")));
        assert_eq!(enclosed_name("../escape.blk"), None);
        assert_eq!(enclosed_name("config/../../escape.blk"), None);
        assert_eq!(enclosed_name("/etc/shadow"), None);
        assert_eq!(enclosed_name(""), None);
    }
}
