use std::path::{Path, PathBuf};

use crate::config::Config;
use crate::error::{Result, SyncError};

const ROOT_DIR_NAME: &str = ".skillsync";

pub struct AppContext {
    pub root: PathBuf,
    pub config: Config,
    pub robot_mode: bool,
    pub quiet: bool,
}

impl AppContext {
    pub fn from_cli(cli: &crate::cli::Cli) -> Result<Self> {
        let root = Self::find_root()?;
        let config = Config::load(cli.config.as_deref(), &root)?;

        Ok(Self {
            root,
            config,
            robot_mode: cli.robot,
            quiet: cli.quiet,
        })
    }

    /// `SKILLSYNC_ROOT`, else the nearest `.skillsync/` above the working
    /// directory, else `<data dir>/skillsync`.
    fn find_root() -> Result<PathBuf> {
        if let Ok(root) = std::env::var("SKILLSYNC_ROOT") {
            return Ok(PathBuf::from(root));
        }
        let cwd = std::env::current_dir()?;
        if let Some(found) = find_upwards(&cwd, ROOT_DIR_NAME) {
            return Ok(found);
        }

        let data_dir = dirs::data_dir()
            .ok_or_else(|| SyncError::MissingConfig("data directory not found".to_string()))?;
        Ok(data_dir.join("skillsync"))
    }
}

fn find_upwards(start: &Path, name: &str) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(name))
        .find(|candidate| candidate.is_dir())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_nearest_marker_directory() {
        let dir = tempfile::tempdir().unwrap();
        let marker = dir.path().join(ROOT_DIR_NAME);
        let nested = dir.path().join("a/b/c");
        std::fs::create_dir_all(&marker).unwrap();
        std::fs::create_dir_all(&nested).unwrap();

        assert_eq!(find_upwards(&nested, ROOT_DIR_NAME), Some(marker));
    }

    #[test]
    fn missing_marker_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(find_upwards(dir.path(), "definitely-not-here-xyz"), None);
    }
}
