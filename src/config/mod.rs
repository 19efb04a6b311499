pub mod structs;

use crate::{account::AccountTable, error::ConfigError, process::NativeReader};
use std::{fs, path::Path, path::PathBuf};
use structs::Config;

pub fn path() -> Option<PathBuf> { home::home_dir().map(|home| home.join(".procsnap").join("config.toml")) }

/// Reads `~/.procsnap/config.toml`, falling back to defaults when there is no
/// home directory or no config file.
pub fn read() -> Result<Config, ConfigError> {
    match path() {
        Some(path) if path.is_file() => {
            let config = Config::load(&path)?;
            log::info!("loaded config from {}", path.display());
            Ok(config)
        }
        Some(path) => {
            log::debug!("no config at {}, using defaults", path.display());
            Ok(Config::default())
        }
        None => {
            log::debug!("no home directory, using default config");
            Ok(Config::default())
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Account table from the configured passwd file.
    pub fn accounts(&self) -> AccountTable { AccountTable::load(&self.paths.passwd) }

    /// The platform reader, rooted at the configured proc mount where one is used.
    pub fn reader<'a>(&self, accounts: &'a AccountTable) -> NativeReader<'a> {
        #[cfg(all(unix, not(target_os = "macos")))]
        return crate::process::ProcFs::with_root(&self.paths.proc_root, accounts);

        #[cfg(any(target_os = "macos", not(unix)))]
        return NativeReader::new(accounts);
    }
}
