//! Locating and loading `kestrel.toml`.

use std::path::{Path, PathBuf};

use kestrel_config::{ConfigError, LowerOptions};

pub const CONFIG_FILE: &str = "kestrel.toml";

/// Search upward from `start` for a directory holding `kestrel.toml`.
///
/// Returns the directory, not the file.
pub fn find_config_root(start: &Path) -> Option<PathBuf> {
  let mut current = if start.is_file() {
    start.parent()?.to_path_buf()
  } else {
    start.to_path_buf()
  };

  loop {
    if current.join(CONFIG_FILE).is_file() {
      return Some(current);
    }

    if !current.pop() {
      return None;
    }
  }
}

/// Options from the nearest `kestrel.toml` above `start`, or the defaults
/// when there is none.
pub fn load_options(start: &Path) -> Result<LowerOptions, ConfigError> {
  match find_config_root(start) {
    Some(root) => LowerOptions::load(root.join(CONFIG_FILE)),
    None => Ok(LowerOptions::default()),
  }
}
