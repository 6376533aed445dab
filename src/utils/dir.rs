use std::{env, io, path::PathBuf};

use anyhow::Result;

/// State directory for config, logs and entries. `%APPDATA%\tabwatch` on
/// Windows, `$XDG_STATE_HOME/tabwatch` (or `~/.local/state/tabwatch`)
/// elsewhere.
pub fn create_application_default_path() -> Result<PathBuf> {
    #[cfg(windows)]
    let base =
        PathBuf::from(env::var("APPDATA").expect("APPDATA should be present on Windows"));
    #[cfg(not(windows))]
    let base = env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .or_else(|_| env::var("HOME").map(|home| PathBuf::from(home).join(".local/state")))
        .expect("Couldn't find neither XDG_STATE_HOME nor HOME");

    let path = base.join("tabwatch");
    match std::fs::create_dir_all(&path) {
        Ok(_) => Ok(path),
        Err(v) if v.kind() == io::ErrorKind::AlreadyExists => Ok(path),
        Err(v) => Err(v.into()),
    }
}
