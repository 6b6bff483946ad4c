//! Runtime configuration
//!
//! Everything is read from the environment; there is no config file.

use std::path::{Path, PathBuf};

/// Environment variable overriding the SQLite database location
pub const DATABASE_PATH_VAR: &str = "PANTRY_DATABASE_PATH";

/// Default log directive, merged with `RUST_LOG`
pub const DEFAULT_LOG_DIRECTIVE: &str = "pantry=info";

/// Get the database path from the environment or fall back to `<project>/data/pantry.db`
pub fn database_path() -> PathBuf {
    std::env::var(DATABASE_PATH_VAR)
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let exe_dir = std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|p| p.to_path_buf()))
                .unwrap_or_else(|| PathBuf::from("."));
            default_database_path(&exe_dir)
        })
}

/// Default database location relative to the directory holding the executable
///
/// Binaries under `target/debug` or `target/release` resolve to the project root.
pub fn default_database_path(exe_dir: &Path) -> PathBuf {
    let mut path = exe_dir.to_path_buf();

    if path.ends_with("release") || path.ends_with("debug") {
        if let Some(project_root) = path.parent().and_then(Path::parent) {
            path = project_root.to_path_buf();
        }
    }

    path.push("data");
    path.push("pantry.db");
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_steps_out_of_target_dir() {
        let path = default_database_path(Path::new("/work/pantry/target/release"));
        assert_eq!(path, PathBuf::from("/work/pantry/data/pantry.db"));
    }

    #[test]
    fn test_installed_binary() {
        let path = default_database_path(Path::new("/opt/pantry/bin"));
        assert_eq!(path, PathBuf::from("/opt/pantry/bin/data/pantry.db"));
    }
}
