//! Data directory resolution.

use std::path::PathBuf;

/// Resolve the data directory from environment or platform defaults.
///
/// Priority:
/// 1. `DOPPEL_DATA_DIR` environment variable
/// 2. `~/.doppel` under the platform home directory
pub fn resolve_data_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("DOPPEL_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if let Some(home) = dirs::home_dir() {
        return home.join(".doppel");
    }

    // Last resort: current directory
    PathBuf::from(".doppel")
}

/// The SQLite database URL inside a data directory.
pub fn database_url(data_dir: &std::path::Path) -> String {
    format!("sqlite://{}/doppel.db", data_dir.display())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_data_dir_ends_with_doppel() {
        // Regardless of which branch resolves, the leaf is the app dir
        // unless DOPPEL_DATA_DIR points elsewhere.
        if std::env::var("DOPPEL_DATA_DIR").is_err() {
            let dir = resolve_data_dir();
            assert!(dir.ends_with(".doppel"));
        }
    }

    #[test]
    fn test_database_url_shape() {
        let url = database_url(std::path::Path::new("/tmp/doppel-test"));
        assert_eq!(url, "sqlite:///tmp/doppel-test/doppel.db");
    }
}
