//! Settings discovery and precedence.

use std::path::{Path, PathBuf};

use super::settings::DEFAULT_DATABASE_FILENAME;
use super::{Config, Settings};
use crate::repository::util::validate_database_url;

/// Options for loading settings.
#[derive(Debug, Clone, Default)]
pub struct LoadOptions {
    /// Explicit config file path (overrides auto-discovery).
    pub config_path: Option<PathBuf>,
    /// Use CWD for relative paths instead of config file directory.
    pub use_cwd: bool,
    /// Data directory or database file (--data flag).
    /// Can be a directory containing espj.db or a .db file directly.
    pub data: Option<PathBuf>,
}

fn current_dir() -> PathBuf {
    std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
}

fn absolutize(path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        current_dir().join(path)
    }
}

fn is_db_file(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext == "db" || ext == "sqlite" || ext == "sqlite3")
        || path.is_file()
}

/// Split a --data path into (data dir, database filename).
fn resolve_data_path(path: &Path) -> (PathBuf, String) {
    let path = absolutize(path);
    if is_db_file(&path) {
        let filename = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(DEFAULT_DATABASE_FILENAME)
            .to_string();
        let dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();
        (dir, filename)
    } else {
        (path, DEFAULT_DATABASE_FILENAME.to_string())
    }
}

/// Look for a config file inside the data directory.
fn find_config_in_data_dir(data_dir: &Path) -> Option<PathBuf> {
    let extensions = ["json", "yaml", "yml", "toml"];
    let basenames = ["espj", "config"];

    for basename in basenames {
        for ext in extensions {
            let path = data_dir.join(format!("{}.{}", basename, ext));
            if path.exists() {
                return Some(path);
            }
        }
    }
    None
}

async fn load_file_config(options: &LoadOptions, data_dir: Option<&Path>) -> Config {
    // Priority 1: Explicit --config flag
    if let Some(ref config_path) = options.config_path {
        return Config::load_from_path(config_path)
            .await
            .unwrap_or_else(|e| {
                tracing::warn!("{}", e);
                Config::default()
            });
    }

    // Priority 2: Config inside the data dir
    if let Some(data_dir) = data_dir {
        if let Some(config_path) = find_config_in_data_dir(data_dir) {
            tracing::debug!("Found config in data dir: {}", config_path.display());
            return Config::load_from_path(&config_path)
                .await
                .unwrap_or_else(|e| {
                    tracing::warn!("{}", e);
                    Config::default()
                });
        }
    }

    // Priority 3: Auto-discover via prefer
    Config::load().await
}

/// Load settings with explicit options.
/// Returns (Settings, Config) tuple.
///
/// Precedence, lowest first: defaults, config file, `--data`, `DATABASE_URL`.
pub async fn load_settings_with_options(options: LoadOptions) -> (Settings, Config) {
    let resolved = options.data.as_deref().map(resolve_data_path);
    let config = load_file_config(&options, resolved.as_ref().map(|(dir, _)| dir.as_path())).await;

    let base_dir = if options.use_cwd {
        current_dir()
    } else {
        config.base_dir().unwrap_or_else(current_dir)
    };

    let mut settings = Settings::default();
    config.apply_to_settings(&mut settings, &base_dir);

    if let Some((data_dir, database_filename)) = resolved {
        settings.set_data_dir(data_dir);
        settings.database_filename = database_filename;
        if let Some(ref files_dir) = config.files_dir {
            settings.files_dir = config.resolve_path(files_dir, &base_dir);
        }
    }

    // DATABASE_URL environment variable takes highest precedence
    if let Some(database_url) = std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
        match validate_database_url(&database_url) {
            Ok(()) => {
                tracing::debug!("Using DATABASE_URL from environment: {}", database_url);
                settings.database_url = Some(database_url);
            }
            Err(e) => tracing::warn!("Ignoring DATABASE_URL: {}", e),
        }
    }

    (settings, config)
}
