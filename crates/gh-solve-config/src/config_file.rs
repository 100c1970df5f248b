use std::path::{Path, PathBuf};

const CONFIG_FILE: &str = ".gh-solve.toml";

/// Load config file content
///
/// Searches in order:
/// 1. `.gh-solve.toml` in the current working directory
/// 2. `~/.gh-solve.toml`
/// 3. `config.toml` in the platform config directory
///
/// Returns the content of the first file found, None otherwise.
pub fn load_config_file() -> Option<String> {
    config_candidates()
        .iter()
        .find_map(|path| read_config(path))
}

fn config_candidates() -> Vec<PathBuf> {
    let mut candidates = vec![PathBuf::from(CONFIG_FILE)];

    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(CONFIG_FILE));
    }
    if let Ok(global) = crate::paths::app_config_path() {
        candidates.push(global);
    }

    candidates
}

fn read_config(path: &Path) -> Option<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            log::debug!("Loaded config from {}", path.display());
            Some(content)
        }
        Err(_) => None,
    }
}
