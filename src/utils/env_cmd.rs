//! Fallback command from the environment: env var → `.env` in the search root.

use log::debug;
use std::path::Path;

use crate::utils::config::PackagePaths;

fn parse_cmd(raw: &str) -> Option<Vec<String>> {
    let cmd: Vec<String> = raw.split_whitespace().map(str::to_string).collect();
    (!cmd.is_empty()).then_some(cmd)
}

fn read_env_cmd(key: &str) -> Option<Vec<String>> {
    std::env::var(key).ok().and_then(|s| parse_cmd(&s))
}

/// Command from `FILE_EXTERNAL_CMD` (whitespace-separated argv), falling back to a `.env`
/// file in `dir`. No quoting rules: use the config file for arguments containing spaces.
pub fn cmd_from_env(dir: &Path) -> Option<Vec<String>> {
    let key = PackagePaths::get().cmd_env_key();
    if let Some(cmd) = read_env_cmd(key) {
        debug!("Command found in environment ({})", key);
        return Some(cmd);
    }
    let env_path = dir.join(".env");
    if env_path.is_file() {
        let _ = dotenvy::from_path(&env_path);
        if let Some(cmd) = read_env_cmd(key) {
            debug!("Command found in {}", env_path.display());
            return Some(cmd);
        }
    }
    None
}
