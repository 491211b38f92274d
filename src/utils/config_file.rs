//! Load `.file-external.toml` from the search root (CLI only). Lib callers pass
//! [`SearchParams`](crate::SearchParams) directly.

use serde::Deserialize;
use std::path::Path;

use crate::Opts;
use crate::utils::config::PackagePaths;

#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    settings: SettingsSection,
}

#[derive(Debug, Default, Deserialize)]
struct SettingsSection {
    cmd: Option<Vec<String>>,
    update_items: Option<usize>,
    first_batch: Option<usize>,
    json: Option<bool>,
    verbose: Option<bool>,
}

/// Parse config text. Errors are logged and treated as "no config".
pub fn parse_config_file(text: &str, origin: &Path) -> Option<ConfigFile> {
    toml::from_str(text)
        .map_err(|e| log::warn!("{}: {}", origin.display(), e))
        .ok()
}

/// Load the config file from `dir` if present. Returns None if missing or unreadable.
pub fn load_config_file(dir: &Path) -> Option<ConfigFile> {
    let path = dir.join(PackagePaths::get().config_filename());
    let s = std::fs::read_to_string(&path).ok()?;
    parse_config_file(&s, &path)
}

/// Overwrite opts field from file when present.
macro_rules! apply_file_opt {
    ($section:expr, $opts:expr, $field:ident) => {
        if let Some(v) = $section.$field.clone() {
            $opts.$field = v;
        }
    };
}

/// Apply file config to opts (only fields present in the file). Call before applying CLI.
pub fn apply_file_to_opts(file: &ConfigFile, opts: &mut Opts) {
    let section = &file.settings;
    apply_file_opt!(section, opts, cmd);
    apply_file_opt!(section, opts, update_items);
    apply_file_opt!(section, opts, first_batch);
    apply_file_opt!(section, opts, json);
    apply_file_opt!(section, opts, verbose);
}
