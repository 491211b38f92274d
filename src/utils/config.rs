//! Application configuration constants.
//! Batch sizes and channel capacities in one place.

use std::sync::OnceLock;

// ---- Package / paths (from CARGO_PKG_NAME, cached) ----

/// Package-derived names: built once from `CARGO_PKG_NAME`, then cached.
pub struct PackagePaths {
    pkg_name: &'static str,
    config_filename: String,
    cmd_env_key: String,
}

static PACKAGE_PATHS: OnceLock<PackagePaths> = OnceLock::new();

impl PackagePaths {
    /// Build and cache names from `CARGO_PKG_NAME`. Called once on first use.
    pub fn get() -> &'static PackagePaths {
        PACKAGE_PATHS.get_or_init(|| {
            let pkg = env!("CARGO_PKG_NAME");
            PackagePaths {
                pkg_name: pkg,
                config_filename: format!(".{pkg}.toml"),
                cmd_env_key: format!("{}_CMD", pkg.replace('-', "_").to_uppercase()),
            }
        })
    }

    pub fn pkg_name(&self) -> &str {
        self.pkg_name
    }

    /// Per-directory config file (e.g. `.file-external.toml`).
    pub fn config_filename(&self) -> &str {
        &self.config_filename
    }

    /// Environment variable holding a fallback command (e.g. `FILE_EXTERNAL_CMD`).
    pub fn cmd_env_key(&self) -> &str {
        &self.cmd_env_key
    }
}

// ---- Batching ----

/// Entries in the first batch. Fixed so the consumer gets something to render quickly.
pub const FIRST_BATCH_SIZE: usize = 1000;

/// Default steady-state batch size once the first batch is out.
pub const DEFAULT_UPDATE_ITEMS: usize = 100_000;

// ---- Channels ----

/// Batches buffered toward the consumer before the emitter blocks.
pub const BATCH_CHANNEL_CAP: usize = 4;

/// Decoded stdout lines buffered between the reader thread and the emitter.
pub const LINE_CHANNEL_CAP: usize = 4096;

/// Stderr lines kept while the command runs; later lines are counted and dropped.
pub const STDERR_LINE_CAP: usize = 1000;
