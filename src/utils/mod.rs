pub mod config;
pub mod config_file;
pub mod env_cmd;
pub mod logger;

pub use config::*;
pub use config_file::{ConfigFile, apply_file_to_opts, load_config_file, parse_config_file};
pub use env_cmd::cmd_from_env;
pub use logger::setup_logging;
