//! Engine module: CLI front end and path helpers

pub mod arg_parser;
pub mod cli;
pub mod progress;
pub mod tools;

// Re-export commonly used functions
pub use arg_parser::Cli;
pub use cli::handle_run;
pub use tools::{
    expand_tilde, normalize_lexically, path_relative_to, path_to_display_string, resolve_line,
    resolve_root,
};
