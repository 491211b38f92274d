//! file-external: stream an external file-search command's output as classified, batched entries.

pub mod engine;
pub mod gather;
pub mod pipeline;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

pub use gather::{GatherStream, gather};
pub use pipeline::CancellationToken;

use log::debug;
use std::path::Path;

/// Result alias used by public file-external API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: run `params.cmd` in `root` and stream its output as batches.
///
/// `root` may be empty (current directory), start with `~`, or be relative; it is resolved
/// with [`resolve_root`](crate::engine::tools::resolve_root) first. An empty command yields
/// a stream that closes without any batch.
///
/// ```ignore
/// let params = SearchParams { cmd: vec!["fd".into(), "--type".into(), "f".into()], ..Default::default() };
/// let stream = file_external::file_external(Path::new("~/src"), &params)?;
/// for batch in stream.iter() {
///     for entry in &batch { println!("{}", entry.word); }
/// }
/// ```
pub fn file_external(root: &Path, params: &SearchParams) -> Result<GatherStream> {
    let root = engine::tools::resolve_root(&root.to_string_lossy())?;
    let request = SearchRequest::new(root, params.clone());
    debug!(
        "{} REQUEST:{:#?}",
        env!("CARGO_PKG_NAME").to_string().to_uppercase(),
        request
    );
    Ok(gather(request))
}
