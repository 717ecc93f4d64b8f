use std::path::Path;
use std::sync::Arc;

use atlaspack_filesystem::FileSystemRef;
use once_cell::sync::OnceCell;

use crate::config::ProcessContent;
use crate::processor::{shared_bridge, ProcessorBridge};
use crate::InlineCssError;

/// Reads stylesheets and optionally runs them through the processing pipeline
#[derive(Debug)]
pub struct ContentFetcher {
  fs: FileSystemRef,
  process_content: ProcessContent,
  bridge: OnceCell<Arc<ProcessorBridge>>,
}

impl ContentFetcher {
  pub fn new(fs: FileSystemRef, process_content: ProcessContent) -> Self {
    Self {
      fs,
      process_content,
      bridge: OnceCell::new(),
    }
  }

  /// A fetcher that processes every file through `bridge`
  pub fn with_bridge(fs: FileSystemRef, bridge: Arc<ProcessorBridge>) -> Self {
    Self {
      fs,
      process_content: ProcessContent::Enabled,
      bridge: OnceCell::with_value(bridge),
    }
  }

  #[tracing::instrument(level = "debug", skip_all, fields(path = %path.display()))]
  pub fn fetch(&self, path: &Path, origin: &Path) -> Result<String, InlineCssError> {
    let content = self
      .fs
      .read_to_string(path)
      .map_err(|source| InlineCssError::Read {
        path: path.to_path_buf(),
        origin: origin.to_path_buf(),
        source,
      })?;

    if !self.process_content.is_enabled() {
      return Ok(content);
    }

    let process_error = |source| InlineCssError::Process {
      path: path.to_path_buf(),
      origin: origin.to_path_buf(),
      source,
    };

    let bridge = self
      .bridge
      .get_or_try_init(|| shared_bridge(&self.process_content, &self.fs))
      .map_err(process_error)?;

    bridge.call(content, path).map_err(process_error)
  }
}
