use std::collections::HashMap;
use std::fmt::Debug;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use atlaspack_filesystem::FileSystemRef;
use once_cell::sync::Lazy;
use parking_lot::Mutex;
use serde::Deserialize;

use crate::config::ProcessContent;

pub use self::bridge::ProcessorBridge;
pub use self::lightningcss_processor::LightningCssProcessor;
pub use self::lightningcss_processor::PACKAGE_CONFIG_KEY;

mod bridge;
mod lightningcss_processor;

/// Options of the content processing pipeline
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProcessorConfig {
  pub minify: bool,
  /// Browserslist queries used for lowering and vendor prefixing
  pub browsers: Option<Vec<String>>,
}

/// A pipeline that transforms stylesheet text before it is inlined
#[async_trait]
pub trait ContentProcessor: Debug + Send + Sync {
  /// Called once per processor. The result is reused for every `process` call.
  async fn load_config(&self) -> anyhow::Result<ProcessorConfig>;

  async fn process(
    &self,
    config: &ProcessorConfig,
    input: String,
    from: &Path,
  ) -> anyhow::Result<String>;
}

static SHARED_BRIDGES: Lazy<Mutex<HashMap<ProcessContent, Arc<ProcessorBridge>>>> =
  Lazy::new(Default::default);

/// The process-wide bridge for `process_content`, started on first use.
///
/// Bridges are never stopped. The file system of the first caller is the one the processor uses
/// to load its configuration.
pub fn shared_bridge(
  process_content: &ProcessContent,
  fs: &FileSystemRef,
) -> anyhow::Result<Arc<ProcessorBridge>> {
  let mut bridges = SHARED_BRIDGES.lock();
  if let Some(bridge) = bridges.get(process_content) {
    return Ok(bridge.clone());
  }

  let config_path = match process_content {
    ProcessContent::ConfigFile(path) => Some(path.clone()),
    _ => None,
  };

  let processor = LightningCssProcessor::new(fs.clone(), config_path);
  let bridge = Arc::new(ProcessorBridge::spawn(Arc::new(processor))?);
  tracing::info!(?process_content, "Started stylesheet processor");

  bridges.insert(process_content.clone(), bridge.clone());
  Ok(bridge)
}
