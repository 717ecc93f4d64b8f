use std::path::PathBuf;
use std::sync::Arc;

use atlaspack_filesystem::os_file_system::OsFileSystem;
use atlaspack_inline_css_imports::{
  transform, InlineCssImportsConfig, InlineCssImportsContext, TracingDependencyTracker,
};
use swc_core::common::errors::HANDLER;
use swc_core::ecma::ast::Program;
use swc_core::plugin::metadata::TransformPluginMetadataContextKind;
use swc_core::plugin::{plugin_transform, proxies::TransformPluginProgramMetadata};

/// Parse the plugin configuration.
///
/// Stylesheet processing needs a worker thread, which the plugin sandbox does not provide.
fn plugin_config(config: Option<&str>) -> Result<InlineCssImportsConfig, String> {
  let config = match config {
    Some(config) => serde_json::from_str::<InlineCssImportsConfig>(config)
      .map_err(|error| format!("Invalid inline CSS imports configuration: {error}"))?,
    None => InlineCssImportsConfig::default(),
  };

  if config.process_content.is_enabled() {
    return Err(String::from(
      "processContent is not supported by the SWC plugin, remove it to inline stylesheets unprocessed",
    ));
  }

  Ok(config)
}

#[plugin_transform]
pub fn process_transform(
  mut program: Program,
  metadata: TransformPluginProgramMetadata,
) -> Program {
  let config = match plugin_config(metadata.get_transform_plugin_config().as_deref()) {
    Ok(config) => config,
    Err(message) => {
      HANDLER.with(|handler| handler.err(&message));
      return program;
    }
  };

  let Program::Module(module) = &mut program else {
    // Scripts cannot contain import declarations
    return program;
  };

  let filename = metadata
    .get_context(&TransformPluginMetadataContextKind::Filename)
    .map(PathBuf::from)
    .unwrap_or_default();

  let context = InlineCssImportsContext {
    filename,
    file_system: Arc::new(OsFileSystem),
    dependency_tracker: Arc::new(TracingDependencyTracker),
  };

  if let Err(error) = transform(module, Arc::new(config), context) {
    HANDLER.with(|handler| handler.err(&error.to_string()));
  }

  program
}
