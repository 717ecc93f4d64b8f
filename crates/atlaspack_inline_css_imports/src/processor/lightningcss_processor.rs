use std::path::Path;
use std::path::PathBuf;

use anyhow::anyhow;
use anyhow::Context;
use async_trait::async_trait;
use atlaspack_filesystem::search::find_ancestor_file;
use atlaspack_filesystem::FileSystemRef;
use lightningcss::printer::PrinterOptions;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};

use super::{ContentProcessor, ProcessorConfig};

/// Key of the processor options inside `package.json`
pub const PACKAGE_CONFIG_KEY: &str = "@atlaspack/inline-css-imports";

/// Parses, lowers and prints stylesheets with lightningcss
#[derive(Debug)]
pub struct LightningCssProcessor {
  fs: FileSystemRef,
  config_path: Option<PathBuf>,
}

impl LightningCssProcessor {
  /// Options are read from `config_path` when given, otherwise from the nearest `package.json`
  pub fn new(fs: FileSystemRef, config_path: Option<PathBuf>) -> Self {
    Self { fs, config_path }
  }

  fn read_config_file(&self, path: &Path) -> anyhow::Result<ProcessorConfig> {
    let path = if path.is_absolute() {
      path.to_path_buf()
    } else {
      self.fs.cwd()?.join(path)
    };

    let raw = self
      .fs
      .read_to_string(&path)
      .with_context(|| format!("Failed to read stylesheet processor config {}", path.display()))?;

    serde_json::from_str(&raw)
      .with_context(|| format!("Invalid stylesheet processor config {}", path.display()))
  }

  fn read_package_config(&self) -> anyhow::Result<ProcessorConfig> {
    let cwd = self.fs.cwd()?;
    let root = cwd.ancestors().last().unwrap_or(cwd.as_path()).to_path_buf();

    let Some(package_path) = find_ancestor_file(&*self.fs, &["package.json"], cwd, root) else {
      return Ok(ProcessorConfig::default());
    };

    let package_json: serde_json::Value = serde_json::from_str(&self.fs.read_to_string(&package_path)?)
      .with_context(|| format!("Invalid {}", package_path.display()))?;

    match package_json.get(PACKAGE_CONFIG_KEY) {
      None => Ok(ProcessorConfig::default()),
      Some(config) => serde_json::from_value(config.clone()).with_context(|| {
        format!(
          "Invalid \"{}\" key in {}",
          PACKAGE_CONFIG_KEY,
          package_path.display()
        )
      }),
    }
  }
}

#[async_trait]
impl ContentProcessor for LightningCssProcessor {
  async fn load_config(&self) -> anyhow::Result<ProcessorConfig> {
    let config = match &self.config_path {
      Some(path) => self.read_config_file(path)?,
      None => self.read_package_config()?,
    };

    tracing::debug!(?config, "Loaded stylesheet processor config");
    Ok(config)
  }

  #[tracing::instrument(level = "debug", skip_all, fields(from = %from.display()))]
  async fn process(
    &self,
    config: &ProcessorConfig,
    input: String,
    from: &Path,
  ) -> anyhow::Result<String> {
    let mut stylesheet = StyleSheet::parse(
      &input,
      ParserOptions {
        filename: from.to_string_lossy().into_owned(),
        error_recovery: false,
        ..Default::default()
      },
    )
    .map_err(|error| anyhow!("Failed to parse CSS {}: {}", from.display(), error))?;

    let browsers = match &config.browsers {
      Some(queries) => Browsers::from_browserslist(queries.clone())?,
      None => None,
    };

    let targets = Targets {
      browsers,
      ..Default::default()
    };

    stylesheet.minify(MinifyOptions {
      targets,
      ..Default::default()
    })?;

    let css = stylesheet.to_css(PrinterOptions {
      minify: config.minify,
      targets,
      ..Default::default()
    })?;

    Ok(css.code)
  }
}
