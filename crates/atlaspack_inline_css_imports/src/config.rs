use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use serde::Deserializer;

static DEFAULT_TEST: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"\.css$").expect("default stylesheet pattern is valid"));

pub type ImportPredicate = Arc<dyn Fn(&Path) -> bool + Send + Sync>;

/// Decides whether a resolved import path is a stylesheet
#[derive(Clone)]
pub enum ImportTest {
  Pattern(Regex),
  Predicate(ImportPredicate),
}

impl ImportTest {
  pub fn predicate(predicate: impl Fn(&Path) -> bool + Send + Sync + 'static) -> Self {
    ImportTest::Predicate(Arc::new(predicate))
  }

  pub fn matches(&self, path: &Path) -> bool {
    match self {
      ImportTest::Pattern(pattern) => pattern.is_match(&path.to_string_lossy()),
      ImportTest::Predicate(predicate) => predicate(path),
    }
  }
}

impl Default for ImportTest {
  fn default() -> Self {
    ImportTest::Pattern(DEFAULT_TEST.clone())
  }
}

impl fmt::Debug for ImportTest {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ImportTest::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.as_str()).finish(),
      ImportTest::Predicate(_) => f.write_str("Predicate(..)"),
    }
  }
}

impl<'de> Deserialize<'de> for ImportTest {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let pattern = String::deserialize(deserializer)?;
    Regex::new(&pattern)
      .map(ImportTest::Pattern)
      .map_err(serde::de::Error::custom)
  }
}

/// The `[tagLocalName, tagModuleName]` pair, e.g. `["css", "lit"]`
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "(String, String)")]
pub struct TaggedOutput {
  pub local_name: String,
  pub module_name: String,
}

impl From<(String, String)> for TaggedOutput {
  fn from((local_name, module_name): (String, String)) -> Self {
    TaggedOutput {
      local_name,
      module_name,
    }
  }
}

/// Whether fetched stylesheet content goes through the processing pipeline
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(from = "ProcessContentConfig")]
pub enum ProcessContent {
  #[default]
  Disabled,
  /// Process with configuration found from the working directory
  Enabled,
  /// Process with configuration loaded from this file
  ConfigFile(PathBuf),
}

impl ProcessContent {
  pub fn is_enabled(&self) -> bool {
    !matches!(self, ProcessContent::Disabled)
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ProcessContentConfig {
  Toggle(bool),
  ConfigFile(PathBuf),
}

impl From<ProcessContentConfig> for ProcessContent {
  fn from(config: ProcessContentConfig) -> Self {
    match config {
      ProcessContentConfig::Toggle(false) => ProcessContent::Disabled,
      ProcessContentConfig::Toggle(true) => ProcessContent::Enabled,
      ProcessContentConfig::ConfigFile(path) if path.as_os_str().is_empty() => {
        ProcessContent::Disabled
      }
      ProcessContentConfig::ConfigFile(path) => ProcessContent::ConfigFile(path),
    }
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
  One(String),
  Many(Vec<String>),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
  Ok(match Option::<OneOrMany>::deserialize(deserializer)? {
    None => Vec::new(),
    Some(OneOrMany::One(pattern)) => vec![pattern],
    Some(OneOrMany::Many(patterns)) => patterns,
  })
}

/// Plugin options. Missing keys take their defaults.
///
/// ```json
/// {
///   "test": "\\.css$",
///   "processContent": true,
///   "tagged": ["css", "lit"],
///   "externalDependencies": ["src/theme/*.css"],
///   "baseClass": "LitElement"
/// }
/// ```
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InlineCssImportsConfig {
  pub test: ImportTest,
  pub process_content: ProcessContent,
  pub tagged: Option<TaggedOutput>,
  #[serde(deserialize_with = "one_or_many")]
  pub external_dependencies: Vec<String>,
  /// Superclass name of the classes whose static `styles` receive inlined content
  pub base_class: String,
}

impl Default for InlineCssImportsConfig {
  fn default() -> Self {
    InlineCssImportsConfig {
      test: ImportTest::default(),
      process_content: ProcessContent::Disabled,
      tagged: None,
      external_dependencies: Vec::new(),
      base_class: String::from("LitElement"),
    }
  }
}
