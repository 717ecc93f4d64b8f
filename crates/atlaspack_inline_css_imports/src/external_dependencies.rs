use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

use atlaspack_filesystem::FileSystemRef;
use indexmap::IndexSet;
use parking_lot::Mutex;

use crate::InlineCssError;

/// Evaluates to the value a cached output depends on. A change in value invalidates the cache.
pub type InvalidationKey = Arc<dyn Fn() -> Option<SystemTime> + Send + Sync>;

/// Host hooks used to make files that are not imported invalidate the compiled module
pub trait DependencyTracker: Send + Sync {
  fn add_external_dependency(&self, path: &Path);

  fn invalidate_on(&self, key: InvalidationKey);
}

/// Logs registrations, for hosts without dependency tracking
#[derive(Debug, Default)]
pub struct TracingDependencyTracker;

impl DependencyTracker for TracingDependencyTracker {
  fn add_external_dependency(&self, path: &Path) {
    tracing::debug!(path = %path.display(), "External dependency");
  }

  fn invalidate_on(&self, key: InvalidationKey) {
    tracing::trace!(current = ?key(), "Invalidation key");
  }
}

/// Remembers registrations so a caller can tell whether the output is stale
#[derive(Default)]
pub struct RecordingDependencyTracker {
  paths: Mutex<Vec<PathBuf>>,
  keys: Mutex<Vec<(InvalidationKey, Option<SystemTime>)>>,
}

impl fmt::Debug for RecordingDependencyTracker {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("RecordingDependencyTracker")
      .field("paths", &*self.paths.lock())
      .field("keys", &self.keys.lock().len())
      .finish()
  }
}

impl RecordingDependencyTracker {
  pub fn paths(&self) -> Vec<PathBuf> {
    self.paths.lock().clone()
  }

  /// True when any key evaluates differently than when it was registered
  pub fn is_invalidated(&self) -> bool {
    self
      .keys
      .lock()
      .iter()
      .any(|(key, snapshot)| key() != *snapshot)
  }
}

impl DependencyTracker for RecordingDependencyTracker {
  fn add_external_dependency(&self, path: &Path) {
    self.paths.lock().push(path.to_path_buf());
  }

  fn invalidate_on(&self, key: InvalidationKey) {
    let snapshot = key();
    self.keys.lock().push((key, snapshot));
  }
}

/// Expand `patterns` and register every matched file with `tracker`.
///
/// Patterns starting with `!` exclude the files they match from the other patterns. A file matched
/// more than once is registered once, together with a key on its modification time.
pub fn register_external_dependencies(
  patterns: &[String],
  fs: &FileSystemRef,
  tracker: &dyn DependencyTracker,
) -> Result<Vec<PathBuf>, InlineCssError> {
  let expand = |pattern: &str| {
    fs.glob(pattern).map_err(|source| InlineCssError::Glob {
      pattern: pattern.to_string(),
      source,
    })
  };

  let mut matched = IndexSet::new();
  let mut excluded = HashSet::new();

  for pattern in patterns {
    if let Some(negated) = pattern.strip_prefix('!') {
      excluded.extend(expand(negated)?);
      continue;
    }

    let paths = expand(pattern)?;
    if paths.is_empty() {
      tracing::debug!(pattern, "External dependency pattern matched no files");
    }
    matched.extend(paths);
  }

  let mut registered = Vec::with_capacity(matched.len());
  for path in matched {
    if excluded.contains(&path) {
      tracing::trace!(path = %path.display(), "Excluded external dependency");
      continue;
    }

    tracker.add_external_dependency(&path);

    let key_fs = fs.clone();
    let key_path = path.clone();
    tracker.invalidate_on(Arc::new(move || key_fs.modified(&key_path).ok()));

    tracing::debug!(path = %path.display(), "Registered external dependency");
    registered.push(path);
  }

  Ok(registered)
}
