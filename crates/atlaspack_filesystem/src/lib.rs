use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::SystemTime;

/// In-memory file-system for testing
pub mod in_memory_file_system;

/// File-system implementation using std::fs
pub mod os_file_system;

pub mod search;

/// FileSystem abstraction instance
///
/// This should be `OsFileSystem` for non-testing environments and `InMemoryFileSystem` for testing.
pub type FileSystemRef = Arc<dyn FileSystem + Send + Sync>;

/// Trait abstracting the file-system operations the inliner needs.
///
/// Reads must report a missing file with [`io::ErrorKind::NotFound`] so callers can tell it apart
/// from other failures.
#[mockall::automock]
pub trait FileSystem: std::fmt::Debug {
  fn cwd(&self) -> io::Result<PathBuf>;

  fn read_to_string(&self, path: &Path) -> io::Result<String>;

  /// Last modification time of a file
  fn modified(&self, path: &Path) -> io::Result<SystemTime>;

  fn is_file(&self, path: &Path) -> bool;

  /// Expand a glob pattern into the absolute paths of the files it matches, sorted.
  ///
  /// Relative patterns are anchored at [`FileSystem::cwd`].
  fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>>;
}

/// Anchor a relative glob pattern at `cwd` and resolve its `.` and `..` segments
pub(crate) fn absolute_pattern(cwd: &Path, pattern: &str) -> String {
  let mut normalized = PathBuf::new();

  for component in cwd.join(pattern).components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        normalized.pop();
      }
      component => normalized.push(component),
    }
  }

  normalized.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn absolute_pattern_keeps_absolute_patterns() {
    assert_eq!(
      absolute_pattern(Path::new("/project"), "/other/**/*.css"),
      "/other/**/*.css"
    );
  }

  #[test]
  fn absolute_pattern_anchors_relative_patterns_at_cwd() {
    assert_eq!(
      absolute_pattern(Path::new("/project"), "./styles/*.css"),
      "/project/styles/*.css"
    );
    assert_eq!(
      absolute_pattern(Path::new("/project"), "styles/*.css"),
      "/project/styles/*.css"
    );
  }

  #[test]
  fn absolute_pattern_resolves_parent_segments() {
    assert_eq!(
      absolute_pattern(Path::new("/project/app"), "../theme/*.css"),
      "/project/theme/*.css"
    );
    assert_eq!(
      absolute_pattern(Path::new("/project"), "/project/./a/../theme/**/*.css"),
      "/project/theme/**/*.css"
    );
  }
}
