use std::path::Component;
use std::path::Path;
use std::path::PathBuf;

use crate::InlineCssError;

/// Resolve an import specifier against the directory of `filename`.
///
/// Relative `filename`s are anchored at `cwd`. The result is normalised lexically, nothing is read
/// from disk and symlinks are not followed.
pub fn resolve_import_path(
  specifier: &str,
  filename: &Path,
  cwd: &Path,
) -> Result<PathBuf, InlineCssError> {
  if specifier.is_empty() || specifier.contains('\0') {
    return Err(InlineCssError::Resolve {
      specifier: specifier.to_string(),
      from: filename.to_path_buf(),
    });
  }

  let filename = if filename.is_absolute() {
    filename.to_path_buf()
  } else {
    cwd.join(filename)
  };

  let dir = filename.parent().unwrap_or(&filename);

  Ok(normalize_path(&dir.join(specifier)))
}

fn normalize_path(path: &Path) -> PathBuf {
  let mut result = PathBuf::new();
  for component in path.components() {
    match component {
      Component::CurDir => {}
      Component::ParentDir => {
        // Popping past the root is a no-op, same as `/..` on disk
        result.pop();
      }
      other => result.push(other),
    }
  }

  result
}

#[cfg(test)]
mod tests {
  use pretty_assertions::assert_eq;

  use super::*;

  #[test]
  fn resolves_relative_to_the_importing_file() {
    assert_eq!(
      resolve_import_path(
        "./style.css",
        Path::new("/project/src/index.js"),
        Path::new("/")
      )
      .unwrap(),
      PathBuf::from("/project/src/style.css")
    );
  }

  #[test]
  fn resolves_parent_directories() {
    assert_eq!(
      resolve_import_path(
        "../../styles/./theme.css",
        Path::new("/project/src/components/button.js"),
        Path::new("/")
      )
      .unwrap(),
      PathBuf::from("/project/styles/theme.css")
    );
  }

  #[test]
  fn bare_specifiers_resolve_next_to_the_file() {
    assert_eq!(
      resolve_import_path("style.css", Path::new("/project/index.js"), Path::new("/")).unwrap(),
      PathBuf::from("/project/style.css")
    );
  }

  #[test]
  fn absolute_specifiers_are_kept() {
    assert_eq!(
      resolve_import_path(
        "/shared/style.css",
        Path::new("/project/index.js"),
        Path::new("/")
      )
      .unwrap(),
      PathBuf::from("/shared/style.css")
    );
  }

  #[test]
  fn relative_filenames_use_the_working_directory() {
    assert_eq!(
      resolve_import_path(
        "./style.css",
        Path::new("src/index.js"),
        Path::new("/project")
      )
      .unwrap(),
      PathBuf::from("/project/src/style.css")
    );
  }

  #[test]
  fn malformed_specifiers_fail() {
    for specifier in ["", "style\0.css"] {
      let error =
        resolve_import_path(specifier, Path::new("/project/index.js"), Path::new("/")).unwrap_err();

      assert!(matches!(error, InlineCssError::Resolve { .. }));
    }
  }
}
