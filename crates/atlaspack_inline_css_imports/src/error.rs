use std::io;
use std::path::PathBuf;

use swc_core::atoms::Atom;

/// Failures that abort the rewrite of the current file.
///
/// Imports that are not stylesheets, or that have no default binding, are never errors.
#[derive(Debug, thiserror::Error)]
pub enum InlineCssError {
  #[error("Failed to resolve '{specifier}' from {}", .from.display())]
  Resolve { specifier: String, from: PathBuf },

  #[error("Failed to read {} imported from {}: {source}", .path.display(), .origin.display())]
  Read {
    path: PathBuf,
    origin: PathBuf,
    #[source]
    source: io::Error,
  },

  #[error("Failed to process {} imported from {}: {source}", .path.display(), .origin.display())]
  Process {
    path: PathBuf,
    origin: PathBuf,
    #[source]
    source: anyhow::Error,
  },

  #[error("Invalid external dependency pattern '{pattern}': {source}")]
  Glob {
    pattern: String,
    #[source]
    source: io::Error,
  },

  #[error("Cannot inline styles into class {class_name}: no tag import has been created")]
  MissingTagImport { class_name: Atom },

  #[error("Class {class_name} references '{local_name}' in its styles before the stylesheet import")]
  StylesBeforeImport { class_name: Atom, local_name: Atom },
}

impl InlineCssError {
  /// True when the stylesheet file itself does not exist
  pub fn is_not_found(&self) -> bool {
    matches!(self, InlineCssError::Read { source, .. } if source.kind() == io::ErrorKind::NotFound)
  }

  /// True for errors that mean the traversal order was not the one the pass relies on
  pub fn is_contract_violation(&self) -> bool {
    matches!(
      self,
      InlineCssError::MissingTagImport { .. } | InlineCssError::StylesBeforeImport { .. }
    )
  }
}
