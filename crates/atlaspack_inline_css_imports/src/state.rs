use std::path::PathBuf;

use indexmap::IndexMap;
use swc_core::atoms::Atom;
use swc_core::ecma::ast::{Id, Ident};

use crate::scan::ModuleScan;

/// A style import whose content is waiting to be substituted into a class
#[derive(Clone, Debug, PartialEq)]
pub struct ImportBinding {
  pub local_name: Atom,
  pub resolved_path: PathBuf,
  pub content: String,
}

/// Everything the rewriter knows about the module it is currently visiting.
///
/// It is empty before a module is entered and is emptied again once the module has been left.
#[derive(Debug, Default)]
pub struct CompilationUnitState {
  /// Local name of the tag function once its import has been emitted
  pub tag_identifier: Option<Ident>,
  /// Class-static bindings, in import order
  pub bindings: IndexMap<Id, ImportBinding>,
  pub enclosing_class_name: Option<Atom>,
  pub scan: ModuleScan,
}

impl CompilationUnitState {
  pub fn reset(&mut self) {
    *self = CompilationUnitState::default();
  }

  pub fn is_empty(&self) -> bool {
    self.tag_identifier.is_none()
      && self.bindings.is_empty()
      && self.enclosing_class_name.is_none()
      && self.scan.is_empty()
  }
}
