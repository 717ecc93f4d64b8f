//! Inline stylesheet imports into JavaScript modules.
//!
//! ```js
//! import style from './style.css';
//! ```
//!
//! becomes `const style = "a {}";`, a tagged template such as ``const style = _css`a {}`;``,
//! or a substitution inside the static `styles` of a web component class.
use std::path::PathBuf;
use std::sync::Arc;

use atlaspack_filesystem::FileSystemRef;
use swc_core::ecma::ast::Module;
use swc_core::ecma::visit::VisitMutWith;

pub use crate::config::*;
pub use crate::content_fetcher::ContentFetcher;
pub use crate::error::InlineCssError;
pub use crate::external_dependencies::*;
pub use crate::path_resolver::resolve_import_path;
pub use crate::scan::ModuleScan;
pub use crate::state::{CompilationUnitState, ImportBinding};
pub use crate::visitor::InlineCssImportsVisitor;

mod config;
mod content_fetcher;
mod emit;
mod error;
mod external_dependencies;
mod path_resolver;
pub mod processor;
mod scan;
mod state;
mod styles_substitution;
mod visitor;

/// Host services for one compiled file
#[derive(Clone)]
pub struct InlineCssImportsContext {
  pub filename: PathBuf,
  pub file_system: FileSystemRef,
  pub dependency_tracker: Arc<dyn DependencyTracker>,
}

/// Register external dependencies, then inline every stylesheet import of `module`
pub fn transform(
  module: &mut Module,
  config: Arc<InlineCssImportsConfig>,
  context: InlineCssImportsContext,
) -> Result<(), InlineCssError> {
  register_external_dependencies(
    &config.external_dependencies,
    &context.file_system,
    &*context.dependency_tracker,
  )?;

  let mut visitor = InlineCssImportsVisitor::new(config, context.filename, context.file_system);
  module.visit_mut_with(&mut visitor);

  match visitor.take_error() {
    Some(error) => Err(error),
    None => Ok(()),
  }
}
