use swc_core::atoms::Atom;
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

use crate::emit::tagged_template;
use crate::state::CompilationUnitState;
use crate::InlineCssError;

/// Replaces references to class-static bindings inside one `styles` member
pub(crate) struct StylesSubstitution<'a> {
  state: &'a CompilationUnitState,
  class_name: Atom,
  substituted: usize,
  error: Option<InlineCssError>,
}

impl<'a> StylesSubstitution<'a> {
  pub fn new(state: &'a CompilationUnitState, class_name: Atom) -> Self {
    Self {
      state,
      class_name,
      substituted: 0,
      error: None,
    }
  }

  /// Number of references replaced
  pub fn finish(self) -> Result<usize, InlineCssError> {
    match self.error {
      Some(error) => Err(error),
      None => Ok(self.substituted),
    }
  }

  fn replacement_for(&mut self, ident: &Ident) -> Option<Expr> {
    let id = ident.to_id();

    let Some(binding) = self.state.bindings.get(&id) else {
      if self.state.scan.style_imports.contains(&id) {
        self.error = Some(InlineCssError::StylesBeforeImport {
          class_name: self.class_name.clone(),
          local_name: ident.sym.clone(),
        });
      }
      return None;
    };

    let Some(tag) = &self.state.tag_identifier else {
      self.error = Some(InlineCssError::MissingTagImport {
        class_name: self.class_name.clone(),
      });
      return None;
    };

    self.substituted += 1;
    Some(tagged_template(tag, &binding.content))
  }
}

impl VisitMut for StylesSubstitution<'_> {
  fn visit_mut_expr(&mut self, expr: &mut Expr) {
    if self.error.is_some() {
      return;
    }

    if let Expr::Ident(ident) = expr {
      if let Some(replacement) = self.replacement_for(ident) {
        *expr = replacement;
      }
      return;
    }

    expr.visit_mut_children_with(self);
  }

  fn visit_mut_prop(&mut self, prop: &mut Prop) {
    if self.error.is_some() {
      return;
    }

    if let Prop::Shorthand(ident) = prop {
      if let Some(value) = self.replacement_for(ident) {
        *prop = Prop::KeyValue(KeyValueProp {
          key: PropName::Ident(IdentName::new(ident.sym.clone(), ident.span)),
          value: Box::new(value),
        });
      }
      return;
    }

    prop.visit_mut_children_with(self);
  }
}
