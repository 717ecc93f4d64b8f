use std::collections::HashSet;

use swc_core::atoms::Atom;
use swc_core::common::{SyntaxContext, DUMMY_SP};
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{Visit, VisitWith};

/// Facts about a module gathered before it is rewritten
#[derive(Debug, Default)]
pub struct ModuleScan {
  /// Every identifier name in the module, including generated ones
  pub used_names: HashSet<Atom>,
  /// Default bindings of imports that resolve to stylesheets
  pub style_imports: HashSet<Id>,
  /// Identifiers referenced from the static `styles` member of a base-class subclass
  pub styles_references: HashSet<Id>,
  /// Identifiers referenced anywhere else, exports included
  pub other_references: HashSet<Id>,
}

impl ModuleScan {
  pub fn run(module: &Module, base_class: &str, is_style_import: &dyn Fn(&str) -> bool) -> Self {
    let mut collector = ScanCollector {
      scan: ModuleScan::default(),
      base_class,
      is_style_import,
      class_stack: Vec::new(),
      in_styles: false,
    };
    module.visit_with(&mut collector);
    collector.scan
  }

  pub fn is_empty(&self) -> bool {
    self.used_names.is_empty()
      && self.style_imports.is_empty()
      && self.styles_references.is_empty()
      && self.other_references.is_empty()
  }

  /// True when `id` is used in class styles and nowhere else
  pub fn is_styles_only(&self, id: &Id) -> bool {
    self.styles_references.contains(id) && !self.other_references.contains(id)
  }

  /// Allocate a name derived from `preferred` that clashes with nothing in the module.
  ///
  /// `css` becomes `_css`, then `_css2`, `_css3` and so on.
  pub fn alloc_unique_ident(&mut self, preferred: &str) -> Ident {
    let base = format!("_{}", preferred.trim_start_matches('_'));
    let mut name = Atom::from(base.as_str());
    let mut idx = 2usize;
    while self.used_names.contains(&name) {
      name = Atom::from(format!("{base}{idx}"));
      idx += 1;
    }

    self.used_names.insert(name.clone());
    Ident::new(name, DUMMY_SP, SyntaxContext::empty())
  }
}

/// True when `class` extends an identifier called `base_class`
pub(crate) fn extends_base_class(class: &Class, base_class: &str) -> bool {
  match class.super_class.as_deref() {
    Some(Expr::Ident(ident)) => &*ident.sym == base_class,
    _ => false,
  }
}

pub(crate) fn is_styles_key(key: &PropName) -> bool {
  match key {
    PropName::Ident(ident) => &*ident.sym == "styles",
    PropName::Str(str) => &*str.value == "styles",
    _ => false,
  }
}

pub(crate) fn is_static_styles_getter(method: &ClassMethod) -> bool {
  method.is_static && method.kind == MethodKind::Getter && is_styles_key(&method.key)
}

pub(crate) fn is_static_styles_prop(prop: &ClassProp) -> bool {
  prop.is_static && is_styles_key(&prop.key)
}

struct ScanCollector<'a> {
  scan: ModuleScan,
  base_class: &'a str,
  is_style_import: &'a dyn Fn(&str) -> bool,
  /// Whether each enclosing class extends the base class
  class_stack: Vec<bool>,
  in_styles: bool,
}

impl ScanCollector<'_> {
  fn add_reference(&mut self, ident: &Ident) {
    if self.in_styles {
      self.scan.styles_references.insert(ident.to_id());
    } else {
      self.scan.other_references.insert(ident.to_id());
    }
  }
}

impl Visit for ScanCollector<'_> {
  fn visit_ident(&mut self, ident: &Ident) {
    self.scan.used_names.insert(ident.sym.clone());
  }

  fn visit_import_decl(&mut self, import: &ImportDecl) {
    import.visit_children_with(self);

    if import.type_only || !(self.is_style_import)(&*import.src.value) {
      return;
    }

    for specifier in &import.specifiers {
      if let ImportSpecifier::Default(default) = specifier {
        self.scan.style_imports.insert(default.local.to_id());
      }
    }
  }

  fn visit_named_export(&mut self, export: &NamedExport) {
    export.visit_children_with(self);

    if export.src.is_some() {
      return;
    }

    for specifier in &export.specifiers {
      if let ExportSpecifier::Named(ExportNamedSpecifier {
        orig: ModuleExportName::Ident(ident),
        ..
      }) = specifier
      {
        self.scan.other_references.insert(ident.to_id());
      }
    }
  }

  fn visit_expr(&mut self, expr: &Expr) {
    if let Expr::Ident(ident) = expr {
      self.add_reference(ident);
    }
    expr.visit_children_with(self);
  }

  fn visit_prop(&mut self, prop: &Prop) {
    if let Prop::Shorthand(ident) = prop {
      self.add_reference(ident);
    }
    prop.visit_children_with(self);
  }

  fn visit_class(&mut self, class: &Class) {
    self
      .class_stack
      .push(extends_base_class(class, self.base_class));
    class.visit_children_with(self);
    self.class_stack.pop();
  }

  fn visit_class_member(&mut self, member: &ClassMember) {
    let is_styles = self.class_stack.last().copied().unwrap_or(false)
      && match member {
        ClassMember::ClassProp(prop) => is_static_styles_prop(prop),
        ClassMember::Method(method) => is_static_styles_getter(method),
        _ => false,
      };

    let outer = self.in_styles;
    self.in_styles |= is_styles;
    member.visit_children_with(self);
    self.in_styles = outer;
  }
}
