use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;

use atlaspack_filesystem::FileSystemRef;
use swc_core::atoms::Atom;
use swc_core::ecma::ast::*;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

use crate::config::{InlineCssImportsConfig, TaggedOutput};
use crate::content_fetcher::ContentFetcher;
use crate::emit::{const_decl, string_literal, tag_import, tagged_template};
use crate::path_resolver::resolve_import_path;
use crate::scan::{extends_base_class, is_static_styles_getter, is_static_styles_prop, ModuleScan};
use crate::state::{CompilationUnitState, ImportBinding};
use crate::styles_substitution::StylesSubstitution;
use crate::InlineCssError;

/// Replaces stylesheet imports with their content.
///
/// Depending on configuration an import such as `import style from './style.css'` becomes
///
/// * `const style = "a {}";`
/// * `const style = _css`a {}`;` with `import { css as _css } from "lit"` emitted once per module
/// * nothing, when `style` is only used in the static `styles` of a `baseClass` subclass, where
///   each reference is replaced with `_css`a {}``. A binding also used elsewhere keeps its tagged
///   `const` and is substituted in `styles` as well.
///
/// The first error stops all further rewriting of the module and is returned by
/// [`InlineCssImportsVisitor::take_error`].
pub struct InlineCssImportsVisitor {
  config: Arc<InlineCssImportsConfig>,
  filename: PathBuf,
  cwd: PathBuf,
  fetcher: ContentFetcher,
  state: CompilationUnitState,
  error: Option<InlineCssError>,
}

impl InlineCssImportsVisitor {
  pub fn new(config: Arc<InlineCssImportsConfig>, filename: PathBuf, fs: FileSystemRef) -> Self {
    let cwd = fs.cwd().unwrap_or_default();
    let fetcher = ContentFetcher::new(fs, config.process_content.clone());

    Self {
      config,
      filename,
      cwd,
      fetcher,
      state: CompilationUnitState::default(),
      error: None,
    }
  }

  /// Replace the fetcher, e.g. with one bound to a specific processor bridge
  pub fn with_fetcher(mut self, fetcher: ContentFetcher) -> Self {
    self.fetcher = fetcher;
    self
  }

  pub fn take_error(&mut self) -> Option<InlineCssError> {
    self.error.take()
  }

  pub fn state(&self) -> &CompilationUnitState {
    &self.state
  }

  fn resolve_style_import(&self, specifier: &str) -> Result<Option<PathBuf>, InlineCssError> {
    let path = resolve_import_path(specifier, &self.filename, &self.cwd)?;
    Ok(self.config.test.matches(&path).then_some(path))
  }

  /// The first use of the tag creates its import, which is returned alongside the identifier
  fn ensure_tag_import(&mut self, tagged: &TaggedOutput) -> (Ident, Option<ModuleItem>) {
    if let Some(tag) = &self.state.tag_identifier {
      return (tag.clone(), None);
    }

    let tag = self.state.scan.alloc_unique_ident(&tagged.local_name);
    self.state.tag_identifier = Some(tag.clone());

    let import = tag_import(&tag, tagged);
    (tag, Some(import))
  }

  /// Items replacing `import`, or `None` to keep it
  fn rewrite_import(
    &mut self,
    import: &ImportDecl,
  ) -> Result<Option<Vec<ModuleItem>>, InlineCssError> {
    if import.type_only {
      return Ok(None);
    }

    let Some(path) = self.resolve_style_import(&import.src.value)? else {
      tracing::trace!(specifier = %import.src.value, "Not a stylesheet import");
      return Ok(None);
    };

    let Some(local) = default_import_local(import) else {
      tracing::trace!(path = %path.display(), "Stylesheet import without a default binding");
      return Ok(None);
    };

    let content = self.fetcher.fetch(&path, &self.filename)?;
    let id = local.to_id();

    let Some(tagged) = self.config.tagged.clone() else {
      tracing::debug!(path = %path.display(), local = %local.sym, "Inlined stylesheet as a string");
      return Ok(Some(vec![const_decl(local, string_literal(&content))]));
    };

    let (tag, import) = self.ensure_tag_import(&tagged);
    let mut items: Vec<ModuleItem> = import.into_iter().collect();

    if self.state.scan.styles_references.contains(&id) {
      self.state.bindings.insert(
        id.clone(),
        ImportBinding {
          local_name: local.sym.clone(),
          resolved_path: path.clone(),
          content: content.clone(),
        },
      );

      if self.state.scan.is_styles_only(&id) {
        tracing::debug!(path = %path.display(), local = %local.sym, "Deferred stylesheet to class styles");
        return Ok(Some(items));
      }
    }

    tracing::debug!(path = %path.display(), local = %local.sym, "Inlined stylesheet as a tagged template");
    items.push(const_decl(local, tagged_template(&tag, &content)));
    Ok(Some(items))
  }

  fn visit_mut_named_class(&mut self, name: Option<&Ident>, class: &mut Class) {
    if self.error.is_some() {
      return;
    }

    if self.config.tagged.is_none() || !extends_base_class(class, &self.config.base_class) {
      class.visit_mut_children_with(self);
      return;
    }

    let class_name = name
      .map(|ident| ident.sym.clone())
      .unwrap_or_else(|| Atom::from("<anonymous>"));
    let outer_class_name = self.state.enclosing_class_name.replace(class_name);

    class.visit_mut_children_with(self);
    if self.error.is_none() {
      if let Err(error) = self.substitute_styles(class) {
        self.error = Some(error);
      }
    }

    self.state.enclosing_class_name = outer_class_name;
  }

  fn substitute_styles(&mut self, class: &mut Class) -> Result<(), InlineCssError> {
    let Some(class_name) = self.state.enclosing_class_name.clone() else {
      return Ok(());
    };

    let mut substitution = StylesSubstitution::new(&self.state, class_name.clone());
    for member in class.body.iter_mut() {
      match member {
        ClassMember::ClassProp(prop) if is_static_styles_prop(prop) => {
          prop.value.visit_mut_with(&mut substitution);
        }
        ClassMember::Method(method) if is_static_styles_getter(method) => {
          method.function.body.visit_mut_with(&mut substitution);
        }
        _ => {}
      }
    }

    let substituted = substitution.finish()?;
    if substituted > 0 {
      tracing::debug!(class = %class_name, substituted, "Inlined stylesheets into class styles");
    }

    Ok(())
  }
}

fn default_import_local(import: &ImportDecl) -> Option<&Ident> {
  import.specifiers.iter().find_map(|specifier| match specifier {
    ImportSpecifier::Default(default) => Some(&default.local),
    _ => None,
  })
}

impl VisitMut for InlineCssImportsVisitor {
  fn visit_mut_module(&mut self, module: &mut Module) {
    self.state.reset();

    let scan = {
      let config = &self.config;
      let filename: &Path = &self.filename;
      let cwd: &Path = &self.cwd;
      ModuleScan::run(module, &config.base_class, &|specifier: &str| {
        resolve_import_path(specifier, filename, cwd).is_ok_and(|path| config.test.matches(&path))
      })
    };
    self.state.scan = scan;

    module.visit_mut_children_with(self);

    self.state.reset();
  }

  fn visit_mut_module_items(&mut self, items: &mut Vec<ModuleItem>) {
    let mut output = Vec::with_capacity(items.len());

    for mut item in items.drain(..) {
      if self.error.is_some() {
        output.push(item);
        continue;
      }

      item.visit_mut_with(self);

      let ModuleItem::ModuleDecl(ModuleDecl::Import(import)) = &item else {
        output.push(item);
        continue;
      };

      match self.rewrite_import(import) {
        Ok(Some(replacement)) => output.extend(replacement),
        Ok(None) => output.push(item),
        Err(error) => {
          self.error = Some(error);
          output.push(item);
        }
      }
    }

    *items = output;
  }

  fn visit_mut_class_decl(&mut self, decl: &mut ClassDecl) {
    self.visit_mut_named_class(Some(&decl.ident), &mut decl.class);
  }

  fn visit_mut_class_expr(&mut self, expr: &mut ClassExpr) {
    self.visit_mut_named_class(expr.ident.as_ref(), &mut expr.class);
  }
}

#[cfg(test)]
mod tests {
  use atlaspack_filesystem::in_memory_file_system::InMemoryFileSystem;
  use atlaspack_swc_runner::test_utils::{remove_code_whitespace, run_test_visit_file};
  use indoc::indoc;
  use pretty_assertions::assert_eq;

  use super::*;
  use crate::config::ImportTest;

  const FILENAME: &str = "/project/src/index.js";

  fn project_fs(files: &[(&str, &str)]) -> FileSystemRef {
    let fs = InMemoryFileSystem::default();
    fs.set_current_working_directory(Path::new("/project"));
    for (path, content) in files {
      fs.write_file(Path::new(path), content.to_string());
    }
    Arc::new(fs)
  }

  fn tagged_config() -> InlineCssImportsConfig {
    InlineCssImportsConfig {
      tagged: Some(TaggedOutput {
        local_name: "css".into(),
        module_name: "tagmodule".into(),
      }),
      ..Default::default()
    }
  }

  fn run(
    config: InlineCssImportsConfig,
    fs: FileSystemRef,
    code: &str,
  ) -> (String, Option<InlineCssError>) {
    let result = run_test_visit_file(FILENAME, code, |_| {
      InlineCssImportsVisitor::new(Arc::new(config), PathBuf::from(FILENAME), fs)
    });
    let mut visitor = result.visitor;
    (result.output_code, visitor.take_error())
  }

  fn assert_output(actual: &str, expected: &str) {
    assert_eq!(
      remove_code_whitespace(actual),
      remove_code_whitespace(expected)
    );
  }

  #[test]
  fn plain_mode_inlines_a_string() {
    let (output, error) = run(
      InlineCssImportsConfig::default(),
      project_fs(&[("/project/src/style.css", "a {}")]),
      "import style from './style.css';",
    );

    assert!(error.is_none());
    assert_output(&output, r#"const style = "a {}";"#);
  }

  #[test]
  fn plain_mode_keeps_import_order() {
    let (output, error) = run(
      InlineCssImportsConfig::default(),
      project_fs(&[
        ("/project/src/p1.css", ".p1 {}"),
        ("/project/src/p2.css", ".p2 {}"),
      ]),
      indoc! {r#"
        import p1 from './p1.css';
        import p2 from './p2.css';
        console.log(p1, p2);
      "#},
    );

    assert!(error.is_none());
    assert_output(
      &output,
      r#"
        const p1 = ".p1 {}";
        const p2 = ".p2 {}";
        console.log(p1, p2);
      "#,
    );
  }

  #[test]
  fn plain_mode_preserves_content_exactly() {
    let content = ".a {\n  content: \"\\201C\";\n}\n/* `quoted` ${x} */\n";
    let (output, error) = run(
      InlineCssImportsConfig::default(),
      project_fs(&[("/project/src/style.css", content)]),
      "import style from './style.css';",
    );

    assert!(error.is_none());
    assert_eq!(swc_string_value(&output), content);
  }

  /// Reads back the value of `const style = "...";` by reparsing the output
  fn swc_string_value(output: &str) -> String {
    struct ReadString(Option<String>);
    impl VisitMut for ReadString {
      fn visit_mut_str(&mut self, str: &mut Str) {
        self.0 = Some(str.value.to_string());
      }
    }

    run_test_visit_file(FILENAME, output, |_| ReadString(None))
      .visitor
      .0
      .unwrap()
  }

  #[test]
  fn tagged_mode_emits_one_tag_import() {
    let (output, error) = run(
      tagged_config(),
      project_fs(&[
        ("/project/src/p1.css", ".p1 {}"),
        ("/project/src/p2.css", ".p2 {}"),
      ]),
      indoc! {r#"
        import { html } from 'tagmodule';
        import p1 from './p1.css';
        import p2 from './p2.css';
      "#},
    );

    assert!(error.is_none());
    assert_output(
      &output,
      r#"
        import { html } from 'tagmodule';
        import { css as _css } from "tagmodule";
        const p1 = _css`.p1 {}`;
        const p2 = _css`.p2 {}`;
      "#,
    );
  }

  #[test]
  fn tagged_mode_keeps_content_raw() {
    let (output, error) = run(
      tagged_config(),
      project_fs(&[("/project/src/style.css", "a::after { content: '`${x}`'; }")]),
      "import style from './style.css';",
    );

    assert!(error.is_none());
    assert!(output.contains("const style = _css`a::after { content: '`${x}`'; }`;"));
  }

  #[test]
  fn tag_name_avoids_existing_identifiers() {
    let (output, error) = run(
      tagged_config(),
      project_fs(&[("/project/src/style.css", "a {}")]),
      indoc! {r#"
        import style from './style.css';
        const _css = 'taken';
      "#},
    );

    assert!(error.is_none());
    assert_output(
      &output,
      r#"
        import { css as _css2 } from "tagmodule";
        const style = _css2`a {}`;
        const _css = 'taken';
      "#,
    );
  }

  #[test]
  fn non_matching_imports_are_untouched() {
    let code = indoc! {r#"
      import style from './style.vue';
      import React from 'react';
      import './global.css';
      import { named } from './named.css';
      import type Styles from './types.css';
    "#};

    let result = run_test_visit_file("/project/src/index.ts", code, |_| {
      InlineCssImportsVisitor::new(
        Arc::new(InlineCssImportsConfig::default()),
        PathBuf::from("/project/src/index.ts"),
        project_fs(&[]),
      )
    });
    let mut visitor = result.visitor;

    assert!(visitor.take_error().is_none());
    assert_output(&result.output_code, code);
  }

  #[test]
  fn predicate_test_decides_matches() {
    let config = InlineCssImportsConfig {
      test: ImportTest::predicate(|path| path.extension().is_some_and(|ext| ext == "vue")),
      ..Default::default()
    };

    let (output, error) = run(
      config,
      project_fs(&[("/project/src/style.vue", "a {}")]),
      indoc! {r#"
        import style from './style.vue';
        import other from './other.css';
      "#},
    );

    assert!(error.is_none());
    assert_output(
      &output,
      r#"
        const style = "a {}";
        import other from './other.css';
      "#,
    );
  }

  #[test]
  fn class_static_styles_are_substituted() {
    let (output, error) = run(
      tagged_config(),
      project_fs(&[
        ("/project/src/a.css", ".a {}"),
        ("/project/src/b.css", ".b {}"),
      ]),
      indoc! {r#"
        import a from './a.css';
        import b from './b.css';
        class MyElement extends LitElement {
          static styles = [b, a];
        }
      "#},
    );

    assert!(error.is_none());
    let output = remove_code_whitespace(&output);
    assert!(output.starts_with("import { css as _css } from \"tagmodule\";\nclass MyElement"));
    assert_eq!(output.matches("tagmodule").count(), 1);

    let b = output.find("_css`.b {}`").unwrap();
    let a = output.find("_css`.a {}`").unwrap();
    assert!(b < a, "{output}");
    assert!(!output.contains("import a"));
    assert!(!output.contains("import b"));
  }

  #[test]
  fn class_static_getter_is_substituted() {
    let (output, error) = run(
      tagged_config(),
      project_fs(&[("/project/src/a.css", ".a {}")]),
      indoc! {r#"
        import a from './a.css';
        class MyElement extends LitElement {
          static get styles() {
            return a;
          }
          render() {
            return null;
          }
        }
      "#},
    );

    assert!(error.is_none());
    assert_output(
      &output,
      r#"
        import { css as _css } from "tagmodule";
        class MyElement extends LitElement {
          static get styles() {
            return _css`.a {}`;
          }
          render() {
            return null;
          }
        }
      "#,
    );
  }

  #[test]
  fn classes_with_other_base_classes_use_tagged_mode() {
    let (output, error) = run(
      tagged_config(),
      project_fs(&[("/project/src/a.css", ".a {}")]),
      indoc! {r#"
        import a from './a.css';
        class MyElement extends HTMLElement {
          static styles = a;
        }
      "#},
    );

    assert!(error.is_none());
    assert_output(
      &output,
      r#"
        import { css as _css } from "tagmodule";
        const a = _css`.a {}`;
        class MyElement extends HTMLElement {
          static styles = a;
        }
      "#,
    );
  }

  #[test]
  fn matching_class_without_styles_is_a_no_op() {
    let (output, error) = run(
      tagged_config(),
      project_fs(&[("/project/src/a.css", ".a {}")]),
      indoc! {r#"
        import a from './a.css';
        class MyElement extends LitElement {
          render() {}
        }
      "#},
    );

    assert!(error.is_none());
    assert_output(
      &output,
      r#"
        import { css as _css } from "tagmodule";
        const a = _css`.a {}`;
        class MyElement extends LitElement {
          render() {}
        }
      "#,
    );
  }

  #[test]
  fn class_before_its_import_is_a_contract_violation() {
    let (_, error) = run(
      tagged_config(),
      project_fs(&[("/project/src/a.css", ".a {}")]),
      indoc! {r#"
        class MyElement extends LitElement {
          static styles = a;
        }
        import a from './a.css';
      "#},
    );

    let error = error.unwrap();
    assert!(error.is_contract_violation());
    assert_eq!(
      error.to_string(),
      "Class MyElement references 'a' in its styles before the stylesheet import"
    );
  }

  #[test]
  fn nested_classes_restore_the_outer_class() {
    let (output, error) = run(
      tagged_config(),
      project_fs(&[
        ("/project/src/a.css", ".a {}"),
        ("/project/src/b.css", ".b {}"),
      ]),
      indoc! {r#"
        import a from './a.css';
        import b from './b.css';
        class Outer extends LitElement {
          static styles = a;
          static Inner = class Inner extends LitElement {
            static styles = b;
          };
        }
      "#},
    );

    assert!(error.is_none());
    let output = remove_code_whitespace(&output);
    assert!(output.contains("static styles = _css`.a {}`;"), "{output}");
    assert!(output.contains("static styles = _css`.b {}`;"), "{output}");
  }

  #[test]
  fn missing_stylesheet_stops_rewriting() {
    let (output, error) = run(
      InlineCssImportsConfig::default(),
      project_fs(&[("/project/src/b.css", ".b {}")]),
      indoc! {r#"
        import a from './a.css';
        import b from './b.css';
      "#},
    );

    assert!(error.unwrap().is_not_found());
    assert_output(
      &output,
      r#"
        import a from './a.css';
        import b from './b.css';
      "#,
    );
  }

  #[test]
  fn state_does_not_leak_between_modules() {
    let fs = project_fs(&[("/project/src/a.css", ".a {}")]);
    let config = Arc::new(tagged_config());

    let first = run_test_visit_file(FILENAME, "import a from './a.css';", |_| {
      InlineCssImportsVisitor::new(config.clone(), PathBuf::from(FILENAME), fs.clone())
    });
    let visitor = first.visitor;
    assert!(visitor.state().is_empty());

    // Reuse the same visitor for a second module
    let second = run_test_visit_file(FILENAME, "import a from './a.css';", move |_| visitor);

    assert!(second.visitor.state().is_empty());
    assert_eq!(first.output_code, second.output_code);
    assert_eq!(second.output_code.matches("tagmodule").count(), 1);
  }

  #[test]
  fn class_static_and_tagged_imports_share_one_tag() {
    let (output, error) = run(
      tagged_config(),
      project_fs(&[
        ("/project/src/a.css", ".a {}"),
        ("/project/src/b.css", ".b {}"),
      ]),
      indoc! {r#"
        import a from './a.css';
        import b from './b.css';
        class MyElement extends LitElement {
          static styles = a;
        }
      "#},
    );

    assert!(error.is_none());
    assert_output(
      &output,
      r#"
        import { css as _css } from "tagmodule";
        const b = _css`.b {}`;
        class MyElement extends LitElement {
          static styles = _css`.a {}`;
        }
      "#,
    );
  }

  #[test]
  fn bindings_used_outside_styles_keep_their_declaration() {
    let (output, error) = run(
      tagged_config(),
      project_fs(&[("/project/src/a.css", ".a {}")]),
      indoc! {r#"
        import a from './a.css';
        class X extends LitElement {
          static styles = a;
        }
        export { a };
        console.log(a);
      "#},
    );

    assert!(error.is_none());
    assert_output(
      &output,
      r#"
        import { css as _css } from "tagmodule";
        const a = _css`.a {}`;
        class X extends LitElement {
          static styles = _css`.a {}`;
        }
        export { a };
        console.log(a);
      "#,
    );
  }

  #[test]
  fn rewriting_is_idempotent() {
    let fs = project_fs(&[
      ("/project/src/a.css", ".a {}"),
      ("/project/src/b.css", ".b {}"),
    ]);
    let code = indoc! {r#"
      import a from './a.css';
      import b from './b.css';
      class MyElement extends LitElement {
        static styles = [a];
      }
    "#};

    let (once, _) = run(tagged_config(), fs.clone(), code);
    let (twice, error) = run(tagged_config(), fs, &once);

    assert!(error.is_none());
    assert_eq!(once, twice);
  }
}
