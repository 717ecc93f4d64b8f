use swc_core::atoms::Atom;
use swc_core::common::{SyntaxContext, DUMMY_SP};
use swc_core::ecma::ast::*;

use crate::config::TaggedOutput;

/// `import { css as _css } from "lit";`
pub(crate) fn tag_import(tag: &Ident, tagged: &TaggedOutput) -> ModuleItem {
  let imported = if &*tag.sym == tagged.local_name {
    None
  } else {
    Some(ModuleExportName::Ident(Ident::new(
      tagged.local_name.as_str().into(),
      DUMMY_SP,
      SyntaxContext::empty(),
    )))
  };

  ModuleItem::ModuleDecl(ModuleDecl::Import(ImportDecl {
    span: DUMMY_SP,
    specifiers: vec![ImportSpecifier::Named(ImportNamedSpecifier {
      span: DUMMY_SP,
      local: tag.clone(),
      imported,
      is_type_only: false,
    })],
    src: Box::new(Str {
      span: DUMMY_SP,
      value: tagged.module_name.as_str().into(),
      raw: None,
    }),
    type_only: false,
    with: None,
    phase: Default::default(),
  }))
}

/// `const <local> = <init>;`
pub(crate) fn const_decl(local: &Ident, init: Expr) -> ModuleItem {
  ModuleItem::Stmt(Stmt::Decl(Decl::Var(Box::new(VarDecl {
    span: DUMMY_SP,
    ctxt: SyntaxContext::empty(),
    kind: VarDeclKind::Const,
    declare: false,
    decls: vec![VarDeclarator {
      span: DUMMY_SP,
      name: Pat::Ident(BindingIdent {
        id: local.clone(),
        type_ann: None,
      }),
      init: Some(Box::new(init)),
      definite: false,
    }],
  }))))
}

pub(crate) fn string_literal(content: &str) -> Expr {
  Expr::Lit(Lit::Str(Str {
    span: DUMMY_SP,
    value: content.into(),
    raw: None,
  }))
}

/// <tag>`<content>` with `content` as the raw text of a single quasi
pub(crate) fn tagged_template(tag: &Ident, content: &str) -> Expr {
  let raw: Atom = content.into();

  Expr::TaggedTpl(TaggedTpl {
    span: DUMMY_SP,
    ctxt: SyntaxContext::empty(),
    tag: Box::new(Expr::Ident(tag.clone())),
    type_params: None,
    tpl: Box::new(Tpl {
      span: DUMMY_SP,
      exprs: vec![],
      quasis: vec![TplElement {
        span: DUMMY_SP,
        tail: true,
        cooked: Some(raw.clone()),
        raw,
      }],
    }),
  })
}
