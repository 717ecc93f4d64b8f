use std::path::Path;
use std::path::PathBuf;
use std::string::FromUtf8Error;

use swc_core::common::input::StringInput;
use swc_core::common::sync::Lrc;
use swc_core::common::{FileName, Globals, Mark, SourceMap, GLOBALS};
use swc_core::ecma::ast::Module;
use swc_core::ecma::codegen::text_writer::JsWriter;
use swc_core::ecma::parser::lexer::Lexer;
use swc_core::ecma::parser::{EsSyntax, Parser, Syntax, TsSyntax};
use swc_core::ecma::transforms::base::resolver;
use swc_core::ecma::visit::{VisitMut, VisitMutWith};

pub struct RunContext {
  /// Source-map in use
  pub source_map: Lrc<SourceMap>,
  /// Global mark from SWC resolver
  pub global_mark: Mark,
  /// Unresolved mark from SWC resolver
  pub unresolved_mark: Mark,
  /// Path of the module being run, when one was given
  pub filename: Option<PathBuf>,
}

pub struct RunVisitResult<V> {
  pub output_code: String,
  pub visitor: V,
}

/// How the code handed to the runner should be parsed
#[derive(Clone, Debug, Default)]
pub struct RunOptions {
  pub filename: Option<PathBuf>,
  pub syntax: Syntax,
}

impl RunOptions {
  /// Pick the syntax from the file extension: TypeScript for `.ts`/`.tsx`, ECMAScript otherwise.
  pub fn for_file(filename: impl AsRef<Path>) -> Self {
    let filename = filename.as_ref();
    let extension = filename
      .extension()
      .and_then(|extension| extension.to_str())
      .unwrap_or_default();

    let syntax = match extension {
      "ts" | "mts" | "cts" | "tsx" => Syntax::Typescript(TsSyntax {
        tsx: extension == "tsx",
        decorators: true,
        ..Default::default()
      }),
      _ => Syntax::Es(EsSyntax {
        jsx: extension == "jsx",
        decorators: true,
        ..Default::default()
      }),
    };

    Self {
      filename: Some(filename.to_path_buf()),
      syntax,
    }
  }
}

#[derive(Debug, thiserror::Error)]
pub enum RunWithTransformationError {
  #[error("Failed to parse {filename}: {message}")]
  SwcParse { filename: String, message: String },
  #[error("IO Error: {0}")]
  IoError(#[from] std::io::Error),
  #[error("Invalid utf-8 output: {0}")]
  InvalidUtf8Output(#[from] FromUtf8Error),
}

/// Runner of SWC transformations
///
/// * Parse `code` with SWC as an ECMAScript module
/// * Run the resolver and then a visitor over it
/// * Return the printed result
///
pub fn run_visit<V: VisitMut>(
  code: &str,
  make_visit: impl FnOnce(RunContext) -> V,
) -> Result<RunVisitResult<V>, RunWithTransformationError> {
  run_visit_with_options(code, RunOptions::default(), make_visit)
}

/// Same as `run_visit` but with an explicit file name and syntax
pub fn run_visit_with_options<V: VisitMut>(
  code: &str,
  options: RunOptions,
  make_visit: impl FnOnce(RunContext) -> V,
) -> Result<RunVisitResult<V>, RunWithTransformationError> {
  let source_map = Lrc::new(SourceMap::default());
  let display_name = options
    .filename
    .as_ref()
    .map(|filename| filename.display().to_string())
    .unwrap_or_else(|| String::from("<anon>"));
  let file_name = match &options.filename {
    Some(filename) => FileName::Real(filename.clone()),
    None => FileName::Anon,
  };
  let source_file = source_map.new_source_file(Lrc::new(file_name), code.into());

  let lexer = Lexer::new(
    options.syntax,
    Default::default(),
    StringInput::from(&*source_file),
    None,
  );

  let mut parser = Parser::new_from(lexer);
  let parse_error = |error: swc_core::ecma::parser::error::Error| RunWithTransformationError::SwcParse {
    filename: display_name.clone(),
    message: error.kind().msg().to_string(),
  };

  let mut module = parser.parse_module().map_err(parse_error)?;
  if let Some(error) = parser.take_errors().into_iter().next() {
    return Err(parse_error(error));
  }

  GLOBALS.set(&Globals::new(), || -> Result<RunVisitResult<V>, RunWithTransformationError> {
    let global_mark = Mark::new();
    let unresolved_mark = Mark::new();
    module.visit_mut_with(&mut resolver(unresolved_mark, global_mark, false));

    let context = RunContext {
      source_map: source_map.clone(),
      global_mark,
      unresolved_mark,
      filename: options.filename.clone(),
    };

    let mut visitor = make_visit(context);
    module.visit_mut_with(&mut visitor);

    let output_code = print_module(source_map.clone(), &module)?;

    Ok(RunVisitResult {
      output_code,
      visitor,
    })
  })
}

fn print_module(
  source_map: Lrc<SourceMap>,
  module: &Module,
) -> Result<String, RunWithTransformationError> {
  let mut output_buffer = vec![];
  let writer = JsWriter::new(source_map.clone(), "\n", &mut output_buffer, None);
  let mut emitter = swc_core::ecma::codegen::Emitter {
    cfg: Default::default(),
    cm: source_map,
    comments: None,
    wr: writer,
  };
  emitter.emit_module(module)?;

  Ok(String::from_utf8(output_buffer)?)
}
