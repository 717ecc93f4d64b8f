use std::path::Path;

use regex::Regex;
use swc_core::ecma::visit::VisitMut;

use crate::runner::{run_visit, run_visit_with_options, RunOptions};
pub use crate::runner::{RunContext, RunVisitResult};

/// In the future this might be a different type to `RunContext`
pub type RunTestContext = RunContext;

/// Helper to test SWC visitors.
///
/// * Parse `code` with SWC
/// * Run a visitor over it
/// * Return the result
///
pub fn run_test_visit<V: VisitMut>(
  code: &str,
  make_visit: impl FnOnce(RunTestContext) -> V,
) -> RunVisitResult<V> {
  run_visit(code, make_visit).unwrap()
}

/// Same as `run_test_visit` but parses `code` as if it was the file at `filename`
pub fn run_test_visit_file<V: VisitMut>(
  filename: impl AsRef<Path>,
  code: &str,
  make_visit: impl FnOnce(RunTestContext) -> V,
) -> RunVisitResult<V> {
  run_visit_with_options(code, RunOptions::for_file(filename), make_visit).unwrap()
}

/// Remove whitespace from line starts and ends
pub fn remove_code_whitespace(code: &str) -> String {
  let re = Regex::new(r"\s*\n\s*").unwrap();
  re.replace_all(code, "\n").trim().to_string()
}
