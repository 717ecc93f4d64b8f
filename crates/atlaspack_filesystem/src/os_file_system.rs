use std::io;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use crate::absolute_pattern;
use crate::FileSystem;

#[derive(Default, Debug)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
  fn cwd(&self) -> io::Result<PathBuf> {
    std::env::current_dir()
  }

  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    std::fs::read_to_string(path)
  }

  fn modified(&self, path: &Path) -> io::Result<SystemTime> {
    std::fs::metadata(path)?.modified()
  }

  fn is_file(&self, path: &Path) -> bool {
    path.is_file()
  }

  fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>> {
    let pattern = absolute_pattern(&self.cwd()?, pattern);
    let entries = glob::glob(&pattern)
      .map_err(|error| io::Error::new(io::ErrorKind::InvalidInput, error.to_string()))?;

    let mut paths = Vec::new();
    for entry in entries {
      let path = entry.map_err(|error| error.into_error())?;
      if path.is_file() {
        paths.push(path);
      }
    }

    paths.sort();
    Ok(paths)
  }
}
