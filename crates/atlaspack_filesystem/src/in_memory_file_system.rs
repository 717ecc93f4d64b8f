use std::collections::HashMap;
use std::io;
use std::path::Component;
use std::path::Path;
use std::path::PathBuf;
use std::time::SystemTime;

use glob_match::glob_match;
use parking_lot::RwLock;

use crate::absolute_pattern;
use crate::FileSystem;

#[cfg(not(target_os = "windows"))]
fn root_dir() -> PathBuf {
  PathBuf::from("/")
}

#[cfg(target_os = "windows")]
fn root_dir() -> PathBuf {
  PathBuf::from("C:/")
}

/// In memory implementation of a file-system entry
#[derive(Debug)]
enum InMemoryFileSystemEntry {
  File {
    contents: String,
    modified: SystemTime,
  },
  Directory,
}

/// In memory implementation of the `FileSystem` trait, for testing purposes.
#[derive(Debug)]
pub struct InMemoryFileSystem {
  files: RwLock<HashMap<PathBuf, InMemoryFileSystemEntry>>,
  current_working_directory: RwLock<PathBuf>,
}

impl Default for InMemoryFileSystem {
  fn default() -> Self {
    Self {
      files: Default::default(),
      current_working_directory: RwLock::new(root_dir()),
    }
  }
}

impl InMemoryFileSystem {
  /// Change the current working directory. Used for resolving relative paths.
  pub fn set_current_working_directory(&self, cwd: &Path) {
    let cwd = self.canonicalize(cwd);
    let mut state = self.current_working_directory.write();
    *state = cwd;
  }

  /// Write a file, creating its parent directories. The modification time is set to now.
  pub fn write_file(&self, path: &Path, contents: String) {
    let path = self.canonicalize(path);
    let mut files = self.files.write();

    files.insert(
      path.clone(),
      InMemoryFileSystemEntry::File {
        contents,
        modified: SystemTime::now(),
      },
    );

    let mut dir = path.parent();
    while let Some(path) = dir {
      files.insert(path.to_path_buf(), InMemoryFileSystemEntry::Directory);
      dir = path.parent();
    }
  }

  /// Override the modification time of an existing file
  pub fn set_modified(&self, path: &Path, time: SystemTime) -> io::Result<()> {
    let path = self.canonicalize(path);
    let mut files = self.files.write();
    match files.get_mut(&path) {
      Some(InMemoryFileSystemEntry::File { modified, .. }) => {
        *modified = time;
        Ok(())
      }
      _ => Err(io::Error::new(io::ErrorKind::NotFound, "File not found")),
    }
  }

  fn canonicalize(&self, path: &Path) -> PathBuf {
    let cwd = self.current_working_directory.read();
    let mut result = if path.is_absolute() {
      vec![]
    } else {
      cwd.components().collect()
    };

    for component in path.components() {
      match component {
        Component::Prefix(prefix) => {
          result = vec![Component::Prefix(prefix)];
        }
        Component::RootDir => {
          result.push(Component::RootDir);
        }
        Component::CurDir => {}
        Component::ParentDir => {
          result.pop();
        }
        Component::Normal(path) => {
          result.push(Component::Normal(path));
        }
      }
    }

    PathBuf::from_iter(result)
  }
}

impl FileSystem for InMemoryFileSystem {
  fn cwd(&self) -> io::Result<PathBuf> {
    Ok(self.current_working_directory.read().clone())
  }

  fn read_to_string(&self, path: &Path) -> io::Result<String> {
    let path = self.canonicalize(path);
    let files = self.files.read();
    match files.get(&path) {
      None => Err(io::Error::new(io::ErrorKind::NotFound, "File not found")),
      Some(InMemoryFileSystemEntry::File { contents, .. }) => Ok(contents.clone()),
      Some(InMemoryFileSystemEntry::Directory) => Err(io::Error::new(
        io::ErrorKind::InvalidInput,
        "Path is a directory",
      )),
    }
  }

  fn modified(&self, path: &Path) -> io::Result<SystemTime> {
    let path = self.canonicalize(path);
    let files = self.files.read();
    match files.get(&path) {
      Some(InMemoryFileSystemEntry::File { modified, .. }) => Ok(*modified),
      Some(InMemoryFileSystemEntry::Directory) => Ok(SystemTime::UNIX_EPOCH),
      None => Err(io::Error::new(io::ErrorKind::NotFound, "File not found")),
    }
  }

  fn is_file(&self, path: &Path) -> bool {
    let path = self.canonicalize(path);
    matches!(
      self.files.read().get(&path),
      Some(InMemoryFileSystemEntry::File { .. })
    )
  }

  fn glob(&self, pattern: &str) -> io::Result<Vec<PathBuf>> {
    let pattern = absolute_pattern(&self.cwd()?, pattern);
    let files = self.files.read();

    let mut paths: Vec<PathBuf> = files
      .iter()
      .filter(|(_, entry)| matches!(entry, InMemoryFileSystemEntry::File { .. }))
      .filter(|(path, _)| {
        path
          .to_str()
          .is_some_and(|path| glob_match(&pattern, path))
      })
      .map(|(path, _)| path.clone())
      .collect();

    paths.sort();
    Ok(paths)
  }
}
