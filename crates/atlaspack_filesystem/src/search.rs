use std::path::Path;
use std::path::PathBuf;

use crate::FileSystem;

/// Walk up from `from` looking for the first of `filenames` that exists, stopping after `root`.
pub fn find_ancestor_file<P: AsRef<Path>>(
  fs: &dyn FileSystem,
  filenames: &[&str],
  from: P,
  root: P,
) -> Option<PathBuf> {
  let root = root.as_ref();
  for dir in from.as_ref().ancestors() {
    for name in filenames {
      let fullpath = dir.join(name);
      if fs.is_file(&fullpath) {
        return Some(fullpath);
      }
    }

    if dir == root {
      break;
    }
  }

  None
}
