//! Route file discovery.

use std::fs;
use std::path::{Path, PathBuf};

use crate::error::{FsRouteError, Result};
use crate::mapper::ROUTER_DIR;

/// A file discovered under `<routing_root>/router`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteFile {
    /// Absolute (root-joined) path of the file.
    pub path: PathBuf,
    /// Path relative to the router directory, `/`-separated.
    pub relative: String,
}

/// Lists every file under `<routing_root>/router`, depth-first.
///
/// Entries of a directory are visited in file name order and a
/// subdirectory's files are spliced in where the directory sorts. The scan
/// is fresh on every call.
pub fn scan(routing_root: &Path) -> Result<Vec<RouteFile>> {
    let router_dir = routing_root.join(ROUTER_DIR);
    let mut files = Vec::new();
    scan_dir(&router_dir, "", &mut files)?;
    Ok(files)
}

fn scan_dir(dir: &Path, prefix: &str, files: &mut Vec<RouteFile>) -> Result<()> {
    let io_err = |source: std::io::Error| FsRouteError::FileSystem {
        path: dir.to_path_buf(),
        source,
    };

    let mut entries = fs::read_dir(dir)
        .map_err(io_err)?
        .collect::<std::io::Result<Vec<_>>>()
        .map_err(io_err)?;
    entries.sort_by_key(fs::DirEntry::file_name);

    for entry in entries {
        let name = entry.file_name().to_string_lossy().into_owned();
        let relative = if prefix.is_empty() {
            name
        } else {
            format!("{prefix}/{name}")
        };
        let path = entry.path();

        if entry.file_type().map_err(io_err)?.is_dir() {
            scan_dir(&path, &relative, files)?;
        } else {
            files.push(RouteFile { path, relative });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(ROUTER_DIR).join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn relatives(root: &Path) -> Vec<String> {
        scan(root).unwrap().into_iter().map(|f| f.relative).collect()
    }

    #[test]
    fn test_depth_first_in_name_order() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "index.ts");
        touch(dir.path(), "users/index.ts");
        touch(dir.path(), "users/admin/list.ts");
        touch(dir.path(), "users/create.ts");
        touch(dir.path(), "about.ts");
        touch(dir.path(), "zeta.ts");

        assert_eq!(
            relatives(dir.path()),
            vec![
                "about.ts",
                "index.ts",
                "users/admin/list.ts",
                "users/create.ts",
                "users/index.ts",
                "zeta.ts",
            ]
        );
    }

    #[test]
    fn test_paths_are_under_router_dir() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a/b.ts");

        let files = scan(dir.path()).unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].path, dir.path().join(ROUTER_DIR).join("a").join("b.ts"));
    }

    #[test]
    fn test_empty_directories_contribute_nothing() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join(ROUTER_DIR).join("empty/nested")).unwrap();
        assert!(relatives(dir.path()).is_empty());
    }

    #[test]
    fn test_missing_router_dir_is_filesystem_error() {
        let dir = tempfile::tempdir().unwrap();
        match scan(dir.path()) {
            Err(FsRouteError::FileSystem { path, source }) => {
                assert_eq!(path, dir.path().join(ROUTER_DIR));
                assert_eq!(source.kind(), std::io::ErrorKind::NotFound);
            }
            other => panic!("expected FileSystem error, got {other:?}"),
        }
    }

    #[test]
    fn test_rescan_sees_new_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(dir.path(), "a.ts");
        assert_eq!(relatives(dir.path()).len(), 1);
        touch(dir.path(), "b.ts");
        assert_eq!(relatives(dir.path()).len(), 2);
    }
}
