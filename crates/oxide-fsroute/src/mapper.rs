//! File path to URL path mapping.

use std::path::{Component, Path};

use crate::error::{FsRouteError, Result};

/// Name of the directory under the routing root that holds route files.
pub const ROUTER_DIR: &str = "router";

/// Extensions stripped from the final path segment.
pub const SOURCE_EXTENSIONS: &[&str] = &["rs", "ts", "tsx", "js", "jsx", "mjs", "cjs"];

const INDEX_STEM: &str = "index";

/// Maps a route file under `<routing_root>/router` to its canonical URL path.
///
/// Segment names are taken literally; only a recognized source extension is
/// stripped from the last segment, and a trailing `index` file is dropped.
///
/// ```
/// use std::path::Path;
/// use oxide_fsroute::map_path;
///
/// let root = Path::new("/srv/app");
/// assert_eq!(map_path(&root.join("router/index.ts"), root).unwrap(), "/");
/// assert_eq!(map_path(&root.join("router/users/index.ts"), root).unwrap(), "/users");
/// assert_eq!(map_path(&root.join("router/users/profile.ts"), root).unwrap(), "/users/profile");
/// ```
pub fn map_path(file: &Path, routing_root: &Path) -> Result<String> {
    let router_dir = routing_root.join(ROUTER_DIR);
    let relative = file
        .strip_prefix(&router_dir)
        .map_err(|_| FsRouteError::OutsideRoutingRoot(file.to_path_buf()))?;

    let mut segments = Vec::new();
    for component in relative.components() {
        match component {
            Component::Normal(name) => segments.push(name.to_string_lossy().into_owned()),
            Component::CurDir => {}
            _ => return Err(FsRouteError::OutsideRoutingRoot(file.to_path_buf())),
        }
    }

    if let Some(last) = segments.pop() {
        let stem = strip_source_extension(&last);
        if stem != INDEX_STEM {
            segments.push(stem.to_string());
        }
    }

    Ok(format!("/{}", segments.join("/")))
}

/// Strips a recognized source extension, leaving other names untouched.
fn strip_source_extension(name: &str) -> &str {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && SOURCE_EXTENSIONS.contains(&ext) => stem,
        _ => name,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn root() -> PathBuf {
        PathBuf::from("/srv/app")
    }

    fn map(rel: &str) -> String {
        map_path(&root().join(ROUTER_DIR).join(rel), &root()).unwrap()
    }

    #[test]
    fn test_index_at_root_is_slash() {
        assert_eq!(map("index.ts"), "/");
        assert_eq!(map("index.rs"), "/");
        assert_eq!(map("index.js"), "/");
    }

    #[test]
    fn test_nested_index_is_directory_path() {
        assert_eq!(map("users/index.ts"), "/users");
        assert_eq!(map("api/v1/index.mjs"), "/api/v1");
    }

    #[test]
    fn test_plain_file() {
        assert_eq!(map("users/profile.ts"), "/users/profile");
        assert_eq!(map("about.tsx"), "/about");
    }

    #[test]
    fn test_segments_are_literal() {
        assert_eq!(map("users/[id].ts"), "/users/[id]");
        assert_eq!(map("users/:id/edit.js"), "/users/:id/edit");
    }

    #[test]
    fn test_only_exact_index_is_dropped() {
        assert_eq!(map("reindex.ts"), "/reindex");
        assert_eq!(map("index.html"), "/index.html");
        assert_eq!(map("index"), "/");
    }

    #[test]
    fn test_unrecognized_extension_is_kept() {
        assert_eq!(map("robots.txt"), "/robots.txt");
        assert_eq!(map("archive.tar.ts"), "/archive.tar");
    }

    #[test]
    fn test_router_dir_itself_maps_to_slash() {
        assert_eq!(map_path(&root().join(ROUTER_DIR), &root()).unwrap(), "/");
    }

    #[test]
    fn test_outside_router_dir_fails() {
        let err = map_path(Path::new("/srv/app/other/index.ts"), &root()).unwrap_err();
        assert!(matches!(err, FsRouteError::OutsideRoutingRoot(_)));
    }

    #[test]
    fn test_parent_components_fail() {
        let file = root().join(ROUTER_DIR).join("../secret.ts");
        assert!(map_path(&file, &root()).is_err());
    }

    #[test]
    fn test_router_named_ancestor_is_not_an_anchor() {
        let root = PathBuf::from("/home/router/app");
        let file = root.join(ROUTER_DIR).join("users/list.ts");
        assert_eq!(map_path(&file, &root).unwrap(), "/users/list");
    }

    #[test]
    fn test_mapping_is_deterministic() {
        let file = root().join(ROUTER_DIR).join("users/profile.ts");
        let first = map_path(&file, &root()).unwrap();
        let second = map_path(&file, &root()).unwrap();
        assert_eq!(first, second);
    }
}
