#![allow(dead_code)]

use std::fs;
use std::path::Path;
use std::sync::Arc;

use oxide_fsroute::{FileRouter, ModuleRegistry, ROUTER_DIR};
use oxide_http::{App, Method, Request, Response};
use tempfile::TempDir;

/// Creates a routing root containing empty files at the given router-relative paths.
pub fn routing_root(files: &[&str]) -> TempDir {
    let dir = tempfile::tempdir().expect("create temp dir");
    let router = dir.path().join(ROUTER_DIR);
    fs::create_dir_all(&router).expect("create router dir");
    for file in files {
        touch(dir.path(), file);
    }
    dir
}

pub fn touch(root: &Path, relative: &str) {
    let path = root.join(ROUTER_DIR).join(relative);
    fs::create_dir_all(path.parent().expect("file has a parent")).expect("create parent dirs");
    fs::write(path, "").expect("write route file");
}

pub async fn build(root: &TempDir, registry: ModuleRegistry) -> Arc<App> {
    FileRouter::new(root.path(), registry)
        .build()
        .await
        .unwrap_or_else(|e| panic!("Failed to build router: {e}"))
}

pub async fn send(app: &App, method: Method, path: &str) -> Response {
    app.handle(Request::new(method, path)).await
}

pub fn body(res: &Response) -> String {
    res.body_string().unwrap_or_default()
}
