// tests/common/mod.rs

//! Shared test utilities and helpers for integration tests.

#![allow(dead_code)]

use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::File;
use std::path::Path;

/// Pack the contents of `root` into a gzipped tarball at `dest`, with
/// every entry placed under `prefix` (use "." for no wrapper directory).
pub fn tar_gz(dest: &Path, prefix: &str, root: &Path) {
    let file = File::create(dest).unwrap();
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    builder.append_dir_all(prefix, root).unwrap();
    builder.into_inner().unwrap().finish().unwrap();
}

/// `sha256:<hex>` checksum string for a file on disk
pub fn checksum_of(path: &Path) -> String {
    format!("sha256:{}", galley::hash::sha256_file(path).unwrap())
}

/// `file://` locator URL for a local path
pub fn file_url(path: &Path) -> String {
    format!("file://{}", path.display())
}
