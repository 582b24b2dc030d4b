// src/archive.rs

//! Archive extraction for fetched source trees and binary drops
//!
//! Source archives almost always wrap their contents in a top-level
//! `name-version/` directory whose exact name varies with how the archive
//! was produced. Extracting with `strip_root` removes that wrapper so the
//! rest of the workflow sees stable paths. Binary drops ship `lib/` and
//! `include/` at the archive root and are extracted as-is.

use crate::error::{Error, Result};
use flate2::read::GzDecoder;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::Archive;
use xz2::read::XzDecoder;

/// Extract an archive into `dest`, detecting the format from the file name
pub fn unpack(archive: &Path, dest: &Path, strip_root: bool) -> Result<()> {
    let name = archive.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let file = File::open(archive)?;

    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        unpack_tar(GzDecoder::new(file), dest, strip_root)
    } else if name.ends_with(".tar.xz") || name.ends_with(".txz") {
        unpack_tar(XzDecoder::new(file), dest, strip_root)
    } else if name.ends_with(".tar") {
        unpack_tar(file, dest, strip_root)
    } else {
        Err(Error::ParseError(format!(
            "unrecognized archive format: {name}"
        )))
    }
}

fn unpack_tar<R: Read>(reader: R, dest: &Path, strip_root: bool) -> Result<()> {
    fs::create_dir_all(dest)?;
    let mut tar = Archive::new(reader);

    for entry in tar.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.into_owned();

        let relative: PathBuf = if strip_root {
            let mut components = path.components();
            components.next();
            components.as_path().to_path_buf()
        } else {
            path
        };

        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        entry.unpack(&target)?;
    }

    Ok(())
}
