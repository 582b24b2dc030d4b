// src/recipe/acquire.rs

//! Artifact acquisition into the per-invocation working directory
//!
//! The locator lookup happens before any directory is created, so a
//! missing version leaves the filesystem untouched. Once a working
//! directory exists, any failure while populating it removes the whole
//! directory again — a half-fetched tree must never be mistaken for valid
//! Builder input.

use crate::archive;
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::platform::Settings;
use crate::recipe::format::{PatchEntry, RecipeKind, RecipeManifest};
use crate::recipe::workflow::WorkflowConfig;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, info};

/// The scratch area owned by one invocation
///
/// Ephemeral working directories are removed on drop; `keep_workdir`
/// leaves them behind for debugging. A failed acquisition removes the
/// directory either way.
#[derive(Debug)]
pub struct WorkDir {
    temp: Option<TempDir>,
    root: PathBuf,
    source_dir: PathBuf,
    license_file: Option<PathBuf>,
}

impl WorkDir {
    fn create(manifest: &RecipeManifest, version: &str, config: &WorkflowConfig) -> Result<Self> {
        let prefix = format!("galley-{}-{version}-", manifest.package.name);
        let temp = match &config.work_root {
            Some(root) => {
                fs::create_dir_all(root)?;
                tempfile::Builder::new().prefix(&prefix).tempdir_in(root)?
            }
            None => tempfile::Builder::new().prefix(&prefix).tempdir()?,
        };

        let (temp, root) = if config.keep_workdir {
            (None, temp.into_path())
        } else {
            let root = temp.path().to_path_buf();
            (Some(temp), root)
        };

        let source_dir = root.join("source");
        fs::create_dir_all(&source_dir)?;

        debug!("Working directory: {}", root.display());
        Ok(Self {
            temp,
            root,
            source_dir,
            license_file: None,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Unpacked source tree (from-source) or binary drop (prebuilt)
    pub fn source_dir(&self) -> &Path {
        &self.source_dir
    }

    /// Out-of-tree build directory used by the external tool
    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    /// License text fetched alongside a binary drop
    pub fn license_file(&self) -> Option<&Path> {
        self.license_file.as_deref()
    }

    fn discard(mut self) {
        if let Some(temp) = self.temp.take() {
            drop(temp);
        } else {
            let _ = fs::remove_dir_all(&self.root);
        }
    }
}

/// Retrieve the artifacts for `version` into a fresh working directory
pub(crate) fn acquire(
    manifest: &RecipeManifest,
    settings: &Settings,
    version: &str,
    recipe_dir: &Path,
    fetcher: &Fetcher,
    config: &WorkflowConfig,
) -> Result<WorkDir> {
    match manifest.package.kind {
        RecipeKind::Source => acquire_source(manifest, version, recipe_dir, fetcher, config),
        RecipeKind::Prebuilt => acquire_prebuilt(manifest, settings, version, fetcher, config),
    }
}

fn acquire_source(
    manifest: &RecipeManifest,
    version: &str,
    recipe_dir: &Path,
    fetcher: &Fetcher,
    config: &WorkflowConfig,
) -> Result<WorkDir> {
    let locator = manifest
        .source_locator(version)
        .ok_or_else(|| Error::MissingVersionLocator(version.to_string()))?;

    let work = WorkDir::create(manifest, version, config)?;
    let populated = (|| -> Result<()> {
        let archive_path = fetcher.fetch(&locator.url, &locator.checksum)?;
        info!("Unpacking source for {} {version}", manifest.package.name);
        archive::unpack(&archive_path, &work.source_dir, true)?;

        for entry in manifest.patches_for(version) {
            apply_patch(&work.source_dir, entry, recipe_dir)?;
        }
        Ok(())
    })();

    match populated {
        Ok(()) => Ok(work),
        Err(e) => {
            work.discard();
            Err(e)
        }
    }
}

fn acquire_prebuilt(
    manifest: &RecipeManifest,
    settings: &Settings,
    version: &str,
    fetcher: &Fetcher,
    config: &WorkflowConfig,
) -> Result<WorkDir> {
    let key = settings.platform();
    let binary = manifest
        .binary_locator(version, key)
        .ok_or_else(|| Error::MissingVersionLocator(format!("{version} for {key}")))?;
    let license = manifest
        .license_locator(version)
        .ok_or_else(|| Error::MissingVersionLocator(format!("license text for {version}")))?;

    let mut work = WorkDir::create(manifest, version, config)?;

    // Two independent fetches; both must succeed.
    let populated = (|| -> Result<PathBuf> {
        let archive_path = fetcher.fetch(&binary.url, &binary.checksum)?;
        info!("Unpacking binary drop for {} {version} ({key})", manifest.package.name);
        archive::unpack(&archive_path, &work.source_dir, false)?;

        let fetched = fetcher.fetch(&license.url, &license.checksum)?;
        let dest = work.root.join("LICENSE");
        fs::copy(&fetched, &dest)?;
        Ok(dest)
    })();

    match populated {
        Ok(license_path) => {
            work.license_file = Some(license_path);
            Ok(work)
        }
        Err(e) => {
            work.discard();
            Err(e)
        }
    }
}

/// Apply one registered patch to the unpacked source tree
///
/// Patches are unified diffs resolved relative to the recipe manifest.
/// Order matters for overlapping edits, so callers iterate the manifest's
/// list as declared.
fn apply_patch(source_dir: &Path, entry: &PatchEntry, recipe_dir: &Path) -> Result<()> {
    let patch_path = recipe_dir.join(&entry.file);
    let text = fs::read_to_string(&patch_path)
        .map_err(|e| Error::ParseError(format!("cannot read patch {}: {e}", patch_path.display())))?;

    let patch = diffy::Patch::from_str(&text)
        .map_err(|e| Error::ParseError(format!("malformed patch {}: {e}", entry.file)))?;

    let target = patch_target(&patch, entry.strip).ok_or_else(|| {
        Error::ParseError(format!("patch {} names no usable target file", entry.file))
    })?;
    let target_path = source_dir.join(&target);

    let original = fs::read_to_string(&target_path).map_err(|e| {
        Error::ParseError(format!(
            "patch {} targets missing file {}: {e}",
            entry.file,
            target.display()
        ))
    })?;

    let patched = diffy::apply(&original, &patch)
        .map_err(|e| Error::ParseError(format!("patch {} does not apply: {e}", entry.file)))?;

    fs::write(&target_path, patched)?;
    info!("Applied patch {}", entry.file);
    Ok(())
}

/// Resolve the target path from the patch header, honoring the strip level
fn patch_target(patch: &diffy::Patch<'_, str>, strip: u32) -> Option<PathBuf> {
    let name = patch.modified()?;
    let mut components = Path::new(name).components();
    for _ in 0..strip {
        components.next()?;
    }

    let rest = components.as_path();
    if rest.as_os_str().is_empty() {
        None
    } else {
        Some(rest.to_path_buf())
    }
}
