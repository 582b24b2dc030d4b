// src/recipe/export.rs

//! Consumer-facing package metadata
//!
//! A pure projection of the manifest, the platform facts, and the frozen
//! option set: calling it twice for the same invocation yields identical
//! metadata. Besides the in-memory value the workflow serializes it as
//! `galley-metadata.json` inside the package, so downstream build systems
//! can consume the package without re-deriving anything.

use crate::hash;
use crate::options::{OptionSet, OPT_SHARED};
use crate::platform::{BuildType, Settings};
use crate::recipe::format::{RecipeKind, RecipeManifest};
use serde::Serialize;

/// File name of the serialized metadata inside the package directory
pub const METADATA_FILE: &str = "galley-metadata.json";

/// What downstream consumers need to find and link the package
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    /// Canonical file name consumers look the package up by
    pub file_name: String,

    /// Consumer-facing target, `<ns>::lib`
    pub target_name: String,

    /// Link-mode alias: `<ns>::shared` or `<ns>::static`
    pub target_alias: String,

    /// Library names present under the lib directory
    pub libs: Vec<String>,

    /// Library directories, relative to the package root
    pub libdirs: Vec<String>,

    /// Include directories, relative to the package root
    pub includedirs: Vec<String>,

    /// Linker-resolved system libraries for the target OS
    pub system_libs: Vec<String>,

    /// Named system frameworks for the target OS
    pub frameworks: Vec<String>,

    /// Identity key of the produced package
    pub package_id: String,
}

/// Project the metadata for one invocation
pub(crate) fn package_info(
    manifest: &RecipeManifest,
    settings: &Settings,
    options: &OptionSet,
    version: &str,
) -> PackageMetadata {
    let meta = &manifest.metadata;
    let shared = options.get_bool(OPT_SHARED).unwrap_or(false);
    let flavor = if shared { "shared" } else { "static" };
    let os_name = settings.os.to_string();

    PackageMetadata {
        file_name: meta.file_name.clone(),
        target_name: meta.target_name.clone(),
        target_alias: format!("{}::{flavor}", meta.file_name),
        libs: vec![effective_library_name(manifest, settings.build_type)],
        libdirs: vec!["lib".to_string()],
        includedirs: vec!["include".to_string()],
        system_libs: meta.system_libs.get(&os_name).cloned().unwrap_or_default(),
        frameworks: meta.frameworks.get(&os_name).cloned().unwrap_or_default(),
        package_id: package_identity(manifest, settings, options, version),
    }
}

/// The library name for the current build configuration
///
/// From-source Debug builds produce a `d`-suffixed library; prebuilt drops
/// ship one name regardless of build type.
pub(crate) fn effective_library_name(manifest: &RecipeManifest, build_type: BuildType) -> String {
    let base = &manifest.metadata.library;
    match (manifest.package.kind, build_type) {
        (RecipeKind::Source, BuildType::Debug) => format!("{base}d"),
        _ => base.clone(),
    }
}

/// Stable identity key for the produced package
///
/// Prebuilt recipes drop compiler and build type from the key: a binary
/// drop's compatibility class is coarser than a from-source build's.
/// Compiler dialect subsettings never participate for either variant.
pub(crate) fn package_identity(
    manifest: &RecipeManifest,
    settings: &Settings,
    options: &OptionSet,
    version: &str,
) -> String {
    let mut parts = vec![
        format!("name={}", manifest.package.name),
        format!("version={version}"),
        format!("os={}", settings.os),
        format!("arch={}", settings.arch),
    ];

    if manifest.package.kind == RecipeKind::Source {
        parts.push(format!("compiler={}", settings.compiler));
        parts.push(format!("build_type={}", settings.build_type));
    }

    for (name, value) in options.iter() {
        parts.push(format!("option.{name}={value}"));
    }

    hash::sha256_hex(parts.join("\n").as_bytes())
}
