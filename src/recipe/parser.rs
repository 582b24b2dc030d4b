// src/recipe/parser.rs

//! Recipe manifest parsing and structural validation

use crate::error::{Error, Result};
use crate::hash;
use crate::options::OptionDomain;
use crate::platform::{self, Os};
use crate::recipe::format::{RecipeKind, RecipeManifest};
use std::collections::BTreeSet;
use std::path::Path;
use std::str::FromStr;

/// Parse a recipe manifest from a TOML string
pub fn parse_manifest(content: &str) -> Result<RecipeManifest> {
    toml::from_str(content).map_err(|e| Error::ParseError(format!("invalid recipe: {e}")))
}

/// Parse a recipe manifest from a file
pub fn parse_manifest_file(path: &Path) -> Result<RecipeManifest> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| Error::ParseError(format!("failed to read recipe file: {e}")))?;

    parse_manifest(&content)
}

/// Validate a manifest for completeness and internal consistency
///
/// Hard inconsistencies fail with [`Error::ParseError`]; style problems
/// come back as warnings for the caller to surface.
pub fn validate_manifest(manifest: &RecipeManifest) -> Result<Vec<String>> {
    let mut warnings = Vec::new();

    if manifest.package.name.is_empty() {
        return Err(Error::ParseError(
            "recipe package name cannot be empty".to_string(),
        ));
    }
    if manifest.platforms.supported.is_empty() {
        return Err(Error::ParseError(
            "recipe declares no supported platforms".to_string(),
        ));
    }

    match manifest.package.kind {
        RecipeKind::Source => {
            if manifest.source.is_empty() {
                return Err(Error::ParseError(
                    "source recipe declares no source locators".to_string(),
                ));
            }
            if !manifest.binaries.is_empty() || !manifest.licenses.is_empty() {
                return Err(Error::ParseError(
                    "source recipe must not declare binary or license locators".to_string(),
                ));
            }
        }
        RecipeKind::Prebuilt => {
            if manifest.binaries.is_empty() {
                return Err(Error::ParseError(
                    "prebuilt recipe declares no binary locators".to_string(),
                ));
            }
            if !manifest.source.is_empty() || !manifest.patches.is_empty() {
                return Err(Error::ParseError(
                    "prebuilt recipe must not declare source locators or patches".to_string(),
                ));
            }
            for version in manifest.binaries.keys() {
                if !manifest.licenses.contains_key(version) {
                    return Err(Error::ParseError(format!(
                        "version {version} has binaries but no license locator"
                    )));
                }
            }
        }
    }

    check_checksums(manifest)?;
    check_binary_tables(manifest, &mut warnings)?;

    if let Some(floor) = &manifest.platforms.min_glibc {
        if platform::lenient_version(floor).is_none() {
            return Err(Error::ParseError(format!(
                "invalid min_glibc version: {floor}"
            )));
        }
    }

    for (name, spec) in &manifest.options {
        if let OptionDomain::Enum(values) = &spec.domain {
            if values.is_empty() {
                return Err(Error::ParseError(format!(
                    "option {name} declares an empty value list"
                )));
            }
        }
        spec.domain
            .check(name, &spec.default)
            .map_err(|e| Error::ParseError(format!("option {name} default: {e}")))?;
    }

    check_dependency_tables(manifest)?;

    if manifest.package.kind == RecipeKind::Prebuilt
        && manifest.platforms.min_glibc.is_none()
        && manifest.platforms.supported.iter().any(|p| p.os == Os::Linux)
    {
        warnings.push(
            "prebuilt recipe supports Linux without a min_glibc floor".to_string(),
        );
    }
    if manifest.package.description.is_none() {
        warnings.push("missing package description".to_string());
    }
    if manifest.package.license.is_none() {
        warnings.push("missing package license".to_string());
    }
    for version in manifest.patches.keys() {
        if !manifest.source.contains_key(version) {
            warnings.push(format!(
                "patches registered for unknown version {version}"
            ));
        }
    }

    Ok(warnings)
}

fn check_checksums(manifest: &RecipeManifest) -> Result<()> {
    let all = manifest
        .source
        .values()
        .chain(manifest.licenses.values())
        .chain(
            manifest
                .binaries
                .values()
                .flat_map(|by_os| by_os.values())
                .flat_map(|by_arch| by_arch.values()),
        );

    for locator in all {
        if hash::parse_checksum(&locator.checksum).is_none() {
            return Err(Error::ParseError(format!(
                "invalid checksum format for {}: {} (expected sha256:<hex>)",
                locator.url, locator.checksum
            )));
        }
    }
    Ok(())
}

/// Binary tables must be keyed by recognizable OS/arch names, and should
/// stay within the declared platform matrix.
fn check_binary_tables(manifest: &RecipeManifest, warnings: &mut Vec<String>) -> Result<()> {
    for (version, by_os) in &manifest.binaries {
        for (os_name, by_arch) in by_os {
            let os = Os::from_str(os_name).map_err(|_| {
                Error::ParseError(format!(
                    "unknown OS `{os_name}` in binaries table for {version}"
                ))
            })?;
            for arch_name in by_arch.keys() {
                let arch = crate::platform::Arch::from_str(arch_name).map_err(|_| {
                    Error::ParseError(format!(
                        "unknown architecture `{arch_name}` in binaries table for {version}"
                    ))
                })?;
                let key = crate::platform::PlatformKey::new(os, arch);
                if !manifest.supports(key) {
                    warnings.push(format!(
                        "binaries for {version} include {key}, which is outside the platform matrix"
                    ));
                }
            }
        }
    }
    Ok(())
}

/// For every supported OS, exactly one of the system-library list and the
/// framework list must be non-empty.
fn check_dependency_tables(manifest: &RecipeManifest) -> Result<()> {
    let oses: BTreeSet<Os> = manifest.platforms.supported.iter().map(|p| p.os).collect();

    for os in oses {
        let name = os.to_string();
        let has_libs = manifest
            .metadata
            .system_libs
            .get(&name)
            .is_some_and(|libs| !libs.is_empty());
        let has_frameworks = manifest
            .metadata
            .frameworks
            .get(&name)
            .is_some_and(|fw| !fw.is_empty());

        match (has_libs, has_frameworks) {
            (true, true) => {
                return Err(Error::ParseError(format!(
                    "{name}: declare system libraries or frameworks, not both"
                )));
            }
            (false, false) => {
                return Err(Error::ParseError(format!(
                    "{name}: no system libraries or frameworks declared"
                )));
            }
            _ => {}
        }
    }
    Ok(())
}
