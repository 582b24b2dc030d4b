// src/recipe/validate.rs

//! Platform validation, the first gate of every invocation
//!
//! Validation is read-only and runs before any network or build-tool
//! activity: an unsupported target must fail here, never after artifacts
//! have been fetched or a working directory created.

use crate::error::{Error, Result};
use crate::platform::{self, Os, Settings};
use crate::recipe::format::{RecipeKind, RecipeManifest};
use semver::Version;

/// Check the target against the recipe's platform matrix and constraints
pub fn validate(manifest: &RecipeManifest, settings: &Settings) -> Result<()> {
    let glibc = if needs_glibc_probe(manifest, settings) {
        platform::local_glibc_version()
    } else {
        None
    };

    validate_against(manifest, settings, glibc.as_ref())
}

fn needs_glibc_probe(manifest: &RecipeManifest, settings: &Settings) -> bool {
    manifest.package.kind == RecipeKind::Prebuilt
        && settings.os == Os::Linux
        && manifest.platforms.min_glibc.is_some()
}

/// Matrix and constraint checks with an explicit glibc probe result
///
/// A `None` probe means the local loader reported no glibc version; the
/// floor is then not enforced, matching non-glibc Linux systems where the
/// constraint does not apply.
pub(crate) fn validate_against(
    manifest: &RecipeManifest,
    settings: &Settings,
    local_glibc: Option<&Version>,
) -> Result<()> {
    let key = settings.platform();
    if !manifest.supports(key) {
        return Err(Error::UnsupportedConfiguration(format!(
            "{key} combination is not supported"
        )));
    }

    // The glibc floor applies only to prebuilt binaries: a from-source
    // build recompiles against whatever is locally available, a binary
    // drop carries a fixed ABI expectation.
    if manifest.package.kind == RecipeKind::Prebuilt && settings.os == Os::Linux {
        if let (Some(floor), Some(local)) = (&manifest.platforms.min_glibc, local_glibc) {
            let floor = platform::lenient_version(floor).ok_or_else(|| {
                Error::ParseError(format!("invalid min_glibc version: {floor}"))
            })?;
            if *local < floor {
                return Err(Error::UnsupportedConfiguration(format!(
                    "prebuilt binaries require glibc >= {floor}, found {local}"
                )));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::{Arch, BuildType, Compiler};
    use crate::recipe::format::tests::{PREBUILT_RECIPE, SOURCE_RECIPE};
    use crate::recipe::parser::parse_manifest;

    fn settings(os: Os, arch: Arch) -> Settings {
        Settings::new(os, arch, Compiler::Gcc, BuildType::Release)
    }

    #[test]
    fn test_supported_pair_passes() {
        let manifest = parse_manifest(SOURCE_RECIPE).unwrap();
        validate(&manifest, &settings(Os::Macos, Arch::Armv8)).unwrap();
    }

    #[test]
    fn test_unsupported_pair_names_the_combination() {
        let manifest = parse_manifest(SOURCE_RECIPE).unwrap();

        let err = validate(&manifest, &settings(Os::Windows, Arch::Armv8)).unwrap_err();
        match err {
            Error::UnsupportedConfiguration(msg) => {
                assert!(msg.contains("Windows/armv8"), "unexpected message: {msg}");
            }
            other => panic!("expected UnsupportedConfiguration, got {other:?}"),
        }
    }

    #[test]
    fn test_glibc_floor_enforced_for_prebuilt() {
        let manifest = parse_manifest(PREBUILT_RECIPE).unwrap();
        let linux = settings(Os::Linux, Arch::X86_64);

        let old = Version::new(2, 27, 0);
        let err = validate_against(&manifest, &linux, Some(&old)).unwrap_err();
        assert!(matches!(err, Error::UnsupportedConfiguration(_)));

        let new = Version::new(2, 35, 0);
        validate_against(&manifest, &linux, Some(&new)).unwrap();

        // No probe result: the floor is not enforced.
        validate_against(&manifest, &linux, None).unwrap();
    }

    #[test]
    fn test_glibc_floor_ignored_for_source_and_other_oses() {
        let source = parse_manifest(SOURCE_RECIPE).unwrap();
        let old = Version::new(1, 0, 0);
        validate_against(&source, &settings(Os::Linux, Arch::X86_64), Some(&old)).unwrap();

        let prebuilt = parse_manifest(PREBUILT_RECIPE).unwrap();
        validate_against(&prebuilt, &settings(Os::Macos, Arch::Armv8), Some(&old)).unwrap();
    }
}
