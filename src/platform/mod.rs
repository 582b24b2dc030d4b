// src/platform/mod.rs

//! Platform facts supplied by the invoking package manager
//!
//! A recipe never probes its target: the package manager states the target
//! operating system, architecture, compiler, and build configuration up
//! front, and the workflow validates that statement against the recipe's
//! supported-platform matrix. The one local probe in this module — the
//! glibc version — exists for prebuilt recipes, whose binaries carry a
//! fixed ABI expectation against the system C library.

use semver::Version;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::process::Command;
use strum_macros::{Display, EnumString};

/// Target operating system
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Os {
    Windows,
    Linux,
    Macos,
}

/// Target CPU architecture
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Arch {
    X86_64,
    Armv6,
    Armv7hf,
    Armv8,
}

/// Toolchain compiler family
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, Display, EnumString,
)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
#[serde(rename_all = "lowercase")]
pub enum Compiler {
    Gcc,
    Clang,
    Msvc,
    AppleClang,
}

/// Build configuration
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash,
    Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum BuildType {
    Release,
    Debug,
}

/// The (OS, architecture) pair matched against a recipe's platform matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlatformKey {
    pub os: Os,
    pub arch: Arch,
}

impl PlatformKey {
    pub fn new(os: Os, arch: Arch) -> Self {
        Self { os, arch }
    }
}

impl fmt::Display for PlatformKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.os, self.arch)
    }
}

/// The full set of platform facts for one invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub os: Os,
    pub arch: Arch,
    pub compiler: Compiler,
    pub build_type: BuildType,

    /// C++ dialect subsettings. Irrelevant across a C ABI boundary; the
    /// configuration step clears them so they never reach the build tool
    /// or the package identity.
    pub cppstd: Option<String>,
    pub libcxx: Option<String>,
}

impl Settings {
    pub fn new(os: Os, arch: Arch, compiler: Compiler, build_type: BuildType) -> Self {
        Self {
            os,
            arch,
            compiler,
            build_type,
            cppstd: None,
            libcxx: None,
        }
    }

    /// The (OS, arch) projection used for matrix membership and locator lookup
    pub fn platform(&self) -> PlatformKey {
        PlatformKey::new(self.os, self.arch)
    }
}

/// Installed glibc version, if the local loader reports one
///
/// Returns `None` on systems without glibc (or without `ldd` at all);
/// callers treat that as "no floor to enforce", matching the behavior of
/// non-glibc Linux targets.
pub fn local_glibc_version() -> Option<Version> {
    let output = Command::new("ldd").arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    parse_glibc_banner(&String::from_utf8_lossy(&output.stdout))
}

/// Extract the version from an `ldd --version` banner line
///
/// The banner's first line ends with the version, e.g.
/// `ldd (GNU libc) 2.35` or `ldd (Ubuntu GLIBC 2.35-0ubuntu3) 2.35`.
fn parse_glibc_banner(text: &str) -> Option<Version> {
    let first = text.lines().next()?;
    if !first.to_ascii_lowercase().contains("libc") {
        return None;
    }
    let token = first.split_whitespace().next_back()?;
    lenient_version(token)
}

/// Parse `2.29`-style version strings, padding to semver's three fields
pub fn lenient_version(text: &str) -> Option<Version> {
    let padded = match text.split('.').count() {
        1 => format!("{text}.0.0"),
        2 => format!("{text}.0"),
        _ => text.to_string(),
    };
    Version::parse(&padded).ok()
}
