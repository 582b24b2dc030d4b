// src/recipe/format.rs

//! Recipe manifest format
//!
//! Recipes are TOML files that describe how one native library becomes an
//! installable package: the supported platform matrix, the declared build
//! options, where each version's artifacts live, and what downstream
//! consumers need to link against the result.
//!
//! # Example (from-source recipe)
//!
//! ```toml
//! [package]
//! name = "quill"
//! kind = "source"
//! description = "C bindings for the Quill messaging library"
//!
//! [platforms]
//! supported = [
//!     { os = "Linux", arch = "x86_64" },
//!     { os = "Macos", arch = "armv8" },
//! ]
//!
//! [options.shared]
//! domain = "bool"
//! default = false
//!
//! [options.fPIC]
//! domain = "bool"
//! default = true
//! remove_on = ["Windows"]
//!
//! [source."1.0.0"]
//! url = "https://example.com/quill-1.0.0.tar.gz"
//! checksum = "sha256:aa11..."
//!
//! [[patches."1.0.0"]]
//! file = "patches/0001-fix-endianness.patch"
//!
//! [metadata]
//! file_name = "quill"
//! target_name = "quill::lib"
//! library = "quill"
//!
//! [metadata.system_libs]
//! Linux = ["rt", "pthread", "m", "dl"]
//!
//! [metadata.frameworks]
//! Macos = ["Foundation", "Security"]
//! ```
//!
//! A prebuilt recipe replaces `[source]` with per-platform `[binaries]`
//! tables and a `[licenses]` table, both keyed by version; the binary
//! tables are further keyed by OS and architecture name.

use crate::options::OptionSpec;
use crate::platform::PlatformKey;
use serde::Deserialize;
use std::collections::BTreeMap;

/// A complete recipe manifest
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeManifest {
    /// Package identity and variant
    pub package: PackageSection,

    /// Supported platform matrix and platform constraints
    pub platforms: PlatformsSection,

    /// Declared build options
    #[serde(default)]
    pub options: BTreeMap<String, OptionSpec>,

    /// version -> source archive locator (from-source recipes)
    #[serde(default)]
    pub source: BTreeMap<String, Locator>,

    /// version -> patches applied in listed order (from-source recipes)
    #[serde(default)]
    pub patches: BTreeMap<String, Vec<PatchEntry>>,

    /// version -> OS name -> arch name -> binary archive locator
    /// (prebuilt recipes)
    #[serde(default)]
    pub binaries: BTreeMap<String, BTreeMap<String, BTreeMap<String, Locator>>>,

    /// version -> license text locator (prebuilt recipes)
    #[serde(default)]
    pub licenses: BTreeMap<String, Locator>,

    /// Consumer-facing metadata tables
    pub metadata: MetadataSection,
}

impl RecipeManifest {
    /// Check the platform matrix for a target pair
    pub fn supports(&self, key: PlatformKey) -> bool {
        self.platforms.supported.iter().any(|p| *p == key)
    }

    pub fn source_locator(&self, version: &str) -> Option<&Locator> {
        self.source.get(version)
    }

    pub fn binary_locator(&self, version: &str, key: PlatformKey) -> Option<&Locator> {
        self.binaries
            .get(version)?
            .get(&key.os.to_string())?
            .get(&key.arch.to_string())
    }

    pub fn license_locator(&self, version: &str) -> Option<&Locator> {
        self.licenses.get(version)
    }

    /// Patches registered for a version, in application order
    pub fn patches_for(&self, version: &str) -> &[PatchEntry] {
        self.patches.get(version).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Package metadata section
#[derive(Debug, Clone, Deserialize)]
pub struct PackageSection {
    /// Package name
    pub name: String,

    /// Recipe variant, chosen once per recipe
    pub kind: RecipeKind,

    /// Short description
    #[serde(default)]
    pub description: Option<String>,

    /// License identifier (SPDX)
    #[serde(default)]
    pub license: Option<String>,

    /// Homepage URL
    #[serde(default)]
    pub homepage: Option<String>,

    /// License file name inside the source tree (from-source recipes)
    #[serde(default = "default_license_file")]
    pub license_file: String,
}

fn default_license_file() -> String {
    "LICENSE".to_string()
}

/// The two recipe variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecipeKind {
    /// Fetch a source tree and drive the external build tool
    Source,
    /// Fetch prebuilt binaries and stage them directly
    Prebuilt,
}

/// Supported platforms and platform-level constraints
#[derive(Debug, Clone, Deserialize)]
pub struct PlatformsSection {
    /// Supported (OS, architecture) pairs
    pub supported: Vec<PlatformKey>,

    /// Minimum glibc accepted by prebuilt binaries on Linux
    #[serde(default)]
    pub min_glibc: Option<String>,
}

/// A fetchable artifact: URL plus `sha256:` checksum
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Locator {
    pub url: String,
    pub checksum: String,
}

/// One registered source patch
#[derive(Debug, Clone, Deserialize)]
pub struct PatchEntry {
    /// Patch file path, relative to the recipe manifest
    pub file: String,

    /// Path components stripped from the file names in the patch header
    #[serde(default = "default_strip")]
    pub strip: u32,
}

fn default_strip() -> u32 {
    1
}

/// Consumer-facing metadata tables
#[derive(Debug, Clone, Deserialize)]
pub struct MetadataSection {
    /// Canonical file name consumers look the package up by
    pub file_name: String,

    /// Consumer-facing target, `<ns>::lib`
    pub target_name: String,

    /// Base library name; from-source Debug builds get a `d` suffix
    pub library: String,

    /// OS name -> linker-resolved system libraries
    #[serde(default)]
    pub system_libs: BTreeMap<String, Vec<String>>,

    /// OS name -> named system frameworks
    #[serde(default)]
    pub frameworks: BTreeMap<String, Vec<String>>,
}
