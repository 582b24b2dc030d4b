// src/lib.rs

//! Galley: recipe workflow for packaging native libraries
//!
//! Galley turns a versioned source tree (or a set of prebuilt binary
//! artifacts) for a native library into an installable package for a
//! target platform/toolchain combination. The invoking package manager
//! supplies the platform facts; a declarative TOML recipe supplies
//! everything else.
//!
//! # Architecture
//!
//! - Recipes: declarative manifests — platform matrix, option schema,
//!   version locators, consumer metadata
//! - Two variants: build-from-source and consume-prebuilt, selected once
//!   per recipe
//! - Strict step ordering: validate, configure, acquire, build, package,
//!   export — each gate passes before the next begins
//! - Typed failures: every step aborts the invocation with one error from
//!   a fixed taxonomy, never retried internally

pub mod archive;
mod error;
pub mod fetch;
pub mod hash;
pub mod options;
pub mod platform;
pub mod recipe;

pub use error::{Error, Result};
pub use options::{OptionDomain, OptionSet, OptionSpec, OptionValue};
pub use platform::{Arch, BuildType, Compiler, Os, PlatformKey, Settings};
pub use recipe::{
    BuildOutput, CookedPackage, PackageMetadata, RecipeKind, RecipeManifest, ToolConfig, WorkDir,
    Workflow, WorkflowConfig,
};
