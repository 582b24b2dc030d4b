// src/recipe/mod.rs

//! Recipe execution: from a declarative manifest to a staged package
//!
//! A recipe describes how one native library becomes an installable
//! package for a target platform/toolchain combination. Execution is a
//! fixed state machine:
//!
//! 1. **Validate** — platform matrix membership and platform constraints;
//!    read-only and first, before any expensive work
//! 2. **Configure** — option implication rules, then freeze
//! 3. **Generate** — the effective variable map for the build tool
//! 4. **Acquire** — fetch sources or binaries into a working directory
//! 5. **Build** — drive the external build tool (from-source only)
//! 6. **Package** — stage libraries, headers, and license text
//! 7. **Export** — publish consumer metadata
//!
//! There are two recipe variants, chosen once per recipe: **from-source**
//! fetches a source archive, patches it, and drives the external build
//! tool; **prebuilt** fetches a binary drop plus its license text and
//! stages them directly, skipping configure/build. Validation and
//! metadata export are shared between the variants.

mod acquire;
mod build;
mod configure;
mod export;
pub mod format;
pub mod parser;
mod validate;
mod workflow;

pub use acquire::WorkDir;
pub use build::{BuildOutput, BuildTool};
pub use configure::ToolConfig;
pub use export::{PackageMetadata, METADATA_FILE};
pub use format::{
    Locator, MetadataSection, PackageSection, PatchEntry, PlatformsSection, RecipeKind,
    RecipeManifest,
};
pub use parser::{parse_manifest, parse_manifest_file, validate_manifest};
pub use workflow::{CookedPackage, Workflow, WorkflowConfig};
