// src/recipe/workflow.rs

//! The recipe execution state machine
//!
//! One [`Workflow`] owns one invocation: validate, configure, acquire,
//! build, package, export — strictly in that order, each step starting
//! only after its predecessor succeeded. [`Workflow::run`] drives the
//! whole sequence; the individual entry points exist for package managers
//! that interleave their own bookkeeping between steps.
//!
//! Execution is single-threaded and blocking throughout. There is no
//! cancellation primitive and no internal retry: the only way an
//! invocation ends early is a step failing, which aborts everything.
//! Working and output directories are owned exclusively by the invocation;
//! the caller is responsible for isolating concurrent builds of different
//! configurations (distinct output roots per configuration).

use crate::error::Result;
use crate::fetch::Fetcher;
use crate::options::OptionSet;
use crate::platform::Settings;
use crate::recipe::acquire::{self, WorkDir};
use crate::recipe::build::{self, BuildOutput, BuildTool};
use crate::recipe::configure::{self, ToolConfig};
use crate::recipe::export::{self, PackageMetadata, METADATA_FILE};
use crate::recipe::format::{RecipeKind, RecipeManifest};
use crate::recipe::validate;
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

/// Configuration for workflow invocations
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Directory for the checksum-keyed download cache
    pub cache_dir: PathBuf,

    /// Directory under which package output areas are created
    pub output_root: PathBuf,

    /// Directory for working areas (system temp when unset)
    pub work_root: Option<PathBuf>,

    /// Keep the working directory after completion (for debugging)
    pub keep_workdir: bool,

    /// Explicit build tool location, bypassing discovery
    pub tool_path: Option<PathBuf>,

    /// Show progress bars for downloads
    pub progress: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        let cache_dir = dirs::cache_dir()
            .unwrap_or_else(std::env::temp_dir)
            .join("galley")
            .join("downloads");

        Self {
            cache_dir,
            output_root: PathBuf::from("galley-out"),
            work_root: None,
            keep_workdir: false,
            tool_path: None,
            progress: false,
        }
    }
}

/// The staged package plus its consumer metadata
#[derive(Debug, Clone)]
pub struct CookedPackage {
    pub package_dir: PathBuf,
    pub metadata: PackageMetadata,
}

/// One package-build invocation
pub struct Workflow {
    manifest: RecipeManifest,
    recipe_dir: PathBuf,
    version: String,
    settings: Settings,
    options: OptionSet,
    config: WorkflowConfig,
}

impl Workflow {
    /// Set up an invocation from a validated manifest
    ///
    /// Builds the option set from the recipe's declared defaults, with
    /// platform-pruned options already removed for the target OS.
    pub fn new(
        manifest: RecipeManifest,
        recipe_dir: impl Into<PathBuf>,
        version: impl Into<String>,
        settings: Settings,
        config: WorkflowConfig,
    ) -> Self {
        let options = OptionSet::from_schema(&manifest.options, settings.os);
        Self {
            manifest,
            recipe_dir: recipe_dir.into(),
            version: version.into(),
            settings,
            options,
            config,
        }
    }

    pub fn manifest(&self) -> &RecipeManifest {
        &self.manifest
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Override a declared option from its string form (`-o name=value`)
    pub fn set_option(&mut self, name: &str, raw: &str) -> Result<()> {
        self.options.set_str(name, raw)
    }

    /// Step 1: check the target against the platform matrix
    pub fn validate(&self) -> Result<()> {
        validate::validate(&self.manifest, &self.settings)
    }

    /// Step 2: apply implication rules and freeze the option set
    pub fn configure(&mut self) -> Result<()> {
        configure::apply_implications(&mut self.options);

        // Dialect subsettings never cross a C ABI boundary.
        self.settings.cppstd = None;
        self.settings.libcxx = None;

        self.options.freeze();
        debug!("Configured options: {:?}", self.options);
        Ok(())
    }

    /// Step 3: the effective variable map for the external build tool
    pub fn generate(&self) -> ToolConfig {
        configure::generate(&self.options)
    }

    /// Step 4: retrieve this version's artifacts into a working directory
    pub fn acquire(&self) -> Result<WorkDir> {
        let fetcher =
            Fetcher::new(self.config.cache_dir.clone())?.with_progress(self.config.progress);
        acquire::acquire(
            &self.manifest,
            &self.settings,
            &self.version,
            &self.recipe_dir,
            &fetcher,
            &self.config,
        )
    }

    /// Step 5: drive the external build tool (no-op for prebuilt recipes)
    pub fn build(&self, work: &WorkDir, tool_config: &ToolConfig) -> Result<BuildOutput> {
        let output = self.layout();

        match self.manifest.package.kind {
            RecipeKind::Source => {
                let tool = BuildTool::discover(self.config.tool_path.as_deref())?;
                build::build_source(&tool, work, tool_config)?;
            }
            RecipeKind::Prebuilt => {
                debug!("Prebuilt recipe: skipping build phases");
            }
        }

        Ok(output)
    }

    /// Step 6: stage artifacts into the package output area
    ///
    /// Verifies that every declared library actually exists under the
    /// staged lib directory, then writes the metadata document.
    pub fn package(&self, work: &WorkDir, output: &BuildOutput) -> Result<PathBuf> {
        fs::create_dir_all(&output.package_dir)?;

        match self.manifest.package.kind {
            RecipeKind::Source => {
                let tool = BuildTool::discover(self.config.tool_path.as_deref())?;
                build::install_source(&tool, work, output, &self.manifest)?;
            }
            RecipeKind::Prebuilt => {
                build::install_prebuilt(work, output)?;
            }
        }

        for lib in &output.libs {
            if !build::library_present(&output.lib_dir, lib)? {
                return Err(crate::error::Error::InstallFailed(format!(
                    "declared library {lib} not found under {}",
                    output.lib_dir.display()
                )));
            }
        }

        let metadata = self.package_info();
        let document = serde_json::to_string_pretty(&metadata).map_err(|e| {
            crate::error::Error::InstallFailed(format!("cannot serialize package metadata: {e}"))
        })?;
        fs::write(output.package_dir.join(METADATA_FILE), document)?;

        info!(
            "Packaged {} {} into {}",
            self.manifest.package.name,
            self.version,
            output.package_dir.display()
        );
        Ok(output.package_dir.clone())
    }

    /// Step 7: the consumer-facing metadata projection
    pub fn package_info(&self) -> PackageMetadata {
        export::package_info(&self.manifest, &self.settings, &self.options, &self.version)
    }

    /// Run the whole state machine for this invocation
    pub fn run(&mut self) -> Result<CookedPackage> {
        info!(
            "Cooking {} {} for {}",
            self.manifest.package.name,
            self.version,
            self.settings.platform()
        );

        self.validate()?;
        self.configure()?;
        let tool_config = self.generate();

        info!("Acquiring artifacts...");
        let work = self.acquire()?;

        info!("Building...");
        let output = self.build(&work, &tool_config)?;

        info!("Packaging...");
        let package_dir = self.package(&work, &output)?;

        Ok(CookedPackage {
            package_dir,
            metadata: self.package_info(),
        })
    }

    /// Package output layout for this invocation
    ///
    /// The directory name embeds a prefix of the package identity, so
    /// different configurations land in different output areas under the
    /// same root.
    fn layout(&self) -> BuildOutput {
        let id = export::package_identity(
            &self.manifest,
            &self.settings,
            &self.options,
            &self.version,
        );
        let dir_name = format!(
            "{}-{}-{}",
            self.manifest.package.name,
            self.version,
            &id[..12]
        );
        let package_dir = self.config.output_root.join(dir_name);

        BuildOutput {
            lib_dir: package_dir.join("lib"),
            include_dir: package_dir.join("include"),
            license_dir: package_dir.join("licenses"),
            libs: vec![export::effective_library_name(
                &self.manifest,
                self.settings.build_type,
            )],
            package_dir,
        }
    }
}
