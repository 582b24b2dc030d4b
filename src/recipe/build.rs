// src/recipe/build.rs

//! External tool invocation and artifact staging
//!
//! The build tool is an opaque subprocess: it receives the source and
//! build directories plus the effective variable map, and emits artifacts.
//! Its output is the diagnostic surface on failure and is never
//! reinterpreted. Prebuilt recipes skip the tool entirely and stage the
//! fetched drop directly.

use crate::error::{Error, Result};
use crate::recipe::acquire::WorkDir;
use crate::recipe::configure::ToolConfig;
use crate::recipe::format::RecipeManifest;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info};
use walkdir::WalkDir;

/// Default external build tool searched on PATH
const DEFAULT_TOOL: &str = "cmake";

/// Environment variable overriding the build tool location
const TOOL_ENV: &str = "GALLEY_BUILD_TOOL";

/// Artifact locations and declared library names for one invocation
#[derive(Debug, Clone)]
pub struct BuildOutput {
    /// Package output area owned by this invocation
    pub package_dir: PathBuf,
    pub lib_dir: PathBuf,
    pub include_dir: PathBuf,
    pub license_dir: PathBuf,

    /// Library base names the package declares to consumers
    pub libs: Vec<String>,
}

/// Handle to the external build tool
#[derive(Debug, Clone)]
pub struct BuildTool {
    program: PathBuf,
}

impl BuildTool {
    /// Locate the build tool
    ///
    /// Priority order: explicit override, `GALLEY_BUILD_TOOL` environment
    /// variable, then `cmake` on PATH.
    pub fn discover(override_path: Option<&Path>) -> Result<Self> {
        if let Some(path) = override_path {
            if path.exists() {
                return Ok(Self {
                    program: path.to_path_buf(),
                });
            }
            return Err(Error::BuildFailed {
                phase: "toolchain".to_string(),
                detail: format!("build tool {} does not exist", path.display()),
            });
        }

        if let Ok(env_tool) = std::env::var(TOOL_ENV) {
            let path = PathBuf::from(env_tool);
            if path.exists() {
                return Ok(Self { program: path });
            }
        }

        let program = which::which(DEFAULT_TOOL).map_err(|e| Error::BuildFailed {
            phase: "toolchain".to_string(),
            detail: format!("no build tool found: {e}"),
        })?;
        Ok(Self { program })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }
}

/// Run the configure and build phases against the acquired source tree
pub(crate) fn build_source(tool: &BuildTool, work: &WorkDir, config: &ToolConfig) -> Result<()> {
    let build_dir = work.build_dir();
    fs::create_dir_all(&build_dir)?;

    let mut args: Vec<String> = vec![
        "-S".to_string(),
        work.source_dir().display().to_string(),
        "-B".to_string(),
        build_dir.display().to_string(),
    ];
    args.extend(config.define_args());
    run_phase(tool, "configure", &args)?;

    run_phase(
        tool,
        "build",
        &["--build".to_string(), build_dir.display().to_string()],
    )
}

/// Run the install phase and copy the source tree's license file
pub(crate) fn install_source(
    tool: &BuildTool,
    work: &WorkDir,
    output: &BuildOutput,
    manifest: &RecipeManifest,
) -> Result<()> {
    run_phase(
        tool,
        "install",
        &[
            "--install".to_string(),
            work.build_dir().display().to_string(),
            "--prefix".to_string(),
            output.package_dir.display().to_string(),
        ],
    )?;

    let license_name = &manifest.package.license_file;
    let license_src = work.source_dir().join(license_name);
    if !license_src.is_file() {
        return Err(Error::InstallFailed(format!(
            "license file {license_name} not found in source tree"
        )));
    }
    fs::create_dir_all(&output.license_dir)?;
    fs::copy(&license_src, output.license_dir.join(license_name))?;

    Ok(())
}

/// Stage a prebuilt binary drop into the package output area
pub(crate) fn install_prebuilt(work: &WorkDir, output: &BuildOutput) -> Result<()> {
    let drop_lib = work.source_dir().join("lib");
    if !drop_lib.is_dir() {
        return Err(Error::InstallFailed(
            "binary drop has no lib directory".to_string(),
        ));
    }
    copy_tree(&drop_lib, &output.lib_dir)?;

    let drop_include = work.source_dir().join("include");
    if drop_include.is_dir() {
        copy_tree(&drop_include, &output.include_dir)?;
    }

    let license = work
        .license_file()
        .ok_or_else(|| Error::InstallFailed("no license file was acquired".to_string()))?;
    fs::create_dir_all(&output.license_dir)?;
    fs::copy(license, output.license_dir.join("LICENSE"))?;

    Ok(())
}

/// Whether a file matching the library base name exists under `lib_dir`
pub(crate) fn library_present(lib_dir: &Path, name: &str) -> Result<bool> {
    if !lib_dir.is_dir() {
        return Ok(false);
    }

    for entry in fs::read_dir(lib_dir)? {
        let entry = entry?;
        let file_name = entry.file_name();
        if stem_matches(&file_name.to_string_lossy(), name) {
            return Ok(true);
        }
    }
    Ok(false)
}

/// Match `libquill.so.1`, `libquill.a`, `quill.dll`, ... against `quill`,
/// without matching the debug-suffixed `quilld` variants.
fn stem_matches(file: &str, name: &str) -> bool {
    let base = file.strip_prefix("lib").unwrap_or(file);
    let base = base.split('.').next().unwrap_or(base);
    base == name
}

fn run_phase(tool: &BuildTool, phase: &str, args: &[String]) -> Result<()> {
    info!("Running {phase} phase");
    debug!("{} {}", tool.program().display(), args.join(" "));

    let output = Command::new(tool.program())
        .args(args)
        .output()
        .map_err(|e| Error::BuildFailed {
            phase: phase.to_string(),
            detail: format!("failed to launch {}: {e}", tool.program().display()),
        })?;

    if !output.status.success() {
        let mut detail = format!("exit status {:?}", output.status.code());
        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stdout.trim().is_empty() {
            detail.push_str("\nstdout:\n");
            detail.push_str(stdout.trim_end());
        }
        if !stderr.trim().is_empty() {
            detail.push_str("\nstderr:\n");
            detail.push_str(stderr.trim_end());
        }
        return Err(Error::BuildFailed {
            phase: phase.to_string(),
            detail,
        });
    }

    Ok(())
}

fn copy_tree(src: &Path, dest: &Path) -> Result<()> {
    for entry in WalkDir::new(src) {
        let entry =
            entry.map_err(|e| Error::InstallFailed(format!("cannot walk {}: {e}", src.display())))?;
        let relative = entry.path().strip_prefix(src).map_err(|e| {
            Error::InstallFailed(format!("walk escaped {}: {e}", src.display()))
        })?;
        if relative.as_os_str().is_empty() {
            continue;
        }

        let target = dest.join(relative);
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
    }
    Ok(())
}
