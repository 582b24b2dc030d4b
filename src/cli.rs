// src/cli.rs

//! CLI definitions for the galley recipe workflow
//!
//! This module contains the command-line interface definitions using clap.
//! The command implementations live in `main`.

use clap::{Args, Parser, Subcommand};
use galley::{Arch, BuildType, Compiler, Os};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "galley")]
#[command(author = "Galley Project")]
#[command(version)]
#[command(
    about = "Cook native-library packages from declarative recipes",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Cook a package: validate, fetch, build, and stage it
    Cook {
        /// Path to the recipe manifest
        recipe: PathBuf,

        #[command(flatten)]
        target: TargetArgs,

        /// Output root for staged packages
        #[arg(long, default_value = "galley-out")]
        out: PathBuf,

        /// Keep the working directory after completion
        #[arg(long)]
        keep_workdir: bool,

        /// Explicit build tool path (bypasses discovery)
        #[arg(long)]
        tool: Option<PathBuf>,
    },

    /// Print the consumer metadata for a configuration without building
    Info {
        /// Path to the recipe manifest
        recipe: PathBuf,

        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Target platform facts and option overrides shared by subcommands
#[derive(Args)]
pub struct TargetArgs {
    /// Package version to cook
    #[arg(short, long)]
    pub version: String,

    /// Target operating system
    #[arg(long)]
    pub os: Os,

    /// Target architecture
    #[arg(long)]
    pub arch: Arch,

    /// Toolchain compiler
    #[arg(long, default_value = "gcc")]
    pub compiler: Compiler,

    /// Build configuration
    #[arg(long, default_value = "Release")]
    pub build_type: BuildType,

    /// Option overrides, `name=value` (repeatable)
    #[arg(short = 'o', long = "option", value_name = "NAME=VALUE")]
    pub options: Vec<String>,
}
