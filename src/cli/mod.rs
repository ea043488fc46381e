// Command-line surface: argument definitions and the handlers behind them.
mod commands;
mod display;

pub use commands::run;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

const AFTER_HELP: &str = "\
Examples:
  inoyb check                    Check the project structure
  inoyb build                    Build a Docker image (CPU, includes GDAL)
  inoyb build --gpu              Build a GPU image (GDAL + CUDA)
  inoyb push                     Push the most recent image
  inoyb deploy                   Build and push in one step
  inoyb images list              List built images
  inoyb images clean --keep 5    Prune old images
  inoyb config list              Show configuration
  inoyb config set docker.host tcp://my-server:2376
";

/// Build, manage and ship Docker images for mc.json-based model services
#[derive(Parser)]
#[command(name = "inoyb", version, after_help = AFTER_HELP, arg_required_else_help = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check that a project satisfies the build requirements
    Check {
        /// Project path
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
    /// Build a Docker image from the project sources
    Build {
        /// Project path
        #[arg(long, default_value = ".")]
        path: PathBuf,
        /// Build the GPU variant
        #[arg(long)]
        gpu: bool,
    },
    /// Push an image to the remote Docker server
    Push {
        /// Image name (defaults to the most recently built image)
        #[arg(long)]
        image: Option<String>,
    },
    /// Manage built images
    Images {
        #[command(subcommand)]
        action: ImagesAction,
    },
    /// Manage tool configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Build and push in one step
    Deploy {
        /// Project path
        #[arg(long, default_value = ".")]
        path: PathBuf,
        /// Build the GPU variant
        #[arg(long)]
        gpu: bool,
    },
}

#[derive(Subcommand)]
pub enum ImagesAction {
    /// List local (and, when reachable, remote) images
    List,
    /// Remove old images, keeping the newest few per project
    Clean {
        /// How many images to keep per project
        #[arg(long)]
        keep: Option<usize>,
    },
    /// Remove a single image
    Rm {
        /// Image name
        name: String,
    },
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Set a configuration value (`docker.host <addr>` or `default`)
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: Option<String>,
    },
    /// Show the current configuration
    List,
}
