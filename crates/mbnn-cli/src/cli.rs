use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "MBNN Developers",
    version,
    about = "MBNN CLI - Evaluate a many-body neural-network potential on water dimers and trimers.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Evaluate the energy (and optionally the gradient) of every frame in an XYZ file.
    Energy(EnergyArgs),
    /// Summarize a model: topology, atom types, feature dimensions and switch.
    Info(InfoArgs),
}

/// Arguments for the `energy` subcommand.
#[derive(Args, Debug)]
pub struct EnergyArgs {
    /// Path to the model manifest (TOML).
    #[arg(short, long, value_name = "PATH")]
    pub model: Option<PathBuf>,

    /// Path to the input XYZ file; every frame is one configuration.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Also compute the gradient with respect to every coordinate.
    #[arg(short, long)]
    pub gradient: bool,

    /// Write the gradient as an XYZ file, one frame per configuration.
    /// Implies --gradient.
    #[arg(long, value_name = "PATH")]
    pub gradient_output: Option<PathBuf>,

    /// Print the switched energy of every configuration.
    #[arg(long)]
    pub per_cluster: bool,

    /// Evaluate in single precision instead of double.
    #[arg(long)]
    pub single_precision: bool,

    /// Warn instead of failing when the file's atom labels disagree with the model.
    #[arg(long)]
    pub lenient_labels: bool,

    /// Override the energy unit conversion factor of the model.
    #[arg(long, value_name = "FLOAT")]
    pub energy_unit: Option<f64>,

    /// Path to an optional configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to the model manifest (TOML).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub model: PathBuf,
}
