//! All the CLI arguments for Driftfield

/// The default name of the main config file.
pub const DEFAULT_CONFIG_FILE_NAME: &str = "driftfield.toml";

/// Drifting particle fields in your terminal.
#[derive(clap::Parser, Debug, Clone)]
#[command(
    version,
    about,
    long_about = "A cloud of particles, pulled home and pushed around by drifting forces and \
                  by your mouse. Click to scatter them."
)]
#[non_exhaustive]
pub struct CliArgs {
    /// Use a custom config directory.
    #[arg(long)]
    pub config_dir: Option<std::path::PathBuf>,

    /// The name of the main config file, inside the config directory.
    #[arg(long, default_value = DEFAULT_CONFIG_FILE_NAME)]
    pub main_config: std::path::PathBuf,

    /// Override the log level from the config.
    #[arg(long, value_enum)]
    pub log_level: Option<crate::config::main::LogLevel>,

    /// Override the log path from the config.
    #[arg(long)]
    pub log_path: Option<std::path::PathBuf>,

    /// Number of particles.
    #[arg(short, long)]
    pub particles: Option<usize>,

    /// Number of autonomous forces, not counting the mouse.
    #[arg(short, long)]
    pub forces: Option<usize>,

    /// Where to save SVG snapshots.
    #[arg(long)]
    pub snapshot_path: Option<std::path::PathBuf>,

    /// Set any simulation parameter, eg `--set x_friction=0.9`. Can be repeated.
    #[arg(long = "set", value_parser = parse_parameter_assignment)]
    pub parameters: Vec<(driftfield_engine::params::Parameter, f64)>,
}

/// Let `clap` understand `name=value` parameter assignments.
fn parse_parameter_assignment(
    assignment: &str,
) -> Result<(driftfield_engine::params::Parameter, f64), String> {
    driftfield_engine::params::parse_assignment(assignment).map_err(|error| error.to_string())
}
