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
    version,
    about = "Dimuon CLI - Select opposite-charge muon pairs and fill weighted cutflow histograms for collision and simulated samples.",
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

    /// Set the number of threads used when several jobs run at once.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the analysis over one job slice (or all of them) of a sample.
    Run(RunArgs),
    /// Partition a sample's input files into per-job file lists.
    Split(SplitArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    // --- Core Arguments ---
    /// Sample name, used to look up triggers, normalization and flags in the config.
    #[arg(short, long, required = true, value_name = "NAME")]
    pub sample: String,

    /// Data-taking era, used to organize the output directory.
    #[arg(short, long, required = true, value_name = "ERA")]
    pub era: String,

    /// Path to the era configuration file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub config: PathBuf,

    /// Directory holding the sample's `.list` files.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Directory receiving `<era>/<sample>/<sample>_<idx>.csv` histogram files.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output_dir: PathBuf,

    #[command(flatten)]
    pub jobs: JobSelection,

    // --- Overrides ---
    /// Override `processing.files-per-job` from the config file.
    #[arg(long, value_name = "INT")]
    pub files_per_job: Option<usize>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S muon.leading-pt=30
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Which job slices to process; exactly one must be given.
#[derive(Args, Debug, Clone, Copy)]
#[group(required = true, multiple = false)]
pub struct JobSelection {
    /// Process the job slice with this index.
    #[arg(long, value_name = "INT")]
    pub job_index: Option<usize>,
    /// Process every job slice, in parallel.
    #[arg(long)]
    pub all_jobs: bool,
}

/// Arguments for the `split` subcommand.
#[derive(Args, Debug)]
pub struct SplitArgs {
    /// Sample name, used to name the job lists.
    #[arg(short, long, required = true, value_name = "NAME")]
    pub sample: String,

    /// Directory holding the sample's `.list` files.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub input_dir: PathBuf,

    /// Directory receiving the `<sample>_<idx>.list` files.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output_dir: PathBuf,

    /// Number of input files per job.
    #[arg(long, value_name = "INT", default_value_t = crate::dataset::DEFAULT_FILES_PER_JOB)]
    pub files_per_job: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_requires_exactly_one_job_selection() {
        let base = [
            "dimuon", "run", "-s", "DYJetsToLL", "-e", "2018", "-c", "config.toml", "-i", "lists",
            "-o", "out",
        ];

        let missing = Cli::try_parse_from(base);
        assert!(missing.is_err());

        let both = Cli::try_parse_from(base.iter().chain(&["--job-index", "2", "--all-jobs"]));
        assert!(both.is_err());

        let cli = Cli::try_parse_from(base.iter().chain(&["--job-index", "2"])).unwrap();
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.jobs.job_index, Some(2));
                assert!(!args.jobs.all_jobs);
            }
            _ => panic!("Expected 'run' subcommand"),
        }
    }

    #[test]
    fn split_uses_default_files_per_job() {
        let cli =
            Cli::try_parse_from(["dimuon", "split", "-s", "TTTo2L2Nu", "-i", "in", "-o", "out"])
                .unwrap();
        match cli.command {
            Commands::Split(args) => {
                assert_eq!(args.files_per_job, crate::dataset::DEFAULT_FILES_PER_JOB)
            }
            _ => panic!("Expected 'split' subcommand"),
        }
    }

    #[test]
    fn global_flags_are_accepted_after_subcommand() {
        let cli = Cli::try_parse_from([
            "dimuon", "split", "-s", "S", "-i", "in", "-o", "out", "-vv", "-j", "4",
        ])
        .unwrap();
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.threads, Some(4));
    }
}
