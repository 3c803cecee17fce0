use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "kube-score")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Kubernetes object analysis with recommendations for improved reliability and security")]
#[command(long_about = "kube-score is a tool that does static code analysis of your Kubernetes object definitions. The output is a list of recommendations of what you can improve to make your application more secure and resilient.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output (-v shows OK checks, -vv also skipped ones and debug logs)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all logging except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Checks all files in the input and gives them a score and recommendations
    Score(ScoreArgs),

    /// Prints a CSV list of all available score checks
    List,

    /// Print the version of kube-score
    Version,
}

#[derive(Debug, Clone, Default, clap::Args)]
pub struct ScoreArgs {
    /// Manifest files or directories, `-` reads from stdin
    #[arg(value_name = "FILE")]
    pub files: Vec<PathBuf>,

    /// Exit with code 1 in case of warnings
    #[arg(long)]
    pub exit_one_on_warning: bool,

    /// Disables the requirement of setting a container CPU limit
    #[arg(long)]
    pub ignore_container_cpu_limit: bool,

    /// Disables the requirement of setting a container memory limit
    #[arg(long)]
    pub ignore_container_memory_limit: bool,

    /// Output format, one of human, ci, json or sarif [default: human]
    #[arg(short = 'o', long, value_name = "FORMAT")]
    pub output_format: Option<String>,

    /// Output version, v1 or v2 (json defaults to v2)
    #[arg(long, value_name = "VERSION")]
    pub output_version: Option<String>,

    /// Also write the result to output.<ext> in the current directory
    #[arg(short = 'f', long, value_enum, value_name = "EXT")]
    pub output_file: Option<OutputFileKind>,

    /// Enable an optional test, can be set multiple times or comma-separated
    #[arg(long = "enable-optional-test", value_delimiter = ',', value_name = "ID")]
    pub enable_optional_tests: Vec<String>,

    /// Disable a test, can be set multiple times or comma-separated
    #[arg(long = "ignore-test", value_delimiter = ',', value_name = "ID")]
    pub ignore_tests: Vec<String>,

    /// Ignore the kube-score/ignore annotation on objects
    #[arg(long)]
    pub disable_ignore_checks_annotations: bool,

    /// Kubernetes version of the target cluster [default: v1.18]
    #[arg(long, value_name = "VERSION")]
    pub kubernetes_version: Option<String>,

    /// Score objects on multiple threads
    #[arg(long)]
    pub parallel: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFileKind {
    Json,
    Txt,
}

impl OutputFileKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Json => "output.json",
            Self::Txt => "output.txt",
        }
    }
}

impl Cli {
    /// Initialize logging based on verbosity level
    pub fn init_logging(&self) {
        if self.quiet {
            return;
        }

        let level = match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            2 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        };

        env_logger::Builder::from_default_env()
            .filter_level(level)
            .init();
    }
}
