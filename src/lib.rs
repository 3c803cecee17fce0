//! # kube-score
//!
//! Static analysis of Kubernetes object definitions. Every object is run
//! through a registry of reliability and security checks and given a grade
//! per check, together with recommendations on what to improve.
//!
//! ## Features
//!
//! - **Typed parsing**: multi-document YAML files, directories and stdin
//! - **Graded checks**: Critical, Warning and OK scores with explanations
//! - **Suppression**: per-object `kube-score/ignore` annotations
//! - **Multiple formats**: human, CI, JSON and SARIF output
//!
//! ## Example
//!
//! ```rust,no_run
//! use kube_score::analyzer::kubescore::{CheckRegistry, ScoreConfig, Scorer, parse_yaml};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manifest = std::fs::read_to_string("deployment.yaml")?;
//! let resources = parse_yaml(&manifest)?.into();
//! let registry = CheckRegistry::with_builtin_checks()?;
//! let config = ScoreConfig::new();
//! let card = Scorer::new(&registry, &config).score(&resources)?;
//! println!("{} objects scored", card.len());
//! # Ok(())
//! # }
//! ```

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod error;
pub mod handlers;

pub use error::{KubeScoreError, Result};
use cli::Commands;

/// The current version of the CLI tool
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Run a parsed command and return the process exit code.
pub fn run_command(command: Commands, file_config: config::Config, verbosity: u8) -> Result<i32> {
    match command {
        Commands::Score(args) => handlers::handle_score(args, file_config, verbosity),
        Commands::List => handlers::handle_list().map(|_| 0),
        Commands::Version => {
            println!("kube-score {}", VERSION);
            Ok(0)
        }
    }
}
