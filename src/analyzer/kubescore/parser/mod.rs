//! YAML parsing for Kubernetes manifests.

pub mod yaml;

pub use yaml::{ParseError, parse_paths, parse_yaml, parse_yaml_dir, parse_yaml_file};
