use crate::analyzer::kubescore::{
    CheckRegistry, Grade, KubernetesVersion, RenderOptions, ScoreCard, ScoreConfig, Scorer,
    format_result_to_string, parse_paths, select_renderer,
};
use crate::cli::ScoreArgs;
use crate::config::Config;
use crate::error::{KubeScoreError, Result};
use std::fs;

/// Score the given manifests and print the result.
///
/// Returns the process exit code: 1 when any object has a Critical score, or
/// a Warning score with `exit_one_on_warning` set. Everything that can be
/// rejected up front (version, output format) is rejected before parsing.
pub fn handle_score(args: ScoreArgs, file_config: Config, verbosity: u8) -> Result<i32> {
    let config = build_score_config(&args, &file_config)?;

    let format = args
        .output_format
        .as_deref()
        .or(file_config.output_format.as_deref())
        .unwrap_or("human");
    let renderer = select_renderer(format, args.output_version.as_deref())?;

    if args.files.is_empty() {
        return Err(KubeScoreError::NoFiles);
    }

    let resources = parse_paths(&args.files)?;
    log::info!("Parsed {} objects from {} inputs", resources.len(), args.files.len());

    let registry = CheckRegistry::with_builtin_checks()?;
    let card = Scorer::new(&registry, &config)
        .with_parallelism(args.parallel)
        .score(&resources)?;

    let exit_one_on_warning = args.exit_one_on_warning || file_config.exit_one_on_warning;
    let code = exit_code(&card, exit_one_on_warning);

    let output = format_result_to_string(&card, renderer, &RenderOptions::for_terminal(verbosity));
    print!("{}", output);

    if let Some(kind) = args.output_file {
        fs::write(kind.file_name(), &output)?;
        log::info!("Wrote results to {}", kind.file_name());
    }

    Ok(code)
}

/// Merge command-line flags over the file configuration.
pub fn build_score_config(args: &ScoreArgs, file_config: &Config) -> Result<ScoreConfig> {
    let version = match args
        .kubernetes_version
        .as_deref()
        .or(file_config.kubernetes_version.as_deref())
    {
        Some(v) => KubernetesVersion::parse(v)?,
        None => KubernetesVersion::default(),
    };

    let mut config = ScoreConfig::new()
        .with_kubernetes_version(version)
        .with_ignore_container_cpu_limit(
            args.ignore_container_cpu_limit || file_config.ignore_container_cpu_limit,
        )
        .with_ignore_container_memory_limit(
            args.ignore_container_memory_limit || file_config.ignore_container_memory_limit,
        )
        .with_ignore_annotation(
            !(args.disable_ignore_checks_annotations
                || file_config.disable_ignore_checks_annotations),
        );

    for id in file_config.ignore_tests.iter().chain(&args.ignore_tests) {
        config = config.ignore_test(id.trim());
    }
    for id in file_config
        .enable_optional_tests
        .iter()
        .chain(&args.enable_optional_tests)
    {
        config = config.enable_optional_test(id.trim());
    }

    Ok(config)
}

pub fn exit_code(card: &ScoreCard, exit_one_on_warning: bool) -> i32 {
    if card.any_below_or_equal_to_grade(Grade::Critical) {
        1
    } else if exit_one_on_warning && card.any_below_or_equal_to_grade(Grade::Warning) {
        1
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzer::kubescore::formatter::test_support::sample_card;

    #[test]
    fn test_cli_extends_file_lists() {
        let file_config = Config {
            ignore_tests: vec!["container-image-tag".to_string()],
            kubernetes_version: Some("v1.24".to_string()),
            ..Default::default()
        };
        let args = ScoreArgs {
            ignore_tests: vec!["pod-probes".to_string()],
            enable_optional_tests: vec!["container-seccomp-profile".to_string()],
            ..Default::default()
        };

        let config = build_score_config(&args, &file_config).unwrap();
        assert!(config.is_test_ignored("container-image-tag"));
        assert!(config.is_test_ignored("pod-probes"));
        assert!(config.is_optional_test_enabled("container-seccomp-profile"));
        assert_eq!(config.kubernetes_version, KubernetesVersion::new(1, 24));
        assert!(config.use_ignore_annotation);
    }

    #[test]
    fn test_cli_version_overrides_file() {
        let file_config = Config {
            kubernetes_version: Some("v1.24".to_string()),
            disable_ignore_checks_annotations: true,
            ..Default::default()
        };
        let args = ScoreArgs {
            kubernetes_version: Some("v1.30".to_string()),
            ..Default::default()
        };

        let config = build_score_config(&args, &file_config).unwrap();
        assert_eq!(config.kubernetes_version, KubernetesVersion::new(1, 30));
        assert!(!config.use_ignore_annotation);
    }

    #[test]
    fn test_malformed_version_is_fatal() {
        let args = ScoreArgs {
            kubernetes_version: Some("latest".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            build_score_config(&args, &Config::default()),
            Err(KubeScoreError::Version(_))
        ));
    }

    #[test]
    fn test_no_files_is_an_error() {
        let result = handle_score(ScoreArgs::default(), Config::default(), 0);
        assert!(matches!(result, Err(KubeScoreError::NoFiles)));
    }

    #[test]
    fn test_exit_code() {
        let card = sample_card();
        assert_eq!(exit_code(&card, false), 1);
        assert_eq!(exit_code(&ScoreCard::new(), true), 0);
    }
}
