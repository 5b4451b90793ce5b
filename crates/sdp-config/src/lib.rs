//! The core's in-process configuration layer for its own knobs: phase
//! timeouts, retry policy, and the paths to the hook and constraint
//! documents. Not a deployable diagnostics surface (that is explicitly out of
//! scope) — just CLI > file > defaults merge with source attribution, used
//! to produce the `effective_config` record.

mod model;
mod sources;

pub use model::{Config, RetryPolicy, Timeouts};
pub use sources::{ConfigSource, EffectiveConfig, EffectiveValue};

use camino::{Utf8Path, Utf8PathBuf};
use std::fs;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: Utf8PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// CLI-supplied overrides; every field is optional so only explicitly passed
/// flags take precedence over the file and the defaults.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub build_timeout_secs: Option<u64>,
    pub review_timeout_secs: Option<u64>,
    pub publish_timeout_secs: Option<u64>,
    pub ci_timeout_secs: Option<u64>,
    pub hook_timeout_secs: Option<u64>,
    pub max_retries: Option<u32>,
    pub retry_delay_secs: Option<u64>,
    pub hooks_path: Option<Utf8PathBuf>,
    pub constraints_path: Option<Utf8PathBuf>,
}

/// Locate `<project_root>/.sdp/config.toml` if present.
#[must_use]
pub fn discover_config_file(project_root: &Utf8Path) -> Option<Utf8PathBuf> {
    let candidate = project_root.join(".sdp").join("config.toml");
    candidate.is_file().then_some(candidate)
}

/// Load and merge configuration: CLI overrides win over the file, which wins
/// over built-in defaults. Returns both the resolved [`Config`] and an
/// [`EffectiveConfig`] recording where every value came from.
pub fn load(
    project_root: &Utf8Path,
    cli: &CliOverrides,
) -> Result<(Config, EffectiveConfig), ConfigError> {
    let config_path = discover_config_file(project_root);
    let from_file: model::FileConfig = match &config_path {
        Some(path) => {
            let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
                path: path.clone(),
                source,
            })?;
            toml::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?
        }
        None => model::FileConfig::default(),
    };

    let mut effective = EffectiveConfig::default();
    let config = model::merge(cli, &from_file, &mut effective);
    Ok((config, effective))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdp_utils::test_support::TestProject;

    #[test]
    fn defaults_apply_when_nothing_overrides_them() {
        let project = TestProject::new();
        let (config, effective) = load(&project.root, &CliOverrides::default()).unwrap();
        assert_eq!(config.timeouts.build_secs, 30 * 60);
        assert_eq!(effective.source("timeouts.build_secs"), Some(ConfigSource::Default));
    }

    #[test]
    fn cli_override_wins_over_file_and_default() {
        let project = TestProject::new();
        project.write(
            ".sdp/config.toml",
            "[timeouts]\nbuild_secs = 1200\n",
        );
        let cli = CliOverrides {
            build_timeout_secs: Some(99),
            ..Default::default()
        };
        let (config, effective) = load(&project.root, &cli).unwrap();
        assert_eq!(config.timeouts.build_secs, 99);
        assert_eq!(effective.source("timeouts.build_secs"), Some(ConfigSource::Cli));
    }

    #[test]
    fn file_value_wins_over_default_when_no_cli_override() {
        let project = TestProject::new();
        project.write(".sdp/config.toml", "[retry]\nmax_retries = 5\n");
        let (config, effective) = load(&project.root, &CliOverrides::default()).unwrap();
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(effective.source("retry.max_retries"), Some(ConfigSource::ConfigFile));
    }
}
