use super::{CliOverrides, sources::EffectiveConfig};
use camino::Utf8PathBuf;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub build_secs: u64,
    pub review_secs: u64,
    pub publish_secs: u64,
    pub ci_secs: u64,
    pub hook_secs: u64,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            build_secs: 30 * 60,
            review_secs: 15 * 60,
            publish_secs: 10 * 60,
            ci_secs: 30 * 60,
            hook_secs: 60,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub delay_secs: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 2,
            delay_secs: 5,
        }
    }
}

/// The resolved configuration the supervisor consults for its own knobs.
#[derive(Debug, Clone)]
pub struct Config {
    pub timeouts: Timeouts,
    pub retry: RetryPolicy,
    pub hooks_path: Utf8PathBuf,
    pub constraints_path: Utf8PathBuf,
}

/// The subset of [`Config`] that may come from `.sdp/config.toml`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    #[serde(default)]
    pub timeouts: FileTimeouts,
    #[serde(default)]
    pub retry: FileRetry,
    pub hooks_path: Option<Utf8PathBuf>,
    pub constraints_path: Option<Utf8PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileTimeouts {
    pub build_secs: Option<u64>,
    pub review_secs: Option<u64>,
    pub publish_secs: Option<u64>,
    pub ci_secs: Option<u64>,
    pub hook_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileRetry {
    pub max_retries: Option<u32>,
    pub delay_secs: Option<u64>,
}

macro_rules! resolve {
    ($effective:expr, $key:expr, $cli:expr, $file:expr, $default:expr) => {{
        if let Some(v) = $cli {
            $effective.record($key, super::sources::ConfigSource::Cli);
            v
        } else if let Some(v) = $file {
            $effective.record($key, super::sources::ConfigSource::ConfigFile);
            v
        } else {
            $effective.record($key, super::sources::ConfigSource::Default);
            $default
        }
    }};
}

pub fn merge(cli: &CliOverrides, file: &FileConfig, effective: &mut EffectiveConfig) -> Config {
    let defaults = Timeouts::default();
    let timeouts = Timeouts {
        build_secs: resolve!(effective, "timeouts.build_secs", cli.build_timeout_secs, file.timeouts.build_secs, defaults.build_secs),
        review_secs: resolve!(effective, "timeouts.review_secs", cli.review_timeout_secs, file.timeouts.review_secs, defaults.review_secs),
        publish_secs: resolve!(effective, "timeouts.publish_secs", cli.publish_timeout_secs, file.timeouts.publish_secs, defaults.publish_secs),
        ci_secs: resolve!(effective, "timeouts.ci_secs", cli.ci_timeout_secs, file.timeouts.ci_secs, defaults.ci_secs),
        hook_secs: resolve!(effective, "timeouts.hook_secs", cli.hook_timeout_secs, file.timeouts.hook_secs, defaults.hook_secs),
    };

    let default_retry = RetryPolicy::default();
    let retry = RetryPolicy {
        max_retries: resolve!(effective, "retry.max_retries", cli.max_retries, file.retry.max_retries, default_retry.max_retries),
        delay_secs: resolve!(effective, "retry.delay_secs", cli.retry_delay_secs, file.retry.delay_secs, default_retry.delay_secs),
    };

    let hooks_path = resolve!(
        effective,
        "hooks_path",
        cli.hooks_path.clone(),
        file.hooks_path.clone(),
        Utf8PathBuf::from(".sdp/hooks.toml")
    );
    let constraints_path = resolve!(
        effective,
        "constraints_path",
        cli.constraints_path.clone(),
        file.constraints_path.clone(),
        Utf8PathBuf::from(".sdp/constraints.toml")
    );

    Config {
        timeouts,
        retry,
        hooks_path,
        constraints_path,
    }
}
