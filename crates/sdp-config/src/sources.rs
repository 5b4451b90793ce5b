use std::collections::BTreeMap;

/// Where one resolved configuration value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Cli,
    ConfigFile,
    Default,
}

/// Per-invocation record of every runtime knob the core consulted, each
/// tagged with its source, mirroring the `effective_config` pattern used
/// elsewhere in the system for reproducibility reporting.
#[derive(Debug, Clone, Default)]
pub struct EffectiveConfig {
    sources: BTreeMap<String, ConfigSource>,
}

impl EffectiveConfig {
    pub(crate) fn record(&mut self, key: &str, source: ConfigSource) {
        self.sources.insert(key.to_string(), source);
    }

    #[must_use]
    pub fn source(&self, key: &str) -> Option<ConfigSource> {
        self.sources.get(key).copied()
    }

    #[must_use]
    pub fn iter(&self) -> impl Iterator<Item = (&str, ConfigSource)> {
        self.sources.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

/// One entry of an [`EffectiveConfig`] rendered for serialization.
#[derive(Debug, Clone)]
pub struct EffectiveValue {
    pub key: String,
    pub source: ConfigSource,
}
