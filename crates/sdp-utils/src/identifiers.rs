//! Feature and workstream identifier parsing and validation.
//!
//! A feature identifier is `F<digits>` (case-insensitive `F`), normalized to a
//! three-digit numeric component. A workstream identifier is `PP-FFF-SS` where
//! `PP` is a two-digit project, `FFF` the three-digit feature number and `SS`
//! a two-digit sequence within the feature.

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

#[derive(Debug, thiserror::Error)]
pub enum IdentifierError {
    #[error("invalid feature identifier {0:?}: expected form F<digits>")]
    InvalidFeatureId(String),
    #[error("invalid workstream identifier {0:?}: expected form PP-FFF-SS")]
    InvalidWorkstreamId(String),
}

/// A normalized feature identifier, e.g. `F016`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureId {
    number: u32,
}

impl FeatureId {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let trimmed = raw.trim();
        let rest = trimmed
            .strip_prefix('F')
            .or_else(|| trimmed.strip_prefix('f'))
            .ok_or_else(|| IdentifierError::InvalidFeatureId(raw.to_string()))?;
        if rest.is_empty() || !rest.bytes().all(|b| b.is_ascii_digit()) {
            return Err(IdentifierError::InvalidFeatureId(raw.to_string()));
        }
        let number: u32 = rest
            .parse()
            .map_err(|_| IdentifierError::InvalidFeatureId(raw.to_string()))?;
        Ok(Self { number })
    }

    /// Three-digit numeric component, e.g. `"016"` for `F016`.
    #[must_use]
    pub fn numeric(&self) -> String {
        format!("{:03}", self.number)
    }

    /// The prefix used to discover this feature's workstream spec files, e.g. `"FFF-016"`.
    #[must_use]
    pub fn workstream_prefix(&self) -> String {
        format!("-{}-", self.numeric())
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "F{:03}", self.number)
    }
}

impl Serialize for FeatureId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FeatureId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        FeatureId::parse(&raw).map_err(de::Error::custom)
    }
}

/// A workstream identifier, e.g. `00-016-02`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WorkstreamId {
    raw: String,
    project: u32,
    feature: u32,
    sequence: u32,
}

impl WorkstreamId {
    pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
        let trimmed = raw.trim();
        let parts: Vec<&str> = trimmed.split('-').collect();
        if parts.len() != 3 {
            return Err(IdentifierError::InvalidWorkstreamId(raw.to_string()));
        }
        let valid_part = |s: &str, len: usize| s.len() == len && s.bytes().all(|b| b.is_ascii_digit());
        if !valid_part(parts[0], 2) || !valid_part(parts[1], 3) || !valid_part(parts[2], 2) {
            return Err(IdentifierError::InvalidWorkstreamId(raw.to_string()));
        }
        Ok(Self {
            raw: trimmed.to_string(),
            project: parts[0].parse().unwrap(),
            feature: parts[1].parse().unwrap(),
            sequence: parts[2].parse().unwrap(),
        })
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    #[must_use]
    pub fn feature_number(&self) -> u32 {
        self.feature
    }

    #[must_use]
    pub fn project(&self) -> u32 {
        self.project
    }

    #[must_use]
    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// True if this workstream belongs to `feature` (by numeric component).
    #[must_use]
    pub fn belongs_to(&self, feature: &FeatureId) -> bool {
        format!("{:03}", self.feature) == feature.numeric()
    }
}

impl fmt::Display for WorkstreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl Serialize for WorkstreamId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for WorkstreamId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        WorkstreamId::parse(&raw).map_err(de::Error::custom)
    }
}
