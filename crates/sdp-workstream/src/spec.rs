//! Workstream spec files: front-matter (`ws_id`, `feature_id`, `depends_on`)
//! followed by `## Scope Files`, `## Acceptance Criteria` sections and a
//! free-form body.

use sdp_utils::identifiers::{FeatureId, IdentifierError, WorkstreamId};

#[derive(Debug, thiserror::Error)]
pub enum SpecParseError {
    #[error("missing front-matter delimiters (expected leading `---` block)")]
    MissingFrontMatter,
    #[error("front-matter missing required field {0:?}")]
    MissingField(&'static str),
    #[error(transparent)]
    Identifier(#[from] IdentifierError),
}

#[derive(Debug, Clone)]
pub struct WorkstreamSpec {
    pub ws_id: WorkstreamId,
    pub feature_id: FeatureId,
    pub depends_on: Vec<WorkstreamId>,
    pub scope_files: Vec<String>,
    pub acceptance_criteria: Vec<String>,
    pub body: String,
    pub raw: String,
}

/// Parse a workstream spec document.
pub fn parse_spec(text: &str) -> Result<WorkstreamSpec, SpecParseError> {
    let (front_matter, rest) = split_front_matter(text)?;

    let mut ws_id = None;
    let mut feature_id = None;
    let mut depends_on = Vec::new();

    for line in front_matter.lines() {
        let line = line.trim();
        if let Some(value) = line.strip_prefix("ws_id:") {
            ws_id = Some(WorkstreamId::parse(value.trim())?);
        } else if let Some(value) = line.strip_prefix("feature_id:") {
            feature_id = Some(FeatureId::parse(value.trim())?);
        } else if let Some(value) = line.strip_prefix("depends_on:") {
            depends_on = parse_dependency_list(value.trim())?;
        }
    }

    let ws_id = ws_id.ok_or(SpecParseError::MissingField("ws_id"))?;
    let feature_id = feature_id.ok_or(SpecParseError::MissingField("feature_id"))?;

    let scope_files = extract_scope_files(rest);
    let acceptance_criteria = extract_acceptance_criteria(rest);

    Ok(WorkstreamSpec {
        ws_id,
        feature_id,
        depends_on,
        scope_files,
        acceptance_criteria,
        body: rest.to_string(),
        raw: text.to_string(),
    })
}

fn split_front_matter(text: &str) -> Result<(&str, &str), SpecParseError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let rest = text.strip_prefix("---").ok_or(SpecParseError::MissingFrontMatter)?;
    let rest = rest.strip_prefix('\n').unwrap_or(rest);
    let end = rest.find("\n---").ok_or(SpecParseError::MissingFrontMatter)?;
    let front_matter = &rest[..end];
    let after = &rest[end + 4..];
    let after = after.strip_prefix('\n').unwrap_or(after);
    Ok((front_matter, after))
}

/// Accepts either `[a, b, c]` or a bare comma-separated list.
fn parse_dependency_list(value: &str) -> Result<Vec<WorkstreamId>, SpecParseError> {
    let trimmed = value.trim().trim_start_matches('[').trim_end_matches(']');
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    trimmed
        .split(',')
        .map(|s| s.trim().trim_matches('"').trim_matches('\''))
        .filter(|s| !s.is_empty())
        .map(|s| WorkstreamId::parse(s).map_err(SpecParseError::from))
        .collect()
}

/// Lines of the form `` - `path/prefix` `` under a `## Scope Files` heading.
fn extract_scope_files(body: &str) -> Vec<String> {
    extract_section_items(body, "Scope Files", |line| {
        let line = line.trim().trim_start_matches('-').trim();
        let start = line.find('`')?;
        let end = line[start + 1..].find('`')? + start + 1;
        Some(line[start + 1..end].to_string())
    })
}

/// Lines of the form `- [ ] criterion` or `- [x] criterion` under
/// `## Acceptance Criteria`.
fn extract_acceptance_criteria(body: &str) -> Vec<String> {
    extract_section_items(body, "Acceptance Criteria", |line| {
        let line = line.trim();
        let rest = line.strip_prefix("- [").or_else(|| line.strip_prefix("* ["))?;
        let close = rest.find(']')?;
        Some(rest[close + 1..].trim().to_string())
    })
}

fn extract_section_items(body: &str, heading: &str, extract: impl Fn(&str) -> Option<String>) -> Vec<String> {
    let mut items = Vec::new();
    let mut in_section = false;
    for line in body.lines() {
        let trimmed = line.trim_start();
        if trimmed.starts_with('#') {
            in_section = trimmed.trim_start_matches('#').trim() == heading;
            continue;
        }
        if in_section {
            if let Some(item) = extract(line) {
                items.push(item);
            }
        }
    }
    items
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"---
ws_id: 00-016-02
feature_id: F016
depends_on: [00-016-01]
---

## Scope Files

- `internal/guard/`
- `cmd/guard/main.go`

## Acceptance Criteria

- [ ] Guard rejects traversal
- [x] Guard allows declared prefixes

Free-form body text follows.
"#;

    #[test]
    fn parses_front_matter_and_sections() {
        let spec = parse_spec(SAMPLE).unwrap();
        assert_eq!(spec.ws_id.as_str(), "00-016-02");
        assert_eq!(spec.feature_id.to_string(), "F016");
        assert_eq!(spec.depends_on.len(), 1);
        assert_eq!(spec.depends_on[0].as_str(), "00-016-01");
        assert_eq!(spec.scope_files, vec!["internal/guard/", "cmd/guard/main.go"]);
        assert_eq!(spec.acceptance_criteria.len(), 2);
        assert!(spec.body.contains("Free-form body text"));
    }

    #[test]
    fn missing_front_matter_is_an_error() {
        assert!(matches!(parse_spec("no front matter here"), Err(SpecParseError::MissingFrontMatter)));
    }

    #[test]
    fn missing_required_field_is_an_error() {
        let text = "---\nws_id: 00-016-02\n---\nbody\n";
        assert!(matches!(parse_spec(text), Err(SpecParseError::MissingField("feature_id"))));
    }

    #[test]
    fn empty_depends_on_parses_to_empty_vec() {
        let text = "---\nws_id: 00-016-01\nfeature_id: F016\ndepends_on: []\n---\nbody\n";
        let spec = parse_spec(text).unwrap();
        assert!(spec.depends_on.is_empty());
    }
}
