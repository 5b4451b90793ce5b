//! §4.5 step 2-3 / §4.6 step 2: static, regex-based extraction of top-level
//! type declarations and their fields from Rust, Go and TypeScript sources.
//!
//! This is deliberately not a real parser: it recognizes the common
//! `struct`/`interface` block shape well enough to extract field lists for
//! cross-feature boundary detection and contract diffing. Anything it
//! doesn't recognize degrades to a generic field-less type or is skipped.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDecl {
    pub name: String,
    pub type_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeDecl {
    pub name: String,
    pub fields: Vec<FieldDecl>,
}

static TYPE_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^(?:pub\s+|export\s+)?(?:struct|interface|type)\s+(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*(?:struct\s*)?\{(?P<body>[^}]*)\}",
    )
    .expect("static regex")
});

static RUST_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?:pub\s+)?(?P<name>[A-Za-z_][A-Za-z0-9_]*)\s*:\s*(?P<ty>[A-Za-z0-9_:<>,.\[\]\s&']+?)\s*,?\s*$")
        .expect("static regex")
});

static GO_FIELD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?m)^\s*(?P<name>[A-Z][A-Za-z0-9_]*)\s+(?P<ty>[\*\[\]A-Za-z0-9_.]+)\s*(?:`[^`]*`)?\s*$").expect("static regex")
});

static TS_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?m)^\s*(?P<name>[A-Za-z_][A-Za-z0-9_]*)\??\s*:\s*(?P<ty>[A-Za-z0-9_<>\[\]| ]+?)\s*;?\s*$").expect("static regex"));

/// Extract every top-level struct/interface-like declaration from `source`.
/// A file that fails to yield any recognizable block returns an empty list
/// rather than an error — callers treat that as "skip silently".
#[must_use]
pub fn extract_types(source: &str) -> Vec<TypeDecl> {
    TYPE_BLOCK
        .captures_iter(source)
        .map(|caps| {
            let name = caps["name"].to_string();
            let body = &caps["body"];
            TypeDecl {
                name,
                fields: extract_fields(body),
            }
        })
        .collect()
}

/// Extract a single named type, if present.
#[must_use]
pub fn extract_type(source: &str, type_name: &str) -> Option<TypeDecl> {
    extract_types(source).into_iter().find(|t| t.name == type_name)
}

fn extract_fields(body: &str) -> Vec<FieldDecl> {
    for pattern in [&*RUST_FIELD, &*TS_FIELD, &*GO_FIELD] {
        let fields: Vec<FieldDecl> = pattern
            .captures_iter(body)
            .map(|caps| FieldDecl {
                name: caps["name"].trim().to_string(),
                type_name: normalize_type(&caps["ty"]),
            })
            .collect();
        if !fields.is_empty() {
            return fields;
        }
    }
    Vec::new()
}

fn normalize_type(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        "unknown".to_string()
    } else {
        trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
    }
}

/// The filename candidates an implementation of `type_name` is expected under,
/// given the source extension in use (e.g. `"rs"`, `"go"`, `"ts"`).
#[must_use]
pub fn implementation_filename_candidates(type_name: &str, ext: &str) -> Vec<String> {
    let lower_first = {
        let mut chars = type_name.chars();
        match chars.next() {
            Some(c) => c.to_lowercase().collect::<String>() + chars.as_str(),
            None => String::new(),
        }
    };
    vec![format!("{type_name}.{ext}"), format!("{lower_first}.{ext}")]
}
