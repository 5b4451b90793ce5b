//! §4.6 Contract Engine — validation.

use crate::generate::ContractDocument;
use camino::Utf8Path;
use sdp_extraction::implementation_filename_candidates;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingImplementation,
    MissingField,
    TypeMismatch,
    ExtraField,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    #[serde(rename = "type")]
    pub kind: ViolationKind,
    pub field: Option<String>,
    pub expected: Option<String>,
    pub actual: Option<String>,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ValidateError {
    #[error("failed to read contract document {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("failed to parse contract document {path}: {source}")]
    Parse { path: String, source: serde_json::Error },
}

/// Validate every `.json` contract document in `contracts_dir` against the
/// implementation sources under `impl_dir`, keyed by which extension(s) to
/// try when locating an implementation file.
pub fn validate_all(contracts_dir: &Utf8Path, impl_dir: &Utf8Path, exts: &[&str]) -> Result<BTreeMap<String, Vec<Violation>>, ValidateError> {
    let mut results = BTreeMap::new();
    if !contracts_dir.is_dir() {
        return Ok(results);
    }
    for entry in std::fs::read_dir(contracts_dir.as_std_path()).map_err(|source| ValidateError::Read {
        path: contracts_dir.to_string(),
        source,
    })? {
        let entry = entry.map_err(|source| ValidateError::Read {
            path: contracts_dir.to_string(),
            source,
        })?;
        let path = entry.path();
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        let text = std::fs::read_to_string(&path).map_err(|source| ValidateError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let doc: ContractDocument = serde_json::from_str(&text).map_err(|source| ValidateError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        let violations = validate_one(&doc, impl_dir, exts);
        results.insert(doc.type_name.clone(), violations);
    }
    Ok(results)
}

fn validate_one(doc: &ContractDocument, impl_dir: &Utf8Path, exts: &[&str]) -> Vec<Violation> {
    let Some((impl_path, ext)) = locate_implementation(&doc.type_name, impl_dir, exts) else {
        return vec![Violation {
            kind: ViolationKind::MissingImplementation,
            field: None,
            expected: Some(doc.type_name.clone()),
            actual: None,
            severity: Severity::Error,
            message: format!("no implementation file found for type {}", doc.type_name),
        }];
    };
    let _ = ext;

    let Ok(source) = std::fs::read_to_string(&impl_path) else {
        return vec![Violation {
            kind: ViolationKind::MissingImplementation,
            field: None,
            expected: Some(doc.type_name.clone()),
            actual: None,
            severity: Severity::Error,
            message: format!("implementation file {} could not be read", impl_path),
        }];
    };

    let Some(implemented) = sdp_extraction::extract_type(&source, &doc.type_name) else {
        return vec![Violation {
            kind: ViolationKind::MissingImplementation,
            field: None,
            expected: Some(doc.type_name.clone()),
            actual: None,
            severity: Severity::Error,
            message: format!("type {} not found in {}", doc.type_name, impl_path),
        }];
    };

    let mut violations = Vec::new();
    let impl_fields: BTreeMap<&str, &str> = implemented
        .fields
        .iter()
        .map(|f| (f.name.as_str(), f.type_name.as_str()))
        .collect();

    for field in &doc.fields {
        match impl_fields.get(field.name.as_str()) {
            None => violations.push(Violation {
                kind: ViolationKind::MissingField,
                field: Some(field.name.clone()),
                expected: Some(field.type_name.clone()),
                actual: None,
                severity: Severity::Error,
                message: format!("field {} declared by the contract is missing from the implementation", field.name),
            }),
            Some(actual_ty) if *actual_ty != field.type_name => violations.push(Violation {
                kind: ViolationKind::TypeMismatch,
                field: Some(field.name.clone()),
                expected: Some(field.type_name.clone()),
                actual: Some((*actual_ty).to_string()),
                severity: Severity::Warning,
                message: format!(
                    "field {} expected type {} but implementation declares {actual_ty}",
                    field.name, field.type_name
                ),
            }),
            Some(_) => {}
        }
    }

    let contract_field_names: std::collections::BTreeSet<&str> = doc.fields.iter().map(|f| f.name.as_str()).collect();
    for field in &implemented.fields {
        if !contract_field_names.contains(field.name.as_str()) {
            violations.push(Violation {
                kind: ViolationKind::ExtraField,
                field: Some(field.name.clone()),
                expected: None,
                actual: Some(field.type_name.clone()),
                severity: Severity::Warning,
                message: format!("field {} present in the implementation but not declared by the contract", field.name),
            });
        }
    }

    violations
}

fn locate_implementation(type_name: &str, impl_dir: &Utf8Path, exts: &[&str]) -> Option<(camino::Utf8PathBuf, &'static str)> {
    for ext in exts {
        for candidate in implementation_filename_candidates(type_name, ext) {
            let path = impl_dir.join(&candidate);
            if path.is_file() {
                return Some((path, "matched"));
            }
        }
    }
    None
}
