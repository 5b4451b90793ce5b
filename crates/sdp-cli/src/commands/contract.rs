//! §6 contract generation and validation over detected shared boundaries.

use super::common::to_utf8;
use crate::error::CliError;
use camino::Utf8PathBuf;
use sdp_boundary::find_shared_boundaries;
use sdp_contracts::{generate, validate_all, ViolationKind};
use std::collections::BTreeMap;
use std::path::PathBuf;

const EXTENSIONS: &[&str] = &["rs", "go", "ts", "tsx"];

pub async fn execute_generate(scopes: &[String], candidate_roots: &[PathBuf], output_dir: &std::path::Path) -> Result<(), CliError> {
    let feature_scopes = super::boundary::parse_scopes(scopes);
    let roots: Vec<Utf8PathBuf> = candidate_roots.iter().map(|p| to_utf8(p)).collect();
    let boundaries = find_shared_boundaries(&feature_scopes, &roots);
    let output_dir = to_utf8(output_dir);

    let written = generate(&output_dir, &boundaries)?;
    for path in &written {
        println!("wrote {path}");
    }
    if written.is_empty() {
        println!("no shared boundaries found; no contracts written");
    }
    Ok(())
}

pub async fn execute_validate(contracts_dir: &std::path::Path, impl_dirs: &[PathBuf], json: bool) -> Result<(), CliError> {
    let contracts_dir = to_utf8(contracts_dir);

    let mut by_type: BTreeMap<String, Vec<sdp_contracts::Violation>> = BTreeMap::new();

    for dir in impl_dirs {
        let dir = to_utf8(dir);
        let results = validate_all(&contracts_dir, &dir, EXTENSIONS)?;
        for (type_name, violations) in results {
            let found_impl = !violations.iter().any(|v| v.kind == ViolationKind::MissingImplementation);
            let entry = by_type.entry(type_name).or_default();
            if entry.is_empty() || found_impl {
                *entry = violations;
            }
        }
    }

    let total_errors: usize = by_type.values().flatten().filter(|v| v.severity == sdp_contracts::Severity::Error).count();

    if json {
        println!("{}", serde_json::to_string_pretty(&by_type)?);
    } else {
        for (type_name, violations) in &by_type {
            if violations.is_empty() {
                println!("{type_name}: ok");
                continue;
            }
            for violation in violations {
                println!("{type_name}: {} — {}", severity_label(violation.severity), violation.message);
            }
        }
    }

    if total_errors > 0 {
        return Err(CliError::ContractValidationFailed(total_errors));
    }
    Ok(())
}

fn severity_label(severity: sdp_contracts::Severity) -> &'static str {
    match severity {
        sdp_contracts::Severity::Error => "error",
        sdp_contracts::Severity::Warning => "warning",
    }
}
