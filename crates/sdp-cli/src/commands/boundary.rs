//! §6 shared-boundary detection: files declared in scope by two or more
//! features, with the types they define extracted for contract generation.

use super::common::to_utf8;
use crate::error::CliError;
use camino::Utf8PathBuf;
use sdp_boundary::{find_shared_boundaries, FeatureScope};
use serde::Serialize;
use std::path::PathBuf;

/// Parse `<feature_id>=<file1>,<file2>,...` pairs into feature scopes.
pub(super) fn parse_scopes(scopes: &[String]) -> Vec<FeatureScope> {
    scopes
        .iter()
        .filter_map(|entry| {
            let (feature_id, files) = entry.split_once('=')?;
            Some(FeatureScope {
                feature_id: feature_id.to_string(),
                files: files.split(',').map(str::trim).filter(|f| !f.is_empty()).map(str::to_string).collect(),
            })
        })
        .collect()
}

#[derive(Serialize)]
struct BoundaryJson {
    file: String,
    type_name: String,
    fields: Vec<sdp_extraction::FieldDecl>,
    features: Vec<String>,
}

pub async fn execute(scopes: &[String], candidate_roots: &[PathBuf], json: bool) -> Result<(), CliError> {
    let feature_scopes = parse_scopes(scopes);
    let roots: Vec<Utf8PathBuf> = candidate_roots.iter().map(|p| to_utf8(p)).collect();
    let boundaries = find_shared_boundaries(&feature_scopes, &roots);

    if json {
        let payload: Vec<BoundaryJson> = boundaries
            .iter()
            .map(|b| BoundaryJson {
                file: b.file.clone(),
                type_name: b.type_name.clone(),
                fields: b.fields.clone(),
                features: b.features.clone(),
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    if boundaries.is_empty() {
        println!("no shared boundaries found");
        return Ok(());
    }
    for boundary in &boundaries {
        println!("{} ({}) — required by {}", boundary.type_name, boundary.file, boundary.features.join(", "));
    }
    Ok(())
}
