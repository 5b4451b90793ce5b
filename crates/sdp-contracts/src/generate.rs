//! §4.6 Contract Engine — generation.

use camino::{Utf8Path, Utf8PathBuf};
use sdp_boundary::Boundary;
use sdp_extraction::FieldDecl;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractDocument {
    #[serde(rename = "typeName")]
    pub type_name: String,
    pub fields: Vec<FieldDecl>,
    #[serde(rename = "requiredBy")]
    pub required_by: Vec<String>,
    pub status: String,
    #[serde(rename = "sourceFile")]
    pub source_file: String,
}

impl From<&Boundary> for ContractDocument {
    fn from(boundary: &Boundary) -> Self {
        Self {
            type_name: boundary.type_name.clone(),
            fields: boundary.fields.clone(),
            required_by: boundary.features.clone(),
            status: "draft".to_string(),
            source_file: boundary.file.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    #[error("failed to write contract document for {type_name} at {path}: {source}")]
    Write {
        type_name: String,
        path: String,
        source: std::io::Error,
    },
    #[error("failed to serialize contract document for {type_name}: {source}")]
    Serialize {
        type_name: String,
        source: serde_json::Error,
    },
}

#[must_use]
pub fn contract_path(output_dir: &Utf8Path, type_name: &str) -> Utf8PathBuf {
    output_dir.join(format!("{type_name}.json"))
}

fn write_one(output_dir: &Utf8Path, boundary: &Boundary) -> Result<Utf8PathBuf, GenerateError> {
    let doc = ContractDocument::from(boundary);
    let path = contract_path(output_dir, &doc.type_name);
    let bytes = serde_json::to_vec_pretty(&doc).map_err(|source| GenerateError::Serialize {
        type_name: doc.type_name.clone(),
        source,
    })?;
    sdp_utils::atomic_write::write_atomic(&path, &bytes).map_err(|source| GenerateError::Write {
        type_name: doc.type_name.clone(),
        path: path.to_string(),
        source,
    })?;
    Ok(path)
}

/// Emit one contract document per boundary. Generation is independent per
/// boundary; every boundary is attempted even if earlier ones failed, and
/// the first collected error (if any) is returned after all have run.
pub fn generate(output_dir: &Utf8Path, boundaries: &[Boundary]) -> Result<Vec<Utf8PathBuf>, GenerateError> {
    let mut written = Vec::new();
    let mut first_error = None;
    for boundary in boundaries {
        match write_one(output_dir, boundary) {
            Ok(path) => written.push(path),
            Err(e) => {
                tracing::error!(type_name = %boundary.type_name, error = %e, "contract generation failed");
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }
    if let Some(err) = first_error {
        return Err(err);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdp_utils::test_support::TestProject;

    fn boundary() -> Boundary {
        Boundary {
            file: "src/shared.rs".to_string(),
            type_name: "Shared".to_string(),
            fields: vec![FieldDecl {
                name: "id".to_string(),
                type_name: "String".to_string(),
            }],
            features: vec!["F001".to_string(), "F002".to_string()],
        }
    }

    #[test]
    fn generates_draft_document_with_required_by() {
        let project = TestProject::new();
        let out = project.root.join("contracts");
        let paths = generate(&out, &[boundary()]).unwrap();
        assert_eq!(paths.len(), 1);

        let text = std::fs::read_to_string(&paths[0]).unwrap();
        let doc: ContractDocument = serde_json::from_str(&text).unwrap();
        assert_eq!(doc.status, "draft");
        assert_eq!(doc.required_by, vec!["F001".to_string(), "F002".to_string()]);
        assert_eq!(doc.source_file, "src/shared.rs");
    }

    #[test]
    fn generates_every_boundary_independently() {
        let project = TestProject::new();
        let out = project.root.join("contracts");
        let mut other = boundary();
        other.type_name = "Other".to_string();
        let paths = generate(&out, &[boundary(), other]).unwrap();
        assert_eq!(paths.len(), 2);
    }
}
