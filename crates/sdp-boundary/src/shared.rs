//! §4.5 Shared-Boundary Analyzer.

use camino::{Utf8Path, Utf8PathBuf};
use sdp_extraction::{extract_types, FieldDecl};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone)]
pub struct FeatureScope {
    pub feature_id: String,
    pub files: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Boundary {
    pub file: String,
    pub type_name: String,
    pub fields: Vec<FieldDecl>,
    pub features: Vec<String>,
}

const RECOGNIZED_EXTENSIONS: &[&str] = &["rs", "go", "ts", "tsx"];

/// Find every file declared by two or more distinct features and extract
/// the types they define. Files declared multiple times by the *same*
/// feature do not count as a cross-feature boundary.
#[must_use]
pub fn find_shared_boundaries(scopes: &[FeatureScope], candidate_roots: &[Utf8PathBuf]) -> Vec<Boundary> {
    let mut owners: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for scope in scopes {
        let declared: BTreeSet<&str> = scope.files.iter().map(String::as_str).collect();
        for file in declared {
            owners.entry(normalize(file)).or_default().insert(scope.feature_id.clone());
        }
    }

    let mut boundaries = Vec::new();
    for (file, features) in owners {
        if features.len() < 2 {
            continue;
        }
        let Some(ext) = Utf8Path::new(&file).extension() else {
            continue;
        };
        if !RECOGNIZED_EXTENSIONS.contains(&ext) {
            continue;
        }
        let Some(resolved) = resolve(&file, candidate_roots) else {
            continue;
        };
        let Ok(source) = std::fs::read_to_string(&resolved) else {
            continue;
        };
        let features: Vec<String> = features.into_iter().collect();
        for ty in extract_types(&source) {
            boundaries.push(Boundary {
                file: file.clone(),
                type_name: ty.name,
                fields: ty.fields,
                features: features.clone(),
            });
        }
    }
    boundaries
}

fn normalize(path: &str) -> String {
    path.trim_start_matches("./").to_string()
}

/// Resolve `file` (relative or absolute) against a fixed set of candidate
/// roots, returning the first root under which it exists.
fn resolve(file: &str, candidate_roots: &[Utf8PathBuf]) -> Option<Utf8PathBuf> {
    let path = Utf8Path::new(file);
    if path.is_absolute() {
        return path.exists().then(|| path.to_path_buf());
    }
    candidate_roots.iter().map(|root| root.join(path)).find(|p| p.exists())
}

#[cfg(test)]
mod tests {
    use super::*;
    use sdp_utils::test_support::TestProject;

    #[test]
    fn same_feature_declaring_a_file_twice_is_not_a_boundary() {
        let scopes = vec![FeatureScope {
            feature_id: "F001".to_string(),
            files: vec!["src/shared.rs".to_string(), "src/shared.rs".to_string()],
        }];
        let boundaries = find_shared_boundaries(&scopes, &[]);
        assert!(boundaries.is_empty());
    }

    #[test]
    fn two_distinct_features_declaring_the_same_file_is_a_boundary() {
        let project = TestProject::new();
        project.write("src/shared.rs", "pub struct Shared {\n    pub id: String,\n}\n");

        let scopes = vec![
            FeatureScope {
                feature_id: "F001".to_string(),
                files: vec!["src/shared.rs".to_string()],
            },
            FeatureScope {
                feature_id: "F002".to_string(),
                files: vec!["src/shared.rs".to_string()],
            },
        ];
        let boundaries = find_shared_boundaries(&scopes, &[project.root.clone()]);
        assert_eq!(boundaries.len(), 1);
        assert_eq!(boundaries[0].type_name, "Shared");
        assert_eq!(boundaries[0].features, vec!["F001".to_string(), "F002".to_string()]);
    }

    #[test]
    fn unparseable_file_is_skipped_without_failing_the_whole_analysis() {
        let project = TestProject::new();
        project.write("src/a.rs", "not a type at all");
        project.write("src/b.rs", "pub struct B {\n    pub x: u32,\n}\n");

        let scopes = vec![
            FeatureScope {
                feature_id: "F001".to_string(),
                files: vec!["src/a.rs".to_string(), "src/b.rs".to_string()],
            },
            FeatureScope {
                feature_id: "F002".to_string(),
                files: vec!["src/a.rs".to_string(), "src/b.rs".to_string()],
            },
        ];
        let boundaries = find_shared_boundaries(&scopes, &[project.root.clone()]);
        assert_eq!(boundaries.len(), 1);
        assert_eq!(boundaries[0].file, "src/b.rs");
    }

    #[test]
    fn missing_file_is_skipped() {
        let project = TestProject::new();
        let scopes = vec![
            FeatureScope {
                feature_id: "F001".to_string(),
                files: vec!["src/missing.rs".to_string()],
            },
            FeatureScope {
                feature_id: "F002".to_string(),
                files: vec!["src/missing.rs".to_string()],
            },
        ];
        assert!(find_shared_boundaries(&scopes, &[project.root]).is_empty());
    }
}
