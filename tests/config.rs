use std::fs;

use assert_matches::assert_matches;

use dcc_repository::config::{ConfigLoader, default_repo_dir_glob};
use dcc_repository::domain::ProjectCode;
use dcc_repository::error::RepoError;
use dcc_repository::registry::{PrimarySiteRegistry, ProjectRegistry};

#[test]
fn resolve_full_config() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("dcc-repo.json");
    fs::write(
        &path,
        r#"{
            "schema_version": 1,
            "store": "/data/dcc",
            "projects": [
                {"code": "BRCA-UK", "program": "ICGC", "primary_site": "Breast"},
                {"code": "PACA-CA", "program": "ICGC", "primary_site": ""}
            ],
            "pcawg": {"archive": "donors.jsonl.gz", "workflow_types": ["bwa_alignment"]},
            "gdc": {"url": "https://api.gdc.cancer.gov"},
            "cloud": {"repo_url": "https://example.org/jobs.git", "repo_dir": "/tmp/jobs"}
        }"#,
    )
    .unwrap();

    let resolved = ConfigLoader::resolve(path.to_str()).unwrap();
    assert_eq!(resolved.store_root.as_ref().map(|root| root.as_str()), Some("/data/dcc"));
    assert_eq!(resolved.archive.as_deref(), Some("donors.jsonl.gz"));
    assert_eq!(resolved.layout.workflow_types, vec!["bwa_alignment".to_string()]);
    assert_eq!(resolved.layout.library_strategy_names.len(), 2);
    assert_eq!(resolved.gdc_url, "https://api.gdc.cancer.gov");

    let brca: ProjectCode = "BRCA-UK".parse().unwrap();
    let paca: ProjectCode = "PACA-CA".parse().unwrap();
    assert_eq!(resolved.registry.project(&brca).unwrap().program, "ICGC");
    assert_eq!(resolved.registry.primary_site(&brca).as_deref(), Some("Breast"));
    assert_eq!(resolved.registry.primary_site(&paca), None);

    let cloud = resolved.cloud.unwrap();
    assert_eq!(cloud.repo_dir_glob, default_repo_dir_glob());
}

#[test]
fn missing_explicit_config_is_read_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("absent.json");
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, RepoError::ConfigRead(_));
}

#[test]
fn malformed_config_is_parse_error() {
    let temp = tempfile::tempdir().unwrap();
    let path = temp.path().join("dcc-repo.json");
    fs::write(&path, "{\"projects\": 3}").unwrap();
    let err = ConfigLoader::resolve(path.to_str()).unwrap_err();
    assert_matches!(err, RepoError::ConfigParse(_));
}
