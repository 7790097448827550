use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::ProjectCode;
use crate::error::RepoError;

pub const GNOS_DATA_PATH: &str = "/cghub/data/analysis/download";
pub const GNOS_METADATA_PATH: &str = "/cghub/metadata/analysisFull";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoType {
    pub id: String,
    pub data_path: String,
    pub metadata_path: String,
}

impl RepoType {
    pub fn gnos() -> Self {
        Self {
            id: "GNOS".to_string(),
            data_path: GNOS_DATA_PATH.to_string(),
            metadata_path: GNOS_METADATA_PATH.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorServer {
    pub repo_type: RepoType,
    pub source: String,
    pub name: String,
    pub code: String,
    pub country: String,
    pub base_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub code: ProjectCode,
    pub program: String,
    pub primary_site: Option<String>,
}

pub trait ProjectRegistry: Send + Sync {
    fn project(&self, code: &ProjectCode) -> Result<&Project, RepoError>;
}

pub trait PrimarySiteRegistry: Send + Sync {
    fn primary_site(&self, code: &ProjectCode) -> Option<String>;
}

pub trait ServerRegistry: Send + Sync {
    fn server(&self, repo: &str) -> Option<&MirrorServer>;
}

#[derive(Debug, Clone, Default)]
pub struct Registry {
    projects: HashMap<ProjectCode, Project>,
    servers: Vec<MirrorServer>,
}

impl Registry {
    pub fn new(projects: Vec<Project>, servers: Vec<MirrorServer>) -> Self {
        let projects = projects
            .into_iter()
            .map(|project| (project.code.clone(), project))
            .collect();
        Self { projects, servers }
    }

    pub fn servers(&self) -> &[MirrorServer] {
        &self.servers
    }
}

impl ProjectRegistry for Registry {
    fn project(&self, code: &ProjectCode) -> Result<&Project, RepoError> {
        self.projects
            .get(code)
            .ok_or_else(|| RepoError::UnknownProject(code.to_string()))
    }
}

impl PrimarySiteRegistry for Registry {
    fn primary_site(&self, code: &ProjectCode) -> Option<String> {
        self.projects
            .get(code)
            .and_then(|project| project.primary_site.clone())
    }
}

impl ServerRegistry for Registry {
    fn server(&self, repo: &str) -> Option<&MirrorServer> {
        let wanted = normalize_base_url(repo);
        self.servers
            .iter()
            .find(|server| normalize_base_url(&server.base_url) == wanted)
    }
}

fn normalize_base_url(url: &str) -> String {
    url.trim().trim_end_matches('/').to_lowercase()
}

pub fn default_pcawg_servers() -> Vec<MirrorServer> {
    [
        ("Barcelona", "pcawg-barcelona", "ES", "https://gtrepo-bsc.annailabs.com/"),
        ("Cambridge", "pcawg-cambridge", "UK", "https://gtrepo-ebi.annailabs.com/"),
        (
            "Chicago (ICGC)",
            "pcawg-chicago-icgc",
            "US",
            "https://gtrepo-osdc-icgc.annailabs.com/",
        ),
        (
            "Chicago (TCGA)",
            "pcawg-chicago-tcga",
            "US",
            "https://gtrepo-osdc-tcga.annailabs.com/",
        ),
        ("Heidelberg", "pcawg-heidelberg", "DE", "https://gtrepo-dkfz.annailabs.com/"),
        ("Seoul", "pcawg-seoul", "KR", "https://gtrepo-etri.annailabs.com/"),
        ("Tokyo", "pcawg-tokyo", "JP", "https://gtrepo-riken.annailabs.com/"),
        ("CGHub", "pcawg-cghub", "US", "https://cghub.ucsc.edu/"),
    ]
    .into_iter()
    .map(|(name, code, country, base_url)| MirrorServer {
        repo_type: RepoType::gnos(),
        source: "PCAWG".to_string(),
        name: format!("PCAWG - {name}"),
        code: code.to_string(),
        country: country.to_string(),
        base_url: base_url.to_string(),
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn registry() -> Registry {
        Registry::new(
            vec![Project {
                code: "BRCA-UK".parse().unwrap(),
                program: "ICGC".to_string(),
                primary_site: Some("Breast".to_string()),
            }],
            default_pcawg_servers(),
        )
    }

    #[test]
    fn server_lookup_ignores_trailing_slash() {
        let registry = registry();
        let server = registry
            .server("https://gtrepo-ebi.annailabs.com")
            .unwrap();
        assert_eq!(server.code, "pcawg-cambridge");
        assert!(registry.server("https://unknown.example.org/").is_none());
    }

    #[test]
    fn unknown_project_is_an_error() {
        let registry = registry();
        let code: ProjectCode = "PACA-CA".parse().unwrap();
        assert_matches!(
            registry.project(&code),
            Err(RepoError::UnknownProject(value)) if value == "PACA-CA"
        );
        assert_eq!(registry.primary_site(&code), None);
    }

    #[test]
    fn default_servers_are_gnos() {
        let servers = default_pcawg_servers();
        assert_eq!(servers.len(), 8);
        assert!(servers.iter().all(|server| server.repo_type.id == "GNOS"));
    }
}
