use std::fs;
use std::path::PathBuf;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::error::RepoError;
use crate::gdc::DEFAULT_API_URL;
use crate::pcawg::ArchiveLayout;
use crate::registry::{MirrorServer, Project, Registry, RepoType, default_pcawg_servers};

pub const DEFAULT_CONFIG_NAME: &str = "dcc-repo.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub schema_version: Option<u32>,
    #[serde(default)]
    pub store: Option<String>,
    #[serde(default)]
    pub projects: Vec<ProjectEntry>,
    #[serde(default)]
    pub servers: Option<Vec<ServerEntry>>,
    #[serde(default)]
    pub pcawg: PcawgSection,
    #[serde(default)]
    pub gdc: GdcSection,
    #[serde(default)]
    pub cloud: Option<CloudSection>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ProjectEntry {
    pub code: String,
    pub program: String,
    #[serde(default)]
    pub primary_site: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct ServerEntry {
    #[serde(default)]
    pub repo_type: Option<RepoType>,
    #[serde(default)]
    pub source: Option<String>,
    pub name: String,
    pub code: String,
    pub country: String,
    pub base_url: String,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct PcawgSection {
    #[serde(default)]
    pub archive: Option<String>,
    #[serde(default)]
    pub library_strategy_names: Option<Vec<String>>,
    #[serde(default)]
    pub specimen_classes: Option<Vec<String>>,
    #[serde(default)]
    pub workflow_types: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct GdcSection {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CloudSection {
    pub repo_url: String,
    pub repo_dir: String,
    #[serde(default = "default_repo_dir_glob")]
    pub repo_dir_glob: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub schema_version: u32,
    pub store_root: Option<Utf8PathBuf>,
    pub registry: Registry,
    pub layout: ArchiveLayout,
    pub archive: Option<String>,
    pub gdc_url: String,
    pub cloud: Option<CloudSection>,
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, RepoError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_NAME),
        };

        if path.is_none() && !config_path.exists() {
            return Err(RepoError::MissingConfig);
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| RepoError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| RepoError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, RepoError> {
        let schema_version = config.schema_version.unwrap_or(1);

        let projects = config
            .projects
            .into_iter()
            .map(|entry| {
                Ok(Project {
                    code: entry.code.parse()?,
                    program: entry.program,
                    primary_site: entry.primary_site.filter(|site| !site.trim().is_empty()),
                })
            })
            .collect::<Result<Vec<_>, RepoError>>()?;

        let servers = match config.servers {
            Some(entries) => entries.into_iter().map(resolve_server).collect(),
            None => default_pcawg_servers(),
        };

        let defaults = ArchiveLayout::default();
        let layout = ArchiveLayout {
            library_strategy_names: config
                .pcawg
                .library_strategy_names
                .unwrap_or(defaults.library_strategy_names),
            specimen_classes: config
                .pcawg
                .specimen_classes
                .unwrap_or(defaults.specimen_classes),
            workflow_types: config
                .pcawg
                .workflow_types
                .unwrap_or(defaults.workflow_types),
        };

        Ok(ResolvedConfig {
            schema_version,
            store_root: config.store.map(Utf8PathBuf::from),
            registry: Registry::new(projects, servers),
            layout,
            archive: config.pcawg.archive,
            gdc_url: config
                .gdc
                .url
                .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            cloud: config.cloud,
        })
    }
}

fn resolve_server(entry: ServerEntry) -> MirrorServer {
    MirrorServer {
        repo_type: entry.repo_type.unwrap_or_else(RepoType::gnos),
        source: entry.source.unwrap_or_else(|| "PCAWG".to_string()),
        name: entry.name,
        code: entry.code,
        country: entry.country,
        base_url: entry.base_url,
    }
}

pub fn default_repo_dir_glob() -> String {
    "*".to_string()
}
