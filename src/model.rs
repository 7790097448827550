use serde::{Deserialize, Serialize};

use crate::domain::{FileAccess, FileFormat, FileId, Study};
use crate::registry::MirrorServer;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryFile {
    pub id: String,
    pub file_id: FileId,
    pub study: Vec<Study>,
    pub access: FileAccess,
    pub data_bundle: DataBundle,
    pub analysis_method: AnalysisMethod,
    pub data_categorization: DataCategorization,
    pub reference_genome: ReferenceGenome,
    pub file_copies: Vec<FileCopy>,
    pub donors: Vec<FileDonor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataBundle {
    pub data_bundle_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisMethod {
    pub analysis_type: String,
    pub software: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DataCategorization {
    pub data_type: Option<String>,
    pub experimental_strategy: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceGenome {
    pub genome_build: String,
    pub reference_name: String,
    pub download_url: String,
}

impl ReferenceGenome {
    pub fn pcawg() -> Self {
        Self {
            genome_build: "GRCh37".to_string(),
            reference_name: "hs37d5".to_string(),
            download_url: "ftp://ftp.sanger.ac.uk/pub/project/PanCancer/genome.fa.gz".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileCopy {
    pub file_name: String,
    pub file_format: FileFormat,
    pub file_size: u64,
    pub file_md5sum: Option<String>,
    pub last_modified: i64,
    pub index_file: Option<IndexFile>,
    pub repo_type: String,
    pub repo_org: String,
    pub repo_name: String,
    pub repo_code: String,
    pub repo_country: String,
    pub repo_base_url: String,
    pub repo_data_path: String,
    pub repo_metadata_path: String,
}

/// File level fields shared by every copy of one data file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyTemplate {
    pub file_name: String,
    pub file_format: FileFormat,
    pub file_size: u64,
    pub file_md5sum: Option<String>,
    pub last_modified: i64,
    pub index_file: Option<IndexFile>,
}

impl FileCopy {
    pub fn new(template: &CopyTemplate, server: &MirrorServer) -> Self {
        Self {
            file_name: template.file_name.clone(),
            file_format: template.file_format,
            file_size: template.file_size,
            file_md5sum: template.file_md5sum.clone(),
            last_modified: template.last_modified,
            index_file: template.index_file.clone(),
            repo_type: server.repo_type.id.clone(),
            repo_org: server.source.clone(),
            repo_name: server.name.clone(),
            repo_code: server.code.clone(),
            repo_country: server.country.clone(),
            repo_base_url: server.base_url.clone(),
            repo_data_path: server.repo_type.data_path.clone(),
            repo_metadata_path: server.repo_type.metadata_path.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexFile {
    pub id: String,
    pub file_id: FileId,
    pub file_name: String,
    pub file_format: FileFormat,
    pub file_size: u64,
    pub file_md5sum: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDonor {
    pub project_code: String,
    pub program: String,
    pub primary_site: Option<String>,
    pub study: Study,
    pub donor_id: Option<String>,
    pub specimen_id: Option<Vec<String>>,
    pub specimen_type: Option<String>,
    pub sample_id: Option<Vec<String>>,
    pub submitted_donor_id: Option<String>,
    pub submitted_specimen_id: Option<String>,
    pub submitted_sample_id: Option<String>,
    pub other_identifiers: OtherIdentifiers,
}

/// TCGA barcodes are filled in by identity resolution after import.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OtherIdentifiers {
    pub tcga_participant_barcode: Option<String>,
    pub tcga_sample_barcode: Option<String>,
    pub tcga_aliquot_barcode: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::default_pcawg_servers;

    #[test]
    fn file_copy_takes_routing_from_server() {
        let servers = default_pcawg_servers();
        let server = &servers[0];
        let template = CopyTemplate {
            file_name: "a.bam".to_string(),
            file_format: FileFormat::Bam,
            file_size: 10,
            file_md5sum: Some("abc".to_string()),
            last_modified: 1451606400,
            index_file: None,
        };

        let copy = FileCopy::new(&template, server);
        assert_eq!(copy.repo_code, server.code);
        assert_eq!(copy.repo_data_path, server.repo_type.data_path);
        assert_eq!(copy.file_size, 10);
    }

    #[test]
    fn unset_identifiers_serialize_as_null() {
        let json = serde_json::to_value(OtherIdentifiers::default()).unwrap();
        assert!(json["tcgaParticipantBarcode"].is_null());
        assert!(json.get("tcgaAliquotBarcode").is_some());
    }
}
