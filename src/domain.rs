use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RepoError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FileFormat {
    Bam,
    Vcf,
    Xml,
    Bai,
    Tbi,
}

impl FileFormat {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_lowercase();
        if lower.ends_with(".bam") {
            Some(FileFormat::Bam)
        } else if lower.ends_with(".vcf.gz") {
            Some(FileFormat::Vcf)
        } else if lower.ends_with(".xml") {
            Some(FileFormat::Xml)
        } else if lower.ends_with(".bai") {
            Some(FileFormat::Bai)
        } else if lower.ends_with(".tbi") {
            Some(FileFormat::Tbi)
        } else {
            None
        }
    }

    pub fn is_index(self) -> bool {
        matches!(self, FileFormat::Bai | FileFormat::Tbi)
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FileFormat::Bam => write!(f, "BAM"),
            FileFormat::Vcf => write!(f, "VCF"),
            FileFormat::Xml => write!(f, "XML"),
            FileFormat::Bai => write!(f, "BAI"),
            FileFormat::Tbi => write!(f, "TBI"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileAccess {
    Controlled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Study {
    #[serde(rename = "PCAWG")]
    Pcawg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FileId(u64);

impl FileId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FI{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectCode(String);

impl ProjectCode {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ProjectCode {
    type Err = RepoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        let is_valid = !normalized.is_empty()
            && normalized
                .chars()
                .all(|ch| ch.is_ascii_alphanumeric() || ch == '-');
        if !is_valid {
            return Err(RepoError::InvalidArchive(format!(
                "invalid project code '{value}'"
            )));
        }
        Ok(Self(normalized.to_string()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GnosId(String);

impl GnosId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for GnosId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GnosId {
    type Err = RepoError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        if normalized.is_empty() || normalized.chars().any(char::is_whitespace) {
            return Err(RepoError::InvalidArchive(format!(
                "invalid gnos id '{value}'"
            )));
        }
        Ok(Self(normalized.to_string()))
    }
}

/// How a file was produced: the archive path that led to its workflow node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Analysis {
    pub library_strategy_name: String,
    pub specimen_class: String,
    pub workflow_type: String,
}

impl Analysis {
    pub fn new(library_strategy_name: &str, specimen_class: &str, workflow_type: &str) -> Self {
        Self {
            library_strategy_name: library_strategy_name.to_string(),
            specimen_class: specimen_class.to_string(),
            workflow_type: workflow_type.to_string(),
        }
    }
}

impl fmt::Display for Analysis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}",
            self.library_strategy_name, self.specimen_class, self.workflow_type
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    File,
    GdcFile,
    CloudTransferJob,
}

impl Collection {
    pub fn as_str(self) -> &'static str {
        match self {
            Collection::File => "file",
            Collection::GdcFile => "gdc_file",
            Collection::CloudTransferJob => "cloud_transfer_job",
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_project_code_valid() {
        let code: ProjectCode = " BRCA-UK ".parse().unwrap();
        assert_eq!(code.as_str(), "BRCA-UK");
    }

    #[test]
    fn parse_project_code_invalid() {
        let err = "BRCA UK".parse::<ProjectCode>().unwrap_err();
        assert_matches!(err, RepoError::InvalidArchive(_));
    }

    #[test]
    fn parse_gnos_id_invalid() {
        let err = "  ".parse::<GnosId>().unwrap_err();
        assert_matches!(err, RepoError::InvalidArchive(_));
    }

    #[test]
    fn file_format_from_name() {
        assert_eq!(FileFormat::from_file_name("a.BAM"), Some(FileFormat::Bam));
        assert_eq!(
            FileFormat::from_file_name("a.somatic.snv_mnv.vcf.gz"),
            Some(FileFormat::Vcf)
        );
        assert_eq!(FileFormat::from_file_name("a.vcf"), None);
        assert!(FileFormat::from_file_name("a.vcf.gz.tbi").unwrap().is_index());
    }

    #[test]
    fn file_format_serializes_uppercase() {
        let json = serde_json::to_string(&FileFormat::Bai).unwrap();
        assert_eq!(json, "\"BAI\"");
    }
}
