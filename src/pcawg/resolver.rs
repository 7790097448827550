use chrono::DateTime;
use sha2::{Digest, Sha256};
use tracing::warn;

use crate::domain::{Analysis, FileFormat, GnosId};
use crate::error::RepoError;
use crate::model::{AnalysisMethod, DataCategorization};
use crate::registry::{MirrorServer, ServerRegistry};

const ALIGNED_READS: &str = "Aligned Reads";

pub fn resolve_id(gnos_id: &GnosId, file_name: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(gnos_id.as_str().as_bytes());
    hasher.update(b"/");
    hasher.update(file_name.as_bytes());
    hex::encode(hasher.finalize())
}

/// Parses an ISO-8601 date-time with offset into epoch seconds.
pub fn resolve_last_modified(text: &str) -> Result<i64, RepoError> {
    let trimmed = text.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .or_else(|_| DateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M%:z"))
        .map(|date_time| date_time.timestamp())
        .map_err(|err| RepoError::InvalidTimestamp {
            value: text.to_string(),
            message: err.to_string(),
        })
}

pub fn resolve_file_format(file_name: &str) -> Result<FileFormat, RepoError> {
    FileFormat::from_file_name(file_name)
        .filter(|format| !format.is_index())
        .ok_or_else(|| RepoError::InvalidArchive(format!("unsupported file type '{file_name}'")))
}

pub fn resolve_analysis_method(analysis: &Analysis) -> Result<AnalysisMethod, RepoError> {
    let (analysis_type, software) = match analysis.workflow_type.as_str() {
        "bwa_alignment" => ("Reference alignment", "BWA MEM"),
        "sanger_variant_calling" => ("Variant calling", "Sanger variant call pipeline"),
        "dkfz_embl_variant_calling" => ("Variant calling", "DKFZ/EMBL variant call pipeline"),
        "broad_variant_calling" => ("Variant calling", "Broad variant call pipeline"),
        "muse_variant_calling" => ("Variant calling", "MuSE variant call pipeline"),
        "broad_tar_variant_calling" => ("Variant calling", "Broad TAR variant call pipeline"),
        "tophat" => ("RNA-Seq alignment", "TopHat2"),
        "star" => ("RNA-Seq alignment", "STAR"),
        other => return Err(RepoError::UnknownWorkflowType(other.to_string())),
    };
    Ok(AnalysisMethod {
        analysis_type: analysis_type.to_string(),
        software: software.to_string(),
    })
}

pub fn resolve_data_categorization(
    analysis: &Analysis,
    file_name: &str,
) -> Result<DataCategorization, RepoError> {
    let experimental_strategy = match analysis.library_strategy_name.as_str() {
        "wgs" => "WGS",
        "rna_seq" => "RNA-Seq",
        other => return Err(RepoError::UnknownLibraryStrategy(other.to_string())),
    };
    let method = resolve_analysis_method(analysis)?;
    let format = FileFormat::from_file_name(file_name);

    let data_type = match (method.analysis_type.as_str(), format) {
        ("Variant calling", Some(FileFormat::Vcf)) => resolve_variant_data_type(file_name),
        ("Reference alignment" | "RNA-Seq alignment", Some(FileFormat::Bam)) => {
            Some(ALIGNED_READS)
        }
        _ => None,
    };

    Ok(DataCategorization {
        data_type: data_type.map(str::to_string),
        experimental_strategy: experimental_strategy.to_string(),
    })
}

fn resolve_variant_data_type(file_name: &str) -> Option<&'static str> {
    let lower = file_name.to_lowercase();
    let somatic = if lower.contains("somatic") {
        true
    } else if lower.contains("germline") {
        false
    } else {
        return None;
    };

    let has_part = |part: &str| lower.split(['.', '_', '-']).any(|token| token == part);
    let (somatic_type, germline_type) = if has_part("snv") || has_part("indel") {
        ("SSM", "SGV")
    } else if has_part("sv") {
        ("StSM", "StGV")
    } else if has_part("cnv") {
        ("CNSM", "CNGV")
    } else {
        return None;
    };
    Some(if somatic { somatic_type } else { germline_type })
}

/// Looks up every repository identifier; identifiers with no registered
/// server are logged and skipped.
pub fn resolve_servers<'r>(
    registry: &'r dyn ServerRegistry,
    gnos_id: &GnosId,
    repos: &[String],
) -> Vec<&'r MirrorServer> {
    repos
        .iter()
        .filter_map(|repo| {
            let server = registry.server(repo);
            if server.is_none() {
                warn!(
                    gnos_id = %gnos_id,
                    repo = %repo,
                    "no mirror server registered for repository"
                );
            }
            server
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn analysis(strategy: &str, workflow: &str) -> Analysis {
        Analysis::new(strategy, "tumor_specimens", workflow)
    }

    #[test]
    fn id_depends_only_on_gnos_id_and_name() {
        let gnos_id: GnosId = "1b2c".parse().unwrap();
        let other: GnosId = "1b2d".parse().unwrap();
        let id = resolve_id(&gnos_id, "a.bam");
        assert_eq!(id, resolve_id(&gnos_id, "a.bam"));
        assert_eq!(id.len(), 64);
        assert_ne!(id, resolve_id(&other, "a.bam"));
        assert_ne!(id, resolve_id(&gnos_id, "a.bam.bai"));
    }

    #[test]
    fn last_modified_parses_offsets() {
        assert_eq!(
            resolve_last_modified("2016-01-01T00:00:00+00:00").unwrap(),
            1451606400
        );
        assert_eq!(
            resolve_last_modified("2016-01-01T02:00:00+02:00").unwrap(),
            1451606400
        );
        assert_eq!(
            resolve_last_modified("2016-01-01T00:00:00.250Z").unwrap(),
            1451606400
        );
    }

    #[test]
    fn last_modified_rejects_garbage() {
        assert_matches!(
            resolve_last_modified("yesterday"),
            Err(RepoError::InvalidTimestamp { .. })
        );
    }

    #[test]
    fn alignment_bam_is_aligned_reads() {
        let categorization =
            resolve_data_categorization(&analysis("wgs", "bwa_alignment"), "a.bam").unwrap();
        assert_eq!(categorization.data_type.as_deref(), Some("Aligned Reads"));
        assert_eq!(categorization.experimental_strategy, "WGS");

        let categorization =
            resolve_data_categorization(&analysis("rna_seq", "star"), "a.xml").unwrap();
        assert_eq!(categorization.data_type, None);
        assert_eq!(categorization.experimental_strategy, "RNA-Seq");
    }

    #[test]
    fn vcf_sub_types_come_from_file_name() {
        let sanger = analysis("wgs", "sanger_variant_calling");
        let data_type = |name: &str| {
            resolve_data_categorization(&sanger, name)
                .unwrap()
                .data_type
        };
        assert_eq!(data_type("x.somatic.snv_mnv.vcf.gz").as_deref(), Some("SSM"));
        assert_eq!(data_type("x.somatic.indel.vcf.gz").as_deref(), Some("SSM"));
        assert_eq!(data_type("x.somatic.sv.vcf.gz").as_deref(), Some("StSM"));
        assert_eq!(data_type("x.somatic.cnv.vcf.gz").as_deref(), Some("CNSM"));
        assert_eq!(data_type("x.germline.indel.vcf.gz").as_deref(), Some("SGV"));
        assert_eq!(data_type("x.germline.sv.vcf.gz").as_deref(), Some("StGV"));
        assert_eq!(data_type("x.vcf.gz"), None);
        assert_eq!(data_type("x.somatic.bam"), None);
    }

    #[test]
    fn unknown_workflow_is_fatal() {
        assert_matches!(
            resolve_analysis_method(&analysis("wgs", "mystery")),
            Err(RepoError::UnknownWorkflowType(_))
        );
        assert_matches!(
            resolve_data_categorization(&analysis("wxs", "bwa_alignment"), "a.bam"),
            Err(RepoError::UnknownLibraryStrategy(_))
        );
    }
}
