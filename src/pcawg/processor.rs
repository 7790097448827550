use serde_json::Value;
use tracing::{debug, info, warn};

use crate::domain::{FileAccess, FileFormat, GnosId, ProjectCode, Study};
use crate::error::RepoError;
use crate::ids::FileIdAllocator;
use crate::model::{
    CopyTemplate, DataBundle, FileCopy, FileDonor, IndexFile, OtherIdentifiers, ReferenceGenome,
    RepositoryFile,
};
use crate::pcawg::archive::{self, ArchiveLayout, WorkflowNode};
use crate::pcawg::files::{self, WorkflowFile};
use crate::pcawg::resolver;
use crate::registry::{PrimarySiteRegistry, ProjectRegistry, ServerRegistry};

/// Read-only collaborators shared by every donor. Only the id allocator
/// carries state across records.
#[derive(Clone, Copy)]
pub struct FileContext<'a> {
    pub ids: &'a dyn FileIdAllocator,
    pub projects: &'a dyn ProjectRegistry,
    pub primary_sites: &'a dyn PrimarySiteRegistry,
    pub servers: &'a dyn ServerRegistry,
}

pub struct PcawgFileProcessor<'a> {
    context: FileContext<'a>,
    layout: ArchiveLayout,
    reference_genome: ReferenceGenome,
}

struct DonorInfo {
    project_code: ProjectCode,
    program: String,
    primary_site: Option<String>,
    submitted_donor_id: Option<String>,
}

impl<'a> PcawgFileProcessor<'a> {
    pub fn new(context: FileContext<'a>, layout: ArchiveLayout) -> Self {
        Self {
            context,
            layout,
            reference_genome: ReferenceGenome::pcawg(),
        }
    }

    pub fn process_donors(&self, donors: &[Value]) -> Result<Vec<RepositoryFile>, RepoError> {
        info!(donors = donors.len(), "Creating donor files...");
        let mut files = Vec::new();
        for donor in donors {
            files.extend(self.process_donor(donor)?);
        }
        info!(files = files.len(), "Created donor files");
        Ok(files)
    }

    /// Every record of a donor is resolved before any is returned, so an
    /// unknown project aborts the donor without partial output.
    pub fn process_donor(&self, donor: &Value) -> Result<Vec<RepositoryFile>, RepoError> {
        if !donor.is_object() {
            return Err(RepoError::InvalidArchive(
                "donor archive is not a JSON object".to_string(),
            ));
        }

        let candidates = archive::workflow_nodes(donor, &self.layout)
            .into_iter()
            .flat_map(|node| {
                files::included_files(node.workflow)
                    .into_iter()
                    .map(move |file| (node, file))
            })
            .collect::<Vec<_>>();
        if candidates.is_empty() {
            return Ok(Vec::new());
        }

        let project_code = archive::dcc_project_code(donor)?;
        let project = self.context.projects.project(&project_code)?;
        let donor_info = DonorInfo {
            primary_site: self.context.primary_sites.primary_site(&project_code),
            program: project.program.clone(),
            submitted_donor_id: archive::submitter_donor_id(donor),
            project_code,
        };

        candidates
            .into_iter()
            .map(|(node, file)| self.create_donor_file(&donor_info, node, file))
            .collect()
    }

    fn create_donor_file(
        &self,
        donor: &DonorInfo,
        node: WorkflowNode<'_>,
        workflow_file: WorkflowFile<'_>,
    ) -> Result<RepositoryFile, RepoError> {
        let workflow = node.workflow;
        let analysis = node.analysis();

        let gnos_id = archive::gnos_id(workflow)?;
        let file_name = workflow_file
            .name()
            .ok_or_else(|| RepoError::MissingField {
                field: "file_name",
                context: format!("workflow {gnos_id}"),
            })?;
        let file_format = resolver::resolve_file_format(file_name)?;
        let id = resolver::resolve_id(&gnos_id, file_name);
        let last_modified =
            resolver::resolve_last_modified(&archive::gnos_last_modified(workflow)?)?;
        let analysis_method = resolver::resolve_analysis_method(&analysis)?;
        let data_categorization = resolver::resolve_data_categorization(&analysis, file_name)?;
        let servers = resolver::resolve_servers(
            self.context.servers,
            &gnos_id,
            &archive::gnos_repos(workflow),
        );
        debug!(gnos_id = %gnos_id, file_name, analysis = %analysis, "Resolved donor file");

        let index_candidates = files::index_candidates(workflow, file_name);
        if index_candidates.is_ambiguous() {
            warn!(
                "Both '{file_name}.bai' and '{file_name}.tbi' files are present at the same time!"
            );
        }
        let index_file = index_candidates
            .select(file_format)
            .map(|(format, file)| self.create_index_file(&gnos_id, format, file))
            .transpose()?;

        let template = CopyTemplate {
            file_name: file_name.to_string(),
            file_format,
            file_size: workflow_file.size(),
            file_md5sum: workflow_file.md5sum().map(str::to_string),
            last_modified,
            index_file,
        };
        if servers.is_empty() {
            warn!(
                gnos_id = %gnos_id,
                file_name,
                "File has no resolvable mirror server; emitting it without copies"
            );
        }
        let file_copies = servers
            .iter()
            .map(|server| FileCopy::new(&template, server))
            .collect();

        let file_donor = FileDonor {
            project_code: donor.project_code.to_string(),
            program: donor.program.clone(),
            primary_site: donor.primary_site.clone(),
            study: Study::Pcawg,
            donor_id: None,
            specimen_id: None,
            specimen_type: archive::specimen_type(workflow),
            sample_id: None,
            submitted_donor_id: donor.submitted_donor_id.clone(),
            submitted_specimen_id: archive::submitter_specimen_id(workflow),
            submitted_sample_id: archive::submitter_sample_id(workflow),
            other_identifiers: OtherIdentifiers::default(),
        };

        Ok(RepositoryFile {
            file_id: self.context.ids.ensure_file_id(&id),
            id,
            study: vec![Study::Pcawg],
            access: FileAccess::Controlled,
            data_bundle: DataBundle {
                data_bundle_id: gnos_id.to_string(),
            },
            analysis_method,
            data_categorization,
            reference_genome: self.reference_genome.clone(),
            file_copies,
            donors: vec![file_donor],
        })
    }

    fn create_index_file(
        &self,
        gnos_id: &GnosId,
        file_format: FileFormat,
        index: WorkflowFile<'_>,
    ) -> Result<IndexFile, RepoError> {
        let file_name = index.name().ok_or_else(|| RepoError::MissingField {
            field: "file_name",
            context: format!("index file of workflow {gnos_id}"),
        })?;
        let id = resolver::resolve_id(gnos_id, file_name);
        Ok(IndexFile {
            file_id: self.context.ids.ensure_file_id(&id),
            id,
            file_name: file_name.to_string(),
            file_format,
            file_size: index.size(),
            file_md5sum: index.md5sum().map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::ids::MemoryFileIds;
    use crate::registry::{Project, Registry, default_pcawg_servers};

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
    fn donor_without_candidates_needs_no_project() {
        let registry = registry();
        let ids = MemoryFileIds::new();
        let context = FileContext {
            ids: &ids,
            projects: &registry,
            primary_sites: &registry,
            servers: &registry,
        };
        let processor = PcawgFileProcessor::new(context, ArchiveLayout::default());
        let donor = json!({"dcc_project_code": "NOPE-XX", "wgs": {}});
        assert!(processor.process_donor(&donor).unwrap().is_empty());
        assert!(ids.is_empty());
    }

    #[test]
    fn non_object_donor_is_rejected() {
        let registry = registry();
        let ids = MemoryFileIds::new();
        let context = FileContext {
            ids: &ids,
            projects: &registry,
            primary_sites: &registry,
            servers: &registry,
        };
        let processor = PcawgFileProcessor::new(context, ArchiveLayout::default());
        assert!(processor.process_donor(&json!([1, 2])).is_err());
    }
}
