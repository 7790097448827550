use serde_json::Value;

use crate::domain::{Analysis, GnosId, ProjectCode};
use crate::error::RepoError;

pub const LIBRARY_STRATEGY_NAMES: [&str; 2] = ["wgs", "rna_seq"];
pub const SPECIMEN_CLASSES: [&str; 2] = ["normal_specimen", "tumor_specimens"];
pub const WORKFLOW_TYPES: [&str; 8] = [
    "bwa_alignment",
    "sanger_variant_calling",
    "dkfz_embl_variant_calling",
    "broad_variant_calling",
    "muse_variant_calling",
    "broad_tar_variant_calling",
    "tophat",
    "star",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    pub library_strategy_names: Vec<String>,
    pub specimen_classes: Vec<String>,
    pub workflow_types: Vec<String>,
}

impl Default for ArchiveLayout {
    fn default() -> Self {
        Self {
            library_strategy_names: to_strings(&LIBRARY_STRATEGY_NAMES),
            specimen_classes: to_strings(&SPECIMEN_CLASSES),
            workflow_types: to_strings(&WORKFLOW_TYPES),
        }
    }
}

fn to_strings(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

/// A workflow object found in a donor archive, with the path that led to it.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowNode<'a> {
    pub library_strategy_name: &'a str,
    pub specimen_class: &'a str,
    pub workflow_type: &'a str,
    pub workflow: &'a Value,
}

impl WorkflowNode<'_> {
    pub fn analysis(&self) -> Analysis {
        Analysis::new(
            self.library_strategy_name,
            self.specimen_class,
            self.workflow_type,
        )
    }
}

pub fn workflow_nodes<'a>(donor: &'a Value, layout: &'a ArchiveLayout) -> Vec<WorkflowNode<'a>> {
    let mut nodes = Vec::new();
    for library_strategy_name in &layout.library_strategy_names {
        for specimen_class in &layout.specimen_classes {
            let specimens = donor
                .get(library_strategy_name)
                .and_then(|strategy| strategy.get(specimen_class));
            for specimen in as_sequence(specimens) {
                for workflow_type in &layout.workflow_types {
                    let Some(workflow) = specimen.get(workflow_type) else {
                        continue;
                    };
                    nodes.push(WorkflowNode {
                        library_strategy_name,
                        specimen_class,
                        workflow_type,
                        workflow,
                    });
                }
            }
        }
    }
    nodes
}

/// Single specimens and specimen arrays are both read as a sequence.
pub fn as_sequence(node: Option<&Value>) -> Vec<&Value> {
    match node {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.iter().collect(),
        Some(other) => vec![other],
    }
}

pub fn dcc_project_code(donor: &Value) -> Result<ProjectCode, RepoError> {
    required_text(donor, "dcc_project_code", "donor archive")?.parse()
}

pub fn submitter_donor_id(donor: &Value) -> Option<String> {
    text(donor, "submitter_donor_id")
}

pub fn gnos_id(workflow: &Value) -> Result<GnosId, RepoError> {
    required_text(workflow, "gnos_id", "workflow")?.parse()
}

pub fn gnos_repos(workflow: &Value) -> Vec<String> {
    as_sequence(workflow.get("gnos_repo"))
        .into_iter()
        .filter_map(|repo| repo.as_str())
        .map(|repo| repo.trim().to_string())
        .filter(|repo| !repo.is_empty())
        .collect()
}

pub fn gnos_last_modified(workflow: &Value) -> Result<String, RepoError> {
    as_sequence(workflow.get("gnos_last_modified"))
        .into_iter()
        .find_map(|value| value.as_str())
        .map(|value| value.to_string())
        .ok_or_else(|| RepoError::MissingField {
            field: "gnos_last_modified",
            context: "workflow".to_string(),
        })
}

pub fn specimen_type(workflow: &Value) -> Option<String> {
    text(workflow, "dcc_specimen_type")
}

pub fn submitter_specimen_id(workflow: &Value) -> Option<String> {
    text(workflow, "submitter_specimen_id")
}

pub fn submitter_sample_id(workflow: &Value) -> Option<String> {
    text(workflow, "submitter_sample_id")
}

pub fn files(workflow: &Value) -> &[Value] {
    workflow
        .get("files")
        .and_then(|files| files.as_array())
        .map(|files| files.as_slice())
        .unwrap_or(&[])
}

pub(crate) fn text(node: &Value, field: &str) -> Option<String> {
    node.get(field)
        .and_then(|value| value.as_str())
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(|value| value.to_string())
}

fn required_text(node: &Value, field: &'static str, context: &str) -> Result<String, RepoError> {
    text(node, field).ok_or_else(|| RepoError::MissingField {
        field,
        context: context.to_string(),
    })
}
