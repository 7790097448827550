use serde_json::Value;

use crate::domain::FileFormat;
use crate::pcawg::archive;

const INCLUDED_EXTENSIONS: [&str; 3] = [".bam", ".vcf.gz", ".xml"];

/// One entry of a workflow's `files` list.
///
/// Entries may carry a BAM specific field set (`bam_file_*`) next to the
/// generic one (`file_*`); either may be the unpopulated one.
#[derive(Debug, Clone, Copy)]
pub struct WorkflowFile<'a> {
    entry: &'a Value,
}

impl<'a> WorkflowFile<'a> {
    pub fn new(entry: &'a Value) -> Self {
        Self { entry }
    }

    /// `bam_file_name`, falling back to `file_name`.
    pub fn name(&self) -> Option<&'a str> {
        first_non_empty(self.text("bam_file_name"), self.text("file_name"))
    }

    /// `bam_file_md5sum`, falling back to `file_md5sum`.
    pub fn md5sum(&self) -> Option<&'a str> {
        first_non_empty(self.text("bam_file_md5sum"), self.text("file_md5sum"))
    }

    /// The larger of `file_size` and `bam_file_size`, unset counting as zero.
    pub fn size(&self) -> u64 {
        larger_size(self.number("file_size"), self.number("bam_file_size"))
    }

    fn text(&self, field: &str) -> Option<&'a str> {
        self.entry.get(field).and_then(|value| value.as_str())
    }

    fn number(&self, field: &str) -> u64 {
        match self.entry.get(field) {
            Some(Value::Number(number)) => number.as_u64().unwrap_or(0),
            Some(Value::String(text)) => text.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }
}

pub fn first_non_empty<'a>(
    primary: Option<&'a str>,
    secondary: Option<&'a str>,
) -> Option<&'a str> {
    primary
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or_else(|| secondary.map(str::trim).filter(|value| !value.is_empty()))
}

pub fn larger_size(primary: u64, secondary: u64) -> u64 {
    primary.max(secondary)
}

pub fn included_files(workflow: &Value) -> Vec<WorkflowFile<'_>> {
    archive::files(workflow)
        .iter()
        .map(WorkflowFile::new)
        .filter(|file| file.name().is_some_and(is_included_name))
        .collect()
}

fn is_included_name(file_name: &str) -> bool {
    let lower = file_name.to_lowercase();
    INCLUDED_EXTENSIONS
        .iter()
        .any(|extension| lower.ends_with(extension))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IndexCandidates<'a> {
    pub bai: Option<WorkflowFile<'a>>,
    pub tbi: Option<WorkflowFile<'a>>,
}

impl<'a> IndexCandidates<'a> {
    pub fn is_ambiguous(&self) -> bool {
        self.bai.is_some() && self.tbi.is_some()
    }

    /// Picks the index for a data file of `format`. When both variants exist
    /// the one matching the data format wins: TBI for VCF, BAI otherwise.
    pub fn select(&self, format: FileFormat) -> Option<(FileFormat, WorkflowFile<'a>)> {
        let bai = self.bai.map(|file| (FileFormat::Bai, file));
        let tbi = self.tbi.map(|file| (FileFormat::Tbi, file));
        match format {
            FileFormat::Vcf => tbi.or(bai),
            _ => bai.or(tbi),
        }
    }
}

pub fn index_candidates<'a>(workflow: &'a Value, file_name: &str) -> IndexCandidates<'a> {
    IndexCandidates {
        bai: find_file(workflow, &format!("{file_name}.bai")),
        tbi: find_file(workflow, &format!("{file_name}.tbi")),
    }
}

fn find_file<'a>(workflow: &'a Value, file_name: &str) -> Option<WorkflowFile<'a>> {
    archive::files(workflow)
        .iter()
        .map(WorkflowFile::new)
        .find(|file| file.name() == Some(file_name))
}
