use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;

use regex::Regex;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::RepoError;
use crate::fs_util;

const COMPLETED_JOBS_DIR: &str = "completed-jobs";

pub trait TransferJobReader: Send + Sync {
    fn read_jobs(&self) -> Result<Vec<Value>, RepoError>;
}

/// Reads completed cloud transfer jobs from a local checkout of the job
/// tracking git repository.
#[derive(Debug, Clone)]
pub struct CloudTransferJobReader {
    repo_url: String,
    repo_dir: PathBuf,
    repo_dir_glob: String,
}

impl CloudTransferJobReader {
    pub fn new(
        repo_url: impl Into<String>,
        repo_dir: impl Into<PathBuf>,
        repo_dir_glob: impl Into<String>,
    ) -> Self {
        Self {
            repo_url: repo_url.into(),
            repo_dir: repo_dir.into(),
            repo_dir_glob: repo_dir_glob.into(),
        }
    }

    pub fn update_local_repo(&self) -> Result<(), RepoError> {
        let git = find_in_path("git").ok_or_else(|| RepoError::MissingTool("git".to_string()))?;
        if self.repo_dir.join(".git").exists() {
            info!("Pulling '{}' in '{}'...", self.repo_url, self.repo_dir.display());
            run_git(&git, &["pull".to_string()], Some(&self.repo_dir))
        } else {
            fs::create_dir_all(&self.repo_dir).map_err(|err| {
                RepoError::Filesystem(format!("create {}: {err}", self.repo_dir.display()))
            })?;
            info!("Cloning '{}' to '{}'...", self.repo_url, self.repo_dir.display());
            let args = vec![
                "clone".to_string(),
                self.repo_url.clone(),
                self.repo_dir.display().to_string(),
            ];
            run_git(&git, &args, None)
        }
    }

    pub fn read_completed_jobs(&self) -> Result<Vec<Value>, RepoError> {
        let mut jobs = Vec::new();
        for completed_dir in self.resolve_completed_dirs()? {
            info!(
                "Resolving job files from completed dir '{}'...",
                completed_dir.display()
            );
            let job_files = resolve_job_files(&completed_dir)?;
            info!(
                jobs = job_files.len(),
                "Reading completed jobs from '{}'...",
                completed_dir.display()
            );
            for path in job_files {
                jobs.push(read_job(&path)?);
            }
        }
        Ok(jobs)
    }

    fn resolve_completed_dirs(&self) -> Result<Vec<PathBuf>, RepoError> {
        info!("Resolving repo dirs using glob: '{}'", self.repo_dir_glob);
        let pattern = glob_to_regex(&self.repo_dir_glob)?;
        let entries = fs::read_dir(&self.repo_dir).map_err(|err| {
            RepoError::Filesystem(format!("read {}: {err}", self.repo_dir.display()))
        })?;

        let mut dirs = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| RepoError::Filesystem(err.to_string()))?;
            let path = entry.path();
            let matches = path
                .file_name()
                .and_then(|name| name.to_str())
                .map(|name| pattern.is_match(name))
                .unwrap_or(false);
            if matches && path.is_dir() {
                dirs.push(path.join(COMPLETED_JOBS_DIR));
            }
        }
        dirs.sort();
        Ok(dirs)
    }
}

impl TransferJobReader for CloudTransferJobReader {
    fn read_jobs(&self) -> Result<Vec<Value>, RepoError> {
        self.update_local_repo()?;
        self.read_completed_jobs()
    }
}

pub fn glob_to_regex(glob: &str) -> Result<Regex, RepoError> {
    let mut pattern = String::from("^");
    for ch in glob.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            other => pattern.push_str(&regex::escape(&other.to_string())),
        }
    }
    pattern.push('$');
    Regex::new(&pattern).map_err(|err| RepoError::ConfigParse(format!("repo_dir_glob: {err}")))
}

fn resolve_job_files(completed_dir: &Path) -> Result<Vec<PathBuf>, RepoError> {
    if !completed_dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = fs::read_dir(completed_dir).map_err(|err| {
        RepoError::Filesystem(format!("read {}: {err}", completed_dir.display()))
    })?;
    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|err| RepoError::Filesystem(err.to_string()))?
            .path();
        if fs_util::is_json_file(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn read_job(path: &Path) -> Result<Value, RepoError> {
    debug!("Reading '{}'...", path.display());
    let content = fs::read_to_string(path)
        .map_err(|err| RepoError::Filesystem(format!("read {}: {err}", path.display())))?;
    let job: Value = serde_json::from_str(&content)
        .map_err(|err| RepoError::Serialization(format!("{}: {err}", path.display())))?;
    if !job.is_object() {
        return Err(RepoError::Serialization(format!(
            "{}: transfer job is not a JSON object",
            path.display()
        )));
    }
    Ok(job)
}

fn run_git(git: &Path, args: &[String], cwd: Option<&Path>) -> Result<(), RepoError> {
    let mut cmd = Command::new(git);
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let output = cmd
        .output()
        .map_err(|err| RepoError::Git(err.to_string()))?;
    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
    let message = if stderr.is_empty() {
        format!("git {} failed", args.first().map(String::as_str).unwrap_or_default())
    } else {
        stderr
    };
    Err(RepoError::Git(message))
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    std::env::split_paths(&path_var)
        .flat_map(|dir| [dir.join(format!("{name}.exe")), dir.join(name)])
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_matches_whole_name() {
        let pattern = glob_to_regex("ceph_transfer_*").unwrap();
        assert!(pattern.is_match("ceph_transfer_aws"));
        assert!(!pattern.is_match("old_ceph_transfer_aws"));

        let single = glob_to_regex("job?.d").unwrap();
        assert!(single.is_match("job1.d"));
        assert!(!single.is_match("job12.d"));
        assert!(!single.is_match("job1xd"));
    }
}
