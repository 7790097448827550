use std::fs;

use assert_matches::assert_matches;

use dcc_repository::error::RepoError;
use dcc_repository::transfer::CloudTransferJobReader;

#[test]
fn reads_completed_jobs_from_matching_dirs() {
    let temp = tempfile::tempdir().unwrap();
    let root = temp.path();
    for (dir, job) in [("ceph_aws", "b"), ("ceph_aws", "a"), ("ceph_collab", "c"), ("other", "d")] {
        let completed = root.join(dir).join("completed-jobs");
        fs::create_dir_all(&completed).unwrap();
        fs::write(
            completed.join(format!("{job}.json")),
            format!("{{\"name\": \"{job}\"}}"),
        )
        .unwrap();
    }
    fs::write(root.join("ceph_aws/completed-jobs/notes.txt"), "skip").unwrap();
    fs::create_dir_all(root.join("ceph_empty")).unwrap();

    let reader = CloudTransferJobReader::new("https://example.org/jobs.git", root, "ceph_*");
    let jobs = reader.read_completed_jobs().unwrap();

    let names = jobs
        .iter()
        .map(|job| job["name"].as_str().unwrap())
        .collect::<Vec<_>>();
    assert_eq!(names, vec!["a", "b", "c"]);
}

#[test]
fn non_object_job_is_rejected() {
    let temp = tempfile::tempdir().unwrap();
    let completed = temp.path().join("jobs").join("completed-jobs");
    fs::create_dir_all(&completed).unwrap();
    fs::write(completed.join("bad.json"), "[1, 2]").unwrap();

    let reader = CloudTransferJobReader::new("https://example.org/jobs.git", temp.path(), "*");
    let err = reader.read_completed_jobs().unwrap_err();
    assert_matches!(err, RepoError::Serialization(_));
}
