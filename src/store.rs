use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tempfile::Builder;
use tracing::info;

use crate::domain::Collection;
use crate::error::RepoError;
use crate::ids::FileIdSnapshot;

const PROGRESS_INTERVAL: usize = 10_000;
const FILE_IDS_NAME: &str = "file_ids.json";

/// Document store backed by one JSON lines file per collection.
#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, RepoError> {
        let root = BaseDirs::new()
            .and_then(|dirs| {
                Utf8PathBuf::from_path_buf(dirs.home_dir().join(".cache").join("dcc-repository"))
                    .ok()
            })
            .ok_or_else(|| RepoError::Filesystem("unable to resolve store directory".to_string()))?;
        Ok(Self { root })
    }

    pub fn new_with_root(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn collection_path(&self, collection: Collection) -> Utf8PathBuf {
        self.root.join(format!("{}.jsonl", collection.as_str()))
    }

    pub fn file_ids_path(&self) -> Utf8PathBuf {
        self.root.join(FILE_IDS_NAME)
    }

    pub fn ensure_root(&self) -> Result<(), RepoError> {
        fs::create_dir_all(self.root.as_std_path())
            .map_err(|err| RepoError::Filesystem(format!("create {}: {err}", self.root)))
    }

    /// Replaces the collection with `documents`. The previous contents stay
    /// readable until the new file is fully written.
    pub fn write_documents<T: Serialize>(
        &self,
        collection: Collection,
        documents: &[T],
    ) -> Result<usize, RepoError> {
        self.ensure_root()?;
        info!("Clearing '{collection}' documents...");
        let temp = Builder::new()
            .prefix(&format!(".{}", collection.as_str()))
            .tempfile_in(self.root.as_std_path())
            .map_err(|err| RepoError::Filesystem(err.to_string()))?;

        info!("Writing '{collection}' documents...");
        let mut writer = BufWriter::new(temp.as_file());
        let mut count = 0usize;
        for document in documents {
            serde_json::to_writer(&mut writer, document)
                .map_err(|err| RepoError::Serialization(err.to_string()))?;
            writer
                .write_all(b"\n")
                .map_err(|err| RepoError::Filesystem(err.to_string()))?;
            count += 1;
            if count % PROGRESS_INTERVAL == 0 {
                info!(count, "Wrote '{collection}' documents");
            }
        }
        writer
            .flush()
            .map_err(|err| RepoError::Filesystem(err.to_string()))?;
        drop(writer);

        let path = self.collection_path(collection);
        temp.persist(path.as_std_path())
            .map_err(|err| RepoError::Filesystem(format!("persist {path}: {err}")))?;
        info!(count, "Finished writing '{collection}' documents");
        Ok(count)
    }

    pub fn read_collection<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, RepoError> {
        let path = self.collection_path(collection);
        if !path.as_std_path().exists() {
            return Ok(Vec::new());
        }
        let file = File::open(path.as_std_path())
            .map_err(|err| RepoError::Filesystem(format!("open {path}: {err}")))?;
        let mut documents = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|err| RepoError::Filesystem(err.to_string()))?;
            if line.trim().is_empty() {
                continue;
            }
            documents.push(
                serde_json::from_str(&line)
                    .map_err(|err| RepoError::Serialization(err.to_string()))?,
            );
        }
        Ok(documents)
    }

    pub fn load_file_ids(&self) -> Result<FileIdSnapshot, RepoError> {
        let path = self.file_ids_path();
        if !path.as_std_path().exists() {
            return Ok(FileIdSnapshot::default());
        }
        let content = fs::read_to_string(path.as_std_path())
            .map_err(|err| RepoError::Filesystem(format!("read {path}: {err}")))?;
        serde_json::from_str(&content).map_err(|err| RepoError::Serialization(err.to_string()))
    }

    pub fn save_file_ids(&self, snapshot: &FileIdSnapshot) -> Result<(), RepoError> {
        self.ensure_root()?;
        let path = self.file_ids_path();
        let content = serde_json::to_vec_pretty(snapshot)
            .map_err(|err| RepoError::Serialization(err.to_string()))?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(tmp_path.as_std_path(), &content)
            .map_err(|err| RepoError::Filesystem(err.to_string()))?;
        fs::rename(tmp_path.as_std_path(), path.as_std_path())
            .map_err(|err| RepoError::Filesystem(err.to_string()))
    }
}
