use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;
use tracing::info;

use crate::error::RepoError;
use crate::fs_util;

pub trait ArchiveSource: Send + Sync {
    fn read_donors(&self) -> Result<Vec<Value>, RepoError>;
}

#[derive(Debug, Clone)]
pub struct FileArchiveSource {
    path: PathBuf,
}

impl FileArchiveSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ArchiveSource for FileArchiveSource {
    fn read_donors(&self) -> Result<Vec<Value>, RepoError> {
        info!("Reading donor archives from '{}'...", self.path.display());
        let donors = fs_util::read_json_documents(&self.path)?;
        check_donors(donors)
    }
}

#[derive(Clone)]
pub struct HttpArchiveSource {
    client: Client,
    url: String,
}

impl HttpArchiveSource {
    pub fn new(url: &str) -> Result<Self, RepoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("dcc-repo/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| RepoError::ArchiveHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|err| RepoError::ArchiveHttp(err.to_string()))?;
        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    fn send_with_retries(&self) -> Result<reqwest::blocking::Response, RepoError> {
        const MAX_RETRIES: usize = 3;
        const BASE_DELAY_MS: u64 = 500;
        let mut attempt = 0usize;
        loop {
            match self.client.get(&self.url).send() {
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    if attempt < MAX_RETRIES && is_retryable_status(status) {
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Ok(resp);
                }
                Err(err) => {
                    if attempt < MAX_RETRIES && is_retryable_error(&err) {
                        thread::sleep(Duration::from_millis(BASE_DELAY_MS * (attempt as u64 + 1)));
                        attempt += 1;
                        continue;
                    }
                    return Err(RepoError::ArchiveHttp(err.to_string()));
                }
            }
        }
    }
}

impl ArchiveSource for HttpArchiveSource {
    fn read_donors(&self) -> Result<Vec<Value>, RepoError> {
        info!("Downloading donor archives from '{}'...", self.url);
        let response = self.send_with_retries()?;
        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response
                .text()
                .unwrap_or_else(|_| "archive request failed".to_string());
            return Err(RepoError::ArchiveStatus { status, message });
        }
        let bytes = response
            .bytes()
            .map_err(|err| RepoError::ArchiveHttp(err.to_string()))?;
        check_donors(fs_util::decode_json_documents(&bytes)?)
    }
}

impl ArchiveSource for Box<dyn ArchiveSource> {
    fn read_donors(&self) -> Result<Vec<Value>, RepoError> {
        (**self).read_donors()
    }
}

pub fn open_archive_source(location: &str) -> Result<Box<dyn ArchiveSource>, RepoError> {
    if location.starts_with("http://") || location.starts_with("https://") {
        Ok(Box::new(HttpArchiveSource::new(location)?))
    } else {
        Ok(Box::new(FileArchiveSource::new(location)))
    }
}

fn check_donors(donors: Vec<Value>) -> Result<Vec<Value>, RepoError> {
    if let Some(position) = donors.iter().position(|donor| !donor.is_object()) {
        return Err(RepoError::InvalidArchive(format!(
            "donor archive #{} is not a JSON object",
            position + 1
        )));
    }
    info!(donors = donors.len(), "Read donor archives");
    Ok(donors)
}

fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn is_retryable_error(err: &reqwest::Error) -> bool {
    err.is_timeout() || err.is_connect() || err.is_request()
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn file_source_reads_json_lines() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("donors.jsonl");
        std::fs::write(&path, "{\"donor_unique_id\":\"a\"}\n{\"donor_unique_id\":\"b\"}\n").unwrap();

        let donors = FileArchiveSource::new(&path).read_donors().unwrap();
        assert_eq!(donors.len(), 2);
    }

    #[test]
    fn non_object_donor_is_invalid() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("donors.json");
        std::fs::write(&path, "[{\"a\":1}, 7]").unwrap();

        let err = FileArchiveSource::new(&path).read_donors().unwrap_err();
        assert_matches!(err, RepoError::InvalidArchive(message) if message.contains("#2"));
    }

    #[test]
    fn location_selects_source() {
        assert!(open_archive_source("/tmp/donors.jsonl.gz").is_ok());
    }
}
