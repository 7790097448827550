use std::fs;
use std::io::Read;
use std::path::Path;

use flate2::read::GzDecoder;
use serde_json::Value;

use crate::error::RepoError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn read_json_documents(path: &Path) -> Result<Vec<Value>, RepoError> {
    let bytes = fs::read(path)
        .map_err(|err| RepoError::Filesystem(format!("read {}: {err}", path.display())))?;
    decode_json_documents(&bytes)
}

/// Decodes a JSON array, JSON lines or concatenated JSON values, gunzipping
/// first when the payload carries the gzip magic bytes.
pub fn decode_json_documents(bytes: &[u8]) -> Result<Vec<Value>, RepoError> {
    let text = if bytes.starts_with(&GZIP_MAGIC) {
        let mut decoder = GzDecoder::new(bytes);
        let mut text = String::new();
        decoder
            .read_to_string(&mut text)
            .map_err(|err| RepoError::InvalidArchive(format!("gzip: {err}")))?;
        text
    } else {
        String::from_utf8(bytes.to_vec())
            .map_err(|err| RepoError::InvalidArchive(err.to_string()))?
    };

    if text.trim_start().starts_with('[') {
        return match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => Ok(items),
            Ok(_) => Err(RepoError::InvalidArchive(
                "expected a JSON array".to_string(),
            )),
            Err(err) => Err(RepoError::InvalidArchive(err.to_string())),
        };
    }

    serde_json::Deserializer::from_str(&text)
        .into_iter::<Value>()
        .map(|item| item.map_err(|err| RepoError::InvalidArchive(err.to_string())))
        .collect()
}

pub fn is_json_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|value| value.to_str())
            .map(|value| value.eq_ignore_ascii_case("json"))
            .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use flate2::Compression;
    use flate2::write::GzEncoder;

    use super::*;

    #[test]
    fn decode_json_lines() {
        let docs = decode_json_documents(b"{\"a\":1}\n{\"a\":2}\n\n").unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[1]["a"], 2);
    }

    #[test]
    fn decode_json_array() {
        let docs = decode_json_documents(b"  [{\"a\":1},{\"a\":2},{\"a\":3}]").unwrap();
        assert_eq!(docs.len(), 3);
    }

    #[test]
    fn decode_gzipped_lines() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"{\"a\":1}\n{\"a\":2}\n").unwrap();
        let bytes = encoder.finish().unwrap();
        let docs = decode_json_documents(&bytes).unwrap();
        assert_eq!(docs.len(), 2);
    }

    #[test]
    fn truncated_document_is_invalid() {
        assert!(decode_json_documents(b"{\"a\":1}\n{\"a\":").is_err());
    }
}
