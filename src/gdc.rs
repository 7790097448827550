use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, HeaderMap, HeaderValue, USER_AGENT};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{info, warn};

use crate::error::RepoError;

pub const DEFAULT_API_URL: &str = "https://gdc-api.nci.nih.gov";
pub const PAGE_SIZE: u64 = 200;

const MAX_ATTEMPTS: usize = 10;
const READ_TIMEOUT: Duration = Duration::from_secs(60);
const TCGA_PROGRAM: &str = "TCGA";

pub trait GdcClient: Send + Sync {
    fn files(&self, expand: &[String]) -> Result<Vec<Value>, RepoError>;
    fn files_mapping(&self) -> Result<Value, RepoError>;
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Pagination {
    #[serde(default)]
    pub count: u64,
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub from: u64,
    #[serde(default)]
    pub page: u64,
    #[serde(default)]
    pub total: u64,
    #[serde(default)]
    pub pages: u64,
    #[serde(default)]
    pub size: u64,
}

#[derive(Clone)]
pub struct GdcHttpClient {
    client: Client,
    url: String,
}

impl GdcHttpClient {
    pub fn new(url: &str) -> Result<Self, RepoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("dcc-repo/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| RepoError::GdcHttp(err.to_string()))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let client = Client::builder()
            .default_headers(headers)
            .timeout(READ_TIMEOUT)
            .connect_timeout(READ_TIMEOUT)
            .build()
            .map_err(|err| RepoError::GdcHttp(err.to_string()))?;
        Ok(Self {
            client,
            url: url.trim_end_matches('/').to_string(),
        })
    }

    fn read_files(&self, expand: &[String], size: u64, from: u64) -> Result<Value, RepoError> {
        let endpoint = format!("{}/files", self.url);
        let filters = create_filter(TCGA_PROGRAM).to_string();
        let query = [
            ("size", size.to_string()),
            ("from", from.to_string()),
            ("filters", filters),
            ("expand", expand.join(",")),
        ];

        for attempt in 1..=MAX_ATTEMPTS {
            info!("Request: {endpoint} size={size} from={from}");
            match self.client.get(&endpoint).query(&query).send() {
                Ok(response) => {
                    let response = read_response(response)?;
                    check_warnings(&response);
                    return Ok(response);
                }
                Err(err) if err.is_timeout() => {
                    warn!("Socket timeout for {endpoint} from={from} after {attempt} attempt(s)");
                }
                Err(err) => return Err(RepoError::GdcHttp(err.to_string())),
            }
        }

        Err(RepoError::GdcRetriesExhausted(format!(
            "{endpoint}?size={size}&from={from}"
        )))
    }
}

impl GdcClient for GdcHttpClient {
    fn files(&self, expand: &[String]) -> Result<Vec<Value>, RepoError> {
        collect_pages(PAGE_SIZE, |from| self.read_files(expand, PAGE_SIZE, from))
    }

    fn files_mapping(&self) -> Result<Value, RepoError> {
        let response = self
            .client
            .get(format!("{}/files/_mapping", self.url))
            .send()
            .map_err(|err| RepoError::GdcHttp(err.to_string()))?;
        read_response(response)
    }
}

/// Pages through `/files` starting at `from = 1` until the reported page
/// reaches the page count, then checks the total against what was read.
pub fn collect_pages<F>(size: u64, mut fetch: F) -> Result<Vec<Value>, RepoError>
where
    F: FnMut(u64) -> Result<Value, RepoError>,
{
    let mut from = 1;
    let mut results = Vec::new();
    loop {
        let response = fetch(from)?;
        let pagination = pagination(&response)?;
        info!("{pagination:?}");

        if let Some(hits) = response
            .get("data")
            .and_then(|data| data.get("hits"))
            .and_then(|hits| hits.as_array())
        {
            results.extend(hits.iter().cloned());
        }

        from += size;
        if pagination.page >= pagination.pages {
            let actual = results.len() as u64;
            if pagination.total != actual {
                return Err(RepoError::PaginationMismatch {
                    total: pagination.total,
                    actual,
                });
            }
            return Ok(results);
        }
    }
}

pub fn create_filter(program: &str) -> Value {
    json!({
        "op": "in",
        "content": {
            "field": "cases.project.program.name",
            "value": [program]
        }
    })
}

fn pagination(response: &Value) -> Result<Pagination, RepoError> {
    let node = response
        .get("data")
        .and_then(|data| data.get("pagination"))
        .cloned()
        .unwrap_or(Value::Null);
    serde_json::from_value(node).map_err(|err| RepoError::GdcHttp(format!("pagination: {err}")))
}

fn check_warnings(response: &Value) {
    let has_warnings = match response.get("warnings") {
        Some(Value::Object(map)) => !map.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        _ => false,
    };
    if has_warnings {
        warn!("Warnings: {}", response["warnings"]);
    }
}

fn read_response(response: reqwest::blocking::Response) -> Result<Value, RepoError> {
    if !response.status().is_success() {
        let status = response.status().as_u16();
        let message = response
            .text()
            .unwrap_or_else(|_| "GDC request failed".to_string());
        return Err(RepoError::GdcStatus { status, message });
    }
    response
        .json()
        .map_err(|err| RepoError::GdcHttp(err.to_string()))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn page(hits: usize, page: u64, pages: u64, total: u64) -> Value {
        let hits = (0..hits).map(|i| json!({"file_id": i})).collect::<Vec<_>>();
        json!({
            "data": {
                "hits": hits,
                "pagination": {"count": 2, "page": page, "pages": pages, "total": total, "size": 2}
            },
            "warnings": {}
        })
    }

    #[test]
    fn collects_every_page() {
        let mut requested = Vec::new();
        let files = collect_pages(2, |from| {
            requested.push(from);
            let page_number = (from - 1) / 2 + 1;
            Ok(page(if page_number < 3 { 2 } else { 1 }, page_number, 3, 5))
        })
        .unwrap();

        assert_eq!(files.len(), 5);
        assert_eq!(requested, vec![1, 3, 5]);
    }

    #[test]
    fn total_mismatch_is_fatal() {
        let err = collect_pages(2, |_| Ok(page(2, 1, 1, 3))).unwrap_err();
        assert_matches!(err, RepoError::PaginationMismatch { total: 3, actual: 2 });
    }

    #[test]
    fn fetch_errors_propagate() {
        let err = collect_pages(2, |from| Err(RepoError::GdcRetriesExhausted(from.to_string())))
            .unwrap_err();
        assert_matches!(err, RepoError::GdcRetriesExhausted(_));
    }

    #[test]
    fn filter_targets_program() {
        let filter = create_filter("TCGA");
        assert_eq!(filter["content"]["field"], "cases.project.program.name");
        assert_eq!(filter["content"]["value"][0], "TCGA");
    }
}
