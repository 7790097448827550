use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tracing::info;

use crate::domain::Collection;
use crate::error::RepoError;
use crate::gdc::GdcClient;
use crate::ids::MemoryFileIds;
use crate::pcawg::{ArchiveLayout, ArchiveSource, FileContext, PcawgFileProcessor};
use crate::registry::Registry;
use crate::store::Store;
use crate::transfer::TransferJobReader;

pub const DEFAULT_GDC_EXPAND: [&str; 1] = ["cases"];

#[derive(Debug, Clone, Serialize)]
pub struct ImportResult {
    pub collection: Collection,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_ids: Option<usize>,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct App<A: ArchiveSource, G: GdcClient, T: TransferJobReader> {
    store: Store,
    registry: Registry,
    layout: ArchiveLayout,
    archive: A,
    gdc: G,
    transfer: T,
}

impl<A: ArchiveSource, G: GdcClient, T: TransferJobReader> App<A, G, T> {
    pub fn new(
        store: Store,
        registry: Registry,
        layout: ArchiveLayout,
        archive: A,
        gdc: G,
        transfer: T,
    ) -> Self {
        Self {
            store,
            registry,
            layout,
            archive,
            gdc,
            transfer,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    /// Normalizes every donor archive into `file` documents. Nothing is
    /// written unless all donors process successfully.
    pub fn import_pcawg(&self, sink: &dyn ProgressSink) -> Result<ImportResult, RepoError> {
        let started = Instant::now();
        let ids = MemoryFileIds::from_snapshot(self.store.load_file_ids()?);
        sink.event(ProgressEvent {
            message: format!("phase=Resolve; {} known file ids", ids.len()),
            elapsed: None,
        });

        let donors = self.archive.read_donors()?;
        sink.event(ProgressEvent {
            message: format!("phase=Read; {} donor archives", donors.len()),
            elapsed: Some(started.elapsed()),
        });

        let context = FileContext {
            ids: &ids,
            projects: &self.registry,
            primary_sites: &self.registry,
            servers: &self.registry,
        };
        let processor = PcawgFileProcessor::new(context, self.layout.clone());
        let files = processor.process_donors(&donors)?;
        sink.event(ProgressEvent {
            message: format!("phase=Process; {} repository files", files.len()),
            elapsed: Some(started.elapsed()),
        });

        self.store.save_file_ids(&ids.snapshot())?;
        let count = self.store.write_documents(Collection::File, &files)?;
        sink.event(ProgressEvent {
            message: format!("phase=Write; {count} documents"),
            elapsed: Some(started.elapsed()),
        });
        info!(count, file_ids = ids.len(), "Imported PCAWG files");

        Ok(ImportResult {
            collection: Collection::File,
            count,
            file_ids: Some(ids.len()),
        })
    }

    pub fn import_gdc(
        &self,
        expand: &[String],
        sink: &dyn ProgressSink,
    ) -> Result<ImportResult, RepoError> {
        let started = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Read; expand={}", expand.join(",")),
            elapsed: None,
        });
        let files = self.gdc.files(expand)?;
        self.write_raw(Collection::GdcFile, &files, started, sink)
    }

    pub fn gdc_mapping(&self) -> Result<Value, RepoError> {
        self.gdc.files_mapping()
    }

    pub fn import_cloud_jobs(&self, sink: &dyn ProgressSink) -> Result<ImportResult, RepoError> {
        let started = Instant::now();
        sink.event(ProgressEvent {
            message: "phase=Read; completed transfer jobs".to_string(),
            elapsed: None,
        });
        let jobs = self.transfer.read_jobs()?;
        self.write_raw(Collection::CloudTransferJob, &jobs, started, sink)
    }

    fn write_raw(
        &self,
        collection: Collection,
        documents: &[Value],
        started: Instant,
        sink: &dyn ProgressSink,
    ) -> Result<ImportResult, RepoError> {
        let count = self.store.write_documents(collection, documents)?;
        sink.event(ProgressEvent {
            message: format!("phase=Write; {count} documents"),
            elapsed: Some(started.elapsed()),
        });
        info!(count, "Imported '{collection}' documents");
        Ok(ImportResult {
            collection,
            count,
            file_ids: None,
        })
    }
}

pub fn default_gdc_expand() -> Vec<String> {
    DEFAULT_GDC_EXPAND
        .iter()
        .map(|value| value.to_string())
        .collect()
}
