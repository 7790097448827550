use std::process::ExitCode;

use camino::Utf8PathBuf;
use clap::{Args, Parser, Subcommand};
use miette::IntoDiagnostic;
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use dcc_repository::app::{App, default_gdc_expand};
use dcc_repository::config::{ConfigLoader, ResolvedConfig};
use dcc_repository::error::RepoError;
use dcc_repository::gdc::{GdcClient, GdcHttpClient};
use dcc_repository::output::{JsonOutput, LogProgress};
use dcc_repository::pcawg::source::open_archive_source;
use dcc_repository::pcawg::ArchiveSource;
use dcc_repository::store::Store;
use dcc_repository::transfer::{CloudTransferJobReader, TransferJobReader};

#[derive(Parser)]
#[command(name = "dcc-repo")]
#[command(about = "Imports genomic file metadata into the repository file store")]
#[command(version, author)]
struct Cli {
    #[arg(long, global = true)]
    config: Option<String>,

    #[arg(long, global = true)]
    store: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Normalize PCAWG donor archives into the file collection")]
    Pcawg(PcawgArgs),
    #[command(about = "Import TCGA files from the GDC API")]
    Gdc(GdcArgs),
    #[command(about = "Print the GDC files mapping")]
    GdcMapping,
    #[command(about = "Import completed cloud transfer jobs")]
    Cloud,
}

#[derive(Args)]
struct PcawgArgs {
    #[arg(long)]
    archive: Option<String>,
}

#[derive(Args)]
struct GdcArgs {
    #[arg(long, value_delimiter = ',')]
    expand: Vec<String>,
}

fn main() -> ExitCode {
    if let Err(report) = run() {
        eprintln!("{report:?}");
        if let Some(error) = report.downcast_ref::<RepoError>() {
            return ExitCode::from(map_exit_code(error));
        }
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn map_exit_code(error: &RepoError) -> u8 {
    match error {
        RepoError::MissingConfig | RepoError::ConfigRead(_) | RepoError::ConfigParse(_) => 2,
        RepoError::ArchiveHttp(_)
        | RepoError::ArchiveStatus { .. }
        | RepoError::GdcHttp(_)
        | RepoError::GdcStatus { .. }
        | RepoError::GdcRetriesExhausted(_)
        | RepoError::Git(_)
        | RepoError::MissingTool(_) => 3,
        _ => 1,
    }
}

fn run() -> miette::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ConfigLoader::resolve(cli.config.as_deref())?;
    let store = match cli.store.map(Utf8PathBuf::from).or(config.store_root.clone()) {
        Some(root) => Store::new_with_root(root),
        None => Store::new()?,
    };

    match cli.command {
        Commands::Pcawg(args) => {
            let location = args
                .archive
                .or(config.archive.clone())
                .ok_or_else(|| RepoError::ConfigParse("pcawg.archive is not set".to_string()))?;
            let archive = open_archive_source(&location)?;
            let app = build_app(store, &config, archive, NopGdc, NopTransfer);
            let result = app.import_pcawg(&LogProgress)?;
            JsonOutput::print_import(&result).into_diagnostic()?;
        }
        Commands::Gdc(args) => {
            let expand = if args.expand.is_empty() {
                default_gdc_expand()
            } else {
                args.expand
            };
            let gdc = GdcHttpClient::new(&config.gdc_url)?;
            let app = build_app(store, &config, NopArchive, gdc, NopTransfer);
            let result = app.import_gdc(&expand, &LogProgress)?;
            JsonOutput::print_import(&result).into_diagnostic()?;
        }
        Commands::GdcMapping => {
            let gdc = GdcHttpClient::new(&config.gdc_url)?;
            let app = build_app(store, &config, NopArchive, gdc, NopTransfer);
            JsonOutput::print_value(&app.gdc_mapping()?).into_diagnostic()?;
        }
        Commands::Cloud => {
            let cloud = config
                .cloud
                .clone()
                .ok_or_else(|| RepoError::ConfigParse("cloud section is not set".to_string()))?;
            let reader =
                CloudTransferJobReader::new(cloud.repo_url, cloud.repo_dir, cloud.repo_dir_glob);
            let app = build_app(store, &config, NopArchive, NopGdc, reader);
            let result = app.import_cloud_jobs(&LogProgress)?;
            JsonOutput::print_import(&result).into_diagnostic()?;
        }
    }

    Ok(())
}

fn build_app<A: ArchiveSource, G: GdcClient, T: TransferJobReader>(
    store: Store,
    config: &ResolvedConfig,
    archive: A,
    gdc: G,
    transfer: T,
) -> App<A, G, T> {
    App::new(
        store,
        config.registry.clone(),
        config.layout.clone(),
        archive,
        gdc,
        transfer,
    )
}

struct NopArchive;
struct NopGdc;
struct NopTransfer;

impl ArchiveSource for NopArchive {
    fn read_donors(&self) -> Result<Vec<Value>, RepoError> {
        Err(RepoError::InvalidArchive(
            "archive source not configured".to_string(),
        ))
    }
}

impl GdcClient for NopGdc {
    fn files(&self, _expand: &[String]) -> Result<Vec<Value>, RepoError> {
        Err(RepoError::GdcHttp("GDC client not configured".to_string()))
    }

    fn files_mapping(&self) -> Result<Value, RepoError> {
        Err(RepoError::GdcHttp("GDC client not configured".to_string()))
    }
}

impl TransferJobReader for NopTransfer {
    fn read_jobs(&self) -> Result<Vec<Value>, RepoError> {
        Err(RepoError::Git("transfer job reader not configured".to_string()))
    }
}
