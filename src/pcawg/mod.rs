pub mod archive;
pub mod files;
pub mod processor;
pub mod resolver;
pub mod source;

pub use archive::ArchiveLayout;
pub use processor::{FileContext, PcawgFileProcessor};
pub use source::{ArchiveSource, FileArchiveSource, HttpArchiveSource};
