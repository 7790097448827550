pub mod app;
pub mod config;
pub mod domain;
pub mod error;
pub mod fs_util;
pub mod gdc;
pub mod ids;
pub mod model;
pub mod output;
pub mod pcawg;
pub mod registry;
pub mod store;
pub mod transfer;
