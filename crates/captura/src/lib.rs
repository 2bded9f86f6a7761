//! captura: invoice-capture pipeline
//!
//! Four durable stages behind a thin HTTP surface: split a source PDF into
//! per-page documents, extract structured chunks from each page via an
//! external document-understanding service, shape the cleaned text into a
//! row-aligned invoice table with a generative model, and load the rows
//! into PostgreSQL. Each stage persists its output before consuming its
//! input, so the pipeline is resumable at stage granularity.

pub mod config;
pub mod error;
pub mod pipeline;
pub mod providers;
pub mod server;
pub mod storage;
pub mod types;

pub use config::CapturaConfig;
pub use error::{Error, Result};
pub use types::{ChunkRecord, InvoiceTable};
