//! Data layer for HelioWatch.
//!
//! Models, the mock data generator, the never-failing data access functions,
//! and the ingestion writer.

mod access;
mod ingest;
mod mockgen;
mod models;

pub use access::*;
pub use ingest::*;
pub use mockgen::*;
pub use models::*;
