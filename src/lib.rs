pub mod archive_fetch;
pub mod charts;
pub mod config;
pub mod ingest;
pub mod match_doc;
pub mod queries;
pub mod report;
pub mod store;
