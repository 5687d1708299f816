pub mod ingest;
pub mod run;
pub mod show;
