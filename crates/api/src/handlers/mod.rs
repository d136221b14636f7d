pub mod auth;
pub mod dashboard;
pub mod ingest;
pub mod project;
