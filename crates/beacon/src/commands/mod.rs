pub mod compose;
pub mod ingest;
pub mod projects;
pub mod validate;
