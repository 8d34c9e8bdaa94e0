pub mod client;
pub mod sniff;
pub mod resolver;
pub mod composer;
pub mod projects;
pub mod ingest;
pub mod error;

#[cfg(test)]
mod testing;

pub use client::{Fetch, Fetched, HttpFetcher};
pub use error::FetchError;
pub use resolver::{Capabilities, ComposeRequest, Resolver};
pub use composer::{ComposeOptions, ComposeSession, Composer, Composition};
pub use projects::fetch_projects;
pub use ingest::{ingest, IngestRequest, IngestResponse};
pub use sniff::ContentKind;
