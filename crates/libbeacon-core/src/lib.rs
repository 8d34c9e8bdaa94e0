pub mod types;
pub mod inline;
pub mod builder;
pub mod codec;
pub mod delivery;
pub mod hook;
pub mod config;
pub mod error;

/// Version of the snapshot schema; the banner title carries the same number
pub const SCHEMA_VERSION: u32 = 1;

pub use error::BeaconError;
pub use types::{Narrative, Overrides, ProjectEntry, Snapshot};
pub use types::snapshot::{BuildTrace, CommitIdentity, CurrentStep, Footer, ImportantFile, RepoIdentity, RuntimeFacts};
pub use types::project::{filter_projects, parse_tags};
pub use inline::{Candidate, FileCandidate, DEFAULT_MAX_INLINE_BYTES};
pub use builder::{build, build_at, ResolvedSources};
pub use codec::Format;
pub use delivery::{ClipboardProvider, Deliverer, DeliveryReport, DeliveryStatus, SystemClipboard};
pub use hook::{ComposeHook, NoopHook, SourceField, SourceOutcome, TracingHook};
pub use config::{load_config, BeaconConfig, SelectionState};
