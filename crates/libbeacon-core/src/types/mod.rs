pub mod narrative;
pub mod overrides;
pub mod project;
pub mod snapshot;

pub use narrative::Narrative;
pub use overrides::Overrides;
pub use project::ProjectEntry;
pub use snapshot::{
    BuildTrace, CommitIdentity, CurrentStep, Footer, ImportantFile, ProjectOverview, RepoIdentity,
    RuntimeFacts, Snapshot, TroubleshootingEntry,
};
