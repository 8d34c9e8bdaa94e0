//! Observability hook for composition.

use std::fmt;

use tracing::{debug, info};

use crate::types::Snapshot;

/// Field a source contributes to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceField {
    Narrative,
    PromptPack,
    Runtime,
    Version,
}

impl SourceField {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceField::Narrative => "narrative",
            SourceField::PromptPack => "prompt_pack",
            SourceField::Runtime => "runtime",
            SourceField::Version => "version",
        }
    }
}

impl fmt::Display for SourceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What happened when one source was consulted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceOutcome {
    Accepted,
    /// Fetched and decoded, but failed a content guard
    Rejected(String),
    /// Transport, status, timeout or decode failure
    Failed(String),
}

/// Receives per-source outcomes and the finished snapshot.
///
/// Both methods default to no-ops.
pub trait ComposeHook: Send + Sync {
    fn on_source(&self, _field: SourceField, _origin: &str, _outcome: &SourceOutcome) {}

    fn on_composed(&self, _snapshot: &Snapshot) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopHook;

impl ComposeHook for NoopHook {}

/// Hook that reports through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingHook;

impl ComposeHook for TracingHook {
    fn on_source(&self, field: SourceField, origin: &str, outcome: &SourceOutcome) {
        match outcome {
            SourceOutcome::Accepted => debug!(%field, origin, "source accepted"),
            SourceOutcome::Rejected(reason) => debug!(%field, origin, reason = %reason, "source rejected"),
            SourceOutcome::Failed(reason) => debug!(%field, origin, reason = %reason, "source failed"),
        }
    }

    fn on_composed(&self, snapshot: &Snapshot) {
        info!(
            repo = %snapshot.build_trace.repo.name,
            branch = %snapshot.build_trace.branch,
            files = snapshot.file_tree.len(),
            inlined = snapshot.important_files.iter().filter(|f| f.is_inline()).count(),
            prompt_pack_bytes = snapshot.prompt_pack.len(),
            "snapshot composed"
        );
    }
}

impl<H: ComposeHook + ?Sized> ComposeHook for &H {
    fn on_source(&self, field: SourceField, origin: &str, outcome: &SourceOutcome) {
        (**self).on_source(field, origin, outcome)
    }

    fn on_composed(&self, snapshot: &Snapshot) {
        (**self).on_composed(snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_field_names() {
        assert_eq!(SourceField::PromptPack.to_string(), "prompt_pack");
        assert_eq!(SourceField::Narrative.as_str(), "narrative");
    }

    #[test]
    fn test_hooks_accept_reports() {
        let snapshot = crate::builder::build(&Default::default(), &[]);
        for hook in [&NoopHook as &dyn ComposeHook, &TracingHook] {
            hook.on_source(SourceField::Runtime, "https://h/runtime", &SourceOutcome::Failed("404".into()));
            hook.on_composed(&snapshot);
        }
    }
}
