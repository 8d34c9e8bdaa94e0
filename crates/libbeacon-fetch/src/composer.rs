//! Composition: resolve, build, encode.

use std::sync::atomic::{AtomicU64, Ordering};

use libbeacon_core::builder;
use libbeacon_core::codec::{self, Format};
use libbeacon_core::hook::ComposeHook;
use libbeacon_core::{BeaconError, Snapshot};
use tracing::debug;

use crate::client::Fetch;
use crate::resolver::{ComposeRequest, Resolver};

/// Encoding and policy settings shared by every composition
#[derive(Debug, Clone, Default)]
pub struct ComposeOptions {
    pub format: Format,
    /// Banner project id; `brain` when unset
    pub project_id: Option<String>,
    /// Banner source path; `/stp.json` when unset
    pub source: Option<String>,
    /// Inline threshold used when the narrative sets none
    pub max_inline_kb: Option<f64>,
}

/// One finished composition
#[derive(Debug, Clone)]
pub struct Composition {
    pub snapshot: Snapshot,
    /// Banner + body in the requested format
    pub text: String,
    /// Single-line JSON, no banner
    pub compact: String,
    pub format: Format,
}

pub struct Composer<F, H> {
    resolver: Resolver<F, H>,
    options: ComposeOptions,
}

impl<F: Fetch, H: ComposeHook> Composer<F, H> {
    pub fn new(fetcher: F, hook: H, options: ComposeOptions) -> Self {
        Self {
            resolver: Resolver::new(fetcher, hook),
            options,
        }
    }

    pub fn resolver(&self) -> &Resolver<F, H> {
        &self.resolver
    }

    pub fn options(&self) -> &ComposeOptions {
        &self.options
    }

    pub async fn compose(&self, request: &ComposeRequest) -> Result<Composition, BeaconError> {
        let mut resolved = self.resolver.resolve(request).await;
        if resolved.narrative.max_inline_kb.is_none() {
            resolved.narrative.max_inline_kb = self.options.max_inline_kb;
        }

        let snapshot = builder::build(&resolved, &request.overrides.files);
        self.resolver.hook().on_composed(&snapshot);

        let format = self.options.format;
        let text = codec::encode(
            &snapshot,
            self.options.project_id.as_deref(),
            self.options.source.as_deref(),
            format,
        )?;
        let compact = codec::encode_compact(&snapshot)?;

        Ok(Composition {
            snapshot,
            text,
            compact,
            format,
        })
    }
}

/// Latest-request-wins gate for repeated compositions.
///
/// Each run takes a ticket; a run that finishes after a newer one started
/// yields `None` instead of its composition.
#[derive(Debug, Default)]
pub struct ComposeSession {
    latest: AtomicU64,
}

impl ComposeSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> u64 {
        self.latest.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn is_latest(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    pub async fn run<F: Fetch, H: ComposeHook>(
        &self,
        composer: &Composer<F, H>,
        request: &ComposeRequest,
    ) -> Result<Option<Composition>, BeaconError> {
        let ticket = self.begin();
        let composition = composer.compose(request).await?;
        if self.is_latest(ticket) {
            Ok(Some(composition))
        } else {
            debug!(ticket, "stale composition discarded");
            Ok(None)
        }
    }
}
