//! Fallback-aware source resolution.
//!
//! Every field has an ordered chain of sources. The first acceptable answer
//! wins and every failure along the way degrades to "no value from this
//! source": resolution itself never fails.

use chrono::Utc;
use libbeacon_core::builder::ResolvedSources;
use libbeacon_core::hook::{ComposeHook, SourceField, SourceOutcome};
use libbeacon_core::types::{CommitIdentity, Narrative, Overrides, RuntimeFacts};
use serde_json::Value;

use crate::client::{join_url, normalize_bases, Fetch};
use crate::sniff::{self, ContentKind, Document};

pub const NARRATIVE_PATH: &str = "brain.yml";
pub const PROMPT_PACK_PATH: &str = "prompt_pack";
pub const PROMPT_PACK_STATIC_PATH: &str = "dist/prompt_pack.md";
pub const RUNTIME_PATH: &str = "runtime";
pub const HEALTH_PATH: &str = "healthz";
pub const VERSION_PATH: &str = "version";

/// Endpoint-map key naming an alternate prompt pack location
pub const PROMPT_PACK_ENDPOINT_KEY: &str = "prompt_pack";

/// How many leading characters are inspected for document markup
const MARKUP_WINDOW: usize = 80;

/// Which remote sources a composition may consult
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub narrative: bool,
    pub prompt_pack: bool,
    pub runtime: bool,
    pub version: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::all()
    }
}

impl Capabilities {
    pub fn all() -> Self {
        Self {
            narrative: true,
            prompt_pack: true,
            runtime: true,
            version: true,
        }
    }

    /// Overrides only; nothing is fetched
    pub fn offline() -> Self {
        Self {
            narrative: false,
            prompt_pack: false,
            runtime: false,
            version: false,
        }
    }
}

/// Input to one composition
#[derive(Debug, Clone, Default)]
pub struct ComposeRequest {
    pub overrides: Overrides,
    /// Tried in order for every remote source
    pub base_urls: Vec<String>,
    pub capabilities: Capabilities,
}

/// Resolves every snapshot field from overrides and remote sources
pub struct Resolver<F, H> {
    fetcher: F,
    hook: H,
}

impl<F: Fetch, H: ComposeHook> Resolver<F, H> {
    pub fn new(fetcher: F, hook: H) -> Self {
        Self { fetcher, hook }
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn hook(&self) -> &H {
        &self.hook
    }

    pub async fn resolve(&self, request: &ComposeRequest) -> ResolvedSources {
        let overrides = &request.overrides;
        let caps = request.capabilities;
        let bases = normalize_bases(&request.base_urls);

        // The prompt pack's alternate endpoint may come from the narrative
        let narrative_and_prompt = async {
            let narrative = if caps.narrative {
                self.narrative(&bases).await
            } else {
                None
            };

            let alternate = overrides
                .endpoints
                .get(PROMPT_PACK_ENDPOINT_KEY)
                .or_else(|| {
                    narrative
                        .as_ref()
                        .and_then(|n| n.endpoints.get(PROMPT_PACK_ENDPOINT_KEY))
                })
                .cloned();

            let prompt = if caps.prompt_pack {
                self.prompt_pack(overrides.prompt_pack.as_deref(), &bases, alternate.as_deref())
                    .await
            } else {
                overrides
                    .prompt_pack
                    .as_deref()
                    .and_then(|text| self.check_override_prompt(text))
            };

            (narrative, prompt)
        };

        let runtime = async {
            if caps.runtime {
                self.runtime(&overrides.runtime, &bases).await
            } else {
                overrides.runtime.clone()
            }
        };

        let commit = async {
            if caps.version {
                self.commit(&overrides.commit, &bases).await
            } else {
                let mut commit = CommitIdentity::default();
                commit.fill_from(&overrides.commit);
                commit
            }
        };

        let ((narrative, prompt_pack), runtime, commit) =
            tokio::join!(narrative_and_prompt, runtime, commit);

        ResolvedSources {
            repo: overrides.repo.clone(),
            branch: overrides.branch.clone(),
            commit,
            runtime,
            endpoints: overrides.endpoints.clone(),
            narrative: narrative.unwrap_or_default(),
            prompt_pack: prompt_pack.unwrap_or_default(),
        }
    }

    /// First recognizable narrative document across bases.
    ///
    /// Each base is tried cache-busted first, then bare.
    pub async fn narrative(&self, bases: &[String]) -> Option<Narrative> {
        for base in bases {
            let bare = join_url(base, NARRATIVE_PATH);
            let busted = format!("{}?ts={}", bare, Utc::now().timestamp_millis());

            for url in [busted, bare] {
                let Some(doc) = self.attempt(SourceField::Narrative, &url, ContentKind::Structured).await
                else {
                    continue;
                };
                match doc.as_value().filter(|v| Narrative::is_recognized(v)) {
                    Some(value) => {
                        self.hook.on_source(SourceField::Narrative, &url, &SourceOutcome::Accepted);
                        return Some(Narrative::from_value(value));
                    }
                    None => self.reject(SourceField::Narrative, &url, "not a narrative document"),
                }
            }
        }
        None
    }

    /// Prompt text: override, then `<base>/prompt_pack`, then the alternate
    /// endpoint, then `<base>/dist/prompt_pack.md`
    pub async fn prompt_pack(
        &self,
        explicit: Option<&str>,
        bases: &[String],
        alternate: Option<&str>,
    ) -> Option<String> {
        if let Some(text) = explicit.and_then(|t| self.check_override_prompt(t)) {
            return Some(text);
        }

        let mut chain: Vec<(String, ContentKind)> = bases
            .iter()
            .map(|b| (join_url(b, PROMPT_PACK_PATH), ContentKind::Auto))
            .collect();
        if let Some(alt) = alternate.map(str::trim).filter(|a| !a.is_empty()) {
            if is_absolute(alt) {
                chain.push((alt.to_string(), ContentKind::Auto));
            } else {
                chain.extend(bases.iter().map(|b| (join_url(b, alt), ContentKind::Auto)));
            }
        }
        chain.extend(
            bases
                .iter()
                .map(|b| (join_url(b, PROMPT_PACK_STATIC_PATH), ContentKind::Prose)),
        );

        for (url, kind) in chain {
            let Some(doc) = self.attempt(SourceField::PromptPack, &url, kind).await else {
                continue;
            };
            match prompt_text(doc).ok_or("no prompt text in response").and_then(check_prompt) {
                Ok(text) => {
                    self.hook.on_source(SourceField::PromptPack, &url, &SourceOutcome::Accepted);
                    return Some(text);
                }
                Err(reason) => self.reject(SourceField::PromptPack, &url, reason),
            }
        }
        None
    }

    /// Supplied runtime facts, with still-missing fields filled from
    /// `<base>/runtime` then `<base>/healthz`
    pub async fn runtime(&self, explicit: &RuntimeFacts, bases: &[String]) -> RuntimeFacts {
        let mut runtime = explicit.clone();
        if runtime.is_complete() {
            return runtime;
        }

        for base in bases {
            for path in [RUNTIME_PATH, HEALTH_PATH] {
                let url = join_url(base, path);
                let Some(doc) = self.attempt(SourceField::Runtime, &url, ContentKind::Json).await
                else {
                    continue;
                };
                match doc.as_value().and_then(runtime_facts) {
                    Some(found) => {
                        self.hook.on_source(SourceField::Runtime, &url, &SourceOutcome::Accepted);
                        runtime.fill_missing(&found);
                        if runtime.is_complete() {
                            return runtime;
                        }
                    }
                    None => self.reject(SourceField::Runtime, &url, "no runtime facts"),
                }
            }
        }
        runtime
    }

    /// Supplied commit identity, completed from `<base>/version`
    pub async fn commit(&self, explicit: &CommitIdentity, bases: &[String]) -> CommitIdentity {
        let mut commit = CommitIdentity::default();
        commit.fill_from(explicit);
        if commit.is_complete() {
            return commit;
        }

        for base in bases {
            let url = join_url(base, VERSION_PATH);
            let Some(doc) = self.attempt(SourceField::Version, &url, ContentKind::Json).await else {
                continue;
            };
            match doc.as_value().and_then(version_commit) {
                Some(found) => {
                    self.hook.on_source(SourceField::Version, &url, &SourceOutcome::Accepted);
                    commit.fill_from(&found);
                    if commit.is_complete() {
                        break;
                    }
                }
                None => self.reject(SourceField::Version, &url, "no commit in version response"),
            }
        }
        commit
    }

    /// Fetch and decode one source; failures are reported and absorbed
    async fn attempt(&self, field: SourceField, url: &str, kind: ContentKind) -> Option<Document> {
        match self.fetcher.get(url).await.and_then(|f| sniff::decode(&f, kind)) {
            Ok(doc) => Some(doc),
            Err(e) => {
                self.hook.on_source(field, url, &SourceOutcome::Failed(e.to_string()));
                None
            }
        }
    }

    fn reject(&self, field: SourceField, url: &str, reason: &str) {
        self.hook
            .on_source(field, url, &SourceOutcome::Rejected(reason.to_string()));
    }

    fn check_override_prompt(&self, text: &str) -> Option<String> {
        match check_prompt(text.to_string()) {
            Ok(text) => {
                self.hook.on_source(SourceField::PromptPack, "override", &SourceOutcome::Accepted);
                Some(text)
            }
            Err(reason) => {
                self.reject(SourceField::PromptPack, "override", reason);
                None
            }
        }
    }
}

/// Whether text opens with HTML document markup within its first characters
pub fn looks_like_markup(text: &str) -> bool {
    let head: String = text.trim().chars().take(MARKUP_WINDOW).collect::<String>().to_lowercase();
    head.starts_with("<!doctype") || head.starts_with("<html")
}

fn check_prompt(text: String) -> Result<String, &'static str> {
    if text.trim().is_empty() {
        Err("empty prompt text")
    } else if looks_like_markup(&text) {
        Err("document markup instead of prompt text")
    } else {
        Ok(text)
    }
}

/// Prompt text from a plain body, a JSON string, or `{"markdown": ...}`
fn prompt_text(doc: Document) -> Option<String> {
    match doc {
        Document::Text(text) => Some(text),
        Document::Data(Value::String(text)) => Some(text),
        Document::Data(Value::Object(obj)) => obj
            .get("markdown")
            .or_else(|| obj.get("prompt_pack"))
            .and_then(Value::as_str)
            .map(str::to_string),
        Document::Data(_) => None,
    }
}

/// Runtime facts from a response, preferring a nested `runtime` object
fn runtime_facts(value: &Value) -> Option<RuntimeFacts> {
    let source = value.get("runtime").filter(|v| v.is_object()).unwrap_or(value);
    let field = |key: &str| source.get(key).map(scalar).unwrap_or_default();
    let facts = RuntimeFacts {
        python: field("python"),
        node: field("node"),
        os: field("os"),
    };
    if facts == RuntimeFacts::default() {
        None
    } else {
        Some(facts)
    }
}

/// Commit identity from a version response (`commit`/`short`, `commit_full`)
fn version_commit(value: &Value) -> Option<CommitIdentity> {
    let text = |key: &str| value.get(key).map(scalar).filter(|s| !s.is_empty());
    let short = text("commit").or_else(|| text("short")).unwrap_or_default();
    let full = text("commit_full").or_else(|| text("full")).unwrap_or_default();
    if short.is_empty() && full.is_empty() {
        return None;
    }
    let mut commit = CommitIdentity::default();
    commit.fill_from(&CommitIdentity { short, full });
    Some(commit)
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => String::new(),
    }
}

fn is_absolute(url: &str) -> bool {
    url.starts_with("http://") || url.starts_with("https://")
}
