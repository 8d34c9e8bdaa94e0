//! Clipboard delivery with download fallback.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::codec::{self, Format};
use crate::error::BeaconError;

/// Base name of the download artifact written when the clipboard is blocked
pub const DOWNLOAD_STEM: &str = "brain_snapshot";

/// Writes text to a clipboard
pub trait ClipboardProvider {
    fn write_text(&self, text: &str) -> Result<(), BeaconError>;
}

/// System clipboard backed by the first platform tool that accepts the text
#[derive(Debug, Clone, Default)]
pub struct SystemClipboard;

impl SystemClipboard {
    fn candidates() -> Vec<(&'static str, &'static [&'static str])> {
        const NO_ARGS: &[&str] = &[];
        const XCLIP_ARGS: &[&str] = &["-selection", "clipboard"];
        const XSEL_ARGS: &[&str] = &["--clipboard", "--input"];

        let mut tools = Vec::new();
        if cfg!(target_os = "macos") {
            tools.push(("pbcopy", NO_ARGS));
        } else if cfg!(windows) {
            tools.push(("clip", NO_ARGS));
        } else {
            if std::env::var_os("WAYLAND_DISPLAY").is_some() {
                tools.push(("wl-copy", NO_ARGS));
            }
            tools.push(("xclip", XCLIP_ARGS));
            tools.push(("xsel", XSEL_ARGS));
            // WSL
            tools.push(("clip.exe", NO_ARGS));
        }
        tools
    }

    fn try_tool(program: &str, args: &[&str], text: &str) -> Result<(), String> {
        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| e.to_string())?;

        if let Some(mut stdin) = child.stdin.take() {
            if let Err(e) = stdin.write_all(text.as_bytes()) {
                drop(stdin);
                let _ = child.kill();
                let _ = child.wait();
                return Err(e.to_string());
            }
        }

        let status = child.wait().map_err(|e| e.to_string())?;
        if status.success() {
            Ok(())
        } else {
            Err(format!("exited with {}", status))
        }
    }
}

impl ClipboardProvider for SystemClipboard {
    fn write_text(&self, text: &str) -> Result<(), BeaconError> {
        let mut failures = Vec::new();
        for (program, args) in Self::candidates() {
            match Self::try_tool(program, args, text) {
                Ok(()) => {
                    debug!(tool = program, "clipboard write succeeded");
                    return Ok(());
                }
                Err(e) => failures.push(format!("{}: {}", program, e)),
            }
        }
        Err(BeaconError::Delivery(format!(
            "no clipboard tool accepted the text ({})",
            failures.join("; ")
        )))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DeliveryStatus {
    /// Copied and the text passed the well-formedness check
    CopiedValid,
    /// Copied, but the text failed to parse or misses required keys
    CopiedUnvalidated,
    /// Clipboard unavailable; text left for manual copy / download
    Blocked,
}

impl DeliveryStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DeliveryStatus::CopiedValid => "copied-valid",
            DeliveryStatus::CopiedUnvalidated => "copied-unvalidated",
            DeliveryStatus::Blocked => "blocked",
        }
    }
}

/// Outcome of one delivery; the text always stays available to the caller
#[derive(Debug, Clone, Serialize)]
pub struct DeliveryReport {
    pub status: DeliveryStatus,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub validation_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_path: Option<PathBuf>,
    #[serde(skip)]
    pub text: String,
}

/// Clipboard-first delivery
pub struct Deliverer<C: ClipboardProvider> {
    clipboard: C,
    download_dir: Option<PathBuf>,
    format: Format,
}

impl<C: ClipboardProvider> Deliverer<C> {
    pub fn new(clipboard: C, format: Format) -> Self {
        Self {
            clipboard,
            download_dir: None,
            format,
        }
    }

    /// Directory receiving the download artifact when the clipboard is blocked
    pub fn with_download_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.download_dir = Some(dir.into());
        self
    }

    /// Deliver `text`. Never fails: every path ends in a status.
    pub fn deliver(&self, text: &str) -> DeliveryReport {
        match self.clipboard.write_text(text) {
            Ok(()) => match codec::validate(text) {
                Ok(_) => DeliveryReport {
                    status: DeliveryStatus::CopiedValid,
                    message: "Copied snapshot (valid)".to_string(),
                    validation_error: None,
                    download_path: None,
                    text: text.to_string(),
                },
                Err(e) => {
                    warn!(error = %e, "copied text failed the well-formedness check");
                    DeliveryReport {
                        status: DeliveryStatus::CopiedUnvalidated,
                        message: "Copied snapshot (parse check failed)".to_string(),
                        validation_error: Some(e.to_string()),
                        download_path: None,
                        text: text.to_string(),
                    }
                }
            },
            Err(e) => {
                warn!(error = %e, "clipboard blocked, falling back to download");
                let download_path = self
                    .download_dir
                    .as_deref()
                    .and_then(|dir| match write_download(dir, text, self.format) {
                        Ok(path) => Some(path),
                        Err(err) => {
                            warn!(error = %err, "download fallback failed");
                            None
                        }
                    });
                let message = match &download_path {
                    Some(path) => format!("Clipboard blocked: downloaded to {}", path.display()),
                    None => "Clipboard blocked: copy the text manually".to_string(),
                };
                DeliveryReport {
                    status: DeliveryStatus::Blocked,
                    message,
                    validation_error: None,
                    download_path,
                    text: text.to_string(),
                }
            }
        }
    }
}

/// Write the text as `brain_snapshot.<ext>` inside `dir`
pub fn write_download(dir: &Path, text: &str, format: Format) -> Result<PathBuf, BeaconError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.{}", DOWNLOAD_STEM, format.file_extension()));
    std::fs::write(&path, text)?;
    info!(path = %path.display(), "snapshot downloaded");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{build, ResolvedSources};
    use std::cell::RefCell;
    use tempfile::tempdir;

    #[cfg(unix)]
    #[test]
    fn test_tool_that_ignores_stdin_fails() {
        // `true` exits without reading, so a large write hits a closed pipe
        let text = "x".repeat(1 << 20);
        assert!(SystemClipboard::try_tool("true", &[], &text).is_err());
    }

    #[test]
    fn test_missing_tool_fails() {
        assert!(SystemClipboard::try_tool("beacon-no-such-clipboard-tool", &[], "x").is_err());
    }

    #[derive(Default)]
    struct RecordingClipboard {
        fail: bool,
        written: RefCell<Vec<String>>,
    }

    impl ClipboardProvider for RecordingClipboard {
        fn write_text(&self, text: &str) -> Result<(), BeaconError> {
            if self.fail {
                return Err(BeaconError::Delivery("clipboard denied".into()));
            }
            self.written.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    fn snapshot_text() -> String {
        let snap = build(&ResolvedSources::default(), &[]);
        codec::encode(&snap, None, None, Format::Json).unwrap()
    }

    #[test]
    fn test_copied_valid() {
        let deliverer = Deliverer::new(RecordingClipboard::default(), Format::Json);
        let text = snapshot_text();
        let report = deliverer.deliver(&text);
        assert_eq!(report.status, DeliveryStatus::CopiedValid);
        assert_eq!(deliverer.clipboard.written.borrow().as_slice(), &[text]);
    }

    #[test]
    fn test_copied_unvalidated() {
        let deliverer = Deliverer::new(RecordingClipboard::default(), Format::Json);
        let report = deliverer.deliver("// BRaiN Copy v1\n{\"thread_brief\": \"\"}");
        assert_eq!(report.status, DeliveryStatus::CopiedUnvalidated);
        assert!(report.validation_error.unwrap().contains("build_trace"));
    }

    #[test]
    fn test_blocked_downloads() {
        let dir = tempdir().unwrap();
        let clipboard = RecordingClipboard {
            fail: true,
            ..Default::default()
        };
        let deliverer = Deliverer::new(clipboard, Format::Yaml).with_download_dir(dir.path());
        let report = deliverer.deliver("# banner\nthread_brief: x\n");

        assert_eq!(report.status, DeliveryStatus::Blocked);
        let path = report.download_path.unwrap();
        assert_eq!(path.file_name().unwrap(), "brain_snapshot.yaml");
        assert_eq!(std::fs::read_to_string(path).unwrap(), report.text);
    }

    #[test]
    fn test_blocked_without_download_dir_keeps_text() {
        let clipboard = RecordingClipboard {
            fail: true,
            ..Default::default()
        };
        let report = Deliverer::new(clipboard, Format::Json).deliver("raw");
        assert_eq!(report.status, DeliveryStatus::Blocked);
        assert!(report.download_path.is_none());
        assert_eq!(report.text, "raw");
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(DeliveryStatus::CopiedValid.as_str(), "copied-valid");
        assert_eq!(
            serde_json::to_value(DeliveryStatus::CopiedUnvalidated).unwrap(),
            serde_json::json!("copied-unvalidated")
        );
    }
}
