//! Conjure Context — best-effort ambient signals for command generation.
//!
//! Three independent queries: the text currently selected in the frontmost
//! application, the frontmost application's name, and (for terminal-like
//! applications only) its working directory. Every query may fail or come
//! back empty; failures degrade to an absent field and never surface as
//! errors.

mod osa;

pub use osa::OsaProvider;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// Ambient context for one generation request. Immutable once collected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Context {
    /// Text selected in the frontmost application, if any.
    pub selected_text: Option<String>,
    /// Name of the frontmost visible application, if any.
    pub foreground_app: Option<String>,
    /// Working directory of the frontmost terminal, if any.
    pub working_directory: Option<String>,
}

impl Context {
    /// True when no field carries a value.
    pub fn is_empty(&self) -> bool {
        self.selected_text.is_none()
            && self.foreground_app.is_none()
            && self.working_directory.is_none()
    }
}

/// Applications for which a working-directory query makes sense.
const TERMINAL_APPS: &[&str] = &[
    "Terminal", "iTerm", "iTerm2", "Warp", "Alacritty", "kitty", "Ghostty", "WezTerm",
];

/// Whether the named application is terminal-like.
pub fn is_terminal_app(name: &str) -> bool {
    TERMINAL_APPS
        .iter()
        .any(|app| app.eq_ignore_ascii_case(name))
}

/// Pluggable source for the three ambient queries.
///
/// Each query is individually failable; `None` means "no value", whatever
/// the cause. Implementations must not block longer than they have to —
/// the collector bounds each call with a timeout regardless.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    /// Text currently selected in the frontmost application.
    async fn selected_text(&self) -> Option<String>;

    /// Name of the frontmost, visible application.
    async fn frontmost_app(&self) -> Option<String>;

    /// Working-directory hint for the named terminal-like application.
    async fn terminal_cwd(&self, app: &str) -> Option<String>;
}

/// Collects a [`Context`] from a provider, bounding every query.
pub struct Collector {
    provider: Arc<dyn ContextProvider>,
    query_timeout: Duration,
}

impl Collector {
    pub fn new(provider: Arc<dyn ContextProvider>, query_timeout: Duration) -> Self {
        Self {
            provider,
            query_timeout,
        }
    }

    /// Run the three queries in order: selection, app, then — only for a
    /// terminal-like app — working directory. A timed-out query reads as
    /// absent, like any other failure.
    pub async fn collect(&self) -> Context {
        let selected_text = self.query("selected_text", self.provider.selected_text()).await;
        let foreground_app = self.query("frontmost_app", self.provider.frontmost_app()).await;

        let working_directory = match foreground_app.as_deref() {
            Some(app) if is_terminal_app(app) => {
                self.query("terminal_cwd", self.provider.terminal_cwd(app)).await
            }
            _ => None,
        };

        Context {
            selected_text,
            foreground_app,
            working_directory,
        }
    }

    async fn query(
        &self,
        name: &str,
        fut: impl Future<Output = Option<String>>,
    ) -> Option<String> {
        match timeout(self.query_timeout, fut).await {
            Ok(value) => normalize(value),
            Err(_) => {
                debug!(query = name, timeout_ms = self.query_timeout.as_millis() as u64, "Context query timed out");
                None
            }
        }
    }
}

/// Trim the value; whitespace-only collapses to absent.
fn normalize(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
