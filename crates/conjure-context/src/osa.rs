use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::ContextProvider;

/// Context provider backed by `osascript` (macOS).
///
/// Each query runs one AppleScript through the `osascript` binary. On
/// platforms without it, or when a script errors (no accessibility
/// permission, no front window, app not scriptable), the query returns
/// `None` and the pipeline carries on without that field.
#[derive(Default)]
pub struct OsaProvider;

const SELECTED_TEXT_SCRIPT: &str = r#"tell application "System Events"
    set frontProc to first application process whose frontmost is true
    set focused to value of attribute "AXFocusedUIElement" of frontProc
    return value of attribute "AXSelectedText" of focused
end tell"#;

const FRONTMOST_APP_SCRIPT: &str = r#"tell application "System Events" to get name of first application process whose frontmost is true and visible is true"#;

const FRONT_WINDOW_TITLE_SCRIPT: &str = r#"tell application "System Events" to get title of front window of (first application process whose frontmost is true)"#;

// Resolves the tty of the selected tab, then asks lsof for the shell's cwd.
const TERMINAL_CWD_SCRIPT: &str = r#"tell application "Terminal" to set ttyName to tty of selected tab of front window
do shell script "lsof -a -p $(lsof -t " & ttyName & " | head -n 1) -d cwd -Fn | sed -n 's/^n//p'""#;

const ITERM_CWD_SCRIPT: &str = r#"tell application "iTerm2" to tell current session of current window to return variable named "session.path""#;

impl OsaProvider {
    pub fn new() -> Self {
        Self
    }

    async fn run(&self, script: &str) -> Option<String> {
        let output = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .output()
            .await
            .ok()?;

        if !output.status.success() {
            debug!(code = ?output.status.code(), "osascript query failed");
            return None;
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            None
        } else {
            Some(text)
        }
    }
}

/// App-specific primary strategy for the working-directory query.
fn primary_cwd_script(app: &str) -> Option<&'static str> {
    match app {
        "Terminal" => Some(TERMINAL_CWD_SCRIPT),
        "iTerm" | "iTerm2" => Some(ITERM_CWD_SCRIPT),
        _ => None,
    }
}

/// Pull a directory out of a window title. Most terminal emulators surface
/// the working directory in the title, bare or `~`-prefixed.
fn extract_path(title: &str) -> Option<String> {
    for token in title.split_whitespace() {
        if let Some(rest) = token.strip_prefix('~') {
            let home = std::env::var("HOME").ok()?;
            return Some(format!("{home}{rest}"));
        }
        if token.starts_with('/') {
            return Some(token.to_string());
        }
    }
    None
}

#[async_trait]
impl ContextProvider for OsaProvider {
    async fn selected_text(&self) -> Option<String> {
        self.run(SELECTED_TEXT_SCRIPT).await
    }

    async fn frontmost_app(&self) -> Option<String> {
        self.run(FRONTMOST_APP_SCRIPT).await
    }

    async fn terminal_cwd(&self, app: &str) -> Option<String> {
        if let Some(script) = primary_cwd_script(app) {
            if let Some(path) = self.run(script).await {
                return Some(path);
            }
            debug!(app, "Primary cwd query returned nothing, trying window title");
        }

        let title = self.run(FRONT_WINDOW_TITLE_SCRIPT).await?;
        extract_path(&title)
    }
}
