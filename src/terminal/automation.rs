//! AppleScript execution through `osascript`.
use std::io;
use std::process::Command;

use tracing::debug;

/// stderr fragments macOS emits when an automation permission is missing.
const PERMISSION_MARKERS: [&str; 6] = [
    "not allowed assistive access",
    "not authorized to send apple events",
    "(-1719)",
    "(-1743)",
    "(-25211)",
    "not allowed to send keystrokes",
];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScriptError {
    #[error("automation permission denied: {0}")]
    PermissionDenied(String),

    #[error("osascript failed: {0}")]
    Failed(String),

    #[error("failed to run osascript: {0}")]
    Spawn(String),
}

/// Runs AppleScript source and returns its trimmed stdout.
pub trait ScriptRunner {
    fn run(&self, script: &str) -> Result<String, ScriptError>;
}

/// [`ScriptRunner`] that shells out to `osascript -e`.
#[derive(Debug, Default, Clone, Copy)]
pub struct Osascript;

impl ScriptRunner for Osascript {
    fn run(&self, script: &str) -> Result<String, ScriptError> {
        debug!(%script, "running osascript");

        let output = Command::new("osascript")
            .arg("-e")
            .arg(script)
            .output()
            .map_err(|e: io::Error| ScriptError::Spawn(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(classify_script_failure(&stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
    }
}

/// Separates missing-permission failures from every other script error.
pub fn classify_script_failure(stderr: &str) -> ScriptError {
    let stderr = stderr.trim();
    let lowered = stderr.to_lowercase();

    if PERMISSION_MARKERS.iter().any(|m| lowered.contains(m)) {
        ScriptError::PermissionDenied(stderr.to_string())
    } else {
        ScriptError::Failed(stderr.to_string())
    }
}

/// Renders `value` as an AppleScript string literal.
pub fn applescript_string(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\n' => quoted.push_str("\\n"),
            '\t' => quoted.push_str("\\t"),
            '\r' => quoted.push_str("\\r"),
            c => quoted.push(c),
        }
    }
    quoted.push('"');
    quoted
}
