use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use crate::tmux::session::*;

const TMUX_LINE_SEPARATOR: &str = "\n";

/// Format string passed to `tmux list-sessions -F`.
pub const LIST_FORMAT: &str = "#{session_name}|#{session_windows}|#{session_created}|#{session_attached}|#{session_activity}";

/// Locations tried when tmux is not on the (often minimal) `PATH`.
const FALLBACK_TMUX_PATHS: [&str; 2] =
    ["/opt/homebrew/bin/tmux", "/usr/local/bin/tmux"];

static DUPLICATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)duplicate session").unwrap());
static NO_SERVER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)no server running|error connecting to|server exited")
        .unwrap()
});
static NOT_FOUND_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)can't find session|session not found|no such session")
        .unwrap()
});
static NO_CLIENTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)no clients?\b|no current client|not attached").unwrap()
});

/// Failures reported by the tmux adapter.
///
/// Known conditions are mapped from tmux's stderr; anything else keeps the
/// raw text in [`TmuxError::Failed`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TmuxError {
    #[error("tmux not found: {0}")]
    NotInstalled(String),

    #[error("can't find session: {0}")]
    SessionNotFound(String),

    #[error("duplicate session: {0}")]
    DuplicateSession(String),

    #[error("no clients attached to session {0}")]
    NoClients(String),

    #[error("no tmux server running")]
    NoServer,

    #[error("tmux {operation} failed: {stderr}")]
    Failed { operation: String, stderr: String },
}

/// The operations the dispatcher and lister need from the multiplexer.
pub trait Multiplexer {
    /// Exact-name presence check. A missing server means no session.
    fn has_session(&self, name: &str) -> Result<bool, TmuxError>;

    /// Creates a detached session rooted at `work_dir`.
    fn new_detached_session(
        &self,
        name: &str,
        work_dir: &Path,
    ) -> Result<(), TmuxError>;

    fn kill_session(&self, name: &str) -> Result<(), TmuxError>;

    /// Detaches every client attached to the session.
    fn detach_clients(&self, name: &str) -> Result<(), TmuxError>;

    /// Lists every session. A missing server yields an empty list.
    fn list_sessions(&self) -> Result<Vec<Session>, TmuxError>;
}

/// [`Multiplexer`] backed by the `tmux` command-line tool.
///
/// Arguments are passed to tmux directly, never through a shell, so session
/// names need no quoting here.
#[derive(Debug, Clone)]
pub struct TmuxCli {
    program: PathBuf,
    socket: Option<String>,
}

impl TmuxCli {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            socket: None,
        }
    }

    /// Talks to the server on the named socket (`tmux -L`) instead of the
    /// default one.
    pub fn with_socket(mut self, socket: Option<&str>) -> Self {
        self.socket = socket.filter(|s| !s.is_empty()).map(str::to_string);
        self
    }

    /// Finds the tmux binary: the configured path, then `PATH`, then the
    /// usual Homebrew locations.
    pub fn locate(configured: Option<&Path>) -> Result<Self, TmuxError> {
        if let Some(path) = configured {
            return Ok(Self::new(path));
        }

        if let Ok(path) = which::which("tmux") {
            return Ok(Self::new(path));
        }

        FALLBACK_TMUX_PATHS
            .iter()
            .map(Path::new)
            .find(|path| path.is_file())
            .map(Self::new)
            .ok_or_else(|| TmuxError::NotInstalled("tmux".to_string()))
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run<S: AsRef<str>>(&self, args: &[S]) -> Result<Output, TmuxError> {
        let args: Vec<&str> = args.iter().map(|a| a.as_ref()).collect();
        debug!(program = %self.program.display(), socket = ?self.socket, ?args, "running tmux");

        let mut command = Command::new(&self.program);
        if let Some(socket) = &self.socket {
            command.args(["-L", socket.as_str()]);
        }

        command.args(&args).output().map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                TmuxError::NotInstalled(self.program.display().to_string())
            } else {
                TmuxError::Failed {
                    operation: args.first().unwrap_or(&"tmux").to_string(),
                    stderr: e.to_string(),
                }
            }
        })
    }

    fn run_checked<S: AsRef<str>>(
        &self,
        args: &[S],
        session: &str,
    ) -> Result<Output, TmuxError> {
        let output = self.run(args)?;

        if output.status.success() {
            return Ok(output);
        }

        let operation = args.first().map(|a| a.as_ref()).unwrap_or("tmux");
        let stderr = String::from_utf8_lossy(&output.stderr);
        let err = classify_failure(operation, session, &stderr);
        debug!(%operation, %session, error = %err, "tmux failed");
        Err(err)
    }

    fn attached_clients(&self, name: &str) -> Result<u32, TmuxError> {
        let target = exact_target(name);
        let output = self.run_checked(
            &["display-message", "-p", "-t", target.as_str(), "#{session_attached}"],
            name,
        )?;

        parse_attached_clients(&String::from_utf8_lossy(&output.stdout), name)
    }
}

impl Multiplexer for TmuxCli {
    fn has_session(&self, name: &str) -> Result<bool, TmuxError> {
        let target = exact_target(name);
        match self.run_checked(&["has-session", "-t", target.as_str()], name) {
            Ok(_) => Ok(true),
            Err(TmuxError::SessionNotFound(_) | TmuxError::NoServer) => {
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    fn new_detached_session(
        &self,
        name: &str,
        work_dir: &Path,
    ) -> Result<(), TmuxError> {
        self.run_checked(&build_new_session_args(name, work_dir), name)?;
        Ok(())
    }

    fn kill_session(&self, name: &str) -> Result<(), TmuxError> {
        let target = exact_target(name);
        self.run_checked(&["kill-session", "-t", target.as_str()], name)?;
        Ok(())
    }

    fn detach_clients(&self, name: &str) -> Result<(), TmuxError> {
        // display-message exits 0 with no output for a missing target
        if !self.has_session(name)? {
            return Err(TmuxError::SessionNotFound(name.to_string()));
        }

        // detach-client succeeds silently on a session without clients
        if self.attached_clients(name)? == 0 {
            return Err(TmuxError::NoClients(name.to_string()));
        }

        let target = exact_target(name);
        self.run_checked(&["detach-client", "-s", target.as_str()], name)?;
        Ok(())
    }

    fn list_sessions(&self) -> Result<Vec<Session>, TmuxError> {
        let args = ["list-sessions", "-F", LIST_FORMAT];
        let output = match self.run_checked(&args, "") {
            Ok(output) => output,
            Err(TmuxError::NoServer) => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let string_output = String::from_utf8_lossy(&output.stdout);

        Ok(string_output
            .trim()
            .split(TMUX_LINE_SEPARATOR)
            .filter_map(Session::from_list_line)
            .collect())
    }
}

/// Prefixes `=` so tmux matches the name exactly instead of by prefix.
pub fn exact_target(name: &str) -> String {
    format!("={name}")
}

/// Reads the `#{session_attached}` count. Output that is not a number
/// means tmux did not resolve the session.
pub fn parse_attached_clients(stdout: &str, name: &str) -> Result<u32, TmuxError> {
    stdout
        .trim()
        .parse()
        .map_err(|_| TmuxError::SessionNotFound(name.to_string()))
}

/// Arguments for `tmux new-session` creating a detached session.
pub fn build_new_session_args(name: &str, work_dir: &Path) -> Vec<String> {
    vec![
        "new-session".to_string(),
        "-d".to_string(),
        "-s".to_string(),
        name.to_string(),
        "-c".to_string(),
        work_dir.to_string_lossy().to_string(),
    ]
}

/// Maps tmux's stderr onto a [`TmuxError`].
///
/// tmux's wording is not a stable contract; unmatched text always lands in
/// [`TmuxError::Failed`] with the message preserved.
pub fn classify_failure(operation: &str, session: &str, stderr: &str) -> TmuxError {
    let stderr = stderr.trim();

    if DUPLICATE_RE.is_match(stderr) {
        TmuxError::DuplicateSession(session.to_string())
    } else if NO_SERVER_RE.is_match(stderr) {
        TmuxError::NoServer
    } else if NOT_FOUND_RE.is_match(stderr) {
        TmuxError::SessionNotFound(session.to_string())
    } else if NO_CLIENTS_RE.is_match(stderr) {
        TmuxError::NoClients(session.to_string())
    } else {
        TmuxError::Failed {
            operation: operation.to_string(),
            stderr: stderr.to_string(),
        }
    }
}
