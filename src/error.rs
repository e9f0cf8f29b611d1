use crate::notify::Notification;
use crate::terminal::Terminal;
use crate::terminal::automation::ScriptError;
use crate::tmux::interface::TmuxError;

/// Every way a dispatched request can end other than success.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DispatchError {
    #[error("no request given")]
    EmptyInput,

    #[error("invalid session name \"{name}\": {reason}")]
    InvalidSessionName { name: String, reason: String },

    #[error("unknown action \"{0}\"")]
    UnknownAction(String),

    #[error("session \"{0}\" not found")]
    SessionNotFound(String),

    #[error("session \"{0}\" already exists")]
    DuplicateSession(String),

    #[error("no clients attached to session \"{0}\"")]
    NoClientsAttached(String),

    #[error("no supported terminal: {0}")]
    TerminalUnavailable(String),

    #[error("{terminal} needs automation permission: {reason}")]
    PermissionDenied { terminal: Terminal, reason: String },

    #[error("{terminal} automation failed: {reason}")]
    AutomationFailure { terminal: Terminal, reason: String },

    #[error("tmux {operation} failed: {message}")]
    UnclassifiedToolFailure { operation: String, message: String },

    #[error("no directory to start new sessions in")]
    SessionRootUnavailable,
}

impl DispatchError {
    /// Maps an adapter error for `session` onto the dispatch taxonomy.
    pub fn from_tmux(err: TmuxError, session: &str) -> Self {
        match err {
            TmuxError::SessionNotFound(_) | TmuxError::NoServer => {
                DispatchError::SessionNotFound(session.to_string())
            }
            TmuxError::DuplicateSession(_) => {
                DispatchError::DuplicateSession(session.to_string())
            }
            TmuxError::NoClients(_) => {
                DispatchError::NoClientsAttached(session.to_string())
            }
            TmuxError::NotInstalled(path) => {
                DispatchError::UnclassifiedToolFailure {
                    operation: "lookup".to_string(),
                    message: format!("tmux not found at {path}"),
                }
            }
            TmuxError::Failed { operation, stderr } => {
                DispatchError::UnclassifiedToolFailure {
                    operation,
                    message: stderr,
                }
            }
        }
    }

    pub fn from_script(err: ScriptError, terminal: Terminal) -> Self {
        match err {
            ScriptError::PermissionDenied(reason) => {
                DispatchError::PermissionDenied { terminal, reason }
            }
            ScriptError::Failed(reason) | ScriptError::Spawn(reason) => {
                DispatchError::AutomationFailure { terminal, reason }
            }
        }
    }

    /// Whether this is a notice rather than a failure.
    pub fn is_informational(&self) -> bool {
        matches!(self, DispatchError::NoClientsAttached(_))
    }

    /// The title and message shown to the user.
    pub fn notification(&self) -> Notification {
        match self {
            DispatchError::EmptyInput => {
                Notification::info("Nothing to do", "No session given")
            }
            DispatchError::InvalidSessionName { name, reason } => {
                Notification::error(
                    "Invalid session name",
                    format!("\"{name}\": {reason}"),
                )
            }
            DispatchError::UnknownAction(action) => Notification::error(
                "Unknown action",
                format!("\"{action}\" is not one of attach, create, delete, detach"),
            ),
            DispatchError::SessionNotFound(name) => Notification::error(
                "Session not found",
                format!("Session \"{name}\" does not exist"),
            ),
            DispatchError::DuplicateSession(name) => Notification::error(
                "Session already exists",
                format!("A session named \"{name}\" already exists"),
            ),
            DispatchError::NoClientsAttached(name) => Notification::info(
                "Already detached",
                format!("No clients are attached to \"{name}\""),
            ),
            DispatchError::TerminalUnavailable(hint) => {
                Notification::error("No supported terminal found", hint.clone())
            }
            DispatchError::PermissionDenied { terminal, .. } => {
                Notification::error(
                    "Permission required",
                    format!(
                        "Allow the launcher to control {terminal} in System Settings > Privacy & Security > Accessibility and Automation"
                    ),
                )
            }
            DispatchError::AutomationFailure { terminal, reason } => {
                Notification::error(
                    format!("Could not open {terminal}"),
                    reason.clone(),
                )
            }
            DispatchError::UnclassifiedToolFailure { operation, message } => {
                Notification::error(
                    "tmux error",
                    format!("{operation}: {message}"),
                )
            }
            DispatchError::SessionRootUnavailable => Notification::error(
                "Cannot create session",
                "Could not determine the home directory; set session_root under [tmux] in the config file",
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Level;

    #[test]
    fn missing_server_means_missing_session() {
        assert_eq!(
            DispatchError::from_tmux(TmuxError::NoServer, "work"),
            DispatchError::SessionNotFound("work".into())
        );
    }

    #[test]
    fn unknown_tmux_failures_keep_raw_text() {
        let err = DispatchError::from_tmux(
            TmuxError::Failed {
                operation: "kill-session".into(),
                stderr: "server busy".into(),
            },
            "work",
        );
        assert_eq!(
            err,
            DispatchError::UnclassifiedToolFailure {
                operation: "kill-session".into(),
                message: "server busy".into(),
            }
        );
        assert_eq!(err.notification().message, "kill-session: server busy");
    }

    #[test]
    fn permission_errors_get_their_own_kind() {
        let err = DispatchError::from_script(
            ScriptError::PermissionDenied("(-1719)".into()),
            Terminal::Ghostty,
        );
        assert!(matches!(err, DispatchError::PermissionDenied { .. }));
        assert_eq!(err.notification().title, "Permission required");

        let err = DispatchError::from_script(
            ScriptError::Failed("boom".into()),
            Terminal::ITerm,
        );
        assert_eq!(err.notification().title, "Could not open iTerm2");
    }

    #[test]
    fn missing_root_has_its_own_wording() {
        let n = DispatchError::SessionRootUnavailable.notification();
        assert_eq!(n.title, "Cannot create session");
        assert!(!n.message.contains("new-session"));
    }

    #[test]
    fn no_clients_is_informational() {
        let err = DispatchError::NoClientsAttached("bar".into());
        assert!(err.is_informational());
        assert_eq!(err.notification().level, Level::Info);
        assert_eq!(
            DispatchError::SessionNotFound("bar".into()).notification().level,
            Level::Error
        );
    }
}
