//! Routes a single encoded request to tmux and, for attach and create, to
//! a terminal.
//!
//! Every invocation goes through parse, validate and execute once. Nothing
//! is retried; the presence checks before attach and delete only exist to
//! tell "missing" apart from "failed".
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::error::DispatchError;
use crate::notify::Notification;
use crate::refresh::Refresher;
use crate::request::{Action, ActionRequest};
use crate::terminal::TerminalChoice;
use crate::terminal::opener::Launcher;
use crate::terminal::resolver::{AppProbe, Resolution, resolve};
use crate::tmux::interface::{Multiplexer, TmuxError};
use crate::util::validate_session_name;

/// Result of a successful dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome {
    pub notification: Notification,
    /// Whether the session list was asked to refresh.
    pub refreshed: bool,
}

pub struct Dispatcher<'a> {
    tmux: &'a dyn Multiplexer,
    probe: &'a dyn AppProbe,
    launcher: &'a dyn Launcher,
    refresher: &'a dyn Refresher,
    terminal: TerminalChoice,
    /// `None` when no root could be determined; only create needs it.
    session_root: Option<PathBuf>,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        tmux: &'a dyn Multiplexer,
        probe: &'a dyn AppProbe,
        launcher: &'a dyn Launcher,
        refresher: &'a dyn Refresher,
        terminal: TerminalChoice,
        session_root: Option<PathBuf>,
    ) -> Self {
        Self {
            tmux,
            probe,
            launcher,
            refresher,
            terminal,
            session_root,
        }
    }

    /// Dispatches `raw` and turns the result into the notification to show.
    ///
    /// Blank input yields `None`: there is nothing to report.
    pub fn run(&self, raw: &str) -> Option<Notification> {
        match self.dispatch(raw) {
            Ok(outcome) => Some(outcome.notification),
            Err(DispatchError::EmptyInput) => {
                debug!("empty request");
                None
            }
            Err(err) => {
                if err.is_informational() {
                    info!(%err, "request finished with a notice");
                } else {
                    warn!(%err, "request failed");
                }
                Some(err.notification())
            }
        }
    }

    pub fn dispatch(&self, raw: &str) -> Result<Outcome, DispatchError> {
        if raw.trim().is_empty() {
            return Err(DispatchError::EmptyInput);
        }

        let request = ActionRequest::parse(raw);
        debug!(?request, "parsed request");

        let name = validate_session_name(&request.session_name).map_err(|e| {
            DispatchError::InvalidSessionName {
                name: request.session_name.clone(),
                reason: e.to_string(),
            }
        })?;

        let action = request
            .action()
            .map_err(|e| DispatchError::UnknownAction(e.0))?;

        info!(%action, session = %name, "dispatching");

        match action {
            Action::Attach => self.attach(&name),
            Action::Create => self.create(&name),
            Action::Delete => self.delete(&name),
            Action::Detach => self.detach(&name),
        }
    }

    fn attach(&self, name: &str) -> Result<Outcome, DispatchError> {
        self.ensure_exists(name)?;

        let resolution = self.open_terminal(name)?;

        Ok(Outcome {
            notification: Notification::info(
                "Attached to session",
                with_notice(
                    format!("\"{name}\" opened in {}", resolution.terminal),
                    &resolution,
                ),
            ),
            refreshed: false,
        })
    }

    fn create(&self, name: &str) -> Result<Outcome, DispatchError> {
        let root = self
            .session_root
            .as_deref()
            .ok_or(DispatchError::SessionRootUnavailable)?;

        // detached, so the terminal never races the session's startup
        self.tmux
            .new_detached_session(name, root)
            .map_err(|e| match e {
                TmuxError::DuplicateSession(_) => {
                    DispatchError::DuplicateSession(name.to_string())
                }
                TmuxError::Failed { operation, stderr } => {
                    DispatchError::UnclassifiedToolFailure {
                        operation,
                        message: stderr,
                    }
                }
                other => DispatchError::UnclassifiedToolFailure {
                    operation: "new-session".to_string(),
                    message: other.to_string(),
                },
            })?;

        info!(session = %name, root = %root.display(), "created session");

        let resolution = self.open_terminal(name)?;

        Ok(Outcome {
            notification: Notification::info(
                "Created session",
                with_notice(
                    format!("\"{name}\" opened in {}", resolution.terminal),
                    &resolution,
                ),
            ),
            refreshed: false,
        })
    }

    fn delete(&self, name: &str) -> Result<Outcome, DispatchError> {
        self.ensure_exists(name)?;

        self.tmux
            .kill_session(name)
            .map_err(|e| DispatchError::from_tmux(e, name))?;

        Ok(Outcome {
            notification: Notification::info(
                "Deleted session",
                format!("Session \"{name}\" was killed"),
            ),
            refreshed: self.refresh(),
        })
    }

    fn detach(&self, name: &str) -> Result<Outcome, DispatchError> {
        self.ensure_exists(name)?;

        self.tmux
            .detach_clients(name)
            .map_err(|e| DispatchError::from_tmux(e, name))?;

        Ok(Outcome {
            notification: Notification::info(
                "Detached session",
                format!("All clients detached from \"{name}\""),
            ),
            refreshed: self.refresh(),
        })
    }

    fn ensure_exists(&self, name: &str) -> Result<(), DispatchError> {
        let exists = self
            .tmux
            .has_session(name)
            .map_err(|e| DispatchError::from_tmux(e, name))?;

        if !exists {
            return Err(DispatchError::SessionNotFound(name.to_string()));
        }

        Ok(())
    }

    fn open_terminal(&self, name: &str) -> Result<Resolution, DispatchError> {
        let resolution = resolve(&self.terminal, self.probe)?;
        debug!(terminal = %resolution.terminal, "resolved terminal");

        self.launcher
            .launch(resolution.terminal, name)
            .map_err(|e| DispatchError::from_script(e, resolution.terminal))?;

        Ok(resolution)
    }

    fn refresh(&self) -> bool {
        match self.refresher.refresh() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "failed to refresh session list");
                false
            }
        }
    }
}

fn with_notice(message: String, resolution: &Resolution) -> String {
    match &resolution.notice {
        Some(notice) => format!("{message} ({notice})"),
        None => message,
    }
}
