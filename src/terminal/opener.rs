use std::borrow::Cow;
use std::cell::Cell;
use std::thread::sleep;

use shell_escape::unix::escape;
use tracing::{debug, warn};

use crate::config::TimingConfig;
use crate::terminal::Terminal;
use crate::terminal::automation::{ScriptError, ScriptRunner, applescript_string};
use crate::util::wait_until;

/// macOS virtual key code of the Return key.
const RETURN_KEY_CODE: u8 = 36;

/// Shell command typed into the terminal to attach to `session_name`.
///
/// The name is shell-quoted so metacharacters reach tmux literally.
pub fn attach_command(session_name: &str) -> String {
    format!(
        "tmux attach-session -t {}",
        escape(Cow::from(session_name))
    )
}

/// Drives one terminal application.
///
/// [`open`](TerminalOpener::open) activates the app, makes sure a window
/// is ready and then runs the attach command in it.
pub trait TerminalOpener {
    fn terminal(&self) -> Terminal;

    fn activate(&self) -> Result<(), ScriptError>;

    fn prepare_window(&self) -> Result<(), ScriptError>;

    fn send_command(&self, command: &str) -> Result<(), ScriptError>;

    fn open(&self, session_name: &str) -> Result<(), ScriptError> {
        let command = attach_command(session_name);
        debug!(terminal = %self.terminal(), %command, "opening session");

        self.activate()?;
        self.prepare_window()?;
        self.send_command(&command)
    }
}

/// Returns the adapter for `terminal`.
pub fn opener_for<'a>(
    terminal: Terminal,
    runner: &'a dyn ScriptRunner,
    timing: &'a TimingConfig,
) -> Box<dyn TerminalOpener + 'a> {
    match terminal {
        Terminal::ITerm => Box::new(ITermOpener { runner, timing }),
        Terminal::Ghostty => Box::new(GhosttyOpener { runner, timing }),
        Terminal::TerminalApp => Box::new(TerminalAppOpener::new(runner, timing)),
    }
}

/// Opens a session in a resolved terminal.
pub trait Launcher {
    fn launch(
        &self,
        terminal: Terminal,
        session_name: &str,
    ) -> Result<(), ScriptError>;
}

/// [`Launcher`] that drives terminals through AppleScript.
pub struct ScriptedLauncher<'a> {
    runner: &'a dyn ScriptRunner,
    timing: &'a TimingConfig,
}

impl<'a> ScriptedLauncher<'a> {
    pub fn new(runner: &'a dyn ScriptRunner, timing: &'a TimingConfig) -> Self {
        Self { runner, timing }
    }
}

impl Launcher for ScriptedLauncher<'_> {
    fn launch(
        &self,
        terminal: Terminal,
        session_name: &str,
    ) -> Result<(), ScriptError> {
        opener_for(terminal, self.runner, self.timing).open(session_name)
    }
}

pub struct ITermOpener<'a> {
    runner: &'a dyn ScriptRunner,
    timing: &'a TimingConfig,
}

impl TerminalOpener for ITermOpener<'_> {
    fn terminal(&self) -> Terminal {
        Terminal::ITerm
    }

    fn activate(&self) -> Result<(), ScriptError> {
        self.runner.run(r#"tell application "iTerm" to activate"#)?;
        Ok(())
    }

    fn prepare_window(&self) -> Result<(), ScriptError> {
        self.runner
            .run(r#"tell application "iTerm" to create window with default profile"#)?;
        Ok(())
    }

    fn send_command(&self, command: &str) -> Result<(), ScriptError> {
        // iTerm exposes no signal for the new session's shell being ready
        let script = format!(
            "tell application \"iTerm\"\n\
             \tdelay {}\n\
             \ttell current session of current window to write text {}\n\
             end tell",
            self.timing.iterm_window_delay().as_secs_f64(),
            applescript_string(command)
        );
        self.runner.run(&script)?;
        Ok(())
    }
}

/// Ghostty has no scripting dictionary, so it is driven by injecting UI
/// events through System Events. That needs Accessibility access, which is
/// checked before any event is sent.
pub struct GhosttyOpener<'a> {
    runner: &'a dyn ScriptRunner,
    timing: &'a TimingConfig,
}

impl GhosttyOpener<'_> {
    fn ensure_ui_scripting(&self) -> Result<(), ScriptError> {
        let enabled = self.runner.run(
            r#"tell application "System Events" to return UI elements enabled"#,
        )?;

        if enabled != "true" {
            return Err(ScriptError::PermissionDenied(
                "UI scripting is disabled for the launcher".to_string(),
            ));
        }

        Ok(())
    }

    fn is_running(&self) -> bool {
        self.runner
            .run(r#"tell application "System Events" to return (exists process "Ghostty")"#)
            .is_ok_and(|out| out == "true")
    }

    fn window_count(&self) -> Result<u32, ScriptError> {
        let count = self.runner.run(
            r#"tell application "System Events" to tell process "Ghostty" to return count of windows"#,
        )?;
        Ok(count.parse().unwrap_or(0))
    }

    fn wait(&self, what: &str, ready: impl FnMut() -> bool) {
        let timing = self.timing;
        if !wait_until(timing.startup_timeout(), timing.poll_interval(), ready) {
            warn!(what, "Ghostty not ready before timeout, settling");
            sleep(timing.settle_delay());
        }
    }
}

impl TerminalOpener for GhosttyOpener<'_> {
    fn terminal(&self) -> Terminal {
        Terminal::Ghostty
    }

    fn activate(&self) -> Result<(), ScriptError> {
        self.ensure_ui_scripting()?;
        self.runner.run(r#"tell application "Ghostty" to activate"#)?;
        self.wait("process", || self.is_running());
        Ok(())
    }

    fn prepare_window(&self) -> Result<(), ScriptError> {
        if self.window_count()? > 0 {
            return Ok(());
        }

        self.runner.run(
            r#"tell application "System Events" to tell process "Ghostty" to keystroke "n" using command down"#,
        )?;
        self.wait("window", || self.window_count().is_ok_and(|n| n > 0));
        Ok(())
    }

    fn send_command(&self, command: &str) -> Result<(), ScriptError> {
        let script = format!(
            "tell application \"System Events\" to tell process \"Ghostty\"\n\
             \tkeystroke {}\n\
             \tkey code {}\n\
             end tell",
            applescript_string(command),
            RETURN_KEY_CODE
        );
        self.runner.run(&script)?;
        Ok(())
    }
}

/// Terminal.app runs the command through `do script`, reusing the window a
/// fresh launch opens.
pub struct TerminalAppOpener<'a> {
    runner: &'a dyn ScriptRunner,
    timing: &'a TimingConfig,
    was_running: Cell<bool>,
}

impl<'a> TerminalAppOpener<'a> {
    pub fn new(runner: &'a dyn ScriptRunner, timing: &'a TimingConfig) -> Self {
        Self {
            runner,
            timing,
            was_running: Cell::new(true),
        }
    }

    fn has_window(&self) -> bool {
        self.runner
            .run(r#"tell application "Terminal" to return count of windows"#)
            .is_ok_and(|count| count.parse::<u32>().is_ok_and(|n| n > 0))
    }
}

impl TerminalOpener for TerminalAppOpener<'_> {
    fn terminal(&self) -> Terminal {
        Terminal::TerminalApp
    }

    fn activate(&self) -> Result<(), ScriptError> {
        let running = self
            .runner
            .run(r#"return application "Terminal" is running"#)?;
        self.was_running.set(running == "true");

        self.runner.run(r#"tell application "Terminal" to activate"#)?;
        Ok(())
    }

    fn prepare_window(&self) -> Result<(), ScriptError> {
        if self.was_running.get() {
            return Ok(());
        }

        // a cold start has no front window until launch finishes
        let timing = self.timing;
        if !wait_until(timing.startup_timeout(), timing.poll_interval(), || {
            self.has_window()
        }) {
            warn!("Terminal window not ready before timeout, settling");
            sleep(timing.settle_delay());
        }
        Ok(())
    }

    fn send_command(&self, command: &str) -> Result<(), ScriptError> {
        let target = if self.was_running.get() {
            ""
        } else {
            " in front window"
        };

        let script = format!(
            "tell application \"Terminal\" to do script {}{}",
            applescript_string(command),
            target
        );
        self.runner.run(&script)?;
        Ok(())
    }
}
