use std::process::Command;

use tracing::{debug, warn};

use crate::error::DispatchError;
use crate::terminal::{Terminal, TerminalChoice};

/// Answers whether an application is installed.
pub trait AppProbe {
    fn bundle_installed(&self, bundle_id: &str) -> bool;
    fn app_installed(&self, name: &str) -> bool;
}

/// [`AppProbe`] that queries the Spotlight metadata index via `mdfind`.
///
/// The index can lag behind a fresh install or removal.
#[derive(Debug, Default, Clone, Copy)]
pub struct SpotlightProbe;

impl SpotlightProbe {
    fn query(&self, query: &str) -> bool {
        match Command::new("mdfind").arg(query).output() {
            Ok(output) if output.status.success() => {
                let found = !String::from_utf8_lossy(&output.stdout)
                    .trim()
                    .is_empty();
                debug!(%query, found, "mdfind");
                found
            }
            Ok(output) => {
                warn!(
                    %query,
                    stderr = %String::from_utf8_lossy(&output.stderr).trim(),
                    "mdfind failed"
                );
                false
            }
            Err(e) => {
                warn!(%query, error = %e, "failed to run mdfind");
                false
            }
        }
    }
}

impl AppProbe for SpotlightProbe {
    fn bundle_installed(&self, bundle_id: &str) -> bool {
        self.query(&format!(
            "kMDItemCFBundleIdentifier == '{}'",
            mdfind_escape(bundle_id)
        ))
    }

    fn app_installed(&self, name: &str) -> bool {
        let file_name = if name.to_lowercase().ends_with(".app") {
            name.to_string()
        } else {
            format!("{name}.app")
        };

        self.query(&format!(
            "kMDItemContentType == 'com.apple.application-bundle' && kMDItemFSName == '{}'c",
            mdfind_escape(&file_name)
        ))
    }
}

fn mdfind_escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Outcome of terminal resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub terminal: Terminal,
    /// Set when the configured terminal could not be used.
    pub notice: Option<String>,
}

/// Picks the terminal to open a session in.
///
/// `Auto` takes the first installed terminal in [`Terminal::PRIORITY`].
/// An explicit choice is used when installed, otherwise resolution falls
/// back to the `Auto` order and says so in [`Resolution::notice`]. Custom
/// names have no adapter and always fall back.
pub fn resolve(
    choice: &TerminalChoice,
    probe: &dyn AppProbe,
) -> Result<Resolution, DispatchError> {
    let notice = match choice {
        TerminalChoice::Auto => None,
        TerminalChoice::Custom(name) => {
            if probe.app_installed(name) {
                Some(format!("{name} is not supported"))
            } else {
                Some(format!("{name} is not installed"))
            }
        }
        _ => match choice.terminal() {
            Some(terminal) if probe.bundle_installed(terminal.bundle_id()) => {
                return Ok(Resolution {
                    terminal,
                    notice: None,
                });
            }
            Some(terminal) => Some(format!("{terminal} is not installed")),
            None => None,
        },
    };

    let terminal = detect_installed(probe)?;
    let notice =
        notice.map(|reason| format!("{reason}, using {terminal} instead"));

    if let Some(notice) = &notice {
        debug!(%notice, "configured terminal unavailable");
    }

    Ok(Resolution { terminal, notice })
}

fn detect_installed(probe: &dyn AppProbe) -> Result<Terminal, DispatchError> {
    Terminal::PRIORITY
        .into_iter()
        .find(|terminal| probe.bundle_installed(terminal.bundle_id()))
        .ok_or_else(|| {
            DispatchError::TerminalUnavailable(
                "Install iTerm2, Ghostty or use Terminal".to_string(),
            )
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    struct FakeProbe {
        bundles: HashSet<&'static str>,
        apps: HashSet<&'static str>,
    }

    impl FakeProbe {
        fn with(terminals: &[Terminal]) -> Self {
            Self {
                bundles: terminals.iter().map(|t| t.bundle_id()).collect(),
                apps: HashSet::new(),
            }
        }
    }

    impl AppProbe for FakeProbe {
        fn bundle_installed(&self, bundle_id: &str) -> bool {
            self.bundles.contains(bundle_id)
        }

        fn app_installed(&self, name: &str) -> bool {
            self.apps.contains(name)
        }
    }

    #[test]
    fn auto_follows_priority() {
        let probe = FakeProbe::with(&Terminal::PRIORITY);
        let resolution = resolve(&TerminalChoice::Auto, &probe).unwrap();
        assert_eq!(resolution.terminal, Terminal::ITerm);
        assert_eq!(resolution.notice, None);

        let probe = FakeProbe::with(&[Terminal::TerminalApp, Terminal::Ghostty]);
        let resolution = resolve(&TerminalChoice::Auto, &probe).unwrap();
        assert_eq!(resolution.terminal, Terminal::Ghostty);

        let probe = FakeProbe::with(&[Terminal::TerminalApp]);
        let resolution = resolve(&TerminalChoice::Auto, &probe).unwrap();
        assert_eq!(resolution.terminal, Terminal::TerminalApp);
    }

    #[test]
    fn auto_is_deterministic() {
        let probe = FakeProbe::with(&[Terminal::Ghostty, Terminal::TerminalApp]);
        let first = resolve(&TerminalChoice::Auto, &probe).unwrap();
        for _ in 0..5 {
            assert_eq!(resolve(&TerminalChoice::Auto, &probe).unwrap(), first);
        }
    }

    #[test]
    fn nothing_installed_is_unavailable() {
        let probe = FakeProbe::with(&[]);
        assert!(matches!(
            resolve(&TerminalChoice::Auto, &probe),
            Err(DispatchError::TerminalUnavailable(_))
        ));
        assert!(matches!(
            resolve(&TerminalChoice::Ghostty, &probe),
            Err(DispatchError::TerminalUnavailable(_))
        ));
    }

    #[test]
    fn installed_choice_beats_priority() {
        let probe = FakeProbe::with(&Terminal::PRIORITY);
        let resolution =
            resolve(&TerminalChoice::parse("terminal"), &probe).unwrap();
        assert_eq!(resolution.terminal, Terminal::TerminalApp);
        assert_eq!(resolution.notice, None);
    }

    #[test]
    fn missing_choice_falls_back_with_notice() {
        let probe = FakeProbe::with(&[Terminal::TerminalApp]);
        let resolution =
            resolve(&TerminalChoice::parse("ITERM2"), &probe).unwrap();
        assert_eq!(resolution.terminal, Terminal::TerminalApp);
        assert_eq!(
            resolution.notice.as_deref(),
            Some("iTerm2 is not installed, using Terminal instead")
        );
    }

    #[test]
    fn aliases_resolve_to_the_same_terminal() {
        let probe = FakeProbe::with(&Terminal::PRIORITY);
        for value in ["ITERM2", "iTerm", "iterm2"] {
            let resolution =
                resolve(&TerminalChoice::parse(value), &probe).unwrap();
            assert_eq!(resolution.terminal, Terminal::ITerm);
        }
    }

    #[test]
    fn custom_terminals_fall_back() {
        let mut probe = FakeProbe::with(&[Terminal::Ghostty]);
        let resolution =
            resolve(&TerminalChoice::parse("Alacritty"), &probe).unwrap();
        assert_eq!(resolution.terminal, Terminal::Ghostty);
        assert_eq!(
            resolution.notice.as_deref(),
            Some("Alacritty is not installed, using Ghostty instead")
        );

        probe.apps.insert("Alacritty");
        let resolution =
            resolve(&TerminalChoice::parse("Alacritty"), &probe).unwrap();
        assert_eq!(
            resolution.notice.as_deref(),
            Some("Alacritty is not supported, using Ghostty instead")
        );
    }

    #[test]
    fn mdfind_queries_escape_quotes() {
        assert_eq!(mdfind_escape("it's"), "it\\'s");
    }
}
