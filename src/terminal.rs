//! Terminal applications a session can be opened in.
use std::fmt;

pub mod automation;
pub mod opener;
pub mod resolver;

/// A terminal application with an automation adapter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    ITerm,
    Ghostty,
    TerminalApp,
}

impl Terminal {
    /// Order in which installed terminals are preferred.
    pub const PRIORITY: [Terminal; 3] =
        [Terminal::ITerm, Terminal::Ghostty, Terminal::TerminalApp];

    pub fn display_name(&self) -> &'static str {
        match self {
            Terminal::ITerm => "iTerm2",
            Terminal::Ghostty => "Ghostty",
            Terminal::TerminalApp => "Terminal",
        }
    }

    pub fn bundle_id(&self) -> &'static str {
        match self {
            Terminal::ITerm => "com.googlecode.iterm2",
            Terminal::Ghostty => "com.mitchellh.ghostty",
            Terminal::TerminalApp => "com.apple.Terminal",
        }
    }

    /// Name AppleScript addresses the application by.
    pub fn script_name(&self) -> &'static str {
        match self {
            Terminal::ITerm => "iTerm",
            Terminal::Ghostty => "Ghostty",
            Terminal::TerminalApp => "Terminal",
        }
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// The configured terminal preference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TerminalChoice {
    Auto,
    ITerm,
    Ghostty,
    Terminal,
    /// Any other value, kept verbatim and probed as an application name.
    Custom(String),
}

impl TerminalChoice {
    /// Normalizes a configured value through the alias table. Matching is
    /// case-insensitive and ignores surrounding whitespace.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();

        match value.to_ascii_lowercase().as_str() {
            "" | "auto" => TerminalChoice::Auto,
            "iterm" | "iterm2" | "iterm.app" | "iterm2.app" => {
                TerminalChoice::ITerm
            }
            "ghostty" | "ghostty.app" => TerminalChoice::Ghostty,
            "terminal" | "terminal.app" | "apple terminal" => {
                TerminalChoice::Terminal
            }
            _ => TerminalChoice::Custom(value.to_string()),
        }
    }

    /// The adapter for this choice, if it has one.
    pub fn terminal(&self) -> Option<Terminal> {
        match self {
            TerminalChoice::ITerm => Some(Terminal::ITerm),
            TerminalChoice::Ghostty => Some(Terminal::Ghostty),
            TerminalChoice::Terminal => Some(Terminal::TerminalApp),
            TerminalChoice::Auto | TerminalChoice::Custom(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aliases_are_case_insensitive() {
        for value in ["ITERM2", "iTerm", "iterm2", " iterm ", "iTerm.app"] {
            assert_eq!(TerminalChoice::parse(value), TerminalChoice::ITerm);
        }
        for value in ["ghostty", "GHOSTTY", "Ghostty.app"] {
            assert_eq!(TerminalChoice::parse(value), TerminalChoice::Ghostty);
        }
        for value in ["terminal", "Terminal.app", "TERMINAL"] {
            assert_eq!(TerminalChoice::parse(value), TerminalChoice::Terminal);
        }
        assert_eq!(TerminalChoice::parse("AUTO"), TerminalChoice::Auto);
        assert_eq!(TerminalChoice::parse(""), TerminalChoice::Auto);
    }

    #[test]
    fn unknown_values_are_kept_verbatim() {
        assert_eq!(
            TerminalChoice::parse(" WezTerm "),
            TerminalChoice::Custom("WezTerm".into())
        );
        assert_eq!(TerminalChoice::parse("WezTerm").terminal(), None);
    }

    #[test]
    fn normalization_is_idempotent() {
        for value in ["ITERM2", "ghostty", "terminal", "auto"] {
            let once = TerminalChoice::parse(value);
            let name = once
                .terminal()
                .map(|t| t.display_name().to_string())
                .unwrap_or_else(|| "auto".into());
            assert_eq!(TerminalChoice::parse(&name), once);
        }
    }
}
