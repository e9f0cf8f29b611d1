use std::fmt;
use std::sync::LazyLock;
use std::thread::sleep;
use std::time::{Duration, Instant};

use regex::Regex;

/// Characters tmux or the `<action>:<session>` encoding cannot carry in a
/// session name.
pub const RESERVED_SESSION_CHARS: [char; 5] = [' ', '.', ':', '\n', '\t'];

static SESSION_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^ .:\n\t]+$").unwrap());

/// Error type returned when a session name is invalid.
#[derive(Debug, PartialEq)]
pub struct SessionNameError(String);

impl std::error::Error for SessionNameError {}

impl fmt::Display for SessionNameError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Validates a session name according to the rules:
///
/// - Must not be empty.
/// - Must not contain spaces, dots (`.`), colons (`:`), newlines or tabs.
///
/// No external command is issued, so this is safe to call before touching
/// tmux at all.
///
/// # Errors
///
/// Returns a [`SessionNameError`] if the name is invalid.
///
/// # Examples
/// ```
/// # use alfred_tmux::util::validate_session_name;
/// assert!(validate_session_name("work-2").is_ok());
/// assert!(validate_session_name("invalid name").is_err());
/// ```
pub fn validate_session_name(name: &str) -> Result<String, SessionNameError> {
    if name.is_empty() {
        return Err(SessionNameError("Session name cannot be empty".into()));
    }

    if !SESSION_NAME_RE.is_match(name) {
        Err(SessionNameError(
            "Session names cannot contain spaces, dots, colons, tabs or newlines"
                .into(),
        ))
    } else {
        Ok(name.to_string())
    }
}

/// Polls `ready` every `interval` until it returns `true` or `timeout`
/// elapses. The predicate is always evaluated at least once.
///
/// Returns whether the predicate was satisfied in time.
pub fn wait_until<F>(timeout: Duration, interval: Duration, mut ready: F) -> bool
where
    F: FnMut() -> bool,
{
    let deadline = Instant::now() + timeout;

    loop {
        if ready() {
            return true;
        }

        let now = Instant::now();
        if now >= deadline {
            return false;
        }

        sleep(interval.min(deadline - now));
    }
}
