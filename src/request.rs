//! Encoded action requests of the form `<action>:<session>`.
use std::fmt;
use std::str::FromStr;

/// Separator between the action token and the session name.
pub const ACTION_DELIMITER: char = ':';

/// An operation the dispatcher can perform on a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Attach,
    Create,
    Delete,
    Detach,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Attach => "attach",
            Action::Create => "create",
            Action::Delete => "delete",
            Action::Detach => "detach",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when an action token is not one of the known literals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAction(pub String);

impl FromStr for Action {
    type Err = UnknownAction;

    /// Case-sensitive: `Attach` is not `attach`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "attach" => Ok(Action::Attach),
            "create" => Ok(Action::Create),
            "delete" => Ok(Action::Delete),
            "detach" => Ok(Action::Detach),
            other => Err(UnknownAction(other.to_string())),
        }
    }
}

/// A parsed request. The action token is kept verbatim so the router can
/// name an unknown token in its error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub action_token: String,
    pub session_name: String,
}

impl ActionRequest {
    /// Splits `raw` on the first `:`. Without a delimiter the whole string
    /// is the session name and the action is `attach`.
    ///
    /// # Examples
    /// ```
    /// # use alfred_tmux::request::ActionRequest;
    /// let req = ActionRequest::parse("delete:a:b");
    /// assert_eq!(req.action_token, "delete");
    /// assert_eq!(req.session_name, "a:b");
    /// ```
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(ACTION_DELIMITER) {
            Some((action, session)) => Self {
                action_token: action.to_string(),
                session_name: session.to_string(),
            },
            None => Self {
                action_token: Action::Attach.as_str().to_string(),
                session_name: raw.to_string(),
            },
        }
    }

    pub fn new(action: Action, session_name: &str) -> Self {
        Self {
            action_token: action.as_str().to_string(),
            session_name: session_name.to_string(),
        }
    }

    pub fn action(&self) -> Result<Action, UnknownAction> {
        self.action_token.parse()
    }
}

impl fmt::Display for ActionRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}{}",
            self.action_token, ACTION_DELIMITER, self.session_name
        )
    }
}
