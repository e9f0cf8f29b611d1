//! Lists tmux sessions for interactive filtering.
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, warn};

use crate::request::{Action, ActionRequest};
use crate::tmux::interface::{Multiplexer, TmuxError};
use crate::tmux::session::Session;
use crate::util::validate_session_name;

/// One selectable row.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ListEntry {
    pub title: String,
    pub subtitle: String,
    /// Encoded request run when the row is selected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arg: Option<String>,
    pub valid: bool,
    /// Alternative requests, e.g. bound to modifier keys.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<EntryAction>,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct EntryAction {
    pub action: String,
    pub subtitle: String,
    pub arg: String,
    pub valid: bool,
}

#[derive(Serialize)]
struct ListOutput<'a> {
    items: &'a [ListEntry],
}

impl ListEntry {
    fn notice(title: impl Into<String>, subtitle: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subtitle: subtitle.into(),
            arg: None,
            valid: false,
            actions: Vec::new(),
        }
    }

    fn from_session(session: &Session, now: DateTime<Utc>) -> Self {
        let name = &session.name;

        let detach_subtitle = if session.is_attached() {
            format!("Detach from session {name}")
        } else {
            format!("Session {name} already detached")
        };

        Self {
            title: name.clone(),
            subtitle: session.subtitle(now),
            arg: Some(name.clone()),
            valid: true,
            actions: vec![
                EntryAction {
                    action: Action::Delete.to_string(),
                    subtitle: format!("Delete session {name}"),
                    arg: ActionRequest::new(Action::Delete, name).to_string(),
                    valid: true,
                },
                EntryAction {
                    action: Action::Detach.to_string(),
                    subtitle: detach_subtitle,
                    arg: ActionRequest::new(Action::Detach, name).to_string(),
                    valid: session.is_attached(),
                },
            ],
        }
    }
}

/// Row shown when tmux cannot be found.
pub fn tmux_missing_entry() -> ListEntry {
    ListEntry::notice("tmux not found", "Install tmux: brew install tmux")
}

/// Keeps sessions whose name contains `query` (case-insensitive) and orders
/// them attached first, then by most recent activity, then by name.
pub fn filter_and_sort(sessions: Vec<Session>, query: &str) -> Vec<Session> {
    let query = query.to_lowercase();

    let mut filtered: Vec<Session> = sessions
        .into_iter()
        .filter(|s| query.is_empty() || s.name.to_lowercase().contains(&query))
        .collect();

    filtered.sort_by_key(|s| {
        (
            !s.is_attached(),
            std::cmp::Reverse(s.activity),
            s.name.to_lowercase(),
        )
    });

    filtered
}

/// Builds the rows for `sessions` filtered by `query`.
///
/// With no matching session the single row offers to create one named
/// after the query, or explains why the query is not a valid name.
pub fn build_entries(
    sessions: Vec<Session>,
    query: &str,
    now: DateTime<Utc>,
) -> Vec<ListEntry> {
    let query = query.trim();

    let entries: Vec<ListEntry> = filter_and_sort(sessions, query)
        .iter()
        .map(|s| ListEntry::from_session(s, now))
        .collect();

    if !entries.is_empty() {
        return entries;
    }

    if query.is_empty() {
        return vec![ListEntry::notice(
            "No tmux sessions found",
            "Start typing to create a new session",
        )];
    }

    match validate_session_name(query) {
        Ok(name) => vec![ListEntry {
            title: format!("Create new session \"{name}\""),
            subtitle: "Press Enter to create this tmux session".to_string(),
            arg: Some(ActionRequest::new(Action::Create, &name).to_string()),
            valid: true,
            actions: Vec::new(),
        }],
        Err(e) => vec![ListEntry::notice(
            format!("Invalid session name \"{query}\""),
            e.to_string(),
        )],
    }
}

/// Queries tmux and builds the rows. Failures become a single notice row.
pub fn list_entries(
    tmux: &dyn Multiplexer,
    query: &str,
    now: DateTime<Utc>,
) -> Vec<ListEntry> {
    match tmux.list_sessions() {
        Ok(sessions) => {
            debug!(count = sessions.len(), "listed sessions");
            build_entries(sessions, query, now)
        }
        Err(TmuxError::NotInstalled(path)) => {
            warn!(%path, "tmux not installed");
            vec![tmux_missing_entry()]
        }
        Err(e) => {
            warn!(error = %e, "failed to list sessions");
            vec![ListEntry::notice("Unexpected error", e.to_string())]
        }
    }
}

/// One `title<TAB>subtitle<TAB>arg` line per row.
pub fn render_text(entries: &[ListEntry]) -> String {
    entries
        .iter()
        .map(|e| {
            format!(
                "{}\t{}\t{}\n",
                e.title,
                e.subtitle,
                e.arg.as_deref().unwrap_or("")
            )
        })
        .collect()
}

pub fn render_json(entries: &[ListEntry]) -> Result<String> {
    serde_json::to_string_pretty(&ListOutput { items: entries })
        .context("Failed to serialize session list")
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(NOW, 0).unwrap()
    }

    fn session(name: &str, attached: u32, activity: i64) -> Session {
        Session {
            name: name.into(),
            windows: 1,
            created: NOW - 3_600,
            attached,
            activity,
        }
    }

    fn names(sessions: &[Session]) -> Vec<&str> {
        sessions.iter().map(|s| s.name.as_str()).collect()
    }

    #[test]
    fn sorts_attached_then_recent_then_name() {
        let sessions = vec![
            session("beta", 0, NOW - 10),
            session("Alpha", 0, NOW - 10),
            session("gamma", 1, NOW - 500),
            session("delta", 0, NOW - 1),
        ];
        let sorted = filter_and_sort(sessions, "");
        assert_eq!(names(&sorted), vec!["gamma", "delta", "Alpha", "beta"]);
    }

    #[test]
    fn filters_case_insensitively() {
        let sessions = vec![
            session("Work", 0, NOW),
            session("homework", 0, NOW - 5),
            session("misc", 0, NOW),
        ];
        let filtered = filter_and_sort(sessions, "WORK");
        assert_eq!(names(&filtered), vec!["Work", "homework"]);
    }

    #[test]
    fn rows_carry_encoded_actions() {
        let entries = build_entries(vec![session("dev", 0, NOW)], "", now());
        let entry = &entries[0];
        assert_eq!(entry.arg.as_deref(), Some("dev"));
        assert_eq!(entry.actions[0].arg, "delete:dev");
        assert_eq!(entry.actions[1].arg, "detach:dev");
        assert!(!entry.actions[1].valid);
        assert_eq!(entry.actions[1].subtitle, "Session dev already detached");
    }

    #[test]
    fn empty_table_without_query() {
        let entries = build_entries(Vec::new(), "  ", now());
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "No tmux sessions found");
        assert!(!entries[0].valid);
    }

    #[test]
    fn unmatched_query_offers_create() {
        let entries = build_entries(vec![session("dev", 0, NOW)], "demo", now());
        assert_eq!(entries[0].arg.as_deref(), Some("create:demo"));
        assert!(entries[0].valid);
    }

    #[test]
    fn unmatched_invalid_query_explains() {
        let entries = build_entries(Vec::new(), "my.session", now());
        assert_eq!(entries[0].title, "Invalid session name \"my.session\"");
        assert_eq!(entries[0].arg, None);
        assert!(!entries[0].valid);
    }

    #[test]
    fn text_rendering_is_tab_separated() {
        let entries = build_entries(Vec::new(), "demo", now());
        assert_eq!(
            render_text(&entries),
            "Create new session \"demo\"\tPress Enter to create this tmux session\tcreate:demo\n"
        );
    }

    #[test]
    fn json_rendering_wraps_items() {
        let entries = build_entries(Vec::new(), "", now());
        let value: serde_json::Value =
            serde_json::from_str(&render_json(&entries).unwrap()).unwrap();
        assert_eq!(value["items"][0]["title"], "No tmux sessions found");
        assert_eq!(value["items"][0]["valid"], false);
        assert!(value["items"][0].get("arg").is_none());
    }
}
