use chrono::{DateTime, Utc};
use serde::Serialize;

/// Separator used in the `list-sessions` format string.
pub const LIST_FIELD_SEPARATOR: char = '|';

/// Represents one row of tmux's session table.
#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Session {
    /// Name of the session.
    pub name: String,
    /// Number of windows in the session.
    pub windows: u32,
    /// Unix timestamp of the session's creation.
    pub created: i64,
    /// Number of clients currently attached.
    pub attached: u32,
    /// Unix timestamp of the last activity in the session.
    pub activity: i64,
}

impl Session {
    /// Parses a `name|windows|created|attached|activity` line.
    ///
    /// Returns `None` for blank lines or lines with fewer than five fields.
    /// Malformed numeric fields fall back to sane defaults instead of
    /// dropping the row: one window, creation at the epoch, no clients and
    /// activity equal to creation.
    pub fn from_list_line(line: &str) -> Option<Self> {
        if line.is_empty() {
            return None;
        }

        let parts: Vec<&str> = line.split(LIST_FIELD_SEPARATOR).collect();
        if parts.len() < 5 {
            return None;
        }

        let created = parse_digits::<i64>(parts[2]).unwrap_or(0);

        Some(Session {
            name: parts[0].to_string(),
            windows: parse_digits(parts[1]).unwrap_or(1),
            created,
            attached: parse_digits(parts[3]).unwrap_or(0),
            activity: parse_digits(parts[4]).unwrap_or(created),
        })
    }

    pub fn is_attached(&self) -> bool {
        self.attached > 0
    }

    pub fn status_label(&self) -> &'static str {
        if self.is_attached() {
            "🟢 attached"
        } else {
            "⚪ detached"
        }
    }

    /// Returns the one-line summary shown under the session name.
    pub fn subtitle(&self, now: DateTime<Utc>) -> String {
        format!(
            "{} • {} windows • created {} • active {}",
            self.status_label(),
            self.windows,
            format_time_ago(self.created, now),
            format_time_ago(self.activity, now)
        )
    }
}

/// Formats the time elapsed between `timestamp` and `now` as `2d ago`,
/// `3h ago`, `5m ago` or `just now`.
///
/// Timestamps chrono cannot represent yield `unknown`.
pub fn format_time_ago(timestamp: i64, now: DateTime<Utc>) -> String {
    let Some(then) = DateTime::from_timestamp(timestamp, 0) else {
        return "unknown".to_string();
    };

    let delta = now.signed_duration_since(then);

    if delta.num_days() > 0 {
        return format!("{}d ago", delta.num_days());
    }
    if delta.num_hours() > 0 {
        return format!("{}h ago", delta.num_hours());
    }
    if delta.num_minutes() > 0 {
        return format!("{}m ago", delta.num_minutes());
    }

    "just now".to_string()
}

fn parse_digits<T: std::str::FromStr>(field: &str) -> Option<T> {
    if field.is_empty() || !field.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    field.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(ts: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(ts, 0).unwrap()
    }

    #[test]
    fn parses_full_line() {
        let session =
            Session::from_list_line("work|3|1700000000|1|1700000500").unwrap();
        assert_eq!(
            session,
            Session {
                name: "work".into(),
                windows: 3,
                created: 1_700_000_000,
                attached: 1,
                activity: 1_700_000_500,
            }
        );
        assert!(session.is_attached());
    }

    #[test]
    fn malformed_numbers_fall_back() {
        let session = Session::from_list_line("misc|x|1700000000|-|").unwrap();
        assert_eq!(session.windows, 1);
        assert_eq!(session.attached, 0);
        assert_eq!(session.activity, 1_700_000_000);

        let session = Session::from_list_line("misc|2|?|0|+5").unwrap();
        assert_eq!(session.created, 0);
        assert_eq!(session.activity, 0);
    }

    #[test]
    fn short_or_blank_lines_are_skipped() {
        assert_eq!(Session::from_list_line(""), None);
        assert_eq!(Session::from_list_line("work|1|2|3"), None);
    }

    #[test]
    fn multiple_clients_count_as_attached() {
        let session = Session::from_list_line("a|1|0|2|0").unwrap();
        assert!(session.is_attached());
        assert_eq!(session.status_label(), "🟢 attached");
    }

    #[test]
    fn time_ago_buckets() {
        let now = at(1_700_000_000);
        assert_eq!(format_time_ago(1_700_000_000 - 2 * 86_400, now), "2d ago");
        assert_eq!(format_time_ago(1_700_000_000 - 3 * 3_600 - 5, now), "3h ago");
        assert_eq!(format_time_ago(1_700_000_000 - 125, now), "2m ago");
        assert_eq!(format_time_ago(1_700_000_000 - 59, now), "just now");
        assert_eq!(format_time_ago(1_700_000_100, now), "just now");
        assert_eq!(format_time_ago(i64::MAX, now), "unknown");
    }

    #[test]
    fn subtitle_lists_status_windows_and_times() {
        let now = at(1_700_000_000);
        let session = Session {
            name: "work".into(),
            windows: 2,
            created: 1_700_000_000 - 86_400,
            attached: 0,
            activity: 1_700_000_000 - 600,
        };
        assert_eq!(
            session.subtitle(now),
            "⚪ detached • 2 windows • created 1d ago • active 10m ago"
        );
    }
}
