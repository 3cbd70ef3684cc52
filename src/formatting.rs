//! Rendering of stored actions into activity-feed strings.
//!
//! Times are printed with a literal `UTC` label even though actions carry
//! the Asia/Kolkata offset. Existing feed consumers match on that label.

use chrono::{DateTime, FixedOffset, NaiveDateTime, TimeZone};
use serde::{Deserialize, Deserializer};

use crate::action::{Action, FileChanges, RequestType, display_offset, now_in_display_tz};

/// strftime pattern for feed timestamps, e.g. `05 March 2025 - 02:07 PM UTC`.
pub const FEED_TIME_FORMAT: &str = "%d %B %Y - %I:%M %p UTC";

/// Number of paths listed per category before the rest are summarized.
const MAX_LISTED_FILES: usize = 3;

/// Render a timestamp in the feed's display format.
pub fn format_timestamp(timestamp: &DateTime<FixedOffset>) -> String {
    timestamp.format(FEED_TIME_FORMAT).to_string()
}

/// Parse a serialized timestamp, falling back to the current time.
///
/// Accepts RFC 3339 (including a trailing `Z`) and offset-less ISO-8601,
/// which is read as display-zone local time.
pub fn parse_timestamp(raw: &str) -> DateTime<FixedOffset> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return parsed;
    }

    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|pattern| NaiveDateTime::parse_from_str(raw, pattern).ok())
        .and_then(|naive| display_offset().from_local_datetime(&naive).single())
        .unwrap_or_else(|| {
            tracing::debug!(timestamp = raw, "Unparsable timestamp, using current time");
            now_in_display_tz()
        })
}

/// Lenient serde reader for serialized action timestamps.
///
/// Goes through [`parse_timestamp`], so a `Z` suffix or a naive local time is
/// accepted and garbage becomes the current time. The result is in the
/// display zone.
pub fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<FixedOffset>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    Ok(parse_timestamp(&raw).with_timezone(&display_offset()))
}

/// Render an action as a multi-line feed entry.
pub fn format_action_message(action: &Action) -> String {
    let author = &action.author;
    let time = format_timestamp(&action.timestamp);
    let from_branch = action.from_branch.as_deref().unwrap_or("unknown");
    let to_branch = &action.to_branch;

    let mut lines = Vec::with_capacity(3);
    match &action.request_type {
        RequestType::Push => {
            lines.push(format!("\"{author}\" pushed to \"{to_branch}\""));
            if let Some(summary) = action.file_changes.as_ref().and_then(file_changes_summary) {
                lines.push(summary);
            }
        }
        RequestType::PullRequest => {
            lines.push(format!(
                "\"{author}\" submitted a pull request from \"{from_branch}\" to \"{to_branch}\""
            ));
            if !action.message.is_empty() {
                lines.push(action.message.clone());
            }
        }
        RequestType::Merge => {
            lines.push(format!(
                "\"{author}\" merged branch \"{from_branch}\" to \"{to_branch}\""
            ));
            if !action.message.is_empty() {
                lines.push(action.message.clone());
            }
        }
        RequestType::Other(kind) => {
            return format!(
                "\"{author}\" performed {} action on {time}",
                kind.to_uppercase()
            );
        }
    }

    lines.push(time);
    lines.join("\n")
}

/// One-line summary of changed files, or `None` when nothing changed.
pub fn file_changes_summary(changes: &FileChanges) -> Option<String> {
    if changes.total_changes == 0 {
        return None;
    }

    let parts: Vec<String> = [
        ("Added", &changes.added),
        ("Modified", &changes.modified),
        ("Removed", &changes.removed),
    ]
    .into_iter()
    .filter(|(_, files)| !files.is_empty())
    .map(|(label, files)| format!("{label}: {}", file_list(files)))
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join(" | "))
    }
}

fn file_list(files: &[String]) -> String {
    if files.len() <= MAX_LISTED_FILES {
        return files.join(", ");
    }

    format!(
        "{} (+{} more)",
        files[..MAX_LISTED_FILES].join(", "),
        files.len() - MAX_LISTED_FILES
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(raw: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(raw).unwrap()
    }

    fn action(request_type: RequestType) -> Action {
        Action {
            id: "abc123".to_string(),
            message: "Add feed".to_string(),
            timestamp: at("2025-03-05T14:07:00+05:30"),
            author: "alice".to_string(),
            to_branch: "main".to_string(),
            from_branch: Some("feature-x".to_string()),
            request_type,
            file_changes: None,
            commit_url: None,
            files_changed: None,
        }
    }

    fn paths(names: &[&str]) -> Vec<String> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn timestamps_use_twelve_hour_clock_and_utc_label() {
        assert_eq!(
            format_timestamp(&at("2025-03-05T14:07:00+05:30")),
            "05 March 2025 - 02:07 PM UTC"
        );
        assert_eq!(
            format_timestamp(&at("2025-12-25T00:30:00+05:30")),
            "25 December 2025 - 12:30 AM UTC"
        );
    }

    #[test]
    fn push_without_changes_has_no_summary_line() {
        let mut push = action(RequestType::Push);
        push.file_changes = Some(FileChanges::default());

        assert_eq!(
            format_action_message(&push),
            "\"alice\" pushed to \"main\"\n05 March 2025 - 02:07 PM UTC"
        );

        push.file_changes = None;
        assert_eq!(
            format_action_message(&push),
            "\"alice\" pushed to \"main\"\n05 March 2025 - 02:07 PM UTC"
        );
    }

    #[test]
    fn push_lists_changes_by_category() {
        let mut push = action(RequestType::Push);
        push.file_changes = Some(FileChanges::new(
            paths(&["a.rs", "b.rs"]),
            paths(&["lib.rs"]),
            paths(&["old.rs"]),
        ));

        assert_eq!(
            format_action_message(&push),
            "\"alice\" pushed to \"main\"\n\
             Added: a.rs, b.rs | Modified: lib.rs | Removed: old.rs\n\
             05 March 2025 - 02:07 PM UTC"
        );
    }

    #[test]
    fn long_file_lists_are_truncated_after_three() {
        let changes = FileChanges::new(paths(&["1", "2", "3", "4", "5"]), vec![], vec![]);
        assert_eq!(
            file_changes_summary(&changes).unwrap(),
            "Added: 1, 2, 3 (+2 more)"
        );

        let changes = FileChanges::new(paths(&["1", "2"]), vec![], vec![]);
        assert_eq!(file_changes_summary(&changes).unwrap(), "Added: 1, 2");

        let changes = FileChanges::new(vec![], vec![], paths(&["1", "2", "3"]));
        assert_eq!(file_changes_summary(&changes).unwrap(), "Removed: 1, 2, 3");
    }

    #[test]
    fn pull_request_includes_title_line() {
        assert_eq!(
            format_action_message(&action(RequestType::PullRequest)),
            "\"alice\" submitted a pull request from \"feature-x\" to \"main\"\n\
             Add feed\n\
             05 March 2025 - 02:07 PM UTC"
        );

        let mut untitled = action(RequestType::PullRequest);
        untitled.message.clear();
        assert_eq!(
            format_action_message(&untitled),
            "\"alice\" submitted a pull request from \"feature-x\" to \"main\"\n\
             05 March 2025 - 02:07 PM UTC"
        );
    }

    #[test]
    fn merge_names_both_branches() {
        assert_eq!(
            format_action_message(&action(RequestType::Merge)),
            "\"alice\" merged branch \"feature-x\" to \"main\"\n\
             Add feed\n\
             05 March 2025 - 02:07 PM UTC"
        );
    }

    #[test]
    fn unknown_types_use_the_generic_line() {
        assert_eq!(
            format_action_message(&action(RequestType::Other("release".to_string()))),
            "\"alice\" performed RELEASE action on 05 March 2025 - 02:07 PM UTC"
        );
    }

    #[test]
    fn serialized_timestamps_parse_back() {
        assert_eq!(
            parse_timestamp("2025-03-05T08:37:00Z"),
            at("2025-03-05T14:07:00+05:30")
        );
        assert_eq!(
            parse_timestamp("2025-03-05T14:07:00.250+05:30"),
            at("2025-03-05T14:07:00.250+05:30")
        );
        assert_eq!(
            parse_timestamp("2025-03-05T14:07:00"),
            at("2025-03-05T14:07:00+05:30")
        );
    }

    #[test]
    fn unparsable_timestamp_falls_back_to_now() {
        let before = now_in_display_tz();
        let parsed = parse_timestamp("yesterday-ish");
        let after = now_in_display_tz() + chrono::Duration::seconds(1);

        assert!(parsed >= before && parsed <= after);
        assert!(format_timestamp(&parsed).ends_with(" UTC"));
    }
}
