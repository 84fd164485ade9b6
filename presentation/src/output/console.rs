//! Console output formatter for meeting records

use colored::Colorize;
use roundtable_domain::{BackendId, MeetingRecord, preview};

/// Formats finished meetings, history listings and backend metadata
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// Force colors on or off for everything this crate prints
    pub fn set_color(enabled: bool) {
        colored::control::set_override(enabled);
    }

    /// The full transcript, as exported
    pub fn format(record: &MeetingRecord) -> String {
        let mut output = String::new();
        output.push_str(&Self::header("AI Roundtable"));
        output.push_str("\n\n");
        output.push_str(&record.markdown);
        if !record.markdown.ends_with('\n') {
            output.push('\n');
        }
        output.push_str(&Self::stats(record));
        output.push_str(&Self::footer());
        output
    }

    /// Format as JSON
    pub fn format_json(record: &MeetingRecord) -> String {
        serde_json::to_string_pretty(record).unwrap_or_else(|_| "{}".to_string())
    }

    /// Format summary only (concise output)
    pub fn format_summary_only(record: &MeetingRecord) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}\n\n", "=== Roundtable Summary ===".cyan().bold()));
        output.push_str(&format!("{} {}\n\n", "Topic:".bold(), record.topic));
        output.push_str(&format!(
            "{} {}\n\n",
            "Participants:".dimmed(),
            record.participant_names().join(", ")
        ));

        if record.summary.is_empty() {
            output.push_str(&format!("{}\n", "(no summary was produced)".dimmed()));
        } else {
            output.push_str(&record.summary);
            output.push('\n');
        }

        output
    }

    /// One line per saved meeting, newest first
    pub fn format_history(records: &[MeetingRecord]) -> String {
        if records.is_empty() {
            return format!("{}\n", "No saved meetings.".dimmed());
        }
        let mut output = String::new();
        for record in records {
            let failed = record.failed_turns();
            let status = if failed == 0 {
                String::new()
            } else {
                format!(" {}", format!("({failed} failed)").red())
            };
            output.push_str(&format!(
                "{}  {}  {}  [{}]{}\n",
                record.id.yellow(),
                record.created_at.format("%Y-%m-%d %H:%M"),
                preview(&record.topic, 50).bold(),
                record.participant_names().join(", "),
                status
            ));
        }
        output
    }

    /// Backend metadata and model catalogues
    pub fn format_backends(backends: &[BackendId]) -> String {
        let mut output = String::new();
        for id in backends {
            output.push_str(&format!(
                "{} {} ({})  key: ${}\n",
                id.icon(),
                id.display_name().bold(),
                id.as_str(),
                id.api_key_env()
            ));
            let mut group = None;
            for model in id.models() {
                if model.group.is_some() && model.group != group {
                    group = model.group;
                    output.push_str(&format!("    {}\n", model.group.unwrap_or_default().dimmed()));
                }
                let marker = if model.id == id.default_model() { "*" } else { " " };
                output.push_str(&format!("  {marker} {:<32} {}\n", model.id, model.name));
            }
            output.push('\n');
        }
        output
    }

    /// Credential check results, one per backend
    pub fn format_check(results: &[(BackendId, Option<bool>)]) -> String {
        let mut output = String::new();
        for (id, result) in results {
            let status = match result {
                Some(true) => "valid".green(),
                Some(false) => "rejected".red(),
                None => "no key".dimmed(),
            };
            output.push_str(&format!("{} {:<10} {}\n", id.icon(), id.display_name(), status));
        }
        output
    }

    fn stats(record: &MeetingRecord) -> String {
        let failed = record.failed_turns();
        let mut line = format!(
            "\n{} {} turns, {} evaluations",
            "Stats:".cyan().bold(),
            record.transcript.len(),
            record.evaluations.len()
        );
        if failed > 0 {
            line.push_str(&format!(", {}", format!("{failed} failed").red()));
        }
        line.push('\n');
        line
    }

    fn header(title: &str) -> String {
        let line = "=".repeat(60);
        format!("{}\n{:^60}\n{}", line.cyan(), title.bold(), line.cyan())
    }

    fn footer() -> String {
        format!("{}\n", "=".repeat(60).cyan())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use roundtable_domain::{Meeting, MeetingConfig, Participant, Topic};

    fn record(summary: &str) -> MeetingRecord {
        colored::control::set_override(false);
        let config = MeetingConfig::new(Topic::try_new("Remote work").unwrap());
        let mut meeting = Meeting::new(
            config,
            vec![
                Participant::for_backend(BackendId::Claude),
                Participant::for_backend(BackendId::ChatGpt),
            ],
        )
        .unwrap();
        let mut record = meeting
            .finalize(Utc.with_ymd_and_hms(2026, 3, 1, 9, 30, 0).unwrap())
            .clone();
        record.summary = summary.to_string();
        record
    }

    #[test]
    fn test_full_format_embeds_markdown() {
        let record = record("");
        let output = ConsoleFormatter::format(&record);
        assert!(output.contains("# AI Roundtable Transcript"));
        assert!(output.contains("0 turns, 0 evaluations"));
    }

    #[test]
    fn test_summary_only() {
        let output = ConsoleFormatter::format_summary_only(&record("We agreed."));
        assert!(output.contains("Topic: Remote work"));
        assert!(output.contains("Claude, ChatGPT"));
        assert!(output.ends_with("We agreed.\n"));

        let empty = ConsoleFormatter::format_summary_only(&record(""));
        assert!(empty.contains("no summary"));
    }

    #[test]
    fn test_json_round_trips() {
        let record = record("ok");
        let parsed: MeetingRecord =
            serde_json::from_str(&ConsoleFormatter::format_json(&record)).unwrap();
        assert_eq!(parsed, record);
    }

    #[test]
    fn test_history_lines() {
        let output = ConsoleFormatter::format_history(&[record("")]);
        assert!(output.contains("2026-03-01 09:30"));
        assert!(output.contains("Remote work"));
        assert!(ConsoleFormatter::format_history(&[]).contains("No saved meetings"));
    }

    #[test]
    fn test_backends_mark_default_model() {
        colored::control::set_override(false);
        let output = ConsoleFormatter::format_backends(&[BackendId::Copilot]);
        assert!(output.contains("$GITHUB_TOKEN"));
        assert!(output.contains("* openai/gpt-4.1"));
        assert!(output.contains("DeepSeek"));
    }

    #[test]
    fn test_history_topic_is_one_short_line() {
        let mut long = record("");
        long.topic = format!("Remote work\n\n{}", "圓桌".repeat(40));
        let output = ConsoleFormatter::format_history(&[long]);
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains("Remote work 圓桌"));
        assert!(output.contains('…'));
    }
}
