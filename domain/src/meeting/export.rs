//! Markdown export of a meeting.
//!
//! Layout: a header block, one `## Round N` section per round in increasing
//! order, an optional cross-evaluation section and an optional summary
//! section. The same text is stored as a record's `markdown` field.

use super::participant::ParticipantSummary;
use super::value_objects::{Evaluation, TranscriptEntry};
use chrono::{DateTime, Utc};
use std::fmt::Write;

pub const EXPORT_TITLE: &str = "# AI Roundtable Transcript";
pub const EVALUATION_HEADING: &str = "## Cross-Evaluation";
pub const SUMMARY_HEADING: &str = "## Summary";

/// Heading for one discussion round
pub fn round_heading(round: u32) -> String {
    format!("## Round {}", round)
}

/// Render the export document.
///
/// Rounds are rendered from 1 through the highest round present in the
/// transcript, so a meeting stopped early does not list rounds that never began.
pub fn render_export(
    topic: &str,
    participants: &[ParticipantSummary],
    transcript: &[TranscriptEntry],
    evaluations: &[Evaluation],
    summary: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let mut md = String::new();
    let names: Vec<&str> = participants.iter().map(|p| p.name.as_str()).collect();

    let _ = writeln!(md, "{}\n", EXPORT_TITLE);
    let _ = writeln!(md, "**Topic**: {}", topic);
    let _ = writeln!(md, "**Participants**: {}", names.join(", "));
    let _ = writeln!(
        md,
        "**Date**: {}\n",
        generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    md.push_str("---\n\n");

    let last_round = transcript.iter().map(|t| t.round).max().unwrap_or(0);
    for round in 1..=last_round {
        let _ = writeln!(md, "{}\n", round_heading(round));
        for entry in transcript.iter().filter(|t| t.round == round) {
            let _ = writeln!(md, "### {}\n\n{}\n", entry.participant_name, entry.content);
        }
    }

    if !evaluations.is_empty() {
        let _ = writeln!(md, "{}\n", EVALUATION_HEADING);
        for evaluation in evaluations {
            let _ = writeln!(
                md,
                "### Evaluation by {}\n\n{}\n",
                evaluation.evaluator_name, evaluation.content
            );
        }
    }

    if !summary.is_empty() {
        let _ = writeln!(md, "{}\n\n{}", SUMMARY_HEADING, summary);
    }

    md
}
