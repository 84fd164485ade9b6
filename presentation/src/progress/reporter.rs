//! Live rendering of meeting updates

use colored::{ColoredString, Colorize};
use indicatif::{ProgressBar, ProgressStyle};
use roundtable_application::{MeetingUpdate, MeetingUpdateSink};
use roundtable_domain::{BackendId, Phase};
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

/// Paint text in a participant's color; ids are backend ids
fn participant_color(participant: &str, text: &str) -> ColoredString {
    match participant.parse::<BackendId>() {
        Ok(BackendId::Claude) => text.truecolor(0xD9, 0x77, 0x57),
        Ok(BackendId::ChatGpt) => text.truecolor(0x10, 0xA3, 0x7F),
        Ok(BackendId::Gemini) => text.truecolor(0x42, 0x85, 0xF4),
        Ok(BackendId::Copilot) => text.truecolor(0x8B, 0x5C, 0xF6),
        Err(_) => text.yellow(),
    }
}

/// Turns updates into terminal text.
///
/// Stateful only in remembering whether the current speaker's text has
/// started, so the first chunk can close the waiting line.
#[derive(Debug, Default)]
pub struct UpdateRenderer {
    show_stream: bool,
    speaking: bool,
}

impl UpdateRenderer {
    pub fn new(show_stream: bool) -> Self {
        Self {
            show_stream,
            speaking: false,
        }
    }

    /// Text to print for `update`, if any
    pub fn render(&mut self, update: &MeetingUpdate) -> Option<String> {
        match update {
            MeetingUpdate::PhaseChange {
                phase: Phase::Completed,
                error,
                ..
            } => Some(match error {
                Some(error) => format!("\n{} {}\n", "Meeting ended with an error:".red().bold(), error),
                None => format!("\n{}\n", "Meeting complete.".green().bold()),
            }),
            MeetingUpdate::PhaseChange {
                phase: Phase::Paused,
                ..
            } => Some(format!(
                "\n{}\n",
                "Paused after the current turn. Type `resume` to continue.".yellow()
            )),
            MeetingUpdate::PhaseChange { phase, .. } => Some(format!(
                "\n{}\n{}\n",
                phase.display_name().cyan().bold(),
                "-".repeat(40)
            )),
            MeetingUpdate::RoundStart {
                round,
                total_rounds,
            } => Some(format!(
                "\n{}\n",
                format!("── Round {round}/{total_rounds} ──").cyan()
            )),
            MeetingUpdate::TurnStart {
                participant,
                participant_name,
                ..
            }
            | MeetingUpdate::EvalStart {
                participant,
                participant_name,
            } => {
                self.speaking = false;
                Some(format!(
                    "\n{}\n",
                    participant_color(participant, participant_name).bold()
                ))
            }
            MeetingUpdate::StreamChunk { chunk, .. } if self.show_stream => {
                self.speaking = true;
                Some(chunk.clone())
            }
            MeetingUpdate::TurnEnd { content, .. } | MeetingUpdate::EvalEnd { content, .. } => {
                let text = if self.show_stream && self.speaking {
                    "\n".to_string()
                } else {
                    format!("{content}\n")
                };
                self.speaking = false;
                Some(text)
            }
            MeetingUpdate::SummaryComplete { summary } if !self.show_stream => {
                Some(format!("{summary}\n"))
            }
            MeetingUpdate::SummaryComplete { .. } if self.speaking => {
                self.speaking = false;
                Some("\n".to_string())
            }
            _ => None,
        }
    }

    /// Whether a waiting indicator belongs on screen after `update`
    pub fn awaits_first_chunk(update: &MeetingUpdate) -> bool {
        matches!(
            update,
            MeetingUpdate::TurnStart { .. }
                | MeetingUpdate::EvalStart { .. }
                | MeetingUpdate::PhaseChange {
                    phase: Phase::Summary,
                    ..
                }
        )
    }
}

/// Prints updates to stdout as they arrive, with a spinner while a
/// participant has not produced its first chunk yet.
pub struct LiveRenderer {
    renderer: Mutex<UpdateRenderer>,
    spinner: Mutex<Option<ProgressBar>>,
}

impl LiveRenderer {
    pub fn new(show_stream: bool) -> Self {
        Self {
            renderer: Mutex::new(UpdateRenderer::new(show_stream)),
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn start_spinner(&self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_message("thinking...");
        pb.enable_steady_tick(Duration::from_millis(100));
        *self.spinner.lock().unwrap_or_else(PoisonError::into_inner) = Some(pb);
    }

    fn clear_spinner(&self) {
        if let Some(pb) = self
            .spinner
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            pb.finish_and_clear();
        }
    }
}

impl MeetingUpdateSink for LiveRenderer {
    fn on_update(&self, update: &MeetingUpdate) {
        self.clear_spinner();
        let text = self
            .renderer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .render(update);
        if let Some(text) = text {
            let mut stdout = std::io::stdout().lock();
            let _ = write!(stdout, "{text}");
            let _ = stdout.flush();
        }
        if UpdateRenderer::awaits_first_chunk(update) {
            self.start_spinner();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn turn_start() -> MeetingUpdate {
        MeetingUpdate::TurnStart {
            participant: "claude".to_string(),
            participant_name: "Claude".to_string(),
            round: 1,
        }
    }

    fn chunk(text: &str) -> MeetingUpdate {
        MeetingUpdate::StreamChunk {
            participant: "claude".to_string(),
            chunk: text.to_string(),
            context: None,
        }
    }

    fn turn_end(content: &str) -> MeetingUpdate {
        MeetingUpdate::TurnEnd {
            participant: "claude".to_string(),
            round: 1,
            content: content.to_string(),
        }
    }

    fn render_all(renderer: &mut UpdateRenderer, updates: &[MeetingUpdate]) -> String {
        colored::control::set_override(false);
        updates.iter().filter_map(|u| renderer.render(u)).collect()
    }

    #[test]
    fn test_streamed_turn_prints_chunks_once() {
        let mut renderer = UpdateRenderer::new(true);
        let text = render_all(
            &mut renderer,
            &[turn_start(), chunk("Hel"), chunk("lo"), turn_end("Hello")],
        );
        assert_eq!(text, "\nClaude\nHello\n");
    }

    #[test]
    fn test_quiet_mode_prints_full_turn() {
        let mut renderer = UpdateRenderer::new(false);
        let text = render_all(
            &mut renderer,
            &[turn_start(), chunk("Hel"), chunk("lo"), turn_end("Hello")],
        );
        assert_eq!(text, "\nClaude\nHello\n");
    }

    #[test]
    fn test_failed_turn_without_chunks_prints_marker() {
        let mut renderer = UpdateRenderer::new(true);
        let text = render_all(&mut renderer, &[turn_start(), turn_end("[Error: boom]")]);
        assert!(text.ends_with("[Error: boom]\n"));
    }

    #[test]
    fn test_phase_and_round_headers() {
        let mut renderer = UpdateRenderer::new(true);
        let text = render_all(
            &mut renderer,
            &[
                MeetingUpdate::PhaseChange {
                    phase: Phase::Evaluation,
                    record: None,
                    error: None,
                },
                MeetingUpdate::RoundStart {
                    round: 2,
                    total_rounds: 3,
                },
            ],
        );
        assert!(text.contains("Cross-Evaluation"));
        assert!(text.contains("Round 2/3"));
    }

    #[test]
    fn test_completion_reports_error() {
        let mut renderer = UpdateRenderer::new(true);
        let text = render_all(
            &mut renderer,
            &[MeetingUpdate::PhaseChange {
                phase: Phase::Completed,
                record: None,
                error: Some("backend exploded".to_string()),
            }],
        );
        assert!(text.contains("backend exploded"));
    }

    #[test]
    fn test_spinner_points() {
        assert!(UpdateRenderer::awaits_first_chunk(&turn_start()));
        assert!(!UpdateRenderer::awaits_first_chunk(&chunk("x")));
        assert!(UpdateRenderer::awaits_first_chunk(&MeetingUpdate::PhaseChange {
            phase: Phase::Summary,
            record: None,
            error: None,
        }));
    }
}
