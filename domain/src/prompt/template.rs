//! Prompt templates for the roundtable flow

use crate::meeting::config::Language;
use crate::meeting::value_objects::{Evaluation, TranscriptEntry};
use crate::session::entities::Message;

/// Inputs for one discussion turn
#[derive(Debug, Clone, Copy)]
pub struct DiscussionPrompt<'a> {
    pub topic: &'a str,
    pub participant_name: &'a str,
    pub round: u32,
    pub total_rounds: u32,
    /// Attributed context lines; empty for the first speaker
    pub previous_messages: &'a str,
    pub language: &'a Language,
}

/// Templates for generating prompts at each stage
pub struct PromptTemplate;

impl PromptTemplate {
    /// Render visible turns as `[Name]: content` blocks separated by a blank line
    pub fn attributed_history(entries: &[&TranscriptEntry]) -> String {
        entries
            .iter()
            .map(|t| format!("[{}]: {}", t.participant_name, t.content))
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Render the full transcript with round annotations
    fn transcript_text(transcript: &[TranscriptEntry], separator: &str) -> String {
        transcript
            .iter()
            .map(|t| format!("[{} - Round {}]: {}", t.participant_name, t.round, t.content))
            .collect::<Vec<_>>()
            .join(separator)
    }

    /// System and user messages for one discussion turn
    pub fn discussion(input: &DiscussionPrompt<'_>) -> Vec<Message> {
        let focus = if input.round == 1 {
            "state your core position"
        } else {
            "respond to the others and deepen the discussion"
        };
        let system = format!(
            r#"You are an AI expert named {name}, taking part in a roundtable discussion.
Please answer in {lang}.

Meeting rules:
- Offer constructive viewpoints grounded in your expertise
- If other participants have already spoken, respond to their points (agree, disagree or add to them)
- Be concise but substantive (roughly 200-400 words)
- Feel free to disagree, but stay respectful
- Round {round}/{total}: {focus}"#,
            name = input.participant_name,
            lang = input.language.instruction_name(),
            round = input.round,
            total = input.total_rounds,
        );

        let mut user = format!("Topic: {}\n\n", input.topic);
        if input.previous_messages.is_empty() {
            user.push_str(&format!(
                "You are the first speaker. As {}, present your core position on this topic.",
                input.participant_name
            ));
        } else {
            user.push_str(&format!(
                "Here is what the other participants have said:\n\n{}\n\n",
                input.previous_messages
            ));
            user.push_str(&format!(
                "As {}, respond to the points above and share your view.",
                input.participant_name
            ));
        }

        vec![Message::system(system), Message::user(user)]
    }

    /// Messages asking `evaluator_name` to score every other participant
    pub fn evaluation(
        topic: &str,
        evaluator_name: &str,
        transcript: &[TranscriptEntry],
        participant_names: &[&str],
        language: &Language,
    ) -> Vec<Message> {
        let others: Vec<&str> = participant_names
            .iter()
            .copied()
            .filter(|name| *name != evaluator_name)
            .collect();

        let system = format!(
            r#"You are {evaluator}. Please evaluate the other participants' viewpoints in {lang}.

Evaluation requirements:
- Evaluate each participant ({others}) separately
- Give each a score from 1-10
- Point out strengths and weaknesses
- Stay fair and objective"#,
            evaluator = evaluator_name,
            lang = language.instruction_name(),
            others = others.join(", "),
        );
        let user = format!(
            "Topic: {}\n\nFull discussion transcript:\n\n{}\n\nPlease evaluate each participant.",
            topic,
            Self::transcript_text(transcript, "\n\n---\n\n")
        );

        vec![Message::system(system), Message::user(user)]
    }

    /// Messages asking for the closing summary of the meeting
    pub fn summary(
        topic: &str,
        transcript: &[TranscriptEntry],
        evaluations: &[Evaluation],
        participant_names: &[&str],
        language: &Language,
    ) -> Vec<Message> {
        let system = format!(
            "Please write a summary of this roundtable meeting in {}. Include: main viewpoints, \
             points of consensus and disagreement, key insights, and recommended actions.",
            language.instruction_name()
        );
        let evaluation_text = evaluations
            .iter()
            .map(|e| format!("[Evaluation by {}]: {}", e.evaluator_name, e.content))
            .collect::<Vec<_>>()
            .join("\n\n");
        let user = format!(
            "Topic: {}\n\nParticipants: {}\n\nDiscussion transcript:\n{}\n\nCross-evaluations:\n{}\n\nPlease write a complete meeting summary.",
            topic,
            participant_names.join(", "),
            Self::transcript_text(transcript, "\n\n"),
            evaluation_text
        );

        vec![Message::system(system), Message::user(user)]
    }

    /// Minimal request used to check whether a credential works
    pub fn credential_probe() -> Vec<Message> {
        vec![Message::user("Hi")]
    }
}
