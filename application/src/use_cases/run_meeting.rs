//! Run Meeting use case
//!
//! Drives a [`Meeting`] through discussion, optional cross-evaluation and
//! summary against real backends, publishing [`MeetingUpdate`]s as it goes.
//!
//! Control is split in two:
//!
//! - [`RunMeetingUseCase::start`] runs the lifecycle to completion
//! - [`MeetingHandle`] (cloneable) pauses, resumes, stops or inspects the
//!   meeting from anywhere while `start` is running
//!
//! All meeting state lives behind one lock. Every update is sent while that
//! lock is held and only if the meeting is not yet completed, so once
//! `stop()` returns nothing but the completion update has been or will be
//! emitted, and late backend results are discarded.

use crate::config::BehaviorConfig;
use crate::ports::meeting_update::MeetingUpdate;
use crate::ports::model_backend::{BackendError, ModelBackend};
use chrono::Utc;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use roundtable_domain::{
    DiscussionPrompt, DomainError, Meeting, MeetingConfig, MeetingRecord, MeetingSnapshot, Message,
    Participant, Phase, PromptTemplate, StreamContext, error_marker, round_order,
    summary_error_marker,
};
use std::ops::ControlFlow;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Errors that can occur while running a meeting
#[derive(Error, Debug)]
pub enum RunMeetingError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Meeting has already been started")]
    AlreadyStarted,
}

impl RunMeetingError {
    /// Check if this error was raised before the meeting could start
    pub fn is_configuration(&self) -> bool {
        match self {
            RunMeetingError::Domain(e) => e.is_configuration(),
            RunMeetingError::AlreadyStarted => false,
        }
    }
}

/// A participant bound to the backend that speaks for it
#[derive(Clone)]
pub struct Seat {
    pub participant: Participant,
    pub backend: Arc<dyn ModelBackend>,
}

impl Seat {
    pub fn new(participant: Participant, backend: Arc<dyn ModelBackend>) -> Self {
        Self {
            participant,
            backend,
        }
    }
}

/// Input for the RunMeeting use case
#[derive(Clone)]
pub struct RunMeetingInput {
    pub config: MeetingConfig,
    /// Seats in registration order; the first one writes the summary
    pub seats: Vec<Seat>,
}

impl RunMeetingInput {
    pub fn new(config: MeetingConfig, seats: Vec<Seat>) -> Self {
        Self { config, seats }
    }
}

/// Outcome of one backend call
enum Invocation {
    Completed(String),
    Failed(String),
    Stopped,
}

/// State shared between the running use case and its handles
struct Shared {
    meeting: Mutex<Meeting>,
    updates: mpsc::UnboundedSender<MeetingUpdate>,
    paused: watch::Sender<bool>,
    cancel: CancellationToken,
}

impl Shared {
    fn meeting(&self) -> MutexGuard<'_, Meeting> {
        self.meeting.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send without checks; callers hold the meeting lock
    fn send(&self, update: MeetingUpdate) {
        // Receiver gone means nobody is listening, which is fine
        let _ = self.updates.send(update);
    }

    /// Send unless the meeting has completed
    fn emit_active(&self, update: MeetingUpdate) {
        let meeting = self.meeting();
        if !meeting.is_completed() {
            self.send(update);
        }
    }

    /// Run `f` against the meeting unless it has completed.
    ///
    /// `Ok(None)` means the meeting was stopped and the caller should bail out.
    fn with_active<T>(
        &self,
        f: impl FnOnce(&mut Meeting) -> Result<T, DomainError>,
    ) -> Result<Option<T>, DomainError> {
        let mut meeting = self.meeting();
        if meeting.is_completed() {
            return Ok(None);
        }
        f(&mut *meeting).map(Some)
    }

    /// Like [`Self::with_active`], but first waits out any pause.
    ///
    /// The pause flag is re-checked under the lock so a pause requested
    /// between waking and locking is still honoured.
    async fn gated<T>(
        &self,
        mut f: impl FnMut(&mut Meeting) -> Result<T, DomainError>,
    ) -> Result<Option<T>, DomainError> {
        loop {
            if !self.wait_while_paused().await {
                return Ok(None);
            }
            let mut meeting = self.meeting();
            if meeting.is_completed() {
                return Ok(None);
            }
            if *self.paused.borrow() {
                continue;
            }
            return f(&mut *meeting).map(Some);
        }
    }

    /// Suspend until the pause flag clears. Returns false if stopped.
    async fn wait_while_paused(&self) -> bool {
        let mut paused = self.paused.subscribe();
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            result = paused.wait_for(|p| !*p) => result.is_ok(),
        }
    }

    /// Complete the meeting and publish its record, once.
    fn finish(&self, error: Option<String>) -> MeetingRecord {
        let record = {
            let mut meeting = self.meeting();
            if let Some(record) = meeting.record() {
                return record.clone();
            }
            let record = meeting.finalize(Utc::now()).clone();
            self.send(MeetingUpdate::PhaseChange {
                phase: Phase::Completed,
                record: Some(Box::new(record.clone())),
                error,
            });
            record
        };
        self.cancel.cancel();
        self.paused.send_replace(false);
        record
    }
}

/// Remote control for a running meeting
#[derive(Clone)]
pub struct MeetingHandle {
    shared: Arc<Shared>,
}

impl MeetingHandle {
    /// Request a pause at the next round or turn boundary.
    ///
    /// Only meaningful during discussion; returns whether the meeting paused.
    pub fn pause(&self) -> bool {
        let mut meeting = self.shared.meeting();
        if meeting.phase() != Phase::Discussion || meeting.transition(Phase::Paused).is_err() {
            return false;
        }
        self.shared.paused.send_replace(true);
        self.shared.send(MeetingUpdate::PhaseChange {
            phase: Phase::Paused,
            record: None,
            error: None,
        });
        info!("Meeting paused");
        true
    }

    /// Release a pause; returns whether the meeting was paused
    pub fn resume(&self) -> bool {
        let mut meeting = self.shared.meeting();
        if meeting.phase() != Phase::Paused || meeting.transition(Phase::Discussion).is_err() {
            return false;
        }
        self.shared.paused.send_replace(false);
        self.shared.send(MeetingUpdate::PhaseChange {
            phase: Phase::Discussion,
            record: None,
            error: None,
        });
        info!("Meeting resumed");
        true
    }

    /// Force completion and return the record built from the current state
    pub fn stop(&self) -> MeetingRecord {
        info!("Meeting stopped");
        self.shared.finish(None)
    }

    /// Complete the meeting because of an unrecoverable fault
    pub fn fail(&self, message: impl Into<String>) -> MeetingRecord {
        let message = message.into();
        warn!(error = %message, "Meeting failed");
        self.shared.finish(Some(message))
    }

    pub fn phase(&self) -> Phase {
        self.shared.meeting().phase()
    }

    pub fn is_paused(&self) -> bool {
        *self.shared.paused.borrow()
    }

    /// Read-only view of the meeting right now
    pub fn state(&self) -> MeetingSnapshot {
        self.shared.meeting().snapshot()
    }
}

/// Use case for running a roundtable meeting
pub struct RunMeetingUseCase {
    shared: Arc<Shared>,
    seats: Vec<Seat>,
    behavior: BehaviorConfig,
    rng: Mutex<Box<dyn RngCore + Send>>,
}

impl RunMeetingUseCase {
    /// Validate the input and create an idle meeting.
    ///
    /// Returns the use case together with the receiving end of its update
    /// stream.
    pub fn new(
        input: RunMeetingInput,
    ) -> Result<(Self, mpsc::UnboundedReceiver<MeetingUpdate>), RunMeetingError> {
        let participants = input.seats.iter().map(|s| s.participant.clone()).collect();
        let meeting = Meeting::new(input.config, participants)?;
        let (updates, receiver) = mpsc::unbounded_channel();
        let (paused, _) = watch::channel(false);

        let use_case = Self {
            shared: Arc::new(Shared {
                meeting: Mutex::new(meeting),
                updates,
                paused,
                cancel: CancellationToken::new(),
            }),
            seats: input.seats,
            behavior: BehaviorConfig::default(),
            rng: Mutex::new(Box::new(StdRng::from_os_rng())),
        };
        Ok((use_case, receiver))
    }

    /// Use a specific random source for turn order
    pub fn with_rng(self, rng: impl RngCore + Send + 'static) -> Self {
        Self {
            rng: Mutex::new(Box::new(rng)),
            ..self
        }
    }

    pub fn with_behavior(mut self, behavior: BehaviorConfig) -> Self {
        self.behavior = behavior;
        self
    }

    pub fn handle(&self) -> MeetingHandle {
        MeetingHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Run the meeting to completion (or until stopped) and return its record.
    ///
    /// Backend failures never abort the run: they are recorded inline as
    /// error markers. Calling `start` on a meeting that was stopped before
    /// it began returns that (empty) record.
    pub async fn start(&self) -> Result<MeetingRecord, RunMeetingError> {
        {
            let mut meeting = self.shared.meeting();
            if let Some(record) = meeting.record() {
                return Ok(record.clone());
            }
            if meeting.phase() != Phase::Idle {
                return Err(RunMeetingError::AlreadyStarted);
            }
            meeting.transition(Phase::Discussion)?;
            self.shared.send(MeetingUpdate::PhaseChange {
                phase: Phase::Discussion,
                record: None,
                error: None,
            });
            info!(
                topic = %meeting.config().topic,
                participants = self.seats.len(),
                rounds = meeting.total_rounds(),
                "Starting meeting"
            );
        }

        if self.run_discussion().await?.is_continue()
            && self.run_evaluation().await?.is_continue()
        {
            self.run_summary().await?;
        }

        Ok(self.shared.finish(None))
    }

    /// [`Self::start`], completing the meeting with the error if it faults.
    ///
    /// Listeners always see a completion update, so anything draining the
    /// update stream until completion terminates. `AlreadyStarted` is passed
    /// through untouched since another caller owns the running meeting.
    pub async fn run(&self) -> Result<MeetingRecord, RunMeetingError> {
        let result = self.start().await;
        if let Err(e) = &result
            && !matches!(e, RunMeetingError::AlreadyStarted)
        {
            self.handle().fail(e.to_string());
        }
        result
    }

    fn seat(&self, participant_id: &str) -> Result<&Seat, DomainError> {
        self.seats
            .iter()
            .find(|s| s.participant.id() == participant_id)
            .ok_or_else(|| DomainError::UnknownParticipant(participant_id.to_string()))
    }

    fn participant_names(&self) -> Vec<&str> {
        self.seats.iter().map(|s| s.participant.name()).collect()
    }

    /// Phase 1: all discussion rounds
    async fn run_discussion(&self) -> Result<ControlFlow<()>, RunMeetingError> {
        let (total_rounds, policy) = {
            let meeting = self.shared.meeting();
            (meeting.total_rounds(), meeting.config().turn_order)
        };

        for _ in 0..total_rounds {
            let Some(round) = self
                .shared
                .gated(|m| {
                    let round = m.begin_round()?;
                    self.shared.send(MeetingUpdate::RoundStart {
                        round,
                        total_rounds,
                    });
                    Ok(round)
                })
                .await?
            else {
                return Ok(ControlFlow::Break(()));
            };
            info!(round, total_rounds, "Round started");

            // Fresh order every round
            let order: Vec<String> = {
                let participants: Vec<Participant> =
                    self.seats.iter().map(|s| s.participant.clone()).collect();
                let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
                round_order(&participants, policy, &mut **rng)
                    .into_iter()
                    .map(|p| p.id().to_string())
                    .collect()
            };
            debug!(round, order = ?order, "Turn order");

            for participant_id in &order {
                if self.run_turn(participant_id, round).await?.is_break() {
                    return Ok(ControlFlow::Break(()));
                }
            }

            let sent = self.shared.with_active(|_| {
                self.shared.send(MeetingUpdate::RoundEnd { round });
                Ok(())
            })?;
            if sent.is_none() {
                return Ok(ControlFlow::Break(()));
            }
        }

        Ok(ControlFlow::Continue(()))
    }

    /// One participant's turn in `round`
    async fn run_turn(
        &self,
        participant_id: &str,
        round: u32,
    ) -> Result<ControlFlow<()>, RunMeetingError> {
        let seat = self.seat(participant_id)?;
        let participant = &seat.participant;

        let Some(messages) = self
            .shared
            .gated(|m| {
                let context = m.discussion_context(participant_id, round);
                let history = PromptTemplate::attributed_history(&context);
                let messages = PromptTemplate::discussion(&DiscussionPrompt {
                    topic: m.config().topic.content(),
                    participant_name: participant.name(),
                    round,
                    total_rounds: m.total_rounds(),
                    previous_messages: &history,
                    language: &m.config().language,
                });
                self.shared.send(MeetingUpdate::TurnStart {
                    participant: participant_id.to_string(),
                    participant_name: participant.name().to_string(),
                    round,
                });
                Ok(messages)
            })
            .await?
        else {
            return Ok(ControlFlow::Break(()));
        };
        debug!(participant = %participant_id, round, "Turn started");

        let content = match self.invoke(seat, &messages, None).await {
            Invocation::Completed(text) => text,
            Invocation::Failed(message) => {
                warn!(participant = %participant_id, round, error = %message, "Turn failed");
                error_marker(&message)
            }
            Invocation::Stopped => return Ok(ControlFlow::Break(())),
        };

        let recorded = self.shared.with_active(|m| {
            m.record_turn(participant_id, content.as_str())?;
            self.shared.send(MeetingUpdate::TurnEnd {
                participant: participant_id.to_string(),
                round,
                content: content.clone(),
            });
            Ok(())
        })?;

        Ok(match recorded {
            Some(()) => ControlFlow::Continue(()),
            None => ControlFlow::Break(()),
        })
    }

    /// Leave discussion for `next`, honouring a pause requested after the
    /// final turn.
    async fn leave_discussion(&self, next: Phase) -> Result<ControlFlow<()>, RunMeetingError> {
        let moved = self
            .shared
            .gated(|m| {
                if m.phase() == Phase::Discussion {
                    m.transition(next)?;
                    self.shared.send(MeetingUpdate::PhaseChange {
                        phase: next,
                        record: None,
                        error: None,
                    });
                }
                Ok(())
            })
            .await?;
        Ok(match moved {
            Some(()) => ControlFlow::Continue(()),
            None => ControlFlow::Break(()),
        })
    }

    /// Phase 2: each participant evaluates the others, in registration order
    async fn run_evaluation(&self) -> Result<ControlFlow<()>, RunMeetingError> {
        let enabled = self.shared.meeting().config().evaluation_mode.is_enabled();
        if !enabled {
            debug!("Skipping cross-evaluation");
            return Ok(ControlFlow::Continue(()));
        }
        if self.leave_discussion(Phase::Evaluation).await?.is_break() {
            return Ok(ControlFlow::Break(()));
        }
        info!("Cross-evaluation started");

        let names = self.participant_names();
        for seat in &self.seats {
            let participant = &seat.participant;
            let Some(messages) = self.shared.with_active(|m| {
                self.shared.send(MeetingUpdate::EvalStart {
                    participant: participant.id().to_string(),
                    participant_name: participant.name().to_string(),
                });
                Ok(PromptTemplate::evaluation(
                    m.config().topic.content(),
                    participant.name(),
                    m.transcript(),
                    &names,
                    &m.config().language,
                ))
            })?
            else {
                return Ok(ControlFlow::Break(()));
            };

            let content = match self
                .invoke(seat, &messages, Some(StreamContext::Evaluation))
                .await
            {
                Invocation::Completed(text) => text,
                Invocation::Failed(message) => {
                    warn!(participant = %participant.id(), error = %message, "Evaluation failed");
                    error_marker(&message)
                }
                Invocation::Stopped => return Ok(ControlFlow::Break(())),
            };

            let recorded = self.shared.with_active(|m| {
                m.record_evaluation(participant.id(), content.as_str())?;
                self.shared.send(MeetingUpdate::EvalEnd {
                    participant: participant.id().to_string(),
                    content: content.clone(),
                });
                Ok(())
            })?;
            if recorded.is_none() {
                return Ok(ControlFlow::Break(()));
            }
        }

        Ok(ControlFlow::Continue(()))
    }

    /// Phase 3: the first participant summarises the meeting
    async fn run_summary(&self) -> Result<ControlFlow<()>, RunMeetingError> {
        let from_discussion = matches!(
            self.shared.meeting().phase(),
            Phase::Discussion | Phase::Paused
        );
        if from_discussion && self.leave_discussion(Phase::Summary).await?.is_break() {
            return Ok(ControlFlow::Break(()));
        }

        let names = self.participant_names();
        let Some((summariser, messages)) = self.shared.with_active(|m| {
            if m.phase() != Phase::Summary {
                m.transition(Phase::Summary)?;
                self.shared.send(MeetingUpdate::PhaseChange {
                    phase: Phase::Summary,
                    record: None,
                    error: None,
                });
            }
            let messages = PromptTemplate::summary(
                m.config().topic.content(),
                m.transcript(),
                m.evaluations(),
                &names,
                &m.config().language,
            );
            Ok((m.summary_participant().id().to_string(), messages))
        })?
        else {
            return Ok(ControlFlow::Break(()));
        };
        info!(summariser = %summariser, "Summary started");

        let seat = self.seat(&summariser)?;
        let summary = match self
            .invoke(seat, &messages, Some(StreamContext::Summary))
            .await
        {
            Invocation::Completed(text) => text,
            Invocation::Failed(message) => {
                warn!(error = %message, "Summary failed");
                summary_error_marker(&message)
            }
            Invocation::Stopped => return Ok(ControlFlow::Break(())),
        };

        let recorded = self.shared.with_active(|m| {
            m.set_summary(summary.as_str())?;
            self.shared.send(MeetingUpdate::SummaryComplete {
                summary: summary.clone(),
            });
            Ok(())
        })?;

        Ok(match recorded {
            Some(()) => ControlFlow::Continue(()),
            None => ControlFlow::Break(()),
        })
    }

    /// Stream one completion from `seat`, forwarding chunks as updates.
    ///
    /// A stop cancels the in-flight call; its result never reaches the
    /// meeting.
    async fn invoke(
        &self,
        seat: &Seat,
        messages: &[Message],
        context: Option<StreamContext>,
    ) -> Invocation {
        let shared = &self.shared;
        let participant_id = seat.participant.id().to_string();
        let options = self.behavior.completion_options();
        let mut on_chunk = |chunk: &str| {
            shared.emit_active(MeetingUpdate::StreamChunk {
                participant: participant_id.clone(),
                chunk: chunk.to_string(),
                context,
            });
        };

        let call = async {
            let request = seat
                .backend
                .complete_streaming(messages, &options, &mut on_chunk);
            match self.behavior.timeout {
                Some(limit) => tokio::time::timeout(limit, request)
                    .await
                    .unwrap_or(Err(BackendError::Timeout(limit))),
                None => request.await,
            }
        };

        tokio::select! {
            biased;
            _ = shared.cancel.cancelled() => Invocation::Stopped,
            result = call => match result {
                Ok(text) => Invocation::Completed(text),
                Err(e) => Invocation::Failed(e.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::model_backend::{ChunkCallback, CompletionOptions};
    use async_trait::async_trait;
    use roundtable_domain::{BackendId, EvaluationMode, Topic, TranscriptEntry, TurnOrder};
    use std::collections::VecDeque;
    use std::time::Duration;
    use tokio::sync::Notify;

    // ==================== Test Mocks ====================

    /// Backend replying from a script, streaming each reply in two chunks
    struct ScriptedBackend {
        id: BackendId,
        replies: Mutex<VecDeque<Result<String, String>>>,
        prompts: Mutex<Vec<Vec<Message>>>,
        hold_first: Mutex<Option<Arc<Notify>>>,
        delay: Option<Duration>,
    }

    impl ScriptedBackend {
        fn new(id: BackendId) -> Self {
            Self {
                id,
                replies: Mutex::new(VecDeque::new()),
                prompts: Mutex::new(Vec::new()),
                hold_first: Mutex::new(None),
                delay: None,
            }
        }

        fn replying(self, replies: &[Result<&str, &str>]) -> Self {
            *self.replies.lock().unwrap() = replies
                .iter()
                .map(|r| r.map(str::to_string).map_err(str::to_string))
                .collect();
            self
        }

        /// The first call blocks until `release` is notified
        fn holding_first(self, release: Arc<Notify>) -> Self {
            *self.hold_first.lock().unwrap() = Some(release);
            self
        }

        fn delayed(mut self, delay: Duration) -> Self {
            self.delay = Some(delay);
            self
        }

        fn prompts(&self) -> Vec<Vec<Message>> {
            self.prompts.lock().unwrap().clone()
        }

        fn calls(&self) -> usize {
            self.prompts.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ModelBackend for ScriptedBackend {
        fn id(&self) -> BackendId {
            self.id
        }

        fn model(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            messages: &[Message],
            _options: &CompletionOptions,
        ) -> Result<String, BackendError> {
            let call = {
                let mut prompts = self.prompts.lock().unwrap();
                prompts.push(messages.to_vec());
                prompts.len()
            };
            let hold = self.hold_first.lock().unwrap().take();
            if let Some(release) = hold {
                release.notified().await;
            }
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            let reply = self.replies.lock().unwrap().pop_front();
            match reply {
                Some(Ok(text)) => Ok(text),
                Some(Err(message)) => Err(BackendError::Other(message)),
                None => Ok(format!("{} reply {}", self.id.display_name(), call)),
            }
        }

        async fn complete_streaming(
            &self,
            messages: &[Message],
            options: &CompletionOptions,
            on_chunk: ChunkCallback<'_>,
        ) -> Result<String, BackendError> {
            let text = self.complete(messages, options).await?;
            let mid = text
                .char_indices()
                .map(|(i, _)| i)
                .nth(text.chars().count() / 2)
                .unwrap_or(text.len());
            let (head, tail) = text.split_at(mid);
            for part in [head, tail] {
                if !part.is_empty() {
                    on_chunk(part);
                }
            }
            Ok(text)
        }
    }

    fn config(rounds: u32) -> MeetingConfig {
        MeetingConfig::new(Topic::try_new("Should we rewrite it in Rust?").unwrap())
            .with_rounds(rounds)
    }

    fn seats(backends: &[Arc<ScriptedBackend>]) -> Vec<Seat> {
        backends
            .iter()
            .map(|b| {
                let backend: Arc<dyn ModelBackend> = b.clone();
                Seat::new(Participant::for_backend(b.id), backend)
            })
            .collect()
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<MeetingUpdate>) -> Vec<MeetingUpdate> {
        let mut updates = Vec::new();
        while let Ok(update) = rx.try_recv() {
            updates.push(update);
        }
        updates
    }

    fn types(updates: &[MeetingUpdate]) -> Vec<&'static str> {
        updates.iter().map(MeetingUpdate::event_type).collect()
    }

    fn phases(updates: &[MeetingUpdate]) -> Vec<Phase> {
        updates
            .iter()
            .filter_map(|u| match u {
                MeetingUpdate::PhaseChange { phase, .. } => Some(*phase),
                _ => None,
            })
            .collect()
    }

    async fn next_matching(
        rx: &mut mpsc::UnboundedReceiver<MeetingUpdate>,
        pred: impl Fn(&MeetingUpdate) -> bool,
    ) -> MeetingUpdate {
        loop {
            let update = rx.recv().await.expect("update stream closed");
            if pred(&update) {
                return update;
            }
        }
    }

    // ==================== Full Lifecycle ====================

    #[tokio::test]
    async fn test_full_meeting_with_cross_evaluation() {
        let claude = Arc::new(ScriptedBackend::new(BackendId::Claude));
        let gemini = Arc::new(ScriptedBackend::new(BackendId::Gemini));
        let (use_case, mut rx) =
            RunMeetingUseCase::new(RunMeetingInput::new(config(2), seats(&[claude.clone(), gemini.clone()])))
                .unwrap();

        let record = use_case.start().await.unwrap();
        let updates = drain(&mut rx);

        assert_eq!(
            phases(&updates),
            vec![
                Phase::Discussion,
                Phase::Evaluation,
                Phase::Summary,
                Phase::Completed
            ]
        );
        assert_eq!(record.transcript.len(), 4);
        assert_eq!(
            record
                .transcript
                .iter()
                .map(|t| (t.participant.as_str(), t.round))
                .collect::<Vec<_>>(),
            vec![("claude", 1), ("gemini", 1), ("claude", 2), ("gemini", 2)]
        );
        assert_eq!(record.evaluations.len(), 2);
        assert_eq!(record.evaluations[0].evaluator, "claude");
        assert_eq!(record.evaluations[1].evaluator, "gemini");

        // 2 turns + 1 evaluation each, plus the summary from the first seat
        assert_eq!(claude.calls(), 4);
        assert_eq!(gemini.calls(), 3);
        assert_eq!(record.summary, "Claude reply 4");

        let summary_chunks: String = updates
            .iter()
            .filter_map(|u| match u {
                MeetingUpdate::StreamChunk {
                    chunk,
                    context: Some(StreamContext::Summary),
                    ..
                } => Some(chunk.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(summary_chunks, record.summary);

        let kinds = types(&updates);
        assert_eq!(kinds.iter().filter(|t| **t == "ROUND_START").count(), 2);
        assert_eq!(kinds.iter().filter(|t| **t == "TURN_END").count(), 4);
        assert_eq!(kinds.iter().filter(|t| **t == "EVAL_END").count(), 2);
        assert_eq!(kinds.iter().filter(|t| **t == "SUMMARY_COMPLETE").count(), 1);
        assert_eq!(kinds.last(), Some(&"PHASE_CHANGE"));

        let last = updates.last().unwrap();
        assert_eq!(last.record(), Some(&record));
        assert!(record.markdown.contains("## Round 2"));
        assert!(record.markdown.contains("## Cross-Evaluation"));
    }

    #[tokio::test]
    async fn test_turn_events_are_nested_in_order() {
        let a = Arc::new(ScriptedBackend::new(BackendId::ChatGpt));
        let b = Arc::new(ScriptedBackend::new(BackendId::Copilot));
        let (use_case, mut rx) =
            RunMeetingUseCase::new(RunMeetingInput::new(config(1), seats(&[a, b]))).unwrap();
        use_case.start().await.unwrap();

        let kinds = types(&drain(&mut rx));
        let discussion: Vec<_> = kinds
            .iter()
            .copied()
            .skip(1)
            .take_while(|t| *t != "PHASE_CHANGE")
            .collect();
        assert_eq!(
            discussion,
            vec![
                "ROUND_START",
                "TURN_START",
                "STREAM_CHUNK",
                "STREAM_CHUNK",
                "TURN_END",
                "TURN_START",
                "STREAM_CHUNK",
                "STREAM_CHUNK",
                "TURN_END",
                "ROUND_END"
            ]
        );
    }

    #[tokio::test]
    async fn test_prompt_context_excludes_own_and_later_turns() {
        let claude = Arc::new(
            ScriptedBackend::new(BackendId::Claude).replying(&[Ok("A-one"), Ok("A-two")]),
        );
        let gemini = Arc::new(
            ScriptedBackend::new(BackendId::Gemini).replying(&[Ok("B-one"), Ok("B-two")]),
        );
        let (use_case, _rx) = RunMeetingUseCase::new(
            RunMeetingInput::new(
                config(2).with_evaluation_mode(EvaluationMode::None),
                seats(&[claude.clone(), gemini.clone()]),
            ),
        )
        .unwrap();
        use_case.start().await.unwrap();

        let a = claude.prompts();
        let b = gemini.prompts();

        // Claude opens round 1 with no context
        assert!(a[0][1].content.contains("You are the first speaker"));
        // Gemini in round 1 sees Claude's opening only
        assert!(b[0][1].content.contains("[Claude]: A-one"));
        assert!(!b[0][1].content.contains("B-one"));
        // Claude in round 2 sees all of round 1 but not its own round-2 turn
        assert!(a[1][1].content.contains("[Claude]: A-one"));
        assert!(a[1][1].content.contains("[Gemini]: B-one"));
        assert!(!a[1][1].content.contains("A-two"));
        // Gemini in round 2 sees Claude's round-2 turn but not its own
        assert!(b[1][1].content.contains("[Claude]: A-two"));
        assert!(!b[1][1].content.contains("B-two"));
        assert!(b[1][0].content.contains("Round 2/2"));
    }

    #[tokio::test]
    async fn test_no_evaluation_goes_straight_to_summary() {
        let a = Arc::new(ScriptedBackend::new(BackendId::Claude));
        let b = Arc::new(ScriptedBackend::new(BackendId::ChatGpt));
        let (use_case, mut rx) = RunMeetingUseCase::new(RunMeetingInput::new(
            config(1).with_evaluation_mode(EvaluationMode::None),
            seats(&[a, b]),
        ))
        .unwrap();

        let record = use_case.start().await.unwrap();
        let updates = drain(&mut rx);
        assert!(record.evaluations.is_empty());
        assert!(!types(&updates).contains(&"EVAL_START"));
        assert_eq!(
            phases(&updates),
            vec![Phase::Discussion, Phase::Summary, Phase::Completed]
        );
        assert!(!record.markdown.contains("## Cross-Evaluation"));
    }

    // ==================== Failures ====================

    #[tokio::test]
    async fn test_failed_turn_is_recorded_and_meeting_continues() {
        let a = Arc::new(ScriptedBackend::new(BackendId::Claude));
        let b = Arc::new(
            ScriptedBackend::new(BackendId::Gemini).replying(&[Err("Gemini API error: quota")]),
        );
        let (use_case, _rx) =
            RunMeetingUseCase::new(RunMeetingInput::new(config(2), seats(&[a, b]))).unwrap();

        let record = use_case.start().await.unwrap();
        assert_eq!(record.transcript.len(), 4);
        assert_eq!(record.transcript[1].content, "[Error: Gemini API error: quota]");
        assert_eq!(record.failed_turns(), 1);
        assert_eq!(record.evaluations.len(), 2);
        assert!(!record.summary.is_empty());
    }

    #[tokio::test]
    async fn test_failed_summary_uses_marker() {
        // Claude: turn, evaluation, then the summary fails
        let a = Arc::new(ScriptedBackend::new(BackendId::Claude).replying(&[
            Ok("turn"),
            Ok("eval"),
            Err("overloaded"),
        ]));
        let b = Arc::new(ScriptedBackend::new(BackendId::ChatGpt));
        let (use_case, mut rx) =
            RunMeetingUseCase::new(RunMeetingInput::new(config(1), seats(&[a, b]))).unwrap();

        let record = use_case.start().await.unwrap();
        assert_eq!(record.summary, "[Summary generation failed: overloaded]");
        let updates = drain(&mut rx);
        assert!(updates.iter().any(|u| matches!(
            u,
            MeetingUpdate::SummaryComplete { summary } if summary == &record.summary
        )));
    }

    #[tokio::test]
    async fn test_timeout_is_recorded_as_failure() {
        let a = Arc::new(ScriptedBackend::new(BackendId::Claude).delayed(Duration::from_millis(200)));
        let b = Arc::new(ScriptedBackend::new(BackendId::Gemini));
        let (use_case, _rx) = RunMeetingUseCase::new(RunMeetingInput::new(
            config(1).with_evaluation_mode(EvaluationMode::None),
            seats(&[a, b]),
        ))
        .unwrap();
        let use_case = use_case.with_behavior(BehaviorConfig {
            timeout: Some(Duration::from_millis(20)),
            ..BehaviorConfig::default()
        });

        let record = use_case.start().await.unwrap();
        assert_eq!(record.transcript[0].content, "[Error: Request timed out after 20ms]");
        assert!(record.summary.starts_with("[Summary generation failed:"));
    }

    #[test]
    fn test_rejects_single_participant() {
        let a = Arc::new(ScriptedBackend::new(BackendId::Claude));
        let result = RunMeetingUseCase::new(RunMeetingInput::new(config(2), seats(&[a])));
        let error = result.err().unwrap();
        assert!(error.is_configuration());
        assert!(matches!(
            error,
            RunMeetingError::Domain(DomainError::NotEnoughParticipants { found: 1, .. })
        ));
    }

    // ==================== Turn Order ====================

    #[tokio::test]
    async fn test_random_order_is_a_permutation_each_round() {
        let backends: Vec<_> = [BackendId::Claude, BackendId::ChatGpt, BackendId::Gemini]
            .into_iter()
            .map(|id| Arc::new(ScriptedBackend::new(id)))
            .collect();
        let run = |seed: u64| {
            let seats = seats(&backends);
            async move {
                let (use_case, _rx) = RunMeetingUseCase::new(RunMeetingInput::new(
                    config(3)
                        .with_turn_order(TurnOrder::Random)
                        .with_evaluation_mode(EvaluationMode::None),
                    seats,
                ))
                .unwrap();
                let use_case = use_case.with_rng(StdRng::seed_from_u64(seed));
                use_case.start().await.unwrap()
            }
        };

        let first = run(9).await;
        for round in 1..=3 {
            let mut ids: Vec<_> = first
                .transcript
                .iter()
                .filter(|t| t.round == round)
                .map(|t| t.participant.clone())
                .collect();
            ids.sort();
            assert_eq!(ids, vec!["chatgpt", "claude", "gemini"]);
        }

        let order = |r: &MeetingRecord| -> Vec<String> {
            r.transcript.iter().map(|t| t.participant.clone()).collect()
        };
        let again = run(9).await;
        assert_eq!(order(&first), order(&again));
    }

    // ==================== Control ====================

    #[tokio::test]
    async fn test_stop_mid_turn_returns_partial_record() {
        let release = Arc::new(Notify::new());
        let a = Arc::new(ScriptedBackend::new(BackendId::Claude).replying(&[Ok("first")]));
        let b = Arc::new(ScriptedBackend::new(BackendId::Gemini).holding_first(release));
        let (use_case, mut rx) =
            RunMeetingUseCase::new(RunMeetingInput::new(config(2), seats(&[a, b]))).unwrap();
        let handle = use_case.handle();

        let control = async {
            next_matching(&mut rx, |u| {
                matches!(u, MeetingUpdate::TurnStart { participant, .. } if participant == "gemini")
            })
            .await;
            handle.stop()
        };
        let (result, stopped) = tokio::join!(use_case.start(), control);
        let record = result.unwrap();

        assert_eq!(record, stopped);
        assert_eq!(record.transcript.len(), 1);
        assert_eq!(record.transcript[0].content, "first");
        assert!(record.summary.is_empty());
        assert_eq!(handle.phase(), Phase::Completed);

        // Only the completion update follows the stop
        let rest = drain(&mut rx);
        assert_eq!(types(&rest), vec!["PHASE_CHANGE"]);
        assert!(rest[0].is_completion());
        assert_eq!(rest[0].record(), Some(&record));

        // Stopping again returns the same record without new updates
        assert_eq!(handle.stop(), record);
        assert!(drain(&mut rx).is_empty());
    }

    #[tokio::test]
    async fn test_stop_before_start() {
        let a = Arc::new(ScriptedBackend::new(BackendId::Claude));
        let b = Arc::new(ScriptedBackend::new(BackendId::Gemini));
        let (use_case, mut rx) = RunMeetingUseCase::new(RunMeetingInput::new(
            config(2),
            seats(&[a.clone(), b]),
        ))
        .unwrap();

        let record = use_case.handle().stop();
        assert!(record.transcript.is_empty());
        assert_eq!(use_case.start().await.unwrap(), record);
        assert_eq!(a.calls(), 0);
        assert_eq!(phases(&drain(&mut rx)), vec![Phase::Completed]);
    }

    #[tokio::test]
    async fn test_pause_takes_effect_between_turns() {
        let release = Arc::new(Notify::new());
        let a = Arc::new(ScriptedBackend::new(BackendId::Claude).holding_first(release.clone()));
        let b = Arc::new(ScriptedBackend::new(BackendId::Gemini));
        let (use_case, mut rx) = RunMeetingUseCase::new(RunMeetingInput::new(
            config(1).with_evaluation_mode(EvaluationMode::None),
            seats(&[a, b.clone()]),
        ))
        .unwrap();
        let handle = use_case.handle();

        let control = async {
            next_matching(&mut rx, |u| matches!(u, MeetingUpdate::TurnStart { .. })).await;
            assert!(handle.pause());
            assert!(!handle.pause());
            release.notify_one();

            // The in-flight turn still completes
            let end = next_matching(&mut rx, |u| matches!(u, MeetingUpdate::TurnEnd { .. })).await;
            assert!(matches!(end, MeetingUpdate::TurnEnd { ref participant, .. } if participant == "claude"));

            // Nothing else happens while paused
            let idle = tokio::time::timeout(Duration::from_millis(100), rx.recv()).await;
            assert!(idle.is_err());
            assert_eq!(handle.state().phase, Phase::Paused);
            assert_eq!(b.calls(), 0);

            assert!(handle.resume());
            assert!(!handle.resume());
            next_matching(&mut rx, |u| u.is_completion()).await
        };
        let (result, completion) = tokio::join!(use_case.start(), control);
        let record = result.unwrap();

        assert_eq!(completion.record(), Some(&record));
        assert_eq!(record.transcript.len(), 2);
        assert_eq!(record.transcript[1].participant, "gemini");
    }

    /// Claude, ChatGPT and Gemini, each slow enough to let control code run
    fn delayed_trio() -> Vec<Arc<ScriptedBackend>> {
        [BackendId::Claude, BackendId::ChatGpt, BackendId::Gemini]
            .into_iter()
            .map(|id| Arc::new(ScriptedBackend::new(id).delayed(Duration::from_millis(10))))
            .collect()
    }

    fn turns(transcript: &[TranscriptEntry]) -> Vec<(String, u32, String)> {
        transcript
            .iter()
            .map(|t| (t.participant.clone(), t.round, t.content.clone()))
            .collect()
    }

    #[tokio::test]
    async fn test_three_seat_two_round_meeting() {
        let backends = delayed_trio();
        let (use_case, _rx) =
            RunMeetingUseCase::new(RunMeetingInput::new(config(2), seats(&backends))).unwrap();

        let record = use_case.start().await.unwrap();

        assert_eq!(
            record
                .transcript
                .iter()
                .map(|t| (t.participant.as_str(), t.round))
                .collect::<Vec<_>>(),
            vec![
                ("claude", 1),
                ("chatgpt", 1),
                ("gemini", 1),
                ("claude", 2),
                ("chatgpt", 2),
                ("gemini", 2)
            ]
        );
        assert_eq!(
            record
                .evaluations
                .iter()
                .map(|e| e.evaluator.as_str())
                .collect::<Vec<_>>(),
            vec!["claude", "chatgpt", "gemini"]
        );
        assert!(!record.summary.is_empty());
        assert_eq!(use_case.handle().phase(), Phase::Completed);

        let md = &record.markdown;
        assert_eq!(md.matches("## Round ").count(), 2);
        assert_eq!(md.matches("## Cross-Evaluation").count(), 1);
        assert_eq!(md.matches("## Summary").count(), 1);
    }

    #[tokio::test]
    async fn test_pause_and_resume_leave_transcript_unchanged() {
        let (baseline, _rx) =
            RunMeetingUseCase::new(RunMeetingInput::new(config(2), seats(&delayed_trio())))
                .unwrap();
        let expected = baseline.start().await.unwrap();

        let (use_case, mut rx) =
            RunMeetingUseCase::new(RunMeetingInput::new(config(2), seats(&delayed_trio())))
                .unwrap();
        let handle = use_case.handle();

        let control = async {
            // Pause right after the second turn of round 1
            next_matching(&mut rx, |u| {
                matches!(u, MeetingUpdate::TurnEnd { participant, round: 1, .. } if participant == "chatgpt")
            })
            .await;
            assert!(handle.pause());

            // Any in-flight turn settles, then nothing moves
            tokio::time::sleep(Duration::from_millis(100)).await;
            let held = handle.state();
            assert_eq!(held.phase, Phase::Paused);
            assert!(held.transcript.len() < 6);
            tokio::time::sleep(Duration::from_millis(50)).await;
            assert_eq!(handle.state().transcript.len(), held.transcript.len());

            assert!(handle.resume());
            next_matching(&mut rx, |u| u.is_completion()).await
        };
        let (result, completion) = tokio::join!(use_case.start(), control);
        let record = result.unwrap();

        assert_eq!(completion.record(), Some(&record));
        assert_eq!(turns(&record.transcript), turns(&expected.transcript));
        assert_eq!(record.evaluations.len(), 3);
        assert_eq!(record.summary, expected.summary);
    }

    #[tokio::test]
    async fn test_pause_outside_discussion_is_ignored() {
        let a = Arc::new(ScriptedBackend::new(BackendId::Claude));
        let b = Arc::new(ScriptedBackend::new(BackendId::Gemini));
        let (use_case, _rx) =
            RunMeetingUseCase::new(RunMeetingInput::new(config(1), seats(&[a, b]))).unwrap();
        let handle = use_case.handle();

        assert!(!handle.pause());
        assert_eq!(handle.phase(), Phase::Idle);
        use_case.start().await.unwrap();
        assert!(!handle.pause());
        assert!(!handle.resume());
    }

    #[tokio::test]
    async fn test_fail_completes_with_error() {
        let release = Arc::new(Notify::new());
        let a = Arc::new(ScriptedBackend::new(BackendId::Claude).holding_first(release));
        let b = Arc::new(ScriptedBackend::new(BackendId::Gemini));
        let (use_case, mut rx) =
            RunMeetingUseCase::new(RunMeetingInput::new(config(1), seats(&[a, b]))).unwrap();
        let handle = use_case.handle();

        let control = async {
            next_matching(&mut rx, |u| matches!(u, MeetingUpdate::TurnStart { .. })).await;
            handle.fail("network unreachable");
            next_matching(&mut rx, |u| u.is_completion()).await
        };
        let (result, completion) = tokio::join!(use_case.start(), control);

        assert!(result.unwrap().transcript.is_empty());
        assert!(matches!(
            completion,
            MeetingUpdate::PhaseChange { error: Some(ref e), .. } if e == "network unreachable"
        ));
    }

    #[tokio::test]
    async fn test_run_turns_fault_into_completion_with_error() {
        let release = Arc::new(Notify::new());
        let a = Arc::new(ScriptedBackend::new(BackendId::Claude).holding_first(release.clone()));
        let b = Arc::new(ScriptedBackend::new(BackendId::Gemini));
        let (use_case, mut rx) =
            RunMeetingUseCase::new(RunMeetingInput::new(config(1), seats(&[a, b]))).unwrap();

        let control = async {
            next_matching(&mut rx, |u| matches!(u, MeetingUpdate::TurnStart { .. })).await;
            // The in-flight turn can no longer be recorded
            use_case.shared.meeting().transition(Phase::Summary).unwrap();
            release.notify_one();
            next_matching(&mut rx, |u| u.is_completion()).await
        };
        let (result, completion) = tokio::join!(use_case.run(), control);

        let error = result.unwrap_err();
        assert!(matches!(error, RunMeetingError::Domain(_)));
        assert!(matches!(
            completion,
            MeetingUpdate::PhaseChange { error: Some(ref e), .. } if *e == error.to_string()
        ));
        assert_eq!(use_case.handle().phase(), Phase::Completed);
    }

    #[tokio::test]
    async fn test_run_leaves_running_meeting_alone_when_started_twice() {
        let release = Arc::new(Notify::new());
        let a = Arc::new(ScriptedBackend::new(BackendId::Claude).holding_first(release.clone()));
        let b = Arc::new(ScriptedBackend::new(BackendId::Gemini));
        let (use_case, mut rx) = RunMeetingUseCase::new(RunMeetingInput::new(
            config(1).with_evaluation_mode(EvaluationMode::None),
            seats(&[a, b]),
        ))
        .unwrap();

        let second = async {
            next_matching(&mut rx, |u| matches!(u, MeetingUpdate::TurnStart { .. })).await;
            let result = use_case.run().await;
            release.notify_one();
            result
        };
        let (first, second) = tokio::join!(use_case.run(), second);

        assert!(matches!(second, Err(RunMeetingError::AlreadyStarted)));
        let record = first.unwrap();
        assert_eq!(record.transcript.len(), 2);
        assert!(drain(&mut rx).last().is_some_and(|u| matches!(
            u,
            MeetingUpdate::PhaseChange { error: None, .. }
        )));
    }

    #[tokio::test]
    async fn test_start_after_completion_returns_record() {
        let a = Arc::new(ScriptedBackend::new(BackendId::Claude));
        let b = Arc::new(ScriptedBackend::new(BackendId::Gemini));
        let (use_case, _rx) =
            RunMeetingUseCase::new(RunMeetingInput::new(config(1), seats(&[a.clone(), b]))).unwrap();

        let first = use_case.start().await.unwrap();
        let calls = a.calls();
        let second = use_case.start().await.unwrap();
        assert_eq!(first, second);
        assert_eq!(a.calls(), calls);
    }
}
