//! Chat session: the transcript plus the single-flight submission gate.
//!
//! A submission appends the user's message, marks the session busy, makes
//! exactly one call to the assistant, then appends the reply (or a fixed
//! apology) and clears the busy flag. While busy, further submissions are
//! ignored.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, error, info};

use crate::ai::AssistantClient;
use crate::state::ChatMessage;
use crate::transcript::Transcript;

/// Shown in place of a reply when the assistant call fails.
pub const APOLOGY: &str = "Sorry, there was an error processing your request. Please try again.";

/// Why a submission was ignored
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    EmptyInput,
    Busy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Rejected(Rejection),
    Replied,
    Failed,
}

#[derive(Debug, Default)]
struct SessionState {
    transcript: Transcript,
    pending_input: String,
    busy: bool,
}

type SharedState = Arc<Mutex<SessionState>>;

fn lock(state: &Mutex<SessionState>) -> MutexGuard<'_, SessionState> {
    // Every critical section leaves the state consistent, so a poisoned lock
    // is safe to keep using.
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct ChatSession {
    state: SharedState,
    assistant: Arc<dyn AssistantClient>,
}

impl ChatSession {
    pub fn new(assistant: Arc<dyn AssistantClient>) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            assistant,
        }
    }

    pub fn is_busy(&self) -> bool {
        lock(&self.state).busy
    }

    /// Copy of the transcript for rendering
    pub fn snapshot(&self) -> Vec<ChatMessage> {
        lock(&self.state).transcript.snapshot().to_vec()
    }

    pub fn transcript_len(&self) -> usize {
        lock(&self.state).transcript.len()
    }

    pub fn input(&self) -> String {
        lock(&self.state).pending_input.clone()
    }

    pub fn set_input(&self, text: impl Into<String>) {
        lock(&self.state).pending_input = text.into();
    }

    /// Edit the pending input buffer in place
    pub fn with_input<R>(&self, edit: impl FnOnce(&mut String) -> R) -> R {
        edit(&mut lock(&self.state).pending_input)
    }

    /// Submit `text` and wait for the exchange to finish.
    ///
    /// Never fails: blank input and submissions while busy are ignored, and
    /// assistant errors end up in the transcript as an apology.
    pub async fn submit(&self, text: &str) -> SubmitOutcome {
        match self.begin(text) {
            Ok(submission) => submission.run().await,
            Err(rejection) => SubmitOutcome::Rejected(rejection),
        }
    }

    /// Submit whatever is in the pending input buffer.
    pub async fn submit_input(&self) -> SubmitOutcome {
        let text = self.input();
        self.submit(&text).await
    }

    /// Admission step of a submission.
    ///
    /// On success the user's message is already in the transcript, the input
    /// buffer is cleared and the session is busy; the returned
    /// [`Submission`] performs the call and can be moved onto a task.
    pub fn begin(&self, text: &str) -> Result<Submission, Rejection> {
        if text.trim().is_empty() {
            debug!("ignoring blank submission");
            return Err(Rejection::EmptyInput);
        }

        let mut state = lock(&self.state);
        if state.busy {
            debug!("ignoring submission while a request is in flight");
            return Err(Rejection::Busy);
        }

        state.transcript.append(ChatMessage::user(text));
        state.pending_input.clear();
        state.busy = true;
        drop(state);

        info!(length = text.len(), "submitting message");

        Ok(Submission {
            text: text.to_string(),
            assistant: Arc::clone(&self.assistant),
            guard: BusyGuard {
                state: Arc::clone(&self.state),
                released: false,
            },
        })
    }
}

/// An admitted submission whose call has not completed yet.
///
/// Dropping it without calling [`Submission::run`] (or a panic inside the
/// assistant) counts as a failed call: the apology is appended and the
/// session returns to idle.
#[must_use = "the session stays busy until the submission runs or is dropped"]
pub struct Submission {
    text: String,
    assistant: Arc<dyn AssistantClient>,
    guard: BusyGuard,
}

impl Submission {
    pub async fn run(self) -> SubmitOutcome {
        let Submission {
            text,
            assistant,
            guard,
        } = self;

        match assistant.ask(&text).await {
            Ok(reply) => {
                debug!(length = reply.len(), "assistant replied");
                guard.complete(ChatMessage::assistant(reply));
                SubmitOutcome::Replied
            }
            Err(err) => {
                error!(error = %err, "assistant request failed");
                guard.complete(ChatMessage::assistant(APOLOGY));
                SubmitOutcome::Failed
            }
        }
    }
}

/// Closes the exchange with an apology if dropped before completing.
struct BusyGuard {
    state: SharedState,
    released: bool,
}

impl BusyGuard {
    /// Append the closing message and go idle under one lock, so nobody sees
    /// an idle session that is missing its reply.
    fn complete(mut self, message: ChatMessage) {
        let mut state = lock(&self.state);
        state.transcript.append(message);
        state.busy = false;
        drop(state);
        self.released = true;
    }
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        if !self.released {
            error!("assistant request ended without a reply");
            let mut state = lock(&self.state);
            state.transcript.append(ChatMessage::assistant(APOLOGY));
            state.busy = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AssistantError;
    use crate::state::ChatRole;
    use crate::transcript::GREETING;
    use async_trait::async_trait;
    use std::collections::VecDeque;
    use tokio::sync::Notify;

    /// Assistant that returns queued replies and records every request
    #[derive(Default)]
    struct ScriptedAssistant {
        replies: Mutex<VecDeque<Result<String, AssistantError>>>,
        requests: Mutex<Vec<String>>,
        gate: Option<Notify>,
    }

    impl ScriptedAssistant {
        fn replying(reply: &str) -> Self {
            let assistant = Self::default();
            assistant.queue(Ok(reply.to_string()));
            assistant
        }

        fn failing() -> Self {
            let assistant = Self::default();
            assistant.queue(Err(AssistantError::Status {
                status: 500,
                body: "agent invocation failed".to_string(),
            }));
            assistant
        }

        /// Replies are held until `release` is called
        fn gated(reply: &str) -> Self {
            let assistant = Self {
                gate: Some(Notify::new()),
                ..Self::default()
            };
            assistant.queue(Ok(reply.to_string()));
            assistant
        }

        fn queue(&self, reply: Result<String, AssistantError>) {
            self.replies.lock().unwrap().push_back(reply);
        }

        fn release(&self) {
            if let Some(gate) = &self.gate {
                gate.notify_one();
            }
        }

        fn requests(&self) -> Vec<String> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AssistantClient for ScriptedAssistant {
        async fn ask(&self, message: &str) -> Result<String, AssistantError> {
            self.requests.lock().unwrap().push(message.to_string());
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(AssistantError::InvalidResponse("no reply queued".into())))
        }
    }

    struct PanickingAssistant;

    #[async_trait]
    impl AssistantClient for PanickingAssistant {
        async fn ask(&self, _message: &str) -> Result<String, AssistantError> {
            panic!("assistant blew up");
        }
    }

    async fn wait_until_busy(session: &ChatSession) {
        while !session.is_busy() {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn test_successful_submission() {
        let assistant = Arc::new(ScriptedAssistant::replying("You have 3 projects."));
        let session = ChatSession::new(assistant.clone());

        let outcome = session.submit("Show me all my projects").await;

        assert_eq!(outcome, SubmitOutcome::Replied);
        assert!(!session.is_busy());

        let messages = session.snapshot();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, GREETING);
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(messages[1].content, "Show me all my projects");
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert_eq!(messages[2].content, "You have 3 projects.");
        assert_eq!(assistant.requests(), vec!["Show me all my projects"]);
    }

    #[tokio::test]
    async fn test_failed_call_appends_apology() {
        let session = ChatSession::new(Arc::new(ScriptedAssistant::failing()));

        let outcome = session.submit("Tell me about project 12345").await;

        assert_eq!(outcome, SubmitOutcome::Failed);
        assert!(!session.is_busy());

        let messages = session.snapshot();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert_eq!(messages[2].content, APOLOGY);
        assert!(!messages[2].content.contains("agent invocation failed"));
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let assistant = Arc::new(ScriptedAssistant::replying("unused"));
        let session = ChatSession::new(assistant.clone());

        for text in ["", "   ", "\n\t", ""] {
            assert_eq!(
                session.submit(text).await,
                SubmitOutcome::Rejected(Rejection::EmptyInput)
            );
        }

        assert_eq!(session.transcript_len(), 1);
        assert!(!session.is_busy());
        assert!(assistant.requests().is_empty());
    }

    #[tokio::test]
    async fn test_submission_while_busy_is_ignored() {
        let assistant = Arc::new(ScriptedAssistant::gated("reply to a"));
        let session = Arc::new(ChatSession::new(assistant.clone()));

        let first = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("a").await }
        });
        wait_until_busy(&session).await;

        // The user's message is visible while the call is still pending.
        let pending = session.snapshot();
        assert_eq!(pending.len(), 2);
        assert_eq!(pending[1].content, "a");

        assert_eq!(session.submit("b").await, SubmitOutcome::Rejected(Rejection::Busy));
        assert_eq!(session.transcript_len(), 2);
        assert!(session.is_busy());

        assistant.release();
        assert_eq!(first.await.unwrap(), SubmitOutcome::Replied);

        let contents: Vec<String> = session.snapshot().into_iter().map(|m| m.content).collect();
        assert_eq!(contents, vec![GREETING, "a", "reply to a"]);
        assert_eq!(assistant.requests(), vec!["a"]);
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_session_accepts_again_after_reply() {
        let assistant = Arc::new(ScriptedAssistant::default());
        assistant.queue(Err(AssistantError::InvalidResponse("garbled".into())));
        assistant.queue(Ok("Our hours are 8-5.".to_string()));
        let session = ChatSession::new(assistant.clone());

        assert_eq!(session.submit("hours?").await, SubmitOutcome::Failed);
        assert_eq!(session.submit("hours?").await, SubmitOutcome::Replied);

        let messages = session.snapshot();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[2].content, APOLOGY);
        assert_eq!(messages[4].content, "Our hours are 8-5.");
    }

    #[tokio::test]
    async fn test_text_is_sent_verbatim() {
        let assistant = Arc::new(ScriptedAssistant::replying("ok"));
        let session = ChatSession::new(assistant.clone());

        session.submit("  note:\nline two  ").await;

        assert_eq!(assistant.requests(), vec!["  note:\nline two  "]);
        assert_eq!(session.snapshot()[1].content, "  note:\nline two  ");
    }

    #[tokio::test]
    async fn test_input_cleared_when_submission_begins() {
        let assistant = Arc::new(ScriptedAssistant::gated("done"));
        let session = ChatSession::new(assistant.clone());
        session.set_input("What are your business hours?");

        let submission = session.begin(&session.input()).unwrap();
        assert_eq!(session.input(), "");
        assert!(session.is_busy());

        assistant.release();
        assert_eq!(submission.run().await, SubmitOutcome::Replied);
        assert_eq!(assistant.requests(), vec!["What are your business hours?"]);
    }

    #[tokio::test]
    async fn test_rejected_submission_keeps_input() {
        let session = ChatSession::new(Arc::new(ScriptedAssistant::default()));
        session.set_input("   ");

        assert_eq!(
            session.submit_input().await,
            SubmitOutcome::Rejected(Rejection::EmptyInput)
        );
        assert_eq!(session.input(), "   ");
    }

    #[tokio::test]
    async fn test_submit_input_uses_buffer() {
        let assistant = Arc::new(ScriptedAssistant::replying("sure"));
        let session = ChatSession::new(assistant.clone());
        session.with_input(|input| input.push_str("Tell me about project 12345"));

        assert_eq!(session.submit_input().await, SubmitOutcome::Replied);
        assert_eq!(assistant.requests(), vec!["Tell me about project 12345"]);
        assert_eq!(session.input(), "");
    }

    #[tokio::test]
    async fn test_dropped_submission_appends_apology() {
        let session = ChatSession::new(Arc::new(ScriptedAssistant::default()));

        let submission = session.begin("hello").unwrap();
        assert!(session.is_busy());
        drop(submission);

        assert!(!session.is_busy());
        let messages = session.snapshot();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].content, "hello");
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert_eq!(messages[2].content, APOLOGY);
    }

    #[tokio::test]
    async fn test_panicking_assistant_appends_apology() {
        let session = Arc::new(ChatSession::new(Arc::new(PanickingAssistant)));

        let result = tokio::spawn({
            let session = Arc::clone(&session);
            async move { session.submit("hello").await }
        })
        .await;

        assert!(result.is_err());
        assert!(!session.is_busy());

        let messages = session.snapshot();
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[1].role, ChatRole::User);
        assert_eq!(messages[2].role, ChatRole::Assistant);
        assert_eq!(messages[2].content, APOLOGY);

        // Still accepting new submissions afterwards
        assert_eq!(session.submit("").await, SubmitOutcome::Rejected(Rejection::EmptyInput));
    }
}
