//! Runtime for live chat sessions
//!
//! Each session runs as its own task with an isolated transcript; the
//! manager only maps session ids to channel handles.

mod executor;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;

use crate::conversation::{PromptAssembler, Turn};
use crate::llm::LlmService;
use crate::state_machine::{GenerationSettings, SessionContext, TransitionError};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::{broadcast, mpsc, oneshot, RwLock};
use tokio_util::sync::CancellationToken;

/// Requests from the HTTP layer to a session task
#[derive(Debug)]
pub enum Command {
    UserMessage {
        text: String,
        reply: oneshot::Sender<Result<(), TransitionError>>,
    },
    Reset {
        reply: oneshot::Sender<Result<SessionSnapshot, TransitionError>>,
    },
    Snapshot {
        reply: oneshot::Sender<SessionSnapshot>,
    },
    /// Snapshot and subscription are taken together so no update falls
    /// between them
    Subscribe {
        reply: oneshot::Sender<(SessionSnapshot, broadcast::Receiver<SseEvent>)>,
    },
}

/// Events sent to SSE clients
#[derive(Debug, Clone)]
pub enum SseEvent {
    Init { snapshot: SessionSnapshot },
    Turn { turn: Turn },
    Reset { turns: Vec<Turn> },
    StateChange { state: String },
    Error { message: String },
}

/// Point-in-time view of a session
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub session_id: String,
    pub created_at: DateTime<Utc>,
    pub turns: Vec<Turn>,
    pub awaiting_reply: bool,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session not found: {0}")]
    NotFound(String),
    #[error(transparent)]
    Rejected(#[from] TransitionError),
    #[error("Session has shut down")]
    Closed,
}

/// Handle to interact with a running session
#[derive(Clone)]
struct SessionHandle {
    command_tx: mpsc::Sender<Command>,
    cancel: CancellationToken,
    last_active: Arc<Mutex<Instant>>,
}

impl SessionHandle {
    fn touch(&self) {
        if let Ok(mut last) = self.last_active.lock() {
            *last = Instant::now();
        }
    }

    fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .map_or(Duration::ZERO, |last| last.elapsed())
    }
}

/// Manager for all session runtimes
pub struct SessionManager {
    llm: Arc<dyn LlmService>,
    system_instruction: Arc<str>,
    assembler: PromptAssembler,
    settings: GenerationSettings,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionManager {
    pub fn new(
        llm: Arc<dyn LlmService>,
        system_instruction: Arc<str>,
        assembler: PromptAssembler,
        settings: GenerationSettings,
    ) -> Self {
        Self {
            llm,
            system_instruction,
            assembler,
            settings,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn model_id(&self) -> &str {
        self.llm.model_id()
    }

    pub fn settings(&self) -> GenerationSettings {
        self.settings
    }

    pub fn assembler(&self) -> PromptAssembler {
        self.assembler
    }

    /// Start a new session seeded with the welcome greeting
    pub async fn create_session(&self) -> Result<SessionSnapshot, SessionError> {
        let session_id = uuid::Uuid::new_v4().to_string();
        let context = SessionContext::new(
            &session_id,
            self.system_instruction.clone(),
            self.assembler,
            self.settings,
        );

        let (command_tx, command_rx) = mpsc::channel(32);
        let (broadcast_tx, _) = broadcast::channel(128);
        let cancel = CancellationToken::new();

        let runtime = SessionRuntime::new(
            context,
            self.llm.clone(),
            command_rx,
            broadcast_tx,
            cancel.clone(),
        );
        tokio::spawn(runtime.run());

        let handle = SessionHandle {
            command_tx,
            cancel,
            last_active: Arc::new(Mutex::new(Instant::now())),
        };
        self.sessions
            .write()
            .await
            .insert(session_id.clone(), handle);

        tracing::info!(session_id = %session_id, "Session created");
        self.snapshot(&session_id).await
    }

    /// Queue a user turn. Returns once the turn is accepted; the reply
    /// arrives over the session's event stream.
    pub async fn send_message(&self, session_id: &str, text: String) -> Result<(), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(session_id, Command::UserMessage { text, reply }, rx)
            .await?
            .map_err(SessionError::from)
    }

    pub async fn reset(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(session_id, Command::Reset { reply }, rx)
            .await?
            .map_err(SessionError::from)
    }

    pub async fn snapshot(&self, session_id: &str) -> Result<SessionSnapshot, SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(session_id, Command::Snapshot { reply }, rx).await
    }

    pub async fn subscribe(
        &self,
        session_id: &str,
    ) -> Result<(SessionSnapshot, broadcast::Receiver<SseEvent>), SessionError> {
        let (reply, rx) = oneshot::channel();
        self.request(session_id, Command::Subscribe { reply }, rx).await
    }

    /// End a session, discarding its transcript
    pub async fn end_session(&self, session_id: &str) -> Result<(), SessionError> {
        let handle = self
            .sessions
            .write()
            .await
            .remove(session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        handle.cancel.cancel();
        tracing::info!(session_id = %session_id, "Session ended");
        Ok(())
    }

    /// End every session that has seen no request for `max_idle`
    pub async fn sweep_idle(&self, max_idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|session_id, handle| {
            let keep = handle.idle_for() < max_idle && !handle.command_tx.is_closed();
            if !keep {
                handle.cancel.cancel();
                tracing::info!(session_id = %session_id, "Idle session expired");
            }
            keep
        });
        before - sessions.len()
    }

    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    async fn handle(&self, session_id: &str) -> Result<SessionHandle, SessionError> {
        let handle = self
            .sessions
            .read()
            .await
            .get(session_id)
            .cloned()
            .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
        handle.touch();
        Ok(handle)
    }

    async fn request<T>(
        &self,
        session_id: &str,
        command: Command,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, SessionError> {
        let handle = self.handle(session_id).await?;
        handle
            .command_tx
            .send(command)
            .await
            .map_err(|_| SessionError::Closed)?;
        rx.await.map_err(|_| SessionError::Closed)
    }
}
