//! Session runtime executor
//!
//! One task per session. It alone owns the session's context and state, so
//! the transcript never needs a lock.

use super::{Command, SessionSnapshot, SseEvent};
use crate::llm::LlmService;
use crate::state_machine::{transition, Effect, Event, SessionContext, SessionState};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio_util::sync::CancellationToken;

pub struct SessionRuntime {
    context: SessionContext,
    state: SessionState,
    created_at: DateTime<Utc>,
    llm: Arc<dyn LlmService>,
    command_rx: mpsc::Receiver<Command>,
    /// Gateway outcomes come back on their own channel
    gateway_tx: mpsc::Sender<Event>,
    gateway_rx: mpsc::Receiver<Event>,
    broadcast_tx: broadcast::Sender<SseEvent>,
    cancel: CancellationToken,
    next_request_id: u64,
}

impl SessionRuntime {
    pub fn new(
        context: SessionContext,
        llm: Arc<dyn LlmService>,
        command_rx: mpsc::Receiver<Command>,
        broadcast_tx: broadcast::Sender<SseEvent>,
        cancel: CancellationToken,
    ) -> Self {
        let (gateway_tx, gateway_rx) = mpsc::channel(4);
        Self {
            context,
            state: SessionState::Idle,
            created_at: Utc::now(),
            llm,
            command_rx,
            gateway_tx,
            gateway_rx,
            broadcast_tx,
            cancel,
            next_request_id: 1,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(session_id = %self.context.session_id, "Starting session runtime");

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => break,
                Some(event) = self.gateway_rx.recv() => {
                    if let Err(e) = self.process_event(event) {
                        tracing::error!(
                            session_id = %self.context.session_id,
                            error = %e,
                            "Error handling gateway event"
                        );
                    }
                }
                command = self.command_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => break,
                },
            }
        }

        tracing::info!(session_id = %self.context.session_id, "Session runtime stopped");
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::UserMessage { text, reply } => {
                let request_id = self.next_request_id;
                let result = self.process_event(Event::UserMessage { text, request_id });
                if result.is_ok() {
                    self.next_request_id += 1;
                }
                let _ = reply.send(result);
            }
            Command::Reset { reply } => {
                let result = self.process_event(Event::Reset).map(|()| self.snapshot());
                let _ = reply.send(result);
            }
            Command::Snapshot { reply } => {
                let _ = reply.send(self.snapshot());
            }
            Command::Subscribe { reply } => {
                let _ = reply.send((self.snapshot(), self.broadcast_tx.subscribe()));
            }
        }
    }

    fn process_event(
        &mut self,
        event: Event,
    ) -> Result<(), crate::state_machine::TransitionError> {
        let result = transition(&self.state, &self.context, event)?;
        self.state = result.new_state;
        for effect in result.effects {
            self.execute_effect(effect);
        }
        Ok(())
    }

    fn execute_effect(&mut self, effect: Effect) {
        match effect {
            Effect::AppendTurn(turn) => {
                self.context.transcript.append(turn.clone());
                let _ = self.broadcast_tx.send(SseEvent::Turn { turn });
            }
            Effect::ResetTranscript => {
                self.context.transcript.reset();
                tracing::info!(session_id = %self.context.session_id, "Transcript reset");
                let _ = self.broadcast_tx.send(SseEvent::Reset {
                    turns: self.context.transcript.all().to_vec(),
                });
            }
            Effect::RequestCompletion {
                request_id,
                request,
            } => {
                tracing::debug!(
                    session_id = %self.context.session_id,
                    request_id,
                    messages = request.messages.len(),
                    transcript_len = self.context.transcript.len(),
                    "Requesting completion"
                );
                let llm = self.llm.clone();
                let gateway_tx = self.gateway_tx.clone();
                tokio::spawn(async move {
                    let event = match llm.complete(&request).await {
                        Ok(response) => Event::GatewayReply {
                            request_id,
                            text: response.text,
                        },
                        Err(e) => Event::GatewayFailed {
                            request_id,
                            message: e.message,
                        },
                    };
                    // Receiver is gone once the session has ended
                    let _ = gateway_tx.send(event).await;
                });
            }
            Effect::NotifyStateChange(state) => {
                let _ = self.broadcast_tx.send(SseEvent::StateChange {
                    state: state.name().to_string(),
                });
            }
            Effect::NotifyError { message } => {
                tracing::warn!(
                    session_id = %self.context.session_id,
                    error = %message,
                    "Exchange failed"
                );
                let _ = self.broadcast_tx.send(SseEvent::Error { message });
            }
        }
    }

    fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            session_id: self.context.session_id.clone(),
            created_at: self.created_at,
            turns: self.context.transcript.all().to_vec(),
            awaiting_reply: self.state.is_awaiting_reply(),
        }
    }
}
