//! Submit lifecycle: validate, append the user turn, call the API, record the reply.
//!
//! The lifecycle is split in two halves so the terminal UI can run the HTTP
//! call on a background task and keep drawing in between. [`submit`] glues
//! the halves together for callers that can simply await.

use tracing::{debug, info, warn};

use crate::groq::{GroqClient, GroqError, ParseOutcome};
use crate::state::{ChatState, ChatTurn, RequestStatus};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("Missing Groq API key. Paste it in the box or use a backend proxy.")]
    MissingKey,
    #[error(transparent)]
    Request(#[from] GroqError),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Prompt was blank after trimming; nothing changed.
    Ignored,
    Replied,
    Failed(SubmitError),
}

/// A request that passed validation and is ready to go over the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRequest {
    pub prompt: String,
    pub api_key: String,
}

impl PendingRequest {
    pub async fn send(self, client: &GroqClient) -> Result<ParseOutcome, GroqError> {
        client.complete(&self.api_key, &self.prompt).await
    }
}

/// First half of a submit.
///
/// Returns `Ok(None)` for a blank prompt, leaving the state untouched. On
/// success the user turn is already appended and the status is InFlight.
pub fn begin(state: &mut ChatState) -> Result<Option<PendingRequest>, SubmitError> {
    let prompt = state.prompt().trim().to_string();
    if prompt.is_empty() {
        return Ok(None);
    }

    state.clear_error();
    if state.api_key().is_empty() {
        let err = SubmitError::MissingKey;
        warn!("submit without an API key");
        state.set_error(err.to_string());
        return Err(err);
    }

    state.append_turn(ChatTurn::user(prompt.clone()));
    state.take_prompt();
    state.set_status(RequestStatus::InFlight);
    debug!(turns = state.turns().len(), "request in flight");

    Ok(Some(PendingRequest {
        prompt,
        api_key: state.api_key().to_string(),
    }))
}

/// Second half of a submit. Always returns the status to Idle.
pub fn complete(state: &mut ChatState, result: Result<ParseOutcome, GroqError>) -> Outcome {
    let outcome = match result {
        Ok(reply) => {
            if let ParseOutcome::Fallback(_) = reply {
                info!("reply text not found, showing raw payload");
            }
            state.append_turn(ChatTurn::assistant(reply.into_text()));
            Outcome::Replied
        }
        Err(e) => {
            warn!(error = %e, "request failed");
            let err = SubmitError::from(e);
            state.set_error(err.to_string());
            Outcome::Failed(err)
        }
    };

    state.set_status(RequestStatus::Idle);
    outcome
}

pub async fn submit(state: &mut ChatState, client: &GroqClient) -> Outcome {
    let pending = match begin(state) {
        Ok(Some(pending)) => pending,
        Ok(None) => return Outcome::Ignored,
        Err(e) => return Outcome::Failed(e),
    };

    let result = pending.send(client).await;
    complete(state, result)
}
