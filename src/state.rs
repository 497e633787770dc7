//! UI-agnostic conversation state
//!
//! Everything the view renders lives in [`ChatState`]. The view never mutates
//! fields directly; it goes through the transition functions so the terminal
//! loop and the one-shot `ask` command see the same state machine.

use serde::{Deserialize, Serialize};

/// A single message in the conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: ChatRole,
    pub content: String,
}

impl ChatTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
        }
    }
}

/// The role of a chat message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    /// Label shown above each turn in the conversation pane
    pub fn label(&self) -> &'static str {
        match self {
            ChatRole::User => "USER",
            ChatRole::Assistant => "ASSISTANT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RequestStatus {
    #[default]
    Idle,
    InFlight,
}

/// Fixed turns used to eyeball the conversation layout without a network call
pub fn demo_turns() -> [ChatTurn; 4] {
    [
        ChatTurn::user("Explain gradient descent in simple terms."),
        ChatTurn::assistant("Gradient descent is an optimization algorithm that... (test)"),
        ChatTurn::user("Provide a 3-line Python example for linear regression."),
        ChatTurn::assistant(
            "import numpy as np\nfrom sklearn.linear_model import LinearRegression\n... (test)",
        ),
    ]
}

#[derive(Debug, Default)]
pub struct ChatState {
    turns: Vec<ChatTurn>,
    status: RequestStatus,
    last_error: Option<String>,
    api_key: String,
    prompt: String,
}

impl ChatState {
    /// Start a session seeded with the key found at startup (possibly empty)
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn status(&self) -> RequestStatus {
        self.status
    }

    pub fn is_in_flight(&self) -> bool {
        self.status == RequestStatus::InFlight
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn append_turn(&mut self, turn: ChatTurn) {
        self.turns.push(turn);
    }

    pub fn set_status(&mut self, status: RequestStatus) {
        self.status = status;
    }

    /// Replaces any previous error; only the latest one is kept.
    pub fn set_error(&mut self, message: impl Into<String>) {
        self.last_error = Some(message.into());
    }

    pub fn clear_error(&mut self) {
        self.last_error = None;
    }

    pub fn set_key(&mut self, key: impl Into<String>) {
        self.api_key = key.into();
    }

    pub fn set_prompt(&mut self, prompt: impl Into<String>) {
        self.prompt = prompt.into();
    }

    /// Empties the prompt field, handing back what was in it.
    pub fn take_prompt(&mut self) -> String {
        std::mem::take(&mut self.prompt)
    }

    pub fn inject_demo_turns(&mut self) {
        self.turns.extend(demo_turns());
    }
}
