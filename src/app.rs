use ratatui::layout::Rect;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::KeySource;
use crate::controller::{self, Outcome};
use crate::groq::{GroqClient, GroqError, ParseOutcome};
use crate::state::{ChatState, ChatTurn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Prompt,
    ApiKey,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Text buffer with a cursor counted in characters, not bytes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputField {
    text: String,
    cursor: usize,
}

impl InputField {
    pub fn with_text(text: &str) -> Self {
        Self {
            text: text.to_string(),
            cursor: text.chars().count(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor < self.text.chars().count() {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.text.chars().count());
    }

    pub fn home(&mut self) {
        self.cursor = 0;
    }

    pub fn end(&mut self) {
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// (row, column) of the cursor, counting embedded newlines
    pub fn cursor_row_col(&self) -> (usize, usize) {
        let before: String = self.text.chars().take(self.cursor).collect();
        let row = before.matches('\n').count();
        let col = before.rsplit('\n').next().map_or(0, |line| line.chars().count());
        (row, col)
    }
}

/// Rendered height of the conversation, mirroring what `ui` draws.
///
/// Per turn: a role line, the wrapped content lines, a blank separator.
pub fn chat_line_count(turns: &[ChatTurn], wrap_width: usize, in_flight: bool) -> u16 {
    let wrap_width = wrap_width.max(1);
    let mut total_lines: u16 = 0;

    for turn in turns {
        total_lines = total_lines.saturating_add(1);
        for line in turn.content.split('\n') {
            let char_count = line.chars().count();
            let wrapped = if char_count == 0 { 1 } else { char_count.div_ceil(wrap_width) };
            total_lines = total_lines.saturating_add(wrapped as u16);
        }
        total_lines = total_lines.saturating_add(1);
    }

    if in_flight {
        total_lines = total_lines.saturating_add(2);
    }

    total_lines
}

pub struct App {
    pub should_quit: bool,
    pub focus: FocusPane,

    pub state: ChatState,
    pub prompt_input: InputField,
    pub key_input: InputField,
    /// Set when a key was found at startup; drives the key field placeholder
    pub key_source: Option<KeySource>,

    pub client: GroqClient,
    pub query_task: Option<JoinHandle<Result<ParseOutcome, GroqError>>>,

    // Conversation viewport, updated during render
    pub chat_scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,
    pub chat_area: Option<Rect>,

    pub animation_frame: u8, // 0-2 for ellipsis animation
}

impl App {
    pub fn new(state: ChatState, key_source: Option<KeySource>, client: GroqClient) -> Self {
        let key_input = InputField::with_text(state.api_key());
        let prompt_input = InputField::with_text(state.prompt());

        Self {
            should_quit: false,
            focus: FocusPane::Prompt,
            state,
            prompt_input,
            key_input,
            key_source,
            client,
            query_task: None,
            chat_scroll: 0,
            chat_height: 0,
            chat_width: 0,
            chat_area: None,
            animation_frame: 0,
        }
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Prompt => FocusPane::ApiKey,
            FocusPane::ApiKey => FocusPane::Prompt,
        };
    }

    /// Apply an edit to whichever field has focus and push the result into the state.
    pub fn edit_focused(&mut self, edit: impl FnOnce(&mut InputField)) {
        match self.focus {
            FocusPane::Prompt => {
                edit(&mut self.prompt_input);
                self.state.set_prompt(self.prompt_input.text());
            }
            FocusPane::ApiKey => {
                edit(&mut self.key_input);
                self.state.set_key(self.key_input.text());
            }
        }
    }

    pub fn clear_key(&mut self) {
        self.key_input.clear();
        self.state.set_key("");
        info!("session key cleared");
    }

    pub fn can_send(&self) -> bool {
        !self.state.is_in_flight() && self.query_task.is_none()
    }

    /// Send the current prompt on a background task. No-op while a request is out.
    pub fn submit_prompt(&mut self) {
        if !self.can_send() {
            return;
        }

        if let Ok(Some(pending)) = controller::begin(&mut self.state) {
            let client = self.client.clone();
            self.query_task = Some(tokio::spawn(async move { pending.send(&client).await }));
            self.scroll_chat_to_bottom();
        }

        if self.state.prompt().is_empty() {
            self.prompt_input.clear();
        }
    }

    /// Fold a finished request back into the state. Returns `None` while it is still running.
    pub async fn poll_query_task(&mut self) -> Option<Outcome> {
        if !self.query_task.as_ref().is_some_and(|task| task.is_finished()) {
            return None;
        }

        let task = self.query_task.take()?;
        let result = match task.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "request task did not complete");
                Err(GroqError::Network(e.to_string()))
            }
        };

        let outcome = controller::complete(&mut self.state, result);
        self.scroll_chat_to_bottom();
        Some(outcome)
    }

    pub fn inject_demo_turns(&mut self) {
        self.state.inject_demo_turns();
        self.scroll_chat_to_bottom();
    }

    pub fn key_placeholder(&self) -> &'static str {
        if self.key_source.is_some() {
            "Using build-time API key (hidden)"
        } else {
            "Paste Groq API key here (for dev only)"
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.state.is_in_flight() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    fn max_chat_scroll(&self) -> u16 {
        // Before the first render the viewport size is unknown; assume a small pane
        let wrap_width = if self.chat_width > 0 { self.chat_width as usize } else { 50 };
        let visible_height = if self.chat_height > 0 { self.chat_height } else { 20 };

        chat_line_count(self.state.turns(), wrap_width, self.state.is_in_flight())
            .saturating_sub(visible_height)
    }

    /// Scroll chat to bottom so the newest turn (or "Thinking...") is visible
    pub fn scroll_chat_to_bottom(&mut self) {
        self.chat_scroll = self.max_chat_scroll();
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.max_chat_scroll());
    }

    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
    }
}
