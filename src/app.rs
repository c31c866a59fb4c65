use std::sync::Arc;
use tokio::task::JoinHandle;
use unicode_width::UnicodeWidthStr;

use crate::client::{ChatBackend, ChatRequest, ChatResponse, ClientError};
use crate::message::Message;
use crate::preferences::{PreferenceStore, Theme};

/// Shown in place of a reply whenever a turn fails for any reason
pub const SEND_ERROR_MESSAGE: &str = "Sorry, I encountered an error. Please try again.";

/// Tabs become this many spaces, both in the input and in the transcript
pub const TAB_WIDTH: usize = 4;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

struct PendingReply {
    generation: u64,
    handle: JoinHandle<Result<ChatResponse, ClientError>>,
}

pub struct App {
    pub should_quit: bool,

    // Conversation state
    pub messages: Vec<Message>,
    pub conversation_id: Option<String>,

    // Input state
    pub input: String,
    pub input_cursor: usize, // cursor position in input, in chars
    pub loading: bool,

    pub theme: Theme,

    // Chat view state
    pub chat_scroll: u16,
    pub chat_max_scroll: u16,
    pub follow_tail: bool,
    pub chat_height: u16, // Inner height of the chat pane, set during render

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    backend: Arc<dyn ChatBackend>,
    preferences: Box<dyn PreferenceStore>,
    pending: Option<PendingReply>,
    // Bumped on reset so replies for a discarded conversation can be dropped
    generation: u64,
}

impl App {
    pub fn new(backend: Arc<dyn ChatBackend>, preferences: Box<dyn PreferenceStore>) -> Self {
        let theme = Theme::load(preferences.as_ref());
        tracing::debug!(theme = theme.as_str(), "restored theme");

        Self {
            should_quit: false,

            messages: Vec::new(),
            conversation_id: None,

            input: String::new(),
            input_cursor: 0,
            loading: false,

            theme,

            chat_scroll: 0,
            chat_max_scroll: 0,
            follow_tail: true,
            chat_height: 0,

            animation_frame: 0,

            backend,
            preferences,
            pending: None,
            generation: 0,
        }
    }

    /// Whether the send control is enabled
    pub fn can_send(&self) -> bool {
        !self.loading && !self.input.trim().is_empty()
    }

    /// Start a turn with the current input. Returns false when the send was
    /// rejected (blank input or a request already in flight).
    pub fn submit(&mut self) -> bool {
        if !self.can_send() {
            return false;
        }

        let text = std::mem::take(&mut self.input);
        self.input_cursor = 0;
        self.push_message(Message::user(text.clone()));
        self.loading = true;

        let request = ChatRequest {
            message: text,
            conversation_id: self.conversation_id.clone(),
        };
        let backend = Arc::clone(&self.backend);
        let handle = tokio::spawn(async move { backend.send(request).await });

        self.pending = Some(PendingReply {
            generation: self.generation,
            handle,
        });
        true
    }

    /// Collect the reply if the request task has finished; never blocks
    pub async fn poll_reply(&mut self) {
        let finished = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.handle.is_finished());

        if finished {
            self.wait_for_reply().await;
        }
    }

    /// Wait for the outstanding request, if any, and apply its outcome
    pub async fn wait_for_reply(&mut self) {
        let Some(pending) = self.pending.take() else {
            return;
        };

        let outcome = match pending.handle.await {
            Ok(result) => result,
            Err(e) => Err(ClientError::Task(e)),
        };
        self.finish_send(pending.generation, outcome);
    }

    fn finish_send(&mut self, generation: u64, outcome: Result<ChatResponse, ClientError>) {
        // Cleared first so no exit path below can leave it set
        self.loading = false;

        if generation != self.generation {
            tracing::debug!("dropping reply for a conversation that was reset");
            return;
        }

        match outcome {
            Ok(reply) => {
                if self.conversation_id.as_deref() != Some(reply.conversation_id.as_str()) {
                    tracing::info!(conversation_id = %reply.conversation_id, "adopted conversation id");
                }
                self.conversation_id = Some(reply.conversation_id);
                self.push_message(Message::assistant(reply.response));
            }
            Err(e) => {
                tracing::warn!(error = %e, "chat request failed");
                self.push_message(Message::assistant(SEND_ERROR_MESSAGE));
            }
        }
    }

    /// Start over locally. A request still in flight keeps the loading gate
    /// closed until it resolves, but its reply is discarded.
    pub fn new_conversation(&mut self) {
        self.messages.clear();
        self.conversation_id = None;
        self.input.clear();
        self.input_cursor = 0;
        self.generation += 1;
        self.chat_scroll = 0;
        self.follow_tail = true;
        tracing::info!("started new conversation");
    }

    pub fn toggle_theme(&mut self) {
        self.theme = self.theme.toggled();
        if let Err(e) = self.theme.save(self.preferences.as_mut()) {
            tracing::warn!(error = %e, "failed to persist theme");
        }
    }

    /// Load an existing conversation from the backend
    pub async fn resume(&mut self, conversation_id: &str) -> Result<(), ClientError> {
        let record = self.backend.fetch_conversation(conversation_id).await?;
        tracing::info!(
            conversation_id = %record.conversation_id,
            messages = record.messages.len(),
            "resumed conversation"
        );

        self.messages = record.messages;
        self.conversation_id = Some(record.conversation_id);
        self.follow_tail = true;
        Ok(())
    }

    fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        self.follow_tail = true;
    }

    // Input editing
    pub fn insert_char(&mut self, c: char) {
        if c == '\t' {
            for _ in 0..TAB_WIDTH {
                self.insert_char(' ');
            }
            return;
        }

        let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
        self.input.insert(byte_pos, c);
        self.input_cursor += 1;
    }

    pub fn insert_newline(&mut self) {
        self.insert_char('\n');
    }

    /// Insert pasted text as-is at the cursor. Line endings are normalised
    /// to `\n` and nothing is sent.
    pub fn insert_str(&mut self, text: &str) {
        let text = text.replace("\r\n", "\n").replace('\r', "\n");
        for c in text.chars() {
            self.insert_char(c);
        }
    }

    pub fn backspace(&mut self) {
        if self.input_cursor > 0 {
            self.input_cursor -= 1;
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        if self.input_cursor < self.input.chars().count() {
            let byte_pos = char_to_byte_index(&self.input, self.input_cursor);
            self.input.remove(byte_pos);
        }
    }

    pub fn cursor_left(&mut self) {
        self.input_cursor = self.input_cursor.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        let char_count = self.input.chars().count();
        self.input_cursor = (self.input_cursor + 1).min(char_count);
    }

    pub fn cursor_home(&mut self) {
        self.input_cursor = 0;
    }

    pub fn cursor_end(&mut self) {
        self.input_cursor = self.input.chars().count();
    }

    /// Row and terminal column of the input cursor, counting newlines in the buffer
    pub fn input_cursor_position(&self) -> (usize, usize) {
        let before = &self.input[..char_to_byte_index(&self.input, self.input_cursor)];
        let row = before.matches('\n').count();
        let col = before.rsplit('\n').next().map(UnicodeWidthStr::width).unwrap_or(0);
        (row, col)
    }

    // Chat scrolling
    pub fn scroll_up(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_sub(lines);
        self.follow_tail = self.chat_scroll >= self.chat_max_scroll;
    }

    pub fn scroll_down(&mut self, lines: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(lines).min(self.chat_max_scroll);
        self.follow_tail = self.chat_scroll >= self.chat_max_scroll;
    }

    pub fn scroll_page_up(&mut self) {
        self.scroll_up(self.chat_height.max(2) / 2);
    }

    pub fn scroll_page_down(&mut self) {
        self.scroll_down(self.chat_height.max(2) / 2);
    }

    /// Called by the renderer once it knows how tall the transcript is
    pub fn update_chat_viewport(&mut self, total_lines: u16, visible_height: u16) {
        self.chat_height = visible_height;
        self.chat_max_scroll = total_lines.saturating_sub(visible_height);

        if self.follow_tail {
            self.chat_scroll = self.chat_max_scroll;
        } else {
            self.chat_scroll = self.chat_scroll.min(self.chat_max_scroll);
        }
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.loading {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn quit(&mut self) {
        self.should_quit = true;
    }
}
