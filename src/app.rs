use anyhow::Result;
use tokio::task::JoinHandle;

use crate::backend::{BackendClient, ChatReply};
use crate::transcript::{Message, RenderSurface, Transcript};

pub const ERROR_PREFIX: &str = "Sorry, I ran into an error: ";
pub const CONNECTION_FAILURE: &str =
    "Sorry, I couldn't reach the server. Please check that the backend is running and try again.";
pub const OFFLINE_WARNING: &str =
    "Warning: the backend server appears to be disconnected. Messages may not get a response until it is back online.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

/// Two-state typing affordance, driven entirely by the request lifecycle.
/// Both transitions are idempotent.
#[derive(Default)]
pub struct TypingIndicator {
    active: bool,
}

impl TypingIndicator {
    pub fn activate(&mut self) {
        self.active = true;
    }

    pub fn deactivate(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }
}

pub struct App {
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub input: String,
    pub input_cursor: usize,

    pub transcript: Transcript,
    pub typing: TypingIndicator,

    pub backend: BackendClient,
    pub pending_reply: Option<JoinHandle<Result<ChatReply>>>,
    pub pending_probe: Option<JoinHandle<Result<String>>>,

    pub bot_name: String,
    pub docs_url: String,

    // Scroll offset used when the transcript pin is released; the view
    // recomputes it while pinned.
    pub scroll: u16,
    pub chat_height: u16,
    pub chat_width: u16,

    pub animation_frame: u8,
    pub status_message: Option<String>,
}

impl App {
    pub fn new(backend: BackendClient, greeting: Message, bot_name: String, docs_url: String) -> Self {
        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            input: String::new(),
            input_cursor: 0,
            transcript: Transcript::new(greeting),
            typing: TypingIndicator::default(),
            backend,
            pending_reply: None,
            pending_probe: None,
            bot_name,
            docs_url,
            scroll: 0,
            chat_height: 0,
            chat_width: 0,
            animation_frame: 0,
            status_message: None,
        }
    }

    fn render_user(&mut self, text: &str) {
        self.transcript.append_message(Message::user(text));
    }

    fn render_bot(&mut self, text: &str) {
        self.transcript.append_message(Message::bot(text));
    }

    /// Guarded submit transition. Empty or whitespace-only input is rejected
    /// with no visible effect, as is a submit while a request is pending.
    /// On acceptance the user turn is rendered synchronously, the input is
    /// cleared, and the indicator goes active; the caller dispatches the
    /// returned text to the backend.
    pub fn begin_submit(&mut self) -> Option<String> {
        if self.input.trim().is_empty() || self.pending_reply.is_some() {
            return None;
        }

        let text = self.input.clone();
        self.render_user(&text);
        self.input.clear();
        self.input_cursor = 0;
        self.typing.activate();
        Some(text)
    }

    /// Completion transition: back to idle on success and failure alike.
    pub fn finish_exchange(&mut self, outcome: Result<ChatReply>) {
        self.typing.deactivate();

        match outcome {
            Ok(ChatReply::Response(text)) => self.render_bot(&text),
            Ok(ChatReply::Error(detail)) => {
                let text = format!("{}{}", ERROR_PREFIX, detail);
                self.render_bot(&text);
            }
            Err(e) => {
                tracing::error!(error = %e, "chat exchange failed");
                self.render_bot(CONNECTION_FAILURE);
            }
        }
    }

    /// Startup connectivity probe outcome. A non-nominal status or a failed
    /// probe injects a single bot warning; the chat stays usable either way.
    pub fn apply_probe(&mut self, outcome: Result<String>) {
        match outcome {
            Ok(status) if status == "connected" => {
                tracing::info!("backend connected");
                self.status_message = Some("Connected".to_string());
            }
            Ok(status) => {
                tracing::warn!(%status, "backend reported non-nominal status");
                self.render_bot(OFFLINE_WARNING);
            }
            Err(e) => {
                tracing::warn!(error = %e, "connectivity probe failed");
                self.render_bot(OFFLINE_WARNING);
            }
        }
    }

    /// Clear the session back to the initial greeting. Leaves the typing
    /// indicator and any in-flight request alone; a late reply renders into
    /// the shortened transcript.
    pub fn clear_chat(&mut self) {
        self.transcript.reset();
        self.scroll = 0;
        self.status_message = Some("Chat cleared".to_string());
    }

    pub fn scroll_up(&mut self) {
        self.transcript.release_pin();
        self.scroll = self.scroll.saturating_sub(1);
    }

    pub fn scroll_down(&mut self) {
        self.scroll = self.scroll.saturating_add(1);
    }

    pub fn tick_animation(&mut self) {
        if self.typing.is_active() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}
