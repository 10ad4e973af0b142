use chrono::{DateTime, Local, Timelike};

use crate::format::{escape_html, format_bot_text};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

/// One turn of the conversation. Immutable once constructed; `markup` is the
/// display-safe rendering of `text` and is fixed at creation time.
#[derive(Debug, Clone)]
pub struct Message {
    pub role: Role,
    pub text: String,
    pub markup: String,
    pub timestamp: DateTime<Local>,
}

impl Message {
    /// A user turn. User input is escaped literally, never styled.
    pub fn user(text: &str) -> Self {
        Self {
            role: Role::User,
            text: text.to_string(),
            markup: escape_html(text),
            timestamp: Local::now(),
        }
    }

    /// A bot turn. Raw backend text goes through the sanitizer/formatter.
    pub fn bot(text: &str) -> Self {
        Self {
            role: Role::Bot,
            text: text.to_string(),
            markup: format_bot_text(text),
            timestamp: Local::now(),
        }
    }
}

/// Wall-clock rendering used next to each message: 12-hour clock with
/// zero-padded minutes, e.g. "3:07 PM". Hour 0 displays as 12.
pub fn format_clock<T: Timelike>(time: &T) -> String {
    let (is_pm, hour) = time.hour12();
    format!("{}:{:02} {}", hour, time.minute(), if is_pm { "PM" } else { "AM" })
}

/// Where rendered turns land. The transcript is the headless implementation;
/// the terminal layer is a pure view over it, so the controller never touches
/// a drawing surface directly.
pub trait RenderSurface {
    fn append_message(&mut self, message: Message);
    fn scroll_to_latest(&mut self);
}

/// Ordered, append-only log of turns for one session. Always retains at
/// least the initial greeting.
pub struct Transcript {
    messages: Vec<Message>,
    pinned: bool,
}

impl Transcript {
    pub fn new(greeting: Message) -> Self {
        Self {
            messages: vec![greeting],
            pinned: true,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Remove every turn except the initial greeting, preserving its
    /// original render.
    pub fn reset(&mut self) {
        self.messages.truncate(1);
        self.pinned = true;
    }

    /// Whether the view should stay glued to the newest entry. Manual
    /// scrolling releases the pin; every append re-takes it.
    pub fn pinned(&self) -> bool {
        self.pinned
    }

    pub fn release_pin(&mut self) {
        self.pinned = false;
    }
}

impl RenderSurface for Transcript {
    fn append_message(&mut self, message: Message) {
        self.messages.push(message);
        self.scroll_to_latest();
    }

    fn scroll_to_latest(&mut self) {
        self.pinned = true;
    }
}
