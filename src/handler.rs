use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::{App, InputMode};
use crate::transcript::RenderSurface;
use crate::tui::AppEvent;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => {
            handle_mouse(app, mouse);
            Ok(())
        }
        AppEvent::Tick => {
            app.tick_animation();
            Ok(())
        }
    }
}

fn handle_key(app: &mut App, key: KeyEvent) -> Result<()> {
    // Global keys that work in any mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return Ok(());
            }
            KeyCode::Char('l') => {
                app.clear_chat();
                return Ok(());
            }
            KeyCode::Char('o') => {
                open_docs(&app.docs_url);
                app.status_message = Some("Opening documentation".to_string());
                return Ok(());
            }
            _ => {}
        }
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }

    Ok(())
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => app.should_quit = true,

        KeyCode::Char('j') | KeyCode::Down => app.scroll_down(),
        KeyCode::Char('k') | KeyCode::Up => app.scroll_up(),
        KeyCode::Char('g') => {
            app.transcript.release_pin();
            app.scroll = 0;
        }
        KeyCode::Char('G') => app.transcript.scroll_to_latest(),

        // Back to composing
        KeyCode::Char('i') | KeyCode::Enter => {
            app.input_mode = InputMode::Editing;
            app.input_cursor = app.input.chars().count();
        }

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        // The single confirm action; begin_submit rejects blank input and
        // submissions while a reply is still pending.
        KeyCode::Enter => {
            if let Some(text) = app.begin_submit() {
                let backend = app.backend.clone();
                app.pending_reply = Some(tokio::spawn(async move {
                    backend.send_message(&text).await
                }));
            }
        }
        KeyCode::Backspace => {
            if app.input_cursor > 0 {
                app.input_cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.input_cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.input_cursor = app.input_cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.input_cursor = (app.input_cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.input.chars().count();
        }
        KeyCode::Up => app.scroll_up(),
        KeyCode::Down => app.scroll_down(),
        // Unhandled control chords must not type their base character.
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            let byte_pos = char_to_byte_index(&app.input, app.input_cursor);
            app.input.insert(byte_pos, c);
            app.input_cursor += 1;
        }
        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollDown => {
            app.scroll_down();
            app.scroll_down();
            app.scroll_down();
        }
        MouseEventKind::ScrollUp => {
            app.scroll_up();
            app.scroll_up();
            app.scroll_up();
        }
        _ => {}
    }
}

/// Open the documentation page in the system browser. Pure navigation side
/// effect; failures only surface in the log.
fn open_docs(url: &str) {
    use std::process::Command;

    #[cfg(target_os = "macos")]
    let opener = "open";
    #[cfg(not(target_os = "macos"))]
    let opener = "xdg-open";

    if let Err(e) = Command::new(opener).arg(url).spawn() {
        tracing::warn!(error = %e, %url, "could not open documentation");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendClient;
    use crate::transcript::Message;

    fn test_app() -> App {
        App::new(
            BackendClient::new("http://localhost:5000"),
            Message::bot("Hello! How can I help?"),
            "Service Desk Assistant".to_string(),
            "http://localhost:5000/docs".to_string(),
        )
    }

    #[test]
    fn char_index_maps_to_byte_index() {
        let s = "héllo";
        assert_eq!(char_to_byte_index(s, 0), 0);
        assert_eq!(char_to_byte_index(s, 2), 3);
        assert_eq!(char_to_byte_index(s, 10), s.len());
    }

    #[test]
    fn control_chords_do_not_type_characters() {
        let mut app = test_app();

        handle_key(&mut app, KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL)).unwrap();
        assert!(app.input.is_empty());

        handle_key(&mut app, KeyEvent::new(KeyCode::Char('a'), KeyModifiers::NONE)).unwrap();
        assert_eq!(app.input, "a");
    }

    #[test]
    fn clear_chord_resets_the_transcript_from_editing_mode() {
        let mut app = test_app();
        app.input = "hello".to_string();
        app.begin_submit().unwrap();
        assert_eq!(app.transcript.len(), 2);

        handle_key(&mut app, KeyEvent::new(KeyCode::Char('l'), KeyModifiers::CONTROL)).unwrap();
        assert_eq!(app.transcript.len(), 1);
        assert!(app.input.is_empty());
    }
}
