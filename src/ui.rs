use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, InputMode};
use crate::transcript::{format_clock, Role};

#[derive(Default, Clone, Copy)]
struct SpanState {
    bold: bool,
    italic: bool,
    code: bool,
    heading: bool,
}

impl SpanState {
    fn style(&self) -> Style {
        let mut style = Style::default();
        if self.heading {
            style = style.fg(Color::Cyan).add_modifier(Modifier::BOLD);
        }
        if self.bold {
            style = style.add_modifier(Modifier::BOLD);
        }
        if self.italic {
            style = style.add_modifier(Modifier::ITALIC);
        }
        if self.code {
            style = style.fg(Color::Yellow);
        }
        style
    }
}

/// Turn the sanitizer's safe markup back into styled terminal lines. Only the
/// tags and entities the formatter emits are recognized; anything else is
/// rendered literally.
fn markup_to_lines(markup: &str) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut spans: Vec<Span<'static>> = Vec::new();
    let mut current = String::new();
    let mut state = SpanState::default();

    fn flush_span(current: &mut String, spans: &mut Vec<Span<'static>>, state: &SpanState) {
        if !current.is_empty() {
            spans.push(Span::styled(std::mem::take(current), state.style()));
        }
    }

    fn flush_line(
        current: &mut String,
        spans: &mut Vec<Span<'static>>,
        lines: &mut Vec<Line<'static>>,
        state: &SpanState,
    ) {
        flush_span(current, spans, state);
        lines.push(Line::from(std::mem::take(spans)));
    }

    let mut chars = markup.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '<' => {
                let mut tag = String::new();
                for t in chars.by_ref() {
                    if t == '>' {
                        break;
                    }
                    tag.push(t);
                }
                match tag.as_str() {
                    "strong" => {
                        flush_span(&mut current, &mut spans, &state);
                        state.bold = true;
                    }
                    "/strong" => {
                        flush_span(&mut current, &mut spans, &state);
                        state.bold = false;
                    }
                    "em" => {
                        flush_span(&mut current, &mut spans, &state);
                        state.italic = true;
                    }
                    "/em" => {
                        flush_span(&mut current, &mut spans, &state);
                        state.italic = false;
                    }
                    "code" => {
                        flush_span(&mut current, &mut spans, &state);
                        state.code = true;
                    }
                    "/code" => {
                        flush_span(&mut current, &mut spans, &state);
                        state.code = false;
                    }
                    "br" => {
                        flush_line(&mut current, &mut spans, &mut lines, &state);
                    }
                    // Headings occupy a line of their own.
                    t if t.starts_with("div") => {
                        if !current.is_empty() || !spans.is_empty() {
                            flush_line(&mut current, &mut spans, &mut lines, &state);
                        }
                        state.heading = true;
                    }
                    "/div" => {
                        flush_line(&mut current, &mut spans, &mut lines, &state);
                        state.heading = false;
                    }
                    _ => {
                        current.push('<');
                        current.push_str(&tag);
                        current.push('>');
                    }
                }
            }
            '&' => {
                let mut entity = String::new();
                while entity.len() < 5 {
                    match chars.peek() {
                        Some(&';') => {
                            chars.next();
                            break;
                        }
                        Some(&e) => {
                            entity.push(e);
                            chars.next();
                        }
                        None => break,
                    }
                }
                match entity.as_str() {
                    "amp" => current.push('&'),
                    "lt" => current.push('<'),
                    "gt" => current.push('>'),
                    "quot" => current.push('"'),
                    other => {
                        current.push('&');
                        current.push_str(other);
                    }
                }
            }
            _ => current.push(c),
        }
    }

    if !current.is_empty() || !spans.is_empty() {
        flush_line(&mut current, &mut spans, &mut lines, &state);
    }
    if lines.is_empty() {
        lines.push(Line::default());
    }
    lines
}

/// Rows a line occupies after word wrapping at `width`, counted the way the
/// paragraph widget wraps: greedily word by word, with over-long words
/// spilling across rows. Keeps the pinned scroll glued to the newest entry.
fn wrapped_line_count(line: &Line, width: usize) -> usize {
    if width == 0 {
        return 1;
    }
    let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect::<String>();

    let mut rows = 1;
    let mut used = 0;
    for word in text.split_whitespace() {
        let len = word.chars().count();
        if len > width {
            if used > 0 {
                rows += 1;
            }
            rows += (len - 1) / width;
            used = (len - 1) % width + 1;
        } else if used == 0 {
            used = len;
        } else if used + 1 + len <= width {
            used += 1 + len;
        } else {
            rows += 1;
            used = len;
        }
    }
    rows
}

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, chat_area, input_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let mut spans = vec![Span::styled(
        format!(" {} ", app.bot_name),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    )];
    if let Some(status) = &app.status_message {
        spans.push(Span::styled(
            format!(" {}", status),
            Style::default().fg(Color::DarkGray),
        ));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    // Inner size minus borders, kept for scroll math.
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);
    let width = app.chat_width as usize;

    let mut lines: Vec<Line> = Vec::new();
    for msg in app.transcript.messages() {
        let (label, color) = match msg.role {
            Role::User => ("You".to_string(), Color::Cyan),
            Role::Bot => (app.bot_name.clone(), Color::Yellow),
        };
        lines.push(Line::from(vec![
            Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("  {}", format_clock(&msg.timestamp)),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
        lines.extend(markup_to_lines(&msg.markup));
        lines.push(Line::default());
    }

    if app.typing.is_active() {
        lines.push(Line::from(Span::styled(
            app.bot_name.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("typing{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    let total: usize = lines.iter().map(|l| wrapped_line_count(l, width)).sum();
    let max_scroll = (total as u16).saturating_sub(app.chat_height);
    if app.transcript.pinned() {
        app.scroll = max_scroll;
    } else {
        app.scroll = app.scroll.min(max_scroll);
    }

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .wrap(Wrap { trim: true })
        .scroll((app.scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let border_color = if app.input_mode == InputMode::Editing {
        Color::Yellow
    } else {
        Color::DarkGray
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(" Message ");

    // Horizontal scrolling keeps the cursor visible in a one-line input.
    let inner_width = area.width.saturating_sub(2) as usize;
    let cursor_pos = app.input_cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let visible_text: String = app
        .input
        .chars()
        .skip(scroll_offset)
        .take(inner_width)
        .collect();

    let input = Paragraph::new(visible_text)
        .style(Style::default().fg(Color::Cyan))
        .block(block);

    frame.render_widget(input, area);

    if app.input_mode == InputMode::Editing {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 1, area.y + 1));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let hint = if app.input_mode == InputMode::Editing {
        " Enter send | Esc scroll mode | Ctrl+L clear | Ctrl+O docs | Ctrl+C quit"
    } else {
        " i compose | j/k scroll | G latest | Ctrl+L clear | q quit"
    };
    frame.render_widget(
        Paragraph::new(Line::from(Span::raw(hint).dim())),
        area,
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::format_bot_text;

    #[test]
    fn strong_markup_becomes_bold_span() {
        let lines = markup_to_lines("<strong>hi</strong>");
        assert_eq!(lines.len(), 1);
        let span = &lines[0].spans[0];
        assert_eq!(span.content.as_ref(), "hi");
        assert!(span.style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn entities_render_literally() {
        let lines = markup_to_lines("&lt;script&gt; &amp; &quot;x&quot;");
        let text: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "<script> & \"x\"");
    }

    #[test]
    fn breaks_split_lines() {
        let lines = markup_to_lines("a<br>b<br>c");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn heading_gets_its_own_styled_line() {
        let lines = markup_to_lines(&format_bot_text("**Response 2:** body"));
        assert!(lines.len() >= 2);
        let heading: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(heading, "Response 2:");
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn escaped_backend_text_never_produces_tags() {
        let lines = markup_to_lines(&format_bot_text("<script>alert('x')</script>"));
        let text: String = lines[0].spans.iter().map(|s| s.content.as_ref()).collect();
        assert_eq!(text, "<script>alert('x')</script>");
    }

    #[test]
    fn wrapped_count_accounts_for_width() {
        assert_eq!(wrapped_line_count(&Line::from("abcdefghij"), 5), 2);
        assert_eq!(wrapped_line_count(&Line::from("abcdefghij"), 0), 1);
        assert_eq!(wrapped_line_count(&Line::default(), 5), 1);
    }

    #[test]
    fn wrapped_count_is_greedy_per_word() {
        // Four 6-char words at width 10: each pair "word1 word2" is 13 wide,
        // so every word lands on its own row.
        assert_eq!(wrapped_line_count(&Line::from("aaaaaa bbbbbb cccccc dddddd"), 10), 4);
        // Two short words share a row.
        assert_eq!(wrapped_line_count(&Line::from("ab cd"), 5), 1);
        // A word wider than the view spills across rows; its tail still
        // shares the last row with the next word when there is room.
        assert_eq!(wrapped_line_count(&Line::from("aaaaaaaaaaaa bb"), 5), 3);
    }
}
