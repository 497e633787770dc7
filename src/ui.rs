use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Wrap},
};

use crate::app::{App, FocusPane};
use crate::groq::MODEL;
use crate::state::{ChatRole, ChatTurn};

const PROMPT_ROWS: u16 = 4;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let error_height = if app.state.last_error().is_some() { 3 } else { 0 };

    let [header_area, key_area, chat_area, error_area, prompt_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(error_height),
        Constraint::Length(PROMPT_ROWS + 2),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(frame, header_area);
    render_key_input(app, frame, key_area);
    render_chat(app, frame, chat_area);
    if error_height > 0 {
        render_error(app, frame, error_area);
    }
    render_prompt(app, frame, prompt_area);
    render_footer(app, frame, footer_area);
}

fn render_header(frame: &mut Frame, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Groq Agent ", Style::default().fg(Color::Cyan).bold()),
        Span::styled("- AI/ML Specialist ", Style::default().fg(Color::White)),
        Span::styled(
            format!("v{}", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::DarkGray),
        ),
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::DarkGray));
    frame.render_widget(header, area);
}

/// Asterisks for all but the last four characters
fn mask_key(key: &str) -> String {
    let len = key.chars().count();
    if len <= 4 {
        "*".repeat(len)
    } else {
        let masked_len = len - 4;
        let last_four: String = key.chars().skip(masked_len).collect();
        format!("{}...{}", "*".repeat(masked_len.min(20)), last_four)
    }
}

fn border_color(focused: bool) -> Color {
    if focused { Color::Yellow } else { Color::DarkGray }
}

fn render_key_input(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::ApiKey;

    let title = match app.key_source {
        Some(source) => format!(" Groq API Key ({}) ", source.as_str()),
        None => " Groq API Key ".to_string(),
    };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(focused)))
        .title(title);

    let content = if app.key_input.is_empty() {
        Span::styled(app.key_placeholder(), Style::default().fg(Color::DarkGray))
    } else {
        Span::styled(mask_key(app.key_input.text()), Style::default().fg(Color::Cyan))
    };

    frame.render_widget(Paragraph::new(content).block(block), area);

    if focused {
        // The mask is not one char per char, so park the cursor after it
        let shown = if app.key_input.is_empty() { 0 } else { mask_key(app.key_input.text()).chars().count() };
        let cursor_x = (shown as u16).min(area.width.saturating_sub(3));
        frame.set_cursor_position((area.x + 1 + cursor_x, area.y + 1));
    }
}

fn turn_lines(turn: &ChatTurn) -> Vec<Line<'static>> {
    let label_style = match turn.role {
        ChatRole::User => Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
        ChatRole::Assistant => Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
    };

    let mut lines = vec![Line::from(Span::styled(turn.role.label(), label_style))];
    // split, not lines(): trailing and repeated newlines are part of the content
    lines.extend(turn.content.split('\n').map(|line| Line::from(line.to_string())));
    lines.push(Line::default());
    lines
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray))
        .title(" Conversation ");

    let in_flight = app.state.is_in_flight();
    let chat_text = if app.state.turns().is_empty() && !in_flight {
        Text::from(Span::styled(
            "No conversation yet - ask a question to start.",
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        ))
    } else {
        let mut lines: Vec<Line> = app.state.turns().iter().flat_map(turn_lines).collect();

        if in_flight {
            lines.push(Line::from(Span::styled(
                ChatRole::Assistant.label(),
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
            )));
            // Animated ellipsis: cycles through ".", "..", "..."
            let dots = ".".repeat((app.animation_frame as usize) + 1);
            lines.push(Line::from(Span::styled(
                format!("Thinking{}", dots),
                Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
            )));
        }

        Text::from(lines)
    };

    let chat = Paragraph::new(chat_text)
        .block(block)
        .wrap(Wrap { trim: false })
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_error(app: &App, frame: &mut Frame, area: Rect) {
    let Some(message) = app.state.last_error() else {
        return;
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Red))
        .title(" Error ");

    let error = Paragraph::new(message.to_string())
        .style(Style::default().fg(Color::Red))
        .block(block);

    frame.render_widget(error, area);
}

fn render_prompt(app: &App, frame: &mut Frame, area: Rect) {
    let focused = app.focus == FocusPane::Prompt;

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color(focused)))
        .title(" Prompt ");

    let (row, col) = app.prompt_input.cursor_row_col();
    let inner_width = area.width.saturating_sub(2) as usize;
    let inner_height = area.height.saturating_sub(2) as usize;

    // Keep the cursor inside the box when the prompt outgrows it
    let scroll_x = if inner_width == 0 { 0 } else { col.saturating_sub(inner_width - 1) };
    let scroll_y = if inner_height == 0 { 0 } else { row.saturating_sub(inner_height - 1) };

    let content = if app.prompt_input.is_empty() {
        Text::from(Span::styled(
            "Ask the agent about AI/ML, data engineering, deployment, or general queries...",
            Style::default().fg(Color::DarkGray),
        ))
    } else {
        Text::styled(app.prompt_input.text().to_string(), Style::default().fg(Color::White))
    };

    let prompt = Paragraph::new(content)
        .block(block)
        .scroll((scroll_y as u16, scroll_x as u16));

    frame.render_widget(prompt, area);

    if focused {
        frame.set_cursor_position((
            area.x + 1 + (col - scroll_x) as u16,
            area.y + 1 + (row - scroll_y) as u16,
        ));
    }
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().bg(Color::Black).fg(Color::White);

    let send_label = if app.state.is_in_flight() { " Thinking... " } else { " send " };

    let hints = vec![
        Span::styled(" Enter ", key_style),
        Span::styled(send_label, label_style),
        Span::styled(" Alt+Enter ", key_style),
        Span::styled(" newline ", label_style),
        Span::styled(" Tab ", key_style),
        Span::styled(" key/prompt ", label_style),
        Span::styled(" ^X ", key_style),
        Span::styled(" clear key ", label_style),
        Span::styled(" ^T ", key_style),
        Span::styled(" test msgs ", label_style),
        Span::styled(" ^C ", key_style),
        Span::styled(" quit ", label_style),
        Span::styled(format!(" {} ", MODEL), Style::default().bg(Color::Black).fg(Color::DarkGray)),
    ];

    let footer = Paragraph::new(Line::from(hints)).style(Style::default().bg(Color::Black));
    frame.render_widget(footer, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::groq::GroqClient;
    use crate::state::ChatState;
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text(app: &mut App, width: u16, height: u16) -> String {
        let mut terminal = Terminal::new(TestBackend::new(width, height)).unwrap();
        terminal.draw(|frame| render(app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let mut text = String::new();
        for row in buffer.content.chunks(buffer.area.width as usize) {
            for cell in row {
                text.push_str(cell.symbol());
            }
            text.push('\n');
        }
        text
    }

    #[test]
    fn test_mask_key_keeps_last_four() {
        assert_eq!(mask_key(""), "");
        assert_eq!(mask_key("abc"), "***");
        assert_eq!(mask_key("gsk_abcd1234"), "********...1234");
    }

    #[test]
    fn test_turn_lines_preserve_blank_lines() {
        let lines = turn_lines(&ChatTurn::assistant("a\n\nb"));
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0].to_string(), "ASSISTANT");
        assert_eq!(lines[2].to_string(), "");
    }

    #[test]
    fn test_empty_conversation_shows_placeholder() {
        let mut app = App::new(ChatState::new(""), None, GroqClient::new());
        let text = screen_text(&mut app, 100, 20);
        assert!(text.contains("No conversation yet"));
        assert!(text.contains("Paste Groq API key here"));
        assert!(!text.contains("Error"));
    }

    #[test]
    fn test_turns_and_error_are_drawn() {
        let mut app = App::new(ChatState::new("gsk_secretvalue"), None, GroqClient::new());
        app.inject_demo_turns();
        app.state.set_error("API Error: 401 invalid key");
        app.chat_scroll = 0;

        let text = screen_text(&mut app, 100, 30);
        assert!(text.contains("USER"));
        assert!(text.contains("Explain gradient descent in simple terms."));
        assert!(text.contains("API Error: 401 invalid key"));
        assert!(text.contains("...alue"));
        assert!(!text.contains("gsk_secretvalue"));
    }
}
