use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;

use crate::app::{App, FocusPane};
use crate::tui::AppEvent;

const SCROLL_STEP: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys that work in either field
    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('t') if ctrl => {
            app.inject_demo_turns();
            return;
        }
        KeyCode::Char('x') if ctrl => {
            app.clear_key();
            return;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.toggle_focus();
            return;
        }
        KeyCode::PageUp => {
            app.scroll_up(app.chat_height.max(1) / 2);
            return;
        }
        KeyCode::PageDown => {
            app.scroll_down(app.chat_height.max(1) / 2);
            return;
        }
        _ => {}
    }

    match app.focus {
        FocusPane::Prompt => handle_prompt_key(app, key),
        FocusPane::ApiKey => handle_key_field(app, key),
    }
}

fn handle_prompt_key(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
            app.edit_focused(|field| field.insert('\n'));
        }
        KeyCode::Enter => app.submit_prompt(),
        _ => edit_field(app, key),
    }
}

fn handle_key_field(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter | KeyCode::Esc => app.focus = FocusPane::Prompt,
        _ => edit_field(app, key),
    }
}

fn edit_field(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => app.edit_focused(|field| field.backspace()),
        KeyCode::Delete => app.edit_focused(|field| field.delete()),
        KeyCode::Left => app.edit_focused(|field| field.left()),
        KeyCode::Right => app.edit_focused(|field| field.right()),
        KeyCode::Home => app.edit_focused(|field| field.home()),
        KeyCode::End => app.edit_focused(|field| field.end()),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.edit_focused(|field| field.insert(c));
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(SCROLL_STEP),
        MouseEventKind::ScrollUp => app.scroll_up(SCROLL_STEP),
        _ => {}
    }
}
