use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, FocusPane, InputMode};
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
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Quit => app.should_quit = true,
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.should_quit = true;
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.should_quit = true,

        KeyCode::Tab => app.focus = app.focus.next(),

        // Quick actions, same path as typed input
        KeyCode::Char(c @ '1'..='9') => {
            if let Some(number) = c.to_digit(10) {
                app.submit_quick_action(number as usize);
            }
        }

        KeyCode::Char('i') => {
            app.focus = FocusPane::Input;
            app.input_mode = InputMode::Editing;
        }

        KeyCode::Char('j') | KeyCode::Down => match app.focus {
            FocusPane::Projects => app.project_nav_down(),
            FocusPane::Chat => app.scroll_chat_down(1),
            FocusPane::Input => {}
        },
        KeyCode::Char('k') | KeyCode::Up => match app.focus {
            FocusPane::Projects => app.project_nav_up(),
            FocusPane::Chat => app.scroll_chat_up(1),
            FocusPane::Input => {}
        },
        KeyCode::Char('d') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half = (app.chat_height / 2).max(1);
            app.scroll_chat_down(half);
        }
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            let half = (app.chat_height / 2).max(1);
            app.scroll_chat_up(half);
        }
        KeyCode::Char('G') => app.scroll_chat_to_bottom(),
        KeyCode::Char('g') => app.scroll_chat_up(u16::MAX),

        KeyCode::Enter => match app.focus {
            FocusPane::Projects => app.select_project(),
            FocusPane::Input => app.input_mode = InputMode::Editing,
            FocusPane::Chat => {}
        },

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    let cursor = app.input_cursor;

    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            // Forwarded even while a request is in flight; the session ignores it
            app.submit_input();
        }
        KeyCode::Backspace => {
            if cursor > 0 {
                app.session.with_input(|input| {
                    let byte_pos = char_to_byte_index(input, cursor - 1);
                    if byte_pos < input.len() {
                        input.remove(byte_pos);
                    }
                });
                app.input_cursor -= 1;
            }
        }
        KeyCode::Delete => {
            app.session.with_input(|input| {
                if cursor < input.chars().count() {
                    let byte_pos = char_to_byte_index(input, cursor);
                    input.remove(byte_pos);
                }
            });
        }
        KeyCode::Left => {
            app.input_cursor = cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.session.with_input(|input| input.chars().count());
            app.input_cursor = (cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.input_cursor = 0;
        }
        KeyCode::End => {
            app.input_cursor = app.session.with_input(|input| input.chars().count());
        }
        KeyCode::Char(c) => {
            app.session.with_input(|input| {
                let byte_pos = char_to_byte_index(input, cursor);
                input.insert(byte_pos, c);
            });
            app.input_cursor += 1;
        }
        _ => {}
    }
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let in_projects = app.projects_area.is_some_and(|r| point_in_rect(x, y, r));
    let in_chat = app.chat_area.is_some_and(|r| point_in_rect(x, y, r));

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if in_chat {
                app.scroll_chat_down(3);
            } else if in_projects {
                app.project_nav_down();
            }
        }
        MouseEventKind::ScrollUp => {
            if in_chat {
                app.scroll_chat_up(3);
            } else if in_projects {
                app.project_nav_up();
            }
        }
        _ => {}
    }
}
