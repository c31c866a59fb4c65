use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};

use crate::app::App;
use crate::tui::AppEvent;

const MOUSE_SCROLL_LINES: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        // Pasted newlines are text, never a send
        AppEvent::Paste(text) => app.insert_str(&text),
        // Next draw picks up the new size
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    if ctrl {
        match key.code {
            KeyCode::Char('c') => app.quit(),
            KeyCode::Char('n') => app.new_conversation(),
            KeyCode::Char('t') => app.toggle_theme(),
            KeyCode::Char('s') => {
                app.submit();
            }
            _ => {}
        }
        return;
    }

    match key.code {
        KeyCode::Esc => app.quit(),

        // Plain Enter sends; a modified Enter is the only way to get a newline
        KeyCode::Enter => {
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) {
                app.insert_newline();
            } else {
                app.submit();
            }
        }

        KeyCode::Backspace => app.backspace(),
        KeyCode::Delete => app.delete(),
        KeyCode::Left => app.cursor_left(),
        KeyCode::Right => app.cursor_right(),
        KeyCode::Home => app.cursor_home(),
        KeyCode::End => app.cursor_end(),

        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_page_up(),
        KeyCode::PageDown => app.scroll_page_down(),

        KeyCode::Tab => app.insert_char('\t'),
        KeyCode::Char(c) => app.insert_char(c),

        _ => {}
    }
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    match mouse.kind {
        MouseEventKind::ScrollUp => app.scroll_up(MOUSE_SCROLL_LINES),
        MouseEventKind::ScrollDown => app.scroll_down(MOUSE_SCROLL_LINES),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::ChatClient;
    use crate::preferences::{MemoryPreferences, Theme};
    use std::sync::Arc;

    fn offline_app() -> App {
        App::new(
            Arc::new(ChatClient::new("http://127.0.0.1:9")),
            Box::new(MemoryPreferences::default()),
        )
    }

    fn press(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, modifiers)));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c), KeyModifiers::NONE);
        }
    }

    #[test]
    fn shift_enter_inserts_newline_without_sending() {
        let mut app = offline_app();
        type_text(&mut app, "line one");
        press(&mut app, KeyCode::Enter, KeyModifiers::SHIFT);
        type_text(&mut app, "line two");

        assert_eq!(app.input, "line one\nline two");
        assert!(app.messages.is_empty());
        assert!(!app.loading);
    }

    #[test]
    fn multi_line_paste_stays_in_the_input() {
        let mut app = offline_app();
        type_text(&mut app, "> ");
        handle_event(&mut app, AppEvent::Paste("line one\nline two\n".to_string()));

        assert_eq!(app.input, "> line one\nline two\n");
        assert!(app.messages.is_empty());
        assert!(!app.loading);
    }

    #[test]
    fn tab_key_inserts_spaces() {
        let mut app = offline_app();
        type_text(&mut app, "a");
        press(&mut app, KeyCode::Tab, KeyModifiers::NONE);
        type_text(&mut app, "b");

        assert_eq!(app.input, "a    b");
        assert_eq!(app.input_cursor_position(), (0, 6));
    }

    #[test]
    fn enter_on_blank_input_does_nothing() {
        let mut app = offline_app();
        type_text(&mut app, "   ");
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);

        assert_eq!(app.input, "   ");
        assert!(app.messages.is_empty());
        assert!(!app.loading);
    }

    #[tokio::test]
    async fn plain_enter_sends_without_inserting_newline() {
        let mut app = offline_app();
        type_text(&mut app, "Hello");
        press(&mut app, KeyCode::Enter, KeyModifiers::NONE);

        assert!(app.loading);
        assert_eq!(app.input, "");
        assert_eq!(app.messages.len(), 1);
        assert_eq!(app.messages[0].content, "Hello");
    }

    #[test]
    fn control_shortcuts() {
        let mut app = offline_app();
        type_text(&mut app, "draft");

        press(&mut app, KeyCode::Char('t'), KeyModifiers::CONTROL);
        assert_eq!(app.theme, Theme::Dark);
        // Shortcut letters are not typed into the input
        assert_eq!(app.input, "draft");

        press(&mut app, KeyCode::Char('n'), KeyModifiers::CONTROL);
        assert_eq!(app.input, "");

        press(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }

    #[test]
    fn shifted_characters_are_typed() {
        let mut app = offline_app();
        press(&mut app, KeyCode::Char('H'), KeyModifiers::SHIFT);
        press(&mut app, KeyCode::Char('i'), KeyModifiers::NONE);
        assert_eq!(app.input, "Hi");
    }
}
