//! Keyboard input handling for the TUI.
//!
//! This module handles all keyboard events and translates them into
//! application state changes.

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent};
use pokedex_core::worker::notifications::OPEN_ACTION;

use crate::app::{App, AppState};

/// Handle keyboard input. Returns true if the app should quit.
pub fn handle_input(app: &mut App, key: KeyEvent) -> Result<bool> {
    match app.state {
        AppState::ShowingHelp => {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('?') | KeyCode::Char('q')) {
                app.state = AppState::Normal;
            }
            Ok(false)
        }
        AppState::ConfirmingQuit => Ok(handle_quit_input(app, key)),
        AppState::PromptingPermission => {
            handle_permission_input(app, key);
            Ok(false)
        }
        AppState::ShowingAlert => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc) {
                app.dismiss_alert();
            }
            Ok(false)
        }
        AppState::ShowingNotification => {
            handle_notification_input(app, key);
            Ok(false)
        }
        AppState::Searching => {
            handle_search_input(app, key);
            Ok(false)
        }
        AppState::Normal => {
            handle_normal_input(app, key);
            Ok(false)
        }
        AppState::Quitting => Ok(true),
    }
}

fn handle_quit_input(app: &mut App, key: KeyEvent) -> bool {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
            app.state = AppState::Quitting;
            true
        }
        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
            app.state = AppState::Normal;
            false
        }
        _ => false,
    }
}

fn handle_permission_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y') | KeyCode::Char('Y') => app.answer_permission(Some(true)),
        KeyCode::Char('n') | KeyCode::Char('N') => app.answer_permission(Some(false)),
        KeyCode::Esc => app.answer_permission(None),
        _ => {}
    }
}

fn handle_notification_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Enter => app.click_notification(None),
        KeyCode::Char('o') => app.click_notification(Some(OPEN_ACTION)),
        KeyCode::Esc => app.dismiss_notification(),
        _ => {}
    }
}

fn handle_search_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.clear_search(),
        KeyCode::Enter => app.confirm_search(),
        KeyCode::Backspace => app.search_pop(),
        KeyCode::Char(c) => app.search_push(c),
        _ => {}
    }
}

fn handle_normal_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') => app.state = AppState::ConfirmingQuit,
        KeyCode::Char('?') => app.state = AppState::ShowingHelp,

        // Grid
        KeyCode::Left | KeyCode::Char('h') => app.move_left(),
        KeyCode::Right | KeyCode::Char('l') => app.move_right(),
        KeyCode::Up | KeyCode::Char('k') => app.move_up(),
        KeyCode::Down | KeyCode::Char('j') => app.move_down(),
        KeyCode::Char('[') | KeyCode::PageUp => app.prev_page(),
        KeyCode::Char(']') | KeyCode::PageDown => app.next_page(),
        KeyCode::Home => app.go_to_page(1),
        KeyCode::End => app.go_to_page(app.catalog.total_pages()),

        // Search
        KeyCode::Char('/') => app.start_search(),
        KeyCode::Char('x') | KeyCode::Esc => app.clear_search(),

        // Actions
        KeyCode::Char('a') => app.activate_notifications(),
        KeyCode::Char('n') => app.send_notification(),
        KeyCode::Char('o') => app.toggle_offline(),
        KeyCode::Char('u') => app.reload(),
        _ => {}
    }
}
