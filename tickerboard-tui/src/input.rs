//! Keyboard input dispatch: overlays → global keys → sidebar keys.

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::app::{AppState, Overlay, Panel, SidebarRow};
use crate::worker::WorkerCommand;

/// Days a custom date moves per `H`/`L` press.
const DATE_JUMP_DAYS: i64 = 30;

/// Handle a key event.
pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    // Only handle key press events (Windows sends both Press and Release).
    if key.kind != KeyEventKind::Press {
        return;
    }

    // 1. Overlays consume input first.
    match app.overlay {
        Overlay::Welcome => {
            app.overlay = Overlay::None;
            return;
        }
        Overlay::ErrorHistory => {
            handle_error_overlay(app, key);
            return;
        }
        Overlay::AddSymbol => {
            handle_symbol_overlay(app, key);
            return;
        }
        Overlay::None => {}
    }

    // 2. Global keys (always available).
    match key.code {
        KeyCode::Char('q') => {
            app.running = false;
            return;
        }
        KeyCode::Char('1') => { app.active_panel = Panel::Overview; return; }
        KeyCode::Char('2') => { app.active_panel = Panel::Summary; return; }
        KeyCode::Char('3') | KeyCode::Char('?') => { app.active_panel = Panel::Help; return; }
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.active_panel = app.active_panel.prev();
            } else {
                app.active_panel = app.active_panel.next();
            }
            return;
        }
        KeyCode::BackTab => {
            app.active_panel = app.active_panel.prev();
            return;
        }
        KeyCode::Char('r') => {
            app.set_status("Refreshing...");
            app.request_load(true);
            return;
        }
        KeyCode::Char('e') => {
            app.error_scroll = 0;
            app.overlay = Overlay::ErrorHistory;
            return;
        }
        KeyCode::Char('a') => {
            app.symbol_input.clear();
            app.overlay = Overlay::AddSymbol;
            return;
        }
        KeyCode::Char('C') => {
            if app.worker_tx.send(WorkerCommand::ClearCache).is_err() {
                app.set_warning("Worker thread is not running");
            }
            return;
        }
        KeyCode::Char('c') => { app.toggle_asset_class(); return; }
        KeyCode::Char('p') => { app.cycle_period(true); return; }
        KeyCode::Char('v') => { app.toggle_volume(); return; }
        KeyCode::Char('g') => { app.toggle_log_scale(); return; }
        _ => {}
    }

    // 3. Sidebar navigation.
    handle_sidebar_key(app, key);
}

fn handle_error_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('e') => {
            app.overlay = Overlay::None;
        }
        KeyCode::Char('j') | KeyCode::Down => {
            if app.error_scroll + 1 < app.error_history.len() {
                app.error_scroll += 1;
            }
        }
        KeyCode::Char('k') | KeyCode::Up => {
            app.error_scroll = app.error_scroll.saturating_sub(1);
        }
        _ => {}
    }
}

fn handle_symbol_overlay(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.overlay = Overlay::None;
            app.symbol_input.clear();
        }
        KeyCode::Enter => app.submit_symbol_input(),
        KeyCode::Backspace => {
            app.symbol_input.pop();
        }
        KeyCode::Char(c) if !c.is_whitespace() => app.symbol_input.push(c),
        _ => {}
    }
}

fn handle_sidebar_key(app: &mut AppState, key: KeyEvent) {
    match key.code {
        KeyCode::Char('j') | KeyCode::Down => app.move_cursor(1),
        KeyCode::Char('k') | KeyCode::Up => app.move_cursor(-1),
        KeyCode::Home => app.cursor = 0,
        KeyCode::Char(' ') | KeyCode::Enter => activate(app),
        KeyCode::Char('l') | KeyCode::Right => adjust(app, 1),
        KeyCode::Char('h') | KeyCode::Left => adjust(app, -1),
        KeyCode::Char('L') => adjust(app, DATE_JUMP_DAYS),
        KeyCode::Char('H') => adjust(app, -DATE_JUMP_DAYS),
        _ => {}
    }
}

/// Space / Enter on the cursor row.
fn activate(app: &mut AppState) {
    match app.cursor_row() {
        Some(SidebarRow::AssetClass) => app.toggle_asset_class(),
        Some(SidebarRow::Symbol(i)) => app.toggle_symbol(i),
        Some(SidebarRow::AddSymbol) => {
            app.symbol_input.clear();
            app.overlay = Overlay::AddSymbol;
        }
        Some(SidebarRow::Period) => app.cycle_period(true),
        Some(SidebarRow::ShowVolume) => app.toggle_volume(),
        Some(SidebarRow::LogScale) => app.toggle_log_scale(),
        Some(SidebarRow::StartDate | SidebarRow::EndDate) | None => {}
    }
}

/// Left / right on the cursor row. `step` is in days for date rows and a
/// direction everywhere else.
fn adjust(app: &mut AppState, step: i64) {
    match app.cursor_row() {
        Some(row @ (SidebarRow::StartDate | SidebarRow::EndDate)) => app.shift_date(row, step),
        Some(SidebarRow::Period) => app.cycle_period(step > 0),
        Some(SidebarRow::AssetClass) => app.toggle_asset_class(),
        Some(SidebarRow::ShowVolume) => app.toggle_volume(),
        Some(SidebarRow::LogScale) => app.toggle_log_scale(),
        _ => {}
    }
}
