use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame,
};

use pokedex_core::net::ResponseSource;
use pokedex_core::worker::notifications::OPEN_ACTION;

use crate::app::{App, AppState, SpriteStatus, GRID_COLUMNS};
use crate::utils::{format_bytes, truncate_string};

use super::styles;

/// Rows taken by one card, borders included.
const CARD_HEIGHT: u16 = 3;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title bar
            Constraint::Length(3), // Search bar
            Constraint::Min(10),   // Grid + detail
            Constraint::Length(1), // Pagination
            Constraint::Length(2), // Status bar
        ])
        .split(frame.area());

    render_title_bar(frame, app, chunks[0]);
    render_search_bar(frame, app, chunks[1]);
    render_main_content(frame, app, chunks[2]);
    render_pagination(frame, app, chunks[3]);
    render_status_bar(frame, app, chunks[4]);

    // Render overlays
    match app.state {
        AppState::ShowingHelp => render_help_overlay(frame),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::PromptingPermission => render_permission_overlay(frame),
        AppState::ShowingAlert => render_alert_overlay(frame, app),
        AppState::ShowingNotification => render_notification_overlay(frame, app),
        AppState::Normal | AppState::Searching | AppState::Quitting => {}
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = format!("  {}", app.title);
    let help_hint = "[?] Help";
    let title_len = title.chars().count();

    let title_line = Line::from(vec![
        Span::styled(title, styles::title_style()),
        Span::raw(" ".repeat(
            area.width
                .saturating_sub(title_len as u16 + help_hint.len() as u16 + 4)
                as usize,
        )),
        Span::styled(help_hint, styles::muted_style()),
    ]);

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    let paragraph = Paragraph::new(title_line).block(block);
    frame.render_widget(paragraph, area);
}

fn render_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let editing = app.state == AppState::Searching;
    let line = if editing || !app.search_input.is_empty() {
        let cursor = if editing { "▌" } else { "" };
        Line::from(vec![
            Span::styled(" Search: ", styles::muted_style()),
            Span::styled(format!("{}{}", app.search_input, cursor), styles::search_style()),
        ])
    } else {
        Line::from(Span::styled(" Press / to search by name", styles::muted_style()))
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::card_border_style(editing));

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_main_content(frame: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
        .split(area);

    render_grid(frame, app, chunks[0]);
    render_detail(frame, app, chunks[1]);
}

fn render_grid(frame: &mut Frame, app: &App, area: Rect) {
    let view = app.catalog.visible();

    if view.entries.is_empty() {
        let message = if app.catalog.is_loading() {
            "Loading...".to_string()
        } else if app.catalog.is_searching() {
            format!("No Pokémon match \"{}\"", app.catalog.search().trim())
        } else {
            "Nothing to show. Press u to reload.".to_string()
        };
        let paragraph = Paragraph::new(Line::from(Span::styled(
            format!(" {}", message),
            styles::muted_style(),
        )));
        frame.render_widget(paragraph, area);
        return;
    }

    // Keep the selected row on screen
    let visible_rows = (area.height / CARD_HEIGHT).max(1) as usize;
    let selected_row = app.selection / GRID_COLUMNS;
    let first_row = selected_row.saturating_sub(visible_rows - 1);

    let card_width = area.width / GRID_COLUMNS as u16;
    for (i, entry) in view.entries.iter().enumerate() {
        let row = i / GRID_COLUMNS;
        if row < first_row || row >= first_row + visible_rows {
            continue;
        }
        let col = (i % GRID_COLUMNS) as u16;
        let card = Rect::new(
            area.x + col * card_width,
            area.y + (row - first_row) as u16 * CARD_HEIGHT,
            card_width,
            CARD_HEIGHT,
        );

        let selected = i == app.selection;
        let name_width = (card_width as usize).saturating_sub(9);
        let line = Line::from(vec![
            Span::styled(
                truncate_string(&entry.display_name(), name_width),
                styles::card_name_style(selected),
            ),
            Span::styled(format!(" #{}", entry.id()), styles::muted_style()),
        ]);

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(styles::card_border_style(selected));
        frame.render_widget(Paragraph::new(line).block(block), card);
    }
}

fn render_detail(frame: &mut Frame, app: &App, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::muted_style())
        .title(" Details ");

    let Some(entry) = app.selected_entry() else {
        frame.render_widget(Paragraph::new("").block(block), area);
        return;
    };

    let mut lines = vec![
        Line::from(Span::styled(entry.display_name(), styles::title_style())),
        Line::from(Span::styled(format!("#{}", entry.id()), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled("Sprite", styles::heading_style())),
    ];

    match app.sprites.get(entry.id()) {
        None | Some(SpriteStatus::Loading) => {
            lines.push(Line::from(Span::styled("  Loading...", styles::muted_style())));
        }
        Some(SpriteStatus::Loaded(info)) => {
            lines.push(Line::from(vec![
                Span::styled("  Size:   ", styles::muted_style()),
                Span::styled(format_bytes(info.bytes), styles::text_style()),
            ]));
            if let Some((w, h)) = info.dimensions {
                lines.push(Line::from(vec![
                    Span::styled("  Pixels: ", styles::muted_style()),
                    Span::styled(format!("{}x{}", w, h), styles::text_style()),
                ]));
            }
            let (source, style) = match info.source {
                ResponseSource::Network => ("network", styles::text_style()),
                ResponseSource::Cache => ("cache", styles::ok_style()),
                ResponseSource::Synthesized => ("placeholder", styles::error_style()),
            };
            lines.push(Line::from(vec![
                Span::styled("  From:   ", styles::muted_style()),
                Span::styled(source, style),
            ]));
        }
        Some(SpriteStatus::Failed(message)) => {
            lines.push(Line::from(Span::styled(
                format!("  {}", message),
                styles::error_style(),
            )));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        Span::styled("[n]", styles::key_style()),
        Span::styled(" notify me about this one", styles::text_style()),
    ]));

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn render_pagination(frame: &mut Frame, app: &App, area: Rect) {
    let catalog = &app.catalog;
    let current = catalog.page();

    let mut spans = vec![
        Span::raw(" "),
        Span::styled("[ Prev", styles::button_style(catalog.prev_enabled())),
        Span::raw("  "),
    ];
    for page in catalog.visible_page_numbers() {
        spans.push(Span::styled(page.to_string(), styles::page_style(page == current)));
        spans.push(Span::raw(" "));
    }
    spans.push(Span::raw(" "));
    spans.push(Span::styled("Next ]", styles::button_style(catalog.next_enabled())));

    let results = match catalog.visible().match_count {
        Some(matches) => matches as u64,
        None => catalog.count(),
    };
    spans.push(Span::styled(
        format!("   Page {} of {} | Results: {}", current, catalog.total_pages(), results),
        styles::muted_style(),
    ));

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = match (&app.status_message, &app.page_cache) {
        (Some(msg), _) => format!(" {} ", msg),
        (None, Some(cached)) if cached.is_stale() => {
            format!(" Cached {} (stale, press u) ", cached.age_display())
        }
        (None, Some(cached)) => format!(" Cached {} ", cached.age_display()),
        (None, None) => " ".to_string(),
    };

    let (mode, mode_style) = if app.is_offline() {
        ("offline", styles::error_style())
    } else {
        ("online", styles::ok_style())
    };
    let worker = match &app.worker_error {
        Some(e) => format!("worker failed: {}", truncate_string(e, 30)),
        None => app.worker_label(),
    };
    let right_text = format!(" {} | ", worker);
    let shortcuts = " | [q]uit ";

    let width = area.width as usize;
    let used = left_text.chars().count()
        + right_text.chars().count()
        + mode.len()
        + shortcuts.len();
    let padding_len = width.saturating_sub(used);

    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
        Span::styled(mode, mode_style),
        Span::styled(shortcuts, styles::muted_style()),
    ]);
    let paragraph = Paragraph::new(status_line).style(styles::status_bar_style());
    frame.render_widget(paragraph, area);
}

fn help_line(key: &'static str, desc: &'static str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<10}", key), styles::key_style()),
        Span::styled(desc, styles::text_style()),
    ])
}

fn render_help_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(52, 24, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");

    let help_text = vec![
        Line::from(Span::styled("  Pokédex", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Browsing", styles::heading_style())),
        help_line("←/→/↑/↓", "Move through the grid"),
        help_line("[ / ]", "Previous/next page"),
        help_line("/", "Search by name"),
        help_line("x", "Clear search"),
        Line::from(""),
        Line::from(Span::styled(" Notifications", styles::heading_style())),
        help_line("a", "Allow notifications"),
        help_line("n", "Notify about the selected entry"),
        Line::from(""),
        Line::from(Span::styled(" Caching", styles::heading_style())),
        help_line("o", "Toggle offline mode"),
        help_line("u", "Reload"),
        help_line("q", "Quit"),
        Line::from(""),
        Line::from(vec![
            Span::styled("       Press ", styles::muted_style()),
            Span::styled("?", styles::key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::dialog_border_style())
        .style(Style::default());

    let paragraph = Paragraph::new(help_text).block(block);

    frame.render_widget(paragraph, area);
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}

fn render_dialog(frame: &mut Frame, width: u16, lines: Vec<Line>) {
    let area = centered_rect_fixed(width, lines.len() as u16 + 2, frame.area());

    // Clear the area
    frame.render_widget(Clear, area);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::dialog_border_style())
        .style(Style::default());

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });

    frame.render_widget(paragraph, area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::heading_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];
    render_dialog(frame, 46, lines);
}

fn render_permission_overlay(frame: &mut Frame) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Allow Pokédex to show notifications?",
            styles::heading_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   ", styles::muted_style()),
            Span::styled("[Y]", styles::key_style()),
            Span::styled(" allow  ", styles::muted_style()),
            Span::styled("[N]", styles::key_style()),
            Span::styled(" block  ", styles::muted_style()),
            Span::styled("[Esc]", styles::key_style()),
            Span::styled(" not now", styles::muted_style()),
        ]),
    ];
    render_dialog(frame, 48, lines);
}

fn render_alert_overlay(frame: &mut Frame, app: &App) {
    let message = app.alert.as_deref().unwrap_or_default();
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(format!("   {}", message), styles::error_style())),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("Enter", styles::key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];
    render_dialog(frame, 56, lines);
}

fn render_notification_overlay(frame: &mut Frame, app: &App) {
    let Some(notification) = &app.notification else {
        return;
    };

    let mut hints = vec![
        Span::styled("  ", styles::muted_style()),
        Span::styled("[Enter]", styles::key_style()),
        Span::styled(" open  ", styles::muted_style()),
    ];
    if let Some(action) = notification.actions.iter().find(|a| a.action == OPEN_ACTION) {
        hints.push(Span::styled("[o]", styles::key_style()));
        hints.push(Span::styled(format!(" {}  ", action.title), styles::muted_style()));
    }
    hints.push(Span::styled("[Esc]", styles::key_style()));
    hints.push(Span::styled(" dismiss", styles::muted_style()));

    let lines = vec![
        Line::from(Span::styled(format!("  {}", notification.title), styles::title_style())),
        Line::from(""),
        Line::from(Span::styled(format!("  {}", notification.body), styles::text_style())),
        Line::from(Span::styled(
            format!("  {}", truncate_string(&notification.icon, 44)),
            styles::muted_style(),
        )),
        Line::from(""),
        Line::from(hints),
    ];
    render_dialog(frame, 50, lines);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use ratatui::{backend::TestBackend, Terminal};
    use tempfile::TempDir;

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 50)).unwrap();
        terminal.draw(|frame| render(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content()
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[tokio::test]
    async fn test_search_hints_describe_name_search() {
        let dir = TempDir::new().unwrap();
        let config = Config {
            offline_mode: true,
            ..Config::default()
        };
        let mut app = App::new(config, dir.path().join("config.json"), dir.path())
            .await
            .unwrap();

        let screen = screen_text(&app);
        assert!(screen.contains("Press / to search by name"));

        app.state = AppState::ShowingHelp;
        let screen = screen_text(&app);
        assert!(screen.contains("Search by name"));
        assert!(!screen.contains("number"));
    }
}
