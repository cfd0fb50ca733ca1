use ratatui::style::{Color, Modifier, Style};

// Pokédex palette
pub const DEX_RED: Color = Color::Rgb(214, 64, 58);
pub const DEX_YELLOW: Color = Color::Rgb(238, 196, 64);
pub const ONLINE: Color = Color::Rgb(96, 168, 104);
pub const FAILURE: Color = Color::Rgb(230, 110, 80);
pub const MUTED: Color = Color::Rgb(128, 128, 128);
pub const CARD_FOCUS: Color = Color::Rgb(70, 40, 40);
pub const STATUS_BG: Color = Color::Rgb(36, 28, 30);

pub fn title_style() -> Style {
    Style::default().fg(DEX_RED).add_modifier(Modifier::BOLD)
}

pub fn heading_style() -> Style {
    Style::default().fg(DEX_YELLOW)
}

pub fn text_style() -> Style {
    Style::default().fg(Color::White)
}

pub fn muted_style() -> Style {
    Style::default().fg(MUTED)
}

pub fn ok_style() -> Style {
    Style::default().fg(ONLINE)
}

pub fn error_style() -> Style {
    Style::default().fg(FAILURE)
}

pub fn key_style() -> Style {
    Style::default()
        .fg(DEX_YELLOW)
        .add_modifier(Modifier::BOLD)
}

/// Name on a grid card.
pub fn card_name_style(selected: bool) -> Style {
    if selected {
        Style::default()
            .bg(CARD_FOCUS)
            .fg(Color::White)
            .add_modifier(Modifier::BOLD)
    } else {
        text_style()
    }
}

pub fn card_border_style(focused: bool) -> Style {
    if focused {
        Style::default().fg(DEX_RED)
    } else {
        Style::default().fg(MUTED)
    }
}

pub fn dialog_border_style() -> Style {
    Style::default().fg(DEX_RED)
}

/// Current page marker in the pagination bar.
pub fn page_style(current: bool) -> Style {
    if current {
        Style::default()
            .fg(DEX_RED)
            .add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        text_style()
    }
}

/// Pagination buttons are greyed out at either end.
pub fn button_style(enabled: bool) -> Style {
    if enabled {
        key_style()
    } else {
        muted_style()
    }
}

pub fn search_style() -> Style {
    Style::default().fg(DEX_YELLOW)
}

pub fn status_bar_style() -> Style {
    Style::default().bg(STATUS_BG).fg(Color::White)
}
