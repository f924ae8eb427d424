pub mod screen;

use lectio::{
    celebration::ChapterCelebration,
    orp::WordFrame,
    session::PlayState,
    util::{format_duration, group_thousands},
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Gauge, Paragraph, Widget, Wrap},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::{App, AppState, Focus};

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 1;

/// Colors for the current light/dark preference
#[derive(Debug, Clone, Copy)]
pub struct Palette {
    pub text: Style,
    pub dim: Style,
    pub focus: Style,
    pub accent: Style,
    pub background: Style,
}

impl Palette {
    pub fn new(dark_mode: bool) -> Self {
        let base = if dark_mode {
            Style::default().fg(Color::Gray).bg(Color::Black)
        } else {
            Style::default()
        };
        Self {
            text: base.add_modifier(Modifier::BOLD),
            dim: base.add_modifier(Modifier::DIM),
            focus: base.fg(Color::Red).add_modifier(Modifier::BOLD),
            accent: base.fg(if dark_mode { Color::LightCyan } else { Color::Cyan }),
            background: base,
        }
    }
}

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let palette = Palette::new(self.prefs.dark_mode);
        buf.set_style(area, palette.background);

        match self.state {
            AppState::Library => render_library(self, &palette, area, buf),
            AppState::Reading => render_reading(self, &palette, area, buf),
        }
    }
}

/// Letters of `s` separated by `gap` blank cells.
fn spaced(s: &str, gap: usize) -> String {
    if gap == 0 {
        return s.to_string();
    }
    let sep = " ".repeat(gap);
    s.chars()
        .map(String::from)
        .collect::<Vec<_>>()
        .join(&sep)
}

/// Draws `frame` so its emphasized character sits on column `center_x`.
pub fn render_focus_word(
    frame: &WordFrame,
    gap: usize,
    palette: &Palette,
    center_x: u16,
    y: u16,
    area: Rect,
    buf: &mut Buffer,
) {
    let sep = " ".repeat(gap);
    let before = if frame.before.is_empty() {
        String::new()
    } else {
        format!("{}{sep}", spaced(&frame.before, gap))
    };
    let after = if frame.after.is_empty() {
        String::new()
    } else {
        format!("{sep}{}", spaced(&frame.after, gap))
    };

    let before_width = before.width() as u16;
    let start_x = center_x.saturating_sub(before_width).max(area.x);
    let skipped = (before_width as usize).saturating_sub((center_x - start_x) as usize);
    let visible_before: String = {
        let mut dropped = 0;
        before
            .chars()
            .skip_while(|c| {
                if dropped < skipped {
                    dropped += c.width().unwrap_or(0);
                    true
                } else {
                    false
                }
            })
            .collect()
    };
    let right = area.x + area.width;

    buf.set_stringn(
        start_x,
        y,
        &visible_before,
        right.saturating_sub(start_x) as usize,
        palette.text,
    );
    let (x, _) = buf.set_stringn(
        center_x,
        y,
        frame.emphasized.to_string(),
        right.saturating_sub(center_x) as usize,
        palette.focus,
    );
    buf.set_stringn(x, y, &after, right.saturating_sub(x) as usize, palette.text);
}

fn render_reading(app: &App, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // location / version / speed
            Constraint::Min(1),
            Constraint::Length(1), // marker
            Constraint::Length(1), // word
            Constraint::Length(1), // marker
            Constraint::Min(1),
            Constraint::Length(1), // progress label
            Constraint::Length(1), // gauge
            Constraint::Length(1), // stats bar
            Constraint::Length(1), // legend / status
        ])
        .split(area);

    let session = &app.session;
    let location = session
        .location()
        .map(ToString::to_string)
        .unwrap_or_default();
    let state_label = match session.state() {
        PlayState::Paused => "  PAUSED",
        _ => "",
    };
    let header = Line::from(vec![
        Span::styled(location, palette.text),
        Span::styled(format!("  ({})", session.store().name()), palette.dim),
        Span::styled(state_label, palette.accent),
    ]);
    let header_row = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(10)])
        .split(chunks[0]);
    Paragraph::new(header).render(header_row[0], buf);
    Paragraph::new(Span::styled(session.speed().to_string(), palette.accent))
        .alignment(Alignment::Right)
        .render(header_row[1], buf);

    let word_row = chunks[3];
    let center_x = word_row.x + word_row.width / 2;
    for marker in [chunks[2], chunks[4]] {
        buf.set_string(center_x, marker.y, "│", palette.dim);
    }

    match &app.frame {
        Some(frame) if !app.celebration.is_active => render_focus_word(
            frame,
            app.prefs.font_size.letter_spacing(),
            palette,
            center_x,
            word_row.y,
            word_row,
            buf,
        ),
        _ => {}
    }

    let (current, total) = app
        .frame
        .as_ref()
        .map_or((0, session.words().len()), |f| (f.progress_current, f.progress_total));
    Paragraph::new(Span::styled(format!("{current} / {total} words"), palette.dim))
        .alignment(Alignment::Center)
        .render(chunks[6], buf);
    let ratio = app.frame.as_ref().map_or(0.0, WordFrame::ratio);
    Gauge::default()
        .gauge_style(palette.accent)
        .ratio(ratio)
        .label("")
        .render(chunks[7], buf);

    Paragraph::new(Span::styled(stats_bar(app), palette.dim))
        .alignment(Alignment::Center)
        .render(chunks[8], buf);

    let footer = match &app.status {
        Some(status) => Span::styled(status.clone(), palette.accent),
        None => Span::styled(
            "(space) pause / (↑/→) faster / (↓/←) slower / (esc) library / (q)uit",
            palette.dim.add_modifier(Modifier::ITALIC),
        ),
    };
    Paragraph::new(footer).render(chunks[9], buf);

    if app.celebration.is_active {
        render_celebration(&app.celebration, palette, area, buf);
    }
}

fn stats_bar(app: &App) -> String {
    let stats = app.session.stats();
    format!(
        "{} words • {} • {} chapters",
        group_thousands(stats.total_words_read),
        format_duration(app.session.live_seconds()),
        stats.chapters_completed
    )
}

/// Rows `[offset, offset + height)` of a list scrolled to keep `selected` visible.
fn scroll_window(selected: usize, len: usize, height: usize) -> std::ops::Range<usize> {
    if height == 0 || len == 0 {
        return 0..0;
    }
    let offset = selected.saturating_sub(height - 1).min(len.saturating_sub(height));
    offset..(offset + height).min(len)
}

fn render_list(
    title: &str,
    items: &[String],
    selected: usize,
    focused: bool,
    palette: &Palette,
    area: Rect,
    buf: &mut Buffer,
) {
    let title_style = if focused {
        palette.accent.add_modifier(Modifier::BOLD | Modifier::UNDERLINED)
    } else {
        palette.dim
    };
    buf.set_stringn(area.x, area.y, title, area.width as usize, title_style);

    let rows = area.height.saturating_sub(1) as usize;
    for (row, idx) in scroll_window(selected, items.len(), rows).enumerate() {
        let style = if idx == selected {
            if focused {
                palette.text.add_modifier(Modifier::REVERSED)
            } else {
                palette.text
            }
        } else {
            palette.dim
        };
        let marker = if idx == selected { "› " } else { "  " };
        buf.set_stringn(
            area.x,
            area.y + 1 + row as u16,
            format!("{marker}{}", items[idx]),
            area.width as usize,
            style,
        );
    }
}

fn render_library(app: &App, palette: &Palette, area: Rect, buf: &mut Buffer) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Length(1), // title
            Constraint::Length(1),
            Constraint::Min(3),    // lists
            Constraint::Length(1), // continue
            Constraint::Length(1), // stats
            Constraint::Length(1), // preferences
            Constraint::Length(2), // legend / status
        ])
        .split(area);

    let store = app.session.store();
    let title = Line::from(vec![
        Span::styled("lectio", palette.text),
        Span::styled(format!("  {}", store.name()), palette.accent),
        Span::styled(
            format!("  ({} of {} versions)", app.version_position(), app.library.names().len()),
            palette.dim,
        ),
    ]);
    Paragraph::new(title).render(chunks[0], buf);

    let lists = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(chunks[2]);

    let books: Vec<String> = app
        .session
        .book_order()
        .iter()
        .map(|b| format!("{b} ({})", store.chapter_count(b)))
        .collect();
    if books.is_empty() {
        Paragraph::new(Span::styled("no content available", palette.accent))
            .render(lists[0], buf);
    } else {
        render_list(
            "Books",
            &books,
            app.cursor.book,
            app.cursor.focus == Focus::Books,
            palette,
            lists[0],
            buf,
        );
    }

    let chapters: Vec<String> = app
        .chapters()
        .into_iter()
        .map(|c| format!("Chapter {c}"))
        .collect();
    render_list(
        "Chapters",
        &chapters,
        app.cursor.chapter,
        app.cursor.focus == Focus::Chapters,
        palette,
        lists[1],
        buf,
    );

    if let Some(resume) = &app.resume {
        Paragraph::new(Span::styled(
            format!(
                "(c) continue {} {} at word {} ({}, {} WPM)",
                resume.book,
                resume.chapter,
                resume.word_index + 1,
                resume.version,
                resume.speed
            ),
            palette.accent,
        ))
        .render(chunks[3], buf);
    }

    Paragraph::new(Span::styled(
        app.session.stats().summary(chrono::Utc::now()),
        palette.dim,
    ))
    .render(chunks[4], buf);

    Paragraph::new(Span::styled(
        format!(
            "speed {}  font {}  {} mode",
            app.session.speed(),
            app.prefs.font_size,
            if app.prefs.dark_mode { "dark" } else { "light" }
        ),
        palette.dim,
    ))
    .render(chunks[5], buf);

    let footer = match &app.status {
        Some(status) => Paragraph::new(Span::styled(status.clone(), palette.accent)),
        None => Paragraph::new(Span::styled(
            "(↑/↓) select / (←/→) books-chapters / (enter) read / (v)ersion / (d)ark / (+/-) font / (q)uit",
            palette.dim.add_modifier(Modifier::ITALIC),
        )),
    };
    footer.wrap(Wrap { trim: true }).render(chunks[6], buf);
}

/// Render celebration particles on top of the reading screen
fn render_celebration(
    celebration: &ChapterCelebration,
    palette: &Palette,
    area: Rect,
    buf: &mut Buffer,
) {
    let colors = [
        Color::Yellow,
        Color::Magenta,
        Color::Cyan,
        Color::Green,
        Color::Red,
        Color::Blue,
        Color::LightYellow,
    ];

    for particle in &celebration.particles {
        if particle.x < 0.0 || particle.y < 0.0 {
            continue;
        }
        let x = particle.x as u16;
        let y = particle.y as u16;

        if x < area.width && y < area.height {
            let color = colors[particle.color_index % colors.len()];
            let fade = 1.0 - (particle.age / particle.max_age);
            let style = if particle.is_text || fade > 0.6 {
                Style::default().fg(color).add_modifier(Modifier::BOLD)
            } else if fade > 0.3 {
                Style::default().fg(color)
            } else {
                Style::default().fg(color).add_modifier(Modifier::DIM)
            };

            if let Some(cell) = buf.cell_mut((area.x + x, area.y + y)) {
                cell.set_symbol(&particle.symbol.to_string());
                cell.set_style(style);
            }
        }
    }

    if let Some(location) = &celebration.location {
        let label = location.to_string();
        let y = area.y + area.height / 2;
        let x = area.x + (area.width.saturating_sub(label.width() as u16)) / 2;
        buf.set_stringn(x, y, &label, area.width as usize, palette.text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(buf: &Buffer, y: u16) -> String {
        (0..buf.area.width)
            .map(|x| buf[(x, y)].symbol().to_string())
            .collect()
    }

    #[test]
    fn focus_character_lands_on_center() {
        let area = Rect::new(0, 0, 21, 1);
        let mut buf = Buffer::empty(area);
        let frame = WordFrame::new("beginning", 1, 3, "Genesis 1");

        render_focus_word(&frame, 0, &Palette::new(false), 10, 0, area, &mut buf);

        assert_eq!(buf[(10, 0)].symbol(), "i");
        assert_eq!(buf[(10, 0)].fg, Color::Red);
        assert_eq!(row(&buf, 0).trim(), "beginning");
    }

    #[test]
    fn letter_spacing_keeps_focus_centered() {
        let area = Rect::new(0, 0, 31, 1);
        let mut buf = Buffer::empty(area);
        let frame = WordFrame::new("word", 1, 1, "John 1");

        render_focus_word(&frame, 1, &Palette::new(true), 15, 0, area, &mut buf);

        assert_eq!(buf[(15, 0)].symbol(), "o");
        assert_eq!(row(&buf, 0).trim(), "w o r d");
    }

    #[test]
    fn long_word_is_clipped_not_panicking() {
        let area = Rect::new(0, 0, 6, 1);
        let mut buf = Buffer::empty(area);
        let frame = WordFrame::new("righteousness", 1, 1, "Psalms 23");

        render_focus_word(&frame, 2, &Palette::new(false), 3, 0, area, &mut buf);

        assert_eq!(buf[(3, 0)].symbol(), "t");
    }

    #[test]
    fn spaced_inserts_gaps() {
        assert_eq!(spaced("abc", 0), "abc");
        assert_eq!(spaced("abc", 2), "a  b  c");
        assert_eq!(spaced("", 1), "");
    }

    #[test]
    fn scroll_window_follows_selection() {
        assert_eq!(scroll_window(0, 10, 4), 0..4);
        assert_eq!(scroll_window(5, 10, 4), 2..6);
        assert_eq!(scroll_window(9, 10, 4), 6..10);
        assert_eq!(scroll_window(1, 2, 4), 0..2);
        assert_eq!(scroll_window(0, 0, 4), 0..0);
    }
}
