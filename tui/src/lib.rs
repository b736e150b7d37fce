//! TUI rendering for Bulwark using ratatui.

mod input;
mod session;
mod theme;

#[cfg(test)]
mod test_support;

pub use input::{InputPump, apply_event, handle_events};
pub use session::Session;
pub use theme::{ASCII_GLYPHS, Glyphs, Palette, glyphs, palette, spinner_frame, styles};

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Padding, Paragraph, Wrap},
};
use unicode_width::UnicodeWidthStr;

use bulwark_engine::{
    ActionView, Detail, DocumentView, FallbackView, NotFoundPage, PlaceholderView, RootDocument,
    Screen, SlotBody, SlotView, Tone,
};
use bulwark_types::{BuildMode, PageContent, UiOptions, sanitize_terminal_text};

/// Widest the root fallback card gets.
const ROOT_CARD_MAX_WIDTH: u16 = 78;
const INDENT_PER_DEPTH: u16 = 2;

/// Main draw function.
pub fn draw(frame: &mut Frame, session: &Session) {
    match session.screen() {
        Screen::RootFallback(document) => draw_root_document(frame, &document),
        Screen::Document(document) => draw_document(frame, session, &document),
    }
}

fn draw_document(frame: &mut Frame, session: &Session, document: &DocumentView) {
    let options = session.ui_options();
    let palette = palette(options);
    let glyphs = glyphs(options);

    let bg_block = Block::default().style(Style::default().bg(palette.bg_dark));
    frame.render_widget(bg_block, frame.area());

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([
            Constraint::Length(1), // Header
            Constraint::Length(1), // Navigation
            Constraint::Min(1),    // Segments
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    draw_header(frame, document, chunks[0], &palette);
    draw_nav(frame, document, chunks[1], &palette, &glyphs);
    draw_slots(frame, document, chunks[2], &palette, &glyphs, options);
    draw_status_bar(frame, session.notice(), chunks[3], &palette);
}

fn draw_header(frame: &mut Frame, document: &DocumentView, area: Rect, palette: &Palette) {
    let development = document.build_mode == BuildMode::Development;
    let badge = if development { " DEV " } else { " PROD " };
    let title = sanitize_terminal_text(&document.shell.title).into_owned();

    let line = Line::from(vec![
        Span::styled(badge, styles::build_badge(palette, development)),
        Span::raw(" "),
        Span::styled(title, styles::title(palette)),
        Span::raw("  "),
        Span::styled(document.route.to_string(), styles::muted(palette)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_nav(
    frame: &mut Frame,
    document: &DocumentView,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
) {
    let mut spans = Vec::new();
    for (i, link) in document.shell.nav.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(
                format!(" {} ", glyphs.nav_separator),
                styles::muted(palette),
            ));
        }
        let label = sanitize_terminal_text(&link.label).into_owned();
        let style = if link.route == document.route {
            Style::default()
                .fg(palette.accent)
                .add_modifier(Modifier::BOLD)
        } else {
            styles::body(palette)
        };
        spans.push(Span::styled(link.hotkey.to_string(), styles::key_highlight(palette)));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(label, style));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn draw_slots(
    frame: &mut Frame,
    document: &DocumentView,
    area: Rect,
    palette: &Palette,
    glyphs: &Glyphs,
    options: UiOptions,
) {
    let mut next_action = 1;
    let mut panels = Vec::with_capacity(document.slots.len());
    for slot in &document.slots {
        let indent = (slot.depth as u16).saturating_mul(INDENT_PER_DEPTH);
        let inner_width = area.width.saturating_sub(indent).saturating_sub(4);
        let panel = slot_panel(slot, palette, glyphs, options, &mut next_action);
        let height = wrapped_line_count(&panel.lines, inner_width).saturating_add(2);
        panels.push((indent, height, panel));
    }

    let mut constraints: Vec<Constraint> = panels
        .iter()
        .map(|(_, height, _)| Constraint::Length(*height))
        .collect();
    constraints.push(Constraint::Min(0));
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for ((indent, _, panel), row) in panels.into_iter().zip(rows.iter()) {
        let rect = Rect {
            x: row.x.saturating_add(indent),
            width: row.width.saturating_sub(indent),
            ..*row
        };
        let block = Block::default()
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(panel.border)
            .title(panel.title)
            .style(Style::default().bg(palette.bg_panel))
            .padding(Padding::horizontal(1));
        frame.render_widget(
            Paragraph::new(panel.lines)
                .block(block)
                .wrap(Wrap { trim: false }),
            rect,
        );
    }
}

struct SlotPanel {
    title: Line<'static>,
    border: Style,
    lines: Vec<Line<'static>>,
}

fn slot_panel(
    slot: &SlotView,
    palette: &Palette,
    glyphs: &Glyphs,
    options: UiOptions,
    next_action: &mut usize,
) -> SlotPanel {
    let connector = if slot.depth > 0 {
        format!("{} ", glyphs.tree_connector)
    } else {
        String::new()
    };
    let title = |style: Style| Line::from(Span::styled(format!(" {connector}{} ", slot.route), style));

    match &slot.body {
        SlotBody::Content(content) => SlotPanel {
            title: title(styles::muted(palette)),
            border: Style::default().fg(palette.bg_border),
            lines: content_lines(content, palette),
        },
        SlotBody::Loading(view) => SlotPanel {
            title: title(styles::muted(palette)),
            border: Style::default().fg(palette.bg_border),
            lines: loading_lines(view, palette, options),
        },
        SlotBody::NotFound(page) => SlotPanel {
            title: title(Style::default().fg(palette.warning)),
            border: Style::default().fg(palette.warning),
            lines: not_found_lines(page, palette, glyphs, next_action),
        },
        SlotBody::Fallback(view) => {
            let color = tone_color(view.tone, palette);
            SlotPanel {
                title: title(Style::default().fg(color).add_modifier(Modifier::BOLD)),
                border: Style::default().fg(color),
                lines: fallback_lines(view, palette, glyphs, next_action),
            }
        }
    }
}

fn tone_color(tone: Tone, palette: &Palette) -> ratatui::style::Color {
    match tone {
        Tone::Error => palette.error,
        Tone::Critical => palette.critical,
    }
}

fn content_lines(content: &PageContent, palette: &Palette) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(
        sanitize_terminal_text(&content.title).into_owned(),
        styles::title(palette),
    ))];
    lines.extend(content.body.iter().map(|line| {
        Line::from(Span::styled(
            sanitize_terminal_text(line).into_owned(),
            styles::body(palette),
        ))
    }));
    lines
}

fn loading_lines(
    view: &PlaceholderView,
    palette: &Palette,
    options: UiOptions,
) -> Vec<Line<'static>> {
    vec![
        Line::from(vec![
            Span::styled(
                spinner_frame(view.phase, options),
                Style::default().fg(palette.accent),
            ),
            Span::raw(" "),
            Span::styled(view.title.clone(), styles::title(palette)),
        ]),
        Line::from(Span::styled(view.subtitle.clone(), styles::muted(palette))),
    ]
}

fn not_found_lines(
    page: &NotFoundPage,
    palette: &Palette,
    glyphs: &Glyphs,
    next_action: &mut usize,
) -> Vec<Line<'static>> {
    let actions: Vec<&ActionView> = page.actions().collect();
    vec![
        Line::from(vec![
            Span::styled(
                format!("{} {}", glyphs.not_found, page.code),
                Style::default()
                    .fg(palette.warning)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(page.title, styles::title(palette)),
        ]),
        Line::from(Span::styled(page.description, styles::body(palette))),
        Line::from(""),
        action_line(&actions, palette, next_action),
    ]
}

fn fallback_lines(
    view: &FallbackView,
    palette: &Palette,
    glyphs: &Glyphs,
    next_action: &mut usize,
) -> Vec<Line<'static>> {
    let color = tone_color(view.tone, palette);
    let icon = match view.tone {
        Tone::Error => glyphs.error,
        Tone::Critical => glyphs.critical,
    };

    let mut lines = vec![
        Line::from(Span::styled(
            format!("{icon} {}", view.title),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(view.description, styles::body(palette))),
    ];

    if !view.details.is_empty() {
        lines.push(Line::from(""));
        lines.extend(detail_lines(&view.details, palette, glyphs));
    }

    let actions: Vec<&ActionView> = view.actions.iter().collect();
    lines.push(Line::from(""));
    lines.push(action_line(&actions, palette, next_action));

    if let Some(footer) = &view.footer {
        lines.push(Line::from(Span::styled(footer.clone(), styles::muted(palette))));
    }
    lines
}

fn detail_lines(details: &[Detail], palette: &Palette, glyphs: &Glyphs) -> Vec<Line<'static>> {
    let label = Style::default()
        .fg(palette.warning)
        .add_modifier(Modifier::BOLD);
    let mut lines = Vec::new();
    for detail in details {
        match detail {
            Detail::Error(message) => lines.push(Line::from(vec![
                Span::styled("Error: ", label),
                Span::styled(message.clone(), styles::body(palette)),
            ])),
            Detail::Digest(digest) => lines.push(Line::from(vec![
                Span::styled("Digest: ", label),
                Span::styled(digest.clone(), styles::body(palette)),
            ])),
            Detail::Trace(trace) => {
                lines.push(Line::from(Span::styled("Trace:", label)));
                lines.extend(trace.iter().map(|frame| {
                    Line::from(Span::styled(
                        format!("  {} {frame}", glyphs.bullet),
                        styles::muted(palette),
                    ))
                }));
            }
        }
    }
    lines
}

/// "[1] Try Again  [2] Go Home", numbered in screen order.
fn action_line(actions: &[&ActionView], palette: &Palette, next_action: &mut usize) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, action) in actions.iter().enumerate() {
        if i > 0 {
            spans.push(Span::raw("  "));
        }
        spans.push(Span::styled(
            format!("[{}]", *next_action),
            styles::key_highlight(palette),
        ));
        spans.push(Span::raw(" "));
        spans.push(Span::styled(action.label, styles::title(palette)));
        *next_action += 1;
    }
    Line::from(spans)
}

fn draw_status_bar(frame: &mut Frame, notice: Option<&str>, area: Rect, palette: &Palette) {
    let line = match notice {
        Some(notice) => Line::from(Span::styled(
            sanitize_terminal_text(notice).into_owned(),
            Style::default().fg(palette.accent),
        )),
        None => key_hints(palette),
    };
    frame.render_widget(Paragraph::new(line), area);
}

fn key_hints(palette: &Palette) -> Line<'static> {
    Line::from(vec![
        Span::styled("1-9", styles::key_highlight(palette)),
        Span::styled(" action  ", styles::key_hint(palette)),
        Span::styled("Ctrl-R", styles::key_highlight(palette)),
        Span::styled(" reload  ", styles::key_hint(palette)),
        Span::styled("q", styles::key_highlight(palette)),
        Span::styled(" quit", styles::key_hint(palette)),
    ])
}

/// Draw the root fallback as a standalone document.
///
/// Takes nothing from the session: no theme, no glyph options, no shell. It
/// must render even when everything above it is broken.
fn draw_root_document(frame: &mut Frame, document: &RootDocument) {
    let palette = Palette::root_document();
    let glyphs = ASCII_GLYPHS;
    let area = frame.area();
    frame.render_widget(Clear, area);

    let mut next_action = 1;
    let mut lines = fallback_lines(&document.body, &palette, &glyphs, &mut next_action);
    lines.push(Line::from(""));
    lines.push(key_hints(&palette));

    let width = area.width.saturating_sub(4).min(ROOT_CARD_MAX_WIDTH);
    let inner_width = width.saturating_sub(4);
    let height = wrapped_line_count(&lines, inner_width)
        .saturating_add(4)
        .min(area.height);
    let rect = Rect {
        x: area.x + (area.width.saturating_sub(width) / 2),
        y: area.y + (area.height.saturating_sub(height) / 2),
        width,
        height,
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Plain)
        .border_style(Style::default().fg(palette.critical))
        .title(Line::from(Span::styled(
            format!(" {} ", document.head.title),
            Style::default()
                .fg(palette.critical)
                .add_modifier(Modifier::BOLD),
        )))
        .title_alignment(Alignment::Center)
        .padding(Padding::uniform(1));

    frame.render_widget(
        Paragraph::new(lines)
            .block(block)
            .wrap(Wrap { trim: false }),
        rect,
    );
}

fn wrapped_line_count(lines: &[Line], width: u16) -> u16 {
    let width = width.max(1) as usize;
    let mut total: u16 = 0;

    for line in lines {
        let line_width: usize = line
            .spans
            .iter()
            .map(|span| span.content.as_ref().width())
            .sum();
        let rows = if line_width == 0 {
            1
        } else {
            ((line_width - 1) / width) + 1
        };
        total = total.saturating_add(rows as u16);
    }

    total
}
