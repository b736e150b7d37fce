//! Virtual terminal backend for end-to-end screen tests.
//!
//! Feeds ratatui's output through a `vt100::Parser` as real ANSI sequences,
//! so assertions see what a terminal would show, escape handling included.

use std::fmt::{self, Write as _};
use std::io;

use crossterm::{Command, cursor, style, terminal};
use ratatui::backend::{Backend, ClearType, WindowSize};
use ratatui::buffer::Cell;
use ratatui::layout::{Position, Size};
use ratatui::style::Color;

pub struct VT100Backend {
    parser: vt100::Parser,
    size: Size,
}

impl VT100Backend {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            parser: vt100::Parser::new(height, width, 0),
            size: Size::new(width, height),
        }
    }

    /// Visible screen text, rows joined by newlines.
    pub fn contents(&self) -> String {
        self.parser.screen().contents()
    }

    /// Text of one screen row with trailing blanks removed.
    #[allow(dead_code)]
    pub fn row(&self, y: u16) -> String {
        self.parser
            .screen()
            .rows(0, self.size.width)
            .nth(usize::from(y))
            .map(|row| row.trim_end().to_string())
            .unwrap_or_default()
    }

    fn emit(&mut self, command: impl Command) {
        let mut ansi = String::new();
        if command.write_ansi(&mut ansi).is_ok() {
            self.parser.process(ansi.as_bytes());
        }
    }
}

impl fmt::Display for VT100Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.contents())
    }
}

impl Backend for VT100Backend {
    type Error = io::Error;

    fn draw<'a, I>(&mut self, content: I) -> io::Result<()>
    where
        I: Iterator<Item = (u16, u16, &'a Cell)>,
    {
        let mut ansi = String::new();
        let mut cursor_at: Option<(u16, u16)> = None;
        let mut current: Option<ratatui::style::Style> = None;

        for (x, y, cell) in content {
            if cursor_at != Some((x, y)) {
                let _ = cursor::MoveTo(x, y).write_ansi(&mut ansi);
            }

            let cell_style = cell.style();
            if current != Some(cell_style) {
                let _ = style::SetAttribute(style::Attribute::Reset).write_ansi(&mut ansi);
                if let Some(fg) = cell_style.fg.and_then(ansi_color) {
                    let _ = style::SetForegroundColor(fg).write_ansi(&mut ansi);
                }
                if let Some(bg) = cell_style.bg.and_then(ansi_color) {
                    let _ = style::SetBackgroundColor(bg).write_ansi(&mut ansi);
                }
                current = Some(cell_style);
            }

            let _ = ansi.write_str(cell.symbol());
            cursor_at = Some((x + 1, y));
        }

        self.parser.process(ansi.as_bytes());
        Ok(())
    }

    fn hide_cursor(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn show_cursor(&mut self) -> io::Result<()> {
        Ok(())
    }

    fn get_cursor_position(&mut self) -> io::Result<Position> {
        let (row, col) = self.parser.screen().cursor_position();
        Ok(Position::new(col, row))
    }

    fn set_cursor_position<P: Into<Position>>(&mut self, position: P) -> io::Result<()> {
        let position = position.into();
        self.emit(cursor::MoveTo(position.x, position.y));
        Ok(())
    }

    fn clear(&mut self) -> io::Result<()> {
        self.emit(terminal::Clear(terminal::ClearType::All));
        Ok(())
    }

    fn clear_region(&mut self, _clear_type: ClearType) -> io::Result<()> {
        self.clear()
    }

    fn size(&self) -> io::Result<Size> {
        Ok(self.size)
    }

    fn window_size(&mut self) -> io::Result<WindowSize> {
        Ok(WindowSize {
            columns_rows: self.size,
            pixels: Size::new(self.size.width * 8, self.size.height * 16),
        })
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn ansi_color(color: Color) -> Option<style::Color> {
    use style::Color as Ansi;

    Some(match color {
        Color::Reset => return None,
        Color::Black => Ansi::Black,
        Color::Red => Ansi::DarkRed,
        Color::Green => Ansi::DarkGreen,
        Color::Yellow => Ansi::DarkYellow,
        Color::Blue => Ansi::DarkBlue,
        Color::Magenta => Ansi::DarkMagenta,
        Color::Cyan => Ansi::DarkCyan,
        Color::Gray => Ansi::Grey,
        Color::DarkGray => Ansi::DarkGrey,
        Color::LightRed => Ansi::Red,
        Color::LightGreen => Ansi::Green,
        Color::LightYellow => Ansi::Yellow,
        Color::LightBlue => Ansi::Blue,
        Color::LightMagenta => Ansi::Magenta,
        Color::LightCyan => Ansi::Cyan,
        Color::White => Ansi::White,
        Color::Rgb(r, g, b) => Ansi::Rgb { r, g, b },
        Color::Indexed(i) => Ansi::AnsiValue(i),
    })
}
